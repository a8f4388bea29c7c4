//! Shared fixtures: synthetic loan applications with a learnable outcome

#![allow(dead_code)]

use loan_approval::schema::{FieldValue, LoanApplication, RawRecord, LOAN_FIELDS};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

pub const TARGET: &str = "LoanApproved";

const PURPOSES: [&str; 5] = ["Home", "Auto", "Education", "Debt Consolidation", "Other"];
const OWNERSHIP: [&str; 4] = ["Own", "Rent", "Mortgage", "Other"];
const EMPLOYMENT: [&str; 3] = ["Employed", "Self-Employed", "Unemployed"];
const MARITAL: [&str; 4] = ["Single", "Married", "Divorced", "Widowed"];
const EMPLOYER: [&str; 4] = ["Private", "Government", "Self-Employed", "Non-Profit"];
const EDUCATION: [&str; 5] = ["High School", "Associate", "Bachelor", "Master", "Doctorate"];

fn pick<'a>(rng: &mut ChaCha8Rng, options: &[&'a str]) -> String {
    options[rng.gen_range(0..options.len())].to_string()
}

fn insurance(rng: &mut ChaCha8Rng) -> String {
    let status = if rng.gen_bool(0.7) { "Insured" } else { "Uninsured" };
    status.to_string()
}

/// One applicant; approved applicants have strong credit and low leverage
pub fn application(rng: &mut ChaCha8Rng, approved: bool) -> LoanApplication {
    let (credit, dti, income, defaults) = if approved {
        (rng.gen_range(690..850), rng.gen_range(0.05..0.30), rng.gen_range(70_000..160_000), 0)
    } else {
        (rng.gen_range(300..600), rng.gen_range(0.45..0.90), rng.gen_range(15_000..45_000), rng.gen_range(0..2))
    };
    let assets = rng.gen_range(5_000..300_000);
    let liabilities = rng.gen_range(1_000..150_000);

    LoanApplication {
        credit_score: credit,
        annual_income: income,
        loan_amount: rng.gen_range(2_000..60_000),
        loan_duration: [12, 24, 36, 48, 60][rng.gen_range(0..5)],
        age: rng.gen_range(21..70),
        employment_status: pick(rng, &EMPLOYMENT),
        marital_status: pick(rng, &MARITAL),
        number_of_dependents: rng.gen_range(0..5),
        education_level: pick(rng, &EDUCATION),
        home_ownership_status: pick(rng, &OWNERSHIP),
        monthly_debt_payments: rng.gen_range(100..2_500),
        credit_card_utilization_rate: rng.gen_range(0.0..1.0),
        number_of_open_credit_lines: rng.gen_range(0..12),
        number_of_credit_inquiries: rng.gen_range(0..6),
        debt_to_income_ratio: dti,
        bankruptcy_history: defaults,
        loan_purpose: pick(rng, &PURPOSES),
        previous_loan_defaults: defaults,
        interest_rate: rng.gen_range(2.0..15.0),
        payment_history: rng.gen_range(0..30),
        savings_account_balance: rng.gen_range(0..50_000),
        checking_account_balance: rng.gen_range(0..20_000),
        investment_account_balance: rng.gen_range(0..80_000),
        retirement_account_balance: rng.gen_range(0..200_000),
        emergency_fund_balance: rng.gen_range(0..30_000),
        total_assets: assets,
        total_liabilities: liabilities,
        net_worth: assets - liabilities,
        length_of_credit_history: rng.gen_range(1..30),
        mortgage_balance: rng.gen_range(0..250_000),
        rent_payments: rng.gen_range(0..3_000),
        auto_loan_balance: rng.gen_range(0..30_000),
        personal_loan_balance: rng.gen_range(0..20_000),
        student_loan_balance: rng.gen_range(0..60_000),
        utility_bills_payment_history: rng.gen_range(0.0..1.0),
        health_insurance_status: insurance(rng),
        life_insurance_status: insurance(rng),
        car_insurance_status: insurance(rng),
        home_insurance_status: insurance(rng),
        other_insurance_policies: rng.gen_range(0..4),
        employer_type: pick(rng, &EMPLOYER),
        job_tenure: rng.gen_range(0..25),
        monthly_savings: rng.gen_range(0..3_000),
        annual_bonuses: rng.gen_range(0..15_000),
        annual_expenses: rng.gen_range(10_000..80_000),
        monthly_housing_costs: rng.gen_range(300..3_500),
        monthly_transportation_costs: rng.gen_range(50..800),
        monthly_food_costs: rng.gen_range(150..1_200),
        monthly_healthcare_costs: rng.gen_range(0..600),
        monthly_entertainment_costs: rng.gen_range(0..500),
    }
}

/// Stack records into a frame with the canonical column order
pub fn records_frame(records: &[RawRecord]) -> DataFrame {
    let columns: Vec<Column> = LOAN_FIELDS
        .iter()
        .map(|&name| match records[0].get(name) {
            Some(FieldValue::Text(_)) => {
                let values: Vec<String> = records
                    .iter()
                    .map(|r| match r.get(name) {
                        Some(FieldValue::Text(v)) => v.clone(),
                        other => panic!("{} is not text: {:?}", name, other),
                    })
                    .collect();
                Column::new(name.into(), values)
            }
            Some(FieldValue::Int(_)) => {
                let values: Vec<i64> = records
                    .iter()
                    .map(|r| match r.get(name) {
                        Some(FieldValue::Int(v)) => *v,
                        other => panic!("{} is not an integer: {:?}", name, other),
                    })
                    .collect();
                Column::new(name.into(), values)
            }
            _ => {
                let values: Vec<f64> = records
                    .iter()
                    .map(|r| match r.get(name) {
                        Some(FieldValue::Float(v)) => *v,
                        Some(FieldValue::Int(v)) => *v as f64,
                        other => panic!("{} is not numeric: {:?}", name, other),
                    })
                    .collect();
                Column::new(name.into(), values)
            }
        })
        .collect();
    DataFrame::new(columns).unwrap()
}

/// Labelled dataset with `n_approved` 1s and `n_rejected` 0s, interleaved
pub fn loan_dataset(n_approved: usize, n_rejected: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut labels: Vec<i64> = std::iter::repeat(1)
        .take(n_approved)
        .chain(std::iter::repeat(0).take(n_rejected))
        .collect();
    labels.shuffle(&mut rng);

    let records: Vec<RawRecord> = labels
        .iter()
        .map(|&label| application(&mut rng, label == 1).to_record().unwrap())
        .collect();

    let mut df = records_frame(&records);
    df.with_column(Column::new(TARGET.into(), labels)).unwrap();
    df
}

/// A single clearly creditworthy applicant
pub fn strong_applicant() -> LoanApplication {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    application(&mut rng, true)
}

/// A single clearly risky applicant
pub fn weak_applicant() -> LoanApplication {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    application(&mut rng, false)
}
