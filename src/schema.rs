//! Loan application schema
//!
//! Field names, the categorical taxonomy, and the record types that carry a
//! single applicant into the feature pipeline.

use crate::error::{LoanError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw applicant fields in the order the training CSVs carry them
pub const LOAN_FIELDS: [&str; 50] = [
    "CreditScore",
    "AnnualIncome",
    "LoanAmount",
    "LoanDuration",
    "Age",
    "EmploymentStatus",
    "MaritalStatus",
    "NumberOfDependents",
    "EducationLevel",
    "HomeOwnershipStatus",
    "MonthlyDebtPayments",
    "CreditCardUtilizationRate",
    "NumberOfOpenCreditLines",
    "NumberOfCreditInquiries",
    "DebtToIncomeRatio",
    "BankruptcyHistory",
    "LoanPurpose",
    "PreviousLoanDefaults",
    "InterestRate",
    "PaymentHistory",
    "SavingsAccountBalance",
    "CheckingAccountBalance",
    "InvestmentAccountBalance",
    "RetirementAccountBalance",
    "EmergencyFundBalance",
    "TotalAssets",
    "TotalLiabilities",
    "NetWorth",
    "LengthOfCreditHistory",
    "MortgageBalance",
    "RentPayments",
    "AutoLoanBalance",
    "PersonalLoanBalance",
    "StudentLoanBalance",
    "UtilityBillsPaymentHistory",
    "HealthInsuranceStatus",
    "LifeInsuranceStatus",
    "CarInsuranceStatus",
    "HomeInsuranceStatus",
    "OtherInsurancePolicies",
    "EmployerType",
    "JobTenure",
    "MonthlySavings",
    "AnnualBonuses",
    "AnnualExpenses",
    "MonthlyHousingCosts",
    "MonthlyTransportationCosts",
    "MonthlyFoodCosts",
    "MonthlyHealthcareCosts",
    "MonthlyEntertainmentCosts",
];

/// Insured/Uninsured fields re-coded to 1/0
pub const BINARY_FIELDS: [&str; 4] = [
    "HealthInsuranceStatus",
    "LifeInsuranceStatus",
    "CarInsuranceStatus",
    "HomeInsuranceStatus",
];

/// Rank-preserving field re-coded to 1..=5
pub const ORDINAL_FIELD: &str = "EducationLevel";

/// Fields expanded into indicator columns
pub const NOMINAL_FIELDS: [&str; 5] = [
    "LoanPurpose",
    "HomeOwnershipStatus",
    "EmploymentStatus",
    "MaritalStatus",
    "EmployerType",
];

pub const INSURANCE_LEVELS: [(&str, f64); 2] = [("Insured", 1.0), ("Uninsured", 0.0)];

pub const EDUCATION_LEVELS: [(&str, f64); 5] = [
    ("High School", 1.0),
    ("Associate", 2.0),
    ("Bachelor", 3.0),
    ("Master", 4.0),
    ("Doctorate", 5.0),
];

/// A single primitive field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// One applicant as a field-name → value mapping, without the target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a record from a JSON object
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            LoanError::SchemaMismatch(format!("record is not a flat JSON object of primitives: {}", e))
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a one-row frame with exactly `columns`, in that order
    pub fn to_frame(&self, columns: &[String]) -> Result<DataFrame> {
        let cols = columns
            .iter()
            .map(|name| {
                let value = self.fields.get(name).ok_or_else(|| {
                    LoanError::SchemaMismatch(format!("record is missing field '{}'", name))
                })?;
                let column = match value {
                    FieldValue::Int(v) => Column::new(name.as_str().into(), vec![*v]),
                    FieldValue::Float(v) => Column::new(name.as_str().into(), vec![*v]),
                    FieldValue::Text(v) => Column::new(name.as_str().into(), vec![v.clone()]),
                };
                Ok(column)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DataFrame::new(cols)?)
    }
}

impl FromIterator<(String, FieldValue)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Typed loan application with every raw field named explicitly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoanApplication {
    pub credit_score: i64,
    pub annual_income: i64,
    pub loan_amount: i64,
    pub loan_duration: i64,
    pub age: i64,
    pub employment_status: String,
    pub marital_status: String,
    pub number_of_dependents: i64,
    pub education_level: String,
    pub home_ownership_status: String,
    pub monthly_debt_payments: i64,
    pub credit_card_utilization_rate: f64,
    pub number_of_open_credit_lines: i64,
    pub number_of_credit_inquiries: i64,
    pub debt_to_income_ratio: f64,
    pub bankruptcy_history: i64,
    pub loan_purpose: String,
    pub previous_loan_defaults: i64,
    pub interest_rate: f64,
    pub payment_history: i64,
    pub savings_account_balance: i64,
    pub checking_account_balance: i64,
    pub investment_account_balance: i64,
    pub retirement_account_balance: i64,
    pub emergency_fund_balance: i64,
    pub total_assets: i64,
    pub total_liabilities: i64,
    pub net_worth: i64,
    pub length_of_credit_history: i64,
    pub mortgage_balance: i64,
    pub rent_payments: i64,
    pub auto_loan_balance: i64,
    pub personal_loan_balance: i64,
    pub student_loan_balance: i64,
    pub utility_bills_payment_history: f64,
    pub health_insurance_status: String,
    pub life_insurance_status: String,
    pub car_insurance_status: String,
    pub home_insurance_status: String,
    pub other_insurance_policies: i64,
    pub employer_type: String,
    pub job_tenure: i64,
    pub monthly_savings: i64,
    pub annual_bonuses: i64,
    pub annual_expenses: i64,
    pub monthly_housing_costs: i64,
    pub monthly_transportation_costs: i64,
    pub monthly_food_costs: i64,
    pub monthly_healthcare_costs: i64,
    pub monthly_entertainment_costs: i64,
}

impl Default for LoanApplication {
    /// Values pre-filled in the application form
    fn default() -> Self {
        Self {
            credit_score: 700,
            annual_income: 50_000,
            loan_amount: 10_000,
            loan_duration: 12,
            age: 30,
            employment_status: "Employed".to_string(),
            marital_status: "Single".to_string(),
            number_of_dependents: 0,
            education_level: "High School".to_string(),
            home_ownership_status: "Own".to_string(),
            monthly_debt_payments: 500,
            credit_card_utilization_rate: 0.3,
            number_of_open_credit_lines: 5,
            number_of_credit_inquiries: 0,
            debt_to_income_ratio: 0.3,
            bankruptcy_history: 0,
            loan_purpose: "Business".to_string(),
            previous_loan_defaults: 0,
            interest_rate: 5.0,
            payment_history: 0,
            savings_account_balance: 5_000,
            checking_account_balance: 2_000,
            investment_account_balance: 0,
            retirement_account_balance: 0,
            emergency_fund_balance: 1_000,
            total_assets: 10_000,
            total_liabilities: 5_000,
            net_worth: 5_000,
            length_of_credit_history: 5,
            mortgage_balance: 0,
            rent_payments: 0,
            auto_loan_balance: 0,
            personal_loan_balance: 0,
            student_loan_balance: 0,
            utility_bills_payment_history: 0.0,
            health_insurance_status: "Insured".to_string(),
            life_insurance_status: "Insured".to_string(),
            car_insurance_status: "Insured".to_string(),
            home_insurance_status: "Insured".to_string(),
            other_insurance_policies: 0,
            employer_type: "Private".to_string(),
            job_tenure: 5,
            monthly_savings: 500,
            annual_bonuses: 0,
            annual_expenses: 20_000,
            monthly_housing_costs: 1_000,
            monthly_transportation_costs: 200,
            monthly_food_costs: 400,
            monthly_healthcare_costs: 100,
            monthly_entertainment_costs: 100,
        }
    }
}

impl LoanApplication {
    /// Flatten into a raw record keyed by the wire field names
    pub fn to_record(&self) -> Result<RawRecord> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_is_disjoint_and_known() {
        let mut categorical: Vec<&str> = BINARY_FIELDS.to_vec();
        categorical.push(ORDINAL_FIELD);
        categorical.extend(NOMINAL_FIELDS);

        for field in &categorical {
            assert!(LOAN_FIELDS.contains(field), "{} not in schema", field);
        }
        let mut dedup = categorical.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), categorical.len());
    }

    #[test]
    fn test_application_to_record_has_every_field() {
        let record = LoanApplication::default().to_record().unwrap();
        assert_eq!(record.len(), LOAN_FIELDS.len());
        for field in LOAN_FIELDS {
            assert!(record.contains(field), "missing {}", field);
        }
        assert_eq!(record.get("CreditScore"), Some(&FieldValue::Int(700)));
        assert_eq!(record.get("InterestRate"), Some(&FieldValue::Float(5.0)));
        assert_eq!(
            record.get("EducationLevel"),
            Some(&FieldValue::Text("High School".to_string()))
        );
    }

    #[test]
    fn test_record_from_json() {
        let record = RawRecord::from_json(r#"{"Age": 41, "InterestRate": 4.5, "LoanPurpose": "Home"}"#).unwrap();
        assert_eq!(record.get("Age"), Some(&FieldValue::Int(41)));
        assert_eq!(record.get("InterestRate"), Some(&FieldValue::Float(4.5)));
        assert_eq!(record.get("LoanPurpose"), Some(&FieldValue::Text("Home".to_string())));

        assert!(RawRecord::from_json(r#"{"Age": [1, 2]}"#).is_err());
    }

    #[test]
    fn test_record_to_frame_follows_column_order() {
        let mut record = RawRecord::new();
        record.insert("b", 2_i64);
        record.insert("a", "x");

        let df = record.to_frame(&["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(df.height(), 1);
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["b", "a"]);

        let err = record.to_frame(&["c".to_string()]).unwrap_err();
        assert!(matches!(err, LoanError::SchemaMismatch(_)));
    }
}
