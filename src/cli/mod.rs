//! Loan approval CLI
//!
//! Command-line interface for ingestion, training, prediction and serving.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::artifacts::ArtifactStore;
use crate::config::AppConfig;
use crate::inference::{LoanPredictor, Prediction};
use crate::pipeline::{load_csv, save_csv, DataIngestion, TrainingPipeline};
use crate::schema::RawRecord;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn decision_label(p: &Prediction) -> ColoredString {
    if p.is_approved() {
        ok("approved")
    } else {
        p.label().red()
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "loan-approval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Loan approval model training and prediction")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Artifact directory (overrides the configuration)
    #[arg(long, global = true)]
    pub artifacts: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a raw CSV into train and test files
    Ingest {
        /// Raw dataset (defaults to the configured path)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Train on the train/test split and persist the best model
    Train {
        /// Minimum held-out R² the selected model must reach
        #[arg(long)]
        min_score: Option<f64>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Predict with the persisted pipeline and model
    Predict {
        /// One application as JSON: a file path or an inline object
        #[arg(short, long, conflicts_with = "data", required_unless_present = "data")]
        record: Option<String>,

        /// CSV of applications without the target column
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Write batch predictions to this CSV
        #[arg(short, long, requires = "data")]
        output: Option<PathBuf>,
    },

    /// Summarise the persisted artifacts
    Info,

    /// Start the HTTP server
    Serve {
        /// Server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Server host
        #[arg(long)]
        host: Option<String>,
    },
}

impl Cli {
    /// Configuration from `--config` (or defaults) with CLI overrides applied
    pub fn app_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        if let Some(dir) = &self.artifacts {
            config.artifacts.dir = dir.clone();
        }
        Ok(config)
    }
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = cli.app_config()?;

    match cli.command {
        Commands::Ingest { data } => cmd_ingest(&config, data.as_deref()),
        Commands::Train { min_score, seed } => {
            if let Some(min_score) = min_score {
                config = config.with_min_score(min_score);
            }
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            config.validate()?;
            cmd_train(config)
        }
        Commands::Predict { record, data, output } => {
            let store = ArtifactStore::new(config.artifacts);
            match (record, data) {
                (Some(record), _) => cmd_predict_record(&store, &record),
                (None, Some(data)) => cmd_predict_batch(&store, &data, output.as_deref()),
                (None, None) => anyhow::bail!("either --record or --data is required"),
            }
        }
        Commands::Info => cmd_info(&ArtifactStore::new(config.artifacts)),
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            cmd_serve(config).await
        }
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_ingest(config: &AppConfig, data: Option<&Path>) -> anyhow::Result<()> {
    section("Ingest");

    let raw = data.unwrap_or(config.data.raw_data_path.as_path());
    step_run(&format!("Splitting {}", raw.display()));
    let start = Instant::now();
    let ingestion = DataIngestion::new(config.data.clone(), config.training.random_seed);
    let (train, test) = ingestion.split(raw)?;
    step_done(&format!("{:?}", start.elapsed()));

    step_ok(&format!("train → {}", train.display()));
    step_ok(&format!("test  → {}", test.display()));
    println!();
    Ok(())
}

pub fn cmd_train(config: AppConfig) -> anyhow::Result<()> {
    section("Train");

    step_run("Balancing, transforming and fitting the model roster");
    let pipeline = TrainingPipeline::new(config);
    let report = pipeline.run()?;
    step_done(&format!("{:.2}s", report.duration_secs));

    println!();
    println!("  {:<24} {:>10} {:>10}", muted("Model"), muted("R²"), muted("Time"));
    println!("  {}", dim(&"─".repeat(46)));
    for candidate in &report.candidates {
        let name = if candidate.name == report.best_model {
            candidate.name.white().bold()
        } else {
            candidate.name.normal()
        };
        println!("  {:<24} {:>10.4} {:>9.2}s", name, candidate.score, candidate.fit_secs);
    }
    println!("  {}", dim(&"─".repeat(46)));

    println!();
    println!("  {} {} {} {:.4}", ok("best"), report.best_model.white().bold(), muted("R²:"), report.best_score);
    println!("  {:<16} {}", muted("Rows"), format!("{} raw, {} balanced, {} test", report.n_train_rows, report.n_balanced_rows, report.n_test_rows).white());
    println!("  {:<16} {}", muted("Features"), report.n_features.to_string().white());
    println!("  {:<16} {}", muted("Accuracy"), format!("{:.4}", report.metrics.accuracy).white());
    println!("  {:<16} {}", muted("F1"), format!("{:.4}", report.metrics.f1_score).white());
    println!("  {:<16} {}", muted("Pipeline"), report.pipeline_path.display());
    println!("  {:<16} {}", muted("Model"), report.model_path.display());
    println!();

    Ok(())
}

fn read_record(arg: &str) -> anyhow::Result<RawRecord> {
    let json = if arg.trim_start().starts_with('{') {
        arg.to_string()
    } else {
        std::fs::read_to_string(arg)?
    };
    Ok(RawRecord::from_json(&json)?)
}

pub fn cmd_predict_record(store: &ArtifactStore, record: &str) -> anyhow::Result<()> {
    section("Predict");

    let record = read_record(record)?;
    let predictor = LoanPredictor::load(store)?;
    let prediction = predictor.predict_record(&record)?;

    println!("  {:<12} {}", muted("Model"), predictor.model().name);
    println!("  {:<12} {}", muted("Decision"), decision_label(&prediction).bold());
    println!("  {:<12} {:.4}", muted("Score"), prediction.score);
    println!();
    Ok(())
}

pub fn cmd_predict_batch(store: &ArtifactStore, data: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading data");
    let df = load_csv(data)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    let predictor = LoanPredictor::load(store)?;
    // Labelled splits carry the target; score on the inputs only
    let target = predictor.pipeline().config().target_column.as_str();
    let inputs = if df.column(target).is_ok() { df.drop(target)? } else { df.clone() };

    step_run(&format!("Scoring with {}", predictor.model().name.cyan()));
    let start = Instant::now();
    let predictions = predictor.predict_frame(&inputs)?;
    step_done(&format!("{:?}", start.elapsed()));

    let approved = predictions.iter().filter(|p| p.is_approved()).count();
    println!();
    println!("  {:<12} {}", muted("Approved"), approved.to_string().white());
    println!("  {:<12} {}", muted("Rejected"), (predictions.len() - approved).to_string().white());

    match output {
        Some(path) => {
            let decisions: Vec<i64> = predictions.iter().map(|p| i64::from(p.decision)).collect();
            let scores: Vec<f64> = predictions.iter().map(|p| p.score).collect();
            let mut out = df.clone();
            out.with_column(Column::new("Decision".into(), decisions))?;
            out.with_column(Column::new("Score".into(), scores))?;
            save_csv(&mut out, path)?;
            step_ok(&format!("predictions → {}", path.display()));
        }
        None => {
            println!();
            for (i, p) in predictions.iter().enumerate().take(20) {
                println!("  {:>6}  {:<10} {:.4}", dim(&i.to_string()), decision_label(p), p.score);
            }
            if predictions.len() > 20 {
                println!("  {}", dim(&format!("… {} more (use --output)", predictions.len() - 20)));
            }
        }
    }

    println!();
    Ok(())
}

pub fn cmd_info(store: &ArtifactStore) -> anyhow::Result<()> {
    section("Artifacts");

    println!("  {:<12} {}", muted("Pipeline"), store.pipeline_path().display());
    println!("  {:<12} {}", muted("Model"), store.model_path().display());

    let predictor = LoanPredictor::load(store)?;
    let model = predictor.model();
    let pipeline = predictor.pipeline();

    println!();
    println!("  {:<12} {}", muted("Selected"), model.name.white().bold());
    println!("  {:<12} {}", muted("Estimator"), model.estimator().kind());
    println!("  {:<12} {:.4}", muted("R²"), model.score);
    println!("  {:<12} {}", muted("Threshold"), model.threshold);
    println!("  {:<12} {}", muted("Trained"), model.trained_at.to_rfc3339());
    println!("  {:<12} {}", muted("Inputs"), pipeline.input_columns().len());
    println!("  {:<12} {}", muted("Features"), pipeline.n_features());

    println!();
    println!("  {:<28} {:>12} {:>12}", muted("Scaled column"), muted("Mean"), muted("Std"));
    println!("  {}", dim(&"─".repeat(54)));
    for stats in pipeline.scaler().stats() {
        println!("  {:<28} {:>12.4} {:>12.4}", stats.name, stats.mean, stats.std);
    }

    println!();
    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(config: AppConfig) -> anyhow::Result<()> {
    use crate::server::run_server;

    let (host, port) = (config.server.host.clone(), config.server.port);

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Loan Approval".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Predict", &format!("http://{}:{}/api/predict", host, port)));
    line_box(&kv("Schema ", &format!("http://{}:{}/api/schema", host, port)));
    line_box(&kv("Health ", &format!("http://{}:{}/api/health", host, port)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config.server, ArtifactStore::new(config.artifacts)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_predict_requires_input() {
        assert!(Cli::try_parse_from(["loan-approval", "predict"]).is_err());
        assert!(Cli::try_parse_from(["loan-approval", "predict", "--record", "{}"]).is_ok());
    }

    #[test]
    fn test_artifacts_override() {
        let cli = Cli::try_parse_from(["loan-approval", "--artifacts", "/tmp/models", "info"]).unwrap();
        let config = cli.app_config().unwrap();
        assert_eq!(config.artifacts.dir, PathBuf::from("/tmp/models"));
    }

    #[test]
    fn test_inline_record() {
        let record = read_record(r#"{"Age": 40, "LoanPurpose": "Home"}"#).unwrap();
        assert_eq!(record.len(), 2);
    }
}
