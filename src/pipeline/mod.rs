//! End-to-end training orchestration
//!
//! - [`DataIngestion`] splits a raw CSV into train and test files
//! - [`TrainingPipeline`] balances, transforms, selects and persists

mod ingestion;
mod train;

pub use ingestion::DataIngestion;
pub use train::{TrainingPipeline, TrainingReport};

use crate::error::{LoanError, Result};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;

/// Read a headered CSV
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| {
        LoanError::DataError(format!("cannot open {}: {}", path.display(), e))
    })?;

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| LoanError::DataError(format!("{}: {}", path.display(), e)))
}

/// Write a frame as a headered CSV, creating parent directories
pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}
