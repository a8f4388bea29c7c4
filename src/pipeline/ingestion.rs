//! Raw dataset splitting

use super::{load_csv, save_csv};
use crate::config::DataConfig;
use crate::error::{LoanError, Result};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use tracing::info;

/// Shuffles a raw CSV and writes the train/test pair named in [`DataConfig`]
#[derive(Debug, Clone)]
pub struct DataIngestion {
    config: DataConfig,
    seed: u64,
}

impl DataIngestion {
    pub fn new(config: DataConfig, seed: u64) -> Self {
        Self { config, seed }
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    /// Number of held-out rows for a dataset of `n_rows`
    pub fn test_rows(&self, n_rows: usize) -> usize {
        let wanted = (self.config.test_size * n_rows as f64).ceil() as usize;
        wanted.clamp(1, n_rows.saturating_sub(1).max(1))
    }

    /// Split `raw_csv`, returning the train and test paths
    pub fn split(&self, raw_csv: &Path) -> Result<(PathBuf, PathBuf)> {
        let df = load_csv(raw_csv)?;
        let (mut train, mut test) = self.split_frame(&df)?;

        save_csv(&mut train, &self.config.train_path)?;
        save_csv(&mut test, &self.config.test_path)?;

        info!(
            source = %raw_csv.display(),
            train_rows = train.height(),
            test_rows = test.height(),
            "Data ingestion complete"
        );
        Ok((self.config.train_path.clone(), self.config.test_path.clone()))
    }

    /// Seeded shuffle, then the first `test_rows` rows become the test split
    pub fn split_frame(&self, df: &DataFrame) -> Result<(DataFrame, DataFrame)> {
        let n_rows = df.height();
        if n_rows < 2 {
            return Err(LoanError::DataIntegrity(format!(
                "need at least 2 rows to split, got {}",
                n_rows
            )));
        }

        let mut order: Vec<IdxSize> = (0..n_rows as IdxSize).collect();
        order.shuffle(&mut ChaCha8Rng::seed_from_u64(self.seed));

        let n_test = self.test_rows(n_rows);
        let test_idx = IdxCa::from_vec("idx".into(), order[..n_test].to_vec());
        let train_idx = IdxCa::from_vec("idx".into(), order[n_test..].to_vec());

        Ok((df.take(&train_idx)?, df.take(&test_idx)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ingestion(dir: &Path, test_size: f64) -> DataIngestion {
        let config = DataConfig {
            raw_data_path: dir.join("data.csv"),
            train_path: dir.join("out").join("train.csv"),
            test_path: dir.join("out").join("test.csv"),
            test_size,
        };
        DataIngestion::new(config, 42)
    }

    #[test]
    fn test_ceil_holdout() {
        let dir = TempDir::new().unwrap();
        let ingest = ingestion(dir.path(), 0.2);
        assert_eq!(ingest.test_rows(10), 2);
        assert_eq!(ingest.test_rows(11), 3);
        assert_eq!(ingest.test_rows(2), 1);
    }

    #[test]
    fn test_split_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let ingest = ingestion(dir.path(), 0.2);
        let ids: Vec<i64> = (0..10).collect();
        let mut raw = df!("id" => &ids, "LoanApproved" => &[0_i64, 1, 0, 1, 0, 1, 0, 1, 0, 1]).unwrap();
        let raw_path = dir.path().join("data.csv");
        save_csv(&mut raw, &raw_path).unwrap();

        let (train_path, test_path) = ingest.split(&raw_path).unwrap();
        let train = load_csv(&train_path).unwrap();
        let test = load_csv(&test_path).unwrap();
        assert_eq!(train.height(), 8);
        assert_eq!(test.height(), 2);

        let mut seen: Vec<i64> = train
            .column("id")
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .chain(test.column("id").unwrap().as_materialized_series().i64().unwrap().into_no_null_iter())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, ids);
    }

    #[test]
    fn test_same_seed_same_split() {
        let dir = TempDir::new().unwrap();
        let ids: Vec<i64> = (0..50).collect();
        let df = df!("id" => &ids).unwrap();
        let (a, _) = ingestion(dir.path(), 0.3).split_frame(&df).unwrap();
        let (b, _) = ingestion(dir.path(), 0.3).split_frame(&df).unwrap();
        assert!(a.equals(&b));
    }

    #[test]
    fn test_single_row_rejected() {
        let dir = TempDir::new().unwrap();
        let df = df!("id" => &[1_i64]).unwrap();
        assert!(matches!(
            ingestion(dir.path(), 0.2).split_frame(&df),
            Err(LoanError::DataIntegrity(_))
        ));
    }
}
