//! Persistent battle dataset
//!
//! Append-only columnar collection of [`MatchRow`]s backed by a single
//! Parquet file. Merging dedups on `(player_tag, battle_time)` keeping the
//! first-seen copy, so a clan repeated after a partial commit never
//! double-counts a battle. Flushes rewrite the file atomically
//! (temp-then-rename), mirroring the visited-set checkpoint.

mod schema;

pub use schema::match_schema;

use crate::normalize::MatchRow;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the dataset store
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parquet error: {message}")]
    Parquet { message: String },

    #[error("Schema error: {message}")]
    Schema { message: String },
}

/// In-memory view of the persisted dataset plus its dedup index
#[derive(Debug)]
pub struct ParquetDataset {
    path: PathBuf,
    rows: Vec<MatchRow>,
    seen: HashSet<(String, i64)>,
}

impl ParquetDataset {
    /// Loads the dataset from `path`, or starts empty if the file does not
    /// exist yet.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let rows = if path.exists() {
            let file = File::open(path)?;
            let reader = ParquetRecordBatchReaderBuilder::try_new(file)
                .map_err(|e| DatasetError::Parquet {
                    message: format!("parquet reader init failed: {e}"),
                })?
                .build()
                .map_err(|e| DatasetError::Parquet {
                    message: format!("parquet reader build failed: {e}"),
                })?;

            let mut rows = Vec::new();
            for batch in reader {
                let batch = batch.map_err(|e| DatasetError::Parquet {
                    message: format!("parquet read batch failed: {e}"),
                })?;
                rows.extend(schema::batch_to_rows(&batch)?);
            }
            tracing::info!("Loaded existing dataset: {} rows from {}", rows.len(), path.display());
            rows
        } else {
            tracing::info!("No existing dataset at {}, starting fresh", path.display());
            Vec::new()
        };

        let seen = rows
            .iter()
            .map(|r| (r.player_tag.clone(), r.battle_time))
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            rows,
            seen,
        })
    }

    /// Merges new rows into the dataset, suppressing duplicates on
    /// `(player_tag, battle_time)`. Returns the number of rows added.
    pub fn append(&mut self, rows: impl IntoIterator<Item = MatchRow>) -> usize {
        let mut added = 0;
        for row in rows {
            let key = (row.player_tag.clone(), row.battle_time);
            if self.seen.insert(key) {
                self.rows.push(row);
                added += 1;
            }
        }
        added
    }

    /// Atomically rewrites the Parquet file with the full merged set.
    pub fn flush(&self) -> Result<(), DatasetError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let batch = schema::rows_to_batch(&self.rows)?;

        let tmp = tmp_sibling(&self.path);
        let file = File::create(&tmp)?;
        let mut writer = ArrowWriter::try_new(file, match_schema(), Some(writer_properties()))
            .map_err(|e| DatasetError::Parquet {
                message: format!("parquet writer init failed: {e}"),
            })?;
        writer.write(&batch).map_err(|e| DatasetError::Parquet {
            message: format!("parquet write failed: {e}"),
        })?;
        writer.close().map_err(|e| DatasetError::Parquet {
            message: format!("parquet close failed: {e}"),
        })?;

        fs::rename(&tmp, &self.path)?;
        tracing::info!("Dataset written: {} rows to {}", self.rows.len(), self.path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[MatchRow] {
        &self.rows
    }

    /// Unique opponent clan tags in first-appearance order, the discovery
    /// source for the crawl frontier.
    pub fn opponent_clans(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut clans = Vec::new();
        for row in &self.rows {
            if let Some(clan) = &row.opponent_clan {
                if seen.insert(clan.clone()) {
                    clans.push(clan.clone());
                }
            }
        }
        clans
    }
}

fn writer_properties() -> WriterProperties {
    let created_by = KeyValue {
        key: "created_by".to_string(),
        value: Some("royale-harvest".to_string()),
    };
    WriterProperties::builder()
        .set_key_value_metadata(Some(vec![created_by]))
        .build()
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Deck;
    use tempfile::TempDir;

    fn deck(prefix: &str) -> Deck {
        std::array::from_fn(|i| format!("{}{}", prefix, i))
    }

    fn sample_row(player_tag: &str, battle_time: i64, opponent_clan: Option<&str>) -> MatchRow {
        MatchRow {
            player_tag: player_tag.to_string(),
            opponent_tag: "OPP".to_string(),
            player_deck: deck("p"),
            opponent_deck: deck("o"),
            player_trophies: Some(5000),
            opponent_trophies: Some(4900),
            player_crowns: 2,
            opponent_crowns: 1,
            battle_time,
            game_mode: "Ladder".to_string(),
            opponent_clan: opponent_clan.map(String::from),
            result: 1,
        }
    }

    fn dataset_path(dir: &TempDir) -> PathBuf {
        dir.path().join("data").join("battles.parquet")
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let dataset = ParquetDataset::load(&dataset_path(&dir)).unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_append_dedups_on_key() {
        let dir = TempDir::new().unwrap();
        let mut dataset = ParquetDataset::load(&dataset_path(&dir)).unwrap();

        let added = dataset.append(vec![
            sample_row("AAA", 1000, None),
            sample_row("AAA", 1000, None),
            sample_row("AAA", 2000, None),
            sample_row("BBB", 1000, None),
        ]);
        assert_eq!(added, 3);
        assert_eq!(dataset.len(), 3);

        // Re-appending the same rows adds nothing.
        assert_eq!(dataset.append(vec![sample_row("AAA", 1000, None)]), 0);
    }

    #[test]
    fn test_flush_and_reload_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dataset_path(&dir);

        let mut dataset = ParquetDataset::load(&path).unwrap();
        dataset.append(vec![
            sample_row("AAA", 1000, Some("CLAN1")),
            sample_row("BBB", 2000, None),
        ]);
        dataset.flush().unwrap();

        let reloaded = ParquetDataset::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.rows(), dataset.rows());

        // The dedup index is rebuilt on load.
        let mut reloaded = reloaded;
        assert_eq!(reloaded.append(vec![sample_row("AAA", 1000, None)]), 0);
    }

    #[test]
    fn test_flush_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dataset_path(&dir);

        let mut dataset = ParquetDataset::load(&path).unwrap();
        dataset.append(vec![sample_row("AAA", 1000, None)]);
        dataset.flush().unwrap();

        assert!(path.exists());
        assert!(!tmp_sibling(&path).exists());
    }

    #[test]
    fn test_flush_empty_dataset() {
        let dir = TempDir::new().unwrap();
        let path = dataset_path(&dir);

        let dataset = ParquetDataset::load(&path).unwrap();
        dataset.flush().unwrap();

        let reloaded = ParquetDataset::load(&path).unwrap();
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_opponent_clans_unique_in_order() {
        let dir = TempDir::new().unwrap();
        let mut dataset = ParquetDataset::load(&dataset_path(&dir)).unwrap();

        dataset.append(vec![
            sample_row("AAA", 1000, Some("CLAN2")),
            sample_row("AAA", 2000, Some("CLAN1")),
            sample_row("BBB", 3000, Some("CLAN2")),
            sample_row("BBB", 4000, None),
        ]);

        assert_eq!(dataset.opponent_clans(), vec!["CLAN2", "CLAN1"]);
    }
}
