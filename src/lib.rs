//! Royale-Harvest: an incremental Clash Royale battle-log harvester
//!
//! This crate crawls the clan graph of the official Clash Royale API,
//! fetching each clan member's battle log, flattening battles into tabular
//! rows, and merging them into a persistent Parquet dataset. A durable
//! visited-clans checkpoint makes the traversal resumable across runs.

pub mod api;
pub mod checkpoint;
pub mod client;
pub mod config;
pub mod crawler;
pub mod dataset;
pub mod normalize;
pub mod tag;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API client error: {0}")]
    Client(#[from] client::ClientError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] dataset::DatasetError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Credential env var {0} is not set")]
    MissingCredential(String),
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use checkpoint::VisitedClans;
pub use client::{ApiClient, ClientError, HttpTransport, RetryPolicy, Transport};
pub use config::Config;
pub use crawler::{Orchestrator, RunSummary};
pub use dataset::ParquetDataset;
pub use normalize::{MatchRow, DECK_SIZE};
