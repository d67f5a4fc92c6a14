use serde::Deserialize;
use std::time::Duration;

use crate::client::RetryPolicy;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
}

/// Remote API settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base endpoint for API requests
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the bearer token
    #[serde(rename = "token-env", default = "default_token_env")]
    pub token_env: String,

    /// Retries allowed after the initial attempt of each call
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds); doubles per retry
    #[serde(rename = "base-delay-ms", default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Ceiling for any single retry delay (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Traversal settings
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Clan tag seeding the traversal when the visited set is empty
    #[serde(rename = "starting-clan-tag")]
    pub starting_clan_tag: String,

    /// Maximum number of new clans expanded per run
    #[serde(rename = "max-new-clans-per-run", default = "default_max_new_clans")]
    pub max_new_clans_per_run: usize,

    /// Battle-log game mode to keep
    #[serde(rename = "game-mode", default = "default_game_mode")]
    pub game_mode: String,

    /// Also emit each battle from the opponent's perspective
    #[serde(rename = "mirror-opponent-rows", default)]
    pub mirror_opponent_rows: bool,
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the persisted Parquet dataset
    #[serde(rename = "dataset-path")]
    pub dataset_path: String,

    /// Path to the visited-clans checkpoint file
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,
}

impl ApiConfig {
    /// Retry policy derived from the configured budget and delays.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

fn default_base_url() -> String {
    "https://api.clashroyale.com/v1".to_string()
}

fn default_token_env() -> String {
    "CLASH_API_TOKEN".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    5000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_max_new_clans() -> usize {
    3
}

fn default_game_mode() -> String {
    "Ladder".to_string()
}
