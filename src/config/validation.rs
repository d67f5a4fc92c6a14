use crate::config::types::Config;
use crate::tag;
use crate::ConfigError;
use url::Url;

/// Validates a parsed configuration
///
/// Checks everything a bad run would otherwise only discover at the first
/// network call or the first flush: seed tag shape, retry budget, base URL,
/// credential env name, and output paths.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let seed = tag::canonical(&config.crawl.starting_clan_tag);
    if !tag::is_valid(&seed) {
        return Err(ConfigError::Validation(format!(
            "starting-clan-tag {:?} is not a valid clan tag",
            config.crawl.starting_clan_tag
        )));
    }

    if config.crawl.max_new_clans_per_run == 0 {
        return Err(ConfigError::Validation(
            "max-new-clans-per-run must be at least 1".to_string(),
        ));
    }

    if config.crawl.game_mode.is_empty() {
        return Err(ConfigError::Validation(
            "game-mode must not be empty".to_string(),
        ));
    }

    if config.api.max_retries == 0 {
        return Err(ConfigError::Validation(
            "max-retries must be at least 1".to_string(),
        ));
    }

    let base = Url::parse(&config.api.base_url)
        .map_err(|e| ConfigError::InvalidBaseUrl(format!("{}: {}", config.api.base_url, e)))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidBaseUrl(format!(
            "{}: scheme must be http or https",
            config.api.base_url
        )));
    }

    if config.api.token_env.is_empty() {
        return Err(ConfigError::Validation(
            "token-env must name an environment variable".to_string(),
        ));
    }

    if config.output.dataset_path.is_empty() {
        return Err(ConfigError::Validation(
            "dataset-path must not be empty".to_string(),
        ));
    }

    if config.output.checkpoint_path.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint-path must not be empty".to_string(),
        ));
    }

    Ok(())
}
