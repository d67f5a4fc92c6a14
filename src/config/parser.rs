use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r##"
[api]
base-url = "https://api.clashroyale.com/v1"
max-retries = 5

[crawl]
starting-clan-tag = "#L0V9GQQG"
max-new-clans-per-run = 2

[output]
dataset-path = "data/clash_battles.parquet"
checkpoint-path = "checkpoints/visited_clans.json"
"##;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.api.max_retries, 5);
        assert_eq!(config.crawl.starting_clan_tag, "#L0V9GQQG");
        assert_eq!(config.crawl.max_new_clans_per_run, 2);
        // Defaults fill unset keys.
        assert_eq!(config.api.token_env, "CLASH_API_TOKEN");
        assert_eq!(config.crawl.game_mode, "Ladder");
        assert!(!config.crawl.mirror_opponent_rows);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[api]

[crawl]
starting-clan-tag = ""

[output]
dataset-path = "data/clash_battles.parquet"
checkpoint-path = "checkpoints/visited_clans.json"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }
}
