//! Configuration loading and validation
//!
//! Configuration is a TOML file with kebab-case keys. The API credential is
//! never stored in the file; the config only names the environment variable
//! that holds it.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{ApiConfig, Config, CrawlConfig, OutputConfig};
pub use validation::validate;
