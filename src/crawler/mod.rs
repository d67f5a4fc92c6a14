//! Crawl orchestration
//!
//! See [`Orchestrator`] for the traversal state machine. The [`crawl`]
//! helper wires up the production HTTP transport from a config and token.

mod orchestrator;

pub use orchestrator::{Orchestrator, RunSummary};

use crate::client::HttpTransport;
use crate::config::Config;
use crate::{HarvestError, Result};

/// Runs one crawl iteration with the production HTTP transport.
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `token` - The externally supplied API credential
pub async fn crawl(config: Config, token: &str) -> Result<RunSummary> {
    let transport = HttpTransport::new(token).map_err(HarvestError::Reqwest)?;
    let mut orchestrator = Orchestrator::new(config, transport)?;
    orchestrator.run().await
}
