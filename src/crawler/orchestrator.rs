//! Crawl orchestrator - main traversal and commit logic
//!
//! Drives a breadth-first expansion over the clan graph:
//! load durable state, select the frontier, then for each clan fetch the
//! roster, fetch each member's battle log, normalize, and commit. The commit
//! (dataset append + flush, then visited add + flush) is the unit of
//! recoverable work: a crash mid-clan repeats that clan on resume, and the
//! dataset's dedup makes the repeat idempotent.

use crate::checkpoint::VisitedClans;
use crate::client::{ApiClient, ClientError, Transport};
use crate::config::Config;
use crate::dataset::ParquetDataset;
use crate::normalize::{mirror, normalize, MatchRow};
use crate::tag;
use crate::HarvestError;
use std::path::Path;

/// Outcome of one completed run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Clans committed this run (including not-found ones marked visited)
    pub clans_processed: usize,

    /// Rows added to the dataset after deduplication
    pub rows_added: usize,

    /// Battle records skipped during normalization
    pub battles_skipped: usize,

    /// Total rows in the dataset after the run
    pub total_rows: usize,
}

/// What processing a single clan produced
struct ClanHarvest {
    rows: Vec<MatchRow>,
    skipped: usize,
}

/// Main orchestrator, sole owner and writer of the durable state
pub struct Orchestrator<T> {
    config: Config,
    client: ApiClient<T>,
    visited: VisitedClans,
    dataset: ParquetDataset,
    last_committed: Option<String>,
}

impl<T: Transport> Orchestrator<T> {
    /// Creates an orchestrator, loading prior durable state from the
    /// configured paths.
    pub fn new(config: Config, transport: T) -> Result<Self, HarvestError> {
        let client = ApiClient::new(
            transport,
            config.api.base_url.clone(),
            config.api.retry_policy(),
        );
        let visited = VisitedClans::load(Path::new(&config.output.checkpoint_path));
        let dataset = ParquetDataset::load(Path::new(&config.output.dataset_path))?;

        Ok(Self {
            config,
            client,
            visited,
            dataset,
            last_committed: None,
        })
    }

    /// Runs one crawl iteration to completion.
    ///
    /// Terminates normally when the frontier is exhausted or the per-run
    /// clan budget is spent. The only fatal paths are a rejected credential
    /// and retry exhaustion on the clan currently being processed; state
    /// committed for earlier clans survives either.
    pub async fn run(&mut self) -> Result<RunSummary, HarvestError> {
        let frontier = self.select_frontier();
        if frontier.is_empty() {
            tracing::info!("Frontier is empty, nothing to do");
            return Ok(RunSummary {
                total_rows: self.dataset.len(),
                ..RunSummary::default()
            });
        }

        tracing::info!("Selected frontier of {} clans: {:?}", frontier.len(), frontier);

        let mut summary = RunSummary::default();

        for clan_tag in &frontier {
            match self.process_clan(clan_tag).await {
                Ok(harvest) => {
                    summary.battles_skipped += harvest.skipped;
                    summary.rows_added += self.commit(clan_tag, harvest.rows)?;
                    summary.clans_processed += 1;
                }
                Err(e) => {
                    match &self.last_committed {
                        Some(tag) => tracing::error!(
                            "Run aborted on clan {}; last committed clan was {}",
                            clan_tag,
                            tag
                        ),
                        None => tracing::error!(
                            "Run aborted on clan {}; nothing committed this run",
                            clan_tag
                        ),
                    }
                    return Err(e);
                }
            }
        }

        summary.total_rows = self.dataset.len();
        tracing::info!(
            "Run complete: {} clans processed, {} rows added ({} battles skipped), {} rows total",
            summary.clans_processed,
            summary.rows_added,
            summary.battles_skipped,
            summary.total_rows
        );

        Ok(summary)
    }

    /// Derives this run's frontier.
    ///
    /// An empty visited set seeds the traversal with the configured starting
    /// clan. Otherwise the frontier is the unvisited opponent clans
    /// referenced by committed rows, in first-appearance order, capped at
    /// the per-run budget.
    fn select_frontier(&self) -> Vec<String> {
        if self.visited.is_empty() {
            return vec![tag::canonical(&self.config.crawl.starting_clan_tag)];
        }

        self.dataset
            .opponent_clans()
            .into_iter()
            .filter(|clan| !self.visited.contains(clan))
            .take(self.config.crawl.max_new_clans_per_run)
            .collect()
    }

    /// Fetches and normalizes all battles of one clan's members.
    ///
    /// A missing or denied roster yields an empty harvest so the clan still
    /// gets marked visited instead of being retried forever. Per-member
    /// failures are skipped, except a rejected credential, which is fatal.
    async fn process_clan(&mut self, clan_tag: &str) -> Result<ClanHarvest, HarvestError> {
        let members = match self.client.clan_members(clan_tag).await {
            Ok(members) => members,
            Err(
                e @ (ClientError::NotFound { .. }
                | ClientError::Unauthorized { .. }
                | ClientError::Parse { .. }),
            ) => {
                tracing::warn!("No roster for clan {}: {}, marking visited", clan_tag, e);
                return Ok(ClanHarvest {
                    rows: Vec::new(),
                    skipped: 0,
                });
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Processing {} members of clan {}", members.len(), clan_tag);

        let mode = self.config.crawl.game_mode.clone();
        let mut rows = Vec::new();
        let mut skipped = 0;

        for member in &members {
            let battles = match self.client.battle_log(member).await {
                Ok(battles) => battles,
                Err(e @ ClientError::Unauthorized { .. }) => return Err(e.into()),
                Err(e) => {
                    tracing::warn!("Skipping player {}: {}", member, e);
                    continue;
                }
            };

            for raw in &battles {
                match normalize(raw, Some(&mode)) {
                    Some(row) => {
                        if self.config.crawl.mirror_opponent_rows {
                            rows.push(mirror(&row));
                        }
                        rows.push(row);
                    }
                    None => skipped += 1,
                }
            }
        }

        Ok(ClanHarvest { rows, skipped })
    }

    /// Commits one clan: merge rows into the dataset, flush it, then mark
    /// the clan visited and flush the checkpoint. Dataset first, so a crash
    /// between the flushes re-processes the clan and the dedup absorbs it.
    fn commit(&mut self, clan_tag: &str, rows: Vec<MatchRow>) -> Result<usize, HarvestError> {
        let added = self.dataset.append(rows);
        self.dataset.flush()?;

        self.visited.add(clan_tag);
        self.visited.flush()?;

        self.last_committed = Some(clan_tag.to_string());
        tracing::info!("Committed clan {}: {} new rows", clan_tag, added);
        Ok(added)
    }

    /// Rows currently held in the dataset (visible for tests and callers).
    pub fn dataset(&self) -> &ParquetDataset {
        &self.dataset
    }

    /// The visited-clans checkpoint (visible for tests and callers).
    pub fn visited(&self) -> &VisitedClans {
        &self.visited
    }
}
