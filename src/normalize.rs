//! Battle normalization
//!
//! Converts one raw battle-log entry into a flat [`MatchRow`] matching the
//! dataset schema. Normalization is a pure function: the same raw record and
//! mode filter always produce the same row or the same skip decision.
//! Records missing required fields are skipped, never fatal.

use crate::api::Battle;
use crate::tag;
use chrono::NaiveDateTime;
use serde_json::Value;

/// Decks are emitted as exactly this many ordered card names; battles with
/// any other deck size are skipped.
pub const DECK_SIZE: usize = 8;

/// Fixed-arity ordered deck of card names
pub type Deck = [String; DECK_SIZE];

/// One flattened, analysis-ready battle record, the unit persisted to the
/// Parquet dataset. Keyed by `(player_tag, battle_time)` for deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRow {
    pub player_tag: String,
    pub opponent_tag: String,
    pub player_deck: Deck,
    pub opponent_deck: Deck,
    pub player_trophies: Option<i64>,
    pub opponent_trophies: Option<i64>,
    pub player_crowns: i64,
    pub opponent_crowns: i64,
    /// Battle start time, milliseconds since the Unix epoch.
    pub battle_time: i64,
    pub game_mode: String,
    /// Opponent's clan tag, canonical form. Feeds frontier discovery.
    pub opponent_clan: Option<String>,
    /// 1 if the player took more crowns than the opponent, else 0.
    pub result: i64,
}

impl MatchRow {
    /// Deduplication key within the dataset.
    pub fn key(&self) -> (&str, i64) {
        (&self.player_tag, self.battle_time)
    }
}

/// Normalizes one raw battle into a [`MatchRow`].
///
/// Returns `None` (skip) when the record is malformed, misses required
/// fields, has a deck of the wrong arity, or does not match `mode_filter`.
pub fn normalize(raw: &Value, mode_filter: Option<&str>) -> Option<MatchRow> {
    let battle: Battle = match serde_json::from_value(raw.clone()) {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!("Skipping malformed battle record: {}", e);
            return None;
        }
    };

    let mode = battle.game_mode.as_ref().map(|m| m.name.as_str())?;
    if let Some(wanted) = mode_filter {
        if mode != wanted {
            return None;
        }
    }

    let player = battle.team.first()?;
    let opponent = battle.opponent.first()?;

    let player_deck = deck_of(player.cards.iter().map(|c| c.name.clone()))?;
    let opponent_deck = deck_of(opponent.cards.iter().map(|c| c.name.clone()))?;

    let battle_time = parse_battle_time(&battle.battle_time)?;

    Some(MatchRow {
        player_tag: tag::canonical(&player.tag),
        opponent_tag: tag::canonical(&opponent.tag),
        player_deck,
        opponent_deck,
        player_trophies: player.starting_trophies,
        opponent_trophies: opponent.starting_trophies,
        player_crowns: player.crowns,
        opponent_crowns: opponent.crowns,
        battle_time,
        game_mode: mode.to_string(),
        opponent_clan: opponent.clan.as_ref().map(|c| tag::canonical(&c.tag)),
        result: i64::from(player.crowns > opponent.crowns),
    })
}

/// Flips a row into the opponent's perspective.
///
/// The flipped row has no opponent-clan reference: the original player's
/// clan is the one currently being traversed, so re-discovering it would
/// only churn the frontier.
pub fn mirror(row: &MatchRow) -> MatchRow {
    MatchRow {
        player_tag: row.opponent_tag.clone(),
        opponent_tag: row.player_tag.clone(),
        player_deck: row.opponent_deck.clone(),
        opponent_deck: row.player_deck.clone(),
        player_trophies: row.opponent_trophies,
        opponent_trophies: row.player_trophies,
        player_crowns: row.opponent_crowns,
        opponent_crowns: row.player_crowns,
        battle_time: row.battle_time,
        game_mode: row.game_mode.clone(),
        opponent_clan: None,
        result: 1 - row.result,
    }
}

fn deck_of(cards: impl Iterator<Item = String>) -> Option<Deck> {
    let cards: Vec<String> = cards.collect();
    match cards.try_into() {
        Ok(deck) => Some(deck),
        Err(cards) => {
            tracing::debug!(
                "Skipping battle with a {}-card deck (expected {})",
                cards.len(),
                DECK_SIZE
            );
            None
        }
    }
}

/// Parses the API's compact battle timestamp (`20250812T193204.000Z`) into
/// milliseconds since the Unix epoch.
fn parse_battle_time(s: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S%.3fZ")
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}
