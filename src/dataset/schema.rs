//! Arrow schema for the battle dataset and row/batch conversion
//!
//! The schema here is the on-disk contract of the Parquet file. Decks are
//! fixed-size lists of exactly [`DECK_SIZE`] card names; trophy counts and
//! the opponent clan are nullable, everything else is required.

use crate::dataset::DatasetError;
use crate::normalize::{Deck, MatchRow, DECK_SIZE};
use arrow::array::{
    Array, FixedSizeListArray, FixedSizeListBuilder, Int64Array, StringArray, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

fn deck_type() -> DataType {
    DataType::FixedSizeList(
        Arc::new(Field::new("item", DataType::Utf8, true)),
        DECK_SIZE as i32,
    )
}

/// The canonical dataset schema, one row per [`MatchRow`].
pub fn match_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("player_tag", DataType::Utf8, false),
        Field::new("opponent_tag", DataType::Utf8, false),
        Field::new("player_deck", deck_type(), false),
        Field::new("opponent_deck", deck_type(), false),
        Field::new("player_trophies", DataType::Int64, true),
        Field::new("opponent_trophies", DataType::Int64, true),
        Field::new("player_crowns", DataType::Int64, false),
        Field::new("opponent_crowns", DataType::Int64, false),
        Field::new("battle_time", DataType::Int64, false),
        Field::new("game_mode", DataType::Utf8, false),
        Field::new("opponent_clan", DataType::Utf8, true),
        Field::new("result", DataType::Int64, false),
    ]))
}

/// Builds a single record batch from rows.
pub fn rows_to_batch(rows: &[MatchRow]) -> Result<RecordBatch, DatasetError> {
    let schema = match_schema();

    let player_tags = StringArray::from(
        rows.iter()
            .map(|r| Some(r.player_tag.as_str()))
            .collect::<Vec<_>>(),
    );
    let opponent_tags = StringArray::from(
        rows.iter()
            .map(|r| Some(r.opponent_tag.as_str()))
            .collect::<Vec<_>>(),
    );
    let player_decks = decks_array(rows.iter().map(|r| &r.player_deck));
    let opponent_decks = decks_array(rows.iter().map(|r| &r.opponent_deck));
    let player_trophies = Int64Array::from(rows.iter().map(|r| r.player_trophies).collect::<Vec<_>>());
    let opponent_trophies =
        Int64Array::from(rows.iter().map(|r| r.opponent_trophies).collect::<Vec<_>>());
    let player_crowns = Int64Array::from(rows.iter().map(|r| r.player_crowns).collect::<Vec<_>>());
    let opponent_crowns =
        Int64Array::from(rows.iter().map(|r| r.opponent_crowns).collect::<Vec<_>>());
    let battle_times = Int64Array::from(rows.iter().map(|r| r.battle_time).collect::<Vec<_>>());
    let game_modes = StringArray::from(
        rows.iter()
            .map(|r| Some(r.game_mode.as_str()))
            .collect::<Vec<_>>(),
    );
    let opponent_clans = StringArray::from(
        rows.iter()
            .map(|r| r.opponent_clan.as_deref())
            .collect::<Vec<_>>(),
    );
    let results = Int64Array::from(rows.iter().map(|r| r.result).collect::<Vec<_>>());

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(player_tags),
            Arc::new(opponent_tags),
            Arc::new(player_decks),
            Arc::new(opponent_decks),
            Arc::new(player_trophies),
            Arc::new(opponent_trophies),
            Arc::new(player_crowns),
            Arc::new(opponent_crowns),
            Arc::new(battle_times),
            Arc::new(game_modes),
            Arc::new(opponent_clans),
            Arc::new(results),
        ],
    )
    .map_err(|e| DatasetError::Schema {
        message: format!("record batch build failed: {e}"),
    })
}

fn decks_array<'a>(decks: impl Iterator<Item = &'a Deck>) -> FixedSizeListArray {
    let mut builder = FixedSizeListBuilder::new(StringBuilder::new(), DECK_SIZE as i32);
    for deck in decks {
        for card in deck {
            builder.values().append_value(card);
        }
        builder.append(true);
    }
    builder.finish()
}

/// Converts a record batch back into rows.
pub fn batch_to_rows(batch: &RecordBatch) -> Result<Vec<MatchRow>, DatasetError> {
    let player_tags = col_string(batch, "player_tag")?;
    let opponent_tags = col_string(batch, "opponent_tag")?;
    let player_decks = col_deck(batch, "player_deck")?;
    let opponent_decks = col_deck(batch, "opponent_deck")?;
    let player_trophies = col_i64(batch, "player_trophies")?;
    let opponent_trophies = col_i64(batch, "opponent_trophies")?;
    let player_crowns = col_i64(batch, "player_crowns")?;
    let opponent_crowns = col_i64(batch, "opponent_crowns")?;
    let battle_times = col_i64(batch, "battle_time")?;
    let game_modes = col_string(batch, "game_mode")?;
    let opponent_clans = col_string(batch, "opponent_clan")?;
    let results = col_i64(batch, "result")?;

    let mut rows = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        rows.push(MatchRow {
            player_tag: player_tags.value(i).to_string(),
            opponent_tag: opponent_tags.value(i).to_string(),
            player_deck: deck_at(player_decks, i)?,
            opponent_deck: deck_at(opponent_decks, i)?,
            player_trophies: opt_i64(player_trophies, i),
            opponent_trophies: opt_i64(opponent_trophies, i),
            player_crowns: player_crowns.value(i),
            opponent_crowns: opponent_crowns.value(i),
            battle_time: battle_times.value(i),
            game_mode: game_modes.value(i).to_string(),
            opponent_clan: if opponent_clans.is_null(i) {
                None
            } else {
                Some(opponent_clans.value(i).to_string())
            },
            result: results.value(i),
        });
    }
    Ok(rows)
}

fn col_index(batch: &RecordBatch, name: &str) -> Result<usize, DatasetError> {
    batch
        .schema()
        .index_of(name)
        .map_err(|e| DatasetError::Schema {
            message: format!("missing column '{name}': {e}"),
        })
}

fn col_string<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, DatasetError> {
    let idx = col_index(batch, name)?;
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| DatasetError::Schema {
            message: format!("column '{name}' is not StringArray"),
        })
}

fn col_i64<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array, DatasetError> {
    let idx = col_index(batch, name)?;
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| DatasetError::Schema {
            message: format!("column '{name}' is not Int64Array"),
        })
}

fn col_deck<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a FixedSizeListArray, DatasetError> {
    let idx = col_index(batch, name)?;
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<FixedSizeListArray>()
        .ok_or_else(|| DatasetError::Schema {
            message: format!("column '{name}' is not FixedSizeListArray"),
        })
}

fn opt_i64(array: &Int64Array, row: usize) -> Option<i64> {
    if array.is_null(row) {
        None
    } else {
        Some(array.value(row))
    }
}

fn deck_at(decks: &FixedSizeListArray, row: usize) -> Result<Deck, DatasetError> {
    let values = decks.value(row);
    let cards = values
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| DatasetError::Schema {
            message: "deck items are not StringArray".to_string(),
        })?;

    let list: Vec<String> = (0..cards.len()).map(|i| cards.value(i).to_string()).collect();
    list.try_into().map_err(|bad: Vec<String>| DatasetError::Schema {
        message: format!("deck has {} cards, expected {}", bad.len(), DECK_SIZE),
    })
}
