//! Serde models for the consumed API surface
//!
//! Only the fields the harvester actually reads are modeled; the API returns
//! far more. Battle-log entries are deserialized individually (from raw
//! `serde_json::Value`s) so one malformed entry cannot poison the rest of a
//! player's log.

use serde::Deserialize;

/// Response body of `clans/%23TAG/members`
#[derive(Debug, Clone, Deserialize)]
pub struct MemberList {
    pub items: Vec<Member>,
}

/// One clan roster entry
#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub tag: String,
}

/// One battle-log entry, as returned by `players/%23TAG/battlelog`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Battle {
    /// Compact timestamp, e.g. `20250812T193204.000Z`
    pub battle_time: String,

    pub game_mode: Option<GameMode>,

    /// The player's side. Ladder battles have exactly one entry.
    #[serde(default)]
    pub team: Vec<Participant>,

    /// The opposing side.
    #[serde(default)]
    pub opponent: Vec<Participant>,
}

/// Game mode metadata of a battle
#[derive(Debug, Clone, Deserialize)]
pub struct GameMode {
    pub name: String,
}

/// One side of a battle
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub tag: String,

    pub crowns: i64,

    /// Trophy count when the battle started; absent for some modes.
    pub starting_trophies: Option<i64>,

    #[serde(default)]
    pub cards: Vec<Card>,

    pub clan: Option<ClanRef>,
}

/// A card in a participant's deck
#[derive(Debug, Clone, Deserialize)]
pub struct Card {
    pub name: String,
}

/// Clan reference attached to a participant
#[derive(Debug, Clone, Deserialize)]
pub struct ClanRef {
    pub tag: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battle_deserializes_with_missing_optionals() {
        let raw = serde_json::json!({
            "battleTime": "20250812T193204.000Z",
            "team": [{"tag": "#AAA", "crowns": 2}],
            "opponent": [{"tag": "#BBB", "crowns": 1}]
        });
        let battle: Battle = serde_json::from_value(raw).unwrap();
        assert!(battle.game_mode.is_none());
        assert_eq!(battle.team[0].crowns, 2);
        assert!(battle.team[0].starting_trophies.is_none());
        assert!(battle.team[0].cards.is_empty());
    }

    #[test]
    fn test_member_list_deserializes() {
        let raw = serde_json::json!({
            "items": [{"tag": "#AAA", "name": "alice"}, {"tag": "#BBB"}]
        });
        let list: MemberList = serde_json::from_value(raw).unwrap();
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].tag, "#AAA");
    }
}
