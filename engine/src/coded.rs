//! Coded provider wire types (schema variant B).
//! Event meaning comes from an integer type code plus an action subtype.
//! There is no team header: team identity only appears on player-action fields.
use serde::Deserialize;
use std::fmt;

use crate::FreeThrowSequence;

pub const MADE_SHOT: i32 = 1;
pub const MISSED_SHOT: i32 = 2;
pub const FREE_THROW: i32 = 3;
pub const OFFENSIVE_REBOUND: i32 = 4;
pub const DEFENSIVE_REBOUND: i32 = 5;
pub const TURNOVER: i32 = 6;
pub const FOUL: i32 = 7;
pub const VIOLATION: i32 = 8;
pub const SUBSTITUTION: i32 = 9;
pub const TIMEOUT: i32 = 10;
pub const JUMP_BALL: i32 = 11;
pub const PERIOD_START: i32 = 12;
pub const PERIOD_END: i32 = 13;

/// Rebound subtype for a player (live-ball) rebound; anything else is a team rebound.
pub const PLAYER_REBOUND: i32 = 0;

/// Providers send ids as strings or bare numbers.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    /// Canonical id string, `None` for blanks and the provider's `0` placeholder.
    pub fn to_id(&self) -> Option<String> {
        match self {
            WireId::Text(s) => {
                let s = s.trim();
                (!s.is_empty() && s != "0").then(|| s.to_owned())
            }
            WireId::Number(0) => None,
            WireId::Number(n) => Some(n.to_string()),
        }
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireId::Text(s) => write!(f, "{s}"),
            WireId::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CodedGame {
    pub game_id: String,
    pub season: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub events: Vec<CodedRow>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CodedRow {
    pub event_num: Option<u32>,
    pub period: Option<u8>,
    pub clock: Option<String>, // "PT11M32.00S" or "11:32"
    pub action_type: i32,
    #[serde(default)]
    pub subtype: i32,
    /// Points awarded by this row; the running score is rebuilt from these.
    pub points: Option<u16>,
    pub player1_id: Option<WireId>,
    pub player1_team_id: Option<WireId>,
    pub player2_id: Option<WireId>,
    pub player2_team_id: Option<WireId>,
    pub player3_id: Option<WireId>,
    pub player3_team_id: Option<WireId>,
}

impl CodedRow {
    /// (player id, team id) for the three player-action slots, in order.
    pub fn player_refs(&self) -> [(Option<String>, Option<String>); 3] {
        let pair = |id: &Option<WireId>, team: &Option<WireId>| {
            (id.as_ref().and_then(WireId::to_id), team.as_ref().and_then(WireId::to_id))
        };
        [
            pair(&self.player1_id, &self.player1_team_id),
            pair(&self.player2_id, &self.player2_team_id),
            pair(&self.player3_id, &self.player3_team_id),
        ]
    }
}

/// "N of M" for a free-throw subtype. Unlisted subtypes (technicals) are untagged.
pub fn free_throw_sequence(subtype: i32) -> Option<FreeThrowSequence> {
    let (number, total) = match subtype {
        10 | 20 => (1, 1),
        11 | 18 | 21 | 25 => (1, 2),
        12 | 19 | 22 | 26 => (2, 2),
        13 | 27 => (1, 3),
        14 | 28 => (2, 3),
        15 | 29 => (3, 3),
        _ => return None,
    };
    Some(FreeThrowSequence { number, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_ids_accept_strings_and_numbers() {
        let ids: Vec<WireId> = serde_json::from_str(r#"["1610612747", 203999, " ", 0]"#).unwrap();
        let ids: Vec<Option<String>> = ids.iter().map(WireId::to_id).collect();
        assert_eq!(
            ids,
            vec![Some("1610612747".into()), Some("203999".into()), None, None]
        );
    }

    #[test]
    fn free_throw_subtypes_map_to_sequence_positions() {
        assert_eq!(free_throw_sequence(11), Some(FreeThrowSequence { number: 1, total: 2 }));
        assert!(free_throw_sequence(12).unwrap().is_last());
        assert!(!free_throw_sequence(14).unwrap().is_last());
        assert_eq!(free_throw_sequence(16), None, "technical is untagged");
    }

    #[test]
    fn player_refs_keep_slot_order() {
        let row: CodedRow = serde_json::from_value(serde_json::json!({
            "action_type": 9,
            "player1_id": 11, "player1_team_id": 100,
            "player2_id": "12", "player2_team_id": "100"
        }))
        .unwrap();
        let refs = row.player_refs();
        assert_eq!(refs[0], (Some("11".into()), Some("100".into())));
        assert_eq!(refs[1], (Some("12".into()), Some("100".into())));
        assert_eq!(refs[2], (None, None));
    }
}
