//! Descriptive-text provider wire types (schema variant A).
//! Event meaning lives in a natural-language `description`; the score is an
//! "away - home" string. These map to canonical events in normalize.rs.
use serde::Deserialize;

use crate::coded::WireId;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct DescribedGame {
    pub game_id: String,
    pub season: Option<String>,
    pub date: Option<String>, // ISO 8601 date
    pub home_team_id: Option<WireId>,
    pub away_team_id: Option<WireId>,
    #[serde(default)]
    pub events: Vec<DescribedRow>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct DescribedRow {
    pub period: Option<u8>,
    pub clock: Option<String>, // "11:32", "45.3"
    pub team_id: Option<WireId>,
    pub description: Option<String>,
    /// "away - home", e.g. "102 - 99". Absent on rows that don't change it.
    pub score: Option<String>,
    /// Acting player first. Substitution rows list the incoming player, then the outgoing one.
    #[serde(default)]
    pub player_ids: Vec<WireId>,
}
