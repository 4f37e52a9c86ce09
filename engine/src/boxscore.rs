//! Box-score wire types (ESPN summary shape), read for their starter flags.
//! This is the authoritative starting-lineup source; inference only runs
//! when a team is missing here.
use serde::Deserialize;
use std::collections::HashMap;

use crate::coded::WireId;
use crate::game::{EngineError, EngineResult};
use crate::{LINEUP_SIZE, StartingLineups};

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SummaryResponse {
    pub boxscore: Option<EspnBoxscore>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EspnBoxscore {
    pub players: Option<Vec<EspnTeamPlayers>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnTeamPlayers {
    pub team: Option<EspnTeam>,
    pub statistics: Option<Vec<EspnStatCategory>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnTeam {
    pub id: Option<WireId>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnStatCategory {
    pub name: Option<String>,
    pub athletes: Option<Vec<EspnAthleteStats>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnAthleteStats {
    pub athlete: Option<EspnAthlete>,
    pub starter: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnAthlete {
    pub id: Option<WireId>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

/// Game starters per team from the `starter` flags. Teams without an id are skipped.
pub fn starters_from_boxscore(boxscore: &EspnBoxscore) -> StartingLineups {
    let mut game = HashMap::new();
    for team_data in boxscore.players.iter().flatten() {
        let Some(team_id) = team_data.team.as_ref().and_then(|t| t.id.as_ref()).and_then(WireId::to_id)
        else {
            continue;
        };

        // Prefer the "athletes" category; some feeds leave it unnamed.
        let categories = team_data.statistics.as_deref().unwrap_or_default();
        let athletes = categories
            .iter()
            .find(|c| c.name.as_deref() == Some("athletes"))
            .or_else(|| categories.first())
            .and_then(|c| c.athletes.as_deref())
            .unwrap_or_default();

        let starters: Vec<String> = athletes
            .iter()
            .filter(|a| a.starter == Some(true))
            .filter_map(|a| a.athlete.as_ref()?.id.as_ref()?.to_id())
            .take(LINEUP_SIZE)
            .collect();
        if !starters.is_empty() {
            game.insert(team_id, starters);
        }
    }
    StartingLineups { game, periods: Default::default() }
}

/// Parse a `{ game_id: summary }` document into starters keyed by game id.
pub fn load_boxscores(json: &str) -> EngineResult<HashMap<String, StartingLineups>> {
    let raw: HashMap<String, SummaryResponse> =
        serde_json::from_str(json).map_err(|e| EngineError::Parsing(format!("box scores: {e}")))?;
    Ok(raw
        .into_iter()
        .filter_map(|(game_id, summary)| {
            let starters = starters_from_boxscore(summary.boxscore.as_ref()?);
            (!starters.game.is_empty()).then_some((game_id, starters))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn athlete(id: u32, starter: bool) -> serde_json::Value {
        json!({ "athlete": { "id": id.to_string(), "displayName": format!("Player {id}") }, "starter": starter })
    }

    #[test]
    fn starters_come_from_flags() {
        let doc = json!({
            "401": {
                "boxscore": {
                    "players": [
                        {
                            "team": { "id": "100", "displayName": "Home" },
                            "statistics": [{
                                "name": "athletes",
                                "athletes": [athlete(1, true), athlete(2, true), athlete(3, true),
                                             athlete(4, true), athlete(5, true), athlete(6, false)]
                            }]
                        },
                        {
                            "team": { "id": 200 },
                            "statistics": [{ "athletes": [athlete(11, true), athlete(12, false)] }]
                        },
                        { "statistics": [{ "athletes": [athlete(21, true)] }] }
                    ]
                }
            },
            "402": { "boxscore": { "players": [] } }
        });

        let loaded = load_boxscores(&doc.to_string()).unwrap();
        assert_eq!(loaded.len(), 1, "games without starters are dropped");
        let starters = &loaded["401"].game;
        assert_eq!(starters["100"], vec!["1", "2", "3", "4", "5"]);
        assert_eq!(starters["200"], vec!["11"]);
        assert_eq!(starters.len(), 2);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        assert!(matches!(load_boxscores("[1, 2]"), Err(EngineError::Parsing(_))));
    }
}
