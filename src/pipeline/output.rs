use pbp_engine::{GameOutput, Possession};
use serde::Serialize;
use std::io::{self, Write};

/// One output line: the possession plus its `game:sequence` id.
#[derive(Serialize)]
struct PossessionRow<'a> {
    possession_id: String,
    #[serde(flatten)]
    possession: &'a Possession,
}

/// Writes finished games as JSON lines, one possession per line.
pub struct PossessionWriter<W: Write> {
    inner: W,
    rows: usize,
}

impl<W: Write> PossessionWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, rows: 0 }
    }

    pub fn write_game(&mut self, output: &GameOutput) -> anyhow::Result<usize> {
        for possession in &output.possessions {
            let row = PossessionRow { possession_id: possession.possession_id(), possession };
            serde_json::to_writer(&mut self.inner, &row)?;
            self.inner.write_all(b"\n")?;
        }
        self.rows += output.possessions.len();
        Ok(output.possessions.len())
    }

    /// Flush and return the total rows written.
    pub fn finish(mut self) -> io::Result<usize> {
        self.inner.flush()?;
        Ok(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbp_engine::{EngineConfig, RawGame, process_game};
    use serde_json::{Value, json};

    #[test]
    fn one_line_per_possession() {
        let raw: RawGame = serde_json::from_value(json!({
            "schema": "described",
            "game_id": "401",
            "away_team_id": "A",
            "home_team_id": "B",
            "events": [
                { "period": 1, "clock": "11:40", "team_id": "A", "description": "Guard makes three point jumper", "score": "3 - 0", "player_ids": ["7"] },
                { "period": 1, "clock": "11:20", "team_id": "B", "description": "Center defensive rebound" }
            ]
        }))
        .unwrap();
        let output = process_game(raw, &(), &EngineConfig::default()).unwrap();

        let mut writer = PossessionWriter::new(Vec::new());
        assert_eq!(writer.write_game(&output).unwrap(), 2);
        let buffer = writer.inner.clone();
        assert_eq!(writer.finish().unwrap(), 2);

        let lines: Vec<Value> = String::from_utf8(buffer)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        let first = &lines[0];
        assert_eq!(first["possession_id"], "401:1");
        assert_eq!(first["result"], "made_fg");
        assert_eq!(first["points_scored"], 3);
        assert_eq!(first["is_clutch"], false);
        let lineup = first["offense_lineup"].as_array().unwrap();
        assert_eq!(lineup.len(), 5);
        assert_eq!(lineup[0], "7");
        assert!(lineup[1].is_null());
        assert_eq!(first["offense_lineup_hash"], "7");
    }
}
