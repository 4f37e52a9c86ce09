use crate::pipeline::messages::{GameRequest, GameResponse};
use anyhow::Context;
use futures_util::{StreamExt, stream};
use log::{debug, error};
use pbp_engine::{EngineConfig, EngineResult, GameOutput, RawGame, StartingLineups, process_game};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs games concurrently, at most `jobs` at a time. Games share nothing but
/// read-only config and starters.
pub struct GameWorker {
    config: Arc<EngineConfig>,
    starters: Arc<HashMap<String, StartingLineups>>,
    jobs: usize,
    responses: mpsc::Sender<GameResponse>,
}

impl GameWorker {
    pub fn new(
        config: Arc<EngineConfig>,
        starters: Arc<HashMap<String, StartingLineups>>,
        jobs: usize,
        responses: mpsc::Sender<GameResponse>,
    ) -> Self {
        Self { config, starters, jobs: jobs.max(1), responses }
    }

    pub async fn run(self, requests: Vec<GameRequest>) {
        let mut results = stream::iter(requests)
            .map(|request| self.handle_game(request))
            .buffer_unordered(self.jobs);

        while let Some(response) = results.next().await {
            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send game response: {e}");
                break;
            }
        }
    }

    async fn handle_game(&self, request: GameRequest) -> GameResponse {
        debug!("processing {}", request.path.display());
        let config = Arc::clone(&self.config);
        let starters = Arc::clone(&self.starters);
        let path = request.path.clone();

        let result = tokio::task::spawn_blocking(move || -> EngineResult<GameOutput> {
            let raw = RawGame::from_path(&path)?;
            process_game(raw, &*starters, &config)
        })
        .await;

        match result {
            Ok(Ok(output)) => GameResponse::Completed { path: request.path, output },
            Ok(Err(e)) => GameResponse::Failed { path: request.path, message: e.to_string() },
            Err(e) => GameResponse::Failed {
                path: request.path,
                message: format!("game worker panicked: {e}"),
            },
        }
    }
}

/// Expand inputs into game files: files as given, directories to their
/// `*.json` entries in name order.
pub fn collect_requests(inputs: &[PathBuf]) -> anyhow::Result<Vec<GameRequest>> {
    let mut requests = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            requests.push(GameRequest { path: input.clone() });
            continue;
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(input)
            .with_context(|| format!("could not read directory {}", input.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();
        requests.extend(paths.into_iter().map(|path| GameRequest { path }));
    }
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("possessions-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_game(dir: &Path, file: &str, game_id: &str) -> PathBuf {
        let path = dir.join(file);
        let game = json!({
            "schema": "described",
            "game_id": game_id,
            "away_team_id": "A",
            "home_team_id": "B",
            "events": [
                { "period": 1, "clock": "11:40", "team_id": "A", "description": "Guard makes jump shot", "score": "2 - 0" },
                { "period": 1, "clock": "11:20", "team_id": "B", "description": "Forward bad pass turnover" }
            ]
        });
        std::fs::write(&path, game.to_string()).unwrap();
        path
    }

    #[test]
    fn directories_expand_to_sorted_json_files() {
        let dir = scratch_dir("collect");
        write_game(&dir, "b.json", "2");
        write_game(&dir, "a.json", "1");
        std::fs::write(dir.join("notes.txt"), "skip me").unwrap();

        let extra = PathBuf::from("missing.json");
        let requests = collect_requests(&[dir.clone(), extra.clone()]).unwrap();
        let paths: Vec<PathBuf> = requests.into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec![dir.join("a.json"), dir.join("b.json"), extra]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn failed_games_do_not_stop_the_batch() {
        let dir = scratch_dir("worker");
        let good = write_game(&dir, "good.json", "ok");
        let bad = dir.join("bad.json");
        std::fs::write(&bad, r#"{ "schema": "described", "game_id": "empty", "events": [] }"#).unwrap();
        let missing = dir.join("missing.json");

        let (tx, mut rx) = mpsc::channel(10);
        let worker = GameWorker::new(Arc::new(EngineConfig::default()), Arc::new(HashMap::new()), 2, tx);
        let requests = [&good, &bad, &missing].map(|p| GameRequest { path: p.clone() }).to_vec();
        worker.run(requests).await;

        let mut completed = Vec::new();
        let mut failed = Vec::new();
        while let Some(response) = rx.recv().await {
            match response {
                GameResponse::Completed { output, .. } => completed.push(output),
                GameResponse::Failed { path, message } => failed.push((path, message)),
            }
        }
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].possessions.len(), 2);
        assert_eq!(failed.len(), 2);
        assert!(failed.iter().any(|(p, m)| p == &bad && m.contains("no events")));
        assert!(failed.iter().any(|(p, m)| p == &missing && m.starts_with("I/O error")));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
