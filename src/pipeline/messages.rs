use pbp_engine::GameOutput;
use std::path::PathBuf;

/// One game file to process.
#[derive(Debug, Clone)]
pub struct GameRequest {
    pub path: PathBuf,
}

#[derive(Debug)]
pub enum GameResponse {
    Completed { path: PathBuf, output: GameOutput },
    /// The game was skipped; other games are unaffected.
    Failed { path: PathBuf, message: String },
}
