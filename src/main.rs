mod pipeline;
mod settings;

use crate::pipeline::messages::GameResponse;
use crate::pipeline::output::PossessionWriter;
use crate::pipeline::worker::{GameWorker, collect_requests};
use crate::settings::{CliAction, Settings, usage_text};
use anyhow::Context;
use log::{error, info, warn};
use pbp_engine::boxscore::load_boxscores;
use pbp_engine::{EngineConfig, StartingLineups};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct RunSummary {
    completed: usize,
    failed: usize,
    possessions: usize,
    unbalanced: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(settings) = handle_cli_args() else {
        return Ok(());
    };

    better_panic::install();
    init_logger(&settings);

    let config = Arc::new(EngineConfig::for_league(settings.league));
    let starters = Arc::new(load_starters(settings.boxscores.as_deref())?);
    let requests = collect_requests(&settings.inputs)?;
    info!(
        "processing {} game(s), {} at a time, {:?} clock",
        requests.len(),
        settings.jobs,
        settings.league
    );

    let sink: Box<dyn Write> = match &settings.out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("could not create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };

    let (game_resp_tx, game_resp_rx) = mpsc::channel::<GameResponse>(100);
    let worker = GameWorker::new(config, starters, settings.jobs, game_resp_tx);
    let worker_task = tokio::spawn(worker.run(requests));

    let summary = main_loop(game_resp_rx, PossessionWriter::new(BufWriter::new(sink))).await?;
    worker_task.await?;

    info!(
        "{} game(s) done, {} skipped, {} possessions written, {} failed the points check",
        summary.completed, summary.failed, summary.possessions, summary.unbalanced
    );
    Ok(())
}

fn handle_cli_args() -> Option<Settings> {
    match Settings::load() {
        Ok(CliAction::Run(settings)) => Some(settings),
        Ok(CliAction::Help) => {
            println!("{}", usage_text());
            None
        }
        Ok(CliAction::Version) => {
            println!("possessions {}", env!("CARGO_PKG_VERSION"));
            None
        }
        Err(e) => {
            eprintln!("{e}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

/// `RUST_LOG` takes over completely when set.
fn init_logger(settings: &Settings) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(settings.log_level);
    if std::env::var_os("RUST_LOG").is_some() {
        builder.parse_default_env();
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn load_starters(path: Option<&Path>) -> anyhow::Result<HashMap<String, StartingLineups>> {
    let Some(path) = path else {
        return Ok(HashMap::new());
    };
    let content =
        std::fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;
    let starters = load_boxscores(&content)?;
    info!("loaded starters for {} game(s) from {}", starters.len(), path.display());
    Ok(starters)
}

/// Writes each game as it completes. Nothing from a failed game is written.
async fn main_loop<W: Write>(
    mut game_responses: mpsc::Receiver<GameResponse>,
    mut writer: PossessionWriter<W>,
) -> anyhow::Result<RunSummary> {
    let mut summary = RunSummary::default();
    while let Some(response) = game_responses.recv().await {
        match response {
            GameResponse::Completed { path, output } => {
                if !output.conservation_ok {
                    warn!("{}: possession points do not add up to the final score", path.display());
                    summary.unbalanced += 1;
                }
                summary.possessions += writer.write_game(&output)?;
                summary.completed += 1;
            }
            GameResponse::Failed { path, message } => {
                error!("skipping {}: {message}", path.display());
                summary.failed += 1;
            }
        }
    }
    writer.finish()?;
    Ok(summary)
}
