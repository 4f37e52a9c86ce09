use anyhow::{Context, anyhow, bail};
use log::LevelFilter;
use pbp_engine::League;
use std::path::PathBuf;

/// What the command line asked for.
#[derive(Debug)]
pub enum CliAction {
    Run(Settings),
    Help,
    Version,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub league: League,
    /// `{ game_id: box score }` document with starter flags.
    pub boxscores: Option<PathBuf>,
    /// JSON lines go to stdout when unset.
    pub out: Option<PathBuf>,
    pub jobs: usize,
    pub log_level: LevelFilter,
    pub inputs: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            league: League::Nba,
            boxscores: None,
            out: None,
            jobs: 4,
            log_level: LevelFilter::Info,
            inputs: Vec::new(),
        }
    }
}

impl Settings {
    /// Process args and environment. Flags win over `POSSESSIONS_*` variables.
    pub fn load() -> anyhow::Result<CliAction> {
        Self::parse(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    fn parse(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<CliAction> {
        let mut settings = Settings::default();
        let mut league = env("POSSESSIONS_LEAGUE");
        let mut boxscores = env("POSSESSIONS_BOXSCORES");
        let mut jobs = env("POSSESSIONS_JOBS");
        let mut log_level = env("POSSESSIONS_LOG");

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| args.next().with_context(|| format!("{flag} needs a value"));
            match arg.as_str() {
                "-h" | "--help" => return Ok(CliAction::Help),
                "-V" | "--version" => return Ok(CliAction::Version),
                "--league" => league = Some(value(arg.as_str())?),
                "--boxscores" => boxscores = Some(value(arg.as_str())?),
                "--out" => settings.out = Some(value(arg.as_str())?.into()),
                "--jobs" => jobs = Some(value(arg.as_str())?),
                "--log-level" => log_level = Some(value(arg.as_str())?),
                flag if flag.starts_with('-') => bail!("Unknown argument: {flag}"),
                path => settings.inputs.push(path.into()),
            }
        }

        if let Some(raw) = league.filter(|s| !s.trim().is_empty()) {
            settings.league = League::parse(&raw).with_context(|| format!("unknown league {raw:?}"))?;
        }
        settings.boxscores = boxscores.filter(|s| !s.trim().is_empty()).map(PathBuf::from);
        if let Some(raw) = jobs {
            let n: usize = raw.trim().parse().with_context(|| format!("invalid job count {raw:?}"))?;
            settings.jobs = n.max(1);
        }
        if let Some(raw) = log_level {
            settings.log_level = raw.trim().parse().map_err(|_| anyhow!("invalid log level {raw:?}"))?;
        }
        if settings.inputs.is_empty() {
            bail!("no game files given");
        }
        Ok(CliAction::Run(settings))
    }
}

pub fn usage_text() -> &'static str {
    "possessions - basketball play-by-play to possession rows

Usage:
  possessions [OPTIONS] <GAME.json|DIR>...
  possessions --help
  possessions --version

Options:
  --league <nba|wnba|ncaa>   Period lengths and clutch window (default nba)
  --boxscores <FILE>         Box scores keyed by game id, used for starting lineups
  --out <FILE>               Write JSON lines here instead of stdout
  --jobs <N>                 Games processed concurrently (default 4)
  --log-level <LEVEL>        error, warn, info, debug or trace (default info)

Environment:
  RUST_LOG                   Full env_logger filter; overrides --log-level
  POSSESSIONS_LEAGUE         Same as --league
  POSSESSIONS_BOXSCORES      Same as --boxscores
  POSSESSIONS_JOBS           Same as --jobs
  POSSESSIONS_LOG            Same as --log-level"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(args: &[&str], env: &[(&str, &str)]) -> anyhow::Result<CliAction> {
        let env: HashMap<String, String> = env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::parse(args.iter().map(|s| s.to_string()), |key| env.get(key).cloned())
    }

    fn run(args: &[&str], env: &[(&str, &str)]) -> Settings {
        match parse(args, env).unwrap() {
            CliAction::Run(settings) => settings,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn defaults() {
        let settings = run(&["game.json"], &[]);
        assert_eq!(settings.league, League::Nba);
        assert_eq!(settings.jobs, 4);
        assert_eq!(settings.log_level, LevelFilter::Info);
        assert_eq!(settings.inputs, vec![PathBuf::from("game.json")]);
    }

    #[test]
    fn flags_override_environment() {
        let settings = run(
            &["--league", "wnba", "--jobs", "0", "a.json", "b.json"],
            &[("POSSESSIONS_LEAGUE", "ncaa"), ("POSSESSIONS_LOG", "debug"), ("POSSESSIONS_BOXSCORES", "box.json")],
        );
        assert_eq!(settings.league, League::Wnba);
        assert_eq!(settings.jobs, 1, "job count is at least one");
        assert_eq!(settings.log_level, LevelFilter::Debug);
        assert_eq!(settings.boxscores, Some(PathBuf::from("box.json")));
        assert_eq!(settings.inputs.len(), 2);
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert!(matches!(parse(&["--help"], &[]).unwrap(), CliAction::Help));
        assert!(matches!(parse(&["-V", "--bogus"], &[]).unwrap(), CliAction::Version));
    }

    #[test]
    fn bad_input_is_rejected() {
        assert!(parse(&["--bogus", "a.json"], &[]).is_err());
        assert!(parse(&["--jobs"], &[]).is_err());
        assert!(parse(&["--league", "nfl", "a.json"], &[]).is_err());
        assert!(parse(&[], &[]).is_err());
    }
}
