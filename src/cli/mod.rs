//! CLI command definitions and handlers

mod decode;
mod explain;
mod init;
mod score;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use whosaid::config::{self, Config};
use whosaid::models::Snowflake;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// Parse an RFC 3339 timestamp such as 2025-06-01T00:00:00Z
fn parse_now(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("'{}' is not an RFC 3339 timestamp: {}", s, e))
}

/// whosaid - difficulty scoring for a "who said it?" game
#[derive(Parser, Debug)]
#[command(name = "whosaid")]
#[command(
    version,
    about = "Score chat messages by how hard it is to guess who wrote them",
    long_about = "whosaid trains a character n-gram authorship model on a scraped chat corpus, \
then gives every message a 1-10 difficulty from the model's confidence in the real author, \
the message's age, its channel and its length.",
    after_help = "\
Examples:
  whosaid score game_data.json                       Writes final_game_data.json
  whosaid score game_data.json -o out.json --now 2025-06-01T00:00:00Z
  whosaid explain game_data.json 454492770682404877  Show how one message was scored
  whosaid decode 454492770682404877                  When was this message sent?
  whosaid init                                       Write an example whosaid.toml"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers (1-64)
    #[arg(long, global = true, default_value = "8", value_parser = parse_workers)]
    pub workers: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score every message in a corpus and write the game data file
    Score {
        /// Corpus JSON produced by the scraper
        input: PathBuf,

        /// Output file (default: final_<input name> next to the input)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Config file (default: whosaid.toml or .whosaidrc.json next to the input)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference time for message age (default: now)
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,

        /// Summary format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Show every step of one message's score
    Explain {
        /// Corpus JSON produced by the scraper
        input: PathBuf,

        /// Message id (snowflake)
        msg_id: Snowflake,

        /// Config file (default: whosaid.toml or .whosaidrc.json next to the input)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference time for message age (default: now)
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Print the creation time encoded in a snowflake id
    Decode {
        /// Message or channel id
        snowflake: Snowflake,
    },

    /// Write an example whosaid.toml
    Init {
        /// Directory to write into
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Overwrite an existing whosaid.toml
        #[arg(long)]
        force: bool,
    },

    /// Show version information
    Version,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Score {
            input,
            output,
            config,
            now,
            no_progress,
            format,
        } => {
            let config = resolve_config(&input, config.as_deref())?;
            score::run(
                &input,
                output.as_deref(),
                config,
                now,
                cli.workers,
                !no_progress,
                &format,
            )
        }

        Commands::Explain {
            input,
            msg_id,
            config,
            now,
            format,
        } => {
            let config = resolve_config(&input, config.as_deref())?;
            explain::run(&input, msg_id, config, now, cli.workers, &format)
        }

        Commands::Decode { snowflake } => decode::run(snowflake),

        Commands::Init { dir, force } => init::run(&dir, force),

        Commands::Version => {
            println!("whosaid {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// An explicit `--config` must load; otherwise look next to the input.
fn resolve_config(input: &Path, explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return config::load_config_file(path)
            .with_context(|| format!("Invalid config file {}", path.display()));
    }

    let dir = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok(config::load_config(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers_bounds() {
        assert_eq!(parse_workers("1"), Ok(1));
        assert_eq!(parse_workers("64"), Ok(64));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn test_parse_now() {
        let now = parse_now("2025-06-01T00:00:00Z").expect("valid timestamp");
        assert_eq!(now.to_rfc3339(), "2025-06-01T00:00:00+00:00");
        let offset = parse_now("2025-06-01T02:00:00+02:00").expect("valid timestamp");
        assert_eq!(offset, now);
        assert!(parse_now("yesterday").is_err());
    }

    #[test]
    fn test_cli_parses_score() {
        let cli = Cli::try_parse_from([
            "whosaid",
            "--workers",
            "2",
            "score",
            "data.json",
            "--now",
            "2025-06-01T00:00:00Z",
            "--no-progress",
        ])
        .expect("parse args");
        assert_eq!(cli.workers, 2);
        match cli.command {
            Commands::Score {
                input,
                no_progress,
                now,
                ..
            } => {
                assert_eq!(input, PathBuf::from("data.json"));
                assert!(no_progress);
                assert!(now.is_some());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_snowflake() {
        let cli = Cli::try_parse_from(["whosaid", "decode", "454492770682404877"]).expect("parse args");
        assert!(matches!(
            cli.command,
            Commands::Decode { snowflake } if snowflake == Snowflake(454492770682404877)
        ));
        assert!(Cli::try_parse_from(["whosaid", "decode", "nope"]).is_err());
    }

    #[test]
    fn test_explicit_config_errors_are_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[classifier]\nngram_min = 0\n").expect("write config");
        let input = dir.path().join("data.json");
        assert!(resolve_config(&input, Some(&bad)).is_err());

        // Same file picked up implicitly only warns
        std::fs::write(dir.path().join("whosaid.toml"), "[classifier]\nngram_min = 0\n")
            .expect("write config");
        let config = resolve_config(&input, None).expect("defaults");
        assert_eq!(config.classifier.ngram_min, 3);
    }
}
