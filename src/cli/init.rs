//! Init command - write an example whosaid.toml

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

const EXAMPLE_CONFIG: &str = r#"# whosaid configuration
# Every value below is the default; delete what you don't change.

[heuristics]
# Messages younger than this many days score easier
recent_days = 365
# Messages older than this many days score harder
old_days = 1095
# Texts with at most this many words score harder
short_words = 12
# Texts with more than this many words score easier
long_words = 30

[classifier]
# Train only when there are more messages than this
min_documents = 50
# Character n-gram lengths
ngram_min = 3
ngram_max = 5
# Ignore n-grams seen in fewer messages than this
min_df = 2
alpha = 1.0
# Confidence used when a message's author was not part of training
fallback_confidence = 0.1

[scoring]
base = 5.0
ai_weight = 0.7
# Suggest an imposter only above this probability
imposter_threshold = 0.4

[loader]
# Drop messages whose exact content was already seen
dedupe_content = false
# Drop text messages shorter than this many words (0 keeps everything)
min_text_words = 0

[channels]
# Set to true to ignore the built-in channel table
skip_defaults = false

# Override or add channels: difficulty is "easy", "medium" or "hard"
# [channels.entries."454492770682404877"]
# name = "general"
# difficulty = "hard"
"#;

/// Run the init command
pub fn run(dir: &Path, force: bool) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Path is not a directory: {}", dir.display());
    }

    let config_path = dir.join("whosaid.toml");
    if config_path.exists() && !force {
        println!(
            "{} {} already exists (use --force to overwrite)",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
        return Ok(());
    }

    std::fs::write(&config_path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!(
        "{} Created {}",
        style("✓").green(),
        style(config_path.display()).cyan()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use whosaid::config::{load_config_file, Config};

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed: Config = toml::from_str(EXAMPLE_CONFIG).expect("example config parses");
        let defaults = Config::default();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.heuristics.old_days, defaults.heuristics.old_days);
        assert_eq!(parsed.classifier.min_documents, defaults.classifier.min_documents);
        assert_eq!(parsed.scoring.ai_weight, defaults.scoring.ai_weight);
        assert!(parsed.channels.entries.is_empty());
    }

    #[test]
    fn test_init_writes_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("whosaid.toml");

        run(dir.path(), false).expect("init");
        assert!(load_config_file(&path).is_ok());

        std::fs::write(&path, "# mine\n").expect("edit config");
        run(dir.path(), false).expect("init again");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "# mine\n");

        run(dir.path(), true).expect("init --force");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), EXAMPLE_CONFIG);
    }
}
