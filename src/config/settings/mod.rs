//! Scoring configuration support
//!
//! Loads configuration from `whosaid.toml` or `.whosaidrc.json` in the
//! directory holding the corpus. Every value has a default, so an absent
//! file simply means "score like the reference dataset".
//!
//! # Configuration Format
//!
//! ```toml
//! # whosaid.toml
//!
//! [heuristics]
//! recent_days = 365
//! old_days = 1095
//! short_words = 12
//! long_words = 30
//!
//! [classifier]
//! min_documents = 50
//! ngram_min = 3
//! ngram_max = 5
//! min_df = 2
//! alpha = 1.0
//! fallback_confidence = 0.1
//!
//! [scoring]
//! base = 5.0
//! ai_weight = 0.7
//! imposter_threshold = 0.4
//!
//! [loader]
//! dedupe_content = false
//! min_text_words = 0
//!
//! [channels]
//! skip_defaults = false
//!
//! [channels.entries."454492770682404877"]
//! name = "general"
//! difficulty = "hard"
//! ```

use super::channels::{ChannelEntry, ChannelTable};
use crate::models::ChannelId;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// File names searched, in order, by [`load_config`].
pub const CONFIG_FILE_NAMES: &[&str] = &["whosaid.toml", ".whosaidrc.json"];

/// Full configuration loaded from whosaid.toml or similar
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub heuristics: HeuristicsConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub scoring: AggregationConfig,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub channels: ChannelsConfig,
}

/// Thresholds for the age and length sub-scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    /// Messages younger than this many days are easy (default: 365)
    #[serde(default = "default_recent_days")]
    pub recent_days: i64,

    /// Messages older than this many days are hard (default: 1095)
    #[serde(default = "default_old_days")]
    pub old_days: i64,

    /// Texts with at most this many words score harder (default: 12)
    #[serde(default = "default_short_words")]
    pub short_words: usize,

    /// Texts with more than this many words score easier (default: 30)
    #[serde(default = "default_long_words")]
    pub long_words: usize,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            recent_days: default_recent_days(),
            old_days: default_old_days(),
            short_words: default_short_words(),
            long_words: default_long_words(),
        }
    }
}

fn default_recent_days() -> i64 {
    365
}
fn default_old_days() -> i64 {
    365 * 3
}
fn default_short_words() -> usize {
    12
}
fn default_long_words() -> usize {
    30
}

/// Stylometric classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// The classifier only trains on strictly more messages than this (default: 50)
    #[serde(default = "default_min_documents")]
    pub min_documents: usize,

    /// Shortest character n-gram (default: 3)
    #[serde(default = "default_ngram_min")]
    pub ngram_min: usize,

    /// Longest character n-gram (default: 5)
    #[serde(default = "default_ngram_max")]
    pub ngram_max: usize,

    /// Features seen in fewer documents are discarded (default: 2)
    #[serde(default = "default_min_df")]
    pub min_df: usize,

    /// Additive smoothing (default: 1.0)
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Confidence used when the true author is not a trained class (default: 0.1)
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_documents: default_min_documents(),
            ngram_min: default_ngram_min(),
            ngram_max: default_ngram_max(),
            min_df: default_min_df(),
            alpha: default_alpha(),
            fallback_confidence: default_fallback_confidence(),
        }
    }
}

fn default_min_documents() -> usize {
    50
}
fn default_ngram_min() -> usize {
    3
}
fn default_ngram_max() -> usize {
    5
}
fn default_min_df() -> usize {
    2
}
fn default_alpha() -> f64 {
    1.0
}
fn default_fallback_confidence() -> f64 {
    0.1
}

/// Constants of the final aggregation formula
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Starting point before sub-scores are applied (default: 5.0)
    #[serde(default = "default_base")]
    pub base: f64,

    /// Dampening applied to the centered AI score (default: 0.7)
    #[serde(default = "default_ai_weight")]
    pub ai_weight: f64,

    /// Minimum posterior for an imposter hint (default: 0.4, exclusive)
    #[serde(default = "default_imposter_threshold")]
    pub imposter_threshold: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            ai_weight: default_ai_weight(),
            imposter_threshold: default_imposter_threshold(),
        }
    }
}

fn default_base() -> f64 {
    5.0
}
fn default_ai_weight() -> f64 {
    0.7
}
fn default_imposter_threshold() -> f64 {
    0.4
}

/// Input filtering applied while loading the corpus
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoaderConfig {
    /// Drop messages whose content was already seen
    #[serde(default)]
    pub dedupe_content: bool,

    /// Drop text messages with fewer words than this (0 = keep all)
    #[serde(default)]
    pub min_text_words: usize,
}

/// Channel table configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelsConfig {
    /// If true, the built-in channel table is not used
    #[serde(default)]
    pub skip_defaults: bool,

    /// Per-channel overrides keyed by channel id
    #[serde(default)]
    pub entries: BTreeMap<ChannelId, ChannelEntry>,
}

impl ChannelsConfig {
    /// Built-in table (unless skipped) with configured entries layered on top.
    pub fn effective_table(&self) -> ChannelTable {
        let mut table = if self.skip_defaults {
            ChannelTable::new()
        } else {
            ChannelTable::builtin()
        };

        for (id, entry) in &self.entries {
            table.insert(*id, entry.clone());
        }

        table
    }
}

impl Config {
    /// Reject values that would make scoring meaningless.
    pub fn validate(&self) -> anyhow::Result<()> {
        let c = &self.classifier;
        if c.ngram_min == 0 {
            bail!("classifier.ngram_min must be at least 1");
        }
        if c.ngram_min > c.ngram_max {
            bail!(
                "classifier.ngram_min ({}) exceeds classifier.ngram_max ({})",
                c.ngram_min,
                c.ngram_max
            );
        }
        if c.alpha.is_nan() || c.alpha <= 0.0 {
            bail!("classifier.alpha must be positive, got {}", c.alpha);
        }
        if !(0.0..=1.0).contains(&c.fallback_confidence) {
            bail!(
                "classifier.fallback_confidence must be within [0, 1], got {}",
                c.fallback_confidence
            );
        }
        if !(0.0..=1.0).contains(&self.scoring.imposter_threshold) {
            bail!(
                "scoring.imposter_threshold must be within [0, 1], got {}",
                self.scoring.imposter_threshold
            );
        }
        let h = &self.heuristics;
        if h.recent_days > h.old_days {
            bail!(
                "heuristics.recent_days ({}) exceeds heuristics.old_days ({})",
                h.recent_days,
                h.old_days
            );
        }
        if h.short_words > h.long_words {
            bail!(
                "heuristics.short_words ({}) exceeds heuristics.long_words ({})",
                h.short_words,
                h.long_words
            );
        }
        Ok(())
    }

    /// Channel lookup table for this configuration.
    pub fn channel_table(&self) -> ChannelTable {
        self.channels.effective_table()
    }
}

/// Load configuration from a directory.
///
/// Searches for configuration files in this order:
/// 1. `whosaid.toml`
/// 2. `.whosaidrc.json`
///
/// Returns default configuration if no usable config file is found.
pub fn load_config(dir: &Path) -> Config {
    for name in CONFIG_FILE_NAMES {
        let path = dir.join(name);
        if !path.exists() {
            continue;
        }
        match load_config_file(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {:#}", path.display(), e);
            }
        }
    }

    debug!("No config found, using defaults");
    Config::default()
}

/// Load and validate an explicit configuration file. Format is chosen by extension.
pub fn load_config_file(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;

    let config: Config = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => toml::from_str(&content)?,
    };

    config.validate()?;
    Ok(config)
}
