//! Age, channel and length sub-scores
//!
//! Each sub-score is -1 (easier), 0, or +1 (harder). They are independent of
//! each other and of the classifier.

use crate::config::{ChannelTable, HeuristicsConfig};
use crate::models::{Record, SubScores};
use chrono::{DateTime, Utc};
use tracing::debug;

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days between `then` and `now`, rounded toward negative infinity.
pub fn age_days(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Scores records against a fixed "now" and channel table
pub struct HeuristicScorer<'a> {
    config: &'a HeuristicsConfig,
    channels: &'a ChannelTable,
    now: DateTime<Utc>,
}

impl<'a> HeuristicScorer<'a> {
    pub fn new(config: &'a HeuristicsConfig, channels: &'a ChannelTable, now: DateTime<Utc>) -> Self {
        Self {
            config,
            channels,
            now,
        }
    }

    pub fn score(&self, record: &Record) -> SubScores {
        SubScores {
            age_score: self.age_score(record),
            channel_score: self.channel_score(record),
            length_score: self.length_score(record),
        }
    }

    /// Recent messages are easy, old ones hard.
    pub fn age_score(&self, record: &Record) -> i8 {
        let days = age_days(record.timestamp(), self.now);
        if days < self.config.recent_days {
            -1
        } else if days > self.config.old_days {
            1
        } else {
            0
        }
    }

    pub fn channel_score(&self, record: &Record) -> i8 {
        match self.channels.difficulty(record.channel_id) {
            Some(difficulty) => difficulty.sub_score(),
            None => {
                debug!(
                    "Unknown channel {} for message {}",
                    record.channel_id, record.msg_id
                );
                0
            }
        }
    }

    /// Short texts give little away and score harder. Images always score 0.
    pub fn length_score(&self, record: &Record) -> i8 {
        if !record.is_text() {
            return 0;
        }
        let words = record.word_count();
        if words <= self.config.short_words {
            1
        } else if words > self.config.long_words {
            -1
        } else {
            0
        }
    }
}

/// One-shot convenience over [`HeuristicScorer`].
pub fn score(
    record: &Record,
    now: DateTime<Utc>,
    config: &HeuristicsConfig,
    channels: &ChannelTable,
) -> SubScores {
    HeuristicScorer::new(config, channels, now).score(record)
}
