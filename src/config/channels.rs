//! Channel difficulty table
//!
//! Static lookup of `channel_id -> difficulty category` plus display names.
//! The built-in table is the curated channel list of the home server;
//! config entries override or extend it.

use crate::models::ChannelId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Curated difficulty category of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelDifficulty {
    /// Topic channels where the crowd is small and recognizable
    Easy,
    #[default]
    Medium,
    /// High-traffic general channels
    Hard,
}

impl ChannelDifficulty {
    /// Sub-score contribution: Easy -1, Medium 0, Hard +1.
    pub fn sub_score(self) -> i8 {
        match self {
            ChannelDifficulty::Easy => -1,
            ChannelDifficulty::Medium => 0,
            ChannelDifficulty::Hard => 1,
        }
    }
}

/// One row of the channel table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub difficulty: ChannelDifficulty,
}

/// Built-in channels: (id, name, difficulty).
pub const DEFAULT_CHANNELS: &[(u64, &str, ChannelDifficulty)] = &[
    (454492770682404877, "general", ChannelDifficulty::Hard),
    (538641451211292673, "cowboy-thoughts", ChannelDifficulty::Hard),
    (1077821285566001252, "stream-archive", ChannelDifficulty::Hard),
    (1318834323163447337, "antisocial-book-club", ChannelDifficulty::Easy),
    (1063742740766134322, "jelley-events", ChannelDifficulty::Medium),
    (902348468302020628, "🚜-tractor-hands", ChannelDifficulty::Easy),
    (924833852030062694, "tft-containment", ChannelDifficulty::Easy),
    (827391154655461376, "valorant", ChannelDifficulty::Easy),
    (933087762557579365, "arom-stats", ChannelDifficulty::Easy),
    (1114109093171437648, "mlee-pocket-ride", ChannelDifficulty::Easy),
    (1311195432545812491, "phrecia-enjoyers", ChannelDifficulty::Easy),
    (1345227643406123101, "ptcgp", ChannelDifficulty::Easy),
    (648376150447357962, "howdy-chat", ChannelDifficulty::Medium),
    (822283830396059650, "sussy-hours", ChannelDifficulty::Medium),
    (827401801383936041, "frick-rankings", ChannelDifficulty::Easy),
    (922674739892338728, "weeb-zone", ChannelDifficulty::Easy),
    (833083167081758801, "game-recs", ChannelDifficulty::Medium),
    (1151786645536903309, "defendant-donald", ChannelDifficulty::Easy),
    (1299504661585203292, "t", ChannelDifficulty::Easy),
    (941068107009650738, "lost-ark", ChannelDifficulty::Easy),
];

/// Resolved channel lookup used by the heuristic scorer.
#[derive(Debug, Clone, Default)]
pub struct ChannelTable {
    entries: FxHashMap<ChannelId, ChannelEntry>,
}

impl ChannelTable {
    /// Empty table: every channel is neutral.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in server table.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for &(id, name, difficulty) in DEFAULT_CHANNELS {
            table.insert(
                ChannelId::from_raw(id),
                ChannelEntry {
                    name: name.to_string(),
                    difficulty,
                },
            );
        }
        table
    }

    pub fn insert(&mut self, id: ChannelId, entry: ChannelEntry) {
        self.entries.insert(id, entry);
    }

    /// Category of a channel, `None` when the channel is not curated.
    pub fn difficulty(&self, id: ChannelId) -> Option<ChannelDifficulty> {
        self.entries.get(&id).map(|e| e.difficulty)
    }

    /// Sub-score for a channel; unknown channels are neutral.
    pub fn sub_score(&self, id: ChannelId) -> i8 {
        self.difficulty(id).map_or(0, ChannelDifficulty::sub_score)
    }

    /// Display name, for reporting collaborators.
    pub fn name(&self, id: ChannelId) -> Option<&str> {
        self.entries
            .get(&id)
            .map(|e| e.name.as_str())
            .filter(|n| !n.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let table = ChannelTable::builtin();
        assert_eq!(table.len(), DEFAULT_CHANNELS.len());
        assert_eq!(table.sub_score(ChannelId::from_raw(454492770682404877)), 1);
        assert_eq!(table.sub_score(ChannelId::from_raw(648376150447357962)), 0);
        assert_eq!(table.sub_score(ChannelId::from_raw(827391154655461376)), -1);
        assert_eq!(table.name(ChannelId::from_raw(538641451211292673)), Some("cowboy-thoughts"));
    }

    #[test]
    fn test_unknown_channel_is_neutral() {
        let table = ChannelTable::builtin();
        let unknown = ChannelId::from_raw(42);
        assert_eq!(table.difficulty(unknown), None);
        assert_eq!(table.sub_score(unknown), 0);
        assert_eq!(table.name(unknown), None);
    }
}
