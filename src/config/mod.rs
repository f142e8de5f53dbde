//! Configuration module for whosaid
//!
//! This module handles:
//! - Scoring configuration (whosaid.toml)
//! - The channel difficulty table
//! - Classifier and loader settings

mod channels;
mod settings;

pub use channels::{ChannelDifficulty, ChannelEntry, ChannelTable, DEFAULT_CHANNELS};
pub use settings::{
    load_config,
    load_config_file,
    AggregationConfig,
    ChannelsConfig,
    ClassifierConfig,
    Config,
    HeuristicsConfig,
    LoaderConfig,
    CONFIG_FILE_NAMES,
};
