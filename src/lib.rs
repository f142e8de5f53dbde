//! whosaid - difficulty scoring for a "who said it?" guessing game
//!
//! Every message in a chat corpus gets a 1-10 difficulty score built from
//! three heuristics (age, channel, length) and a stylometric classifier's
//! confidence in the real author. When the classifier confidently picks the
//! wrong person, that person is attached as an "imposter" hint.

pub mod classifier;
pub mod config;
pub mod corpus;
pub mod curator;
pub mod models;
pub mod pipeline;
pub mod scoring;

pub use pipeline::{Pipeline, RunSummary};
