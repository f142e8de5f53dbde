//! Difficulty scoring
//!
//! Turns a record (plus, when available, the classifier's posterior for its
//! text) into a 1-10 difficulty score.
//!
//! # Scoring Formula
//!
//! ```text
//! confidence = P(true author | text)        (fallback 0.1 if not a trained class)
//! ai_score   = 10 - 9 × confidence
//! ai_offset  = (ai_score - 5) × 0.7         (0 when no classifier ran)
//! raw        = 5 + age + channel + length + ai_offset
//! score      = clamp(round_half_even(raw), 1, 10)
//! ```
//!
//! # Sub-scores (each -1, 0 or +1)
//!
//! - **Age**: under a year old is -1, over three years is +1
//! - **Channel**: from the channel table, unknown channels are 0
//! - **Length**: 12 words or fewer is +1, over 30 is -1, images are 0
//!
//! # Labels
//!
//! - 1-3: Easy
//! - 4-7: Medium
//! - 8-10: Hard

mod aggregate;
mod heuristic;

pub use aggregate::{
    aggregate, ai_score, explain, round_score, ScoreBreakdown, ScoreParams, MAX_SCORE, MIN_SCORE,
};
pub use heuristic::{age_days, score, HeuristicScorer};
