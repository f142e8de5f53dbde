//! Final score aggregation
//!
//! Folds the heuristic sub-scores and the classifier's confidence in the true
//! author into one 1-10 score, a label, and an optional imposter hint.

use crate::classifier::Posterior;
use crate::config::Config;
use crate::models::{AuthorId, DifficultyLabel, DifficultyResult, SubScores};
use serde::Serialize;
use tracing::debug;

/// Lowest and highest final scores.
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// Constants of the aggregation formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreParams {
    pub base: f64,
    pub ai_weight: f64,
    pub imposter_threshold: f64,
    /// Confidence assumed when the true author is not a trained class
    pub fallback_confidence: f64,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ScoreParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base: config.scoring.base,
            ai_weight: config.scoring.ai_weight,
            imposter_threshold: config.scoring.imposter_threshold,
            fallback_confidence: config.classifier.fallback_confidence,
        }
    }
}

/// Every intermediate value behind one record's score
#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown {
    pub sub_scores: SubScores,
    /// Probability of the true author; `None` when no classifier ran
    pub confidence: Option<f64>,
    /// True author was not a trained class
    pub used_fallback: bool,
    pub ai_score: Option<f64>,
    pub ai_offset: f64,
    pub raw: f64,
    pub score: u8,
    pub label: DifficultyLabel,
    /// Most probable author and its probability
    pub top_guess: Option<(AuthorId, f64)>,
    pub imposter_id: Option<AuthorId>,
}

impl ScoreBreakdown {
    pub fn result(&self) -> DifficultyResult {
        DifficultyResult {
            score: self.score,
            label: self.label,
            imposter_id: self.imposter_id.clone(),
        }
    }
}

/// Round half to even, then clamp into `MIN_SCORE..=MAX_SCORE`.
pub fn round_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return MIN_SCORE;
    }
    raw.round_ties_even()
        .clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE)) as u8
}

/// Map classifier confidence onto the 0-10 "AI difficulty" axis.
///
/// Certain of the true author gives 1, no idea gives 10.
pub fn ai_score(confidence: f64) -> f64 {
    10.0 - confidence * 9.0
}

/// Score one record. `posterior` is `None` when no classifier ran for it.
pub fn aggregate(
    sub_scores: SubScores,
    posterior: Option<&Posterior<'_>>,
    true_author: &AuthorId,
    params: &ScoreParams,
) -> DifficultyResult {
    explain(sub_scores, posterior, true_author, params).result()
}

/// Like [`aggregate`], keeping every intermediate value.
pub fn explain(
    sub_scores: SubScores,
    posterior: Option<&Posterior<'_>>,
    true_author: &AuthorId,
    params: &ScoreParams,
) -> ScoreBreakdown {
    let mut confidence = None;
    let mut used_fallback = false;
    let mut top_guess = None;
    let mut imposter_id = None;

    if let Some(posterior) = posterior {
        let c = match posterior.probability(true_author) {
            Some(p) => p,
            None => {
                debug!(
                    "Author {} not a trained class, using confidence {}",
                    true_author, params.fallback_confidence
                );
                used_fallback = true;
                params.fallback_confidence
            }
        };
        confidence = Some(c);

        if let Some((top, p)) = posterior.top() {
            if top != true_author && p > params.imposter_threshold {
                imposter_id = Some(top.clone());
            }
            top_guess = Some((top.clone(), p));
        }
    }

    let ai_score = confidence.map(ai_score);
    let ai_offset = ai_score.map_or(0.0, |s| (s - 5.0) * params.ai_weight);
    let raw = params.base + f64::from(sub_scores.total()) + ai_offset;
    let score = round_score(raw);

    ScoreBreakdown {
        sub_scores,
        confidence,
        used_fallback,
        ai_score,
        ai_offset,
        raw,
        score,
        label: DifficultyLabel::from_score(score),
        top_guess,
        imposter_id,
    }
}
