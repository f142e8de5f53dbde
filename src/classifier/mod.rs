//! Stylometric author classifier
//!
//! Character n-gram counts feed a multinomial Naive Bayes model trained on
//! every message of the corpus, image links included. The model's confidence
//! in a message's true author is the "how recognizable is this" signal used
//! by the difficulty score.
//!
//! Training is skipped for small corpora: with too few documents the
//! posterior is noise, so scoring falls back to the heuristics alone.

mod features;
mod model;

pub use features::{CharNgramExtractor, NgramCounts, Vocabulary};
pub use model::{ModelParams, Posterior, StyleModel};

use crate::config::ClassifierConfig;
use crate::models::Record;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while fitting the classifier
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("cannot train on an empty corpus")]
    EmptyCorpus,

    #[error("no n-gram occurs in at least {min_df} of {documents} documents")]
    EmptyVocabulary { documents: usize, min_df: usize },

    #[error("invalid n-gram range {min}..={max}")]
    InvalidNgramRange { min: usize, max: usize },

    #[error("smoothing must be positive, got {0}")]
    InvalidSmoothing(f64),
}

/// Train on a corpus when it holds enough records.
///
/// Every record is a document: an image contributes its link. Returns
/// `Ok(None)` when there are `config.min_documents` records or fewer.
pub fn train_on_corpus<'a, I>(
    records: I,
    config: &ClassifierConfig,
) -> Result<Option<StyleModel>, ClassifierError>
where
    I: IntoIterator<Item = &'a Record>,
{
    let documents: Vec<&Record> = records.into_iter().collect();

    if documents.len() <= config.min_documents {
        info!(
            "Skipping classifier: {} documents (needs more than {})",
            documents.len(),
            config.min_documents
        );
        return Ok(None);
    }

    let model = StyleModel::fit(
        documents.iter().map(|r| (r.content.as_str(), &r.author_id)),
        &ModelParams::from(config),
    )?;

    debug!(
        "Trained classifier: {} documents, {} authors, {} features",
        model.documents(),
        model.num_classes(),
        model.vocabulary_len()
    );

    Ok(Some(model))
}
