//! Multinomial Naive Bayes over character n-gram counts
//!
//! Trained once per run on the curated text corpus, then queried read-only
//! (and concurrently) for every record. Log-probabilities are stored as one
//! flat `[feature][class]` matrix so a prediction walks the sparse input row
//! once and touches contiguous memory per feature.

use super::features::{CharNgramExtractor, NgramCounts, Vocabulary};
use super::ClassifierError;
use crate::config::ClassifierConfig;
use crate::models::AuthorId;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Hyperparameters fixed at training time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    pub ngram_min: usize,
    pub ngram_max: usize,
    pub min_df: usize,
    /// Additive (Laplace) smoothing
    pub alpha: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            ngram_min: 3,
            ngram_max: 5,
            min_df: 2,
            alpha: 1.0,
        }
    }
}

impl From<&ClassifierConfig> for ModelParams {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            ngram_min: config.ngram_min,
            ngram_max: config.ngram_max,
            min_df: config.min_df,
            alpha: config.alpha,
        }
    }
}

/// Author-attribution model
#[derive(Debug, Clone)]
pub struct StyleModel {
    extractor: CharNgramExtractor,
    vocabulary: Vocabulary,
    /// Sorted; position is the class index
    classes: Vec<AuthorId>,
    class_index: FxHashMap<AuthorId, usize>,
    class_log_prior: Vec<f64>,
    /// `[feature * n_classes + class]`
    feature_log_prob: Vec<f64>,
    documents: usize,
}

impl StyleModel {
    /// Fit on `(text, author)` pairs.
    pub fn fit<'a, I>(documents: I, params: &ModelParams) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = (&'a str, &'a AuthorId)>,
    {
        if params.ngram_min == 0 || params.ngram_min > params.ngram_max {
            return Err(ClassifierError::InvalidNgramRange {
                min: params.ngram_min,
                max: params.ngram_max,
            });
        }
        if params.alpha.is_nan() || params.alpha <= 0.0 {
            return Err(ClassifierError::InvalidSmoothing(params.alpha));
        }

        let (texts, labels): (Vec<&str>, Vec<&AuthorId>) = documents.into_iter().unzip();
        if texts.is_empty() {
            return Err(ClassifierError::EmptyCorpus);
        }

        let extractor = CharNgramExtractor::new(params.ngram_min, params.ngram_max);
        let counts: Vec<NgramCounts> = texts.par_iter().map(|t| extractor.extract(t)).collect();

        let vocabulary = Vocabulary::build(&counts, params.min_df);
        if vocabulary.is_empty() {
            return Err(ClassifierError::EmptyVocabulary {
                documents: texts.len(),
                min_df: params.min_df,
            });
        }

        let mut classes: Vec<AuthorId> = labels.iter().map(|&a| a.clone()).collect();
        classes.sort();
        classes.dedup();
        let class_index: FxHashMap<AuthorId, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, a)| (a.clone(), i))
            .collect();

        let n_classes = classes.len();
        let n_features = vocabulary.len();
        let mut class_docs = vec![0usize; n_classes];
        let mut feature_count = vec![0.0f64; n_features * n_classes];

        for (doc, label) in counts.iter().zip(&labels) {
            let Some(&c) = class_index.get(*label) else {
                continue;
            };
            class_docs[c] += 1;
            for (j, x) in vocabulary.vectorize(doc) {
                feature_count[j * n_classes + c] += x;
            }
        }

        let alpha = params.alpha;
        let mut smoothed_totals = vec![0.0f64; n_classes];
        for row in feature_count.chunks_exact(n_classes) {
            for (total, fc) in smoothed_totals.iter_mut().zip(row) {
                *total += fc + alpha;
            }
        }
        let log_totals: Vec<f64> = smoothed_totals.iter().map(|t| t.ln()).collect();

        let feature_log_prob = feature_count
            .iter()
            .enumerate()
            .map(|(i, fc)| (fc + alpha).ln() - log_totals[i % n_classes])
            .collect();

        let log_docs = (texts.len() as f64).ln();
        let class_log_prior = class_docs
            .iter()
            .map(|&d| (d as f64).ln() - log_docs)
            .collect();

        Ok(Self {
            extractor,
            vocabulary,
            classes,
            class_index,
            class_log_prior,
            feature_log_prob,
            documents: texts.len(),
        })
    }

    /// Posterior over all trained authors for `text`.
    ///
    /// Text with no known n-gram yields the class priors.
    pub fn predict_distribution(&self, text: &str) -> Posterior<'_> {
        let n_classes = self.classes.len();
        let row = self.vocabulary.vectorize(&self.extractor.extract(text));

        let mut joint = self.class_log_prior.clone();
        for (j, x) in row {
            let weights = &self.feature_log_prob[j * n_classes..(j + 1) * n_classes];
            for (acc, w) in joint.iter_mut().zip(weights) {
                *acc += x * w;
            }
        }

        // log-sum-exp normalization
        let max = joint.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = joint.iter().map(|l| (l - max).exp()).sum();
        let log_norm = max + sum.ln();

        Posterior {
            model: self,
            probabilities: joint.iter().map(|l| (l - log_norm).exp()).collect(),
        }
    }

    pub fn classes(&self) -> &[AuthorId] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn has_class(&self, author: &AuthorId) -> bool {
        self.class_index.contains_key(author)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Number of training documents.
    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn ngram_range(&self) -> (usize, usize) {
        self.extractor.range()
    }
}

/// Probability of each trained author having written one text. Sums to 1.
#[derive(Debug, Clone)]
pub struct Posterior<'m> {
    model: &'m StyleModel,
    probabilities: Vec<f64>,
}

impl<'m> Posterior<'m> {
    /// `None` when `author` was not a training class.
    pub fn probability(&self, author: &AuthorId) -> Option<f64> {
        self.model
            .class_index
            .get(author)
            .map(|&i| self.probabilities[i])
    }

    /// Most probable author. Ties go to the author that sorts first.
    pub fn top(&self) -> Option<(&'m AuthorId, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &p) in self.probabilities.iter().enumerate() {
            if best.map_or(true, |(_, bp)| p > bp) {
                best = Some((i, p));
            }
        }
        best.map(|(i, p)| (&self.model.classes[i], p))
    }

    /// The `n` most probable authors, most probable first.
    pub fn ranked(&self, n: usize) -> Vec<(&'m AuthorId, f64)> {
        let mut all: Vec<(&'m AuthorId, f64)> = self.iter().collect();
        all.sort_by(|a, b| b.1.total_cmp(&a.1));
        all.truncate(n);
        all
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'m AuthorId, f64)> + '_ {
        self.model
            .classes
            .iter()
            .zip(self.probabilities.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}
