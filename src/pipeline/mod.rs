//! Scoring pipeline
//!
//! Orchestrates a full run:
//! 1. Load and validate the corpus
//! 2. Train the stylometric classifier on every profiled record (pass 1)
//! 3. Score every record against the frozen model (pass 2, parallel)
//! 4. Curate users and messages
//! 5. Save the scored corpus
//!
//! Pass 2 never starts before pass 1 has seen the whole corpus, and results
//! come back in input order, so the output is identical for any worker count.

use crate::classifier::{self, StyleModel};
use crate::config::{ChannelTable, Config};
use crate::corpus::{self, Corpus, LoadReport};
use crate::curator::{self, Curated};
use crate::models::{AuthorMap, DifficultyLabel, Record, ScoredCorpus, ScoredRecord, Snowflake};
use crate::scoring::{self, HeuristicScorer, ScoreBreakdown, ScoreParams};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default size of the scoring thread pool.
pub const DEFAULT_WORKERS: usize = 8;

/// Shape of the trained classifier, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub documents: usize,
    pub authors: usize,
    pub features: usize,
}

impl ModelStats {
    fn of(model: &StyleModel) -> Self {
        Self {
            documents: model.documents(),
            authors: model.num_classes(),
            features: model.vocabulary_len(),
        }
    }
}

/// What a scoring pass produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScoreStats {
    pub scored: usize,
    /// `None` when scoring was heuristic-only
    pub classifier: Option<ModelStats>,
    pub labels: BTreeMap<DifficultyLabel, usize>,
    pub imposters: usize,
    pub pruned_authors: usize,
    pub orphaned_records: usize,
}

/// Summary of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub load: LoadReport,
    pub scoring: ScoreStats,
    pub users: usize,
    pub output: PathBuf,
}

/// One record's score with everything that went into it
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub record: Record,
    pub timestamp: DateTime<Utc>,
    pub age_days: i64,
    pub channel_name: Option<String>,
    pub word_count: usize,
    pub breakdown: ScoreBreakdown,
    /// Most probable authors, best first
    pub top_guesses: Vec<(String, f64)>,
    pub classifier: Option<ModelStats>,
}

/// Full scoring pipeline.
pub struct Pipeline {
    config: Config,
    channels: ChannelTable,
    workers: usize,
    now: DateTime<Utc>,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        let channels = config.channel_table();
        Self {
            config,
            channels,
            workers: DEFAULT_WORKERS,
            now: Utc::now(),
            show_progress: false,
        }
    }

    /// Size of the pass 2 thread pool.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Reference time for the age sub-score.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load `input`, score it, and write the result to `output`.
    pub fn run(&self, input: &Path, output: &Path) -> Result<RunSummary> {
        let loaded = corpus::load_corpus(input, &self.config.loader)
            .with_context(|| format!("Failed to load corpus {}", input.display()))?;

        let (scored, stats) = self.score_corpus(loaded.corpus)?;
        let users = scored.users.len();

        corpus::save_scored(output, &scored)
            .with_context(|| format!("Failed to save {}", output.display()))?;
        info!("Saved scored corpus to {}", output.display());

        Ok(RunSummary {
            load: loaded.report,
            scoring: stats,
            users,
            output: output.to_path_buf(),
        })
    }

    /// Train, score and curate an in-memory corpus.
    pub fn score_corpus(&self, corpus: Corpus) -> Result<(ScoredCorpus, ScoreStats)> {
        let Corpus {
            meta,
            authors,
            records,
        } = corpus;

        // Pass 1
        let model = self.train(&records, &authors);

        // Pass 2
        let records = self.score_records(records, model.as_ref())?;

        let curated = curator::curate(authors, records);
        let stats = Self::stats(&curated, model.as_ref());

        Ok((curated.into_corpus(meta), stats))
    }

    /// Pass 1: fit the classifier, or `None` for heuristic-only scoring.
    ///
    /// Records whose author has no profile are left out, as the curator
    /// drops them from the output.
    pub fn train(&self, records: &[Record], authors: &AuthorMap) -> Option<StyleModel> {
        let known: Vec<&Record> = records
            .iter()
            .filter(|r| authors.contains_key(&r.author_id))
            .collect();
        if known.len() < records.len() {
            debug!(
                "Leaving {} records without an author profile out of training",
                records.len() - known.len()
            );
        }

        info!("Training classifier on {} records", known.len());
        match classifier::train_on_corpus(known, &self.config.classifier) {
            Ok(model) => model,
            Err(e) => {
                warn!("Classifier training failed, scoring with heuristics only: {}", e);
                None
            }
        }
    }

    /// Pass 2: score every record against a frozen model. Order is preserved.
    pub fn score_records(
        &self,
        records: Vec<Record>,
        model: Option<&StyleModel>,
    ) -> Result<Vec<ScoredRecord>> {
        let scorer = HeuristicScorer::new(&self.config.heuristics, &self.channels, self.now);
        let params = ScoreParams::from_config(&self.config);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        let bar = self.progress_bar(records.len());
        let scored: Vec<ScoredRecord> = pool.install(|| {
            records
                .into_par_iter()
                .map(|record| {
                    let breakdown = self.breakdown(&scorer, &record, model, &params);
                    bar.inc(1);
                    ScoredRecord {
                        result: breakdown.result(),
                        record,
                    }
                })
                .collect()
        });
        bar.finish_and_clear();

        info!("Scored {} records", scored.len());
        Ok(scored)
    }

    /// Train on `corpus` and explain the score of the message `msg_id`.
    pub fn explain(&self, corpus: &Corpus, msg_id: Snowflake) -> Option<Explanation> {
        let record = corpus.records.iter().find(|r| r.msg_id == msg_id)?;

        let model = self.train(&corpus.records, &corpus.authors);
        let scorer = HeuristicScorer::new(&self.config.heuristics, &self.channels, self.now);
        let params = ScoreParams::from_config(&self.config);
        let breakdown = self.breakdown(&scorer, record, model.as_ref(), &params);

        let top_guesses = match &model {
            Some(model) => model
                .predict_distribution(&record.content)
                .ranked(3)
                .into_iter()
                .map(|(author, p)| (author.to_string(), p))
                .collect(),
            None => Vec::new(),
        };

        Some(Explanation {
            timestamp: record.timestamp(),
            age_days: scoring::age_days(record.timestamp(), self.now),
            channel_name: self.channels.name(record.channel_id).map(str::to_string),
            word_count: record.word_count(),
            breakdown,
            top_guesses,
            classifier: model.as_ref().map(ModelStats::of),
            record: record.clone(),
        })
    }

    fn breakdown(
        &self,
        scorer: &HeuristicScorer<'_>,
        record: &Record,
        model: Option<&StyleModel>,
        params: &ScoreParams,
    ) -> ScoreBreakdown {
        let sub_scores = scorer.score(record);
        let posterior = model.map(|m| m.predict_distribution(&record.content));
        scoring::explain(sub_scores, posterior.as_ref(), &record.author_id, params)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("█▓▒░  "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message("Scoring messages...");
        bar
    }

    fn stats(curated: &Curated, model: Option<&StyleModel>) -> ScoreStats {
        let mut labels: BTreeMap<DifficultyLabel, usize> =
            DifficultyLabel::all().iter().map(|&l| (l, 0)).collect();
        let mut imposters = 0;
        for scored in &curated.records {
            *labels.entry(scored.result.label).or_insert(0) += 1;
            if scored.result.imposter_id.is_some() {
                imposters += 1;
            }
        }

        ScoreStats {
            scored: curated.records.len(),
            classifier: model.map(ModelStats::of),
            labels,
            imposters,
            pruned_authors: curated.pruned_authors,
            orphaned_records: curated.orphaned_records,
        }
    }
}
