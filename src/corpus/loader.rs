//! Corpus loader

use super::{Corpus, CorpusError, LoadReport, LoadedCorpus};
use crate::config::LoaderConfig;
use crate::models::{AuthorId, AuthorMap, AuthorProfile, Record};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info, warn};

/// Read and validate a corpus file.
pub fn load_corpus(path: &Path, config: &LoaderConfig) -> Result<LoadedCorpus, CorpusError> {
    let content = std::fs::read_to_string(path).map_err(|source| CorpusError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let loaded = parse_corpus(&content, config)?;
    info!(
        "Loaded {} of {} messages and {} users from {}",
        loaded.corpus.records.len(),
        loaded.report.total_messages,
        loaded.corpus.authors.len(),
        path.display()
    );
    Ok(loaded)
}

/// Validate a corpus already held in memory.
pub fn parse_corpus(json: &str, config: &LoaderConfig) -> Result<LoadedCorpus, CorpusError> {
    let root: Value = serde_json::from_str(json).map_err(CorpusError::Parse)?;
    let Value::Object(mut root) = root else {
        return Err(CorpusError::SectionType {
            section: "<root>",
            expected: "an object",
        });
    };

    let meta = root
        .remove("meta")
        .unwrap_or_else(|| Value::Object(Map::new()));

    let users = match root.remove("users") {
        Some(Value::Object(users)) => users,
        Some(_) => {
            return Err(CorpusError::SectionType {
                section: "users",
                expected: "an object keyed by author id",
            })
        }
        None => return Err(CorpusError::MissingSection("users")),
    };

    let messages = match root.remove("messages") {
        Some(Value::Array(messages)) => messages,
        Some(_) => {
            return Err(CorpusError::SectionType {
                section: "messages",
                expected: "an array",
            })
        }
        None => return Err(CorpusError::MissingSection("messages")),
    };

    let mut report = LoadReport {
        total_messages: messages.len(),
        ..LoadReport::default()
    };

    let mut authors = parse_users(users, &mut report);
    let (records, earliest) = parse_messages(messages, config, &mut report);
    report.joined_at_tightened = tighten_joined_at(&mut authors, earliest);

    if report.skipped > 0 {
        warn!("Skipped {} malformed messages", report.skipped);
    }
    debug!("Load report: {:?}", report);

    Ok(LoadedCorpus {
        corpus: Corpus {
            meta,
            authors,
            records,
        },
        report,
    })
}

fn parse_users(users: Map<String, Value>, report: &mut LoadReport) -> AuthorMap {
    let mut authors = AuthorMap::new();

    for (key, mut value) in users {
        // The map key is authoritative; profiles may omit their own id
        if let Value::Object(fields) = &mut value {
            fields
                .entry("id")
                .or_insert_with(|| Value::String(key.clone()));
        }

        let mut profile: AuthorProfile = match serde_json::from_value(value) {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Skipping user '{}': {}", key, e);
                report.skipped_users += 1;
                continue;
            }
        };

        if profile.author_id.as_str() != key {
            warn!(
                "User '{}' carries id '{}', keeping the map key",
                key, profile.author_id
            );
            profile.author_id = AuthorId::new(key);
        }

        authors.insert(profile.author_id.clone(), profile);
    }

    authors
}

/// Valid records that pass the filters, plus each author's earliest message
/// time over every valid record, filtered or not.
fn parse_messages(
    messages: Vec<Value>,
    config: &LoaderConfig,
    report: &mut LoadReport,
) -> (Vec<Record>, FxHashMap<AuthorId, f64>) {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut earliest: FxHashMap<AuthorId, f64> = FxHashMap::default();
    let mut records = Vec::with_capacity(messages.len());

    for (index, value) in messages.into_iter().enumerate() {
        let record: Record = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping message #{}: {}", index, e);
                report.skipped += 1;
                continue;
            }
        };

        if record.content.trim().is_empty() {
            warn!("Skipping message {}: empty content", record.msg_id);
            report.skipped += 1;
            continue;
        }

        let ts = record.msg_id.timestamp_secs();
        earliest
            .entry(record.author_id.clone())
            .and_modify(|t| *t = t.min(ts))
            .or_insert(ts);

        if record.is_text() && record.word_count() < config.min_text_words {
            debug!(
                "Filtering message {}: {} words",
                record.msg_id,
                record.word_count()
            );
            report.filtered += 1;
            continue;
        }

        if config.dedupe_content && !seen.insert(record.content.clone()) {
            debug!("Dropping duplicate message {}", record.msg_id);
            report.deduped += 1;
            continue;
        }

        records.push(record);
    }

    (records, earliest)
}

/// Move each author's `joined_at` to their earliest message when that is earlier.
fn tighten_joined_at(authors: &mut AuthorMap, earliest: FxHashMap<AuthorId, f64>) -> usize {
    let mut tightened = 0;
    for (author, ts) in earliest {
        if let Some(profile) = authors.get_mut(&author) {
            let before = profile.joined_at;
            profile.tighten_joined_at(ts);
            if profile.joined_at != before {
                tightened += 1;
            }
        }
    }
    tightened
}
