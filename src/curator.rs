//! Output curation
//!
//! The game client resolves every message's author against the user map, so
//! the saved corpus must be closed under that lookup: no author without a
//! message, no message without an author.

use crate::models::{AuthorId, AuthorMap, ScoredCorpus, ScoredRecord};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Curated output plus what was removed
#[derive(Debug, Clone)]
pub struct Curated {
    pub authors: AuthorMap,
    pub records: Vec<ScoredRecord>,
    /// Authors dropped for having no surviving record
    pub pruned_authors: usize,
    /// Records dropped because their author has no profile
    pub orphaned_records: usize,
}

impl Curated {
    pub fn into_corpus(self, meta: serde_json::Value) -> ScoredCorpus {
        ScoredCorpus {
            meta,
            users: self.authors,
            messages: self.records,
        }
    }
}

/// Keep only authors referenced by some record, and only records whose author is known.
///
/// Record order is preserved. Running it on its own output changes nothing.
pub fn curate(mut authors: AuthorMap, records: Vec<ScoredRecord>) -> Curated {
    let before = records.len();
    let records: Vec<ScoredRecord> = records
        .into_iter()
        .filter(|r| authors.contains_key(&r.record.author_id))
        .collect();
    let orphaned_records = before - records.len();
    if orphaned_records > 0 {
        warn!(
            "Dropped {} messages whose author has no profile",
            orphaned_records
        );
    }

    let active: BTreeSet<&AuthorId> = records.iter().map(|r| &r.record.author_id).collect();
    let before = authors.len();
    authors.retain(|id, _| active.contains(id));
    let pruned_authors = before - authors.len();

    info!("Users reduced from {} to {}", before, authors.len());

    Curated {
        authors,
        records,
        pruned_authors,
        orphaned_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorProfile, DifficultyResult, Record, RecordKind, Snowflake};

    fn authors(ids: &[&str]) -> AuthorMap {
        ids.iter()
            .map(|id| {
                let id = AuthorId::from(*id);
                (id.clone(), AuthorProfile::new(id, "someone"))
            })
            .collect()
    }

    fn scored(author: &str, n: u64) -> ScoredRecord {
        ScoredRecord {
            record: Record {
                author_id: AuthorId::from(author),
                kind: RecordKind::Text,
                content: format!("message {n}"),
                msg_id: Snowflake(454492770682404877 + n),
                channel_id: Snowflake(1),
            },
            result: DifficultyResult::new(5, None),
        }
    }

    #[test]
    fn test_prunes_silent_authors() {
        let curated = curate(
            authors(&["a", "b", "c"]),
            vec![scored("a", 1), scored("c", 2), scored("a", 3)],
        );
        assert_eq!(curated.pruned_authors, 1);
        assert_eq!(curated.orphaned_records, 0);
        assert_eq!(
            curated.authors.keys().map(AuthorId::as_str).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
        assert_eq!(curated.records.len(), 3);
    }

    #[test]
    fn test_drops_orphaned_records() {
        let curated = curate(authors(&["a"]), vec![scored("a", 1), scored("ghost", 2)]);
        assert_eq!(curated.orphaned_records, 1);
        assert_eq!(curated.records.len(), 1);
        assert_eq!(curated.records[0].record.author_id.as_str(), "a");
    }

    #[test]
    fn test_referential_integrity() {
        let curated = curate(
            authors(&["a", "b", "c", "d"]),
            vec![scored("b", 1), scored("x", 2), scored("d", 3), scored("b", 4)],
        );
        for record in &curated.records {
            assert!(curated.authors.contains_key(&record.record.author_id));
        }
        for id in curated.authors.keys() {
            assert!(curated.records.iter().any(|r| &r.record.author_id == id));
        }
        // Order preserved
        let order: Vec<u64> = curated.records.iter().map(|r| r.record.msg_id.0).collect();
        assert_eq!(
            order,
            vec![454492770682404878, 454492770682404880, 454492770682404881]
        );
    }

    #[test]
    fn test_curate_is_idempotent() {
        let once = curate(
            authors(&["a", "b", "c"]),
            vec![scored("a", 1), scored("z", 2), scored("c", 3)],
        );
        let twice = curate(once.authors.clone(), once.records.clone());
        assert_eq!(twice.authors, once.authors);
        assert_eq!(twice.records, once.records);
        assert_eq!(twice.pruned_authors, 0);
        assert_eq!(twice.orphaned_records, 0);
    }

    #[test]
    fn test_empty_input() {
        let curated = curate(authors(&["a"]), Vec::new());
        assert!(curated.authors.is_empty());
        assert!(curated.records.is_empty());
        assert_eq!(curated.pruned_authors, 1);
    }
}
