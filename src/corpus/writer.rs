//! Scored corpus writer

use super::CorpusError;
use crate::models::ScoredCorpus;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// `final_<name>` next to the input file.
pub fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "corpus.json".to_string());
    input.with_file_name(format!("final_{name}"))
}

/// Write the scored corpus. A failed write leaves any existing file at `path` untouched.
pub fn save_scored(path: &Path, corpus: &ScoredCorpus) -> Result<(), CorpusError> {
    let write_err = |source| CorpusError::Write {
        path: path.to_path_buf(),
        source,
    };

    // Write to temp file first, then rename (atomic on POSIX)
    let tmp_file = path.with_extension("json.tmp");

    let result = (|| -> Result<(), CorpusError> {
        let file = File::create(&tmp_file).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, corpus).map_err(CorpusError::Serialize)?;
        writer.flush().map_err(write_err)?;
        fs::rename(&tmp_file, path).map_err(write_err)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_file);
    }
    result?;

    debug!(
        "Saved {} messages and {} users to {}",
        corpus.messages.len(),
        corpus.users.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AuthorId, AuthorMap, AuthorProfile, DifficultyResult, Record, RecordKind, ScoredRecord,
        Snowflake,
    };

    fn sample() -> ScoredCorpus {
        let author = AuthorId::from("10");
        let mut users = AuthorMap::new();
        users.insert(author.clone(), AuthorProfile::new(author.clone(), "Ten"));
        ScoredCorpus {
            meta: serde_json::json!({"guild_id": "1"}),
            users,
            messages: vec![ScoredRecord {
                record: Record {
                    author_id: author,
                    kind: RecordKind::Text,
                    content: "hello".into(),
                    msg_id: Snowflake(454492770682404877),
                    channel_id: Snowflake(648376150447357962),
                },
                result: DifficultyResult::new(5, None),
            }],
        }
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("data/game_data.json")),
            PathBuf::from("data/final_game_data.json")
        );
        assert_eq!(
            default_output_path(Path::new("game_data.json")),
            PathBuf::from("final_game_data.json")
        );
    }

    #[test]
    fn test_save_and_read_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("final_game_data.json");
        save_scored(&path, &sample()).expect("save");

        let content = fs::read_to_string(&path).expect("read output");
        let back: ScoredCorpus = serde_json::from_str(&content).expect("parse output");
        assert_eq!(back.messages, sample().messages);
        assert_eq!(back.meta["guild_id"], "1");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_failed_save_leaves_nothing_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("no_such_dir").join("out.json");
        let err = save_scored(&path, &sample()).unwrap_err();
        assert!(matches!(err, CorpusError::Write { .. }));
        assert!(!path.exists());
    }
}
