//! Core data models for whosaid
//!
//! These models are shared by the loader, the scorers and the curator.
//! Field names on the wire follow the corpus format produced by the
//! message scraper (`type`, `rank_val`, `clues`, ids as strings).

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Milliseconds between the Unix epoch and the snowflake epoch (2015-01-01T00:00:00Z).
pub const SNOWFLAKE_EPOCH_MS: u64 = 1_420_070_400_000;

/// Bits below the timestamp in a snowflake (worker, process, increment).
const SNOWFLAKE_TIMESTAMP_SHIFT: u32 = 22;

/// A time-ordered 64-bit identifier. Message ids and channel ids are both snowflakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Snowflake(pub u64);

/// Channels are addressed by snowflake ids.
pub type ChannelId = Snowflake;

impl Snowflake {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Creation time in milliseconds since the Unix epoch.
    ///
    /// `(id >> 22) + 1420070400000`, bit-for-bit.
    pub fn timestamp_ms(self) -> i64 {
        ((self.0 >> SNOWFLAKE_TIMESTAMP_SHIFT) + SNOWFLAKE_EPOCH_MS) as i64
    }

    /// Creation time as UTC.
    pub fn timestamp(self) -> DateTime<Utc> {
        // (u64::MAX >> 22) + epoch is ~year 2154, always inside chrono's range
        DateTime::from_timestamp_millis(self.timestamp_ms()).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Creation time in fractional seconds, the unit used by `joined_at`.
    pub fn timestamp_secs(self) -> f64 {
        self.timestamp_ms() as f64 / 1000.0
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Snowflake)
    }
}

// Snowflakes exceed 2^53, so they are written as strings to survive JavaScript clients.
impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a snowflake id as an unsigned integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Snowflake, E> {
                Ok(Snowflake(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Snowflake, E> {
                u64::try_from(v)
                    .map(Snowflake)
                    .map_err(|_| E::custom(format!("negative snowflake id {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Snowflake, E> {
                v.parse()
                    .map_err(|_| E::custom(format!("invalid snowflake id '{v}'")))
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

/// Identifier of a message author. Kept as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AuthorId(pub String);

impl AuthorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for AuthorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AuthorIdVisitor;

        impl Visitor<'_> for AuthorIdVisitor {
            type Value = AuthorId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an author id as a string or an integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<AuthorId, E> {
                Ok(AuthorId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<AuthorId, E> {
                Ok(AuthorId(v.to_string()))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<AuthorId, E> {
                if v.trim().is_empty() {
                    return Err(E::custom("empty author id"));
                }
                Ok(AuthorId(v.to_string()))
            }
        }

        deserializer.deserialize_any(AuthorIdVisitor)
    }
}

/// What a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Text,
    /// `content` holds the image URL
    Image,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Text => write!(f, "text"),
            RecordKind::Image => write!(f, "image"),
        }
    }
}

/// A single authored message from the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub author_id: AuthorId,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub content: String,
    pub msg_id: Snowflake,
    pub channel_id: ChannelId,
}

impl Record {
    /// Creation time decoded from `msg_id`.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.msg_id.timestamp()
    }

    pub fn is_text(&self) -> bool {
        self.kind == RecordKind::Text
    }

    /// Whitespace-delimited token count.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

fn default_rank() -> u32 {
    999
}

/// Profile of a corpus author.
///
/// Read-only to the pipeline except `joined_at`, which the loader may move
/// earlier when a message predates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorProfile {
    #[serde(rename = "id")]
    pub author_id: AuthorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Position in the server's rank ladder, 999 when unranked
    #[serde(rename = "rank_val", default = "default_rank")]
    pub role_derived_rank: u32,
    /// Clue tags in the order the game shows them
    #[serde(rename = "clues", default)]
    pub clue_tags: Vec<String>,
    /// Seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_len: Option<usize>,
}

impl AuthorProfile {
    pub fn new(author_id: AuthorId, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            author_id,
            username: None,
            nickname: display_name.clone(),
            display_name,
            avatar: None,
            role_derived_rank: default_rank(),
            clue_tags: Vec::new(),
            joined_at: None,
            name_len: None,
        }
    }

    /// Move `joined_at` earlier if `observed` predates it. Never moves it later.
    pub fn tighten_joined_at(&mut self, observed: f64) {
        self.joined_at = Some(match self.joined_at {
            Some(current) => current.min(observed),
            None => observed,
        });
    }
}

/// Authors keyed by id, sorted for stable output.
pub type AuthorMap = BTreeMap<AuthorId, AuthorProfile>;

/// The three heuristic contributions, each in {-1, 0, +1}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SubScores {
    pub age_score: i8,
    pub channel_score: i8,
    pub length_score: i8,
}

impl SubScores {
    pub fn total(&self) -> i32 {
        i32::from(self.age_score) + i32::from(self.channel_score) + i32::from(self.length_score)
    }
}

/// Categorical difficulty shown to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DifficultyLabel {
    Easy,
    Medium,
    Hard,
}

impl DifficultyLabel {
    /// `<= 3` is Easy, `>= 8` is Hard, everything between is Medium.
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s <= 3 => DifficultyLabel::Easy,
            s if s >= 8 => DifficultyLabel::Hard,
            _ => DifficultyLabel::Medium,
        }
    }

    pub fn all() -> &'static [DifficultyLabel] {
        &[
            DifficultyLabel::Easy,
            DifficultyLabel::Medium,
            DifficultyLabel::Hard,
        ]
    }
}

impl fmt::Display for DifficultyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLabel::Easy => write!(f, "Easy"),
            DifficultyLabel::Medium => write!(f, "Medium"),
            DifficultyLabel::Hard => write!(f, "Hard"),
        }
    }
}

/// Final, terminal scoring outcome for a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyResult {
    /// 1..=10
    pub score: u8,
    pub label: DifficultyLabel,
    /// Author the model wrongly favors, absent when there is none
    pub imposter_id: Option<AuthorId>,
}

impl DifficultyResult {
    pub fn new(score: u8, imposter_id: Option<AuthorId>) -> Self {
        Self {
            score,
            label: DifficultyLabel::from_score(score),
            imposter_id,
        }
    }
}

/// A record with its difficulty attached.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ScoredRecordWire")]
pub struct ScoredRecord {
    pub record: Record,
    pub result: DifficultyResult,
}

#[derive(Serialize, Deserialize)]
struct DifficultyWire {
    score: u8,
    label: DifficultyLabel,
}

#[derive(Deserialize)]
struct ScoredRecordWire {
    #[serde(flatten)]
    record: Record,
    difficulty: DifficultyWire,
    #[serde(default)]
    imposter_id: Option<AuthorId>,
}

impl From<ScoredRecordWire> for ScoredRecord {
    fn from(wire: ScoredRecordWire) -> Self {
        Self {
            record: wire.record,
            result: DifficultyResult {
                score: wire.difficulty.score,
                label: wire.difficulty.label,
                imposter_id: wire.imposter_id,
            },
        }
    }
}

impl Serialize for ScoredRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Out<'a> {
            #[serde(flatten)]
            record: &'a Record,
            difficulty: DifficultyWire,
            #[serde(skip_serializing_if = "Option::is_none")]
            imposter_id: Option<&'a AuthorId>,
        }

        Out {
            record: &self.record,
            difficulty: DifficultyWire {
                score: self.result.score,
                label: self.result.label,
            },
            imposter_id: self.result.imposter_id.as_ref(),
        }
        .serialize(serializer)
    }
}

/// The dataset handed to the game client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCorpus {
    #[serde(default)]
    pub meta: serde_json::Value,
    pub users: AuthorMap,
    pub messages: Vec<ScoredRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_decoding() {
        let id = Snowflake(454492770682404877);
        assert_eq!(id.timestamp_ms(), (454492770682404877u64 >> 22) as i64 + 1420070400000);
        assert_eq!(id.timestamp_ms(), 1528429920598);
        assert_eq!(id.timestamp().to_rfc3339(), "2018-06-08T03:52:00.598+00:00");
    }

    #[test]
    fn test_snowflake_zero_is_epoch() {
        assert_eq!(Snowflake(0).timestamp().to_rfc3339(), "2015-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_snowflake_accepts_string_and_integer() {
        let from_str: Snowflake = serde_json::from_str("\"454492770682404877\"").expect("string id");
        let from_int: Snowflake = serde_json::from_str("454492770682404877").expect("integer id");
        assert_eq!(from_str, from_int);
        assert!(serde_json::from_str::<Snowflake>("\"abc\"").is_err());
        assert!(serde_json::from_str::<Snowflake>("-4").is_err());
        assert_eq!(serde_json::to_string(&from_int).expect("serialize"), "\"454492770682404877\"");
    }

    #[test]
    fn test_author_id_rejects_empty() {
        assert!(serde_json::from_str::<AuthorId>("\"  \"").is_err());
        let id: AuthorId = serde_json::from_str("12").expect("integer author id");
        assert_eq!(id.as_str(), "12");
    }

    #[test]
    fn test_label_from_score() {
        assert_eq!(DifficultyLabel::from_score(1), DifficultyLabel::Easy);
        assert_eq!(DifficultyLabel::from_score(3), DifficultyLabel::Easy);
        assert_eq!(DifficultyLabel::from_score(4), DifficultyLabel::Medium);
        assert_eq!(DifficultyLabel::from_score(7), DifficultyLabel::Medium);
        assert_eq!(DifficultyLabel::from_score(8), DifficultyLabel::Hard);
        assert_eq!(DifficultyLabel::from_score(10), DifficultyLabel::Hard);
    }

    #[test]
    fn test_tighten_joined_at_only_moves_earlier() {
        let mut profile = AuthorProfile::new(AuthorId::from("1"), "one");
        profile.tighten_joined_at(200.0);
        assert_eq!(profile.joined_at, Some(200.0));
        profile.tighten_joined_at(100.0);
        assert_eq!(profile.joined_at, Some(100.0));
        profile.tighten_joined_at(300.0);
        assert_eq!(profile.joined_at, Some(100.0));

        profile.joined_at = Some(0.0);
        profile.tighten_joined_at(50.0);
        assert_eq!(profile.joined_at, Some(0.0));
    }

    #[test]
    fn test_scored_record_wire_shape() {
        let scored = ScoredRecord {
            record: Record {
                author_id: AuthorId::from("7"),
                kind: RecordKind::Text,
                content: "hello there".into(),
                msg_id: Snowflake(454492770682404877),
                channel_id: Snowflake(648376150447357962),
            },
            result: DifficultyResult::new(6, None),
        };

        let value = serde_json::to_value(&scored).expect("serialize");
        assert_eq!(value["type"], "text");
        assert_eq!(value["msg_id"], "454492770682404877");
        assert_eq!(value["difficulty"]["score"], 6);
        assert_eq!(value["difficulty"]["label"], "Medium");
        assert!(value.get("imposter_id").is_none());

        let with_imposter = ScoredRecord {
            result: DifficultyResult::new(9, Some(AuthorId::from("8"))),
            ..scored
        };
        let value = serde_json::to_value(&with_imposter).expect("serialize");
        assert_eq!(value["imposter_id"], "8");

        let back: ScoredRecord = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, with_imposter);
    }

    #[test]
    fn test_author_profile_wire_names() {
        let json = r#"{"id":"5","display_name":"Five","nickname":"V","rank_val":2,"clues":["tft","readers"],"joined_at":1600000000.5}"#;
        let profile: AuthorProfile = serde_json::from_str(json).expect("profile");
        assert_eq!(profile.role_derived_rank, 2);
        assert_eq!(profile.clue_tags, vec!["tft", "readers"]);
        assert_eq!(profile.joined_at, Some(1600000000.5));

        let minimal: AuthorProfile = serde_json::from_str(r#"{"id":"6"}"#).expect("minimal profile");
        assert_eq!(minimal.role_derived_rank, 999);
        assert!(minimal.clue_tags.is_empty());

        let value = serde_json::to_value(&profile).expect("serialize");
        assert_eq!(value["clues"], serde_json::json!(["tft", "readers"]));
    }
}
