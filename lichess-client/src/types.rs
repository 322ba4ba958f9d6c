//! Request and response types.
//!
//! Public types are what callers see. The `*Record` types are the per-endpoint
//! line shapes of the NDJSON listings, each mapped into [`Study`].

use serde::{Deserialize, Serialize};

/// A study or broadcast round, identified for PGN import or push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Study {
    /// Study or round id.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// The authenticated user, from `GET /api/account`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Lowercase user id.
    pub id: String,
    /// Username with original casing.
    pub username: String,
    /// Chess title (GM, IM, ...), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Profile URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Every other field, untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A game created by `POST /api/import`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedGame {
    /// Game id.
    pub id: String,
    /// Game URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One line of `GET /api/study/by/{username}`.
#[derive(Debug, Deserialize)]
pub(crate) struct StudyRecord {
    id: String,
    name: String,
}

impl From<StudyRecord> for Study {
    fn from(record: StudyRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
        }
    }
}

/// One line of `GET /api/broadcast/my-rounds`. Only the round is kept.
#[derive(Debug, Deserialize)]
pub(crate) struct BroadcastRecord {
    round: StudyRecord,
}

impl From<BroadcastRecord> for Study {
    fn from(record: BroadcastRecord) -> Self {
        record.round.into()
    }
}
