use crate::error::AppError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub type ItemId = i64;
pub type UserId = i64;

/// Offline recommendation table kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecKind {
    /// Per-user precomputed recommendations
    Personal,
    /// Global popularity fallback
    Default,
}

impl RecKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecKind::Personal => "personal",
            RecKind::Default => "default",
        }
    }
}

impl fmt::Display for RecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "personal" => Ok(RecKind::Personal),
            "default" => Ok(RecKind::Default),
            other => Err(AppError::Validation(format!(
                "unknown recommendation type '{}', expected 'personal' or 'default'",
                other
            ))),
        }
    }
}

/// One neighbour returned by a similarity lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: ItemId,
    pub score: f32,
}

impl ScoredItem {
    pub fn new(item_id: ItemId, score: f32) -> Self {
        Self { item_id, score }
    }

    /// Descending by score for a stable sort
    ///
    /// Numerically equal scores compare equal, so `0.0` and `-0.0` tie.
    /// Scores are finite once loaded.
    pub fn by_score_desc(a: &ScoredItem, b: &ScoredItem) -> Ordering {
        b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
    }
}

/// Row of the personal recommendations snapshot
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PersonalRow {
    pub user_id: UserId,
    pub item_id: ItemId,
    #[serde(deserialize_with = "deserialize_rank")]
    pub rank: u32,
}

/// Row of the popularity snapshot
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DefaultRow {
    pub item_id: ItemId,
    #[serde(deserialize_with = "deserialize_rank")]
    pub rank: u32,
}

/// Accept integral ranks written as floats (`3.0`), as dataframe exports do
fn deserialize_rank<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw < 0.0 || raw.fract() != 0.0 || raw > u32::MAX as f64 {
        return Err(de::Error::custom(format!(
            "rank must be a non-negative integer, got {}",
            raw
        )));
    }
    Ok(raw as u32)
}

/// Display metadata for an item, used only for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub item_id: ItemId,
    #[serde(default)]
    pub track_name: String,
    #[serde(default)]
    pub artists_names: String,
}

/// Result of a successful table load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub kind: RecKind,
    pub rows: usize,
    /// Distinct users; zero for the default table
    pub users: usize,
}
