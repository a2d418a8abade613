use std::fmt;

use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

/// An answer as recorded off-chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub author_id: String,
    /// Only accepted answers are reward-eligible
    pub accepted: bool,
    /// Transaction hashes appended by the reward issuer
    pub tx_hashes: Vec<String>,
    /// Amount already recorded off-chain
    pub reward_amount: f64,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a reward attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "lowercase")]
#[postgres(name = "reward_status")]
pub enum RewardStatus {
    #[postgres(name = "pending")]
    Pending,
    #[postgres(name = "confirmed")]
    Confirmed,
    #[postgres(name = "failed")]
    Failed,
}

impl fmt::Display for RewardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RewardStatus::Pending => "pending",
            RewardStatus::Confirmed => "confirmed",
            RewardStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Why a reward was issued. Unknown tags are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RewardType {
    AnswerAccepted,
    Bonus,
    Other(String),
}

impl RewardType {
    pub fn as_str(&self) -> &str {
        match self {
            RewardType::AnswerAccepted => "answer-accepted",
            RewardType::Bonus => "bonus",
            RewardType::Other(tag) => tag,
        }
    }
}

impl From<String> for RewardType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "answer-accepted" => RewardType::AnswerAccepted,
            "bonus" => RewardType::Bonus,
            _ => RewardType::Other(tag),
        }
    }
}

impl From<&str> for RewardType {
    fn from(tag: &str) -> Self {
        RewardType::from(tag.to_string())
    }
}

impl From<RewardType> for String {
    fn from(reward_type: RewardType) -> Self {
        reward_type.as_str().to_string()
    }
}

impl fmt::Display for RewardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the append-only reward audit trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardLogEntry {
    pub id: i64,
    pub answer_id: String,
    pub reward_type: RewardType,
    pub status: RewardStatus,
    /// Present once confirmed
    pub tx_hash: Option<String>,
    /// Present only when failed
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RewardLogEntry {
    pub fn is_confirmed(&self) -> bool {
        self.status == RewardStatus::Confirmed
    }
}
