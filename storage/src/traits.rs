use async_trait::async_trait;

use crate::models::{Answer, RewardLogEntry};
use crate::Result;

/// Read-only view of the reward ledger needed for reconciliation.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Answers whose acceptance flag is set. Stable order within one call.
    async fn list_accepted_answers(&self) -> Result<Vec<Answer>>;

    /// All reward log entries for one answer, in creation order.
    async fn list_reward_log_entries(&self, answer_id: &str) -> Result<Vec<RewardLogEntry>>;

    async fn get_answer(&self, answer_id: &str) -> Result<Option<Answer>>;

    /// Cheap reachability probe.
    async fn ping(&self) -> Result<()>;
}
