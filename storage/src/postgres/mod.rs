pub mod answers;
pub mod reward_logs;

use async_trait::async_trait;
use tracing::debug;

use crate::models::{Answer, RewardLogEntry};
use crate::pg::PgPool;
use crate::traits::LedgerReader;
use crate::Result;

/// [`LedgerReader`] backed by the Postgres ledger.
#[derive(Clone)]
pub struct PgLedgerReader {
    pool: PgPool,
}

impl PgLedgerReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerReader for PgLedgerReader {
    async fn list_accepted_answers(&self) -> Result<Vec<Answer>> {
        let answers = answers::list_accepted_answers(&self.pool).await?;
        debug!("Loaded {} accepted answers", answers.len());
        Ok(answers)
    }

    async fn list_reward_log_entries(&self, answer_id: &str) -> Result<Vec<RewardLogEntry>> {
        reward_logs::list_for_answer(&self.pool, answer_id).await
    }

    async fn get_answer(&self, answer_id: &str) -> Result<Option<Answer>> {
        answers::get_answer(&self.pool, answer_id).await
    }

    async fn ping(&self) -> Result<()> {
        let client = self.pool.get().await?;
        client.query_one("SELECT 1", &[]).await?;
        Ok(())
    }
}
