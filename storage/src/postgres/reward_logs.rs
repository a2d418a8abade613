use tokio_postgres::Row;

use crate::models::{RewardLogEntry, RewardType};
use crate::pg::PgPool;
use crate::Result;

fn entry_from_row(row: &Row) -> RewardLogEntry {
    RewardLogEntry {
        id: row.get("id"),
        answer_id: row.get("answer_id"),
        reward_type: RewardType::from(row.get::<_, String>("reward_type")),
        status: row.get("status"),
        tx_hash: row.get("tx_hash"),
        error: row.get("error"),
        created_at: row.get("created_at"),
    }
}

/// Entries for one answer, oldest first. Ties on `created_at` fall back to insertion id.
pub async fn list_for_answer(pool: &PgPool, answer_id: &str) -> Result<Vec<RewardLogEntry>> {
    let client = pool.get().await?;

    let rows = client
        .query(
            "SELECT id, answer_id, reward_type, status, tx_hash, error, created_at
             FROM reward_logs
             WHERE answer_id = $1
             ORDER BY created_at ASC, id ASC",
            &[&answer_id],
        )
        .await?;

    Ok(rows.iter().map(entry_from_row).collect())
}
