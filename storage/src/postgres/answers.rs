use tokio_postgres::Row;

use crate::models::Answer;
use crate::pg::PgPool;
use crate::Result;

const ANSWER_COLUMNS: &str = "id, author_id, accepted, tx_hashes, reward_amount, created_at";

fn answer_from_row(row: &Row) -> Answer {
    Answer {
        id: row.get("id"),
        author_id: row.get("author_id"),
        accepted: row.get("accepted"),
        tx_hashes: row.get("tx_hashes"),
        reward_amount: row.get("reward_amount"),
        created_at: row.get("created_at"),
    }
}

pub async fn list_accepted_answers(pool: &PgPool) -> Result<Vec<Answer>> {
    let client = pool.get().await?;

    let rows = client
        .query(
            &format!(
                "SELECT {} FROM answers WHERE accepted = TRUE ORDER BY id",
                ANSWER_COLUMNS
            ),
            &[],
        )
        .await?;

    Ok(rows.iter().map(answer_from_row).collect())
}

pub async fn get_answer(pool: &PgPool, answer_id: &str) -> Result<Option<Answer>> {
    let client = pool.get().await?;

    let row = client
        .query_opt(
            &format!("SELECT {} FROM answers WHERE id = $1", ANSWER_COLUMNS),
            &[&answer_id],
        )
        .await?;

    Ok(row.as_ref().map(answer_from_row))
}
