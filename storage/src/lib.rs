//! Off-chain reward ledger access.
//!
//! The ledger lives in Postgres as two tables, `answers` and `reward_logs`.
//! This crate only reads it: the audit never writes back.

pub mod models;
pub mod pg;
pub mod postgres;
pub mod traits;

pub use models::{Answer, RewardLogEntry, RewardStatus, RewardType};
pub use pg::{create_pool, PgConfig, PgPool, PoolError};
pub use postgres::PgLedgerReader;
pub use traits::LedgerReader;

use thiserror::Error;

/// Ledger schema the reader expects.
pub const LEDGER_SCHEMA: &str = include_str!("../migrations/001_reward_ledger.sql");

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("failed to create pool: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),
}

pub type Result<T> = std::result::Result<T, StorageError>;
