//! Reconciliation engine
//!
//! For every accepted answer: ask the contract for its key, ask whether that
//! key was paid, read the answer's reward log, then classify. Nothing is ever
//! written to either side.
//!
//! Chain failures stay local to one answer and surface as `Indeterminate`.
//! A ledger failure aborts the whole batch since no classification is
//! meaningful without it.

pub mod record;
pub mod report;
pub mod retry;

pub use record::{Classification, LedgerEvidence, ReconciliationRecord};

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use reward_audit_storage::{Answer, LedgerReader};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::chain::{ChainReader, OnChainKey};
use crate::config::ReconcileConfig;
use crate::error::{AuditError, ChainError, Result};
use report::AuditReport;

pub const DEADLINE_EXCEEDED: &str = "batch deadline exceeded";

pub struct ReconciliationEngine<C, L> {
    chain: C,
    ledger: L,
    config: ReconcileConfig,
}

impl<C: ChainReader, L: LedgerReader> ReconciliationEngine<C, L> {
    pub fn new(chain: C, ledger: L, config: ReconcileConfig) -> Self {
        Self {
            chain,
            ledger,
            config,
        }
    }

    /// Audit every accepted answer in the ledger.
    pub async fn run(&self) -> Result<AuditReport> {
        let started_at = Utc::now();

        let answers = self.ledger.list_accepted_answers().await?;
        info!(
            "Reconciling {} accepted answers (concurrency {}, deadline {:?})",
            answers.len(),
            self.config.concurrency.max(1),
            self.config.batch_timeout()
        );

        let records = self.reconcile_answers(&answers).await?;
        let report = AuditReport::new(records, started_at, Utc::now());

        info!(
            "Reconciliation finished: {} consistent, {} anomalies, {} indeterminate",
            report.summary.consistent(),
            report.summary.anomalies(),
            report.summary.indeterminate
        );
        Ok(report)
    }

    /// Reconcile a single answer by id, accepted or not.
    pub async fn reconcile_one(&self, answer_id: &str) -> Result<ReconciliationRecord> {
        let answer = self
            .ledger
            .get_answer(answer_id)
            .await?
            .ok_or_else(|| AuditError::NotFound(answer_id.to_string()))?;

        if !answer.accepted {
            warn!(
                "Answer {} is not accepted; it is not reward-eligible yet",
                answer.id
            );
        }

        let deadline = Instant::now() + self.config.batch_timeout();
        self.reconcile_before(&answer, deadline).await
    }

    /// One record per answer, sorted by answer id whatever the completion order.
    pub async fn reconcile_answers(&self, answers: &[Answer]) -> Result<Vec<ReconciliationRecord>> {
        let deadline = Instant::now() + self.config.batch_timeout();
        let concurrency = self.config.concurrency.max(1);

        let mut records: Vec<ReconciliationRecord> = stream::iter(answers)
            .map(|answer| self.reconcile_before(answer, deadline))
            .buffer_unordered(concurrency)
            .try_collect()
            .await?;

        records.sort_by(|a, b| a.answer_id.cmp(&b.answer_id));
        Ok(records)
    }

    async fn reconcile_before(
        &self,
        answer: &Answer,
        deadline: Instant,
    ) -> Result<ReconciliationRecord> {
        match tokio::time::timeout_at(deadline, self.reconcile_answer(answer)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Answer {}: {}", answer.id, DEADLINE_EXCEEDED);
                Ok(ReconciliationRecord::indeterminate(
                    &answer.id,
                    None,
                    None,
                    DEADLINE_EXCEEDED,
                ))
            }
        }
    }

    async fn reconcile_answer(&self, answer: &Answer) -> Result<ReconciliationRecord> {
        let chain_state = self.read_chain_state(&answer.id).await;

        let entries = self.ledger.list_reward_log_entries(&answer.id).await?;
        let evidence = LedgerEvidence::from_entries(&entries);

        let record = match chain_state {
            ChainState::Known { key, rewarded } => {
                ReconciliationRecord::classified(&answer.id, key, rewarded, evidence)
            }
            ChainState::Failed { key, error } => {
                warn!("Answer {}: chain read failed: {}", answer.id, error);
                ReconciliationRecord::indeterminate(
                    &answer.id,
                    key,
                    Some(evidence),
                    error.to_string(),
                )
            }
        };

        debug!(
            "Answer {} -> {} ({} confirmed of {} log entries)",
            record.answer_id, record.classification, record.confirmed_entries, record.total_entries
        );
        if !record.double_confirmed.is_empty() {
            warn!(
                "Answer {} has more than one confirmed reward for: {:?}",
                record.answer_id, record.double_confirmed
            );
        }
        Ok(record)
    }

    async fn read_chain_state(&self, answer_id: &str) -> ChainState {
        let retry = &self.config.retry;

        let key = match retry
            .run("derive_on_chain_key", || {
                self.chain.derive_on_chain_key(answer_id)
            })
            .await
        {
            Ok(key) => key,
            Err(error) => return ChainState::Failed { key: None, error },
        };

        match retry
            .run("is_rewarded", || self.chain.is_rewarded(&key))
            .await
        {
            Ok(rewarded) => ChainState::Known { key, rewarded },
            Err(error) => ChainState::Failed {
                key: Some(key),
                error,
            },
        }
    }
}

enum ChainState {
    Known { key: OnChainKey, rewarded: bool },
    Failed { key: Option<OnChainKey>, error: ChainError },
}
