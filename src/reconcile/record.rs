use std::collections::BTreeMap;
use std::fmt;

use reward_audit_storage::{RewardLogEntry, RewardType};
use serde::Serialize;

use crate::chain::OnChainKey;

/// Reward state of one accepted answer, ledger vs. chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Classification {
    /// Paid on-chain and at least one confirmed log entry
    #[serde(rename = "Consistent-Paid")]
    ConsistentPaid,
    /// Not paid on-chain and no confirmed log entry
    #[serde(rename = "Consistent-Unpaid")]
    ConsistentUnpaid,
    /// Paid on-chain without a confirmed log entry
    #[serde(rename = "Anomaly-ChainAheadOfLedger")]
    AnomalyChainAheadOfLedger,
    /// Confirmed log entry but the chain reports unpaid
    #[serde(rename = "Anomaly-LedgerAheadOfChain")]
    AnomalyLedgerAheadOfChain,
    /// The chain could not be read for this answer
    #[serde(rename = "Indeterminate")]
    Indeterminate,
}

impl Classification {
    pub fn classify(on_chain_rewarded: bool, confirmed_entries: usize) -> Self {
        match (on_chain_rewarded, confirmed_entries > 0) {
            (true, true) => Classification::ConsistentPaid,
            (false, false) => Classification::ConsistentUnpaid,
            (true, false) => Classification::AnomalyChainAheadOfLedger,
            (false, true) => Classification::AnomalyLedgerAheadOfChain,
        }
    }

    pub fn is_consistent(self) -> bool {
        matches!(
            self,
            Classification::ConsistentPaid | Classification::ConsistentUnpaid
        )
    }

    pub fn is_anomaly(self) -> bool {
        matches!(
            self,
            Classification::AnomalyChainAheadOfLedger | Classification::AnomalyLedgerAheadOfChain
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::ConsistentPaid => "Consistent-Paid",
            Classification::ConsistentUnpaid => "Consistent-Unpaid",
            Classification::AnomalyChainAheadOfLedger => "Anomaly-ChainAheadOfLedger",
            Classification::AnomalyLedgerAheadOfChain => "Anomaly-LedgerAheadOfChain",
            Classification::Indeterminate => "Indeterminate",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the reward log says about one answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerEvidence {
    pub total_entries: usize,
    pub confirmed_entries: usize,
    /// Reward types with more than one confirmed entry
    pub double_confirmed: Vec<RewardType>,
}

impl LedgerEvidence {
    pub fn from_entries(entries: &[RewardLogEntry]) -> Self {
        let mut per_type: BTreeMap<&RewardType, usize> = BTreeMap::new();
        for entry in entries.iter().filter(|e| e.is_confirmed()) {
            *per_type.entry(&entry.reward_type).or_default() += 1;
        }

        Self {
            total_entries: entries.len(),
            confirmed_entries: per_type.values().sum(),
            double_confirmed: per_type
                .into_iter()
                .filter(|(_, count)| *count > 1)
                .map(|(reward_type, _)| reward_type.clone())
                .collect(),
        }
    }
}

/// One line of the audit report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationRecord {
    pub answer_id: String,
    pub classification: Classification,
    pub on_chain_key: Option<OnChainKey>,
    pub on_chain_rewarded: Option<bool>,
    pub confirmed_entries: usize,
    pub total_entries: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub double_confirmed: Vec<RewardType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReconciliationRecord {
    pub fn classified(
        answer_id: &str,
        key: OnChainKey,
        on_chain_rewarded: bool,
        evidence: LedgerEvidence,
    ) -> Self {
        Self {
            answer_id: answer_id.to_string(),
            classification: Classification::classify(
                on_chain_rewarded,
                evidence.confirmed_entries,
            ),
            on_chain_key: Some(key),
            on_chain_rewarded: Some(on_chain_rewarded),
            confirmed_entries: evidence.confirmed_entries,
            total_entries: evidence.total_entries,
            double_confirmed: evidence.double_confirmed,
            error: None,
        }
    }

    /// `evidence` is `None` when the ledger was never consulted (batch deadline).
    pub fn indeterminate(
        answer_id: &str,
        key: Option<OnChainKey>,
        evidence: Option<LedgerEvidence>,
        error: impl Into<String>,
    ) -> Self {
        let evidence = evidence.unwrap_or_default();
        Self {
            answer_id: answer_id.to_string(),
            classification: Classification::Indeterminate,
            on_chain_key: key,
            on_chain_rewarded: None,
            confirmed_entries: evidence.confirmed_entries,
            total_entries: evidence.total_entries,
            double_confirmed: evidence.double_confirmed,
            error: Some(error.into()),
        }
    }

    /// True when this answer needs an operator's attention.
    pub fn needs_attention(&self) -> bool {
        !self.classification.is_consistent() || !self.double_confirmed.is_empty()
    }
}
