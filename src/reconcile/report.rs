//! Audit report: per-answer records plus a summary, rendered for operators.

use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use serde::Serialize;

use super::record::{Classification, ReconciliationRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub total: usize,
    pub consistent_paid: usize,
    pub consistent_unpaid: usize,
    pub chain_ahead_of_ledger: usize,
    pub ledger_ahead_of_chain: usize,
    pub indeterminate: usize,
    /// Answers with more than one confirmed entry for the same reward type
    pub double_confirmed: usize,
}

impl AuditSummary {
    pub fn from_records(records: &[ReconciliationRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Default::default()
        };
        for record in records {
            match record.classification {
                Classification::ConsistentPaid => summary.consistent_paid += 1,
                Classification::ConsistentUnpaid => summary.consistent_unpaid += 1,
                Classification::AnomalyChainAheadOfLedger => summary.chain_ahead_of_ledger += 1,
                Classification::AnomalyLedgerAheadOfChain => summary.ledger_ahead_of_chain += 1,
                Classification::Indeterminate => summary.indeterminate += 1,
            }
            if !record.double_confirmed.is_empty() {
                summary.double_confirmed += 1;
            }
        }
        summary
    }

    pub fn consistent(&self) -> usize {
        self.consistent_paid + self.consistent_unpaid
    }

    pub fn anomalies(&self) -> usize {
        self.chain_ahead_of_ledger + self.ledger_ahead_of_chain
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: AuditSummary,
    pub records: Vec<ReconciliationRecord>,
}

impl AuditReport {
    pub fn new(
        records: Vec<ReconciliationRecord>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            started_at,
            finished_at,
            summary: AuditSummary::from_records(&records),
            records,
        }
    }

    /// Every answer reached a consistent classification and no reward type
    /// was confirmed twice.
    pub fn is_clean(&self) -> bool {
        self.records.iter().all(|r| !r.needs_attention())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_table(&self) -> String {
        let mut out = records_table(&self.records).to_string();
        out.push('\n');
        out.push_str(&self.render_summary());
        out
    }

    pub fn render_summary(&self) -> String {
        let s = &self.summary;
        let verdict = if self.is_clean() {
            "CLEAN".green().bold()
        } else {
            "ATTENTION REQUIRED".red().bold()
        };
        format!(
            "{} answers: {} paid, {} unpaid, {} chain ahead of ledger, {} ledger ahead of chain, {} indeterminate, {} double-confirmed -> {}",
            s.total,
            s.consistent_paid,
            s.consistent_unpaid,
            s.chain_ahead_of_ledger,
            s.ledger_ahead_of_chain,
            s.indeterminate,
            s.double_confirmed,
            verdict
        )
    }
}

fn classification_color(classification: Classification) -> Color {
    match classification {
        Classification::ConsistentPaid | Classification::ConsistentUnpaid => Color::Green,
        Classification::AnomalyChainAheadOfLedger | Classification::AnomalyLedgerAheadOfChain => {
            Color::Red
        }
        Classification::Indeterminate => Color::Yellow,
    }
}

pub fn records_table(records: &[ReconciliationRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec![
            "Answer",
            "Classification",
            "On-chain",
            "Confirmed",
            "Entries",
            "Notes",
        ]);

    for record in records {
        let on_chain = match record.on_chain_rewarded {
            Some(true) => "rewarded",
            Some(false) => "not rewarded",
            None => "unknown",
        };

        let mut notes = Vec::new();
        if !record.double_confirmed.is_empty() {
            let types: Vec<&str> = record.double_confirmed.iter().map(|t| t.as_str()).collect();
            notes.push(format!("double-confirmed: {}", types.join(", ")));
        }
        if let Some(error) = &record.error {
            notes.push(error.clone());
        }

        table.add_row(vec![
            Cell::new(&record.answer_id),
            Cell::new(record.classification).fg(classification_color(record.classification)),
            Cell::new(on_chain),
            Cell::new(record.confirmed_entries),
            Cell::new(record.total_entries),
            Cell::new(notes.join("; ")),
        ]);
    }

    table
}
