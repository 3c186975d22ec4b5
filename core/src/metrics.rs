//! Metrics aggregation: one row per customer present in the ledger.
//!
//! This stage:
//!   1. Groups ledger rows by customer_id in an ordered map
//!   2. Folds each group into recency, frequency, spend and returns
//!   3. Left-joins the roster segment (unmatched customers keep `None`)
//!
//! Output is ordered by customer_id and never changes for a given
//! (snapshot, reference instant) pair.

use crate::{
    error::{RetentionError, RetentionResult},
    ledger::{RosterEntry, Transaction},
    types::{CustomerId, ReferenceInstant},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerMetric {
    pub customer_id:         CustomerId,
    pub days_since_purchase: u64,
    pub purchase_count:      u32,
    pub total_spend:         f64,
    pub avg_purchase:        f64,
    pub total_returns:       u32,
    pub segment:             Option<String>,
}

impl CustomerMetric {
    /// Returned units per purchase. `purchase_count` is never zero.
    pub fn return_ratio(&self) -> f64 {
        self.total_returns as f64 / self.purchase_count as f64
    }
}

// ── Aggregator ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct CustomerAccumulator {
    last_purchase:  Option<DateTime<Utc>>,
    purchase_count: u32,
    total_spend:    f64,
    total_returns:  u32,
}

impl CustomerAccumulator {
    fn add(&mut self, txn: &Transaction) {
        self.last_purchase = Some(match self.last_purchase {
            Some(prev) => prev.max(txn.transaction_date),
            None => txn.transaction_date,
        });
        self.purchase_count += 1;
        self.total_spend += txn.amount;
        self.total_returns += txn.returns;
    }
}

pub struct MetricsAggregator {
    reference: ReferenceInstant,
}

impl MetricsAggregator {
    pub fn new(reference: ReferenceInstant) -> Self {
        Self { reference }
    }

    pub fn aggregate(
        &self,
        ledger: &[Transaction],
        roster: &[RosterEntry],
    ) -> RetentionResult<Vec<CustomerMetric>> {
        if ledger.is_empty() {
            return Err(RetentionError::EmptyInput);
        }

        let mut groups: BTreeMap<&str, CustomerAccumulator> = BTreeMap::new();
        for txn in ledger {
            if !(txn.amount.is_finite() && txn.amount >= 0.0) {
                return Err(RetentionError::InvalidDataset {
                    reason: format!(
                        "transaction for {} on {} has amount {}",
                        txn.customer_id, txn.transaction_date, txn.amount,
                    ),
                });
            }
            groups.entry(txn.customer_id.as_str()).or_default().add(txn);
        }

        let segments = index_roster(roster);

        let metrics: Vec<CustomerMetric> = groups
            .into_iter()
            .filter_map(|(customer_id, acc)| {
                let last_purchase = acc.last_purchase?;
                Some(CustomerMetric {
                    customer_id:         customer_id.to_string(),
                    days_since_purchase: self.days_since(customer_id, last_purchase),
                    purchase_count:      acc.purchase_count,
                    total_spend:         acc.total_spend,
                    avg_purchase:        acc.total_spend / acc.purchase_count as f64,
                    total_returns:       acc.total_returns,
                    segment:             segments.get(customer_id).map(|s| s.to_string()),
                })
            })
            .collect();

        let unmatched = metrics.iter().filter(|m| m.segment.is_none()).count();
        log::debug!(
            "metrics: {} ledger rows → {} customers ({} without roster segment)",
            ledger.len(),
            metrics.len(),
            unmatched,
        );

        Ok(metrics)
    }

    /// Whole days between the last purchase and the reference instant.
    /// Purchases dated after the reference count as zero days.
    fn days_since(&self, customer_id: &str, last_purchase: DateTime<Utc>) -> u64 {
        let days = (self.reference - last_purchase).num_days();
        if days < 0 {
            log::warn!(
                "metrics: {customer_id} last purchase {last_purchase} is after reference {}",
                self.reference,
            );
        }
        days.max(0) as u64
    }
}

/// First roster row wins for each customer.
fn index_roster(roster: &[RosterEntry]) -> BTreeMap<&str, &str> {
    use std::collections::btree_map::Entry;

    let mut segments = BTreeMap::new();
    for entry in roster {
        match segments.entry(entry.customer_id.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(entry.segment.as_str());
            }
            Entry::Occupied(_) => {
                log::debug!("metrics: duplicate roster row for {} ignored", entry.customer_id);
            }
        }
    }
    segments
}
