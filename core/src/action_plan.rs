//! Action plan — savings and ROI for each recommendation, best ROI first.
//!
//! A recommendation whose cost is zero has no defined ROI. It is moved
//! to `ActionPlan::skipped` and every other entry is priced normally.

use crate::{
    error::{RetentionError, RetentionResult},
    recommendations::Recommendation,
    stats::round_to,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlanEntry {
    #[serde(flatten)]
    pub recommendation:    Recommendation,
    pub potential_savings: f64,
    /// Percent, 1 decimal.
    pub roi:               f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedAction {
    pub segment_label: String,
    pub reason:        String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    /// Sorted by `roi` descending; ties keep rule order.
    pub entries: Vec<ActionPlanEntry>,
    pub skipped: Vec<SkippedAction>,
}

impl ActionPlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Attach savings and ROI to a single recommendation.
pub fn price_recommendation(rec: &Recommendation) -> RetentionResult<ActionPlanEntry> {
    if rec.estimated_cost == 0.0 {
        return Err(RetentionError::DivisionByZero {
            segment: rec.segment_label.clone(),
        });
    }

    let potential_savings = rec.total_revenue_at_risk * rec.expected_retention_pct / 100.0;
    let roi = round_to(
        (potential_savings - rec.estimated_cost) / rec.estimated_cost * 100.0,
        1,
    );

    Ok(ActionPlanEntry {
        recommendation: rec.clone(),
        potential_savings,
        roi,
    })
}

pub fn build_action_plan(recommendations: &[Recommendation]) -> ActionPlan {
    let mut plan = ActionPlan::default();

    for rec in recommendations {
        match price_recommendation(rec) {
            Ok(entry) => plan.entries.push(entry),
            Err(e) => {
                log::warn!("action plan: skipping '{}': {e}", rec.segment_label);
                plan.skipped.push(SkippedAction {
                    segment_label: rec.segment_label.clone(),
                    reason:        e.to_string(),
                });
            }
        }
    }

    // sort_by is stable: equal ROIs stay in rule order.
    plan.entries.sort_by(|a, b| b.roi.total_cmp(&a.roi));

    log::debug!(
        "action plan: {} entries, {} skipped",
        plan.entries.len(),
        plan.skipped.len(),
    );
    plan
}
