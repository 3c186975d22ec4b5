//! Summary rollup over risk factors and the priced action plan.
//!
//! `total_customers_at_risk` adds factor counts as-is: a customer who
//! trips two rules is counted twice. Top-level ROI is recomputed from
//! the summed savings and cost, never averaged from entry ROIs.

use crate::{
    action_plan::{ActionPlan, ActionPlanEntry},
    risk_factors::RiskFactor,
    stats::round_to,
};
use serde::{Deserialize, Serialize};

pub const TOP_ACTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_customers_at_risk: usize,
    pub total_revenue_at_risk:   f64,
    pub intervention_cost:       f64,
    pub potential_savings:       f64,
    /// `None` when the plan has no cost to divide by.
    pub roi:                     Option<f64>,
    pub top_3_actions:           Vec<ActionPlanEntry>,
}

pub fn summarize(risk_factors: &[RiskFactor], plan: &ActionPlan) -> Summary {
    let total_customers_at_risk = risk_factors.iter().map(|f| f.count).sum();

    let (revenue, cost, savings) = plan.entries.iter().fold(
        (0.0, 0.0, 0.0),
        |(revenue, cost, savings), e| {
            (
                revenue + e.recommendation.total_revenue_at_risk,
                cost + e.recommendation.estimated_cost,
                savings + e.potential_savings,
            )
        },
    );

    let roi = (cost != 0.0).then(|| round_to((savings - cost) / cost * 100.0, 1));

    Summary {
        total_customers_at_risk,
        total_revenue_at_risk: round_to(revenue, 2),
        intervention_cost: round_to(cost, 2),
        potential_savings: round_to(savings, 2),
        roi,
        top_3_actions: plan.entries.iter().take(TOP_ACTIONS).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        action_plan::build_action_plan,
        config::RiskLevel,
        recommendations::Recommendation,
    };

    fn factor(count: usize) -> RiskFactor {
        RiskFactor {
            name: format!("rule-{count}"),
            count,
            percentage: 0.0,
            avg_spend: None,
        }
    }

    fn rec(label: &str, revenue: f64, cost: f64, retention: f64) -> Recommendation {
        Recommendation {
            segment_label: label.into(),
            risk_level: RiskLevel::MediumPriority,
            customer_count: 1,
            total_revenue_at_risk: revenue,
            action: "email".into(),
            estimated_cost: cost,
            expected_retention_pct: retention,
        }
    }

    #[test]
    fn roi_comes_from_totals_not_entry_average() {
        // entry ROIs: (350-50)/50 = 600%, (10-20)/20 = -50%; mean 275%
        // totals: savings 360, cost 70 → 414.3%
        let plan = build_action_plan(&[rec("a", 500.0, 50.0, 70.0), rec("b", 20.0, 20.0, 50.0)]);
        let summary = summarize(&[factor(4), factor(2)], &plan);

        assert_eq!(summary.total_customers_at_risk, 6);
        assert_eq!(summary.total_revenue_at_risk, 520.0);
        assert_eq!(summary.intervention_cost, 70.0);
        assert_eq!(summary.potential_savings, 360.0);
        assert_eq!(summary.roi, Some(414.3));
    }

    #[test]
    fn empty_plan_has_undefined_roi() {
        let summary = summarize(&[factor(0), factor(0), factor(0)], &ActionPlan::default());
        assert_eq!(summary.total_customers_at_risk, 0);
        assert_eq!(summary.intervention_cost, 0.0);
        assert_eq!(summary.roi, None);
        assert!(summary.top_3_actions.is_empty());
    }

    #[test]
    fn top_actions_follow_plan_order() {
        let plan = build_action_plan(&[
            rec("low", 10.0, 20.0, 50.0),
            rec("high", 500.0, 50.0, 70.0),
        ]);
        let summary = summarize(&[], &plan);
        assert_eq!(summary.top_3_actions.len(), 2);
        assert_eq!(summary.top_3_actions[0].recommendation.segment_label, "high");
    }
}
