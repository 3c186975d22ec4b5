//! The retention pipeline — raw tables in, action plan out.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Metrics aggregation
//!   2. Risk factor detection  ┐ run in parallel over the same
//!   3. Segment recommendation ┘ immutable metric slice
//!   4. Action plan pricing    (recommendations only)
//!   5. Summary rollup         (risk factors + action plan only)
//!
//! RULES:
//!   - Every stage owns its output; no stage edits another's.
//!   - The reference instant is always passed in, never read from a clock.
//!   - A run carries no state into the next run.

use crate::{
    action_plan::{build_action_plan, ActionPlan},
    config::RetentionConfig,
    error::RetentionResult,
    ledger::InputTables,
    metrics::{CustomerMetric, MetricsAggregator},
    recommendations::{Recommendation, SegmentRecommendationEngine},
    risk_factors::{RiskFactor, RiskFactorDetector},
    summary::{summarize, Summary},
    types::ReferenceInstant,
};
use serde::{Deserialize, Serialize};

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub reference_instant: ReferenceInstant,
    pub customer_metrics:  Vec<CustomerMetric>,
    pub risk_factors:      Vec<RiskFactor>,
    pub recommendations:   Vec<Recommendation>,
    pub action_plan:       ActionPlan,
    pub summary:           Summary,
}

pub struct RetentionPipeline {
    risk_detector:         RiskFactorDetector,
    recommendation_engine: SegmentRecommendationEngine,
}

impl RetentionPipeline {
    /// Build a pipeline from a validated rule table.
    pub fn new(config: &RetentionConfig) -> RetentionResult<Self> {
        config.validate()?;
        Ok(Self {
            risk_detector:         RiskFactorDetector::new(config.risk_rules.clone()),
            recommendation_engine: SegmentRecommendationEngine::new(config.segment_rules.clone()),
        })
    }

    pub fn run(
        &self,
        tables: &InputTables,
        reference: ReferenceInstant,
    ) -> RetentionResult<AnalysisReport> {
        let customer_metrics =
            MetricsAggregator::new(reference).aggregate(&tables.ledger, &tables.roster)?;

        let (risk_factors, recommendations) = rayon::join(
            || self.risk_detector.detect(&customer_metrics),
            || self.recommendation_engine.recommend(&customer_metrics),
        );

        let action_plan = build_action_plan(&recommendations);
        let summary = summarize(&risk_factors, &action_plan);

        log::info!(
            "pipeline: {} customers, {} at risk (additive), {} actions, roi={}",
            customer_metrics.len(),
            summary.total_customers_at_risk,
            action_plan.entries.len(),
            summary
                .roi
                .map_or_else(|| "undefined".to_string(), |r| format!("{r:.1}%")),
        );

        Ok(AnalysisReport {
            reference_instant: reference,
            customer_metrics,
            risk_factors,
            recommendations,
            action_plan,
            summary,
        })
    }
}
