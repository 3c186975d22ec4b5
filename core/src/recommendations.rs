//! Segment recommendations — targeted interventions for at-risk cohorts.
//!
//! Each segment rule emits one `Recommendation` when at least one
//! customer matches and nothing otherwise. Spend quantiles are resolved
//! once per run against the whole population, so rule order never
//! changes the result. Segments may overlap.

use crate::{
    config::{RiskLevel, SegmentRule, SegmentRuleConfig},
    metrics::CustomerMetric,
    stats::{round_to, SortedSample},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub segment_label:          String,
    pub risk_level:             RiskLevel,
    pub customer_count:         usize,
    pub total_revenue_at_risk:  f64,
    pub action:                 String,
    pub estimated_cost:         f64,
    pub expected_retention_pct: f64,
}

/// A segment rule with its quantile levels replaced by spend values.
#[derive(Debug, Clone, Copy)]
enum ResolvedRule {
    HighValue { spend_floor: f64, days_threshold: u64 },
    MediumValue { spend_low: f64, spend_high: f64, days_threshold: u64 },
    NewCustomer { max_purchase_count: u32, days_threshold: u64 },
}

impl ResolvedRule {
    fn resolve(rule: &SegmentRule, spend: &SortedSample) -> Option<Self> {
        Some(match *rule {
            SegmentRule::HighValue { spend_quantile, days_threshold } => ResolvedRule::HighValue {
                spend_floor: spend.quantile(spend_quantile)?,
                days_threshold,
            },
            SegmentRule::MediumValue { lower_quantile, upper_quantile, days_threshold } => {
                ResolvedRule::MediumValue {
                    spend_low: spend.quantile(lower_quantile)?,
                    spend_high: spend.quantile(upper_quantile)?,
                    days_threshold,
                }
            }
            SegmentRule::NewCustomer { max_purchase_count, days_threshold } => {
                ResolvedRule::NewCustomer { max_purchase_count, days_threshold }
            }
        })
    }

    fn matches(&self, m: &CustomerMetric) -> bool {
        match *self {
            ResolvedRule::HighValue { spend_floor, days_threshold } => {
                m.total_spend > spend_floor && m.days_since_purchase > days_threshold
            }
            ResolvedRule::MediumValue { spend_low, spend_high, days_threshold } => {
                (spend_low..=spend_high).contains(&m.total_spend)
                    && m.days_since_purchase > days_threshold
            }
            ResolvedRule::NewCustomer { max_purchase_count, days_threshold } => {
                m.purchase_count < max_purchase_count && m.days_since_purchase > days_threshold
            }
        }
    }
}

pub struct SegmentRecommendationEngine {
    rules: Vec<SegmentRuleConfig>,
}

impl SegmentRecommendationEngine {
    pub fn new(rules: Vec<SegmentRuleConfig>) -> Self {
        Self { rules }
    }

    /// Recommendations in rule-table order, skipping rules with no match.
    pub fn recommend(&self, metrics: &[CustomerMetric]) -> Vec<Recommendation> {
        let spend = SortedSample::new(metrics.iter().map(|m| m.total_spend).collect());
        let mut out = Vec::new();

        for cfg in &self.rules {
            let Some(rule) = ResolvedRule::resolve(&cfg.rule, &spend) else {
                continue;
            };

            let (customer_count, revenue) = metrics
                .iter()
                .filter(|m| rule.matches(m))
                .fold((0usize, 0.0), |(n, sum), m| (n + 1, sum + m.total_spend));

            if customer_count == 0 {
                log::debug!("recommend: '{}' matched no customers, skipped", cfg.segment_label);
                continue;
            }

            log::debug!(
                "recommend: '{}' targets {customer_count} customers ({:?})",
                cfg.segment_label,
                rule,
            );

            out.push(Recommendation {
                segment_label:          cfg.segment_label.clone(),
                risk_level:             cfg.risk_level,
                customer_count,
                total_revenue_at_risk:  round_to(revenue, 2),
                action:                 cfg.action.clone(),
                estimated_cost:         customer_count as f64 * cfg.cost_per_customer,
                expected_retention_pct: cfg.expected_retention_pct,
            });
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetentionConfig;

    fn metric(id: &str, days: u64, count: u32, spend: f64) -> CustomerMetric {
        CustomerMetric {
            customer_id: id.into(),
            days_since_purchase: days,
            purchase_count: count,
            total_spend: spend,
            avg_purchase: spend / count as f64,
            total_returns: 0,
            segment: None,
        }
    }

    fn engine() -> SegmentRecommendationEngine {
        SegmentRecommendationEngine::new(RetentionConfig::default().segment_rules)
    }

    #[test]
    fn medium_band_is_inclusive_on_both_ends() {
        // spends 10,20,30,40,50 → Q40 = 26, Q75 = 40
        let metrics = vec![
            metric("a", 50, 5, 10.0),
            metric("b", 50, 5, 20.0),
            metric("c", 50, 5, 30.0),
            metric("d", 50, 5, 40.0),
            metric("e", 50, 5, 50.0),
        ];
        let recs = engine().recommend(&metrics);
        let medium = recs
            .iter()
            .find(|r| r.segment_label == "Medium-Value Customers")
            .unwrap();
        assert_eq!(medium.customer_count, 2);
        assert_eq!(medium.total_revenue_at_risk, 70.0);
        assert_eq!(medium.estimated_cost, 40.0);
        assert_eq!(medium.risk_level, RiskLevel::MediumPriority);
    }

    #[test]
    fn segments_may_overlap() {
        // "e" is both high value (50 > Q75 = 40) and a new customer (1 purchase).
        let metrics = vec![
            metric("a", 5, 5, 10.0),
            metric("b", 5, 5, 20.0),
            metric("c", 5, 5, 30.0),
            metric("d", 5, 5, 40.0),
            metric("e", 90, 1, 50.0),
        ];
        let recs = engine().recommend(&metrics);
        let labels: Vec<&str> = recs.iter().map(|r| r.segment_label.as_str()).collect();
        assert_eq!(labels, vec!["High-Value Customers", "New Customers"]);
        assert!(recs.iter().all(|r| r.customer_count == 1));
    }

    #[test]
    fn no_match_emits_nothing() {
        let metrics = vec![metric("a", 1, 10, 10.0), metric("b", 2, 10, 20.0)];
        assert!(engine().recommend(&metrics).is_empty());
    }

    #[test]
    fn empty_population_emits_nothing() {
        assert!(engine().recommend(&[]).is_empty());
    }
}
