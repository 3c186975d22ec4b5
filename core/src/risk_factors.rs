//! Risk factor detection — three independent churn-risk rules.
//!
//! Every configured rule yields exactly one `RiskFactor`, including
//! rules nobody matches. A zero-count factor reports `avg_spend: None`
//! so it never drags an aggregate average toward zero.

use crate::{
    config::{RiskRule, RiskRuleConfig},
    metrics::CustomerMetric,
    stats::{mean, round_to},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name:       String,
    pub count:      usize,
    /// Share of all customers, percent, 1 decimal.
    pub percentage: f64,
    /// Mean `total_spend` of matching customers, 2 decimals.
    /// `None` when `count == 0`.
    pub avg_spend:  Option<f64>,
}

/// Population-wide figures a rule may compare against.
#[derive(Debug, Clone, Copy)]
struct PopulationStats {
    mean_purchase_count: f64,
}

impl PopulationStats {
    fn of(metrics: &[CustomerMetric]) -> Self {
        Self {
            mean_purchase_count: mean(metrics.iter().map(|m| m.purchase_count as f64))
                .unwrap_or(0.0),
        }
    }
}

impl RiskRule {
    fn matches(&self, m: &CustomerMetric, population: &PopulationStats) -> bool {
        match *self {
            RiskRule::Inactivity { days_threshold } => m.days_since_purchase > days_threshold,
            RiskRule::HighReturns { return_ratio_threshold } => {
                m.return_ratio() > return_ratio_threshold
            }
            RiskRule::DecliningFrequency { mean_fraction, days_threshold } => {
                (m.purchase_count as f64) < population.mean_purchase_count * mean_fraction
                    && m.days_since_purchase > days_threshold
            }
        }
    }
}

pub struct RiskFactorDetector {
    rules: Vec<RiskRuleConfig>,
}

impl RiskFactorDetector {
    pub fn new(rules: Vec<RiskRuleConfig>) -> Self {
        Self { rules }
    }

    /// One factor per rule, in rule-table order.
    pub fn detect(&self, metrics: &[CustomerMetric]) -> Vec<RiskFactor> {
        let population = PopulationStats::of(metrics);
        let total = metrics.len();

        let factors: Vec<RiskFactor> = self
            .rules
            .iter()
            .map(|cfg| {
                let matching: Vec<&CustomerMetric> = metrics
                    .iter()
                    .filter(|m| cfg.rule.matches(m, &population))
                    .collect();
                let count = matching.len();
                let percentage = if total == 0 {
                    0.0
                } else {
                    round_to(count as f64 / total as f64 * 100.0, 1)
                };
                let avg_spend = mean(matching.iter().map(|m| m.total_spend))
                    .map(|avg| round_to(avg, 2));

                log::debug!("risk: '{}' matched {count}/{total}", cfg.name);

                RiskFactor {
                    name: cfg.name.clone(),
                    count,
                    percentage,
                    avg_spend,
                }
            })
            .collect();

        factors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetentionConfig;

    fn metric(id: &str, days: u64, count: u32, spend: f64, returns: u32) -> CustomerMetric {
        CustomerMetric {
            customer_id: id.into(),
            days_since_purchase: days,
            purchase_count: count,
            total_spend: spend,
            avg_purchase: spend / count as f64,
            total_returns: returns,
            segment: None,
        }
    }

    fn detector() -> RiskFactorDetector {
        RiskFactorDetector::new(RetentionConfig::default().risk_rules)
    }

    #[test]
    fn thresholds_are_strict() {
        // Exactly 60 days and exactly 30% returns are not at risk.
        let metrics = vec![metric("a", 60, 10, 100.0, 3), metric("b", 61, 10, 300.0, 4)];
        let factors = detector().detect(&metrics);

        assert_eq!(factors[0].count, 1);
        assert_eq!(factors[0].avg_spend, Some(300.0));
        assert_eq!(factors[1].count, 1);
        assert_eq!(factors[1].percentage, 50.0);
    }

    #[test]
    fn declining_frequency_uses_population_mean() {
        // mean purchase_count = (1 + 9 + 20) / 3 = 10 → bound 5
        let metrics = vec![
            metric("a", 31, 1, 50.0, 0),
            metric("b", 31, 9, 90.0, 0),
            metric("c", 10, 20, 200.0, 0),
        ];
        let factors = detector().detect(&metrics);
        assert_eq!(factors[2].name, "Declining Purchase Frequency");
        assert_eq!(factors[2].count, 1);
        assert_eq!(factors[2].avg_spend, Some(50.0));
    }

    #[test]
    fn zero_count_factor_has_undefined_average() {
        let metrics = vec![metric("a", 5, 10, 100.0, 0)];
        let factors = detector().detect(&metrics);

        assert_eq!(factors.len(), 3);
        for f in &factors {
            assert_eq!(f.count, 0);
            assert_eq!(f.percentage, 0.0);
            assert_eq!(f.avg_spend, None);
        }
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        let metrics = vec![
            metric("a", 90, 5, 10.0, 0),
            metric("b", 1, 5, 10.0, 0),
            metric("c", 1, 5, 10.0, 0),
        ];
        let factors = detector().detect(&metrics);
        assert_eq!(factors[0].percentage, 33.3);
    }
}
