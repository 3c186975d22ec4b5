use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{RetentionError, RetentionResult};

// ── Risk rules ─────────────────────────────────────────────────────

/// One risk-factor rule. Thresholds are strict: a customer matches
/// only when the metric is *greater* (or, for frequency, *less*) than
/// the configured bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RiskRule {
    Inactivity {
        days_threshold: u64,
    },
    HighReturns {
        return_ratio_threshold: f64,
    },
    DecliningFrequency {
        /// Fraction of the population's mean purchase count.
        mean_fraction: f64,
        days_threshold: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRuleConfig {
    pub name: String,
    #[serde(flatten)]
    pub rule: RiskRule,
}

// ── Segment rules ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "High Priority")]
    HighPriority,
    #[serde(rename = "Medium Priority")]
    MediumPriority,
}

/// Population filter behind a segment recommendation.
/// Spend bounds are quantile levels in [0, 1], resolved against the
/// full population's `total_spend` once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SegmentRule {
    /// `total_spend > Q(spend_quantile) AND days > days_threshold`
    HighValue {
        spend_quantile: f64,
        days_threshold: u64,
    },
    /// `Q(lower) <= total_spend <= Q(upper) AND days > days_threshold`
    MediumValue {
        lower_quantile: f64,
        upper_quantile: f64,
        days_threshold: u64,
    },
    /// `purchase_count < max_purchase_count AND days > days_threshold`
    NewCustomer {
        max_purchase_count: u32,
        days_threshold: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRuleConfig {
    pub segment_label: String,
    pub risk_level: RiskLevel,
    pub action: String,
    pub cost_per_customer: f64,
    /// Percent of revenue at risk expected to be kept, 0–100.
    pub expected_retention_pct: f64,
    #[serde(flatten)]
    pub rule: SegmentRule,
}

#[derive(Debug, Clone, Deserialize)]
struct RulesFile {
    risk_rules: Vec<RiskRuleConfig>,
    segment_rules: Vec<SegmentRuleConfig>,
}

// ── Synthetic dataset profile ──────────────────────────────────────

/// Where a customer's registration date is drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "anchor", rename_all = "snake_case")]
pub enum RegistrationWindow {
    /// `end_date - U[min_days, max_days]`
    BeforeEnd { min_days: u32, max_days: u32 },
    /// `start_date - U[min_days, max_days]`
    BeforeStart { min_days: u32, max_days: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSegmentProfile {
    pub id: String,
    pub population_share: f64,
    pub min_purchases: u32,
    pub max_purchases: u32,
    pub registration: RegistrationWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCategoryProfile {
    pub id: String,
    pub avg_price: f64,
    pub return_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub num_customers: usize,
    /// Std-dev of the multiplicative price noise around `avg_price`.
    pub price_variation_std: f64,
    pub segments: Vec<CustomerSegmentProfile>,
    pub categories: Vec<ProductCategoryProfile>,
}

// ── Root config ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RetentionConfig {
    pub risk_rules: Vec<RiskRuleConfig>,
    pub segment_rules: Vec<SegmentRuleConfig>,
    pub dataset: DatasetProfile,
}

impl RetentionConfig {
    /// Load from the data/ directory.
    /// In tests, use RetentionConfig::default().
    pub fn load(data_dir: &str) -> RetentionResult<Self> {
        let rules_path = format!("{data_dir}/rules/retention_rules.json");
        let rules_content = std::fs::read_to_string(&rules_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {rules_path}: {e}"))?;
        let rules: RulesFile = serde_json::from_str(&rules_content)?;

        let profile_path = format!("{data_dir}/generator/dataset_profile.json");
        let profile_content = std::fs::read_to_string(&profile_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {profile_path}: {e}"))?;
        let dataset: DatasetProfile = serde_json::from_str(&profile_content)?;

        let config = Self {
            risk_rules: rules.risk_rules,
            segment_rules: rules.segment_rules,
            dataset,
        };
        config.validate()?;
        log::debug!(
            "Loaded {} risk rules and {} segment rules from {data_dir}",
            config.risk_rules.len(),
            config.segment_rules.len(),
        );
        Ok(config)
    }

    pub fn validate(&self) -> RetentionResult<()> {
        for (i, r) in self.risk_rules.iter().enumerate() {
            let duplicate = self.risk_rules[..i]
                .iter()
                .any(|prev| std::mem::discriminant(&prev.rule) == std::mem::discriminant(&r.rule));
            if duplicate {
                return Err(invalid(format!("duplicate risk rule '{}'", r.name)));
            }
            match r.rule {
                RiskRule::HighReturns { return_ratio_threshold } if return_ratio_threshold < 0.0 => {
                    return Err(invalid(format!("'{}': negative return ratio threshold", r.name)));
                }
                RiskRule::DecliningFrequency { mean_fraction, .. } if mean_fraction < 0.0 => {
                    return Err(invalid(format!("'{}': negative mean fraction", r.name)));
                }
                _ => {}
            }
        }

        for (i, s) in self.segment_rules.iter().enumerate() {
            let duplicate = self.segment_rules[..i]
                .iter()
                .any(|prev| std::mem::discriminant(&prev.rule) == std::mem::discriminant(&s.rule));
            if duplicate {
                return Err(invalid(format!("duplicate segment rule '{}'", s.segment_label)));
            }
            if !(0.0..=100.0).contains(&s.expected_retention_pct) {
                return Err(invalid(format!(
                    "'{}': expected_retention_pct {} outside 0–100",
                    s.segment_label, s.expected_retention_pct
                )));
            }
            if s.cost_per_customer < 0.0 {
                return Err(invalid(format!("'{}': negative cost per customer", s.segment_label)));
            }
            let quantiles = match s.rule {
                SegmentRule::HighValue { spend_quantile, .. } => vec![spend_quantile],
                SegmentRule::MediumValue { lower_quantile, upper_quantile, .. } => {
                    if lower_quantile > upper_quantile {
                        return Err(invalid(format!(
                            "'{}': lower quantile above upper quantile",
                            s.segment_label
                        )));
                    }
                    vec![lower_quantile, upper_quantile]
                }
                SegmentRule::NewCustomer { .. } => Vec::new(),
            };
            if quantiles.iter().any(|q| !(0.0..=1.0).contains(q)) {
                return Err(invalid(format!("'{}': quantile outside [0, 1]", s.segment_label)));
            }
        }

        self.dataset.validate()
    }
}

impl DatasetProfile {
    pub fn validate(&self) -> RetentionResult<()> {
        if self.end_date < self.start_date {
            return Err(invalid("dataset end_date precedes start_date".into()));
        }
        if self.segments.is_empty() || self.categories.is_empty() {
            return Err(invalid("dataset profile needs at least one segment and one category".into()));
        }
        let share_total: f64 = self.segments.iter().map(|s| s.population_share).sum();
        if self.segments.iter().any(|s| s.population_share < 0.0) || share_total <= 0.0 {
            return Err(invalid("segment population shares must be non-negative with a positive total".into()));
        }
        for seg in &self.segments {
            if seg.min_purchases == 0 || seg.min_purchases > seg.max_purchases {
                return Err(invalid(format!(
                    "segment '{}': purchase range {}..={} is invalid",
                    seg.id, seg.min_purchases, seg.max_purchases
                )));
            }
            let (lo, hi) = match seg.registration {
                RegistrationWindow::BeforeEnd { min_days, max_days }
                | RegistrationWindow::BeforeStart { min_days, max_days } => (min_days, max_days),
            };
            if lo > hi {
                return Err(invalid(format!("segment '{}': registration window inverted", seg.id)));
            }
        }
        for cat in &self.categories {
            if cat.avg_price < 0.0 || !(0.0..=1.0).contains(&cat.return_probability) {
                return Err(invalid(format!("category '{}': bad price or return probability", cat.id)));
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> RetentionError {
    RetentionError::InvalidConfig { reason }
}

impl Default for RetentionConfig {
    /// Built-in rule table. Mirrors data/rules/retention_rules.json.
    fn default() -> Self {
        Self {
            risk_rules: vec![
                RiskRuleConfig {
                    name: "Customer Inactivity (60+ days)".into(),
                    rule: RiskRule::Inactivity { days_threshold: 60 },
                },
                RiskRuleConfig {
                    name: "High Return Rate (>30%)".into(),
                    rule: RiskRule::HighReturns { return_ratio_threshold: 0.3 },
                },
                RiskRuleConfig {
                    name: "Declining Purchase Frequency".into(),
                    rule: RiskRule::DecliningFrequency {
                        mean_fraction: 0.5,
                        days_threshold: 30,
                    },
                },
            ],
            segment_rules: vec![
                SegmentRuleConfig {
                    segment_label: "High-Value Customers".into(),
                    risk_level: RiskLevel::HighPriority,
                    action: "Immediate VIP outreach program".into(),
                    cost_per_customer: 50.0,
                    expected_retention_pct: 70.0,
                    rule: SegmentRule::HighValue {
                        spend_quantile: 0.75,
                        days_threshold: 30,
                    },
                },
                SegmentRuleConfig {
                    segment_label: "Medium-Value Customers".into(),
                    risk_level: RiskLevel::MediumPriority,
                    action: "Personalized email campaign with offers".into(),
                    cost_per_customer: 20.0,
                    expected_retention_pct: 50.0,
                    rule: SegmentRule::MediumValue {
                        lower_quantile: 0.40,
                        upper_quantile: 0.75,
                        days_threshold: 45,
                    },
                },
                SegmentRuleConfig {
                    segment_label: "New Customers".into(),
                    risk_level: RiskLevel::HighPriority,
                    action: "Welcome back promotion with discount".into(),
                    cost_per_customer: 30.0,
                    expected_retention_pct: 60.0,
                    rule: SegmentRule::NewCustomer {
                        max_purchase_count: 3,
                        days_threshold: 30,
                    },
                },
            ],
            dataset: DatasetProfile::default(),
        }
    }
}

impl Default for DatasetProfile {
    /// Mirrors data/generator/dataset_profile.json.
    fn default() -> Self {
        let before_start = RegistrationWindow::BeforeStart { min_days: 0, max_days: 365 };
        Self {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2023, 12, 31).expect("valid date"),
            num_customers: 1000,
            price_variation_std: 0.1,
            segments: vec![
                CustomerSegmentProfile {
                    id: "new_customer".into(),
                    population_share: 0.20,
                    min_purchases: 1,
                    max_purchases: 5,
                    registration: RegistrationWindow::BeforeEnd { min_days: 30, max_days: 90 },
                },
                CustomerSegmentProfile {
                    id: "loyal".into(),
                    population_share: 0.35,
                    min_purchases: 15,
                    max_purchases: 30,
                    registration: before_start.clone(),
                },
                CustomerSegmentProfile {
                    id: "at_risk".into(),
                    population_share: 0.25,
                    min_purchases: 3,
                    max_purchases: 10,
                    registration: before_start.clone(),
                },
                CustomerSegmentProfile {
                    id: "price_sensitive".into(),
                    population_share: 0.20,
                    min_purchases: 5,
                    max_purchases: 15,
                    registration: before_start,
                },
            ],
            categories: vec![
                category("electronics", 500.0, 0.15),
                category("clothing", 100.0, 0.20),
                category("home_goods", 200.0, 0.10),
                category("accessories", 50.0, 0.05),
                category("beauty", 75.0, 0.08),
            ],
        }
    }
}

fn category(id: &str, avg_price: f64, return_probability: f64) -> ProductCategoryProfile {
    ProductCategoryProfile {
        id: id.into(),
        avg_price,
        return_probability,
    }
}
