//! Synthetic retail dataset — roster and ledger from a DatasetProfile.
//!
//! This generator:
//!   1. Assigns each customer a segment by population share
//!   2. Draws a registration date from the segment's window
//!   3. Spreads the segment's purchase count evenly from registration
//!      to the profile end date
//!   4. Prices each purchase from a random category with ±noise and
//!      flags it returned with the category's return probability
//!
//! Same profile + same seed → identical tables.

use crate::{
    config::{CustomerSegmentProfile, DatasetProfile, RegistrationWindow},
    error::{RetentionError, RetentionResult},
    ledger::{InputTables, RosterEntry, Transaction},
    rng::{RngBank, StreamRng, StreamSlot},
    stats::round_to,
    types::CustomerId,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

#[derive(Debug, Clone)]
struct GeneratedCustomer {
    customer_id:       CustomerId,
    segment:           usize,
    registration_date: NaiveDate,
}

pub struct DatasetGenerator {
    profile:  DatasetProfile,
    rng_bank: RngBank,
}

impl DatasetGenerator {
    pub fn new(profile: DatasetProfile, seed: u64) -> RetentionResult<Self> {
        profile.validate()?;
        Ok(Self {
            profile,
            rng_bank: RngBank::new(seed),
        })
    }

    /// Midnight UTC of the profile's last day. The natural reference
    /// instant for a generated dataset.
    pub fn end_instant(&self) -> DateTime<Utc> {
        midnight(self.profile.end_date)
    }

    pub fn generate(&self) -> RetentionResult<InputTables> {
        let mut roster_rng = self.rng_bank.for_stream(StreamSlot::Roster);
        let mut purchase_rng = self.rng_bank.for_stream(StreamSlot::Purchases);

        let customers = self.generate_customers(&mut roster_rng)?;
        let ledger = self.generate_purchases(&customers, &mut purchase_rng)?;

        let roster = customers
            .iter()
            .map(|c| RosterEntry {
                customer_id: c.customer_id.clone(),
                segment:     self.profile.segments[c.segment].id.clone(),
            })
            .collect::<Vec<_>>();

        log::info!(
            "generator: {} customers, {} transactions ({}..={})",
            roster.len(),
            ledger.len(),
            self.profile.start_date,
            self.profile.end_date,
        );

        Ok(InputTables::new(ledger, roster))
    }

    fn generate_customers(&self, rng: &mut StreamRng) -> RetentionResult<Vec<GeneratedCustomer>> {
        let shares: Vec<f64> = self
            .profile
            .segments
            .iter()
            .map(|s| s.population_share)
            .collect();

        (0..self.profile.num_customers)
            .map(|i| {
                let segment = rng.weighted_index(&shares).ok_or_else(|| {
                    RetentionError::InvalidDataset {
                        reason: "segment shares sum to zero".into(),
                    }
                })?;
                let registration_date = self.registration_date(&self.profile.segments[segment], rng);
                Ok(GeneratedCustomer {
                    customer_id: format!("c-{:06}", i + 1),
                    segment,
                    registration_date,
                })
            })
            .collect()
    }

    fn registration_date(&self, segment: &CustomerSegmentProfile, rng: &mut StreamRng) -> NaiveDate {
        let (anchor, min_days, max_days) = match segment.registration {
            RegistrationWindow::BeforeEnd { min_days, max_days } => {
                (self.profile.end_date, min_days, max_days)
            }
            RegistrationWindow::BeforeStart { min_days, max_days } => {
                (self.profile.start_date, min_days, max_days)
            }
        };
        let back = rng.range_inclusive(min_days, max_days);
        anchor - Duration::days(i64::from(back))
    }

    fn generate_purchases(
        &self,
        customers: &[GeneratedCustomer],
        rng: &mut StreamRng,
    ) -> RetentionResult<Vec<Transaction>> {
        let end = midnight(self.profile.end_date);
        let categories = &self.profile.categories;
        let uniform = vec![1.0; categories.len()];
        let mut ledger = Vec::new();

        for customer in customers {
            let seg = &self.profile.segments[customer.segment];
            let n = rng.range_inclusive(seg.min_purchases, seg.max_purchases);

            // n evenly spaced dates in [registration, end), first one on
            // the registration day itself.
            let start = midnight(customer.registration_date);
            let step = (end - start) / n as i32;

            for k in 0..n {
                let category = rng.weighted_index(&uniform).ok_or_else(|| {
                    RetentionError::InvalidDataset {
                        reason: "no product categories".into(),
                    }
                })?;
                let cat = &categories[category];
                let price = cat.avg_price * rng.normal(1.0, self.profile.price_variation_std);
                let returned = rng.chance(cat.return_probability);

                ledger.push(Transaction {
                    customer_id:      customer.customer_id.clone(),
                    transaction_date: start + step * k as i32,
                    amount:           round_to(price.max(0.0), 2),
                    returns:          u32::from(returned),
                });
            }
        }

        Ok(ledger)
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
