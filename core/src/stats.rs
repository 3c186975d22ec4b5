//! Numeric helpers shared by the pipeline stages.
//!
//! Quantiles use linear interpolation between order statistics:
//!
//! ```text
//! h = (n - 1) * q
//! Q(q) = x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])
//! ```
//!
//! Rounding is half-to-even at the requested number of decimals,
//! applied exactly once where a value becomes externally visible.

/// Round `value` to `decimals` places, ties to even. Never returns `-0.0`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    // -0.0 + 0.0 == +0.0
    (value * factor).round_ties_even() / factor + 0.0
}

/// Arithmetic mean. `None` for an empty input.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// A sorted sample, built once and queried for any number of quantiles.
#[derive(Debug, Clone)]
pub struct SortedSample {
    values: Vec<f64>,
}

impl SortedSample {
    pub fn new(mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Quantile at level `q` in [0, 1]. `None` when the sample is empty.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        let n = self.values.len();
        if n == 0 {
            return None;
        }
        let q = q.clamp(0.0, 1.0);
        let h = (n - 1) as f64 * q;
        let lo = h.floor() as usize;
        let hi = (lo + 1).min(n - 1);
        let frac = h - lo as f64;
        Some(self.values[lo] + frac * (self.values[hi] - self.values[lo]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates_between_order_statistics() {
        let s = SortedSample::new(vec![40.0, 10.0, 30.0, 20.0]);
        // h = 3 * 0.75 = 2.25 → 30 + 0.25 * (40 - 30)
        assert_eq!(s.quantile(0.75), Some(32.5));
        // h = 3 * 0.40 = 1.2 → 20 + 0.2 * 10
        assert!((s.quantile(0.40).unwrap() - 22.0).abs() < 1e-9);
        assert_eq!(s.quantile(0.0), Some(10.0));
        assert_eq!(s.quantile(1.0), Some(40.0));
    }

    #[test]
    fn quantile_of_single_value_is_that_value() {
        let s = SortedSample::new(vec![7.5]);
        assert_eq!(s.quantile(0.4), Some(7.5));
        assert_eq!(s.quantile(0.75), Some(7.5));
    }

    #[test]
    fn quantile_of_empty_sample_is_none() {
        assert_eq!(SortedSample::new(Vec::new()).quantile(0.5), None);
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(std::iter::empty::<f64>()), None);
        assert_eq!(mean([1.0, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(600.0, 1), 600.0);
        assert_eq!(round_to(33.333_333, 1), 33.3);
        assert_eq!(round_to(-12.5, 0), -12.0);
    }

    #[test]
    fn small_negatives_round_to_positive_zero() {
        let r = round_to(-0.026, 1);
        assert_eq!(r, 0.0);
        assert!(r.is_sign_positive());
        assert_eq!(serde_json::to_string(&r).unwrap(), "0.0");
    }
}
