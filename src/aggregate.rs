//! Collapsing a set of samples into one uncertain value.
//!
//! Given `n` samples with means `mᵢ` and variances `vᵢ`:
//!
//! ```text
//! mean         = Σ mᵢ / n
//! instrumental = Σ vᵢ / n
//! statistical  = Σ (mᵢ − mean)² / (n − 1) / n     (0 when n = 1)
//! variance     = statistical + instrumental
//! ```
//!
//! The statistical term is the squared standard error of the mean with
//! Bessel's correction; the instrumental term is the average of the
//! samples' own stated uncertainty.
//!
//! # Algorithms
//!
//! - [`UncertainValue::from_samples`]: two passes over a slice, with
//!   Neumaier compensated summation for every sum.
//! - [`SampleAccumulator`]: one pass with O(1) memory, Welford's update
//!   on the sample means and a compensated sum of the variances. Two
//!   accumulators merge with Chan's parallel formula, so a caller can
//!   split a collection across threads and reduce the partial results.
//!   References: Welford (1962), *Technometrics* 4(3); Chan, Golub &
//!   LeVeque (1979).
//!
//! Both paths agree up to floating-point summation order.

use crate::error::{UncertainError, UncertainResult};
use crate::rounding::RoundingSource;
use crate::value::UncertainValue;

// ---------------------------------------------------------------------------
// Compensated summation
// ---------------------------------------------------------------------------

/// Neumaier running sum.
///
/// Kahan's compensation, extended to the case where the addend is larger
/// in magnitude than the running sum.
///
/// Reference: Neumaier (1974), *ZAMM* 54(1), pp. 39–51.
#[derive(Debug, Clone, Copy, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    fn merge(&mut self, other: &CompensatedSum) {
        self.add(other.sum);
        self.compensation += other.compensation;
    }

    fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

fn compensated_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut acc = CompensatedSum::default();
    for x in values {
        acc.add(x);
    }
    acc.total()
}

fn combine(
    count: usize,
    mean: f64,
    squared_deviations: f64,
    variance_sum: f64,
) -> UncertainResult<UncertainValue> {
    let n = count as f64;
    let statistical = if count > 1 {
        squared_deviations / (n - 1.0) / n
    } else {
        0.0
    };
    let instrumental = variance_sum / n;
    tracing::trace!(count, mean, statistical, instrumental, "aggregated samples");
    UncertainValue::new(mean, statistical + instrumental)
}

fn empty_error() -> UncertainError {
    UncertainError::InvalidArgument("sample collection is empty".into())
}

// ---------------------------------------------------------------------------
// Batch aggregation
// ---------------------------------------------------------------------------

impl UncertainValue {
    /// Aggregates samples into one value carrying statistical plus
    /// instrumental uncertainty.
    ///
    /// # Errors
    /// - [`UncertainError::InvalidArgument`] if `samples` is empty.
    /// - [`UncertainError::Domain`] if the combined mean or variance is not
    ///   finite (e.g. the sum of means overflows).
    ///
    /// # Examples
    /// ```
    /// use u_uncertain::UncertainValue;
    /// let samples = [
    ///     UncertainValue::new(1.0, 1.0).unwrap(),
    ///     UncertainValue::new(3.0, 1.0).unwrap(),
    /// ];
    /// let agg = UncertainValue::from_samples(&samples).unwrap();
    /// assert_eq!(agg.mean(), 2.0);
    /// assert_eq!(agg.variance(), 2.0);
    /// ```
    pub fn from_samples(samples: &[UncertainValue]) -> UncertainResult<Self> {
        if samples.is_empty() {
            return Err(empty_error());
        }
        let n = samples.len() as f64;
        let mean = compensated_sum(samples.iter().map(|s| s.mean())) / n;
        let squared_deviations = if samples.len() > 1 {
            compensated_sum(samples.iter().map(|s| {
                let d = s.mean() - mean;
                d * d
            }))
        } else {
            0.0
        };
        let variance_sum = compensated_sum(samples.iter().map(|s| s.variance()));
        combine(samples.len(), mean, squared_deviations, variance_sum)
    }

    /// Converts raw numbers through the rounding model, then aggregates
    /// them with [`UncertainValue::from_samples`].
    ///
    /// # Errors
    /// - [`UncertainError::InvalidArgument`] if `samples` is empty.
    /// - [`UncertainError::Domain`] if any sample is NaN/infinite, or the
    ///   combination is not finite.
    ///
    /// # Examples
    /// ```
    /// use u_uncertain::UncertainValue;
    /// let agg = UncertainValue::from_numeric_samples(&[9.7_f64, 9.9, 9.8]).unwrap();
    /// assert!((agg.mean() - 9.8).abs() < 1e-12);
    /// ```
    pub fn from_numeric_samples<T: RoundingSource>(samples: &[T]) -> UncertainResult<Self> {
        if samples.is_empty() {
            return Err(empty_error());
        }
        let converted = samples
            .iter()
            .map(|&x| UncertainValue::from_float(x))
            .collect::<UncertainResult<Vec<_>>>()?;
        Self::from_samples(&converted)
    }
}

// ---------------------------------------------------------------------------
// Streaming aggregation
// ---------------------------------------------------------------------------

/// Streaming, mergeable counterpart of [`UncertainValue::from_samples`].
///
/// # Examples
/// ```
/// use u_uncertain::{SampleAccumulator, UncertainValue};
/// let mut left = SampleAccumulator::new();
/// left.update(UncertainValue::new(1.0, 1.0).unwrap());
/// let mut right = SampleAccumulator::new();
/// right.update(UncertainValue::new(3.0, 1.0).unwrap());
/// left.merge(&right);
/// let agg = left.finish().unwrap();
/// assert_eq!((agg.mean(), agg.variance()), (2.0, 2.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SampleAccumulator {
    count: u64,
    mean_acc: f64,
    m2: f64,
    variances: CompensatedSum,
}

impl SampleAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one sample.
    pub fn update(&mut self, sample: UncertainValue) {
        let n1 = self.count;
        self.count += 1;
        self.variances.add(sample.variance());

        if n1 == 0 {
            // First sample: avoids delta² overflow for means near f64::MAX.
            self.mean_acc = sample.mean();
            return;
        }

        let n = self.count as f64;
        let delta = sample.mean() - self.mean_acc;
        let delta_n = delta / n;
        self.m2 += delta * delta_n * n1 as f64;
        self.mean_acc += delta_n;
    }

    /// Number of samples seen.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Running mean of the sample means, or `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.mean_acc)
        }
    }

    /// Sample variance (n − 1) of the sample means, or `None` with fewer
    /// than 2 samples.
    pub fn spread(&self) -> Option<f64> {
        if self.count < 2 {
            None
        } else {
            Some(self.m2 / (self.count - 1) as f64)
        }
    }

    /// Average of the samples' own variances, or `None` when empty.
    pub fn instrumental_variance(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.variances.total() / self.count as f64)
        }
    }

    /// Merges another accumulator into this one.
    pub fn merge(&mut self, other: &SampleAccumulator) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }
        let na = self.count as f64;
        let nb = other.count as f64;
        let total = self.count + other.count;
        let n = total as f64;
        let delta = other.mean_acc - self.mean_acc;

        self.mean_acc += delta * (nb / n);
        self.m2 += other.m2 + delta * delta * na * nb / n;
        self.variances.merge(&other.variances);
        self.count = total;
    }

    /// Produces the aggregated value.
    ///
    /// # Errors
    /// - [`UncertainError::InvalidArgument`] if no samples were added.
    /// - [`UncertainError::Domain`] if the combination is not finite.
    pub fn finish(&self) -> UncertainResult<UncertainValue> {
        if self.count == 0 {
            return Err(empty_error());
        }
        combine(
            self.count as usize,
            self.mean_acc,
            self.m2,
            self.variances.total(),
        )
    }
}

impl Extend<UncertainValue> for SampleAccumulator {
    fn extend<I: IntoIterator<Item = UncertainValue>>(&mut self, iter: I) {
        for sample in iter {
            self.update(sample);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
