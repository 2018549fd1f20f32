//! Gaussian smoothing of series recovered by inverting the model.
//!
//! Inverting the carbon or thermal recurrence divides by small, time-differenced
//! quantities, so any noise in the prescribed concentration or temperature is
//! amplified in the recovered emissions or forcing. A Gaussian filter is applied
//! to the whole recovered series as a final, deliberately lossy, regularisation.
//!
//! The filter follows the conventional scientific-Python behaviour: the kernel
//! is truncated at four standard deviations and the series is extended by
//! half-sample symmetric reflection (`d c b a | a b c d | d c b a`).

use crate::timeseries::FloatValue;
use ndarray::{Array1, ArrayView1};

/// Kernel half-width in standard deviations.
pub const TRUNCATE: FloatValue = 4.0;

/// Normalised Gaussian weights for offsets `-radius..=radius`.
pub fn gaussian_kernel(sigma: FloatValue) -> Vec<FloatValue> {
    let radius = (TRUNCATE * sigma + 0.5) as usize;
    let weights: Vec<FloatValue> = (0..=2 * radius)
        .map(|i| {
            let offset = i as FloatValue - radius as FloatValue;
            (-0.5 * (offset / sigma).powi(2)).exp()
        })
        .collect();
    let total: FloatValue = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Map an out-of-range index back into `0..n` by half-sample reflection.
fn reflect(index: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = index.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

/// Smooth a series with a Gaussian kernel of standard deviation `sigma` steps.
///
/// A non-positive `sigma` returns the series unchanged.
pub fn gaussian_filter1d(values: ArrayView1<'_, FloatValue>, sigma: FloatValue) -> Array1<FloatValue> {
    let n = values.len();
    if n == 0 || sigma <= 0.0 {
        return values.to_owned();
    }

    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;

    Array1::from_shape_fn(n, |i| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * values[reflect(i as isize + k as isize - radius, n)])
            .sum()
    })
}
