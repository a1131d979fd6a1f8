//! Signal primitives: Gaussian smoothing, a simple maxima finder
//! with minimum-distance suppression, parabolic sub-bin centroiding, and
//! trapezoidal integration. Small enough to hand-roll, per the design
//! doc's own note — no external numerical crate is pulled in for these.

/// Median of a slice of `f64`. Returns `0.0` for an empty slice.
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median of consecutive differences, used throughout as "spectrum
/// resolution". Returns `1.0` for fewer than two points (matches the
/// original's `resolution = 1.0` fallback).
pub(crate) fn median_diff(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 1.0;
    }
    let diffs: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    median(&diffs)
}

/// Population standard deviation (`ddof = 0`).
pub(crate) fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Gaussian-smooth `intensity` against the (non-uniform but typically
/// near-uniform) `mz` axis. `fwhm_da` is expressed in the m/z domain;
/// converted to a sample-space sigma using the spectrum's resolution
/// (`median(diff(mz))`). Returns a clone of `intensity` unchanged when the
/// computed sigma is below half a sample or the spectrum is too short to
/// smooth meaningfully.
pub fn gaussian_smooth(mz: &[f64], intensity: &[f64], fwhm_da: f64) -> Vec<f64> {
    if mz.len() < 2 || fwhm_da <= 0.0 {
        return intensity.to_vec();
    }
    let resolution = median_diff(mz);
    if resolution <= 0.0 {
        return intensity.to_vec();
    }

    // 2*sqrt(2*ln(2))
    const FWHM_TO_SIGMA: f64 = 2.354_820_045_030_949_3;
    let sigma_da = fwhm_da / FWHM_TO_SIGMA;
    let sigma_pts = sigma_da / resolution;
    if sigma_pts < 0.5 {
        return intensity.to_vec();
    }

    let radius = (3.0 * sigma_pts).ceil() as isize;
    let radius = radius.max(1);
    let mut kernel = Vec::with_capacity((2 * radius + 1) as usize);
    let mut kernel_sum = 0.0;
    for k in -radius..=radius {
        let w = (-0.5 * (k as f64 / sigma_pts).powi(2)).exp();
        kernel.push(w);
        kernel_sum += w;
    }
    for w in &mut kernel {
        *w /= kernel_sum;
    }

    let n = intensity.len() as isize;
    let mut out = vec![0.0; intensity.len()];
    for i in 0..n {
        let mut acc = 0.0;
        for (k_idx, &w) in kernel.iter().enumerate() {
            let offset = k_idx as isize - radius;
            // Reflect at the boundary so edge peaks don't get shifted.
            let mut j = i + offset;
            if j < 0 {
                j = -j - 1;
            } else if j >= n {
                j = 2 * n - j - 1;
            }
            let j = j.clamp(0, n - 1) as usize;
            acc += w * intensity[j];
        }
        out[i as usize] = acc;
    }
    out
}

/// A point is a candidate local maximum when `y[i] >= y[i-1]` and
/// `y[i] >= y[i+1]`. Candidates are accepted greedily by descending
/// intensity (ties broken by lower index), blocking all indices within
/// `±(min_distance-1)` from further acceptance. Returns accepted indices
/// in ascending order.
pub fn find_simple_maxima(y: &[f64], min_distance: usize) -> Vec<usize> {
    if y.len() < 3 {
        return Vec::new();
    }

    let mut candidates: Vec<usize> = (1..y.len() - 1)
        .filter(|&i| y[i] >= y[i - 1] && y[i] >= y[i + 1])
        .collect();

    if candidates.is_empty() {
        return Vec::new();
    }

    // Descending intensity, ties broken by ascending index.
    candidates.sort_by(|&a, &b| {
        y[b].partial_cmp(&y[a])
            .unwrap()
            .then_with(|| a.cmp(&b))
    });

    let n = y.len();
    let mut blocked = vec![false; n];
    let mut accepted = Vec::new();
    let span = min_distance.saturating_sub(1) as isize;

    for idx in candidates {
        if blocked[idx] {
            continue;
        }
        accepted.push(idx);
        let lo = (idx as isize - span).max(0) as usize;
        let hi = ((idx as isize + span) as usize).min(n - 1);
        for b in blocked.iter_mut().take(hi + 1).skip(lo) {
            *b = true;
        }
    }

    accepted.sort_unstable();
    accepted
}

/// Fit `y = a*x^2 + b*x + c` through `(i-1, i, i+1)` and return the
/// sub-bin apex m/z. Degenerate denominators or boundary indices return
/// `mz[i]` unchanged.
pub fn parabolic_centroid(mz: &[f64], intensity: &[f64], i: usize) -> f64 {
    if i == 0 || i + 1 >= mz.len() {
        return mz[i];
    }

    let y0 = intensity[i - 1];
    let y1 = intensity[i];
    let y2 = intensity[i + 1];

    let denom = 2.0 * (y0 - 2.0 * y1 + y2);
    if denom.abs() < 1e-10 {
        return mz[i];
    }

    let mut delta = (y0 - y2) / denom;
    delta = delta.clamp(-1.0, 1.0);

    let dx = (mz[i + 1] - mz[i - 1]) / 2.0;
    mz[i] + delta * dx
}

/// Standard trapezoidal integration. Returns `0.0` for fewer than two
/// points.
pub fn trapezoidal_integrate(x: &[f64], y: &[f64]) -> f64 {
    if x.len() < 2 || y.len() < 2 {
        return 0.0;
    }
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xw, yw)| (xw[1] - xw[0]) * (yw[0] + yw[1]) / 2.0)
        .sum()
}

/// Min-max normalize to `[0, 1]`. A flat input normalizes to all zeros.
pub fn normalize_data(data: &[f64]) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let data_min = data.iter().cloned().fold(f64::INFINITY, f64::min);
    let data_max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = data_max - data_min;
    if span == 0.0 {
        return vec![0.0; data.len()];
    }
    data.iter().map(|&v| (v - data_min) / span).collect()
}

/// Percentile-baseline subtraction: subtract the given percentile of
/// `data` from every sample, clamping negatives to zero. `percentile` is
/// in `[0, 100]`.
pub fn baseline_correction(data: &[f64], percentile: f64) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let rank = (percentile / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    let baseline = sorted[lo] + (sorted[hi] - sorted[lo]) * frac;

    data.iter().map(|&v| (v - baseline).max(0.0)).collect()
}
