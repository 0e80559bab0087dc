/// Binomial coefficient as f64, exact for every universe size we accept
pub(crate) fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Shapley weight `|S|! (n - |S| - 1)! / n!` for every coalition size `|S|` in `0..n`
///
/// Computed as `1 / (n * C(n - 1, s))` so it stays accurate past the range where
/// factorials fit in a u64.
pub(crate) fn shapley_weights(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|s| 1.0 / (n as f64 * binomial(n - 1, s)))
        .collect()
}

/// Check two floats agree within an absolute tolerance
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}
