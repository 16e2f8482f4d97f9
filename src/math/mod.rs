/// Default tolerance for fraction and probability sums.
pub const FRACTION_TOLERANCE: f64 = 1e-6;

/// Returns `true` if `a` and `b` differ by less than `tol`.
#[must_use]
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

/// Returns `true` if the values sum to one within `tol`.
#[must_use]
pub fn sums_to_one<I>(values: I, tol: f64) -> bool
where
    I: IntoIterator<Item = f64>,
{
    approx_eq(values.into_iter().sum(), 1.0, tol)
}

/// Share each of `n` carriers gets in a uniform split.
///
/// Returns `1.0` for `n == 0` so callers never divide by zero.
#[must_use]
pub fn uniform_share(n: usize) -> f64 {
    if n == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = n as f64;
    1.0 / n
}

/// Returns `true` if `value` lies in the closed unit interval.
#[must_use]
pub fn in_unit_interval(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}
