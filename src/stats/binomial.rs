//! Binomial confidence bounds and tests.

use super::special::{inverse_regularized_incomplete_beta, regularized_incomplete_beta};

/// One-sided Clopper–Pearson lower confidence bound.
///
/// Returns the `alpha` quantile of `Beta(n_a, n - n_a + 1)`: with probability
/// at least `1 - alpha` over the draw of `n` Bernoulli trials, the true success
/// probability is at least the returned value.
///
/// Edge cases use the closed forms `0` for `n_a = 0` and `alpha^(1/n)` for
/// `n_a = n`.
///
/// # Examples
///
/// ```
/// use smoothflow::stats::clopper_pearson_lower;
///
/// let p = clopper_pearson_lower(200, 200, 0.001);
/// assert!(p > 0.95);
/// assert_eq!(clopper_pearson_lower(0, 200, 0.001), 0.0);
/// ```
#[must_use]
pub fn clopper_pearson_lower(n_a: usize, n: usize, alpha: f64) -> f64 {
    debug_assert!(n_a <= n, "successes {n_a} exceed trials {n}");
    if n == 0 || n_a == 0 {
        return 0.0;
    }
    let n_a = n_a.min(n);
    let bound = if n_a == n {
        alpha.powf(1.0 / n as f64)
    } else {
        inverse_regularized_incomplete_beta(alpha, n_a as f64, (n - n_a + 1) as f64)
    };
    debug_assert!(
        (0.0..=1.0).contains(&bound),
        "Clopper-Pearson bound {bound} outside [0, 1]"
    );
    bound
}

/// Upper tail `P(X >= k)` for `X ~ Binomial(n, p)`.
#[must_use]
pub fn binomial_sf(k: usize, n: usize, p: f64) -> f64 {
    if k == 0 {
        return 1.0;
    }
    if k > n {
        return 0.0;
    }
    regularized_incomplete_beta(k as f64, (n - k + 1) as f64, p)
}

/// Two-sided exact binomial test of `H0: p = 1/2` for `k` successes out of `n`.
///
/// Under the symmetric null the p-value is `2 · P(X >= max(k, n - k))`,
/// capped at 1.
#[must_use]
pub fn binomial_test_half(k: usize, n: usize) -> f64 {
    if n == 0 || 2 * k == n {
        return 1.0;
    }
    let k = k.min(n);
    let extreme = k.max(n - k);
    (2.0 * binomial_sf(extreme, n, 0.5)).min(1.0)
}
