// =========================================================================
// FALSIFY-CP: Clopper-Pearson bound contract
//
// The certified radius is sound only if the lower bound is a valid
// one-sided confidence bound. These checks pin the shape properties the
// certificate relies on: range, monotonicity in the success count and in
// the significance level, and consistency with the exact binomial tail.
//
// References:
//   - Clopper & Pearson (1934) "The use of confidence or fiducial limits"
//   - Cohen, Rosenfeld & Kolter (2019) "Certified Adversarial Robustness
//     via Randomized Smoothing"
// =========================================================================

use super::*;
use proptest::prelude::*;

/// FALSIFY-CP-001: bound lies in [0, 1]
#[test]
fn falsify_cp_001_bound_in_unit_interval() {
    for n in [1, 2, 10, 100, 1000] {
        for n_a in 0..=n {
            if n > 100 && n_a % 37 != 0 {
                continue;
            }
            let p = clopper_pearson_lower(n_a, n, 0.001);
            assert!(
                (0.0..=1.0).contains(&p),
                "FALSIFIED CP-001: bound {p} outside [0,1] for nA={n_a} N={n}"
            );
        }
    }
}

/// FALSIFY-CP-002: bound never exceeds the empirical proportion
#[test]
fn falsify_cp_002_bound_below_point_estimate() {
    for (n_a, n) in [(1, 10), (9, 10), (500, 1000), (999, 1000)] {
        let p = clopper_pearson_lower(n_a, n, 0.05);
        let p_hat = n_a as f64 / n as f64;
        assert!(
            p <= p_hat,
            "FALSIFIED CP-002: bound {p} above p_hat {p_hat}"
        );
    }
}

/// FALSIFY-CP-003: at the bound, observing >= nA successes has probability alpha
#[test]
fn falsify_cp_003_bound_hits_tail_probability() {
    for (n_a, n, alpha) in [(80, 100, 0.01), (990, 1000, 0.001), (3, 20, 0.05)] {
        let p = clopper_pearson_lower(n_a, n, alpha);
        let tail = binomial_sf(n_a, n, p);
        assert!(
            (tail - alpha).abs() < 1e-9,
            "FALSIFIED CP-003: P(X>={n_a}; {p}) = {tail}, expected {alpha}"
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// FALSIFY-CP-004: non-decreasing in the success count
    #[test]
    fn falsify_cp_004_prop_monotone_in_successes(
        n in 1usize..400,
        frac in 0.0f64..1.0,
        alpha in 0.0001f64..0.2,
    ) {
        let n_a = ((n as f64) * frac) as usize;
        let lower = clopper_pearson_lower(n_a, n, alpha);
        let upper = clopper_pearson_lower((n_a + 1).min(n), n, alpha);
        prop_assert!(
            upper >= lower - 1e-12,
            "FALSIFIED CP-004: bound({}) = {} < bound({}) = {}", n_a + 1, upper, n_a, lower
        );
    }

    /// FALSIFY-CP-005: non-increasing in alpha (more confidence, lower bound)
    #[test]
    fn falsify_cp_005_prop_antitone_in_confidence(
        n in 1usize..400,
        frac in 0.0f64..=1.0,
        alpha in 0.0001f64..0.1,
        factor in 1.0f64..5.0,
    ) {
        let n_a = ((n as f64) * frac) as usize;
        let strict = clopper_pearson_lower(n_a, n, alpha);
        let loose = clopper_pearson_lower(n_a, n, alpha * factor);
        prop_assert!(
            strict <= loose + 1e-12,
            "FALSIFIED CP-005: alpha={} gives {} > alpha={} gives {}",
            alpha, strict, alpha * factor, loose
        );
    }

    /// FALSIFY-CP-006: quantile function is strictly increasing on (0, 1)
    #[test]
    fn falsify_cp_006_prop_normal_ppf_increasing(p in 0.001f64..0.998, dp in 0.0005f64..0.001) {
        prop_assert!(normal_ppf(p + dp) > normal_ppf(p));
    }
}
