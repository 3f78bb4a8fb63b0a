//! Statistical routines behind the certificate.
//!
//! - Clopper–Pearson one-sided lower bound for a binomial proportion
//! - Exact two-sided binomial test against `p = 1/2`
//! - Standard normal CDF and quantile
//! - Regularized incomplete beta / gamma functions and their inverses
//!
//! # Examples
//!
//! ```
//! use smoothflow::stats::{clopper_pearson_lower, normal_ppf};
//!
//! // 990 of 1000 noisy copies voted for the top class.
//! let p_a = clopper_pearson_lower(990, 1000, 0.001);
//! assert!(p_a > 0.97 && p_a < 0.99);
//!
//! // Gaussian certificate in units of sigma.
//! let r = normal_ppf(p_a);
//! assert!(r > 1.9);
//! ```

pub mod binomial;
pub mod normal;
pub mod special;

pub use binomial::{binomial_sf, binomial_test_half, clopper_pearson_lower};
pub use normal::{normal_cdf, normal_ppf};
pub use special::{
    erfc, inverse_regularized_incomplete_beta, ln_beta, ln_gamma, regularized_incomplete_beta,
};

#[cfg(test)]
#[path = "tests_bounds_contract.rs"]
mod tests_bounds_contract;
