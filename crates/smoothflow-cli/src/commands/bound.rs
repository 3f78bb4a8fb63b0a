//! `smoothflow bound`: certificate for given vote counts.

use crate::error::Result;
use crate::output;
use clap::Args;
use smoothflow::prelude::*;
use smoothflow::radius::{Certificate, RadiusMapper};
use smoothflow::stats::clopper_pearson_lower;

/// Arguments for a standalone bound computation.
#[derive(Args, Debug, Clone)]
#[command(rename_all = "snake_case")]
pub(crate) struct BoundArgs {
    /// Estimation-phase votes for the candidate class
    #[arg(long)]
    pub(crate) n_a: usize,

    /// Estimation-phase samples
    #[arg(long = "N")]
    pub(crate) n: usize,

    /// Failure probability
    #[arg(long, default_value_t = 0.001)]
    pub(crate) alpha: f64,

    /// Perturbation family (sets the radius metric)
    #[arg(long, default_value = "RotationXYZ")]
    pub(crate) certify_method: Perturbation,

    /// Noise level (fraction of π for rotations)
    #[arg(long)]
    pub(crate) sigma: f64,

    /// Use the uniform certificate
    #[arg(long)]
    pub(crate) uniform: bool,
}

/// Lower bound and radius for the counts in `args`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoundReport {
    pub(crate) p_a: f64,
    pub(crate) abstain: bool,
    pub(crate) radius: f64,
}

pub(crate) fn compute(args: &BoundArgs) -> Result<BoundReport> {
    let config = CertifyConfig::new(args.certify_method, args.sigma)
        .with_n(args.n)
        .with_alpha(args.alpha);
    let spec = config.validate()?;
    if args.n_a > args.n {
        return Err(SmoothFlowError::invalid("n_a", args.n_a, &format!("<= N ({})", args.n)).into());
    }
    let certificate = if args.uniform {
        Certificate::Uniform
    } else {
        Certificate::Gaussian
    };
    let p_a = clopper_pearson_lower(args.n_a, args.n, args.alpha);
    let abstain = p_a <= 0.5;
    let radius = if abstain {
        0.0
    } else {
        RadiusMapper::new(&spec, certificate).radius(p_a)
    };
    Ok(BoundReport {
        p_a,
        abstain,
        radius,
    })
}

pub(crate) fn run(args: &BoundArgs) -> Result<()> {
    let report = compute(args)?;
    output::section("Clopper-Pearson bound");
    output::kv("nA / N", format!("{} / {}", args.n_a, args.n));
    output::kv("alpha", args.alpha);
    output::kv("pA lower bound", format!("{:.6}", report.p_a));
    if report.abstain {
        output::kv("Decision", "abstain");
    } else {
        output::kv("Decision", "certify");
        output::kv(
            "Radius",
            format!("{:.6} ({})", report.radius, args.certify_method.radius_unit()),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;

    fn args(n_a: usize, n: usize) -> BoundArgs {
        BoundArgs {
            n_a,
            n,
            alpha: 0.001,
            certify_method: Perturbation::Translation,
            sigma: 0.5,
            uniform: false,
        }
    }

    #[test]
    fn test_compute_certifies_and_abstains() {
        let report = compute(&args(990, 1000)).expect("valid");
        assert!(!report.abstain);
        assert!((report.p_a - 0.976_036_187_155_311_3).abs() < 1e-9);
        assert!(report.radius > 0.0);

        let report = compute(&args(500, 1000)).expect("valid");
        assert!(report.abstain);
        assert_eq!(report.radius, 0.0);
    }

    #[test]
    fn test_compute_rejects_bad_counts() {
        assert!(matches!(compute(&args(11, 10)), Err(CliError::Config(_))));
        assert!(matches!(compute(&args(0, 0)), Err(CliError::Config(_))));
    }
}
