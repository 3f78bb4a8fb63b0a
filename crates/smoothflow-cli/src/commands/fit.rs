//! `smoothflow fit`: fit the reference radial-profile classifier.

use super::read_json;
use crate::error::Result;
use crate::output;
use clap::Args;
use smoothflow::prelude::*;
use std::path::PathBuf;

/// Arguments for fitting a classifier.
#[derive(Args, Debug, Clone)]
#[command(rename_all = "snake_case")]
pub(crate) struct FitArgs {
    /// Labeled training clouds (JSON array of `{ "cloud": ..., "label": ... }`)
    #[arg(long, value_name = "FILE")]
    pub(crate) data: PathBuf,

    /// Number of classes (defaults to the largest label + 1)
    #[arg(long)]
    pub(crate) num_classes: Option<usize>,

    /// Radial histogram bins
    #[arg(long, default_value_t = 32)]
    pub(crate) bins: usize,

    /// Output model file
    #[arg(short, long, default_value = "model.json")]
    pub(crate) output: PathBuf,
}

/// Fit and save the classifier described by `args`.
pub(crate) fn run(args: &FitArgs) -> Result<()> {
    let data: Vec<LabeledCloud> = read_json(&args.data)?;
    let num_classes = args
        .num_classes
        .unwrap_or_else(|| data.iter().map(|d| d.label + 1).max().unwrap_or(0));
    let model = RadialProfileClassifier::fit(&data, num_classes, args.bins)?;
    model.save(&args.output)?;

    let train_correct = data
        .iter()
        .filter(|d| model.predict(&d.cloud) == d.label)
        .count();
    tracing::info!(
        inputs = data.len(),
        num_classes,
        bins = args.bins,
        "fitted radial profile classifier"
    );

    output::section("Fit");
    output::kv("Inputs", data.len());
    output::kv("Classes", num_classes);
    output::kv("Bins", args.bins);
    output::kv(
        "Training accuracy",
        format!("{:.1}%", 100.0 * train_correct as f64 / data.len().max(1) as f64),
    );
    output::kv("Model", args.output.display());
    Ok(())
}
