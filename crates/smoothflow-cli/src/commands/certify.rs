//! `smoothflow certify`: certify a chunk of a labeled dataset.

use super::read_json;
use crate::error::Result;
use crate::output::{self, ReportWriter};
use clap::Args;
use smoothflow::driver::{FailurePolicy, OutputLayout, RunOptions};
use smoothflow::observer::{JsonSampleWriter, SampleObserver};
use smoothflow::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for a certification run.
#[derive(Args, Debug, Clone)]
#[command(rename_all = "snake_case")]
pub(crate) struct CertifyArgs {
    /// Labeled test clouds (JSON array of `{ "cloud": ..., "label": ... }`)
    #[arg(long, value_name = "FILE")]
    pub(crate) data: PathBuf,

    /// Classifier written by `smoothflow fit`
    #[arg(long, value_name = "FILE")]
    pub(crate) model: PathBuf,

    /// Dataset name used in the output path
    #[arg(long, default_value = "modelnet40")]
    pub(crate) dataset: String,

    /// Perturbation family to certify against
    #[arg(long, default_value = "RotationXYZ")]
    pub(crate) certify_method: Perturbation,

    /// Noise level (fraction of π for rotations)
    #[arg(long)]
    pub(crate) sigma: f64,

    /// Directory name for this experiment's results
    #[arg(long)]
    pub(crate) experiment_name: String,

    /// Maximum clouds per classifier call
    #[arg(long, default_value_t = 128)]
    pub(crate) certify_batch_sz: usize,

    /// Certify only every `skip`-th example
    #[arg(long, default_value_t = 1)]
    pub(crate) skip: usize,

    /// Stop at this dataset index (-1 for no limit)
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub(crate) max: i64,

    /// Selection-phase samples
    #[arg(long = "N0", default_value_t = 100)]
    pub(crate) n0: usize,

    /// Estimation-phase samples
    #[arg(long = "N", default_value_t = 1000)]
    pub(crate) n: usize,

    /// Failure probability
    #[arg(long, default_value_t = 0.001)]
    pub(crate) alpha: f64,

    /// How many chunks the dataset is cut into
    #[arg(long, default_value_t = 1)]
    pub(crate) chunks: usize,

    /// Which chunk to certify (zero-based)
    #[arg(long, default_value_t = 0)]
    pub(crate) num_chunk: usize,

    /// Sample uniform noise and use the uniform certificate
    #[arg(long)]
    pub(crate) uniform: bool,

    /// Base random seed for reproducible runs
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Root directory for reports and samples
    #[arg(long, default_value = "output")]
    pub(crate) output_root: PathBuf,

    /// Do not write the noisy sample of the first example
    #[arg(long)]
    pub(crate) no_samples: bool,

    /// Log classifier failures and continue with the next example
    #[arg(long)]
    pub(crate) skip_failed: bool,
}

impl CertifyArgs {
    fn config(&self) -> CertifyConfig {
        let distribution = if self.uniform {
            NoiseDistribution::Uniform
        } else {
            NoiseDistribution::Gaussian
        };
        let config = CertifyConfig::new(self.certify_method, self.sigma)
            .with_n0(self.n0)
            .with_n(self.n)
            .with_alpha(self.alpha)
            .with_batch_size(self.certify_batch_sz)
            .with_distribution(distribution);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }

    fn settings(&self, spec: &PerturbationSpec) -> Vec<(&'static str, String)> {
        vec![
            ("dataset", self.dataset.clone()),
            ("data", self.data.display().to_string()),
            ("model", self.model.display().to_string()),
            ("certify_method", self.certify_method.to_string()),
            ("sigma", spec.sigma().to_string()),
            ("experiment_name", self.experiment_name.clone()),
            ("certify_batch_sz", self.certify_batch_sz.to_string()),
            ("skip", self.skip.to_string()),
            ("max", self.max.to_string()),
            ("N0", self.n0.to_string()),
            ("N", self.n.to_string()),
            ("alpha", self.alpha.to_string()),
            ("chunks", self.chunks.to_string()),
            ("num_chunk", self.num_chunk.to_string()),
            ("uniform", self.uniform.to_string()),
            (
                "seed",
                self.seed.map_or_else(|| "none".to_string(), |s| s.to_string()),
            ),
        ]
    }
}

/// Run the certification described by `args`.
pub(crate) fn run(args: &CertifyArgs) -> Result<()> {
    let config = args.config();
    let spec = config.validate()?;

    let data: Vec<LabeledCloud> = read_json(&args.data)?;
    let model: RadialProfileClassifier = read_json(&args.model)?;
    let plan = ChunkPlan::new(data.len(), args.chunks, args.num_chunk)?
        .with_skip(args.skip)?
        .with_max(usize::try_from(args.max).ok());

    let layout = OutputLayout::new(
        &args.output_root,
        &args.dataset,
        args.certify_method,
        &args.experiment_name,
    );
    std::fs::create_dir_all(layout.certify_dir())?;
    config.save(layout.certify_dir().join("config.json"))?;
    let mut reports = ReportWriter::create(
        &layout.report_path(&plan, "txt"),
        &layout.report_path(&plan, "csv"),
        &args.settings(&spec),
    )?;

    tracing::info!(
        kind = %args.certify_method,
        sigma = spec.sigma(),
        inputs = data.len(),
        chunk = args.num_chunk + 1,
        chunks = args.chunks,
        "starting certification"
    );

    let smoothed = SmoothedClassifier::new(model, config)?;
    let mut writer = JsonSampleWriter::new(layout.samples_root());
    let observer: Option<&mut dyn SampleObserver> = if args.no_samples {
        None
    } else {
        Some(&mut writer)
    };
    let options = RunOptions {
        on_failure: if args.skip_failed {
            FailurePolicy::Skip
        } else {
            FailurePolicy::Abort
        },
        ..RunOptions::default()
    };

    let start = Instant::now();
    let mut write_error = None;
    let summary = certify_dataset(&smoothed, &data, &plan, options, observer, |record| {
        reports.write(record).map_err(|e| {
            let message = e.to_string();
            write_error = Some(e);
            SmoothFlowError::Other(message)
        })
    });
    if let Some(e) = write_error {
        return Err(e);
    }
    let summary = summary?;

    output::section("Certification");
    output::kv("Perturbation", args.certify_method);
    output::kv("Sigma", spec.sigma());
    output::kv("Certified", summary.certified);
    output::kv("Abstained", summary.abstained);
    output::kv("Correct", summary.correct);
    if summary.failed > 0 {
        output::kv("Failed", summary.failed);
    }
    output::kv("Report", layout.report_path(&plan, "txt").display());
    output::kv("Elapsed", smoothflow::driver::format_elapsed(start.elapsed()));
    Ok(())
}
