//! Dataset driver: chunked certification runs and result rows.
//!
//! A dataset is split into `chunks` equal intervals (the remainder of the
//! division is never certified) so independent processes can work on
//! different chunks. Within a chunk only every `skip`-th index is certified,
//! and the run stops when the index reaches `max`.

use crate::classifier::PointCloudClassifier;
use crate::error::{Result, SmoothFlowError};
use crate::observer::SampleObserver;
use crate::perturbation::Perturbation;
use crate::point_cloud::LabeledCloud;
use crate::smooth::{Certification, SmoothedClassifier};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Which dataset indices one chunk certifies.
///
/// # Examples
///
/// ```
/// use smoothflow::driver::ChunkPlan;
///
/// let plan = ChunkPlan::new(10, 2, 1).unwrap().with_skip(2).unwrap();
/// assert_eq!(plan.indices().collect::<Vec<_>>(), vec![6, 8]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    len: usize,
    chunks: usize,
    num_chunk: usize,
    skip: usize,
    max: Option<usize>,
}

impl ChunkPlan {
    /// Plan for chunk `num_chunk` (zero-based) of `chunks` over `len` inputs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if `chunks` is zero or `num_chunk` is
    /// not below `chunks`.
    pub fn new(len: usize, chunks: usize, num_chunk: usize) -> Result<Self> {
        if chunks == 0 {
            return Err(SmoothFlowError::invalid("chunks", chunks, ">= 1"));
        }
        if num_chunk >= chunks {
            return Err(SmoothFlowError::invalid(
                "num_chunk",
                num_chunk,
                &format!("< chunks ({chunks})"),
            ));
        }
        Ok(Self {
            len,
            chunks,
            num_chunk,
            skip: 1,
            max: None,
        })
    }

    /// Plan covering the whole dataset.
    #[must_use]
    pub fn whole(len: usize) -> Self {
        Self {
            len,
            chunks: 1,
            num_chunk: 0,
            skip: 1,
            max: None,
        }
    }

    /// Certify only indices divisible by `skip`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if `skip` is zero.
    pub fn with_skip(mut self, skip: usize) -> Result<Self> {
        if skip == 0 {
            return Err(SmoothFlowError::invalid("skip", skip, ">= 1"));
        }
        self.skip = skip;
        Ok(self)
    }

    /// Stop when a kept index equals `max`; `None` runs to the end of the chunk.
    #[must_use]
    pub fn with_max(mut self, max: Option<usize>) -> Self {
        self.max = max;
        self
    }

    /// Number of chunks the dataset is split into.
    #[must_use]
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Zero-based chunk this plan covers.
    #[must_use]
    pub fn num_chunk(&self) -> usize {
        self.num_chunk
    }

    /// Half-open index range of this chunk before skipping.
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        let interval = self.len / self.chunks;
        let start = self.num_chunk * interval;
        start..start + interval
    }

    /// Dataset indices to certify, in order.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let skip = self.skip;
        let max = self.max;
        self.range()
            .filter(move |i| i % skip == 0)
            .take_while(move |i| Some(*i) != max)
    }
}

/// One row of certification output.
///
/// `predict` is `-1` and `radius` is `0` for abstentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationRecord {
    /// Dataset index
    pub idx: usize,
    /// Ground-truth label
    pub label: usize,
    /// Certified class, `-1` on abstention
    pub predict: i64,
    /// Certified radius
    pub radius: f64,
    /// `1` if `predict == label`
    pub correct: u8,
    /// Wall-clock time, `H:MM:SS[.ffffff]`
    pub time: String,
}

impl CertificationRecord {
    /// Column names, in row order.
    pub const HEADER: [&'static str; 6] = ["idx", "label", "predict", "radius", "correct", "time"];

    /// Row for one certified input.
    #[must_use]
    pub fn new(idx: usize, label: usize, cert: &Certification, elapsed: Duration) -> Self {
        Self {
            idx,
            label,
            predict: cert
                .predicted_class()
                .and_then(|c| i64::try_from(c).ok())
                .unwrap_or(-1),
            radius: cert.radius,
            correct: u8::from(cert.is_correct(label)),
            time: format_elapsed(elapsed),
        }
    }

    /// Tab-separated header line.
    #[must_use]
    pub fn tsv_header() -> String {
        Self::HEADER.join("\t\t")
    }

    /// Tab-separated row, radius to three significant digits.
    #[must_use]
    pub fn to_tsv(&self) -> String {
        format!(
            "{}\t\t{}\t\t{}\t\t{}\t\t{}\t\t{}",
            self.idx,
            self.label,
            self.predict,
            format_significant(self.radius, 3),
            self.correct,
            self.time
        )
    }
}

/// Format `x` with `digits` significant digits, general-format style.
///
/// Fixed notation keeps at least one digit after the point (`1.0`, `0.0`,
/// `10.0`) and drops other trailing zeros. Exponents below -4 or at least
/// `digits - 1` switch to scientific notation with a signed two-digit
/// exponent (`1.23e+03`, `1e-05`).
#[must_use]
pub fn format_significant(x: f64, digits: usize) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    let digits = digits.max(1);
    // Rounded exponent, so 9.996 at three digits counts as 1.00e1.
    let sci = format!("{:.*e}", digits - 1, x);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if (-4..digits as i32 - 1).contains(&exp) {
        let decimals = (digits as i32 - 1 - exp).max(1) as usize;
        let fixed = format!("{x:.decimals$}");
        let trimmed = fixed.trim_end_matches('0');
        if trimmed.ends_with('.') {
            format!("{trimmed}0")
        } else {
            trimmed.to_string()
        }
    } else {
        let mantissa = if mantissa.contains('.') {
            mantissa.trim_end_matches('0').trim_end_matches('.')
        } else {
            mantissa
        };
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
    }
}

/// Format a duration as `H:MM:SS`, with `.ffffff` microseconds when nonzero.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let micros = elapsed.subsec_micros();
    let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);
    if micros == 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{h}:{m:02}:{s:02}.{micros:06}")
    }
}

/// `key: value` pairs joined with ` | `, the first line of a text report.
#[must_use]
pub fn settings_line(settings: &[(&str, String)]) -> String {
    settings
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Where a run writes its reports and samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    dataset: String,
    kind: Perturbation,
    experiment: String,
}

impl OutputLayout {
    /// Layout under `root` (usually `output`).
    pub fn new<P: AsRef<Path>>(root: P, dataset: &str, kind: Perturbation, experiment: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            dataset: dataset.to_string(),
            kind,
            experiment: experiment.to_string(),
        }
    }

    /// `<root>/certify/<dataset>/<kind>/<experiment>`
    #[must_use]
    pub fn certify_dir(&self) -> PathBuf {
        self.root
            .join("certify")
            .join(&self.dataset)
            .join(self.kind.as_str())
            .join(&self.experiment)
    }

    /// Report path for a chunk with the given extension (`txt` or `csv`).
    #[must_use]
    pub fn report_path(&self, plan: &ChunkPlan, extension: &str) -> PathBuf {
        self.certify_dir().join(format!(
            "certification_chunk_{}out_of{}.{extension}",
            plan.num_chunk() + 1,
            plan.chunks()
        ))
    }

    /// `<root>/samples`; observers add the per-kind directory.
    #[must_use]
    pub fn samples_root(&self) -> PathBuf {
        self.root.join("samples")
    }
}

/// What to do when the classifier fails on one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run and return the error.
    #[default]
    Abort,
    /// Log the failure and move on to the next input.
    Skip,
}

/// Options for [`certify_dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Handling of per-input classifier failures
    pub on_failure: FailurePolicy,
    /// Dataset index whose noisy sample is shown to the observer
    pub sample_index: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            on_failure: FailurePolicy::Abort,
            sample_index: Some(0),
        }
    }
}

/// Aggregate counts for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Inputs certified (including abstentions)
    pub certified: usize,
    /// Abstentions
    pub abstained: usize,
    /// Certified predictions equal to the label
    pub correct: usize,
    /// Inputs skipped after a classifier failure
    pub failed: usize,
}

/// Certify every planned input of `data`, passing each row to `sink`.
///
/// # Errors
///
/// Returns a `DimensionMismatch` if the plan reaches past `data`, any error
/// from `sink`, and classifier failures unless `options.on_failure` is
/// [`FailurePolicy::Skip`].
pub fn certify_dataset<C, F>(
    smoothed: &SmoothedClassifier<C>,
    data: &[LabeledCloud],
    plan: &ChunkPlan,
    options: RunOptions,
    mut observer: Option<&mut dyn SampleObserver>,
    mut sink: F,
) -> Result<RunSummary>
where
    C: PointCloudClassifier,
    F: FnMut(&CertificationRecord) -> Result<()>,
{
    if plan.range().end > data.len() {
        return Err(SmoothFlowError::dimension_mismatch(
            "dataset length",
            plan.range().end,
            data.len(),
        ));
    }
    let total = plan.range().end;
    let mut summary = RunSummary::default();

    for i in plan.indices() {
        let item = &data[i];
        let start = Instant::now();
        let result = match observer.as_deref_mut() {
            Some(obs) if options.sample_index == Some(i) => {
                smoothed.certify_with_observer(i, &item.cloud, obs)
            }
            _ => smoothed.certify(i, &item.cloud),
        };
        let cert = match result {
            Ok(cert) => cert,
            Err(e @ SmoothFlowError::Inference(_)) if options.on_failure == FailurePolicy::Skip => {
                tracing::error!(idx = i, error = %e, "certification failed, skipping input");
                summary.failed += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        let elapsed = start.elapsed();

        let record = CertificationRecord::new(i, item.label, &cert, elapsed);
        tracing::info!(
            idx = i,
            label = item.label,
            prediction = %cert.prediction,
            radius = cert.radius,
            p_a = cert.p_a,
            elapsed_ms = elapsed.as_millis() as u64,
            progress = %format!("{i}/{total}"),
            "certified input"
        );
        sink(&record)?;

        summary.certified += 1;
        if cert.is_abstain() {
            summary.abstained += 1;
        }
        if record.correct == 1 {
            summary.correct += 1;
        }
    }
    Ok(summary)
}
