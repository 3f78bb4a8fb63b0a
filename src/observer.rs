//! Sample observers.
//!
//! An observer is shown one representative noisy sample per certified input.
//! It is a side channel: its failures are logged by the caller and never
//! change vote counts or the certification result.

use crate::error::Result;
use crate::perturbation::Perturbation;
use crate::point_cloud::PointCloud;
use std::path::{Path, PathBuf};

/// Receives `(index, kind, sample)` for one noisy realization of an input.
pub trait SampleObserver {
    /// Handle one sample.
    ///
    /// # Errors
    ///
    /// Implementation-defined, typically I/O.
    fn observe(&mut self, index: usize, kind: Perturbation, sample: &PointCloud) -> Result<()>;
}

impl<F> SampleObserver for F
where
    F: FnMut(usize, Perturbation, &PointCloud) -> Result<()>,
{
    fn observe(&mut self, index: usize, kind: Perturbation, sample: &PointCloud) -> Result<()> {
        self(index, kind, sample)
    }
}

/// Keeps every observed sample in memory.
#[derive(Debug, Default, Clone)]
pub struct SampleCollector {
    samples: Vec<(usize, PointCloud)>,
}

impl SampleCollector {
    /// Empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collected `(index, sample)` pairs in arrival order.
    #[must_use]
    pub fn samples(&self) -> &[(usize, PointCloud)] {
        &self.samples
    }

    /// Consume the collector.
    #[must_use]
    pub fn into_samples(self) -> Vec<(usize, PointCloud)> {
        self.samples
    }
}

impl SampleObserver for SampleCollector {
    fn observe(&mut self, index: usize, _kind: Perturbation, sample: &PointCloud) -> Result<()> {
        self.samples.push((index, sample.clone()));
        Ok(())
    }
}

/// Writes each sample as `<root>/<kind dir>/sample_<index>.json`.
///
/// # Examples
///
/// ```no_run
/// use smoothflow::observer::JsonSampleWriter;
///
/// let writer = JsonSampleWriter::new("output/samples");
/// ```
#[derive(Debug, Clone)]
pub struct JsonSampleWriter {
    root: PathBuf,
}

impl JsonSampleWriter {
    /// Writer rooted at `root`; directories are created on first write.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Destination file for a sample.
    #[must_use]
    pub fn path_for(&self, index: usize, kind: Perturbation) -> PathBuf {
        self.root
            .join(kind.sample_dir())
            .join(format!("sample_{index}.json"))
    }
}

impl SampleObserver for JsonSampleWriter {
    fn observe(&mut self, index: usize, kind: Perturbation, sample: &PointCloud) -> Result<()> {
        let path = self.path_for(index, kind);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string(sample)?)?;
        tracing::trace!(path = %path.display(), "wrote sample");
        Ok(())
    }
}
