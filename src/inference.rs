//! Batched inference and vote counting.
//!
//! The runner never submits more than `batch_size` clouds to the classifier
//! in one call. Chunking is invisible in the result: the same samples yield
//! the same [`VoteCounts`] for any batch size.

use crate::classifier::{argmax, PointCloudClassifier};
use crate::error::{Result, SmoothFlowError};
use crate::point_cloud::PointCloud;
use crate::sampler::PerturbationSampler;

/// Per-class hard-prediction counts for one sampling phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteCounts {
    counts: Vec<usize>,
}

impl VoteCounts {
    /// All-zero counts for `num_classes` classes.
    #[must_use]
    pub fn new(num_classes: usize) -> Self {
        Self {
            counts: vec![0; num_classes],
        }
    }

    /// Wrap raw counts.
    #[must_use]
    pub fn from_counts(counts: Vec<usize>) -> Self {
        Self { counts }
    }

    /// Record one vote for `class`.
    fn record(&mut self, class: usize) {
        self.counts[class] += 1;
    }

    /// Add `other` into `self` class by class.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the class counts differ.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if other.counts.len() != self.counts.len() {
            return Err(SmoothFlowError::dimension_mismatch(
                "num_classes",
                self.counts.len(),
                other.counts.len(),
            ));
        }
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        Ok(())
    }

    /// Votes for `class` (zero if out of range).
    #[must_use]
    pub fn get(&self, class: usize) -> usize {
        self.counts.get(class).copied().unwrap_or(0)
    }

    /// Total number of votes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Number of classes.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.counts.len()
    }

    /// Raw counts indexed by class.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.counts
    }

    /// Class with the most votes; ties go to the lowest class index.
    #[must_use]
    pub fn top(&self) -> Option<usize> {
        self.top_two().map(|(a, _)| a)
    }

    /// The two classes with the most votes, highest first.
    ///
    /// With a single class the runner-up is the same class.
    #[must_use]
    pub fn top_two(&self) -> Option<(usize, usize)> {
        if self.counts.is_empty() {
            return None;
        }
        let mut order: Vec<usize> = (0..self.counts.len()).collect();
        // stable: equal counts keep ascending class order
        order.sort_by(|&a, &b| self.counts[b].cmp(&self.counts[a]));
        Some((order[0], order.get(1).copied().unwrap_or(order[0])))
    }
}

/// Feeds samples through a classifier in bounded batches.
#[derive(Debug)]
pub struct BatchRunner<'a, C: ?Sized> {
    classifier: &'a C,
    batch_size: usize,
}

impl<'a, C: PointCloudClassifier + ?Sized> BatchRunner<'a, C> {
    /// Runner over a borrowed classifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if `batch_size` is zero or the
    /// classifier reports zero classes.
    pub fn new(classifier: &'a C, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(SmoothFlowError::invalid("batch_size", batch_size, ">= 1"));
        }
        if classifier.num_classes() == 0 {
            return Err(SmoothFlowError::invalid(
                "num_classes",
                classifier.num_classes(),
                ">= 1",
            ));
        }
        Ok(Self {
            classifier,
            batch_size,
        })
    }

    /// Maximum clouds per classifier call.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Classify pre-drawn samples in chunks of at most `batch_size`.
    ///
    /// # Errors
    ///
    /// Classifier failures are returned as `Inference` with the original
    /// error as source; malformed classifier output is `DimensionMismatch`.
    pub fn classify_batch(&self, samples: &[PointCloud]) -> Result<VoteCounts> {
        let mut votes = VoteCounts::new(self.classifier.num_classes());
        for chunk in samples.chunks(self.batch_size) {
            self.fold_chunk(chunk, &mut votes)?;
        }
        debug_assert_eq!(votes.total(), samples.len());
        Ok(votes)
    }

    /// Draw `num` samples of `input` and count votes, holding at most
    /// `batch_size` samples in memory at a time.
    ///
    /// # Errors
    ///
    /// See [`classify_batch`](Self::classify_batch).
    pub fn count_votes(
        &self,
        sampler: &mut PerturbationSampler,
        input: &PointCloud,
        num: usize,
    ) -> Result<VoteCounts> {
        self.count_votes_with(sampler, input, num, |_| {})
    }

    /// [`count_votes`](Self::count_votes), showing each drawn chunk to
    /// `inspect` before it is classified.
    ///
    /// # Errors
    ///
    /// See [`classify_batch`](Self::classify_batch).
    pub fn count_votes_with<F>(
        &self,
        sampler: &mut PerturbationSampler,
        input: &PointCloud,
        num: usize,
        mut inspect: F,
    ) -> Result<VoteCounts>
    where
        F: FnMut(&[PointCloud]),
    {
        let mut votes = VoteCounts::new(self.classifier.num_classes());
        let mut remaining = num;
        while remaining > 0 {
            let this_batch = remaining.min(self.batch_size);
            let chunk = sampler.sample(input, this_batch);
            inspect(&chunk);
            self.fold_chunk(&chunk, &mut votes)?;
            remaining -= this_batch;
        }
        debug_assert_eq!(
            votes.total(),
            num,
            "vote counts must sum to the number of samples drawn"
        );
        Ok(votes)
    }

    fn fold_chunk(&self, chunk: &[PointCloud], votes: &mut VoteCounts) -> Result<()> {
        debug_assert!(chunk.len() <= self.batch_size);
        let scores = self
            .classifier
            .predict_batch(chunk)
            .map_err(SmoothFlowError::Inference)?;
        if scores.len() != chunk.len() {
            return Err(SmoothFlowError::dimension_mismatch(
                "classifier output rows",
                chunk.len(),
                scores.len(),
            ));
        }
        let num_classes = votes.num_classes();
        for row in &scores {
            if row.len() != num_classes {
                return Err(SmoothFlowError::dimension_mismatch(
                    "classifier output classes",
                    num_classes,
                    row.len(),
                ));
            }
            if let Some(class) = argmax(row) {
                votes.record(class);
            }
        }
        Ok(())
    }
}
