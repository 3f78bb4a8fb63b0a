//! Integration tests for SmoothFlow certification.
//!
//! These tests verify end-to-end workflows combining multiple components.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smoothflow::driver::{OutputLayout, RunOptions};
use smoothflow::observer::JsonSampleWriter;
use smoothflow::prelude::*;
use smoothflow::stats::normal_ppf;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Always votes for class 0.
#[derive(Debug)]
struct ConstantZero {
    classes: usize,
}

impl PointCloudClassifier for ConstantZero {
    fn num_classes(&self) -> usize {
        self.classes
    }

    fn predict_batch(&self, batch: &[PointCloud]) -> std::result::Result<Vec<Vec<f32>>, BoxError> {
        let mut row = vec![0.0; self.classes];
        row[0] = 1.0;
        Ok(vec![row; batch.len()])
    }
}

/// Votes uniformly at random; counts calls and the largest batch seen.
#[derive(Debug)]
struct RandomVoter {
    classes: usize,
    rng: Mutex<StdRng>,
    largest_batch: AtomicUsize,
}

impl RandomVoter {
    fn new(classes: usize, seed: u64) -> Self {
        Self {
            classes,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            largest_batch: AtomicUsize::new(0),
        }
    }
}

impl PointCloudClassifier for RandomVoter {
    fn num_classes(&self) -> usize {
        self.classes
    }

    fn predict_batch(&self, batch: &[PointCloud]) -> std::result::Result<Vec<Vec<f32>>, BoxError> {
        self.largest_batch.fetch_max(batch.len(), Ordering::SeqCst);
        let mut rng = self.rng.lock().map_err(|_| "rng poisoned")?;
        Ok(batch
            .iter()
            .map(|_| {
                let mut row = vec![0.0; self.classes];
                row[rng.gen_range(0..self.classes)] = 1.0;
                row
            })
            .collect())
    }
}

fn airplane() -> PointCloud {
    PointCloud::new(vec![
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, 0.4, 0.1],
        [0.0, -0.4, 0.1],
        [0.8, 0.0, 0.3],
    ])
}

#[test]
fn test_constant_classifier_is_certified_under_rotation() {
    let config = CertifyConfig::new(Perturbation::RotationZ, 0.5)
        .with_n0(50)
        .with_n(200)
        .with_alpha(0.001)
        .with_seed(17);
    let smoothed =
        SmoothedClassifier::new(ConstantZero { classes: 40 }, config).expect("valid config");
    let cert = smoothed.certify(0, &airplane()).expect("certify");

    assert_eq!(cert.prediction, Prediction::Class(0));
    assert_eq!(cert.n_a, 200);
    assert!(cert.p_a > 0.95, "p_a = {}", cert.p_a);
    let expected = 0.5 * PI * normal_ppf(cert.p_a);
    assert!((cert.radius - expected).abs() < 1e-9);
    assert!(cert.radius > 0.0);
}

#[test]
fn test_random_classifier_abstains() {
    let config = CertifyConfig::new(Perturbation::Translation, 0.1)
        .with_n0(100)
        .with_n(1000)
        .with_seed(3);
    let smoothed =
        SmoothedClassifier::new(RandomVoter::new(40, 99), config).expect("valid config");
    let cert = smoothed.certify(0, &airplane()).expect("certify");

    assert_eq!(cert.prediction, Prediction::Abstain);
    assert_eq!(cert.radius, 0.0);
    assert!(cert.p_a <= 0.5);
}

#[test]
fn test_batch_size_is_never_exceeded() {
    for batch_size in [1, 7, 64, 1000] {
        let config = CertifyConfig::new(Perturbation::GaussianNoise, 0.01)
            .with_n0(30)
            .with_n(250)
            .with_batch_size(batch_size)
            .with_seed(0);
        let voter = RandomVoter::new(5, 1);
        let smoothed = SmoothedClassifier::new(&voter, config).expect("valid config");
        smoothed.certify(0, &airplane()).expect("certify");
        assert!(voter.largest_batch.load(Ordering::SeqCst) <= batch_size);
    }
}

#[test]
fn test_every_perturbation_certifies_a_constant_classifier() {
    for kind in Perturbation::ALL {
        let config = CertifyConfig::new(kind, 0.05)
            .with_n0(10)
            .with_n(100)
            .with_seed(5);
        let smoothed =
            SmoothedClassifier::new(ConstantZero { classes: 3 }, config).expect("valid config");
        let cert = smoothed.certify(1, &airplane()).expect("certify");
        assert_eq!(cert.prediction, Prediction::Class(0), "{kind}");
        assert!(cert.radius > 0.0, "{kind}");
    }
}

#[test]
fn test_reference_classifier_end_to_end() {
    let ring = |r: f64| {
        PointCloud::new(
            (0..24)
                .map(|i| {
                    let t = f64::from(i) / 24.0 * std::f64::consts::TAU;
                    [r * t.cos(), r * t.sin(), 0.0]
                })
                .collect(),
        )
    };
    let train = vec![
        LabeledCloud::new(ring(0.2), 0),
        LabeledCloud::new(ring(0.3), 0),
        LabeledCloud::new(ring(0.8), 1),
        LabeledCloud::new(ring(1.0), 1),
    ];
    let model = RadialProfileClassifier::fit(&train, 2, 8).expect("fit");

    // radial profiles ignore rotations entirely
    let config = CertifyConfig::new(Perturbation::RotationXYZ, 0.25)
        .with_n0(20)
        .with_n(200)
        .with_seed(11);
    let smoothed = SmoothedClassifier::new(model, config).expect("valid config");
    let test = vec![LabeledCloud::new(ring(0.22), 0), LabeledCloud::new(ring(0.9), 1)];

    let mut rows = Vec::new();
    let summary = certify_dataset(
        &smoothed,
        &test,
        &ChunkPlan::whole(test.len()),
        RunOptions::default(),
        None,
        |r| {
            rows.push(r.clone());
            Ok(())
        },
    )
    .expect("run");

    assert_eq!(summary.certified, 2);
    assert_eq!(summary.correct, 2);
    assert!(rows.iter().all(|r| r.radius > 0.0 && r.correct == 1));
}

#[test]
fn test_samples_written_under_kind_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = OutputLayout::new(dir.path(), "modelnet40", Perturbation::Twisting, "exp");
    let mut writer = JsonSampleWriter::new(layout.samples_root());

    let config = CertifyConfig::new(Perturbation::Twisting, 0.1)
        .with_n0(5)
        .with_n(20)
        .with_seed(2);
    let smoothed =
        SmoothedClassifier::new(ConstantZero { classes: 2 }, config).expect("valid config");
    let data = vec![
        LabeledCloud::new(airplane(), 0),
        LabeledCloud::new(airplane(), 0),
    ];
    certify_dataset(
        &smoothed,
        &data,
        &ChunkPlan::whole(2),
        RunOptions::default(),
        Some(&mut writer),
        |_| Ok(()),
    )
    .expect("run");

    let samples = dir.path().join("samples").join("twisting");
    assert!(samples.join("sample_0.json").exists());
    assert!(!samples.join("sample_1.json").exists());
}

#[test]
fn test_chunks_partition_the_dataset() {
    let len = 23;
    let chunks = 4;
    let mut seen = Vec::new();
    for k in 0..chunks {
        seen.extend(ChunkPlan::new(len, chunks, k).expect("valid").indices());
    }
    assert_eq!(seen, (0..20).collect::<Vec<_>>());
}
