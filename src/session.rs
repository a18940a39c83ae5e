//! # Compression Session
//!
//! A session owns one intensity matrix and its SVD factors. The factors are
//! computed once, when the session is built, and are read-only from then on;
//! every call to [`CompressionSession::evaluate`] runs the rest of the
//! pipeline (truncate, reconstruct, normalize, measure) against them and
//! returns an [`Evaluation`] that owns all of its data.
//!
//! Evaluations never share mutable state, so a caller serving concurrent
//! requests can build one session per image and evaluate ranks from as many
//! threads as it likes.

use std::time::{Duration, Instant};

use log::{debug, info};
use svd_core::{
    decompose_with, encode_with_fallback, noise_floor, reconstruct, DecomposeOptions,
    DegeneratePolicy, ExportedImage, IntensityMatrix, ReconstructedMatrix, ReconstructionMetrics,
    SvdFactors,
};

use crate::error::SvdResult;

/// Result of evaluating one rank.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub rank: usize,
    pub reconstruction: ReconstructedMatrix,
    pub exported: ExportedImage,
    pub metrics: ReconstructionMetrics,
    /// Whether the export came from the constant-input fallback.
    pub flat: bool,
}

/// Loaded image plus its cached decomposition.
#[derive(Debug, Clone)]
pub struct CompressionSession {
    image: IntensityMatrix,
    factors: SvdFactors,
    degenerate: DegeneratePolicy,
    decompose_time: Duration,
}

impl CompressionSession {
    /// Create a session using the builder pattern.
    pub fn builder(image: IntensityMatrix) -> CompressionSessionBuilder {
        CompressionSessionBuilder::new(image)
    }

    /// Decompose `image` with default settings.
    pub fn new(image: IntensityMatrix) -> SvdResult<Self> {
        Self::builder(image).build()
    }

    pub fn image(&self) -> &IntensityMatrix {
        &self.image
    }

    pub fn factors(&self) -> &SvdFactors {
        &self.factors
    }

    pub fn singular_values(&self) -> &[f64] {
        self.factors.singular_values()
    }

    /// Largest admissible rank for this image.
    pub fn max_rank(&self) -> usize {
        self.factors.max_rank()
    }

    /// Half of `min(rows, cols)`, ties to even.
    pub fn default_rank(&self) -> usize {
        self.image.default_rank()
    }

    /// Wall time spent in the decomposition.
    pub fn decompose_time(&self) -> Duration {
        self.decompose_time
    }

    /// Run reconstruction, normalization and measurement at `rank`.
    pub fn evaluate(&self, rank: usize) -> SvdResult<Evaluation> {
        let reconstruction = reconstruct(&self.factors, rank)?;
        let exported = encode_with_fallback(
            &reconstruction,
            self.degenerate,
            noise_floor(&self.factors),
        )?;
        let flat = exported.is_uniform();
        let metrics = ReconstructionMetrics::measure(
            self.image.as_matrix(),
            &reconstruction,
            self.factors.singular_values(),
            rank,
        )?;

        debug!(
            "rank {}: frobenius error {:.4}, energy retained {:.4}",
            rank, metrics.frobenius_error, metrics.energy_retained
        );
        Ok(Evaluation {
            rank,
            reconstruction,
            exported,
            metrics,
            flat,
        })
    }
}

/// Builder for [`CompressionSession`].
pub struct CompressionSessionBuilder {
    image: IntensityMatrix,
    options: DecomposeOptions,
    degenerate: DegeneratePolicy,
}

impl CompressionSessionBuilder {
    /// Create a new session builder.
    pub fn new(image: IntensityMatrix) -> Self {
        Self {
            image,
            options: DecomposeOptions::default(),
            degenerate: DegeneratePolicy::default(),
        }
    }

    /// Cap SVD iterations; `0` iterates until convergence.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.options.max_iterations = max_iterations;
        self
    }

    /// Set the policy for constant reconstructions.
    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate = policy;
        self
    }

    /// Decompose the image and build the session.
    pub fn build(self) -> SvdResult<CompressionSession> {
        let (rows, cols) = self.image.shape();
        let started = Instant::now();
        let factors = decompose_with(self.image.as_matrix(), &self.options)?;
        let decompose_time = started.elapsed();
        info!(
            "decomposed {}x{} image in {:.1} ms",
            rows,
            cols,
            decompose_time.as_secs_f64() * 1000.0
        );

        Ok(CompressionSession {
            image: self.image,
            factors,
            degenerate: self.degenerate,
            decompose_time,
        })
    }
}
