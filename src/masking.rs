// Copyright 2025 PFC Mapper contributors
// SPDX-License-Identifier: Apache-2.0

//! Masking collaborator seam and ROI projections
//!
//! Volume loading and mask transforms live outside this crate (NIfTI I/O is
//! an external concern). [`MaskingBackend`] is the seam: it projects a volume
//! onto a flat weight vector over either the whole-brain mask or one chunk of
//! the partition. Implementations must be deterministic and order-stable so
//! repeated projections of the same ROI agree voxel-for-voxel.

use crate::{ConnectomeConfig, MapperError, MapperResult};
use ndarray::Array1;
use std::path::{Path, PathBuf};

/// Projects volumes onto flat voxel weight vectors.
pub trait MaskingBackend {
    /// Project `volume` onto the nonzero support of the whole-brain mask.
    ///
    /// The returned vector has one entry per brain voxel, in a stable order.
    fn project_brain(&self, volume: &Path) -> MapperResult<Array1<f64>>;

    /// Project `volume` onto the voxels owned by `chunk`.
    fn project_chunk(&self, chunk: u32, volume: &Path) -> MapperResult<Array1<f64>>;
}

/// Indices of the nonzero entries of a weight vector.
///
/// The boolean mask of a weight vector is always `weights != 0`; it is never
/// stored separately. Support lists are the compact form used by the masked
/// reductions.
pub fn support(weights: &Array1<f64>) -> Vec<usize> {
    weights
        .iter()
        .enumerate()
        .filter(|(_, w)| **w != 0.0)
        .map(|(i, _)| i)
        .collect()
}

/// One ROI projected into both voxel domains of a chunk-processing call.
///
/// `brain_weights` lives in whole-brain voxel space, `chunk_weights` in the
/// chunk-local space. The support lists are computed once per projection and
/// reused by every masked reduction that touches this ROI.
#[derive(Debug, Clone)]
pub struct RoiProjection {
    /// Path of the ROI volume; its stable key in contribution maps.
    pub roi: PathBuf,
    /// ROI weights over the whole-brain voxel domain (len = brain_size).
    pub brain_weights: Array1<f64>,
    /// ROI weights over the chunk-local voxel domain (len = chunk_size).
    pub chunk_weights: Array1<f64>,
    /// Nonzero indices of `brain_weights`.
    pub brain_support: Vec<usize>,
    /// Nonzero indices of `chunk_weights`.
    pub chunk_support: Vec<usize>,
}

impl RoiProjection {
    /// Project one ROI into the whole-brain and chunk-local domains.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if either projection disagrees with the
    /// configured brain or chunk voxel count; masking failures from the
    /// backend propagate unmodified.
    pub fn project<M: MaskingBackend + ?Sized>(
        backend: &M,
        chunk: u32,
        roi: &Path,
        config: &ConnectomeConfig,
    ) -> MapperResult<Self> {
        let brain_weights = backend.project_brain(roi)?;
        if brain_weights.len() != config.brain_size {
            return Err(MapperError::DimensionMismatch(format!(
                "brain projection of {} has {} voxels, expected brain_size {}",
                roi.display(),
                brain_weights.len(),
                config.brain_size
            )));
        }
        let chunk_weights = backend.project_chunk(chunk, roi)?;
        if chunk_weights.len() != config.chunk_size {
            return Err(MapperError::DimensionMismatch(format!(
                "chunk {} projection of {} has {} voxels, expected chunk_size {}",
                chunk,
                roi.display(),
                chunk_weights.len(),
                config.chunk_size
            )));
        }
        let brain_support = support(&brain_weights);
        let chunk_support = support(&chunk_weights);
        Ok(RoiProjection {
            roi: roi.to_path_buf(),
            brain_weights,
            chunk_weights,
            brain_support,
            chunk_support,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn support_selects_nonzero_indices() {
        let weights = array![0.0, 1.5, 0.0, -2.0, 0.25];
        assert_eq!(support(&weights), vec![1, 3, 4]);
    }

    #[test]
    fn support_of_zero_vector_is_empty() {
        let weights = Array1::<f64>::zeros(8);
        assert!(support(&weights).is_empty());
    }
}
