// Copyright 2025 PFC Mapper contributors
// SPDX-License-Identifier: Apache-2.0

//! Chunk processing and consolidation
//!
//! [`process_chunk`] computes one chunk's contribution to the FC maps of a
//! batch of ROIs; [`consolidate`] merges contributions into the running
//! atlas. Chunks are independent read-only units, so the orchestrator may
//! process them in any order (or in parallel) as long as consolidation into
//! one atlas stays single-writer.

use crate::chunk::{load_chunk_data, Statistic};
use crate::masking::{MaskingBackend, RoiProjection};
use crate::stats::{
    compute_chunk_masks, compute_denominator, compute_network_maps, compute_network_weights,
    compute_numerator,
};
use crate::{ConnectomeConfig, MapperError, MapperResult};
use ahash::AHashMap;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

/// One ROI's partial contribution to the FC maps, from one chunk (or, inside
/// an [`Atlas`], the running total across all chunks consolidated so far).
///
/// All six fields are always present; records are allocated zeroed for every
/// ROI in the batch before any statistic is assigned, so no field assignment
/// depends on processing order.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiContribution {
    /// Average-correlation network map contribution (len = brain_size).
    pub avgr: Array1<f64>,
    /// Fisher-z network map contribution (len = brain_size).
    pub fz: Array1<f64>,
    /// T-statistic network map contribution (len = brain_size).
    pub t: Array1<f64>,
    /// Total contribution weight of the ROI from this chunk.
    pub network_weight: f64,
    /// Combo numerator contribution.
    pub numerator: f64,
    /// Combo denominator contribution.
    pub denominator: f64,
}

impl RoiContribution {
    /// A zeroed record for a brain of `brain_size` voxels.
    pub fn zeros(brain_size: usize) -> Self {
        RoiContribution {
            avgr: Array1::zeros(brain_size),
            fz: Array1::zeros(brain_size),
            t: Array1::zeros(brain_size),
            network_weight: 0.0,
            numerator: 0.0,
            denominator: 0.0,
        }
    }

    /// Mutable slot for a network-map statistic; `None` for Combo, which
    /// contributes scalars instead of a map row.
    fn map_slot(&mut self, statistic: Statistic) -> Option<&mut Array1<f64>> {
        match statistic {
            Statistic::AvgR => Some(&mut self.avgr),
            Statistic::AvgRFz => Some(&mut self.fz),
            Statistic::T => Some(&mut self.t),
            Statistic::Combo => None,
        }
    }

    /// Add `other` field-wise into this record.
    ///
    /// # Errors
    ///
    /// Returns `InconsistentRecord` if any map vector disagrees in length;
    /// the field set of a record is fixed by construction, so dimensional
    /// inconsistency is the only representable contract violation.
    fn accumulate(&mut self, roi: &Path, other: &RoiContribution) -> MapperResult<()> {
        for (name, mine, theirs) in [
            ("avgr", self.avgr.len(), other.avgr.len()),
            ("fz", self.fz.len(), other.fz.len()),
            ("t", self.t.len(), other.t.len()),
        ] {
            if mine != theirs {
                return Err(MapperError::InconsistentRecord {
                    roi: roi.to_path_buf(),
                    detail: format!(
                        "{} map has {} voxels in the atlas but {} in the contribution",
                        name, mine, theirs
                    ),
                });
            }
        }
        self.avgr += &other.avgr;
        self.fz += &other.fz;
        self.t += &other.t;
        self.network_weight += other.network_weight;
        self.numerator += other.numerator;
        self.denominator += other.denominator;
        Ok(())
    }
}

/// Per-ROI contributions from exactly one chunk, keyed by ROI path.
pub type ChunkContribution = AHashMap<PathBuf, RoiContribution>;

/// Running totals across all chunks consolidated so far, keyed by ROI path.
pub type Atlas = AHashMap<PathBuf, RoiContribution>;

/// Compute one chunk's contribution to the FC maps of a batch of ROIs.
///
/// Projects every ROI into the whole-brain and chunk-local domains, builds
/// the weighted chunk masks, then loads each of the four precomputed
/// statistic files for `chunk` and reduces it into per-ROI contributions:
/// network map rows for AvgR / AvgR_Fz / T, a numerator/denominator pair for
/// Combo, and the per-ROI network weight.
///
/// Side effect: reads the four chunk files from disk; writes nothing.
///
/// # Errors
///
/// * `EmptyRoiBatch` / `ChunkIndexOutOfRange` on invalid inputs
/// * `ShapeMismatch` if a loaded chunk file disagrees with the configured
///   `(chunk_size, brain_size)` - fatal for this chunk
/// * `DimensionMismatch` on any internal shape disagreement
/// * masking collaborator failures propagate unmodified
pub fn process_chunk<M: MaskingBackend + ?Sized>(
    chunk: u32,
    rois: &[PathBuf],
    config: &ConnectomeConfig,
    masking: &M,
) -> MapperResult<ChunkContribution> {
    if rois.is_empty() {
        return Err(MapperError::EmptyRoiBatch);
    }
    if chunk as usize >= config.num_chunks {
        return Err(MapperError::ChunkIndexOutOfRange {
            chunk,
            num_chunks: config.num_chunks,
        });
    }

    let projections = rois
        .iter()
        .map(|roi| RoiProjection::project(masking, chunk, roi, config))
        .collect::<MapperResult<Vec<_>>>()?;

    let mut chunk_weights = Array2::<f64>::zeros((projections.len(), config.chunk_size));
    for (i, projection) in projections.iter().enumerate() {
        chunk_weights.row_mut(i).assign(&projection.chunk_weights);
    }

    let norm_weight = project_scalar_field(masking, chunk, &config.norm, config)?;
    let std_weight = project_scalar_field(masking, chunk, &config.std, config)?;
    let (norm_chunk_masks, std_chunk_masks) =
        compute_chunk_masks(&chunk_weights, &norm_weight, &std_weight)?;

    // Records exist for every ROI before any statistic is assigned.
    let mut contribution = ChunkContribution::new();
    for roi in rois {
        contribution.insert(roi.clone(), RoiContribution::zeros(config.brain_size));
    }

    for statistic in Statistic::SCALAR_MAPS {
        let chunk_data = load_chunk_data(config, chunk, statistic)?;
        let started = Instant::now();
        let network_maps = compute_network_maps(&std_chunk_masks, &chunk_data)?;
        debug!(
            chunk,
            statistic = statistic.label(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "computed network maps"
        );
        for (i, roi) in rois.iter().enumerate() {
            if let Some(record) = contribution.get_mut(roi) {
                if let Some(slot) = record.map_slot(statistic) {
                    *slot = network_maps.row(i).to_owned();
                }
            }
        }
    }

    let chunk_data = load_chunk_data(config, chunk, Statistic::Combo)?;
    let numerator = compute_numerator(&norm_chunk_masks);
    let started = Instant::now();
    let denominators: Vec<f64> = projections
        .par_iter()
        .map(|projection| compute_denominator(projection, chunk_data.view()))
        .collect();
    debug!(
        chunk,
        rois = rois.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "computed combo contributions"
    );
    for (i, roi) in rois.iter().enumerate() {
        if let Some(record) = contribution.get_mut(roi) {
            record.numerator = numerator[i];
            record.denominator = denominators[i];
        }
    }

    let network_weights = compute_network_weights(&std_chunk_masks);
    for (i, roi) in rois.iter().enumerate() {
        if let Some(record) = contribution.get_mut(roi) {
            record.network_weight = network_weights[i];
        }
    }

    Ok(contribution)
}

fn project_scalar_field<M: MaskingBackend + ?Sized>(
    masking: &M,
    chunk: u32,
    volume: &Path,
    config: &ConnectomeConfig,
) -> MapperResult<Array1<f64>> {
    let field = masking.project_chunk(chunk, volume)?;
    if field.len() != config.chunk_size {
        return Err(MapperError::DimensionMismatch(format!(
            "chunk {} projection of {} has {} voxels, expected chunk_size {}",
            chunk,
            volume.display(),
            field.len(),
            config.chunk_size
        )));
    }
    Ok(field)
}

/// Merge a chunk's contribution into the running atlas.
///
/// Existing entries accumulate field-wise; first-seen ROIs are inserted as
/// copies of the contribution. The merge is associative and commutative over
/// chunks, so partitioned atlases consolidated separately and then merged
/// pairwise yield the same totals. It is deliberately not idempotent:
/// consolidating the same contribution twice doubles the running sums.
///
/// Mutates `atlas`; never mutates `contribution`.
pub fn consolidate(contribution: &ChunkContribution, atlas: &mut Atlas) -> MapperResult<()> {
    for (roi, record) in contribution.iter() {
        match atlas.get_mut(roi) {
            Some(existing) => existing.accumulate(roi, record)?,
            None => {
                atlas.insert(roi.clone(), record.clone());
            }
        }
    }
    Ok(())
}
