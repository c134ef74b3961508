// Copyright 2025 PFC Mapper contributors
// SPDX-License-Identifier: Apache-2.0

//! Precomputed connectome configuration
//!
//! Describes the on-disk layout and geometry of one precomputed connectome:
//! where the per-chunk statistic files live, which volumes define the
//! whole-brain and chunk-indicator geometries, and the declared voxel counts
//! that every loaded chunk file must agree with.

use crate::chunk::Statistic;
use crate::{MapperError, MapperResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of a precomputed connectome.
///
/// Consumed, not owned, by the mapping core: the orchestrator loads one of
/// these (typically from a TOML file next to the connectome data) and passes
/// it to [`process_chunk`](crate::process_chunk) for every chunk.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectomeConfig {
    /// Directory holding the per-chunk AvgR statistic files.
    pub avgr: PathBuf,
    /// Directory holding the per-chunk Fisher-z statistic files.
    pub fz: PathBuf,
    /// Directory holding the per-chunk T statistic files.
    pub t: PathBuf,
    /// Directory holding the per-chunk Combo support files.
    pub combo: PathBuf,
    /// Whole-brain mask volume.
    pub mask: PathBuf,
    /// Chunk indicator volume (each voxel holds the index of its owning chunk).
    pub chunk_idx: PathBuf,
    /// BOLD norm scalar field volume.
    pub norm: PathBuf,
    /// BOLD standard deviation scalar field volume.
    pub std: PathBuf,
    /// Voxels per chunk.
    pub chunk_size: usize,
    /// Voxels in the whole-brain mask.
    pub brain_size: usize,
    /// Number of chunks in the connectome partition.
    pub num_chunks: usize,
}

impl ConnectomeConfig {
    /// Load a connectome configuration from a TOML file and validate it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the file does not exist, `ConfigParse` on
    /// invalid TOML, and `ConfigValidation` if the geometry is unusable.
    pub fn from_file(path: &Path) -> MapperResult<Self> {
        if !path.exists() {
            return Err(MapperError::ConfigNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path).map_err(MapperError::ConfigIo)?;
        let config: ConnectomeConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configured geometry.
    pub fn validate(&self) -> MapperResult<()> {
        if self.chunk_size == 0 {
            return Err(MapperError::ConfigValidation(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.brain_size == 0 {
            return Err(MapperError::ConfigValidation(
                "brain_size must be greater than zero".to_string(),
            ));
        }
        if self.num_chunks == 0 {
            return Err(MapperError::ConfigValidation(
                "num_chunks must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory holding the chunk files for `statistic`.
    pub fn statistic_dir(&self, statistic: Statistic) -> &Path {
        match statistic {
            Statistic::AvgR => &self.avgr,
            Statistic::AvgRFz => &self.fz,
            Statistic::T => &self.t,
            Statistic::Combo => &self.combo,
        }
    }

    /// Path of the on-disk file for one (chunk, statistic) pair.
    ///
    /// Naming convention: `{chunk_index}_{StatisticLabel}.npy`.
    pub fn chunk_file(&self, chunk: u32, statistic: Statistic) -> PathBuf {
        self.statistic_dir(statistic)
            .join(format!("{}_{}.npy", chunk, statistic.label()))
    }
}
