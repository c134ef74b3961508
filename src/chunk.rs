// Copyright 2025 PFC Mapper contributors
// SPDX-License-Identifier: Apache-2.0

//! Chunk statistic files
//!
//! A precomputed connectome stores one dense `.npy` array per
//! (chunk, statistic) pair, shape `(chunk_size, brain_size)` with rows in
//! chunk-local voxel order and columns in whole-brain voxel order. That axis
//! convention is load-bearing for the combo denominator and is guarded here
//! by the shape contract.

use crate::{ConnectomeConfig, MapperError, MapperResult};
use ndarray::Array2;
use ndarray_npy::ReadNpyExt;
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::time::Instant;
use tracing::debug;

/// The four per-chunk connectivity statistics of a precomputed connectome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    /// Raw average correlation.
    AvgR,
    /// Fisher-z-transformed average correlation.
    AvgRFz,
    /// T-statistic map.
    T,
    /// Support data for the combo numerator/denominator pair.
    Combo,
}

impl Statistic {
    /// All statistics, in processing order.
    pub const ALL: [Statistic; 4] = [
        Statistic::AvgR,
        Statistic::AvgRFz,
        Statistic::T,
        Statistic::Combo,
    ];

    /// The three statistics whose chunk contribution is a network map row.
    pub const SCALAR_MAPS: [Statistic; 3] = [Statistic::AvgR, Statistic::AvgRFz, Statistic::T];

    /// Label used in on-disk chunk file names.
    pub fn label(self) -> &'static str {
        match self {
            Statistic::AvgR => "AvgR",
            Statistic::AvgRFz => "AvgR_Fz",
            Statistic::T => "T",
            Statistic::Combo => "Combo",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Load the precomputed data for one (chunk, statistic) pair.
///
/// Accepts `f32` or `f64` files; single-precision data is widened so all
/// downstream accumulation runs in double precision. The shape contract
/// `(chunk_size, brain_size)` is enforced before the data is handed to any
/// numeric computation.
///
/// # Errors
///
/// Returns `ChunkIo` if the file cannot be read, `ChunkParse` if it is not a
/// valid `.npy` array, and `ShapeMismatch` if its shape disagrees with the
/// configured geometry (fatal for this chunk).
pub fn load_chunk_data(
    config: &ConnectomeConfig,
    chunk: u32,
    statistic: Statistic,
) -> MapperResult<Array2<f64>> {
    let path = config.chunk_file(chunk, statistic);
    let started = Instant::now();
    let bytes = fs::read(&path).map_err(|source| MapperError::ChunkIo {
        path: path.clone(),
        source,
    })?;

    let check_shape = |actual: (usize, usize)| -> MapperResult<()> {
        let expected = (config.chunk_size, config.brain_size);
        if actual != expected {
            return Err(MapperError::ShapeMismatch {
                chunk,
                statistic: statistic.label(),
                expected,
                actual,
            });
        }
        Ok(())
    };

    let data = match Array2::<f32>::read_npy(Cursor::new(&bytes)) {
        Ok(single) => {
            check_shape(single.dim())?;
            single.mapv(f64::from)
        }
        Err(_) => {
            let double =
                Array2::<f64>::read_npy(Cursor::new(&bytes)).map_err(|source| {
                    MapperError::ChunkParse {
                        path: path.clone(),
                        source,
                    }
                })?;
            check_shape(double.dim())?;
            double
        }
    };

    debug!(
        chunk,
        statistic = statistic.label(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "loaded chunk data"
    );
    Ok(data)
}
