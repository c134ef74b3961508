// Copyright 2025 PFC Mapper contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for connectome mapping operations

use std::path::PathBuf;

/// Result type for mapping operations
pub type MapperResult<T> = Result<T, MapperError>;

/// Errors that can occur while computing or consolidating chunk contributions.
///
/// No error is recovered inside this crate; every failure propagates to the
/// orchestrator, which decides whether to skip the chunk or abort the run.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    /// A loaded chunk statistic file disagrees with the configured geometry.
    /// Fatal for the chunk; raised before any numeric computation runs.
    #[error(
        "chunk {chunk} {statistic} map expected shape {expected:?} but has shape {actual:?}"
    )]
    ShapeMismatch {
        chunk: u32,
        statistic: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Incompatible shapes fed to an internal matrix operation.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A contribution record disagrees with the atlas entry it is being
    /// merged into. Indicates an upstream contract violation in chunk
    /// processing and is never silently tolerated.
    #[error("inconsistent record for ROI {}: {detail}", .roi.display())]
    InconsistentRecord { roi: PathBuf, detail: String },

    #[error("ROI batch is empty")]
    EmptyRoiBatch,

    #[error("chunk index {chunk} out of range (connectome has {num_chunks} chunks)")]
    ChunkIndexOutOfRange { chunk: u32, num_chunks: usize },

    #[error("failed to read chunk file {}: {source}", .path.display())]
    ChunkIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse chunk file {}: {source}", .path.display())]
    ChunkParse {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },

    /// Failure reported by the external masking collaborator.
    #[error("masking failed: {0}")]
    Masking(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("failed to read config file: {0}")]
    ConfigIo(std::io::Error),

    #[error("invalid TOML in config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    ConfigValidation(String),
}
