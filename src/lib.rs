// Copyright 2025 PFC Mapper contributors
// SPDX-License-Identifier: Apache-2.0

//! # pfc-mapper
//!
//! Functional connectivity mapping core for the precomputed connectome.
//!
//! A precomputed connectome stores voxel-to-voxel correlation statistics
//! partitioned into fixed-size chunks. This crate computes, per chunk and per
//! batch of ROIs, each ROI's partial contribution to four whole-brain FC
//! statistics (AvgR, Fisher-z AvgR, T, and the combo numerator/denominator
//! pair), and merges those partial contributions into a running atlas.
//!
//! The crate deliberately owns only the numeric core:
//! [`process_chunk`] for one chunk and one ROI batch, and [`consolidate`]
//! for the associative, commutative merge. NIfTI volume loading sits behind
//! the [`MaskingBackend`] trait, and scheduling chunks across workers,
//! retrying, and persisting finished maps belong to the orchestrator.
//!
//! ```no_run
//! use pfc_mapper::{consolidate, process_chunk, Atlas, ConnectomeConfig};
//! # use pfc_mapper::{MapperResult, MaskingBackend};
//! # fn run(masking: &dyn MaskingBackend, rois: Vec<std::path::PathBuf>) -> MapperResult<()> {
//! let config = ConnectomeConfig::from_file("connectome.toml".as_ref())?;
//! let mut atlas = Atlas::new();
//! for chunk in 0..config.num_chunks as u32 {
//!     let contribution = process_chunk(chunk, &rois, &config, masking)?;
//!     consolidate(&contribution, &mut atlas)?;
//! }
//! # Ok(())
//! # }
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod chunk;
pub mod config;
pub mod error;
pub mod mapping;
pub mod masking;
pub mod stats;

pub use chunk::{load_chunk_data, Statistic};
pub use config::ConnectomeConfig;
pub use error::{MapperError, MapperResult};
pub use mapping::{consolidate, process_chunk, Atlas, ChunkContribution, RoiContribution};
pub use masking::{support, MaskingBackend, RoiProjection};
pub use stats::{
    compute_chunk_masks, compute_denominator, compute_network_maps, compute_network_weights,
    compute_numerator,
};
