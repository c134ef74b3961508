// Copyright 2025 PFC Mapper contributors
// SPDX-License-Identifier: Apache-2.0

//! Statistic accumulators
//!
//! Pure numeric reductions that turn masked weight matrices and loaded chunk
//! data into per-ROI scalars and vectors. All accumulation runs in `f64`
//! regardless of the on-disk precision of the connectome.

use crate::masking::RoiProjection;
use crate::{MapperError, MapperResult};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Compute the weighted chunk masks.
///
/// Each output is the row-broadcast element-wise product of `chunk_weights`
/// (shape R x C) with the corresponding length-C scalar field.
///
/// # Arguments
/// * `chunk_weights` - Chunk-masked weighted ROIs, one row per ROI
/// * `norm_weight` - Chunk-masked voxel BOLD norms
/// * `std_weight` - Chunk-masked voxel BOLD standard deviations
///
/// # Returns
/// * `(norm_chunk_masks, std_chunk_masks)` - both shape R x C
pub fn compute_chunk_masks(
    chunk_weights: &Array2<f64>,
    norm_weight: &Array1<f64>,
    std_weight: &Array1<f64>,
) -> MapperResult<(Array2<f64>, Array2<f64>)> {
    let voxels = chunk_weights.ncols();
    if norm_weight.len() != voxels || std_weight.len() != voxels {
        return Err(MapperError::DimensionMismatch(format!(
            "chunk weights have {} voxels per row but norm/std fields have {}/{}",
            voxels,
            norm_weight.len(),
            std_weight.len()
        )));
    }
    let norm_chunk_masks = chunk_weights * norm_weight;
    let std_chunk_masks = chunk_weights * std_weight;
    Ok((norm_chunk_masks, std_chunk_masks))
}

/// Compute each ROI's total contribution weight from this chunk.
///
/// Row-wise sum of the std-weighted chunk masks.
pub fn compute_network_weights(std_chunk_masks: &Array2<f64>) -> Array1<f64> {
    std_chunk_masks.sum_axis(Axis(1))
}

/// Compute the network map contributions from this chunk.
///
/// Single dense matrix product of the R x C mask matrix with the
/// C x brain_size chunk data. This is the dominant cost for large chunks and
/// deliberately stays one matmul rather than per-ROI loops.
pub fn compute_network_maps(
    std_chunk_masks: &Array2<f64>,
    chunk_data: &Array2<f64>,
) -> MapperResult<Array2<f64>> {
    if std_chunk_masks.ncols() != chunk_data.nrows() {
        return Err(MapperError::DimensionMismatch(format!(
            "mask matrix has {} columns but chunk data has {} rows",
            std_chunk_masks.ncols(),
            chunk_data.nrows()
        )));
    }
    Ok(std_chunk_masks.dot(chunk_data))
}

/// Compute each ROI's combo numerator contribution from this chunk.
///
/// Row-wise sum of the norm-weighted chunk masks.
pub fn compute_numerator(norm_chunk_masks: &Array2<f64>) -> Array1<f64> {
    norm_chunk_masks.sum_axis(Axis(1))
}

/// Compute one ROI's combo denominator contribution from this chunk.
///
/// Restricts `chunk_data` rows to the ROI's chunk-local support, weights them
/// by the chunk weights, then restricts columns to the whole-brain support
/// weighted by the brain weights, and sums everything. The reduction order is
/// fixed: chunk support selects data rows first, brain support selects data
/// columns second, because `chunk_data` is indexed
/// `[chunk-local row, whole-brain column]`.
pub fn compute_denominator(projection: &RoiProjection, chunk_data: ArrayView2<f64>) -> f64 {
    let mut total = 0.0_f64;
    for &row in &projection.chunk_support {
        let row_weight = projection.chunk_weights[row];
        let data_row = chunk_data.row(row);
        let mut inner = 0.0_f64;
        for &col in &projection.brain_support {
            inner += data_row[col] * projection.brain_weights[col];
        }
        total += row_weight * inner;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masking::support;
    use ndarray::array;
    use std::path::PathBuf;

    fn projection(brain_weights: Array1<f64>, chunk_weights: Array1<f64>) -> RoiProjection {
        let brain_support = support(&brain_weights);
        let chunk_support = support(&chunk_weights);
        RoiProjection {
            roi: PathBuf::from("roi.nii.gz"),
            brain_weights,
            chunk_weights,
            brain_support,
            chunk_support,
        }
    }

    #[test]
    fn chunk_masks_are_row_broadcast_products() {
        // Scenario: 2 ROIs, chunk_size = 4.
        let chunk_weights = array![[1.0, 0.0, 2.0, 0.0], [0.0, 1.0, 0.0, 1.0]];
        let norm_weight = array![1.0, 1.0, 1.0, 1.0];
        let std_weight = array![2.0, 2.0, 2.0, 2.0];

        let (norm_masks, std_masks) =
            compute_chunk_masks(&chunk_weights, &norm_weight, &std_weight).unwrap();

        assert_eq!(norm_masks, chunk_weights);
        assert_eq!(std_masks, array![[2.0, 0.0, 4.0, 0.0], [0.0, 2.0, 0.0, 2.0]]);
        assert_eq!(std_masks.dim(), (2, 4));
    }

    #[test]
    fn chunk_masks_reject_mismatched_fields() {
        let chunk_weights = array![[1.0, 0.0, 2.0, 0.0]];
        let short = array![1.0, 1.0];
        let std_weight = array![2.0, 2.0, 2.0, 2.0];
        let result = compute_chunk_masks(&chunk_weights, &short, &std_weight);
        assert!(matches!(result, Err(MapperError::DimensionMismatch(_))));
    }

    #[test]
    fn network_weights_are_row_sums() {
        let std_masks = array![[2.0, 0.0, 4.0, 0.0], [0.0, 2.0, 0.0, 2.0]];
        let weights = compute_network_weights(&std_masks);
        assert_eq!(weights, array![6.0, 4.0]);
    }

    #[test]
    fn network_maps_match_matrix_product() {
        let masks = array![[1.0, 2.0], [0.0, 3.0]];
        let data = array![[1.0, 0.0, 2.0], [0.5, 1.0, 0.0]];
        let maps = compute_network_maps(&masks, &data).unwrap();
        assert_eq!(maps, array![[2.0, 2.0, 2.0], [1.5, 3.0, 0.0]]);
    }

    #[test]
    fn network_maps_of_zero_masks_are_zero() {
        let masks = Array2::<f64>::zeros((3, 4));
        let data = array![
            [1.0, -2.0, 3.0],
            [4.0, 5.0, -6.0],
            [7.0, 8.0, 9.0],
            [-1.0, 0.5, 2.0]
        ];
        let maps = compute_network_maps(&masks, &data).unwrap();
        assert!(maps.iter().all(|v| *v == 0.0));
        assert_eq!(maps.dim(), (3, 3));
    }

    #[test]
    fn network_maps_reject_inner_dimension_mismatch() {
        let masks = Array2::<f64>::zeros((2, 5));
        let data = Array2::<f64>::zeros((4, 3));
        assert!(matches!(
            compute_network_maps(&masks, &data),
            Err(MapperError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn numerator_is_row_sum_of_norm_masks() {
        let norm_masks = array![[1.0, 0.0, 2.0, 0.0], [0.0, 1.0, 0.0, 1.0]];
        assert_eq!(compute_numerator(&norm_masks), array![3.0, 2.0]);
    }

    #[test]
    fn denominator_reduces_chunk_rows_then_brain_columns() {
        // chunk_size = 3 rows, brain_size = 2 columns.
        let chunk_data = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let proj = projection(array![0.5, 0.0], array![2.0, 0.0, 1.0]);

        // Rows 0 and 2 survive the chunk support, column 0 the brain support:
        // 2.0 * (1.0 * 0.5) + 1.0 * (5.0 * 0.5) = 3.5
        let denominator = compute_denominator(&proj, chunk_data.view());
        assert!((denominator - 3.5).abs() < 1e-12);
    }

    #[test]
    fn denominator_of_empty_support_is_zero() {
        let chunk_data = array![[1.0, 2.0], [3.0, 4.0]];
        let proj = projection(array![1.0, 1.0], Array1::zeros(2));
        assert_eq!(compute_denominator(&proj, chunk_data.view()), 0.0);
    }
}
