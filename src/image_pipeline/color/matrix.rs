//! 3x3 matrix helpers and calibration-matrix decomposition.
//!
//! The stored calibration matrix folds white balance and color correction
//! together. White balance must be applied to the CFA grid before demosaic
//! and color correction after it, so the two are separated here.

use tracing::warn;

use crate::image_pipeline::cine::Matrix3;
use crate::image_pipeline::color::config::MatrixNormalization;

pub const IDENTITY: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// White-balance diagonal and normalized color-correction matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decomposition {
    /// Per-channel gains, red/green/blue.
    pub white_balance: [f32; 3],
    pub color_matrix: Matrix3,
}

impl Decomposition {
    pub const IDENTITY: Decomposition =
        Decomposition { white_balance: [1.0; 3], color_matrix: IDENTITY };
}

/// `m * v`
#[inline]
pub fn mul_vec(m: &Matrix3, v: [f32; 3]) -> [f32; 3] {
    std::array::from_fn(|i| m[i][0] * v[0] + m[i][1] * v[1] + m[i][2] * v[2])
}

pub fn mul(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    std::array::from_fn(|i| std::array::from_fn(|j| (0..3).map(|k| a[i][k] * b[k][j]).sum()))
}

/// Inverse by cofactors, or `None` when the matrix is singular.
pub fn invert(m: &Matrix3) -> Option<Matrix3> {
    let a = m.map(|row| row.map(f64::from));
    let cof = |r0: usize, r1: usize, c0: usize, c1: usize| a[r0][c0] * a[r1][c1] - a[r0][c1] * a[r1][c0];

    let c00 = cof(1, 2, 1, 2);
    let c01 = -cof(1, 2, 0, 2);
    let c02 = cof(1, 2, 0, 1);
    let det = a[0][0] * c00 + a[0][1] * c01 + a[0][2] * c02;
    if !det.is_finite() || det.abs() < 1e-12 {
        return None;
    }

    let adj = [
        [c00, -cof(0, 2, 1, 2), cof(0, 1, 1, 2)],
        [c01, cof(0, 2, 0, 2), -cof(0, 1, 0, 2)],
        [c02, -cof(0, 2, 0, 1), cof(0, 1, 0, 1)],
    ];
    Some(adj.map(|row| row.map(|v| (v / det) as f32)))
}

/// Splits `calib` into a white-balance diagonal and a normalized color matrix.
///
/// `iwb = calib^-1 * [1, 1, 1]`, scaled so its largest entry is 1. The
/// white balance is `1 / iwb` per channel, with zero entries kept at 1, and
/// the color matrix is `calib * diag(iwb)` normalized per `normalization`.
/// A singular matrix, or one whose `iwb` has no positive entry, decomposes
/// to identity.
pub fn decompose_calibration_matrix(
    calib: &Matrix3,
    normalization: MatrixNormalization,
) -> Decomposition {
    let Some(inverse) = invert(calib) else {
        warn!(?calib, "calibration matrix is singular, skipping white balance and color correction");
        return Decomposition::IDENTITY;
    };

    let iwb = mul_vec(&inverse, [1.0; 3]);
    let peak = iwb.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !(peak > 0.0) || !peak.is_finite() {
        warn!(?iwb, "calibration matrix has no positive white point, skipping color correction");
        return Decomposition::IDENTITY;
    }
    let iwb = iwb.map(|v| v / peak);

    let white_balance = iwb.map(|v| if v == 0.0 { 1.0 } else { 1.0 / v });
    let scaled: Matrix3 = std::array::from_fn(|i| std::array::from_fn(|j| calib[i][j] * iwb[j]));

    let color_matrix = match normalization {
        MatrixNormalization::RowSum => row_sum_normalize(&scaled),
        MatrixNormalization::DiagonalResidual => diagonal_residual(&scaled),
    };

    Decomposition { white_balance, color_matrix }
}

fn row_sum_normalize(m: &Matrix3) -> Matrix3 {
    m.map(|row| {
        let sum: f32 = row.iter().sum();
        if sum == 0.0 { row } else { row.map(|v| v / sum) }
    })
}

fn diagonal_residual(m: &Matrix3) -> Matrix3 {
    let mut out = *m;
    for i in 0..3 {
        let off: f32 = (0..3).filter(|&j| j != i).map(|j| m[i][j]).sum();
        out[i][i] = 1.0 - off;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn test_identity_decomposes_to_identity() {
        for norm in [MatrixNormalization::RowSum, MatrixNormalization::DiagonalResidual] {
            let d = decompose_calibration_matrix(&IDENTITY, norm);
            assert_eq!(d.white_balance, [1.0; 3]);
            assert_close(d.color_matrix[0].iter().sum(), 1.0);
            assert_eq!(d.color_matrix, IDENTITY);
        }
    }

    #[test]
    fn test_pure_white_balance_matrix() {
        // diag(2, 1, 4): iwb = [0.5, 1, 0.25], so the gains come back exactly.
        let calib = [[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 4.0]];
        let d = decompose_calibration_matrix(&calib, MatrixNormalization::RowSum);
        assert_close(d.white_balance[0], 2.0);
        assert_close(d.white_balance[1], 1.0);
        assert_close(d.white_balance[2], 4.0);
        for i in 0..3 {
            for j in 0..3 {
                assert_close(d.color_matrix[i][j], IDENTITY[i][j]);
            }
        }
    }

    #[test]
    fn test_color_matrix_maps_white_to_white() {
        let calib = [[1.6, -0.4, 0.1], [-0.2, 1.3, -0.1], [0.05, -0.5, 1.9]];
        for norm in [MatrixNormalization::RowSum, MatrixNormalization::DiagonalResidual] {
            let d = decompose_calibration_matrix(&calib, norm);
            for row in d.color_matrix {
                assert_close(row.iter().sum(), 1.0);
            }
            // White balance undoes the calibration's effect on neutral input.
            let gray = mul_vec(&calib, [1.0 / d.white_balance[0], 1.0 / d.white_balance[1], 1.0 / d.white_balance[2]]);
            assert_close(gray[0], gray[1]);
            assert_close(gray[1], gray[2]);
        }
    }

    #[test]
    fn test_singular_matrix_falls_back_to_identity() {
        let zero = [[0.0; 3]; 3];
        assert_eq!(decompose_calibration_matrix(&zero, MatrixNormalization::RowSum), Decomposition::IDENTITY);
        let rank_one = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [1.0, 1.0, 1.0]];
        assert!(invert(&rank_one).is_none());
    }

    #[test]
    fn test_invert_round_trips() {
        let m = [[2.0, 1.0, 0.0], [0.0, 3.0, 1.0], [1.0, 0.0, 4.0]];
        let inv = invert(&m).unwrap();
        let p = mul(&m, &inv);
        for i in 0..3 {
            for j in 0..3 {
                assert_close(p[i][j], IDENTITY[i][j]);
            }
        }
    }
}
