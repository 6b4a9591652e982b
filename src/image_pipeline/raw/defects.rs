//! Hot-pixel correction on the CFA grid.

use tracing::debug;

use crate::image_pipeline::common::cfa::CfaPattern;

/// Replaces every sample above `threshold` with the median of the same-color
/// samples in its 3x3 neighborhood.
///
/// Neighbors are read from the uncorrected grid. On a Bayer sensor only green
/// sites have same-color neighbors that close, so red and blue outliers are
/// left as they are. Returns the number of samples replaced.
pub fn correct_defects(
    samples: &mut [u16],
    width: usize,
    height: usize,
    threshold: u16,
    pattern: CfaPattern,
) -> usize {
    let source = samples.to_vec();
    let mut fixed = 0;
    let mut neighbors = Vec::with_capacity(8);

    for row in 0..height {
        for col in 0..width {
            if source[row * width + col] <= threshold {
                continue;
            }
            neighbors.clear();
            for r in row.saturating_sub(1)..=(row + 1).min(height - 1) {
                for c in col.saturating_sub(1)..=(col + 1).min(width - 1) {
                    if (r, c) != (row, col) && pattern.same_channel((r, c), (row, col)) {
                        neighbors.push(source[r * width + c]);
                    }
                }
            }
            if let Some(m) = median(&mut neighbors) {
                samples[row * width + col] = m;
                fixed += 1;
            }
        }
    }

    if fixed > 0 {
        debug!(fixed, pattern = pattern.as_str(), "defective samples replaced");
    }
    fixed
}

fn median(values: &mut [u16]) -> Option<u16> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some(((values[mid - 1] as u32 + values[mid] as u32) / 2) as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_green_outlier_uses_diagonal_greens() {
        // RGGB 4x4; (1, 2) is a green site whose diagonal neighbors are green.
        let mut grid = vec![100u16; 16];
        grid[4 + 2] = 4000;
        grid[1] = 10;
        grid[3] = 20;
        grid[2 * 4 + 1] = 30;
        grid[2 * 4 + 3] = 40;
        let fixed = correct_defects(&mut grid, 4, 4, 3000, CfaPattern::Rggb);
        assert_eq!(fixed, 1);
        assert_eq!(grid[4 + 2], 25);
    }

    #[test]
    fn test_red_outlier_is_left_alone() {
        let mut grid = vec![100u16; 16];
        grid[2 * 4 + 2] = 4000;
        let fixed = correct_defects(&mut grid, 4, 4, 3000, CfaPattern::Rggb);
        assert_eq!(fixed, 0);
        assert_eq!(grid[2 * 4 + 2], 4000);
    }

    #[test]
    fn test_monochrome_uses_all_neighbors() {
        let mut grid: Vec<u16> = (0..9).collect();
        grid[4] = 1000;
        let fixed = correct_defects(&mut grid, 3, 3, 500, CfaPattern::Monochrome);
        assert_eq!(fixed, 1);
        // Neighbors 0,1,2,3,5,6,7,8 -> (3 + 5) / 2.
        assert_eq!(grid[4], 4);
    }

    #[test]
    fn test_values_at_threshold_are_kept() {
        let mut grid = vec![3000u16; 9];
        assert_eq!(correct_defects(&mut grid, 3, 3, 3000, CfaPattern::Monochrome), 0);
    }
}
