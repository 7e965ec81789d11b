//! Solved-state detection.

use crate::config::EngineConfig;
use crate::grid::Grid;
use crate::models::{Piece, Placement};
use crate::raster::{compare_masks, rasterize_mask};

/// Decides whether an arrangement is solved.
pub trait CompletionChecker {
    fn is_solved(&self, pieces: &[Piece], grid: &Grid) -> bool;
}

/// Placements sorted by `row * cols + col`, then rotation.
pub fn canonical_placements(pieces: &[Piece], cols: u32) -> Vec<Placement> {
    let mut out: Vec<Placement> = pieces.iter().map(Piece::placement).collect();
    let cols = cols as i64;
    out.sort_by_key(|p| (p.row as i64 * cols + p.col as i64, p.rotation));
    out
}

/// Exact multiset match of `(col, row, rotation)` against any candidate
/// solution.
#[derive(Clone, Debug, PartialEq)]
pub struct StrictChecker {
    cols: u32,
    solutions: Vec<Vec<Placement>>,
}

impl StrictChecker {
    pub fn new(solutions: &[Vec<Piece>], cfg: &EngineConfig) -> Self {
        StrictChecker {
            cols: cfg.grid_cols,
            solutions: solutions
                .iter()
                .map(|s| canonical_placements(s, cfg.grid_cols))
                .collect(),
        }
    }

    pub fn matches(&self, pieces: &[Piece]) -> bool {
        let mut current: Option<Vec<Placement>> = None;
        for solution in &self.solutions {
            if solution.len() != pieces.len() {
                continue;
            }
            let current = current.get_or_insert_with(|| canonical_placements(pieces, self.cols));
            if *current == *solution {
                return true;
            }
        }
        false
    }
}

impl CompletionChecker for StrictChecker {
    fn is_solved(&self, pieces: &[Piece], _grid: &Grid) -> bool {
        self.matches(pieces)
    }
}

/// Pixel-mask comparison against one reference arrangement.
///
/// Accepts when the mismatched share of pixels is within `tolerance`. A
/// zero-size board never matches.
#[derive(Clone, Debug, PartialEq)]
pub struct TolerantChecker {
    reference: Vec<Piece>,
    tolerance: f64,
}

impl TolerantChecker {
    pub fn new(reference: &[Piece], tolerance: f64) -> Self {
        TolerantChecker {
            reference: reference.to_vec(),
            tolerance,
        }
    }

    pub fn from_config(reference: &[Piece], cfg: &EngineConfig) -> Self {
        Self::new(reference, cfg.mask_tolerance)
    }
}

impl CompletionChecker for TolerantChecker {
    fn is_solved(&self, pieces: &[Piece], grid: &Grid) -> bool {
        if grid.canvas.is_empty() {
            return false;
        }
        let mut reference = self.reference.clone();
        grid.update_pieces(&mut reference);
        let current = rasterize_mask(pieces, grid);
        let expected = rasterize_mask(&reference, grid);
        match compare_masks(&current, &expected, self.tolerance) {
            Ok(same) => same,
            Err(err) => {
                tracing::warn!(%err, "mask comparison skipped");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CanvasSize;
    use crate::models::{PieceId, Rotation, Shape};

    fn p(col: i32, row: i32, rot: Rotation) -> Piece {
        Piece::new(PieceId(0), Shape::Square, col, row).with_rotation(rot)
    }

    fn grid() -> Grid {
        Grid::new(CanvasSize::square(320), &EngineConfig::default())
    }

    #[test]
    fn canonical_order_uses_row_major_key() {
        let sorted = canonical_placements(
            &[p(1, 1, Rotation::R0), p(15, 0, Rotation::R0), p(1, 1, Rotation::R0.clockwise())],
            16,
        );
        let keys: Vec<_> = sorted.iter().map(|s| (s.col, s.row, s.rotation)).collect();
        assert_eq!(keys, vec![(15, 0, 0), (1, 1, 0), (1, 1, 90)]);
    }

    #[test]
    fn any_candidate_solution_matches() {
        let cfg = EngineConfig::default();
        let a = vec![p(0, 0, Rotation::R0)];
        let b = vec![p(4, 4, Rotation::R180)];
        let checker = StrictChecker::new(&[a, b], &cfg);
        assert!(checker.matches(&[p(4, 4, Rotation::R180)]));
        assert!(!checker.matches(&[p(4, 4, Rotation::R0)]));
    }

    #[test]
    fn count_mismatch_short_circuits() {
        let cfg = EngineConfig::default();
        let checker = StrictChecker::new(&[vec![p(0, 0, Rotation::R0)]], &cfg);
        assert!(!checker.matches(&[p(0, 0, Rotation::R0), p(0, 0, Rotation::R0)]));
        assert!(!checker.matches(&[]));
    }

    #[test]
    fn tolerant_checker_ignores_identity() {
        let g = grid();
        // two squares side by side vs. the same cells covered in the other order
        let mut current = vec![p(0, 0, Rotation::R0), p(4, 0, Rotation::R0)];
        current[1].id = PieceId(1);
        g.update_pieces(&mut current);
        let reference = vec![p(4, 0, Rotation::R0), p(0, 0, Rotation::R0)];
        let checker = TolerantChecker::new(&reference, 0.005);
        assert!(checker.is_solved(&current, &g));

        let mut off = vec![p(0, 2, Rotation::R0), p(4, 0, Rotation::R0)];
        g.update_pieces(&mut off);
        assert!(!checker.is_solved(&off, &g));
    }

    #[test]
    fn tolerant_checker_accepts_symmetric_rotation() {
        let g = grid();
        let mut current = vec![p(2, 2, Rotation::R90)];
        g.update_pieces(&mut current);
        let checker = TolerantChecker::new(&[p(2, 2, Rotation::R0)], 0.005);
        assert!(checker.is_solved(&current, &g));
        assert!(!StrictChecker::new(&[vec![p(2, 2, Rotation::R0)]], &EngineConfig::default())
            .is_solved(&current, &g));
    }
}
