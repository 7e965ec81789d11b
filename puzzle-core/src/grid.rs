use crate::config::EngineConfig;
use crate::models::{Piece, Point};

/// Backing-store size of a board, in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        CanvasSize { width, height }
    }

    pub const fn square(side: u32) -> Self {
        CanvasSize {
            width: side,
            height: side,
        }
    }

    /// Container not laid out yet.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Square backing store for a container `css_width` CSS pixels wide.
    ///
    /// The CSS size is floored to a multiple of `cols` before scaling so
    /// every grid cell spans a whole number of pixels.
    pub fn fit_container(css_width: f64, device_pixel_ratio: f64, cols: u32) -> Self {
        if !css_width.is_finite() || css_width <= 0.0 || cols == 0 {
            return CanvasSize::default();
        }
        let cols = cols as f64;
        let adjusted = (css_width / cols).floor() * cols;
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        CanvasSize::square((adjusted * dpr).floor() as u32)
    }
}

/// JS-style rounding: halves go towards positive infinity.
pub fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

/// Placement grid of one board plus its pixel conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub canvas: CanvasSize,
    pub cols: u32,
    pub rows: u32,
    pub visual: u32,
    pub device_pixel_ratio: f64,
}

impl Grid {
    pub fn new(canvas: CanvasSize, cfg: &EngineConfig) -> Self {
        Grid {
            canvas,
            cols: cfg.grid_cols,
            rows: cfg.grid_rows,
            visual: cfg.visual_grid_size,
            device_pixel_ratio: 1.0,
        }
    }

    pub fn with_device_pixel_ratio(mut self, dpr: f64) -> Self {
        self.device_pixel_ratio = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self
    }

    pub fn width(&self) -> f64 {
        self.canvas.width as f64
    }

    pub fn height(&self) -> f64 {
        self.canvas.height as f64
    }

    pub fn cell_width(&self) -> f64 {
        self.width() / self.cols as f64
    }

    pub fn cell_height(&self) -> f64 {
        self.height() / self.rows as f64
    }

    pub fn visual_cell_width(&self) -> f64 {
        self.width() / self.visual as f64
    }

    pub fn visual_cell_height(&self) -> f64 {
        self.height() / self.visual as f64
    }

    /// Top-left pixel of a grid cell.
    pub fn cell_origin(&self, col: i32, row: i32) -> Point {
        Point {
            x: col as f64 * self.cell_width(),
            y: row as f64 * self.cell_height(),
        }
    }

    /// Cell whose origin is nearest to a pixel position.
    pub fn nearest_cell(&self, x: f64, y: f64) -> (i32, i32) {
        if self.canvas.is_empty() {
            return (0, 0);
        }
        (
            round_half_up(x / self.cell_width()),
            round_half_up(y / self.cell_height()),
        )
    }

    /// Pixel footprint of a `grid_width` × `grid_height` piece.
    pub fn footprint(&self, grid_width: f64, grid_height: f64) -> (f64, f64) {
        (
            grid_width * self.visual_cell_width(),
            grid_height * self.visual_cell_height(),
        )
    }

    /// Refresh the pixel cache of a piece from its grid fields.
    pub fn update_piece(&self, piece: &mut Piece) {
        let origin = self.cell_origin(piece.col, piece.row);
        let (w, h) = self.footprint(piece.grid_width, piece.grid_height);
        piece.x = origin.x;
        piece.y = origin.y;
        piece.width = w;
        piece.height = h;
    }

    pub fn update_pieces(&self, pieces: &mut [Piece]) {
        for p in pieces {
            self.update_piece(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PieceId, Rotation, Shape};

    fn grid(side: u32) -> Grid {
        Grid::new(CanvasSize::square(side), &EngineConfig::default())
    }

    #[test]
    fn container_is_floored_to_whole_cells() {
        assert_eq!(CanvasSize::fit_container(500.0, 1.0, 16), CanvasSize::square(496));
        assert_eq!(CanvasSize::fit_container(500.0, 2.0, 16), CanvasSize::square(992));
        assert!(CanvasSize::fit_container(0.0, 2.0, 16).is_empty());
        assert!(CanvasSize::fit_container(10.0, 1.0, 16).is_empty());
    }

    #[test]
    fn pixel_cache_from_grid_fields() {
        let g = grid(640);
        let mut p = Piece::new(PieceId(0), Shape::Triangle, 3, 5);
        g.update_piece(&mut p);
        assert_eq!((p.x, p.y), (120.0, 200.0));
        assert_eq!((p.width, p.height), (160.0, 80.0));
    }

    #[test]
    fn recompute_is_idempotent() {
        let g = grid(992);
        let mut p = Piece::new(PieceId(1), Shape::TrapezoidLeft, 7, 2)
            .with_size(3.0, 4.5)
            .with_rotation(Rotation::R270);
        g.update_piece(&mut p);
        let first = (p.x, p.y, p.width, p.height);
        g.update_piece(&mut p);
        assert_eq!(first, (p.x, p.y, p.width, p.height));
    }

    #[test]
    fn nearest_cell_rounds_half_up() {
        let g = grid(160);
        assert_eq!(g.nearest_cell(15.0, 14.9), (2, 1));
        assert_eq!(g.nearest_cell(-5.0, -5.1), (0, -1));
    }

    #[test]
    fn empty_canvas_never_divides_by_zero() {
        let g = grid(0);
        assert_eq!(g.nearest_cell(50.0, 50.0), (0, 0));
        let mut p = Piece::new(PieceId(0), Shape::Square, 2, 2);
        g.update_piece(&mut p);
        assert_eq!((p.x, p.width), (0.0, 0.0));
    }
}
