//! Silhouette rasterization, tinting and occupancy masks.
//!
//! Every call allocates its own scratch pixmap. A zero-size canvas produces
//! `None` instead of a pixmap, and callers skip drawing.

use tiny_skia::{
    BlendMode, FillRule, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

use crate::animation::CelebrationFrame;
use crate::constants::MASK_ALPHA_THRESHOLD;
use crate::error::{PuzzleError, Result};
use crate::geometry::piece_outline;
use crate::grid::Grid;
use crate::models::{Piece, PieceId, Point};
use crate::theme::{Rgba, ThemeProvider};

/// Binary per-pixel occupancy grid, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    pub bits: Vec<bool>,
}

impl Mask {
    pub fn empty(width: u32, height: u32) -> Self {
        Mask {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.bits[(y * self.width + x) as usize]
    }

    pub fn filled_count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Share of pixels whose occupancy differs. Zero-size masks compare
    /// as identical.
    pub fn mismatch_ratio(&self, other: &Mask) -> Result<f64> {
        if (self.width, self.height) != (other.width, other.height) {
            return Err(PuzzleError::MaskSizeMismatch {
                left: (self.width, self.height),
                right: (other.width, other.height),
            });
        }
        if self.bits.is_empty() {
            return Ok(0.0);
        }
        let mismatched = self
            .bits
            .iter()
            .zip(&other.bits)
            .filter(|(a, b)| a != b)
            .count();
        Ok(mismatched as f64 / self.bits.len() as f64)
    }
}

/// One path holding every piece outline, in board pixels.
pub fn silhouette_path(pieces: &[Piece], grid: &Grid) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for piece in pieces {
        let outline = piece_outline(piece, grid);
        let Some((first, rest)) = outline.split_first() else {
            continue;
        };
        pb.move_to(first.x as f32, first.y as f32);
        for p in rest {
            pb.line_to(p.x as f32, p.y as f32);
        }
        pb.close();
    }
    pb.finish()
}

fn new_pixmap(grid: &Grid) -> Option<Pixmap> {
    if grid.canvas.is_empty() {
        tracing::debug!("zero-size canvas, skipping render");
        return None;
    }
    Pixmap::new(grid.canvas.width, grid.canvas.height)
}

/// Black even-odd silhouette of `pieces` on a transparent pixmap.
///
/// Overlapping areas cancel out and show as holes.
pub fn rasterize_silhouette(pieces: &[Piece], grid: &Grid, anti_alias: bool) -> Option<Pixmap> {
    let mut pixmap = new_pixmap(grid)?;
    if let Some(path) = silhouette_path(pieces, grid) {
        let mut paint = Paint::default();
        paint.set_color(tiny_skia::Color::BLACK);
        paint.anti_alias = anti_alias;
        pixmap.fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);
    }
    Some(pixmap)
}

/// Recolour a silhouette, keeping its exact alpha.
pub fn tint(silhouette: &Pixmap, color: Rgba) -> Pixmap {
    let mut out = silhouette.clone();
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.blend_mode = BlendMode::SourceIn;
    if let Some(rect) = Rect::from_xywh(0.0, 0.0, out.width() as f32, out.height() as f32) {
        out.fill_rect(rect, &paint, Transform::identity(), None);
    }
    out
}

pub fn mask_from_pixmap(pixmap: &Pixmap) -> Mask {
    Mask {
        width: pixmap.width(),
        height: pixmap.height(),
        bits: pixmap
            .pixels()
            .iter()
            .map(|px| px.alpha() > MASK_ALPHA_THRESHOLD)
            .collect(),
    }
}

/// Occupancy mask of `pieces`. Aliasing is off so the result only depends
/// on geometry. A zero-size canvas yields an empty mask.
pub fn rasterize_mask(pieces: &[Piece], grid: &Grid) -> Mask {
    match rasterize_silhouette(pieces, grid, false) {
        Some(pixmap) => mask_from_pixmap(&pixmap),
        None => Mask::empty(0, 0),
    }
}

/// `true` when at most `tolerance` of the pixels differ.
pub fn compare_masks(a: &Mask, b: &Mask, tolerance: f64) -> Result<bool> {
    Ok(a.mismatch_ratio(b)? <= tolerance)
}

fn draw_layer(target: &mut Pixmap, layer: &Pixmap, opacity: f32) {
    let paint = PixmapPaint {
        opacity: opacity.clamp(0.0, 1.0),
        ..PixmapPaint::default()
    };
    target.draw_pixmap(0, 0, layer.as_ref(), &paint, Transform::identity(), None);
}

/// Tinted silhouette of `pieces` composited onto `target`.
pub fn draw_silhouette(
    target: &mut Pixmap,
    pieces: &[Piece],
    grid: &Grid,
    color: Rgba,
    opacity: f32,
) {
    if pieces.is_empty() || opacity <= 0.0 {
        return;
    }
    if let Some(sil) = rasterize_silhouette(pieces, grid, true) {
        draw_layer(target, &tint(&sil, color), opacity);
    }
}

/// Inner visual-grid lines.
pub fn draw_grid_lines(target: &mut Pixmap, grid: &Grid, color: Rgba, width: f32, blend: BlendMode) {
    let mut pb = PathBuilder::new();
    let (w, h) = (grid.width() as f32, grid.height() as f32);
    let (cw, ch) = (grid.visual_cell_width() as f32, grid.visual_cell_height() as f32);
    for i in 1..grid.visual {
        let x = i as f32 * cw;
        let y = i as f32 * ch;
        pb.move_to(x, 0.0);
        pb.line_to(x, h);
        pb.move_to(0.0, y);
        pb.line_to(w, y);
    }
    let Some(path) = pb.finish() else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.blend_mode = blend;
    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    target.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

pub fn draw_outline(target: &mut Pixmap, piece: &Piece, grid: &Grid, color: Rgba, width: f32) {
    let Some(path) = silhouette_path(std::slice::from_ref(piece), grid) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    target.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// Rubber-band rectangle between two corners.
pub fn draw_rect_outline(target: &mut Pixmap, a: Point, b: Point, color: Rgba, width: f32) {
    let (x0, x1) = (a.x.min(b.x) as f32, a.x.max(b.x) as f32);
    let (y0, y1) = (a.y.min(b.y) as f32, a.y.max(b.y) as f32);
    let Some(rect) = Rect::from_ltrb(x0, y0, x1, y1) else {
        return;
    };
    let path = PathBuilder::from_rect(rect);
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    target.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// What a board frame shows besides the grid.
#[derive(Clone, Debug)]
pub struct BoardLayers<'a> {
    /// Reference arrangement drawn faintly under the pieces.
    pub guide: Option<&'a [Piece]>,
    pub guide_opacity: f32,
    pub piece_opacity: f32,
    /// Pieces that get an outline (hovered, dragged or selected).
    pub outlined: &'a [PieceId],
    /// Outline width in CSS pixels.
    pub outline_width: f32,
    /// Grid line width in CSS pixels.
    pub grid_line_width: f32,
}

impl Default for BoardLayers<'_> {
    fn default() -> Self {
        BoardLayers {
            guide: None,
            guide_opacity: crate::constants::GUIDE_OPACITY,
            piece_opacity: 1.0,
            outlined: &[],
            outline_width: crate::constants::OUTLINE_WIDTH,
            grid_line_width: crate::constants::GRID_LINE_WIDTH,
        }
    }
}

/// Full board frame: grid lines, optional guide, tinted pieces, outlines.
pub fn render_board(
    grid: &Grid,
    pieces: &[Piece],
    layers: &BoardLayers<'_>,
    theme: &dyn ThemeProvider,
) -> Option<Pixmap> {
    let mut pixmap = new_pixmap(grid)?;
    let dpr = grid.device_pixel_ratio as f32;
    draw_grid_lines(
        &mut pixmap,
        grid,
        theme.grid_line(),
        layers.grid_line_width * dpr,
        BlendMode::SourceOver,
    );
    if let Some(guide) = layers.guide {
        draw_silhouette(&mut pixmap, guide, grid, theme.accent(), layers.guide_opacity);
    }
    draw_silhouette(&mut pixmap, pieces, grid, theme.accent(), layers.piece_opacity);
    for id in layers.outlined {
        if let Some(piece) = pieces.iter().find(|p| p.id == *id) {
            draw_outline(&mut pixmap, piece, grid, theme.hover(), layers.outline_width * dpr);
        }
    }
    Some(pixmap)
}

/// Reference board: grid plus the solution silhouette at full strength.
pub fn render_reference(grid: &Grid, solution: &[Piece], theme: &dyn ThemeProvider) -> Option<Pixmap> {
    render_board(grid, solution, &BoardLayers::default(), theme)
}

/// One frame of the solve celebration on top of the fading pieces.
pub fn render_celebration(
    grid: &Grid,
    pieces: &[Piece],
    frame: &CelebrationFrame,
    theme: &dyn ThemeProvider,
) -> Option<Pixmap> {
    let layers = BoardLayers {
        piece_opacity: frame.piece_opacity as f32,
        ..BoardLayers::default()
    };
    let mut pixmap = render_board(grid, pieces, &layers, theme)?;
    let (cw, ch) = (grid.visual_cell_width(), grid.visual_cell_height());
    let mut paint = Paint::default();
    paint.set_color(theme.accent().to_skia());
    for cell in &frame.cells {
        if cell.scale <= 0.0 {
            continue;
        }
        let (w, h) = (cw * cell.scale, ch * cell.scale);
        let x = cell.col as f64 * cw + (cw - w) / 2.0;
        let y = cell.row as f64 * ch + (ch - h) / 2.0;
        if let Some(rect) = Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }
    if frame.glow > 0.0 {
        let width = (2.0 * frame.glow * grid.device_pixel_ratio) as f32;
        draw_grid_lines(&mut pixmap, grid, theme.accent(), width, BlendMode::Screen);
    }
    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::grid::CanvasSize;
    use crate::models::{Rotation, Shape};
    use crate::theme::Theme;

    fn grid() -> Grid {
        Grid::new(CanvasSize::square(160), &EngineConfig::default())
    }

    fn piece(id: u64, shape: Shape, col: i32, row: i32) -> Piece {
        let mut p = Piece::new(PieceId(id), shape, col, row);
        grid().update_piece(&mut p);
        p
    }

    #[test]
    fn square_fills_its_footprint() {
        // 2x2 visual cells on a 160px board = 40x40 px
        let mask = rasterize_mask(&[piece(0, Shape::Square, 0, 0)], &grid());
        assert_eq!(mask.filled_count(), 40 * 40);
        assert!(mask.get(0, 0));
        assert!(!mask.get(40, 40));
    }

    #[test]
    fn overlaps_cancel_under_even_odd() {
        let g = grid();
        let a = piece(0, Shape::Square, 0, 0);
        let b = piece(1, Shape::Square, 2, 0); // shifted by 20px
        let mask = rasterize_mask(&[a, b], &g);
        assert!(mask.get(5, 5));
        assert!(!mask.get(30, 5));
        assert!(mask.get(50, 5));
    }

    #[test]
    fn mask_ignores_tint_colour() {
        let g = grid();
        let pieces = [piece(0, Shape::Triangle, 3, 3)];
        let sil = rasterize_silhouette(&pieces, &g, false).unwrap();
        let red = mask_from_pixmap(&tint(&sil, Rgba::rgb(255, 0, 0)));
        let blue = mask_from_pixmap(&tint(&sil, Rgba::rgb(0, 0, 255)));
        assert_eq!(red, blue);
        assert_eq!(red, mask_from_pixmap(&sil));
    }

    #[test]
    fn unknown_shape_rasterizes_as_rectangle() {
        let g = grid();
        let hex = rasterize_mask(&[piece(0, Shape::Unknown("hexagon".into()), 4, 4)], &g);
        let square = rasterize_mask(&[piece(0, Shape::Square, 4, 4)], &g);
        assert_eq!(hex, square);
    }

    #[test]
    fn compare_masks_honours_tolerance() {
        let mut a = Mask::empty(10, 10);
        let b = Mask::empty(10, 10);
        a.bits[0] = true;
        assert!(compare_masks(&a, &b, 0.01).unwrap());
        assert!(!compare_masks(&a, &b, 0.005).unwrap());
        assert!(compare_masks(&a, &Mask::empty(5, 5), 1.0).is_err());
    }

    #[test]
    fn zero_canvas_skips_rendering() {
        let g = Grid::new(CanvasSize::default(), &EngineConfig::default());
        let p = Piece::new(PieceId(0), Shape::Square, 0, 0).with_rotation(Rotation::R90);
        assert!(render_board(&g, &[p.clone()], &BoardLayers::default(), &Theme::default()).is_none());
        assert_eq!(rasterize_mask(&[p], &g).bits.len(), 0);
    }

    #[test]
    fn board_draws_pieces_in_accent() {
        let g = grid();
        let theme = Theme::default();
        let pm = render_board(&g, &[piece(0, Shape::Square, 0, 0)], &BoardLayers::default(), &theme)
            .unwrap();
        let px = pm.pixel(5, 5).unwrap();
        assert_eq!(px.alpha(), 255);
        assert!(px.red().abs_diff(theme.accent.r) <= 1);
        assert!(px.green().abs_diff(theme.accent.g) <= 1);
        assert!(px.blue().abs_diff(theme.accent.b) <= 1);
        assert_eq!(pm.pixel(110, 110).unwrap().alpha(), 0);
    }
}
