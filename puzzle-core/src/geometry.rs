//! Per-shape polygons, rotated bounding boxes, hit-testing and clamping.
//!
//! Local polygons are centred on the origin with `y` growing downwards, the
//! same convention as the board's pixel space. Rotations are clockwise.

use geo::{BoundingRect, Intersects};
use geo_types::{LineString, Polygon};

use crate::grid::Grid;
use crate::models::{Piece, Point, Rotation, Shape};

const EDGE_EPS: f64 = 1e-9;

/// Unrotated vertices of a `w` × `h` shape centred on the origin.
/// Unknown shapes use the rectangle.
pub fn local_vertices(shape: &Shape, w: f64, h: f64) -> Vec<Point> {
    let (hw, hh) = (w / 2.0, h / 2.0);
    let pts: &[(f64, f64)] = match shape {
        Shape::Triangle => &[(0.0, -hh), (hw, hh), (-hw, hh)],
        Shape::RightTriangle => &[(-hw, -hh), (hw, hh), (-hw, hh)],
        Shape::Diamond => &[(0.0, -hh), (hw, 0.0), (0.0, hh), (-hw, 0.0)],
        Shape::TrapezoidLeft => &[(-hw, -h / 6.0), (0.0, -hh), (hw, -h / 6.0), (-hw, hh)],
        Shape::TrapezoidRight => &[(-hw, -h / 6.0), (0.0, -hh), (hw, -h / 6.0), (hw, hh)],
        Shape::Square | Shape::Unknown(_) => &[(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)],
    };
    pts.iter().copied().map(Point::from).collect()
}

/// Rotate a point about the origin.
pub fn rotate_point(p: Point, rotation: Rotation) -> Point {
    let (c, s) = rotation.cos_sin();
    Point {
        x: p.x * c - p.y * s,
        y: p.x * s + p.y * c,
    }
}

pub fn rotated_vertices(shape: &Shape, w: f64, h: f64, rotation: Rotation) -> Vec<Point> {
    local_vertices(shape, w, h)
        .into_iter()
        .map(|p| rotate_point(p, rotation))
        .collect()
}

/// Shift applied to the pixel anchor of a resized piece turned sideways.
///
/// A fractional footprint rotated by a quarter turn would otherwise sit
/// half a cell off the grid.
pub fn half_cell_correction(piece: &Piece, grid: &Grid) -> (f64, f64) {
    if piece.has_fractional_size() && piece.rotation.is_sideways() {
        (-grid.cell_width() * 0.5, -grid.cell_height() * 0.5)
    } else {
        (0.0, 0.0)
    }
}

/// Centre of the piece as drawn, for a given top-left pixel anchor.
pub fn drawn_center_at(piece: &Piece, grid: &Grid, x: f64, y: f64) -> Point {
    let (dx, dy) = half_cell_correction(piece, grid);
    Point {
        x: x + dx + piece.width / 2.0,
        y: y + dy + piece.height / 2.0,
    }
}

pub fn drawn_center(piece: &Piece, grid: &Grid) -> Point {
    drawn_center_at(piece, grid, piece.x, piece.y)
}

/// Closed outline of the piece in board pixels, as drawn and hit-tested.
pub fn piece_outline(piece: &Piece, grid: &Grid) -> Vec<Point> {
    let c = drawn_center(piece, grid);
    rotated_vertices(&piece.shape, piece.width, piece.height, piece.rotation)
        .into_iter()
        .map(|p| Point {
            x: p.x + c.x,
            y: p.y + c.y,
        })
        .collect()
}

fn to_line_string(pts: &[Point]) -> LineString<f64> {
    LineString::from(pts.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>())
}

pub fn piece_polygon(piece: &Piece, grid: &Grid) -> Polygon<f64> {
    Polygon::new(to_line_string(&piece_outline(piece, grid)), vec![])
}

/// Axis-aligned box of the rotated polygon, relative to the piece centre.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
}

pub fn rotated_bounding_box(piece: &Piece) -> BoundingBox {
    let verts = rotated_vertices(&piece.shape, piece.width, piece.height, piece.rotation);
    match to_line_string(&verts).bounding_rect() {
        Some(rect) => BoundingBox {
            offset_x: rect.min().x,
            offset_y: rect.min().y,
            width: rect.width(),
            height: rect.height(),
        },
        None => BoundingBox::default(),
    }
}

/// Boundary-inclusive point-in-piece test in board pixels.
pub fn hit_test(piece: &Piece, grid: &Grid, x: f64, y: f64) -> bool {
    if grid.canvas.is_empty() || piece.width <= 0.0 || piece.height <= 0.0 {
        return false;
    }
    piece_polygon(piece, grid).intersects(&geo_types::Point::new(x, y))
}

/// Index of the foreground-most piece under a point. Later pieces win.
pub fn topmost_at(pieces: &[Piece], grid: &Grid, x: f64, y: f64) -> Option<usize> {
    (0..pieces.len())
        .rev()
        .find(|&i| hit_test(&pieces[i], grid, x, y))
}

/// Clamp a proposed top-left anchor so the drawn, rotated silhouette stays
/// inside the canvas. The centre is clamped, not the corner.
pub fn clamp_position(piece: &Piece, grid: &Grid, x: f64, y: f64) -> Point {
    clamp_position_inset(piece, grid, x, y, Point::default())
}

/// [`clamp_position`] against the canvas shrunk by `inset` on every side.
pub fn clamp_position_inset(piece: &Piece, grid: &Grid, x: f64, y: f64, inset: Point) -> Point {
    let bbox = rotated_bounding_box(piece);
    let (dx, dy) = half_cell_correction(piece, grid);
    let c = drawn_center_at(piece, grid, x, y);

    let min_cx = -bbox.offset_x + inset.x;
    let max_cx = grid.width() - (bbox.width + bbox.offset_x) - inset.x;
    let min_cy = -bbox.offset_y + inset.y;
    let max_cy = grid.height() - (bbox.height + bbox.offset_y) - inset.y;

    // min wins when the piece is larger than the canvas
    let cx = c.x.min(max_cx).max(min_cx);
    let cy = c.y.min(max_cy).max(min_cy);

    Point {
        x: cx - piece.width / 2.0 - dx,
        y: cy - piece.height / 2.0 - dy,
    }
}

/// Drawn bounding box of the piece anchored at `(x, y)`, in board pixels:
/// `(left, top, right, bottom)`.
pub fn drawn_bounds_at(piece: &Piece, grid: &Grid, x: f64, y: f64) -> (f64, f64, f64, f64) {
    let bbox = rotated_bounding_box(piece);
    let c = drawn_center_at(piece, grid, x, y);
    let left = c.x + bbox.offset_x;
    let top = c.y + bbox.offset_y;
    (left, top, left + bbox.width, top + bbox.height)
}

pub fn fits_canvas_at(piece: &Piece, grid: &Grid, x: f64, y: f64) -> bool {
    fits_inset_at(piece, grid, x, y, Point::default())
}

pub fn fits_inset_at(piece: &Piece, grid: &Grid, x: f64, y: f64, inset: Point) -> bool {
    let (l, t, r, b) = drawn_bounds_at(piece, grid, x, y);
    l >= inset.x - EDGE_EPS
        && t >= inset.y - EDGE_EPS
        && r <= grid.width() - inset.x + EDGE_EPS
        && b <= grid.height() - inset.y + EDGE_EPS
}

/// Grid cell a piece released at pixel anchor `(x, y)` settles into.
///
/// The anchor is clamped, rounded to the nearest cell, then moved inward by
/// whole cells if rounding pushed the silhouette past an edge.
pub fn snap_cell(piece: &Piece, grid: &Grid, x: f64, y: f64) -> (i32, i32) {
    snap_cell_inset(piece, grid, x, y, Point::default())
}

pub fn snap_cell_inset(piece: &Piece, grid: &Grid, x: f64, y: f64, inset: Point) -> (i32, i32) {
    if grid.canvas.is_empty() {
        return piece.cell();
    }
    let clamped = clamp_position_inset(piece, grid, x, y, inset);
    let (mut col, mut row) = grid.nearest_cell(clamped.x, clamped.y);

    let (cw, ch) = (grid.cell_width(), grid.cell_height());
    let (max_x, max_y) = (grid.width() - inset.x, grid.height() - inset.y);
    let origin = grid.cell_origin(col, row);
    let (_, _, r, b) = drawn_bounds_at(piece, grid, origin.x, origin.y);
    if r > max_x + EDGE_EPS {
        col -= ((r - max_x) / cw).ceil() as i32;
    }
    if b > max_y + EDGE_EPS {
        row -= ((b - max_y) / ch).ceil() as i32;
    }
    // left/top last: they win for pieces larger than the board
    let origin = grid.cell_origin(col, row);
    let (l, t, _, _) = drawn_bounds_at(piece, grid, origin.x, origin.y);
    if l < inset.x - EDGE_EPS {
        col += ((inset.x - l) / cw).ceil() as i32;
    }
    if t < inset.y - EDGE_EPS {
        row += ((inset.y - t) / ch).ceil() as i32;
    }
    tracing::trace!(col, row, "snap target");
    (col, row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::grid::CanvasSize;
    use crate::models::PieceId;

    const SHAPES: [Shape; 6] = Shape::ALL;
    const ROTATIONS: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    fn grid() -> Grid {
        Grid::new(CanvasSize::square(640), &EngineConfig::default())
    }

    fn placed(shape: Shape, col: i32, row: i32, rot: Rotation) -> Piece {
        let mut p = Piece::new(PieceId(0), shape, col, row).with_rotation(rot);
        grid().update_piece(&mut p);
        p
    }

    #[test]
    fn triangle_points_up() {
        let v = local_vertices(&Shape::Triangle, 4.0, 2.0);
        assert_eq!(v[0], Point::new(0.0, -1.0));
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn rotation_is_clockwise_in_pixel_space() {
        let p = rotate_point(Point::new(1.0, 0.0), Rotation::R90);
        assert_eq!(p, Point::new(0.0, 1.0));
    }

    #[test]
    fn bounding_box_swaps_sides_when_sideways() {
        let p = placed(Shape::Triangle, 0, 0, Rotation::R90);
        let bb = rotated_bounding_box(&p);
        assert_eq!((bb.width, bb.height), (p.height, p.width));
        assert_eq!(bb.offset_x, -p.height / 2.0);
    }

    #[test]
    fn trapezoid_box_uses_true_silhouette() {
        let p = placed(Shape::TrapezoidRight, 0, 0, Rotation::R0);
        let bb = rotated_bounding_box(&p);
        assert_eq!(bb.offset_y, -p.height / 2.0);
        assert_eq!(bb.height, p.height);
        assert_eq!(bb.width, p.width);
    }

    #[test]
    fn hit_test_follows_the_polygon_not_the_box() {
        // triangle 2x1 visual cells at (0,0): 160x80 px, apex at (80, 0)
        let p = placed(Shape::Triangle, 0, 0, Rotation::R0);
        let g = grid();
        assert!(hit_test(&p, &g, 80.0, 40.0));
        assert!(!hit_test(&p, &g, 5.0, 5.0));
        assert!(!hit_test(&p, &g, 200.0, 40.0));
    }

    #[test]
    fn unknown_shape_hit_tests_as_rectangle() {
        let p = placed(Shape::Unknown("hexagon".into()), 0, 0, Rotation::R0);
        let g = grid();
        assert!(hit_test(&p, &g, 2.0, 2.0));
        assert!(hit_test(&p, &g, 158.0, 158.0));
        assert_eq!(piece_outline(&p, &g).len(), 4);
    }

    #[test]
    fn topmost_prefers_later_pieces() {
        let a = placed(Shape::Square, 0, 0, Rotation::R0);
        let mut b = placed(Shape::Square, 1, 1, Rotation::R0);
        b.id = PieceId(1);
        let g = grid();
        assert_eq!(topmost_at(&[a.clone(), b.clone()], &g, 60.0, 60.0), Some(1));
        assert_eq!(topmost_at(&[b, a], &g, 60.0, 60.0), Some(1));
        assert_eq!(topmost_at(&[], &g, 60.0, 60.0), None);
    }

    #[test]
    fn half_cell_correction_only_for_fractional_sideways() {
        let g = grid();
        let mut p = placed(Shape::Triangle, 4, 4, Rotation::R90);
        assert_eq!(half_cell_correction(&p, &g), (0.0, 0.0));
        p.grid_width = 3.0;
        p.grid_height = 1.5;
        assert_eq!(half_cell_correction(&p, &g), (-20.0, -20.0));
        p.rotation = Rotation::R180;
        assert_eq!(half_cell_correction(&p, &g), (0.0, 0.0));
    }

    #[test]
    fn clamp_keeps_every_silhouette_inside() {
        let g = grid();
        let targets = [-5000.0, -300.0, -1.0, 0.0, 123.4, 320.0, 639.0, 700.0, 9000.0];
        for shape in SHAPES {
            for rot in ROTATIONS {
                for (gw_scale, gh_scale) in [(1.0, 1.0), (1.5, 1.5)] {
                    let mut p = placed(shape.clone(), 0, 0, rot);
                    p.grid_width *= gw_scale;
                    p.grid_height *= gh_scale;
                    g.update_piece(&mut p);
                    for &tx in &targets {
                        for &ty in &targets {
                            let c = clamp_position(&p, &g, tx, ty);
                            assert!(
                                fits_canvas_at(&p, &g, c.x, c.y),
                                "{shape:?} {rot:?} at ({tx},{ty}) -> {c:?}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn snapped_cells_stay_inside() {
        let g = grid();
        for shape in SHAPES {
            for rot in ROTATIONS {
                let mut p = placed(shape.clone(), 0, 0, rot);
                p.grid_width *= 1.5;
                p.grid_height *= 1.5;
                g.update_piece(&mut p);
                for tx in [-90.0, -10.0, 7.0, 333.0, 611.0, 900.0] {
                    let (col, row) = snap_cell(&p, &g, tx, tx);
                    let o = g.cell_origin(col, row);
                    assert!(fits_canvas_at(&p, &g, o.x, o.y), "{shape:?} {rot:?} {tx}");
                }
            }
        }
    }

    #[test]
    fn snap_rounds_to_nearest_cell_in_the_interior() {
        let g = grid();
        let p = placed(Shape::Square, 0, 0, Rotation::R0);
        assert_eq!(snap_cell(&p, &g, 219.0, 181.0), (5, 5));
        assert_eq!(snap_cell(&p, &g, 221.0, 179.0), (6, 4));
    }
}
