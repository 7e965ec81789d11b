//! Pointer-driven drag lifecycle for one gameplay board.
//!
//! Per piece: `Idle -> Dragging -> Snapping -> Idle`. The board as a whole
//! goes `Unsolved -> Solved` once and only [`Gameplay::reset`] leaves it.

use tiny_skia::Pixmap;

use crate::animation::{AnimationState, CelebrationAnimation, Easing, SnapAnimation};
use crate::completion::{CompletionChecker, StrictChecker};
use crate::config::EngineConfig;
use crate::geometry::{clamp_position, snap_cell, topmost_at};
use crate::grid::{CanvasSize, Grid};
use crate::models::{Piece, PieceId, Point, Puzzle};
use crate::raster::{BoardLayers, render_board, render_celebration, render_reference};
use crate::theme::ThemeProvider;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dragging,
    Snapping,
}

/// Piece held by the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveDrag {
    pub piece: PieceId,
    pub initial_cell: (i32, i32),
    /// Pointer position minus piece anchor at grab time.
    pub offset: Point,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActiveSnap {
    pub animation: SnapAnimation,
    pub initial_cell: (i32, i32),
}

/// Transient pointer state of one board.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionState {
    pub active: Option<ActiveDrag>,
    pub hovered: Option<PieceId>,
    pub snapping: Option<ActiveSnap>,
}

impl InteractionState {
    pub fn phase(&self) -> Phase {
        if self.snapping.is_some() {
            Phase::Snapping
        } else if self.active.is_some() {
            Phase::Dragging
        } else {
            Phase::Idle
        }
    }

    pub fn clear(&mut self) {
        *self = InteractionState::default();
    }
}

/// Payload of the solved signal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletionStats {
    pub elapsed_ms: f64,
    pub moves: u32,
}

/// Result of advancing the board to a new frame time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tick {
    pub redraw: bool,
    /// Another frame is needed.
    pub animating: bool,
    /// Set on the one tick where the puzzle became solved.
    pub solved: Option<CompletionStats>,
}

/// Controller for one gameplay board.
pub struct Gameplay {
    cfg: EngineConfig,
    grid: Grid,
    start_layout: Vec<Piece>,
    pieces: Vec<Piece>,
    reference: Vec<Piece>,
    checker: Box<dyn CompletionChecker>,
    interaction: InteractionState,
    moves: u32,
    started_at_ms: f64,
    solved: bool,
    celebration: Option<CelebrationAnimation>,
}

impl Gameplay {
    pub fn new(puzzle: Puzzle, canvas: CanvasSize, cfg: EngineConfig, now_ms: f64) -> Self {
        let grid = Grid::new(canvas, &cfg);
        let checker = Box::new(StrictChecker::new(&puzzle.solutions, &cfg));
        let mut reference = puzzle.reference().to_vec();
        grid.update_pieces(&mut reference);
        let mut pieces = puzzle.start.clone();
        grid.update_pieces(&mut pieces);
        Gameplay {
            cfg,
            grid,
            start_layout: puzzle.start,
            pieces,
            reference,
            checker,
            interaction: InteractionState::default(),
            moves: 0,
            started_at_ms: now_ms,
            solved: false,
            celebration: None,
        }
    }

    /// Swap the completion strategy.
    pub fn with_checker(mut self, checker: Box<dyn CompletionChecker>) -> Self {
        self.checker = checker;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn reference(&self) -> &[Piece] {
        &self.reference
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn phase(&self) -> Phase {
        self.interaction.phase()
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    fn index_of(&self, id: PieceId) -> Option<usize> {
        self.pieces.iter().position(|p| p.id == id)
    }

    /// New canvas size; every pixel cache is rebuilt from grid fields.
    pub fn resize(&mut self, canvas: CanvasSize, device_pixel_ratio: f64) {
        self.grid = Grid::new(canvas, &self.cfg).with_device_pixel_ratio(device_pixel_ratio);
        self.grid.update_pieces(&mut self.pieces);
        self.grid.update_pieces(&mut self.reference);
        if let Some(snap) = self.interaction.snapping.as_mut() {
            let (col, row) = snap.animation.target;
            let to = self.grid.cell_origin(col, row);
            snap.animation.from = to;
            snap.animation.to = to;
        }
        tracing::debug!(width = canvas.width, height = canvas.height, "board resized");
    }

    /// Grab the topmost piece under the pointer. Returns whether a drag
    /// started.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        if self.solved || self.interaction.phase() != Phase::Idle {
            return false;
        }
        let Some(i) = topmost_at(&self.pieces, &self.grid, x, y) else {
            return false;
        };
        let piece = self.pieces.remove(i);
        self.interaction.active = Some(ActiveDrag {
            piece: piece.id,
            initial_cell: piece.cell(),
            offset: Point::new(x - piece.x, y - piece.y),
        });
        self.interaction.hovered = None;
        tracing::debug!(piece = piece.id.0, col = piece.col, row = piece.row, "drag start");
        self.pieces.push(piece);
        true
    }

    /// Drag the held piece or update hover. Returns whether a redraw is due.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        if let Some(drag) = self.interaction.active {
            let Some(i) = self.index_of(drag.piece) else {
                return false;
            };
            let piece = &mut self.pieces[i];
            let p = clamp_position(piece, &self.grid, x - drag.offset.x, y - drag.offset.y);
            piece.x = p.x;
            piece.y = p.y;
            return true;
        }
        self.hover(x, y)
    }

    /// Track the topmost piece under an idle pointer.
    pub fn hover(&mut self, x: f64, y: f64) -> bool {
        if self.solved || self.interaction.phase() != Phase::Idle {
            return false;
        }
        let found = topmost_at(&self.pieces, &self.grid, x, y).map(|i| self.pieces[i].id);
        if found == self.interaction.hovered {
            return false;
        }
        self.interaction.hovered = found;
        true
    }

    /// Release the held piece and start its snap.
    pub fn pointer_up(&mut self, now_ms: f64) -> bool {
        let Some(drag) = self.interaction.active.take() else {
            return false;
        };
        let Some(i) = self.index_of(drag.piece) else {
            return false;
        };
        let piece = &self.pieces[i];
        let target = snap_cell(piece, &self.grid, piece.x, piece.y);
        let to = self.grid.cell_origin(target.0, target.1);
        tracing::debug!(piece = drag.piece.0, col = target.0, row = target.1, "snap");
        self.interaction.snapping = Some(ActiveSnap {
            animation: SnapAnimation {
                piece: drag.piece,
                from: Point::new(piece.x, piece.y),
                to,
                target,
                timing: AnimationState::new(now_ms, self.cfg.snap_duration_ms, Easing::CubicOut),
            },
            initial_cell: drag.initial_cell,
        });
        true
    }

    /// Same as releasing the pointer.
    pub fn pointer_cancel(&mut self, now_ms: f64) -> bool {
        self.pointer_up(now_ms)
    }

    /// Pointer left the canvas: ends a drag, otherwise drops the hover.
    pub fn pointer_leave(&mut self, now_ms: f64) -> bool {
        if self.interaction.active.is_some() {
            return self.pointer_up(now_ms);
        }
        self.interaction.hovered.take().is_some()
    }

    /// Advance animations to `now_ms`; finishing a snap counts the move and
    /// runs the completion check.
    pub fn tick(&mut self, now_ms: f64) -> Tick {
        let mut out = Tick::default();
        if let Some(snap) = self.interaction.snapping.as_ref() {
            let pos = snap.animation.position(now_ms);
            let finished = snap.animation.is_finished(now_ms);
            let (id, target, initial) = (snap.animation.piece, snap.animation.target, snap.initial_cell);
            if let Some(i) = self.index_of(id) {
                let piece = &mut self.pieces[i];
                piece.x = pos.x;
                piece.y = pos.y;
                if finished {
                    piece.col = target.0;
                    piece.row = target.1;
                    self.grid.update_piece(piece);
                }
            }
            out.redraw = true;
            if finished {
                self.interaction.snapping = None;
                if target != initial {
                    self.moves += 1;
                }
                out.solved = self.check_completion(now_ms);
            } else {
                out.animating = true;
            }
        }
        if let Some(anim) = &self.celebration {
            out.redraw = true;
            if anim.frame(now_ms).finished {
                // last frame; the board stays at zero opacity from here
                self.celebration = None;
            } else {
                out.animating = true;
            }
        }
        out
    }

    /// Run the completion check. Skipped while a piece is snapping. Emits
    /// stats only on the transition to solved.
    pub fn check_completion(&mut self, now_ms: f64) -> Option<CompletionStats> {
        if self.solved || self.interaction.snapping.is_some() {
            return None;
        }
        if !self.checker.is_solved(&self.pieces, &self.grid) {
            return None;
        }
        self.solved = true;
        self.interaction.clear();
        self.celebration = Some(CelebrationAnimation::new(now_ms, self.cfg.visual_grid_size));
        let stats = CompletionStats {
            elapsed_ms: now_ms - self.started_at_ms,
            moves: self.moves,
        };
        tracing::debug!(moves = stats.moves, elapsed_ms = stats.elapsed_ms, "solved");
        Some(stats)
    }

    /// Back to the start layout with fresh stats.
    pub fn reset(&mut self, now_ms: f64) {
        self.pieces = self.start_layout.clone();
        self.grid.update_pieces(&mut self.pieces);
        self.interaction.clear();
        self.moves = 0;
        self.started_at_ms = now_ms;
        self.solved = false;
        self.celebration = None;
    }

    /// Mark solved without emitting a signal, for a puzzle finished earlier.
    pub fn restore_solved(&mut self) {
        self.solved = true;
        self.interaction.clear();
        self.celebration = None;
    }

    pub fn render(&self, now_ms: f64, theme: &dyn ThemeProvider) -> Option<Pixmap> {
        if let Some(anim) = &self.celebration {
            let frame = anim.frame(now_ms);
            if !frame.finished {
                return render_celebration(&self.grid, &self.pieces, &frame, theme);
            }
        }
        let outlined: Vec<PieceId> = match (&self.interaction.active, self.interaction.hovered) {
            (Some(drag), _) => vec![drag.piece],
            (None, Some(h)) if self.interaction.snapping.is_none() => vec![h],
            _ => Vec::new(),
        };
        let layers = BoardLayers {
            guide: (!self.solved).then_some(self.reference.as_slice()),
            guide_opacity: self.cfg.guide_opacity,
            piece_opacity: if self.solved { 0.0 } else { 1.0 },
            outlined: &outlined,
            outline_width: self.cfg.outline_width,
            grid_line_width: self.cfg.grid_line_width,
        };
        render_board(&self.grid, &self.pieces, &layers, theme)
    }

    /// Reference board, which may be sized differently from the play board.
    pub fn render_reference(&self, canvas: CanvasSize, theme: &dyn ThemeProvider) -> Option<Pixmap> {
        let grid = Grid::new(canvas, &self.cfg).with_device_pixel_ratio(self.grid.device_pixel_ratio);
        let mut pieces = self.reference.clone();
        grid.update_pieces(&mut pieces);
        render_reference(&grid, &pieces, theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Shape;

    fn board() -> Gameplay {
        let start = vec![Piece::new(PieceId(0), Shape::Square, 0, 0)];
        let solutions = vec![vec![Piece::new(PieceId(0), Shape::Square, 8, 8)]];
        Gameplay::new(
            Puzzle { start, solutions },
            CanvasSize::square(640),
            EngineConfig::default(),
            0.0,
        )
    }

    #[test]
    fn grab_requires_a_hit() {
        let mut g = board();
        assert!(!g.pointer_down(500.0, 500.0));
        assert_eq!(g.phase(), Phase::Idle);
        assert!(g.pointer_down(10.0, 10.0));
        assert_eq!(g.phase(), Phase::Dragging);
        assert_eq!(g.interaction().active.map(|d| d.offset), Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn drag_is_clamped_and_continuous() {
        let mut g = board();
        g.pointer_down(10.0, 10.0);
        g.pointer_move(-300.0, 33.0);
        let p = g.piece(PieceId(0)).unwrap();
        assert_eq!((p.x, p.y), (0.0, 23.0));
        assert_eq!(p.cell(), (0, 0));
    }

    #[test]
    fn no_grab_while_snapping() {
        let mut g = board();
        g.pointer_down(10.0, 10.0);
        g.pointer_move(100.0, 100.0);
        g.pointer_up(0.0);
        assert_eq!(g.phase(), Phase::Snapping);
        assert!(!g.pointer_down(100.0, 100.0));
        assert!(!g.hover(100.0, 100.0));
        let t = g.tick(75.0);
        assert!(t.animating);
        let t = g.tick(150.0);
        assert!(!t.animating);
        assert_eq!(g.phase(), Phase::Idle);
        assert_eq!(g.piece(PieceId(0)).unwrap().cell(), (2, 2));
    }

    #[test]
    fn hover_tracks_topmost_and_leave_clears_it() {
        let mut g = board();
        assert!(g.pointer_move(20.0, 20.0));
        assert_eq!(g.interaction().hovered, Some(PieceId(0)));
        assert!(!g.pointer_move(21.0, 21.0));
        assert!(g.pointer_leave(0.0));
        assert_eq!(g.interaction().hovered, None);
    }

    #[test]
    fn cancel_snaps_instead_of_discarding() {
        let mut g = board();
        g.pointer_down(10.0, 10.0);
        g.pointer_move(90.0, 10.0);
        assert!(g.pointer_cancel(0.0));
        g.tick(1000.0);
        assert_eq!(g.piece(PieceId(0)).unwrap().cell(), (2, 0));
        assert_eq!(g.moves(), 1);
    }

    #[test]
    fn restored_board_is_frozen_and_silent() {
        let mut g = board();
        g.restore_solved();
        assert!(g.is_solved());
        assert!(!g.pointer_down(10.0, 10.0));
        assert_eq!(g.check_completion(0.0), None);
        g.reset(5.0);
        assert!(!g.is_solved());
        assert!(g.pointer_down(10.0, 10.0));
    }

    #[test]
    fn resize_rebuilds_pixel_cache() {
        let mut g = board();
        g.resize(CanvasSize::square(320), 2.0);
        let p = g.piece(PieceId(0)).unwrap();
        assert_eq!(p.width, 80.0);
        assert_eq!(g.grid().device_pixel_ratio, 2.0);
        g.resize(CanvasSize::default(), 1.0);
        assert!(g.render(0.0, &crate::theme::Theme::default()).is_none());
    }
}
