//! Level editor model: a solution board and a start board whose pieces are
//! twinned by id.
//!
//! Editing happens on whole grid cells. Pieces are kept one visual cell away
//! from the board edges. Operations that change the layout return an
//! [`EditorSnapshot`] for the caller's history stack.

use tiny_skia::Pixmap;

use crate::completion::{CompletionChecker, TolerantChecker};
use crate::config::EngineConfig;
use crate::constants::EDITOR_SPAWN_CELL;
use crate::error::{PuzzleError, Result};
use crate::geometry::{drawn_center, snap_cell_inset, topmost_at};
use crate::grid::{CanvasSize, Grid};
use crate::models::{
    Piece, PieceData, PieceId, PieceRole, Point, PuzzleData, Shape, piece_to_data,
    process_piece_data,
};
use crate::raster::{BoardLayers, draw_rect_outline, render_board};
use crate::theme::ThemeProvider;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Board {
    Solution,
    Start,
}

/// Image shipped for each palette shape.
pub fn default_src(shape: &Shape) -> Option<&'static str> {
    match shape {
        Shape::Square => Some("pieces/square.svg"),
        Shape::Triangle => Some("pieces/isosceles-triangle.svg"),
        Shape::RightTriangle => Some("pieces/right-triangle.svg"),
        Shape::Diamond => Some("pieces/diamond.svg"),
        Shape::TrapezoidLeft => Some("pieces/trapezoid-left.svg"),
        Shape::TrapezoidRight => Some("pieces/trapezoid-right.svg"),
        Shape::Unknown(_) => None,
    }
}

/// Both boards at one point in time.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorSnapshot {
    pub solution: Vec<Piece>,
    pub start: Vec<Piece>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Ctrl or Meta.
    pub ctrl: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectionBox {
    pub board: Board,
    pub from: Point,
    pub to: Point,
    additive: bool,
    base: Vec<PieceId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
enum Gesture {
    #[default]
    None,
    Drag {
        board: Board,
        offsets: Vec<(PieceId, Point)>,
        moved: bool,
    },
    Select(SelectionBox),
}

pub struct Editor {
    cfg: EngineConfig,
    solution_grid: Grid,
    start_grid: Grid,
    solution: Vec<Piece>,
    start: Vec<Piece>,
    selected: Vec<PieceId>,
    active_board: Option<Board>,
    gesture: Gesture,
    next_id: u64,
}

impl Editor {
    pub fn new(cfg: EngineConfig, solution_canvas: CanvasSize, start_canvas: CanvasSize) -> Self {
        Editor {
            solution_grid: Grid::new(solution_canvas, &cfg),
            start_grid: Grid::new(start_canvas, &cfg),
            cfg,
            solution: Vec::new(),
            start: Vec::new(),
            selected: Vec::new(),
            active_board: None,
            gesture: Gesture::None,
            next_id: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn grid(&self, board: Board) -> &Grid {
        match board {
            Board::Solution => &self.solution_grid,
            Board::Start => &self.start_grid,
        }
    }

    pub fn pieces(&self, board: Board) -> &[Piece] {
        match board {
            Board::Solution => &self.solution,
            Board::Start => &self.start,
        }
    }

    fn board_mut(&mut self, board: Board) -> (&Grid, &mut Vec<Piece>) {
        match board {
            Board::Solution => (&self.solution_grid, &mut self.solution),
            Board::Start => (&self.start_grid, &mut self.start),
        }
    }

    pub fn selection(&self) -> &[PieceId] {
        &self.selected
    }

    pub fn active_board(&self) -> Option<Board> {
        self.active_board
    }

    /// Board the pointer gesture in progress started on, if any.
    pub fn gesture_board(&self) -> Option<Board> {
        match &self.gesture {
            Gesture::None => None,
            Gesture::Drag { board, .. } => Some(*board),
            Gesture::Select(sel) => Some(sel.board),
        }
    }

    pub fn selection_box(&self) -> Option<&SelectionBox> {
        match &self.gesture {
            Gesture::Select(b) => Some(b),
            _ => None,
        }
    }

    pub fn piece_count(&self) -> usize {
        self.solution.len()
    }

    pub fn can_add(&self) -> bool {
        self.solution.len() < self.cfg.max_editor_pieces
    }

    pub fn can_publish(&self) -> bool {
        self.solution.len() >= self.cfg.min_publish_pieces
    }

    /// Margin kept free around each board.
    fn inset(grid: &Grid) -> Point {
        Point::new(grid.visual_cell_width(), grid.visual_cell_height())
    }

    /// Move a piece to the nearest cell that honours the board margin.
    fn settle(grid: &Grid, piece: &mut Piece) {
        grid.update_piece(piece);
        let (col, row) = snap_cell_inset(piece, grid, piece.x, piece.y, Self::inset(grid));
        piece.col = col;
        piece.row = row;
        grid.update_piece(piece);
    }

    pub fn resize(&mut self, board: Board, canvas: CanvasSize, device_pixel_ratio: f64) {
        let grid = Grid::new(canvas, &self.cfg).with_device_pixel_ratio(device_pixel_ratio);
        match board {
            Board::Solution => self.solution_grid = grid,
            Board::Start => self.start_grid = grid,
        }
        let (grid, pieces) = self.board_mut(board);
        grid.update_pieces(pieces);
    }

    /// Add a piece at the spawn cell of the solution board, with its start
    /// twin moved by `scatter` cells. The new piece becomes the selection.
    pub fn add_piece(&mut self, shape: Shape, scatter: (i32, i32)) -> Result<EditorSnapshot> {
        if !self.can_add() {
            return Err(PuzzleError::PieceLimit(self.cfg.max_editor_pieces));
        }
        let id = PieceId(self.next_id);
        self.next_id += 1;

        let (col, row) = EDITOR_SPAWN_CELL;
        let mut sol = Piece::new(id, shape, col, row);
        sol.src = default_src(&sol.shape).map(str::to_string);
        Self::settle(&self.solution_grid, &mut sol);

        let mut start = sol.clone();
        start.col = col + scatter.0;
        start.row = row + scatter.1;
        Self::settle(&self.start_grid, &mut start);

        tracing::debug!(piece = id.0, shape = sol.shape.tag(), "piece added");
        self.solution.push(sol);
        self.start.push(start);
        self.selected = vec![id];
        self.active_board = Some(Board::Solution);
        Ok(self.snapshot())
    }

    pub fn delete_selected(&mut self) -> Option<EditorSnapshot> {
        if self.selected.is_empty() {
            return None;
        }
        let selected = std::mem::take(&mut self.selected);
        self.solution.retain(|p| !selected.contains(&p.id));
        self.start.retain(|p| !selected.contains(&p.id));
        self.active_board = None;
        Some(self.snapshot())
    }

    pub fn delete_all(&mut self) -> Option<EditorSnapshot> {
        if self.solution.is_empty() && self.start.is_empty() {
            return None;
        }
        self.solution.clear();
        self.start.clear();
        self.selected.clear();
        self.active_board = None;
        Some(self.snapshot())
    }

    fn focus(&mut self, board: Board) {
        if self.active_board != Some(board) {
            self.selected.clear();
        }
        self.active_board = Some(board);
    }

    /// Click selection, then either a drag of the selection or a box
    /// selection when nothing was hit.
    pub fn pointer_down(&mut self, board: Board, x: f64, y: f64, mods: Modifiers) {
        let hit = topmost_at(self.pieces(board), self.grid(board), x, y)
            .map(|i| self.pieces(board)[i].id);

        let Some(id) = hit else {
            // an additive box only extends a selection on the same board
            if !mods.ctrl || self.active_board != Some(board) {
                self.selected.clear();
                self.active_board = None;
            }
            self.gesture = Gesture::Select(SelectionBox {
                board,
                from: Point::new(x, y),
                to: Point::new(x, y),
                additive: mods.ctrl,
                base: self.selected.clone(),
            });
            return;
        };

        self.focus(board);
        if mods.ctrl {
            if let Some(pos) = self.selected.iter().position(|s| *s == id) {
                self.selected.remove(pos);
                if self.selected.is_empty() {
                    self.active_board = None;
                }
            } else {
                self.selected.push(id);
            }
        } else if !self.selected.contains(&id) {
            self.selected = vec![id];
        }

        let offsets = self
            .pieces(board)
            .iter()
            .filter(|p| self.selected.contains(&p.id))
            .map(|p| (p.id, Point::new(x - p.x, y - p.y)))
            .collect();
        self.gesture = Gesture::Drag {
            board,
            offsets,
            moved: false,
        };
    }

    /// Continue the current gesture. Dragged pieces snap to whole cells.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        match std::mem::take(&mut self.gesture) {
            Gesture::None => false,
            Gesture::Drag {
                board,
                offsets,
                mut moved,
            } => {
                let (grid, pieces) = self.board_mut(board);
                let inset = Self::inset(grid);
                for (id, off) in &offsets {
                    let Some(p) = pieces.iter_mut().find(|p| p.id == *id) else {
                        continue;
                    };
                    let before = p.cell();
                    let (col, row) = snap_cell_inset(p, grid, x - off.x, y - off.y, inset);
                    p.col = col;
                    p.row = row;
                    grid.update_piece(p);
                    moved |= p.cell() != before;
                }
                self.gesture = Gesture::Drag {
                    board,
                    offsets,
                    moved,
                };
                true
            }
            Gesture::Select(mut sel) => {
                sel.to = Point::new(x, y);
                self.apply_box(&sel);
                self.gesture = Gesture::Select(sel);
                true
            }
        }
    }

    fn apply_box(&mut self, sel: &SelectionBox) {
        let (min_x, max_x) = (sel.from.x.min(sel.to.x), sel.from.x.max(sel.to.x));
        let (min_y, max_y) = (sel.from.y.min(sel.to.y), sel.from.y.max(sel.to.y));
        let mut selected = if sel.additive {
            sel.base.clone()
        } else {
            Vec::new()
        };
        let grid = self.grid(sel.board);
        for p in self.pieces(sel.board) {
            let c = drawn_center(p, grid);
            let inside = c.x >= min_x && c.x <= max_x && c.y >= min_y && c.y <= max_y;
            if inside && !selected.contains(&p.id) {
                selected.push(p.id);
            }
        }
        self.active_board = (!selected.is_empty()).then_some(sel.board);
        self.selected = selected;
    }

    /// End the gesture. A drag that moved anything yields one checkpoint
    /// for the whole selection.
    pub fn pointer_up(&mut self) -> Option<EditorSnapshot> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Drag { moved: true, .. } => Some(self.snapshot()),
            _ => None,
        }
    }

    fn selected_on_active(&self) -> Option<Board> {
        if self.selected.is_empty() {
            return None;
        }
        self.active_board
    }

    /// Move the selection one cell, clamped to the board margin.
    pub fn nudge(&mut self, dir: Direction) -> Option<EditorSnapshot> {
        let board = self.selected_on_active()?;
        let (dc, dr) = dir.delta();
        let selected = self.selected.clone();
        let (grid, pieces) = self.board_mut(board);
        let mut changed = false;
        for p in pieces.iter_mut().filter(|p| selected.contains(&p.id)) {
            let before = p.cell();
            p.col += dc;
            p.row += dr;
            Self::settle(grid, p);
            changed |= p.cell() != before;
        }
        changed.then(|| self.snapshot())
    }

    /// Quarter-turn the selection. Only on the solution board.
    pub fn rotate(&mut self, clockwise: bool) -> Option<EditorSnapshot> {
        self.edit_solution(|p| {
            p.rotation = if clockwise {
                p.rotation.clockwise()
            } else {
                p.rotation.counter_clockwise()
            };
        })
    }

    /// Flip the selection between base size and the enlarged size. Only on
    /// the solution board; unknown shapes are left alone.
    pub fn toggle_size(&mut self) -> Option<EditorSnapshot> {
        let multiplier = self.cfg.size_multiplier;
        self.edit_solution(|p| {
            let Some((bw, bh)) = p.shape.base_size() else {
                return;
            };
            if (p.grid_width, p.grid_height) == (bw, bh) {
                p.grid_width = bw * multiplier;
                p.grid_height = bh * multiplier;
            } else {
                p.grid_width = bw;
                p.grid_height = bh;
            }
        })
    }

    fn edit_solution(&mut self, mut edit: impl FnMut(&mut Piece)) -> Option<EditorSnapshot> {
        if self.selected_on_active()? != Board::Solution {
            return None;
        }
        let selected = self.selected.clone();
        for p in self.solution.iter_mut().filter(|p| selected.contains(&p.id)) {
            edit(p);
            Self::settle(&self.solution_grid, p);
        }
        for id in &selected {
            self.sync_twin(*id);
        }
        Some(self.snapshot())
    }

    /// Copy rotation and size of a solution piece onto its start twin.
    fn sync_twin(&mut self, id: PieceId) {
        let Some(src) = self.solution.iter().find(|p| p.id == id) else {
            return;
        };
        let (rotation, gw, gh) = (src.rotation, src.grid_width, src.grid_height);
        if let Some(twin) = self.start.iter_mut().find(|p| p.id == id) {
            twin.rotation = rotation;
            twin.grid_width = gw;
            twin.grid_height = gh;
            Self::settle(&self.start_grid, twin);
        }
    }

    /// Puzzle data for publishing.
    pub fn to_puzzle_data(&self) -> Result<PuzzleData> {
        if self.solution.len() < self.cfg.min_publish_pieces {
            return Err(PuzzleError::NotEnoughPieces {
                required: self.cfg.min_publish_pieces,
                found: self.solution.len(),
            });
        }
        let start: Vec<PieceData> = self
            .start
            .iter()
            .map(|p| piece_to_data(p, PieceRole::Start))
            .collect();
        let solution: Vec<PieceData> = self
            .solution
            .iter()
            .map(|p| piece_to_data(p, PieceRole::Solution))
            .collect();
        Ok(PuzzleData {
            puzzle_pieces_data: start,
            solutions: vec![solution],
        })
    }

    /// Replace both boards with stored puzzle data. The first solution is
    /// edited; pieces pair up by position. Only palette shapes and quarter
    /// turns can be edited, so anything else is rejected.
    pub fn load(&mut self, data: &PuzzleData) -> Result<EditorSnapshot> {
        data.check_strict()?;
        let solution_data = data.solutions.first().ok_or(PuzzleError::MissingSolution)?;
        if data.puzzle_pieces_data.is_empty() || solution_data.is_empty() {
            return Err(PuzzleError::EmptyPuzzle);
        }
        let mut solution = process_piece_data(solution_data, PieceRole::Solution, &self.cfg);
        let mut start = process_piece_data(&data.puzzle_pieces_data, PieceRole::Start, &self.cfg);
        if solution.len() != start.len() {
            tracing::warn!(
                solution = solution.len(),
                start = start.len(),
                "piece counts differ, unmatched pieces have no twin"
            );
        }
        self.solution_grid.update_pieces(&mut solution);
        self.start_grid.update_pieces(&mut start);
        self.next_id = solution.len().max(start.len()) as u64;
        self.solution = solution;
        self.start = start;
        self.selected.clear();
        self.active_board = None;
        self.gesture = Gesture::None;
        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            solution: self.solution.clone(),
            start: self.start.clone(),
        }
    }

    /// Go back to a checkpoint. Selection is dropped.
    pub fn restore(&mut self, snap: &EditorSnapshot) {
        self.solution = snap.solution.clone();
        self.start = snap.start.clone();
        self.solution_grid.update_pieces(&mut self.solution);
        self.start_grid.update_pieces(&mut self.start);
        self.next_id = self
            .solution
            .iter()
            .chain(&self.start)
            .map(|p| p.id.0 + 1)
            .max()
            .unwrap_or(0)
            .max(self.next_id);
        self.selected.clear();
        self.active_board = None;
        self.gesture = Gesture::None;
    }

    /// Whether the start layout already covers the solution silhouette.
    /// Compared on the solution board so differently sized boards agree.
    pub fn start_looks_solved(&self) -> bool {
        if self.solution.is_empty() {
            return false;
        }
        let mut start = self.start.clone();
        self.solution_grid.update_pieces(&mut start);
        TolerantChecker::from_config(&self.solution, &self.cfg).is_solved(&start, &self.solution_grid)
    }

    pub fn render(&self, board: Board, theme: &dyn ThemeProvider) -> Option<Pixmap> {
        let outlined: &[PieceId] = if self.active_board == Some(board) {
            &self.selected
        } else {
            &[]
        };
        let layers = BoardLayers {
            outlined,
            outline_width: self.cfg.outline_width,
            grid_line_width: self.cfg.grid_line_width,
            ..BoardLayers::default()
        };
        let grid = self.grid(board);
        let mut pixmap = render_board(grid, self.pieces(board), &layers, theme)?;
        if let Some(sel) = self.selection_box()
            && sel.board == board
        {
            let width = grid.device_pixel_ratio as f32;
            draw_rect_outline(&mut pixmap, sel.from, sel.to, theme.hover(), width);
        }
        Some(pixmap)
    }
}

/// Keyboard shortcut to palette shape (`1`..=`6`).
pub fn shape_for_key(key: &str) -> Option<Shape> {
    let n: usize = key.parse().ok()?;
    (1..=Shape::ALL.len())
        .contains(&n)
        .then(|| Shape::ALL[n - 1].clone())
}
