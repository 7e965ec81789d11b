use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{PuzzleError, Result};

/// Basic two dimensional point in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

/// Polygon variant of a piece. Unrecognised tags are kept so they can be
/// written back unchanged; their geometry falls back to a rectangle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Shape {
    Square,
    Triangle,
    RightTriangle,
    Diamond,
    TrapezoidLeft,
    TrapezoidRight,
    Unknown(String),
}

impl Shape {
    /// Palette order used by the editor (number keys 1..=6).
    pub const ALL: [Shape; 6] = [
        Shape::Square,
        Shape::Triangle,
        Shape::RightTriangle,
        Shape::Diamond,
        Shape::TrapezoidLeft,
        Shape::TrapezoidRight,
    ];

    pub fn from_tag(tag: &str) -> Shape {
        match tag {
            "square" => Shape::Square,
            "triangle" => Shape::Triangle,
            "right-triangle" => Shape::RightTriangle,
            "diamond" => Shape::Diamond,
            "trapezoid-left" => Shape::TrapezoidLeft,
            "trapezoid-right" => Shape::TrapezoidRight,
            other => Shape::Unknown(other.to_string()),
        }
    }

    /// Strict variant of [`Shape::from_tag`] for callers that cannot fall
    /// back to a rectangle.
    pub fn parse(tag: &str) -> Result<Shape> {
        match Shape::from_tag(tag) {
            Shape::Unknown(tag) => Err(PuzzleError::UnknownShape(tag)),
            shape => Ok(shape),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Shape::Square => "square",
            Shape::Triangle => "triangle",
            Shape::RightTriangle => "right-triangle",
            Shape::Diamond => "diamond",
            Shape::TrapezoidLeft => "trapezoid-left",
            Shape::TrapezoidRight => "trapezoid-right",
            Shape::Unknown(tag) => tag,
        }
    }

    /// Footprint in visual-grid units before any resize.
    pub fn base_size(&self) -> Option<(f64, f64)> {
        match self {
            Shape::Square => Some((2.0, 2.0)),
            Shape::Triangle => Some((2.0, 1.0)),
            Shape::RightTriangle => Some((2.0, 2.0)),
            Shape::Diamond => Some((2.0, 2.0)),
            Shape::TrapezoidLeft | Shape::TrapezoidRight => Some((2.0, 3.0)),
            Shape::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Shape::Unknown(_))
    }
}

impl From<String> for Shape {
    fn from(tag: String) -> Self {
        Shape::from_tag(&tag)
    }
}

impl From<Shape> for String {
    fn from(shape: Shape) -> Self {
        shape.tag().to_string()
    }
}

/// Quarter-turn rotation, clockwise in pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// Exact conversion; anything that is not a multiple of 90 is rejected.
    pub fn from_degrees(deg: f64) -> Result<Self> {
        if !deg.is_finite() || deg % 90.0 != 0.0 {
            return Err(PuzzleError::InvalidRotation(deg));
        }
        Ok(Self::from_quarter_turns((deg / 90.0) as i64))
    }

    /// Lenient conversion used when loading puzzle data: snaps to the
    /// nearest quarter turn. The flag reports whether the value changed.
    pub fn nearest(deg: f64) -> (Self, bool) {
        if !deg.is_finite() {
            return (Rotation::R0, true);
        }
        let turns = (deg / 90.0).round();
        let adjusted = turns * 90.0 != deg;
        (Self::from_quarter_turns(turns as i64), adjusted)
    }

    fn from_quarter_turns(turns: i64) -> Self {
        match turns.rem_euclid(4) {
            0 => Rotation::R0,
            1 => Rotation::R90,
            2 => Rotation::R180,
            _ => Rotation::R270,
        }
    }

    pub fn clockwise(self) -> Self {
        Self::from_quarter_turns(self.degrees() as i64 / 90 + 1)
    }

    pub fn counter_clockwise(self) -> Self {
        Self::from_quarter_turns(self.degrees() as i64 / 90 - 1)
    }

    /// 90° and 270° swap a footprint's width and height.
    pub fn is_sideways(self) -> bool {
        matches!(self, Rotation::R90 | Rotation::R270)
    }

    /// Exact `(cos, sin)` for the quarter turn.
    pub fn cos_sin(self) -> (f64, f64) {
        match self {
            Rotation::R0 => (1.0, 0.0),
            Rotation::R90 => (0.0, 1.0),
            Rotation::R180 => (-1.0, 0.0),
            Rotation::R270 => (0.0, -1.0),
        }
    }
}

/// Stable identity of a piece; a start piece and its solution twin share it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceId(pub u64);

/// A placed polygon instance.
///
/// `col`/`row`/`grid_width`/`grid_height`/`rotation` are authoritative;
/// `x`/`y`/`width`/`height` are a pixel cache refreshed through
/// [`crate::grid::Grid::update_piece`].
#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    pub id: PieceId,
    pub shape: Shape,
    pub src: Option<String>,
    pub col: i32,
    pub row: i32,
    pub grid_width: f64,
    pub grid_height: f64,
    pub rotation: Rotation,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Piece {
    pub fn new(id: PieceId, shape: Shape, col: i32, row: i32) -> Self {
        let (grid_width, grid_height) = shape.base_size().unwrap_or((2.0, 2.0));
        Piece {
            id,
            shape,
            src: None,
            col,
            row,
            grid_width,
            grid_height,
            rotation: Rotation::R0,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_size(mut self, grid_width: f64, grid_height: f64) -> Self {
        self.grid_width = grid_width;
        self.grid_height = grid_height;
        self
    }

    /// Either footprint side is fractional (a 1.5× resized piece).
    pub fn has_fractional_size(&self) -> bool {
        self.grid_width.fract() != 0.0 || self.grid_height.fract() != 0.0
    }

    pub fn cell(&self) -> (i32, i32) {
        (self.col, self.row)
    }

    pub fn placement(&self) -> Placement {
        Placement {
            col: self.col,
            row: self.row,
            rotation: self.rotation.degrees(),
        }
    }
}

/// The part of a piece that decides solved-state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub col: i32,
    pub row: i32,
    pub rotation: u16,
}

/// Wire shape of one piece inside stored puzzle data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    pub shape: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_col: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_row: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Legacy size flag: `1` means 1.5× the base size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u8>,
}

/// Starting layout plus one or more accepted arrangements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleData {
    #[serde(default)]
    pub puzzle_pieces_data: Vec<PieceData>,
    #[serde(default)]
    pub solutions: Vec<Vec<PieceData>>,
}

impl PuzzleData {
    /// Reject shapes without geometry and rotations off the quarter turns.
    /// Normal loading degrades these instead.
    pub fn check_strict(&self) -> Result<()> {
        for d in self.puzzle_pieces_data.iter().chain(self.solutions.iter().flatten()) {
            Shape::parse(&d.shape)?;
            if let Some(deg) = d.rotation {
                Rotation::from_degrees(deg)?;
            }
        }
        Ok(())
    }
}

/// Puzzle as served by the remote listing API; only `puzzle_data` matters
/// to the engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub author: Option<String>,
    pub puzzle_data: PuzzleData,
    pub daily_number: Option<u32>,
    pub scheduled_date: Option<String>,
}

impl PuzzleRecord {
    /// Parse either a full record or bare puzzle data.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if value.get("puzzleData").is_some() {
            return Ok(serde_json::from_value(value)?);
        }
        Ok(PuzzleRecord {
            puzzle_data: serde_json::from_value(value)?,
            ..PuzzleRecord::default()
        })
    }
}

/// Which coordinates of a [`PieceData`] a loader reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PieceRole {
    Start,
    Solution,
}

/// Normalize wire records into pieces with mandatory fields.
///
/// Ids are assigned by position so that the n-th start piece and the n-th
/// solution piece are twins.
pub fn process_piece_data(data: &[PieceData], role: PieceRole, cfg: &EngineConfig) -> Vec<Piece> {
    data.iter()
        .enumerate()
        .map(|(i, d)| normalize_piece(d, PieceId(i as u64), role, cfg))
        .collect()
}

fn normalize_piece(d: &PieceData, id: PieceId, role: PieceRole, cfg: &EngineConfig) -> Piece {
    let shape = Shape::from_tag(&d.shape);
    let (base_w, base_h) = match shape.base_size() {
        Some(base) => base,
        None => {
            tracing::warn!(shape = %d.shape, "unknown shape, drawing as rectangle");
            (2.0, 2.0)
        }
    };
    let multiplier = if shape.is_known() && d.size == Some(1) {
        cfg.size_multiplier
    } else {
        1.0
    };
    let grid_width = d
        .grid_width
        .filter(|v| *v > 0.0)
        .unwrap_or(base_w * multiplier);
    let grid_height = d
        .grid_height
        .filter(|v| *v > 0.0)
        .unwrap_or(base_h * multiplier);
    let (col, row) = match role {
        PieceRole::Start => (
            d.start_col.or(d.col).unwrap_or(0),
            d.start_row.or(d.row).unwrap_or(0),
        ),
        PieceRole::Solution => (d.col.unwrap_or(0), d.row.unwrap_or(0)),
    };
    let (rotation, adjusted) = Rotation::nearest(d.rotation.unwrap_or(0.0));
    if adjusted {
        tracing::warn!(
            rotation = ?d.rotation,
            snapped = rotation.degrees(),
            "rotation is not a quarter turn"
        );
    }
    Piece {
        id,
        shape,
        src: d.src.clone(),
        col,
        row,
        grid_width,
        grid_height,
        rotation,
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    }
}

/// Inverse of [`process_piece_data`] for one piece.
pub fn piece_to_data(p: &Piece, role: PieceRole) -> PieceData {
    let (start_col, start_row, col, row) = match role {
        PieceRole::Start => (Some(p.col), Some(p.row), None, None),
        PieceRole::Solution => (None, None, Some(p.col), Some(p.row)),
    };
    PieceData {
        src: p.src.clone(),
        shape: p.shape.tag().to_string(),
        start_col,
        start_row,
        col,
        row,
        grid_width: Some(p.grid_width),
        grid_height: Some(p.grid_height),
        rotation: Some(p.rotation.degrees() as f64),
        size: None,
    }
}

/// A loaded puzzle: start layout and accepted solutions, normalized.
#[derive(Clone, Debug, PartialEq)]
pub struct Puzzle {
    pub start: Vec<Piece>,
    pub solutions: Vec<Vec<Piece>>,
}

impl Puzzle {
    pub fn from_data(data: &PuzzleData, cfg: &EngineConfig) -> Result<Self> {
        if data.puzzle_pieces_data.is_empty() {
            return Err(PuzzleError::EmptyPuzzle);
        }
        let solutions: Vec<Vec<Piece>> = data
            .solutions
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| process_piece_data(s, PieceRole::Solution, cfg))
            .collect();
        if solutions.is_empty() {
            return Err(PuzzleError::MissingSolution);
        }
        Ok(Puzzle {
            start: process_piece_data(&data.puzzle_pieces_data, PieceRole::Start, cfg),
            solutions,
        })
    }

    pub fn from_json(text: &str, cfg: &EngineConfig) -> Result<Self> {
        let data: PuzzleData = serde_json::from_str(text)?;
        Self::from_data(&data, cfg)
    }

    /// Solution drawn on the reference board.
    pub fn reference(&self) -> &[Piece] {
        self.solutions.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct image sources in first-seen order.
    pub fn image_sources(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for p in self.start.iter().chain(self.solutions.iter().flatten()) {
            if let Some(src) = p.src.as_deref()
                && !out.contains(&src)
            {
                out.push(src);
            }
        }
        out
    }
}
