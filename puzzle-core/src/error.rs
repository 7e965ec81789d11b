//! Error types for puzzle_core

use thiserror::Error;

/// Errors surfaced by the placement engine and the editor model.
#[derive(Error, Debug)]
pub enum PuzzleError {
    /// Shape tag that no geometry exists for
    #[error("unknown shape: {0}")]
    UnknownShape(String),

    /// Rotation that is not a quarter turn
    #[error("invalid rotation: {0} degrees")]
    InvalidRotation(f64),

    /// Puzzle data without any start pieces
    #[error("puzzle has no pieces")]
    EmptyPuzzle,

    /// Puzzle data without an accepted arrangement
    #[error("puzzle has no solution")]
    MissingSolution,

    /// A piece image could not be fetched or decoded
    #[error("failed to load image {src}: {reason}")]
    ImageLoad { src: String, reason: String },

    /// Masks of different sizes cannot be compared
    #[error("mask size mismatch: {left:?} vs {right:?}")]
    MaskSizeMismatch {
        left: (u32, u32),
        right: (u32, u32),
    },

    /// Configuration value out of range
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Editor already holds the maximum number of pieces
    #[error("piece limit of {0} reached")]
    PieceLimit(usize),

    /// Too few pieces to publish a puzzle
    #[error("a puzzle needs at least {required} pieces, found {found}")]
    NotEnoughPieces { required: usize, found: usize },

    /// Pixmap could not be allocated for the requested size
    #[error("cannot allocate a {0}x{1} pixmap")]
    PixmapAlloc(u32, u32),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    PngEncode(#[from] png::EncodingError),
}

/// Result type for puzzle_core operations
pub type Result<T> = std::result::Result<T, PuzzleError>;
