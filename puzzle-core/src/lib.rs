//! Grid placement engine for the shape puzzle.
//!
//! Everything here is platform independent: the browser crate feeds pointer
//! coordinates and timestamps in, and blits the returned pixmaps.

pub mod animation;
pub mod completion;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod export;
pub mod geometry;
pub mod grid;
pub mod images;
pub mod interaction;
pub mod models;
pub mod raster;
pub mod theme;

pub use completion::{CompletionChecker, StrictChecker, TolerantChecker};
pub use config::EngineConfig;
pub use editor::{Board, Direction, Editor, EditorSnapshot, Modifiers};
pub use error::{PuzzleError, Result};
pub use grid::{CanvasSize, Grid};
pub use interaction::{CompletionStats, Gameplay, Phase, Tick};
pub use models::{Piece, PieceData, PieceId, Point, Puzzle, PuzzleData, PuzzleRecord, Rotation, Shape};
pub use theme::{Rgba, Theme, ThemeProvider};
