use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{PuzzleError, Result};

/// Tunables shared by every board of one page.
///
/// Every field is optional in JSON; missing values fall back to the
/// defaults in [`crate::constants`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grid_cols: u32,
    pub grid_rows: u32,
    pub visual_grid_size: u32,
    pub snap_duration_ms: f64,
    pub mask_tolerance: f64,
    pub guide_opacity: f32,
    pub outline_width: f32,
    pub grid_line_width: f32,
    pub size_multiplier: f64,
    pub max_editor_pieces: usize,
    pub min_publish_pieces: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            grid_cols: GRID_COLS,
            grid_rows: GRID_ROWS,
            visual_grid_size: VISUAL_GRID_SIZE,
            snap_duration_ms: SNAP_DURATION_MS,
            mask_tolerance: MASK_TOLERANCE,
            guide_opacity: GUIDE_OPACITY,
            outline_width: OUTLINE_WIDTH,
            grid_line_width: GRID_LINE_WIDTH,
            size_multiplier: SIZE_MULTIPLIER,
            max_editor_pieces: MAX_EDITOR_PIECES,
            min_publish_pieces: MIN_PUBLISH_PIECES,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: EngineConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_cols == 0 || self.grid_rows == 0 || self.visual_grid_size == 0 {
            return Err(PuzzleError::InvalidConfig(
                "grid dimensions must be non-zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mask_tolerance) {
            return Err(PuzzleError::InvalidConfig(format!(
                "mask_tolerance {} outside [0, 1]",
                self.mask_tolerance
            )));
        }
        if !(self.snap_duration_ms > 0.0) {
            return Err(PuzzleError::InvalidConfig(format!(
                "snap_duration_ms {} must be positive",
                self.snap_duration_ms
            )));
        }
        if !(self.size_multiplier > 0.0) {
            return Err(PuzzleError::InvalidConfig(format!(
                "size_multiplier {} must be positive",
                self.size_multiplier
            )));
        }
        if !(0.0..=1.0).contains(&self.guide_opacity) {
            return Err(PuzzleError::InvalidConfig(format!(
                "guide_opacity {} outside [0, 1]",
                self.guide_opacity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "snap_duration_ms": 200 }"#).unwrap();
        assert_eq!(cfg.snap_duration_ms, 200.0);
        assert_eq!(cfg.grid_cols, GRID_COLS);
        assert_eq!(cfg.visual_grid_size, VISUAL_GRID_SIZE);
    }

    #[test]
    fn rejects_zero_grid() {
        let err = EngineConfig::from_json(r#"{ "grid_cols": 0 }"#).unwrap_err();
        assert!(matches!(err, PuzzleError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_tolerance_out_of_range() {
        let cfg = EngineConfig {
            mask_tolerance: 1.5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
