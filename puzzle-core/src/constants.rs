/// Engine-wide numeric constants.
/// Values are expressed in grid cells unless noted otherwise.
pub const GRID_COLS: u32 = 16;
pub const GRID_ROWS: u32 = 16;
/// Coarser grid used for guide lines and as the unit of piece sizes.
pub const VISUAL_GRID_SIZE: u32 = 8;
/// Snap animation length (ms).
pub const SNAP_DURATION_MS: f64 = 150.0;
/// Largest mismatched-pixel ratio still accepted by the tolerant checker.
pub const MASK_TOLERANCE: f64 = 0.005;
/// Opacity of the reference silhouette drawn under the pieces.
pub const GUIDE_OPACITY: f32 = 0.4;
/// Hover/active outline width, in CSS pixels.
pub const OUTLINE_WIDTH: f32 = 3.0;
/// Guide line width, in CSS pixels.
pub const GRID_LINE_WIDTH: f32 = 1.0;
/// Factor applied to a shape's base size by the legacy `size` flag and the editor toggle.
pub const SIZE_MULTIPLIER: f64 = 1.5;
pub const MAX_EDITOR_PIECES: usize = 10;
pub const MIN_PUBLISH_PIECES: usize = 3;
/// Cell where the editor drops freshly added solution pieces.
pub const EDITOR_SPAWN_CELL: (i32, i32) = (6, 6);
/// Celebration wave timing (ms).
pub const CELEBRATION_WAVE_DELAY_MS: f64 = 120.0;
pub const CELEBRATION_FILL_DURATION_MS: f64 = 240.0;
/// Share of the celebration over which pieces fade out.
pub const CELEBRATION_FADE_SHARE: f64 = 0.4;
/// Alpha above which a pixel counts as filled in an occupancy mask.
pub const MASK_ALPHA_THRESHOLD: u8 = 128;
