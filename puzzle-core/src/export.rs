//! PNG output for thumbnails and board snapshots.

use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use tiny_skia::Pixmap;

use crate::config::EngineConfig;
use crate::error::{PuzzleError, Result};
use crate::grid::{CanvasSize, Grid};
use crate::models::Puzzle;
use crate::raster::{rasterize_silhouette, render_reference, tint};
use crate::theme::ThemeProvider;

/// Encode with fixed settings so identical pixmaps give identical bytes.
/// Pixels are written straight (non-premultiplied) RGBA.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>> {
    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf, pixmap.width(), pixmap.height());
    enc.set_color(ColorType::Rgba);
    enc.set_depth(BitDepth::Eight);
    enc.set_filter(FilterType::NoFilter);
    enc.set_compression(Compression::Default);
    {
        let mut writer = enc.write_header()?;
        writer.write_image_data(&data)?;
    }
    Ok(buf)
}

/// Square thumbnail of the first solution: the accent silhouette on a
/// transparent background, no grid.
pub fn thumbnail_png(
    puzzle: &Puzzle,
    size: u32,
    cfg: &EngineConfig,
    theme: &dyn ThemeProvider,
) -> Result<Vec<u8>> {
    let grid = Grid::new(CanvasSize::square(size), cfg);
    let mut pieces = puzzle.reference().to_vec();
    grid.update_pieces(&mut pieces);
    let silhouette =
        rasterize_silhouette(&pieces, &grid, true).ok_or(PuzzleError::PixmapAlloc(size, size))?;
    encode_png(&tint(&silhouette, theme.accent()))
}

/// Reference board as it appears next to the play board.
pub fn reference_png(
    puzzle: &Puzzle,
    canvas: CanvasSize,
    cfg: &EngineConfig,
    theme: &dyn ThemeProvider,
) -> Result<Vec<u8>> {
    let grid = Grid::new(canvas, cfg);
    let mut pieces = puzzle.reference().to_vec();
    grid.update_pieces(&mut pieces);
    let pixmap = render_reference(&grid, &pieces, theme)
        .ok_or(PuzzleError::PixmapAlloc(canvas.width, canvas.height))?;
    encode_png(&pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;

    fn puzzle() -> Puzzle {
        let json = r#"{
            "puzzlePiecesData": [{"shape": "square", "startCol": 0, "startRow": 0}],
            "solutions": [[{"shape": "square", "col": 4, "row": 4}]]
        }"#;
        Puzzle::from_json(json, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn thumbnail_is_a_deterministic_png() {
        let cfg = EngineConfig::default();
        let a = thumbnail_png(&puzzle(), 64, &cfg, &Theme::default()).unwrap();
        let b = thumbnail_png(&puzzle(), 64, &cfg, &Theme::default()).unwrap();
        assert_eq!(&a[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(a, b);
    }

    #[test]
    fn zero_size_is_an_error() {
        let cfg = EngineConfig::default();
        let err = thumbnail_png(&puzzle(), 0, &cfg, &Theme::default()).unwrap_err();
        assert!(matches!(err, PuzzleError::PixmapAlloc(0, 0)));
    }
}
