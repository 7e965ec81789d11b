//! Piece image preloading.

use std::collections::BTreeMap;
use std::future::Future;

use crate::error::{PuzzleError, Result};
use crate::models::Puzzle;

/// Loads one image by source path. The browser crate backs this with
/// `HtmlImageElement`; tests use in-memory fakes.
pub trait ImageProvider {
    type Image;

    fn load(&self, src: &str) -> impl Future<Output = Result<Self::Image>>;
}

/// Load every distinct image a puzzle references, in source order.
///
/// Stops at the first failure so the page can show a single error instead
/// of a half-drawn board.
pub async fn load_piece_images<P: ImageProvider>(
    provider: &P,
    puzzle: &Puzzle,
) -> Result<BTreeMap<String, P::Image>> {
    let mut images = BTreeMap::new();
    for src in puzzle.image_sources() {
        if images.contains_key(src) {
            continue;
        }
        let image = provider.load(src).await.map_err(|err| match err {
            e @ PuzzleError::ImageLoad { .. } => e,
            other => PuzzleError::ImageLoad {
                src: src.to_string(),
                reason: other.to_string(),
            },
        })?;
        tracing::debug!(src, "piece image loaded");
        images.insert(src.to_string(), image);
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::config::EngineConfig;

    struct Fake {
        fail: Option<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl ImageProvider for Fake {
        type Image = usize;

        async fn load(&self, src: &str) -> Result<usize> {
            self.calls.borrow_mut().push(src.to_string());
            if self.fail == Some(src) {
                return Err(PuzzleError::InvalidConfig("boom".into()));
            }
            Ok(src.len())
        }
    }

    fn puzzle() -> Puzzle {
        let json = r#"{
            "puzzlePiecesData": [
                {"src": "pieces/square.svg", "shape": "square", "startCol": 0, "startRow": 0},
                {"src": "pieces/square.svg", "shape": "square", "startCol": 4, "startRow": 0},
                {"src": "pieces/diamond.svg", "shape": "diamond", "startCol": 8, "startRow": 0}
            ],
            "solutions": [[
                {"src": "pieces/square.svg", "shape": "square", "col": 2, "row": 2},
                {"src": "pieces/square.svg", "shape": "square", "col": 6, "row": 2},
                {"src": "pieces/diamond.svg", "shape": "diamond", "col": 2, "row": 6}
            ]]
        }"#;
        Puzzle::from_json(json, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn loads_each_source_once() {
        let fake = Fake {
            fail: None,
            calls: RefCell::new(Vec::new()),
        };
        let images = pollster::block_on(load_piece_images(&fake, &puzzle())).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images["pieces/diamond.svg"], "pieces/diamond.svg".len());
        assert_eq!(fake.calls.borrow().len(), 2);
    }

    #[test]
    fn first_failure_names_the_source() {
        let fake = Fake {
            fail: Some("pieces/diamond.svg"),
            calls: RefCell::new(Vec::new()),
        };
        let err = pollster::block_on(load_piece_images(&fake, &puzzle())).unwrap_err();
        match err {
            PuzzleError::ImageLoad { src, reason } => {
                assert_eq!(src, "pieces/diamond.svg");
                assert!(reason.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
