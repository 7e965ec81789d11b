use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2D context not available"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}

/// Copy a core-rendered frame onto the canvas. `ImageData` wants straight
/// alpha, tiny-skia stores premultiplied.
pub fn blit(ctx: &CanvasRenderingContext2d, pixmap: &tiny_skia::Pixmap) -> Result<(), JsValue> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let image = ImageData::new_with_u8_clamped_array_and_sh(
        Clamped(&data),
        pixmap.width(),
        pixmap.height(),
    )?;
    ctx.put_image_data(&image, 0.0, 0.0)
}

/// Nothing to draw (zero-size board): just clear.
pub fn clear(ctx: &CanvasRenderingContext2d, canvas: &HtmlCanvasElement) {
    ctx.clear_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
}

pub fn present(
    ctx: &CanvasRenderingContext2d,
    canvas: &HtmlCanvasElement,
    frame: Option<tiny_skia::Pixmap>,
) {
    match frame {
        Some(pixmap) => {
            if let Err(e) = blit(ctx, &pixmap) {
                crate::utils::log(&format!("Failed to draw frame: {e:?}"));
            }
        }
        None => clear(ctx, canvas),
    }
}
