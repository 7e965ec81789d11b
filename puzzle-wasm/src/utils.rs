use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlCanvasElement, MouseEvent, Window};

use puzzle_core::{CanvasSize, EngineConfig};

/// Log a message to the browser console.
pub fn log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

/// Milliseconds on the same clock as `requestAnimationFrame` timestamps.
pub fn now_ms(window: &Window) -> f64 {
    window
        .performance()
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

pub fn canvas_by_id(document: &Document, id: &str) -> Result<HtmlCanvasElement, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("canvas #{id} not found")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str(&format!("#{id} is not a canvas")))
}

/// Resize the canvas backing store to a whole number of grid columns of its
/// CSS width times the device pixel ratio. Returns the new size and ratio.
pub fn fit_canvas(window: &Window, canvas: &HtmlCanvasElement, cols: u32) -> (CanvasSize, f64) {
    let dpr = window.device_pixel_ratio();
    let css_w = canvas
        .parent_element()
        .map(|p| p.get_bounding_client_rect().width())
        .filter(|w| *w > 0.0)
        .unwrap_or_else(|| canvas.client_width() as f64);
    let size = CanvasSize::fit_container(css_w, dpr, cols);
    if canvas.width() != size.width {
        canvas.set_width(size.width);
    }
    if canvas.height() != size.height {
        canvas.set_height(size.height);
    }
    let style = canvas.style();
    let _ = style.set_property("width", &format!("{}px", size.width as f64 / dpr));
    let _ = style.set_property("height", &format!("{}px", size.height as f64 / dpr));
    (size, dpr)
}

/// Convert client coordinates into canvas backing-store pixels so hit
/// testing works even if CSS scales the canvas element.
pub fn event_canvas_coords(e: &MouseEvent, cv: &HtmlCanvasElement) -> (f64, f64) {
    if let Some(el) = cv.dyn_ref::<web_sys::Element>() {
        let rect = el.get_bounding_client_rect();
        let x = (e.client_x() as f64 - rect.left()) * (cv.width() as f64) / rect.width().max(1.0);
        let y = (e.client_y() as f64 - rect.top()) * (cv.height() as f64) / rect.height().max(1.0);
        (x, y)
    } else {
        (e.offset_x() as f64, e.offset_y() as f64)
    }
}

/// Engine settings from `window.__PUZZLE_CONFIG` (a JSON string), or the
/// defaults when absent or invalid.
pub fn read_config(window: &Window) -> EngineConfig {
    let raw = js_sys::Reflect::get(window, &JsValue::from_str("__PUZZLE_CONFIG"))
        .ok()
        .and_then(|v| v.as_string());
    let Some(raw) = raw else {
        return EngineConfig::default();
    };
    match EngineConfig::from_json(&raw) {
        Ok(cfg) => cfg,
        Err(err) => {
            log(&format!("Ignoring __PUZZLE_CONFIG: {err}"));
            EngineConfig::default()
        }
    }
}

/// Build an absolute URL for an asset, taking into account the optional
/// `window.__BASE_URL` which is set by the host page.
pub fn asset_url(path: &str) -> String {
    let p = path.trim();
    if p.starts_with("http://") || p.starts_with("https://") || p.starts_with("data:") {
        return p.to_string();
    }
    let base = web_sys::window()
        .and_then(|w| {
            let v = js_sys::Reflect::get(&w, &JsValue::from_str("__BASE_URL")).ok()?;
            v.as_string()
        })
        .unwrap_or_else(|| "/".to_string());
    let base = if base.ends_with('/') {
        base
    } else {
        format!("{base}/")
    };
    format!("{}{}", base, p.trim_start_matches('/'))
}

/// Fetch a text resource trying a list of fallback URLs in order.
pub async fn fetch_text_with_fallbacks(window: &Window, urls: &[&str]) -> Option<String> {
    for url in urls {
        let resp_value =
            match wasm_bindgen_futures::JsFuture::from(window.fetch_with_str(url)).await {
                Ok(v) => v,
                Err(_) => continue,
            };
        let resp: web_sys::Response = match resp_value.dyn_into() {
            Ok(r) => r,
            Err(_) => continue,
        };
        if !resp.ok() {
            continue;
        }
        if let Ok(text_promise) = resp.text()
            && let Ok(text_js) = wasm_bindgen_futures::JsFuture::from(text_promise).await
            && let Some(s) = text_js.as_string()
        {
            return Some(s);
        }
    }
    None
}

pub fn get_query_param(search: &str, key: &str) -> Option<String> {
    let s = search.trim_start_matches('?');
    for pair in s.split('&') {
        let mut it = pair.splitn(2, '=');
        let k = it.next()?;
        let v = it.next().unwrap_or("");
        if k == key {
            return Some(url_decode(v));
        }
    }
    None
}

fn url_decode(s: &str) -> String {
    let s = s.replace('+', " ");
    percent_encoding::percent_decode_str(&s)
        .decode_utf8_lossy()
        .to_string()
}

/// Remembered completion of a puzzle id, for the daily page.
pub fn is_marked_solved(window: &Window, puzzle_id: &str) -> bool {
    window
        .local_storage()
        .ok()
        .flatten()
        .and_then(|s| s.get_item(&format!("solved:{puzzle_id}")).ok().flatten())
        .is_some()
}

pub fn mark_solved(window: &Window, puzzle_id: &str) {
    if let Ok(Some(storage)) = window.local_storage()
        && storage.set_item(&format!("solved:{puzzle_id}"), "1").is_err()
    {
        log("Could not store completion");
    }
}
