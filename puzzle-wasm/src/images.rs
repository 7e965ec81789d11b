use std::cell::RefCell;
use std::rc::Rc;

use puzzle_core::images::ImageProvider;
use puzzle_core::{PuzzleError, Result};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlImageElement};

use crate::utils::asset_url;

/// Loads piece images through `<img>` elements.
pub struct HtmlImages;

impl ImageProvider for HtmlImages {
    type Image = HtmlImageElement;

    async fn load(&self, src: &str) -> Result<HtmlImageElement> {
        let fail = |reason: String| PuzzleError::ImageLoad {
            src: src.to_string(),
            reason,
        };
        let img = HtmlImageElement::new().map_err(|e| fail(format!("{e:?}")))?;
        let url = asset_url(src);

        // settle the promise from onload/onerror; both closures live until then
        let handlers: Rc<RefCell<Vec<Closure<dyn FnMut(Event)>>>> = Rc::default();
        let promise = {
            let img = img.clone();
            let handlers = handlers.clone();
            js_sys::Promise::new(&mut move |resolve, reject| {
                let onload = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_e: Event| {
                    let _ = resolve.call0(&JsValue::NULL);
                }));
                let onerror = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_e: Event| {
                    let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("image failed to load"));
                }));
                img.set_onload(Some(onload.as_ref().unchecked_ref()));
                img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
                handlers.borrow_mut().extend([onload, onerror]);
            })
        };
        img.set_src(&url);
        let outcome = wasm_bindgen_futures::JsFuture::from(promise).await;
        img.set_onload(None);
        img.set_onerror(None);
        handlers.borrow_mut().clear();
        outcome.map_err(|e| fail(e.as_string().unwrap_or_else(|| format!("{e:?}"))))?;
        Ok(img)
    }
}
