use std::cell::RefCell;
use std::rc::Rc;

use puzzle_core::PuzzleRecord;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, FileReader, HtmlInputElement};

use crate::editor::update_palette;
use crate::state::EditorState;
use crate::utils::log;

// Wires up the file input that opens a saved puzzle in the editor.
pub fn attach_file_input(state: Rc<RefCell<EditorState>>) -> Result<(), JsValue> {
    let doc: Document = state.borrow().document.clone();
    let Some(input) = doc.get_element_by_id("file") else {
        return Ok(());
    };
    let input: HtmlInputElement = input.dyn_into()?;
    let st = state.clone();
    let input_for_closure = input.clone();
    let onchange = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_e: Event| {
        let Some(file) = input_for_closure.files().and_then(|f| f.item(0)) else {
            log("No file selected");
            return;
        };
        let reader = match FileReader::new() {
            Ok(r) => r,
            Err(e) => {
                log(&format!("FileReader unavailable: {e:?}"));
                return;
            }
        };
        let st2 = st.clone();
        let reader_for_closure = reader.clone();
        let onload = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_ev: Event| {
            let text = reader_for_closure
                .result()
                .ok()
                .and_then(|r| r.as_string())
                .unwrap_or_default();
            if text.is_empty() {
                log("Selected file is empty or unreadable");
                return;
            }
            let record = match PuzzleRecord::from_json(&text) {
                Ok(r) => r,
                Err(err) => {
                    log(&format!("Unrecognized puzzle JSON: {err}"));
                    return;
                }
            };
            let mut s = st2.borrow_mut();
            match s.editor.load(&record.puzzle_data) {
                Ok(snap) => {
                    s.undo.clear();
                    s.redo.clear();
                    s.commit(Some(snap));
                    update_palette(&s);
                }
                Err(err) => log(&format!("Failed to open puzzle: {err}")),
            }
        }));
        reader.set_onload(Some(onload.as_ref().unchecked_ref()));
        if let Err(e) = reader.read_as_text(&file) {
            log(&format!("Failed to read file: {e:?}"));
        }
        onload.forget();
    }));
    input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
    onchange.forget();
    Ok(())
}
