//! Create page: two editor boards, palette, keyboard shortcuts and publish.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Array;
use puzzle_core::editor::shape_for_key;
use puzzle_core::export::thumbnail_png;
use puzzle_core::{Board, Direction, Modifiers, Puzzle, Shape};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Blob, CustomEvent, CustomEventInit, Document, HtmlElement, KeyboardEvent, PointerEvent, Url,
};

use crate::canvas::present;
use crate::game::to_js;
use crate::state::{EditorState, View};
use crate::utils::{event_canvas_coords, fit_canvas, log, now_ms};

/// Holding the delete key this long removes every piece.
const DELETE_ALL_HOLD_MS: f64 = 1000.0;
const THUMBNAIL_SIZE: u32 = 256;

/// Random scatter in `[-4, 4]` cells per axis for a new start twin.
fn scatter() -> (i32, i32) {
    let r = || (js_sys::Math::random() * 9.0).floor() as i32 - 4;
    (r(), r())
}

fn view(s: &EditorState, board: Board) -> &View {
    match board {
        Board::Solution => &s.solution,
        Board::Start => &s.start,
    }
}

pub fn add_piece(s: &mut EditorState, shape: Shape) {
    match s.editor.add_piece(shape, scatter()) {
        Ok(snap) => s.commit(Some(snap)),
        Err(err) => log(&err.to_string()),
    }
    update_palette(s);
}

/// Grey out the palette at the piece limit and the publish button below
/// the publish minimum.
pub fn update_palette(s: &EditorState) {
    if let Some(palette) = s.document.get_element_by_id("piece-palette") {
        let _ = palette
            .class_list()
            .toggle_with_force("disabled", !s.editor.can_add());
    }
    if let Some(btn) = s.document.get_element_by_id("export-button") {
        let _ = if s.editor.can_publish() {
            btn.remove_attribute("disabled")
        } else {
            btn.set_attribute("disabled", "")
        };
    }
}

/// Gestures start on a board and then follow the pointer through `window`,
/// so a drag or box selection survives leaving the canvas.
pub fn attach_pointer(state: Rc<RefCell<EditorState>>) -> Result<(), JsValue> {
    for board in [Board::Solution, Board::Start] {
        let canvas = view(&state.borrow(), board).canvas.clone();
        let st = state.clone();
        let down = Closure::<dyn FnMut(PointerEvent)>::wrap(Box::new(move |e: PointerEvent| {
            let mut s = st.borrow_mut();
            let (x, y) = event_canvas_coords(&e, &view(&s, board).canvas);
            let mods = Modifiers {
                ctrl: e.ctrl_key() || e.meta_key(),
            };
            s.editor.pointer_down(board, x, y, mods);
            s.dirty = true;
        }));
        canvas.add_event_listener_with_callback("pointerdown", down.as_ref().unchecked_ref())?;
        down.forget();
    }

    let window = state.borrow().window.clone();
    {
        let st = state.clone();
        let moved = Closure::<dyn FnMut(PointerEvent)>::wrap(Box::new(move |e: PointerEvent| {
            let mut s = st.borrow_mut();
            let Some(board) = s.editor.gesture_board() else {
                return;
            };
            let (x, y) = event_canvas_coords(&e, &view(&s, board).canvas);
            if s.editor.pointer_move(x, y) {
                s.dirty = true;
            }
        }));
        window.add_event_listener_with_callback("pointermove", moved.as_ref().unchecked_ref())?;
        moved.forget();
    }
    for kind in ["pointerup", "pointercancel"] {
        let st = state.clone();
        let up = Closure::<dyn FnMut(PointerEvent)>::wrap(Box::new(move |_e: PointerEvent| {
            let mut s = st.borrow_mut();
            if s.editor.gesture_board().is_none() {
                return;
            }
            let snap = s.editor.pointer_up();
            s.commit(snap);
        }));
        window.add_event_listener_with_callback(kind, up.as_ref().unchecked_ref())?;
        up.forget();
    }
    Ok(())
}

pub fn attach_keyboard(state: Rc<RefCell<EditorState>>) -> Result<(), JsValue> {
    let window = state.borrow().window.clone();
    {
        let st = state.clone();
        let keydown = Closure::<dyn FnMut(KeyboardEvent)>::wrap(Box::new(move |e: KeyboardEvent| {
            if is_typing(&e) {
                return;
            }
            let key = e.key().to_lowercase();
            let mut s = st.borrow_mut();
            if e.ctrl_key() || e.meta_key() {
                match key.as_str() {
                    "z" => s.undo(),
                    "y" => s.redo(),
                    _ => return,
                }
                e.prevent_default();
                update_palette(&s);
                return;
            }
            let snap = match key.as_str() {
                "w" => s.editor.nudge(Direction::Up),
                "a" => s.editor.nudge(Direction::Left),
                "s" => s.editor.nudge(Direction::Down),
                "d" => s.editor.nudge(Direction::Right),
                "r" => s.editor.rotate(!e.shift_key()),
                "e" => s.editor.toggle_size(),
                "t" => {
                    if s.delete_held_since.is_none() {
                        s.delete_held_since = Some(now_ms(&s.window));
                    }
                    return;
                }
                k => {
                    if let Some(shape) = shape_for_key(k) {
                        add_piece(&mut s, shape);
                    }
                    return;
                }
            };
            e.prevent_default();
            s.commit(snap);
        }));
        window.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }
    {
        let st = state.clone();
        let keyup = Closure::<dyn FnMut(KeyboardEvent)>::wrap(Box::new(move |e: KeyboardEvent| {
            if e.key().to_lowercase() != "t" {
                return;
            }
            let mut s = st.borrow_mut();
            let Some(since) = s.delete_held_since.take() else {
                return;
            };
            let snap = if now_ms(&s.window) - since >= DELETE_ALL_HOLD_MS {
                s.editor.delete_all()
            } else {
                s.editor.delete_selected()
            };
            s.commit(snap);
            update_palette(&s);
        }));
        window.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        keyup.forget();
    }
    Ok(())
}

fn is_typing(e: &KeyboardEvent) -> bool {
    e.target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA"))
}

fn on_click(
    doc: &Document,
    id: &str,
    state: &Rc<RefCell<EditorState>>,
    mut action: impl FnMut(&mut EditorState) + 'static,
) -> Result<(), JsValue> {
    let Some(el) = doc.get_element_by_id(id) else {
        return Ok(());
    };
    let el: HtmlElement = el.dyn_into()?;
    let st = state.clone();
    let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
        action(&mut st.borrow_mut());
    }));
    el.set_onclick(Some(onclick.as_ref().unchecked_ref()));
    onclick.forget();
    Ok(())
}

pub fn attach_controls(state: Rc<RefCell<EditorState>>) -> Result<(), JsValue> {
    let doc = state.borrow().document.clone();
    on_click(&doc, "rotate-button", &state, |s| {
        let snap = s.editor.rotate(true);
        s.commit(snap);
    })?;
    on_click(&doc, "size-toggle-btn", &state, |s| {
        let snap = s.editor.toggle_size();
        s.commit(snap);
    })?;
    on_click(&doc, "delete-button", &state, |s| {
        let snap = s.editor.delete_selected();
        s.commit(snap);
        update_palette(s);
    })?;
    on_click(&doc, "export-button", &state, |s| {
        if let Err(e) = publish(s) {
            show_publish_error(s, &e.as_string().unwrap_or_else(|| format!("{e:?}")));
        }
    })?;

    // palette buttons carry their shape tag in data-shape
    if let Some(palette) = doc.get_element_by_id("piece-palette") {
        let buttons = palette.query_selector_all("[data-shape]")?;
        for i in 0..buttons.length() {
            let Some(node) = buttons.item(i) else {
                continue;
            };
            let Ok(el) = node.dyn_into::<HtmlElement>() else {
                continue;
            };
            let Some(tag) = el.get_attribute("data-shape") else {
                continue;
            };
            let st = state.clone();
            let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
                add_piece(&mut st.borrow_mut(), Shape::from_tag(&tag));
            }));
            el.set_onclick(Some(onclick.as_ref().unchecked_ref()));
            onclick.forget();
        }
    }

    {
        let st = state.clone();
        let onresize = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            resize(&mut s);
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }
    Ok(())
}

pub fn resize(s: &mut EditorState) {
    let cols = s.editor.grid(Board::Solution).cols;
    for board in [Board::Solution, Board::Start] {
        let (size, dpr) = fit_canvas(&s.window, &view(s, board).canvas, cols);
        s.editor.resize(board, size, dpr);
    }
    s.dirty = true;
}

fn show_publish_error(s: &EditorState, message: &str) {
    log(message);
    if let Some(el) = s.document.get_element_by_id("publish-error") {
        el.set_text_content(Some(message));
    }
}

/// Encode the puzzle, hand it to the page as a `puzzle-publish` event and
/// offer the JSON and a thumbnail as downloads.
fn publish(s: &EditorState) -> Result<(), JsValue> {
    let data = s.editor.to_puzzle_data().map_err(to_js)?;
    if s.editor.start_looks_solved() {
        show_publish_error(s, "Warning: the start layout already matches the solution");
    }
    let name = s
        .document
        .get_element_by_id("puzzle-name-input")
        .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok())
        .map(|input| input.value().trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "puzzle".to_string());

    let json =
        serde_json::to_string_pretty(&data).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let init = CustomEventInit::new();
    init.set_detail(&JsValue::from_str(&json));
    init.set_bubbles(true);
    let ev = CustomEvent::new_with_event_init_dict("puzzle-publish", &init)?;
    s.document.dispatch_event(&ev)?;

    let array = Array::new();
    array.push(&JsValue::from_str(&json));
    download(&s.document, &Blob::new_with_str_sequence(&array)?, &format!("{name}.json"))?;

    let cfg = s.editor.config();
    let puzzle = Puzzle::from_data(&data, cfg).map_err(to_js)?;
    let png = thumbnail_png(&puzzle, THUMBNAIL_SIZE, cfg, &s.theme).map_err(to_js)?;
    let array = Array::new();
    array.push(&js_sys::Uint8Array::from(png.as_slice()));
    download(&s.document, &Blob::new_with_u8_array_sequence(&array)?, &format!("{name}.png"))?;
    Ok(())
}

fn download(document: &Document, blob: &Blob, filename: &str) -> Result<(), JsValue> {
    let url = Url::create_object_url_with_blob(blob)?;
    let a = document.create_element("a")?.dyn_into::<HtmlElement>()?;
    a.set_attribute("href", &url)?;
    a.set_attribute("download", filename)?;
    a.click();
    Url::revoke_object_url(&url)?;
    Ok(())
}

pub fn frame(state: &Rc<RefCell<EditorState>>) {
    let mut s = state.borrow_mut();
    if !s.dirty {
        return;
    }
    s.dirty = false;
    for board in [Board::Solution, Board::Start] {
        let v = view(&s, board);
        present(&v.ctx, &v.canvas, s.editor.render(board, &s.theme));
    }
}
