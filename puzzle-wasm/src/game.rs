//! Play page: pointer wiring, the frame loop and the solved event.

use std::cell::RefCell;
use std::rc::Rc;

use puzzle_core::images::load_piece_images;
use puzzle_core::{CompletionStats, Gameplay, Puzzle, PuzzleRecord};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, CustomEventInit, HtmlElement, PointerEvent};

use crate::canvas::present;
use crate::images::HtmlImages;
use crate::state::{GAME, GameState};
use crate::utils::{event_canvas_coords, fit_canvas, is_marked_solved, log, mark_solved, now_ms, read_config};

/// Replace the current puzzle. Images are loaded first; a failed image
/// leaves the previous board in place.
pub async fn install_puzzle(state: Rc<RefCell<GameState>>, record: PuzzleRecord) -> Result<(), JsValue> {
    let cfg = read_config(&state.borrow().window);
    let puzzle = Puzzle::from_data(&record.puzzle_data, &cfg).map_err(to_js)?;
    set_loading(&state.borrow(), true);
    let loaded = load_piece_images(&HtmlImages, &puzzle).await;
    set_loading(&state.borrow(), false);
    loaded.map_err(to_js)?;

    let mut s = state.borrow_mut();
    let (size, dpr) = fit_canvas(&s.window, &s.board.canvas, cfg.grid_cols);
    let mut game = Gameplay::new(puzzle, size, cfg, now_ms(&s.window));
    game.resize(size, dpr);
    if let Some(id) = record.id.as_deref()
        && is_marked_solved(&s.window, id)
    {
        game.restore_solved();
    }
    s.puzzle_id = record.id;
    s.game = Some(game);
    s.dirty = true;
    Ok(())
}

pub fn to_js(err: puzzle_core::PuzzleError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn set_loading(s: &GameState, on: bool) {
    if let Some(el) = s.document.get_element_by_id("loading-indicator")
        && let Ok(el) = el.dyn_into::<HtmlElement>()
    {
        let _ = el.style().set_property("display", if on { "block" } else { "none" });
    }
}

fn dispatch_solved(s: &GameState, stats: CompletionStats) {
    let detail = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&detail, &"elapsedMs".into(), &stats.elapsed_ms.into());
    let _ = js_sys::Reflect::set(&detail, &"moves".into(), &stats.moves.into());
    if let Some(id) = &s.puzzle_id {
        let _ = js_sys::Reflect::set(&detail, &"puzzleId".into(), &id.into());
        mark_solved(&s.window, id);
    }
    let init = CustomEventInit::new();
    init.set_detail(&detail);
    init.set_bubbles(true);
    match CustomEvent::new_with_event_init_dict("puzzle-solved", &init) {
        Ok(ev) => {
            let _ = s.board.canvas.dispatch_event(&ev);
        }
        Err(e) => log(&format!("Failed to create puzzle-solved event: {e:?}")),
    }
}

pub fn attach_pointer(state: Rc<RefCell<GameState>>) -> Result<(), JsValue> {
    let canvas = state.borrow().board.canvas.clone();
    {
        let st = state.clone();
        let down = Closure::<dyn FnMut(PointerEvent)>::wrap(Box::new(move |e: PointerEvent| {
            let mut s = st.borrow_mut();
            let (x, y) = event_canvas_coords(&e, &s.board.canvas);
            if let Some(game) = s.game.as_mut()
                && game.pointer_down(x, y)
            {
                e.prevent_default();
                s.dirty = true;
            }
        }));
        canvas.add_event_listener_with_callback("pointerdown", down.as_ref().unchecked_ref())?;
        down.forget();
    }
    {
        let st = state.clone();
        let moved = Closure::<dyn FnMut(PointerEvent)>::wrap(Box::new(move |e: PointerEvent| {
            let mut s = st.borrow_mut();
            let (x, y) = event_canvas_coords(&e, &s.board.canvas);
            if let Some(game) = s.game.as_mut()
                && game.pointer_move(x, y)
            {
                s.dirty = true;
            }
        }));
        canvas.add_event_listener_with_callback("pointermove", moved.as_ref().unchecked_ref())?;
        moved.forget();
    }
    for kind in ["pointerup", "pointercancel", "pointerleave"] {
        let st = state.clone();
        let end = Closure::<dyn FnMut(PointerEvent)>::wrap(Box::new(move |e: PointerEvent| {
            let mut s = st.borrow_mut();
            let now = now_ms(&s.window);
            let Some(game) = s.game.as_mut() else {
                return;
            };
            let changed = match e.type_().as_str() {
                "pointercancel" => game.pointer_cancel(now),
                // touch pointers leave the canvas mid-drag all the time
                "pointerleave" if e.pointer_type() != "mouse" => false,
                "pointerleave" => game.pointer_leave(now),
                _ => game.pointer_up(now),
            };
            s.dirty |= changed;
        }));
        canvas.add_event_listener_with_callback(kind, end.as_ref().unchecked_ref())?;
        end.forget();
    }
    Ok(())
}

pub fn attach_controls(state: Rc<RefCell<GameState>>) -> Result<(), JsValue> {
    let doc = state.borrow().document.clone();
    if let Some(btn) = doc.get_element_by_id("reset-button") {
        let btn: HtmlElement = btn.dyn_into()?;
        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            let now = now_ms(&s.window);
            if let Some(game) = s.game.as_mut() {
                game.reset(now);
            }
            s.dirty = true;
        }));
        btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }
    {
        let st = state.clone();
        let onresize = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            let (size, dpr) = match s.game.as_ref() {
                Some(game) => fit_canvas(&s.window, &s.board.canvas, game.grid().cols),
                None => return,
            };
            if let Some(game) = s.game.as_mut() {
                game.resize(size, dpr);
            }
            s.dirty = true;
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }
    Ok(())
}

/// One animation frame: advance snaps and the celebration, emit the solved
/// event, redraw when needed.
pub fn frame(state: &Rc<RefCell<GameState>>, ts: f64) {
    let mut s = state.borrow_mut();
    let Some(game) = s.game.as_mut() else {
        return;
    };
    let tick = game.tick(ts);
    if let Some(stats) = tick.solved {
        dispatch_solved(&s, stats);
    }
    if !(tick.redraw || s.dirty) {
        return;
    }
    s.dirty = false;
    let Some(game) = s.game.as_ref() else {
        return;
    };
    present(&s.board.ctx, &s.board.canvas, game.render(ts, &s.theme));
    if let Some(reference) = &s.reference {
        let (size, _) = fit_canvas(&s.window, &reference.canvas, game.grid().cols);
        present(&reference.ctx, &reference.canvas, game.render_reference(size, &s.theme));
    }
}
