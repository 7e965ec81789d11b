use std::cell::RefCell;
use std::rc::Rc;

use puzzle_core::{Board, CanvasSize, Editor, Puzzle, PuzzleRecord};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

mod canvas;
mod editor;
mod game;
mod images;
mod state;
mod theme;
mod upload;
mod utils;

use crate::canvas::context_2d;
use crate::state::{EDITOR, EditorState, GAME, GameState, View};
use crate::theme::CssTheme;
use crate::utils::{
    asset_url, canvas_by_id, fetch_text_with_fallbacks, fit_canvas, get_query_param, log,
    read_config,
};

fn view(document: &Document, id: &str) -> Result<View, JsValue> {
    let canvas = canvas_by_id(document, id)?;
    let ctx = context_2d(&canvas)?;
    Ok(View { canvas, ctx })
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    if document.get_element_by_id("puzzle-canvas").is_some() {
        start_game(window, document)
    } else if document.get_element_by_id("editor-canvas-solution").is_some() {
        start_editor(window, document)
    } else {
        log("No puzzle canvas on this page");
        Ok(())
    }
}

fn start_game(window: Window, document: Document) -> Result<(), JsValue> {
    let board = view(&document, "puzzle-canvas")?;
    let reference = view(&document, "reference-canvas").ok();
    let state = Rc::new(RefCell::new(GameState {
        theme: CssTheme::new(window.clone()),
        window: window.clone(),
        document,
        board,
        reference,
        game: None,
        puzzle_id: None,
        dirty: true,
    }));
    GAME.with(|st| st.replace(Some(state.clone())));
    game::attach_pointer(state.clone())?;
    game::attach_controls(state.clone())?;

    // ?p=<name> loads puzzles/<name>.json; otherwise the host calls load_puzzle
    if let Ok(search) = window.location().search()
        && let Some(name) = get_query_param(&search, "p")
    {
        let st = state.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = fetch_and_load_puzzle(st, &name).await {
                log(&format!("Failed to load puzzle '{name}': {err:?}"));
            }
        });
    }

    let st = state.clone();
    start_animation(move |ts| game::frame(&st, ts));
    Ok(())
}

fn start_editor(window: Window, document: Document) -> Result<(), JsValue> {
    let solution = view(&document, "editor-canvas-solution")?;
    let start = view(&document, "editor-canvas-start")?;
    let cfg = read_config(&window);
    let cols = cfg.grid_cols;
    let editor = Editor::new(cfg, CanvasSize::default(), CanvasSize::default());
    let state = Rc::new(RefCell::new(EditorState {
        theme: CssTheme::new(window.clone()),
        window,
        document,
        solution,
        start,
        editor,
        undo: Vec::new(),
        redo: Vec::new(),
        delete_held_since: None,
        dirty: true,
    }));
    {
        let mut s = state.borrow_mut();
        for board in [Board::Solution, Board::Start] {
            let canvas = match board {
                Board::Solution => s.solution.canvas.clone(),
                Board::Start => s.start.canvas.clone(),
            };
            let (size, dpr) = fit_canvas(&s.window, &canvas, cols);
            s.editor.resize(board, size, dpr);
        }
        let initial = s.editor.snapshot();
        s.undo.push(initial);
        editor::update_palette(&s);
    }
    EDITOR.with(|st| st.replace(Some(state.clone())));
    editor::attach_pointer(state.clone())?;
    editor::attach_keyboard(state.clone())?;
    editor::attach_controls(state.clone())?;
    upload::attach_file_input(state.clone())?;

    let st = state.clone();
    start_animation(move |_ts| editor::frame(&st));
    Ok(())
}

async fn fetch_and_load_puzzle(state: Rc<RefCell<GameState>>, name: &str) -> Result<(), JsValue> {
    let window = state.borrow().window.clone();
    let text = fetch_text_with_fallbacks(
        &window,
        &[
            &asset_url(&format!("puzzles/{name}.json")),
            &format!("/puzzles/{name}.json"),
            &format!("puzzles/{name}.json"),
        ],
    )
    .await
    .ok_or_else(|| JsValue::from_str("puzzle file not found"))?;
    let record = PuzzleRecord::from_json(&text).map_err(game::to_js)?;
    game::install_puzzle(state, record).await
}

/// Drive `frame` from `requestAnimationFrame` for the lifetime of the page.
fn start_animation(mut frame: impl FnMut(f64) + 'static) {
    type RafClosure = Closure<dyn FnMut(f64)>;
    let f: Rc<RefCell<Option<RafClosure>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        frame(ts);
        if let (Some(window), Some(cb)) = (web_sys::window(), f.borrow().as_ref()) {
            let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(window), Some(cb)) = (web_sys::window(), g.borrow().as_ref()) {
        let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

fn current_game() -> Result<Rc<RefCell<GameState>>, JsValue> {
    GAME.with(|st| st.borrow().clone())
        .ok_or_else(|| JsValue::from_str("no puzzle board on this page"))
}

/// Load a puzzle from JSON (a puzzle record or bare puzzle data). Resolves
/// once the piece images are ready.
#[wasm_bindgen(js_name = loadPuzzle)]
pub async fn load_puzzle(json: String) -> Result<(), JsValue> {
    let state = current_game()?;
    let record = PuzzleRecord::from_json(&json).map_err(game::to_js)?;
    game::install_puzzle(state, record).await
}

/// Put every piece back on its start cell and restart the clock.
#[wasm_bindgen(js_name = resetPuzzle)]
pub fn reset_puzzle() -> Result<(), JsValue> {
    let state = current_game()?;
    let mut s = state.borrow_mut();
    let now = utils::now_ms(&s.window);
    if let Some(game) = s.game.as_mut() {
        game.reset(now);
    }
    s.dirty = true;
    Ok(())
}

/// Show the current puzzle as already completed, without a solved event.
#[wasm_bindgen(js_name = restoreCompleted)]
pub fn restore_completed() -> Result<(), JsValue> {
    let state = current_game()?;
    let mut s = state.borrow_mut();
    if let Some(game) = s.game.as_mut() {
        game.restore_solved();
    }
    s.dirty = true;
    Ok(())
}

/// PNG preview of a puzzle's solution for gallery cards.
#[wasm_bindgen(js_name = puzzleThumbnail)]
pub fn puzzle_thumbnail(json: &str, size: u32) -> Result<Vec<u8>, JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let cfg = read_config(&window);
    let record = PuzzleRecord::from_json(json).map_err(game::to_js)?;
    let puzzle = Puzzle::from_data(&record.puzzle_data, &cfg).map_err(game::to_js)?;
    let theme = CssTheme::new(window);
    puzzle_core::export::thumbnail_png(&puzzle, size, &cfg, &theme).map_err(game::to_js)
}

/// Undo the last editor change.
#[wasm_bindgen(js_name = editorUndo)]
pub fn editor_undo() {
    if let Some(state) = EDITOR.with(|st| st.borrow().clone()) {
        state.borrow_mut().undo();
    }
}

#[wasm_bindgen(js_name = editorRedo)]
pub fn editor_redo() {
    if let Some(state) = EDITOR.with(|st| st.borrow().clone()) {
        state.borrow_mut().redo();
    }
}
