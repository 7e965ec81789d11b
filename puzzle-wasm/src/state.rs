use std::cell::RefCell;
use std::rc::Rc;

use puzzle_core::{Editor, EditorSnapshot, Gameplay};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, Window};

use crate::theme::CssTheme;

/// A canvas and its 2D context.
#[derive(Clone)]
pub struct View {
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
}

/// Play page: gameplay board plus the reference board.
pub struct GameState {
    pub window: Window,
    pub document: Document,
    pub board: View,
    pub reference: Option<View>,
    pub theme: CssTheme,
    pub game: Option<Gameplay>,
    pub puzzle_id: Option<String>,
    pub dirty: bool,
}

/// Create page: the editor model, both boards and the undo history.
pub struct EditorState {
    pub window: Window,
    pub document: Document,
    pub solution: View,
    pub start: View,
    pub theme: CssTheme,
    pub editor: Editor,
    pub undo: Vec<EditorSnapshot>,
    pub redo: Vec<EditorSnapshot>,
    /// When the delete key went down, for hold-to-delete-all.
    pub delete_held_since: Option<f64>,
    pub dirty: bool,
}

impl EditorState {
    /// Record a checkpoint produced by an editor operation.
    pub fn commit(&mut self, snap: Option<EditorSnapshot>) {
        if let Some(snap) = snap
            && self.undo.last() != Some(&snap)
        {
            self.undo.push(snap);
            self.redo.clear();
        }
        self.dirty = true;
    }

    pub fn undo(&mut self) {
        if self.undo.len() < 2 {
            return;
        }
        if let Some(current) = self.undo.pop() {
            self.redo.push(current);
        }
        if let Some(snap) = self.undo.last() {
            self.editor.restore(snap);
        }
        self.dirty = true;
    }

    pub fn redo(&mut self) {
        if let Some(snap) = self.redo.pop() {
            self.editor.restore(&snap);
            self.undo.push(snap);
        }
        self.dirty = true;
    }
}

/// Thread local storage for the single runtime state of each page kind.
thread_local! {
    pub static GAME: RefCell<Option<Rc<RefCell<GameState>>>> = const { RefCell::new(None) };
    pub static EDITOR: RefCell<Option<Rc<RefCell<EditorState>>>> = const { RefCell::new(None) };
}
