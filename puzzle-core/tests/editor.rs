use puzzle_core::models::Rotation;
use puzzle_core::{
    Board, CanvasSize, Direction, Editor, EngineConfig, Modifiers, PuzzleError, Shape, Theme,
};

fn editor() -> Editor {
    Editor::new(
        EngineConfig::default(),
        CanvasSize::square(640),
        CanvasSize::square(640),
    )
}

const CTRL: Modifiers = Modifiers { ctrl: true };

#[test]
fn drag_snaps_live_and_checkpoints_once() {
    let mut ed = editor();
    ed.add_piece(Shape::Square, (0, 0)).unwrap();
    // square at (6, 6) covers 240..400 on a 640px board
    ed.pointer_down(Board::Solution, 300.0, 300.0, Modifiers::default());
    assert!(ed.pointer_move(385.0, 300.0));
    assert_eq!(ed.pieces(Board::Solution)[0].cell(), (8, 6));
    assert_eq!(ed.pieces(Board::Solution)[0].x, 320.0);
    // the start twin stays put
    assert_eq!(ed.pieces(Board::Start)[0].cell(), (6, 6));

    let snap = ed.pointer_up().unwrap();
    assert_eq!(snap.solution[0].cell(), (8, 6));
    assert!(ed.pointer_up().is_none());
}

#[test]
fn click_without_moving_is_not_a_checkpoint() {
    let mut ed = editor();
    ed.add_piece(Shape::Square, (0, 0)).unwrap();
    ed.pointer_down(Board::Solution, 300.0, 300.0, Modifiers::default());
    ed.pointer_move(305.0, 302.0);
    assert!(ed.pointer_up().is_none());
}

#[test]
fn drag_keeps_one_visual_cell_margin() {
    let mut ed = editor();
    ed.add_piece(Shape::Square, (0, 0)).unwrap();
    ed.pointer_down(Board::Solution, 300.0, 300.0, Modifiers::default());
    ed.pointer_move(-500.0, 900.0);
    ed.pointer_up();
    assert_eq!(ed.pieces(Board::Solution)[0].cell(), (2, 10));
}

#[test]
fn gesture_belongs_to_its_board_until_release() {
    let mut ed = editor();
    ed.add_piece(Shape::Square, (0, 0)).unwrap();
    assert_eq!(ed.gesture_board(), None);

    ed.pointer_down(Board::Start, 300.0, 300.0, Modifiers::default());
    assert_eq!(ed.gesture_board(), Some(Board::Start));
    // the pointer may wander past the canvas edge mid-drag
    assert!(ed.pointer_move(1200.0, 300.0));
    assert!(ed.pointer_move(460.0, 300.0));
    assert_eq!(ed.pieces(Board::Start)[0].cell(), (10, 6));
    assert!(ed.pointer_up().is_some());
    assert_eq!(ed.gesture_board(), None);

    ed.pointer_down(Board::Solution, 20.0, 20.0, Modifiers::default());
    assert_eq!(ed.gesture_board(), Some(Board::Solution));
    ed.pointer_up();
    assert_eq!(ed.gesture_board(), None);
}

#[test]
fn nudge_stops_at_the_margin() {
    let mut ed = editor();
    ed.add_piece(Shape::Square, (0, 0)).unwrap();
    for _ in 0..4 {
        ed.nudge(Direction::Right);
    }
    assert_eq!(ed.pieces(Board::Solution)[0].cell(), (10, 6));
    assert!(ed.nudge(Direction::Right).is_none());
    assert!(ed.nudge(Direction::Up).is_some());
    assert_eq!(ed.pieces(Board::Solution)[0].cell(), (10, 5));
}

#[test]
fn rotate_and_resize_follow_to_the_start_board() {
    let mut ed = editor();
    ed.add_piece(Shape::Triangle, (-3, 2)).unwrap();
    ed.rotate(true).unwrap();
    assert_eq!(ed.pieces(Board::Start)[0].rotation, Rotation::R90);
    ed.rotate(false).unwrap();
    ed.rotate(false).unwrap();
    assert_eq!(ed.pieces(Board::Solution)[0].rotation, Rotation::R270);

    ed.toggle_size().unwrap();
    let start = &ed.pieces(Board::Start)[0];
    assert_eq!((start.grid_width, start.grid_height), (3.0, 1.5));
    ed.toggle_size().unwrap();
    let sol = &ed.pieces(Board::Solution)[0];
    assert_eq!((sol.grid_width, sol.grid_height), (2.0, 1.0));
}

#[test]
fn rotation_is_solution_board_only() {
    let mut ed = editor();
    ed.add_piece(Shape::Square, (0, 0)).unwrap();
    ed.pointer_down(Board::Start, 300.0, 300.0, Modifiers::default());
    ed.pointer_up();
    assert_eq!(ed.active_board(), Some(Board::Start));
    assert!(ed.rotate(true).is_none());
    assert!(ed.toggle_size().is_none());
    assert!(ed.nudge(Direction::Down).is_some());
}

#[test]
fn ctrl_click_toggles_and_box_selects_by_centre() {
    let mut ed = editor();
    let a = ed.add_piece(Shape::Square, (0, 0)).unwrap().solution[0].id;
    ed.nudge(Direction::Left);
    ed.nudge(Direction::Left);
    ed.nudge(Direction::Left);
    ed.nudge(Direction::Left);
    let b = ed.add_piece(Shape::Diamond, (0, 0)).unwrap().solution[1].id;
    ed.nudge(Direction::Right);
    ed.nudge(Direction::Right);
    ed.nudge(Direction::Right);
    ed.nudge(Direction::Right);
    // a covers 80..240, b covers 400..560 on both axes from row 6

    ed.pointer_down(Board::Solution, 120.0, 300.0, CTRL);
    ed.pointer_up();
    assert_eq!(ed.selection(), &[b, a]);
    ed.pointer_down(Board::Solution, 120.0, 300.0, CTRL);
    ed.pointer_up();
    assert_eq!(ed.selection(), &[b]);

    // empty space clears, then the box picks up only a's centre
    ed.pointer_down(Board::Solution, 20.0, 20.0, Modifiers::default());
    assert!(ed.selection().is_empty());
    ed.pointer_move(200.0, 400.0);
    assert!(ed.selection_box().is_some());
    assert!(ed.render(Board::Solution, &Theme::default()).is_some());
    ed.pointer_up();
    assert_eq!(ed.selection(), &[a]);
    assert!(ed.selection_box().is_none());
}

#[test]
fn delete_removes_twins_and_undo_restores() {
    let mut ed = editor();
    let before = ed.add_piece(Shape::Square, (2, 2)).unwrap();
    ed.add_piece(Shape::Diamond, (-2, -2)).unwrap();
    let after = ed.delete_selected().unwrap();
    assert_eq!(after.solution.len(), 1);
    assert_eq!(after.start.len(), 1);
    assert!(ed.delete_selected().is_none());

    ed.restore(&before);
    assert_eq!(ed.snapshot(), before);
    assert!(ed.selection().is_empty());

    assert!(ed.delete_all().is_some());
    assert_eq!(ed.piece_count(), 0);
    assert!(ed.delete_all().is_none());
}

#[test]
fn publish_requires_three_pieces_and_round_trips() {
    let mut ed = editor();
    ed.add_piece(Shape::Square, (-4, -4)).unwrap();
    ed.add_piece(Shape::RightTriangle, (4, 0)).unwrap();
    match ed.to_puzzle_data() {
        Err(PuzzleError::NotEnoughPieces { required, found }) => {
            assert_eq!((required, found), (3, 2));
        }
        other => panic!("expected NotEnoughPieces, got {other:?}"),
    }
    ed.add_piece(Shape::TrapezoidRight, (0, 4)).unwrap();
    ed.rotate(true).unwrap();

    let data = ed.to_puzzle_data().unwrap();
    assert_eq!(data.puzzle_pieces_data.len(), 3);
    assert_eq!(data.solutions.len(), 1);
    assert!(data.puzzle_pieces_data.iter().all(|p| p.start_col.is_some() && p.col.is_none()));
    assert_eq!(data.solutions[0][2].rotation, Some(90.0));
    assert_eq!(
        data.solutions[0][1].src.as_deref(),
        Some("pieces/right-triangle.svg")
    );

    let json = serde_json::to_string(&data).unwrap();
    let mut other = editor();
    other
        .load(&serde_json::from_str(&json).unwrap())
        .unwrap();
    assert_eq!(other.snapshot(), ed.snapshot());
}

#[test]
fn unscattered_start_already_looks_solved() {
    let mut ed = editor();
    assert!(!ed.start_looks_solved());
    ed.add_piece(Shape::Square, (0, 0)).unwrap();
    assert!(ed.start_looks_solved());
    ed.add_piece(Shape::Diamond, (-4, 0)).unwrap();
    assert!(!ed.start_looks_solved());
}

#[test]
fn load_rejects_what_the_editor_cannot_edit() {
    let mut ed = editor();
    ed.add_piece(Shape::Square, (0, 0)).unwrap();
    let before = ed.snapshot();

    let unknown = serde_json::from_str(
        r#"{"puzzlePiecesData": [{"shape": "hexagon"}], "solutions": [[{"shape": "hexagon"}]]}"#,
    )
    .unwrap();
    assert!(matches!(ed.load(&unknown), Err(PuzzleError::UnknownShape(_))));

    let tilted = serde_json::from_str(
        r#"{"puzzlePiecesData": [{"shape": "square", "rotation": 30}], "solutions": [[{"shape": "square"}]]}"#,
    )
    .unwrap();
    assert!(matches!(ed.load(&tilted), Err(PuzzleError::InvalidRotation(_))));
    assert_eq!(ed.snapshot(), before);
}
