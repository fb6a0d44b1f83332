use std::io::Cursor;

use keyscript::action::testing::{Action, RecordingSink};
use keyscript::interpreter::Interpreter;

fn run(src: &str) -> Vec<Action> {
    let mut interp =
        Interpreter::new(Cursor::new(src.as_bytes().to_vec()), RecordingSink::default())
            .unwrap();
    interp.run().unwrap();
    interp.into_sink().actions
}

#[test]
fn a_script_with_only_strings_types_them_in_order() {
    let actions = run("string Hello, \nstringln World!\nstring done\n");
    assert_eq!(
        actions,
        vec![
            Action::TypeString(b"Hello, ".to_vec()),
            Action::TypeStringln(b"World!".to_vec()),
            Action::TypeString(b"done".to_vec()),
        ]
    );
}

#[test]
fn an_empty_string_command_types_nothing() {
    let actions = run("string\n");
    assert_eq!(actions, vec![Action::TypeString(Vec::new())]);
}

#[test]
fn a_comment_line_produces_no_action() {
    let actions = run("# just a note\nstring after\n");
    assert_eq!(actions, vec![Action::TypeString(b"after".to_vec())]);
}
