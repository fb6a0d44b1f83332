use std::io::Cursor;

use keyscript::action::testing::{Action, RecordingSink};
use keyscript::interpreter::Interpreter;
use keyscript::lexer::keys::{Key, Modifiers};

fn run(src: &str) -> Vec<Action> {
    let mut interp =
        Interpreter::new(Cursor::new(src.as_bytes().to_vec()), RecordingSink::default())
            .unwrap();
    interp.run().unwrap();
    interp.into_sink().actions
}

#[test]
fn a_bare_key_command_with_one_modifier_and_one_letter_taps_the_letter() {
    let actions = run("key ctrl c\n");
    assert_eq!(actions, vec![Action::Key(Key::Char(b'c'), Modifiers::CTRL)]);
}

#[test]
fn two_modifiers_are_combined_with_bitwise_or() {
    let actions = run("key ctrl shift esc\n");
    assert_eq!(
        actions,
        vec![Action::Key(Key::Esc, Modifiers::CTRL.or(Modifiers::SHIFT))]
    );
}

#[test]
fn hold_then_release_emits_both_actions_in_order_with_the_same_key_set() {
    let actions = run("hold ctrl alt del\nrelease ctrl alt del\n");
    assert_eq!(
        actions,
        vec![
            Action::Hold(vec![Key::Ctrl, Key::Alt, Key::Del]),
            Action::Release(vec![Key::Ctrl, Key::Alt, Key::Del]),
        ]
    );
}

#[test]
fn a_single_unmodified_key_taps_itself() {
    let actions = run("key enter\n");
    assert_eq!(actions, vec![Action::Key(Key::Enter, Modifiers::default())]);
}

// The four tests above exercise `key <names...>`, a crate-only convenience
// alias. The language's normative key-tap statement has no keyword at all —
// a statement line simply starting with a bare key name — so the following
// exercise that form directly.

#[test]
fn a_bare_key_name_with_no_keyword_taps_itself() {
    let actions = run("esc\n");
    assert_eq!(actions, vec![Action::Key(Key::Esc, Modifiers::default())]);
}

#[test]
fn a_bare_statement_line_of_modifiers_then_a_letter_taps_the_letter() {
    let actions = run("ctrl alt del\n");
    assert_eq!(
        actions,
        vec![Action::Key(Key::Del, Modifiers::CTRL.or(Modifiers::ALT))]
    );
}

#[test]
fn bare_key_statements_and_other_statements_interleave_in_source_order() {
    let actions = run("string a\nenter\nstring b\n");
    assert_eq!(
        actions,
        vec![
            Action::TypeString(b"a".to_vec()),
            Action::Key(Key::Enter, Modifiers::default()),
            Action::TypeString(b"b".to_vec()),
        ]
    );
}
