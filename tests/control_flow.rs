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
fn nested_if_inside_while_only_fires_on_even_iterations() {
    let src = "\
var $i = 0
while $i < 4
  if $i % 2 == 0
    string even
  end_if
  $i = $i + 1
end_while
";
    let actions = run(src);
    assert_eq!(
        actions,
        vec![
            Action::TypeString(b"even".to_vec()),
            Action::TypeString(b"even".to_vec()),
        ]
    );
}

#[test]
fn a_while_loop_that_never_runs_its_body_only_evaluates_the_guard_once() {
    let actions = run("var $x = 10\nwhile $x < 0\n  string never\nend_while\ndelay $x\n");
    assert_eq!(actions, vec![Action::Delay(10)]);
}

#[test]
fn nested_while_loops_both_advance_independently() {
    let src = "\
var $outer = 0
while $outer < 2
  var $inner = 0
  while $inner < 2
    string x
    $inner = $inner + 1
  end_while
  $outer = $outer + 1
end_while
";
    let actions = run(src);
    assert_eq!(actions.len(), 4);
}

#[test]
fn else_if_chains_fall_through_to_else_when_nothing_matches() {
    let src = "\
var $a = 99
if $a == 1
  delay 1
else_if $a == 2
  delay 2
else
  delay 3
end_if
";
    assert_eq!(run(src), vec![Action::Delay(3)]);
}
