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
fn a_function_declared_after_its_first_call_site_still_resolves() {
    // relies on the whole-program pre-scan registering every function
    // before the first statement executes.
    let src = "\
delay square(6)
function square($n)
  return $n * $n
end_function
";
    assert_eq!(run(src), vec![Action::Delay(36)]);
}

#[test]
fn a_function_with_no_return_statement_yields_zero() {
    let src = "\
function noop()
  string side_effect
end_function
delay noop()
";
    assert_eq!(
        run(src),
        vec![Action::TypeString(b"side_effect".to_vec()), Action::Delay(0)]
    );
}

#[test]
fn mutually_nested_calls_compute_the_right_value() {
    let src = "\
function double($n)
  return $n * 2
end_function
function quadruple($n)
  return double(double($n))
end_function
delay quadruple(3)
";
    assert_eq!(run(src), vec![Action::Delay(12)]);
}

#[test]
fn a_function_called_twice_does_not_leak_state_between_calls() {
    let src = "\
function inc($n)
  var $step = 1
  return $n + $step
end_function
delay inc(1)
delay inc(100)
";
    assert_eq!(run(src), vec![Action::Delay(2), Action::Delay(101)]);
}

#[test]
fn nested_function_declaration_is_callable_before_its_enclosing_function_runs() {
    // `inner` is declared inside `outer`'s body, but the pre-scan hoists
    // every declaration to the outermost scope regardless of nesting, so
    // it is callable from the very first statement — before `outer` has
    // ever been invoked once.
    let src = "\
delay inner(3)
function outer($n)
  function inner($x)
    return $x * 2
  end_function
  return $n
end_function
";
    assert_eq!(run(src), vec![Action::Delay(6)]);
}
