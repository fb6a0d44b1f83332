use std::io::Cursor;

use keyscript::action::testing::RecordingSink;
use keyscript::error::ErrorKind;
use keyscript::interpreter::Interpreter;

fn run_err(src: &str) -> keyscript::error::Error {
    let mut interp =
        Interpreter::new(Cursor::new(src.as_bytes().to_vec()), RecordingSink::default())
            .unwrap();
    interp.run().unwrap_err()
}

#[test]
fn dividing_by_zero_is_a_semantic_error() {
    let err = run_err("delay 1 / 0\n");
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert_eq!(err.line, 1);
}

#[test]
fn an_unknown_key_name_is_a_lexical_error() {
    let err = run_err("key definitelynotakey\n");
    assert_eq!(err.kind, ErrorKind::Lexical);
}

#[test]
fn calling_an_undeclared_function_is_a_syntactic_error() {
    let err = run_err("delay ghost(1)\n");
    assert_eq!(err.kind, ErrorKind::Syntactic);
}

#[test]
fn calling_with_the_wrong_number_of_arguments_is_a_syntactic_error() {
    let src = "\
function add($x, $y)
  return $x + $y
end_function
delay add(1)
";
    let err = run_err(src);
    assert_eq!(err.kind, ErrorKind::Syntactic);
}

#[test]
fn a_return_statement_outside_any_function_is_a_syntactic_error() {
    let err = run_err("return 1\n");
    assert_eq!(err.kind, ErrorKind::Syntactic);
}

#[test]
fn a_truncated_if_block_with_no_end_if_is_a_structural_error() {
    let err = run_err("if true\n  string x\n");
    assert_eq!(err.kind, ErrorKind::Structural);
}

#[test]
fn the_rendered_error_includes_the_offending_source_line() {
    let source = "delay 1 / 0\n";
    let err = run_err(source);
    let rendered = err.render(source);
    assert!(rendered.contains("delay 1 / 0"));
    assert!(rendered.contains("semantic error"));
}
