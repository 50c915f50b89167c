// ABOUTME: Tests for string.* builtin methods

use cozy::env::Environment;
use cozy::eval::{eval_program, EvalContext};
use cozy::object::Object;
use cozy::parser::Parser;

fn eval_src(src: &str) -> Object {
    let env = Environment::new();
    cozy::builtins::register_builtins(env.clone());
    let mut parser = Parser::from_str(src);
    let program = parser.parse_program();
    assert!(parser.errors().is_empty(), "parse errors: {:?}", parser.errors());
    eval_program(&program, &env, &EvalContext::new()).expect("eval failed")
}

#[test]
fn test_string_upper_and_lower() {
    assert_eq!(eval_src("\"Hello\".upper()").inspect(), "HELLO");
    assert_eq!(eval_src("\"Hello\".lower()").inspect(), "hello");
}

#[test]
fn test_string_trim() {
    assert_eq!(eval_src("\"  padded  \".trim()").inspect(), "padded");
}

#[test]
fn test_string_split_and_join() {
    assert_eq!(eval_src("\"a,b,c\".split(\",\")").inspect(), "[a, b, c]");
    assert_eq!(eval_src("\"-\".join([\"a\", \"b\", \"c\"])").inspect(), "a-b-c");
}

#[test]
fn test_string_replace() {
    assert_eq!(eval_src("\"hello world\".replace(\"world\", \"there\")").inspect(), "hello there");
}

#[test]
fn test_string_contains_and_bounds_checks() {
    assert_eq!(eval_src("\"hello\".contains?(\"ell\")").inspect(), "true");
    assert_eq!(eval_src("\"hello\".starts_with?(\"he\")").inspect(), "true");
    assert_eq!(eval_src("\"hello\".ends_with?(\"lo\")").inspect(), "true");
}

#[test]
fn test_string_empty_and_length() {
    assert_eq!(eval_src("\"\".empty?()").inspect(), "true");
    assert_eq!(eval_src("\"hello\".length()").inspect(), "5");
}

#[test]
fn test_string_substring() {
    assert_eq!(eval_src("\"hello world\".substring(0, 5)").inspect(), "hello");
}

#[test]
fn test_string_to_list() {
    assert_eq!(eval_src("len(\"abc\".to_list())").inspect(), "3");
}

#[test]
fn test_string_append() {
    assert_eq!(eval_src("\"foo\".append(\"bar\")").inspect(), "foobar");
}

#[test]
fn test_string_interpolation() {
    assert_eq!(eval_src("let name = \"world\"; \"hello, {{name}}!\"").inspect(), "hello, world!");
}
