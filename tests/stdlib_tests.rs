// ABOUTME: Tests for bundled .cz standard library modules (collections) and JSON stdlib

use cozy::env::Environment;
use cozy::eval::{eval_program, EvalContext};
use cozy::object::Object;
use cozy::parser::Parser;

const COLLECTIONS_SRC: &str = include_str!("../src/stdlib/cozy/collections.cz");

fn setup() -> std::rc::Rc<Environment> {
    let env = Environment::new();
    cozy::builtins::register_builtins(env.clone());
    run(&env, COLLECTIONS_SRC);
    env
}

fn run(env: &std::rc::Rc<Environment>, src: &str) -> Object {
    let mut parser = Parser::from_str(src);
    let program = parser.parse_program();
    assert!(parser.errors().is_empty(), "parse errors: {:?}", parser.errors());
    eval_program(&program, env, &EvalContext::new()).expect("eval failed")
}

#[test]
fn test_map_doubles_each_element() {
    let env = setup();
    let result = run(&env, "map([1, 2, 3], fn(x) { x * 2 })");
    assert_eq!(result.inspect(), "[2, 4, 6]");
}

#[test]
fn test_filter_keeps_matching_elements() {
    let env = setup();
    let result = run(&env, "filter([1, 2, 3, 4, 5], fn(x) { x % 2 == 0 })");
    assert_eq!(result.inspect(), "[2, 4]");
}

#[test]
fn test_reduce_sums_with_initial_value() {
    let env = setup();
    let result = run(&env, "reduce([1, 2, 3, 4], fn(acc, x) { acc + x }, 10)");
    assert_eq!(result.inspect(), "20");
}

#[test]
fn test_sum_uses_reduce() {
    let env = setup();
    let result = run(&env, "sum([1, 2, 3, 4, 5])");
    assert_eq!(result.inspect(), "15");
}

#[test]
fn test_find_returns_first_match() {
    let env = setup();
    let result = run(&env, "find([1, 3, 4, 5], fn(x) { x % 2 == 0 })");
    assert_eq!(result.inspect(), "4");
}

#[test]
fn test_find_returns_null_when_no_match() {
    let env = setup();
    let result = run(&env, "find([1, 3, 5], fn(x) { x % 2 == 0 })");
    assert_eq!(result.inspect(), "null");
}

#[test]
fn test_all_and_any() {
    let env = setup();
    let result = run(&env, "[all([2, 4, 6], fn(x) { x % 2 == 0 }), any([1, 2, 3], fn(x) { x > 2 })]");
    assert_eq!(result.inspect(), "[true, true]");
}

#[test]
fn test_reverse() {
    let env = setup();
    let result = run(&env, "reverse([1, 2, 3])");
    assert_eq!(result.inspect(), "[3, 2, 1]");
}

#[test]
fn test_json_round_trip() {
    let env = Environment::new();
    cozy::builtins::register_builtins(env.clone());
    let result = run(&env, "json.deserialize(json.serialize({\"a\": 1, \"b\": [1, 2]})).a");
    assert_eq!(result.inspect(), "1");
}

#[test]
fn test_json_deserialize_array() {
    let env = Environment::new();
    cozy::builtins::register_builtins(env.clone());
    let result = run(&env, "len(json.deserialize(\"[1, 2, 3]\"))");
    assert_eq!(result.inspect(), "3");
}
