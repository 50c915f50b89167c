// ABOUTME: Integration tests verifying core language features work together end to end

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
fn test_arithmetic_and_precedence() {
    let result = eval_src("1 + 2 * 3;");
    assert_eq!(result.inspect(), "7");
}

#[test]
fn test_let_and_mutation() {
    let result = eval_src("mutable let x = 1; x = x + 41; x");
    assert_eq!(result.inspect(), "42");
}

#[test]
fn test_function_closures() {
    let result = eval_src(
        "let make_adder = fn(n) { fn(x) { x + n } };
         let add5 = make_adder(5);
         add5(10)",
    );
    assert_eq!(result.inspect(), "15");
}

#[test]
fn test_if_else_chain() {
    let result = eval_src(
        "let classify = fn(x) {
            if (x < 0) { \"negative\" } else if (x == 0) { \"zero\" } else { \"positive\" }
         };
         classify(-5)",
    );
    assert_eq!(result.inspect(), "negative");
}

#[test]
fn test_while_loop() {
    let result = eval_src("mutable let i = 0; mutable let total = 0; while (i < 5) { total = total + i; i++; } total");
    assert_eq!(result.inspect(), "10");
}

#[test]
fn test_foreach_over_array() {
    let result = eval_src("mutable let total = 0; foreach x in [1, 2, 3, 4] { total = total + x; } total");
    assert_eq!(result.inspect(), "10");
}

#[test]
fn test_foreach_with_index() {
    let result = eval_src("mutable let total = 0; foreach i, v in [10, 20, 30] { total = total + i * v; } total");
    assert_eq!(result.inspect(), "80");
}

#[test]
fn test_hash_literal_and_indexing() {
    let result = eval_src("let h = {\"a\": 1, \"b\": 2}; h[\"a\"] + h[\"b\"]");
    assert_eq!(result.inspect(), "3");
}

#[test]
fn test_array_append_method() {
    let result = eval_src("let a = [1, 2]; let b = a.append(3); len(b)");
    assert_eq!(result.inspect(), "3");
}

#[test]
fn test_error_propagation_is_a_value() {
    let result = eval_src("let e = error(\"boom\"); type(e)");
    assert_eq!(result.inspect(), "error");
}

#[test]
fn test_return_from_function() {
    let result = eval_src(
        "let f = fn(x) {
            if (x < 0) { return 0; }
            x * 2
         };
         f(-1) + f(5)",
    );
    assert_eq!(result.inspect(), "10");
}

#[test]
fn test_default_parameter_values() {
    let result = eval_src("let greet = fn(name, times = 2) { name * times }; greet(1)");
    assert_eq!(result.inspect(), "2");
}

#[test]
fn test_quote_unquote_macro() {
    let result = eval_src(
        "let unless = macro(cond, body) { quote(if (!(unquote(cond))) { unquote(body) }) };
         unless(false, 99)",
    );
    assert_eq!(result.inspect(), "99");
}
