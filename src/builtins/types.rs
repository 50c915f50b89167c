//! Core conversion and reflection functions: int, float, string, len, type, eval
//!
//! - `int`: Convert a value to an Integer
//! - `float`: Convert a value to a Float
//! - `string`: Convert a value to its String representation
//! - `len`: Length of a String, Array, or Hash
//! - `type`: Name of a value's runtime type, lower-case
//! - `eval`: Lex, parse, and evaluate a String as cozy source in the caller's environment

use crate::env::Environment;
use crate::error::EvalError;
use crate::eval::{eval_program, EvalContext};
use crate::object::Object;
use std::rc::Rc;

fn builtin_int(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 1 {
        return Ok(Object::new_error(EvalError::arity_error("int", "1", args.len()).to_string()));
    }
    match &args[0] {
        Object::Integer(n) => Ok(Object::Integer(*n)),
        Object::Float(f) => Ok(Object::Integer(*f as i64)),
        Object::String(s) => match s.trim().parse::<i64>() {
            Ok(n) => Ok(Object::Integer(n)),
            Err(_) => Ok(Object::new_error(format!("int: cannot parse {:?} as integer", s))),
        },
        Object::Boolean(b) => Ok(Object::Integer(if *b { 1 } else { 0 })),
        other => Ok(Object::new_error(EvalError::type_error("int", "INTEGER, FLOAT, STRING or BOOLEAN", other.type_name()).to_string())),
    }
}

fn builtin_float(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 1 {
        return Ok(Object::new_error(EvalError::arity_error("float", "1", args.len()).to_string()));
    }
    match &args[0] {
        Object::Float(f) => Ok(Object::Float(*f)),
        Object::Integer(n) => Ok(Object::Float(*n as f64)),
        Object::String(s) => match s.trim().parse::<f64>() {
            Ok(f) => Ok(Object::Float(f)),
            Err(_) => Ok(Object::new_error(format!("float: cannot parse {:?} as float", s))),
        },
        other => Ok(Object::new_error(EvalError::type_error("float", "FLOAT, INTEGER or STRING", other.type_name()).to_string())),
    }
}

fn builtin_string(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 1 {
        return Ok(Object::new_error(EvalError::arity_error("string", "1", args.len()).to_string()));
    }
    Ok(Object::new_string(args[0].inspect()))
}

fn builtin_len(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 1 {
        return Ok(Object::new_error(EvalError::arity_error("len", "1", args.len()).to_string()));
    }
    match &args[0] {
        Object::String(s) => Ok(Object::Integer(s.chars().count() as i64)),
        Object::DocString(s) => Ok(Object::Integer(s.chars().count() as i64)),
        Object::Array(a) => Ok(Object::Integer(a.borrow().elements.len() as i64)),
        Object::Hash(h) => Ok(Object::Integer(h.borrow().pairs.len() as i64)),
        other => Ok(Object::new_error(EvalError::type_error("len", "STRING, ARRAY or HASH", other.type_name()).to_string())),
    }
}

fn builtin_type(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 1 {
        return Ok(Object::new_error(EvalError::arity_error("type", "1", args.len()).to_string()));
    }
    Ok(Object::new_string(args[0].type_name().to_lowercase()))
}

fn builtin_eval(env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 1 {
        return Ok(Object::new_error(EvalError::arity_error("eval", "1", args.len()).to_string()));
    }
    let Object::String(source) = &args[0] else {
        return Ok(Object::new_error(EvalError::type_error("eval", "STRING", args[0].type_name()).to_string()));
    };
    let mut parser = crate::parser::Parser::from_str(source);
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        return Ok(Object::new_error(format!("eval: parse error: {}", parser.errors().join("; "))));
    }
    eval_program(&program, env, &EvalContext::new())
}

pub fn register(env: &Rc<Environment>) {
    for (name, func) in [
        ("int", builtin_int as fn(&Rc<Environment>, &[Object]) -> Result<Object, EvalError>),
        ("float", builtin_float),
        ("string", builtin_string),
        ("len", builtin_len),
        ("type", builtin_type),
        ("eval", builtin_eval),
    ] {
        let _ = env.set_immutable(name, crate::object::new_builtin(name, func));
    }

    crate::help::register_help(crate::help::HelpEntry {
        name: "int".to_string(),
        signature: "int(value)".to_string(),
        description: "Converts a Float, String, or Boolean to an Integer.".to_string(),
        examples: vec!["int(\"42\") => 42".to_string(), "int(3.9) => 3".to_string()],
        related: vec!["float".to_string(), "string".to_string()],
        category: "Core".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "float".to_string(),
        signature: "float(value)".to_string(),
        description: "Converts an Integer or String to a Float.".to_string(),
        examples: vec!["float(\"3.5\") => 3.5".to_string()],
        related: vec!["int".to_string()],
        category: "Core".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "string".to_string(),
        signature: "string(value)".to_string(),
        description: "Converts any value to its String representation.".to_string(),
        examples: vec!["string(42) => \"42\"".to_string()],
        related: vec!["int".to_string(), "float".to_string()],
        category: "Core".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "len".to_string(),
        signature: "len(value)".to_string(),
        description: "Returns the length of a String, Array, or Hash.".to_string(),
        examples: vec!["len(\"hello\") => 5".to_string(), "len([1, 2, 3]) => 3".to_string()],
        related: vec![],
        category: "Core".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "type".to_string(),
        signature: "type(value)".to_string(),
        description: "Returns the name of a value's runtime type, lower-case.".to_string(),
        examples: vec!["type(1) => \"integer\"".to_string(), "type(\"x\") => \"string\"".to_string()],
        related: vec![],
        category: "Core".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "eval".to_string(),
        signature: "eval(source)".to_string(),
        description: "Lexes, parses, and evaluates a String of cozy source in the caller's environment.".to_string(),
        examples: vec!["eval(\"1 + 1\") => 2".to_string()],
        related: vec!["import".to_string()],
        category: "Core".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_parses_string_and_truncates_float() {
        let env = Environment::new();
        assert_eq!(builtin_int(&env, &[Object::new_string("42")]).unwrap().inspect(), "42");
        assert_eq!(builtin_int(&env, &[Object::Float(3.9)]).unwrap().inspect(), "3");
    }

    #[test]
    fn test_int_unparseable_string_is_error_value() {
        let env = Environment::new();
        let result = builtin_int(&env, &[Object::new_string("not a number")]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }

    #[test]
    fn test_float_converts_integer_and_string() {
        let env = Environment::new();
        assert_eq!(builtin_float(&env, &[Object::Integer(3)]).unwrap().inspect(), "3");
        assert_eq!(builtin_float(&env, &[Object::new_string("3.5")]).unwrap().inspect(), "3.5");
    }

    #[test]
    fn test_string_renders_inspect_form() {
        let env = Environment::new();
        assert_eq!(builtin_string(&env, &[Object::Integer(42)]).unwrap().inspect(), "\"42\"");
    }

    #[test]
    fn test_len_over_string_array_and_hash() {
        let env = Environment::new();
        assert_eq!(builtin_len(&env, &[Object::new_string("hello")]).unwrap().inspect(), "5");
        assert_eq!(builtin_len(&env, &[Object::new_array(vec![Object::Integer(1), Object::Integer(2)])]).unwrap().inspect(), "2");
    }

    #[test]
    fn test_len_wrong_arg_type_is_error_value() {
        let env = Environment::new();
        let result = builtin_len(&env, &[Object::Integer(1)]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }

    #[test]
    fn test_type_returns_lowercase_name() {
        let env = Environment::new();
        assert_eq!(builtin_type(&env, &[Object::Integer(1)]).unwrap().inspect(), "\"integer\"");
        assert_eq!(builtin_type(&env, &[Object::new_string("x")]).unwrap().inspect(), "\"string\"");
    }

    #[test]
    fn test_eval_runs_source_in_caller_environment() {
        let env = Environment::new();
        let result = builtin_eval(&env, &[Object::new_string("1 + 1")]).unwrap();
        assert_eq!(result.inspect(), "2");
    }

    #[test]
    fn test_eval_parse_error_is_error_value_not_panic() {
        let env = Environment::new();
        let result = builtin_eval(&env, &[Object::new_string("let = ;")]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }
}
