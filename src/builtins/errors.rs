//! Error handling operations: error, panic
//!
//! Errors are first-class values (`Object::Error`), not exceptions: a block's
//! evaluation short-circuits on one exactly the way it does on a `return`.
//!
//! - `error`: Construct an Error from a message String or a Hash with keys
//!   `{message, code, data}` (values beyond these are ignored)
//! - `panic`: Print the error's message to stderr and terminate the process
//!   with `code` (or 1) — the one builtin that reaches outside the evaluator

use crate::env::Environment;
use crate::error::EvalError;
use crate::object::{new_builtin, ErrorData, HashKey, Object};
use std::rc::Rc;

fn error_from_hash(h: &crate::object::HashData) -> Object {
    let message = h
        .pairs
        .get(&HashKey::String("message".to_string()))
        .map(|(_, v)| v.inspect())
        .unwrap_or_default();
    let code = h.pairs.get(&HashKey::String("code".to_string())).and_then(|(_, v)| match v {
        Object::Integer(n) => Some(*n),
        _ => None,
    });
    let data = h
        .pairs
        .get(&HashKey::String("data".to_string()))
        .map(|(_, v)| v.inspect());
    Object::Error(Rc::new(ErrorData { message, code, data, from_builtin: true }))
}

fn builtin_error(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 1 {
        return Ok(Object::new_error(EvalError::arity_error("error", "1", args.len()).to_string()));
    }
    match &args[0] {
        Object::String(s) => Ok(Object::Error(Rc::new(ErrorData {
            message: s.to_string(),
            code: None,
            data: None,
            from_builtin: true,
        }))),
        Object::Hash(h) => Ok(error_from_hash(&h.borrow())),
        other => Ok(Object::Error(Rc::new(ErrorData {
            message: other.inspect(),
            code: None,
            data: None,
            from_builtin: true,
        }))),
    }
}

fn builtin_panic(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let err = match args.first() {
        Some(Object::Error(e)) => e.clone(),
        Some(other) => Rc::new(ErrorData { message: other.inspect(), code: None, data: None, from_builtin: true }),
        None => Rc::new(ErrorData { message: String::new(), code: None, data: None, from_builtin: true }),
    };
    eprintln!("panic: {}", err.message);
    std::process::exit(err.code.unwrap_or(1) as i32);
}

pub fn register(env: &Rc<Environment>) {
    let _ = env.set_immutable("error", new_builtin("error", builtin_error));
    let _ = env.set_immutable("panic", new_builtin("panic", builtin_panic));

    crate::help::register_help(crate::help::HelpEntry {
        name: "error".to_string(),
        signature: "error(message) or error({message, code, data})".to_string(),
        description: "Constructs an Error value from a message String or a Hash with keys message/code/data.".to_string(),
        examples: vec!["error(\"invalid input\") => ERROR: invalid input".to_string()],
        related: vec!["panic".to_string()],
        category: "Error handling".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "panic".to_string(),
        signature: "panic(err)".to_string(),
        description: "Prints the error's message to stderr and terminates the process with its code (or 1).".to_string(),
        examples: vec!["panic(error(\"fatal\")) => exits with status 1".to_string()],
        related: vec!["error".to_string()],
        category: "Error handling".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_string_message() {
        let env = Environment::new();
        let result = builtin_error(&env, &[Object::new_string("invalid input")]).unwrap();
        match result {
            Object::Error(e) => assert_eq!(e.message, "invalid input"),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_from_hash_with_message_code_data() {
        let env = Environment::new();
        let pairs = [(
            HashKey::String("message".to_string()),
            (Object::new_string("message"), Object::new_string("boom")),
        ), (
            HashKey::String("code".to_string()),
            (Object::new_string("code"), Object::Integer(7)),
        )]
        .into_iter()
        .collect();
        let result = builtin_error(&env, &[Object::new_hash(pairs)]).unwrap();
        match result {
            Object::Error(e) => {
                assert_eq!(e.message, "\"boom\"");
                assert_eq!(e.code, Some(7));
            }
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_wrong_arity_is_error_value() {
        let env = Environment::new();
        let result = builtin_error(&env, &[]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }

    #[test]
    fn test_type_of_error_value_is_lowercase_error() {
        let env = Environment::new();
        let err = builtin_error(&env, &[Object::new_string("boom")]).unwrap();
        assert_eq!(err.type_name().to_lowercase(), "error");
    }
}
