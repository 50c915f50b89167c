//! System/process operations: sys.getenv, sys.setenv, sys.environment, sys.args, sys.exit
//!
//! Unlike `fs.*`/`http.*`, these touch process-global state directly — there is
//! no sandbox capability gating environment variables or the exit code.

use crate::env::Environment;
use crate::error::EvalError;
use crate::object::{new_builtin, Object};
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    static SCRIPT_ARGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Stores the arguments following the script path on the command line, made
/// available to scripts via `sys.args()`.
pub fn set_script_args(args: Vec<String>) {
    SCRIPT_ARGS.with(|s| *s.borrow_mut() = args);
}

fn sys_getenv(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 1 {
        return Ok(Object::new_error(EvalError::arity_error("sys.getenv", "1", args.len()).to_string()));
    }
    let Object::String(name) = &args[0] else {
        return Ok(Object::new_error(EvalError::type_error("sys.getenv", "STRING", args[0].type_name()).to_string()));
    };
    match std::env::var(name.as_ref()) {
        Ok(val) => Ok(Object::new_string(val)),
        Err(_) => Ok(Object::Null),
    }
}

fn sys_setenv(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 2 {
        return Ok(Object::new_error(EvalError::arity_error("sys.setenv", "2", args.len()).to_string()));
    }
    let (Object::String(name), Object::String(value)) = (&args[0], &args[1]) else {
        return Ok(Object::new_error(EvalError::type_error("sys.setenv", "STRING, STRING", "something else").to_string()));
    };
    std::env::set_var(name.as_ref(), value.as_ref());
    Ok(Object::Boolean(true))
}

fn sys_environment(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if !args.is_empty() {
        return Ok(Object::new_error(EvalError::arity_error("sys.environment", "0", args.len()).to_string()));
    }
    let pairs = std::env::vars()
        .map(|(k, v)| (crate::object::HashKey::String(k.clone()), (Object::new_string(k), Object::new_string(v))))
        .collect();
    Ok(Object::new_hash(pairs))
}

fn sys_args(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if !args.is_empty() {
        return Ok(Object::new_error(EvalError::arity_error("sys.args", "0", args.len()).to_string()));
    }
    Ok(Object::new_array(SCRIPT_ARGS.with(|s| s.borrow().iter().cloned().map(Object::new_string).collect())))
}

fn sys_exit(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let code = match args.first() {
        None => 0,
        Some(Object::Integer(n)) => *n as i32,
        Some(other) => return Ok(Object::new_error(EvalError::type_error("sys.exit", "INTEGER", other.type_name()).to_string())),
    };
    std::process::exit(code);
}

pub fn register(env: &Rc<Environment>) {
    for (name, func) in [
        ("sys.getenv", sys_getenv as fn(&Rc<Environment>, &[Object]) -> Result<Object, EvalError>),
        ("sys.setenv", sys_setenv),
        ("sys.environment", sys_environment),
        ("sys.args", sys_args),
        ("sys.exit", sys_exit),
    ] {
        let _ = env.set_immutable(name, new_builtin(name, func));
    }

    let entries = [
        ("sys.getenv", "sys.getenv(name)", "Returns the value of an environment variable, or null if unset.", "sys.getenv(\"HOME\")"),
        ("sys.setenv", "sys.setenv(name, value)", "Sets an environment variable for the current process.", "sys.setenv(\"DEBUG\", \"1\")"),
        ("sys.environment", "sys.environment()", "Returns a Hash of all environment variables.", "sys.environment()[\"PATH\"]"),
        ("sys.args", "sys.args()", "Returns the Array of command-line arguments following the script path.", "sys.args()"),
        ("sys.exit", "sys.exit(code)", "Terminates the process immediately with the given exit code (0 if omitted).", "sys.exit(1)"),
    ];
    for (name, signature, description, example) in entries {
        crate::help::register_help(crate::help::HelpEntry {
            name: name.to_string(),
            signature: signature.to_string(),
            description: description.to_string(),
            examples: vec![example.to_string()],
            related: vec![],
            category: "Sys".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_getenv_missing_returns_null() {
        let env = Environment::new();
        let result = sys_getenv(&env, &[Object::new_string("COZY_TEST_VAR_NOT_SET")]).unwrap();
        assert_eq!(result.inspect(), "null");
    }

    #[test]
    fn test_setenv_then_getenv_round_trip() {
        let env = Environment::new();
        let name = Object::new_string("COZY_TEST_SETENV_ROUNDTRIP");
        let value = Object::new_string("42");
        let set_result = sys_setenv(&env, &[name.clone(), value]).unwrap();
        assert_eq!(set_result.inspect(), "true");
        let got = sys_getenv(&env, &[name]).unwrap();
        assert_eq!(got.inspect(), "42");
    }

    #[test]
    fn test_args_reflects_set_script_args() {
        let env = Environment::new();
        set_script_args(vec!["a".to_string(), "b".to_string()]);
        let result = sys_args(&env, &[]).unwrap();
        assert_eq!(result.inspect(), "[a, b]");
        set_script_args(vec![]);
    }

    #[test]
    fn test_getenv_wrong_arity_is_error_value() {
        let env = Environment::new();
        let result = sys_getenv(&env, &[]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }
}
