//! Time operations: time.now, time.sleep

use crate::env::Environment;
use crate::error::EvalError;
use crate::object::{new_builtin, Object};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

fn time_now(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if !args.is_empty() {
        return Ok(Object::new_error(EvalError::arity_error("time.now", "0", args.len()).to_string()));
    }
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64();
    Ok(Object::Float(secs))
}

fn time_sleep(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 1 {
        return Ok(Object::new_error(EvalError::arity_error("time.sleep", "1", args.len()).to_string()));
    }
    let seconds = match &args[0] {
        Object::Integer(n) => *n as f64,
        Object::Float(f) => *f,
        other => return Ok(Object::new_error(EvalError::type_error("time.sleep", "INTEGER or FLOAT", other.type_name()).to_string())),
    };
    if seconds > 0.0 {
        std::thread::sleep(std::time::Duration::from_secs_f64(seconds));
    }
    Ok(Object::Null)
}

pub fn register(env: &Rc<Environment>) {
    let _ = env.set_immutable("time.now", new_builtin("time.now", time_now));
    let _ = env.set_immutable("time.sleep", new_builtin("time.sleep", time_sleep));

    crate::help::register_help(crate::help::HelpEntry {
        name: "time.now".to_string(),
        signature: "time.now()".to_string(),
        description: "Returns the current Unix time in seconds, as a Float with sub-second precision.".to_string(),
        examples: vec!["time.now() => 1772140800.512".to_string()],
        related: vec!["time.sleep".to_string()],
        category: "Time".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "time.sleep".to_string(),
        signature: "time.sleep(seconds)".to_string(),
        description: "Blocks the current thread for the given number of seconds.".to_string(),
        examples: vec!["time.sleep(0.5)".to_string()],
        related: vec!["time.now".to_string()],
        category: "Time".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_now_returns_a_positive_float() {
        let env = Environment::new();
        let result = time_now(&env, &[]).unwrap();
        match result {
            Object::Float(secs) => assert!(secs > 0.0),
            other => panic!("expected Float, got {:?}", other),
        }
    }

    #[test]
    fn test_time_sleep_zero_returns_null_immediately() {
        let env = Environment::new();
        let result = time_sleep(&env, &[Object::Integer(0)]).unwrap();
        assert_eq!(result.inspect(), "null");
    }

    #[test]
    fn test_time_sleep_wrong_arg_type_is_error_value() {
        let env = Environment::new();
        let result = time_sleep(&env, &[Object::new_string("nope")]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }
}
