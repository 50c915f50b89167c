//! JSON encoding and decoding module
//!
//! Provides functions for converting between cozy values and JSON strings.
//!
//! Type mapping:
//! - Hash ↔ JSON object (keys rendered via their inspect form)
//! - Array ↔ JSON array
//! - Integer/Float ↔ JSON number
//! - String ↔ JSON string
//! - Boolean ↔ JSON boolean
//! - null ↔ JSON null

use crate::env::Environment;
use crate::error::EvalError;
use crate::object::Object;
use std::rc::Rc;

fn json_to_object(json: &serde_json::Value) -> Object {
    match json {
        serde_json::Value::Null => Object::Null,
        serde_json::Value::Bool(b) => Object::Boolean(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Object::Integer(i)
            } else {
                Object::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Object::new_string(s.clone()),
        serde_json::Value::Array(arr) => Object::new_array(arr.iter().map(json_to_object).collect()),
        serde_json::Value::Object(obj) => {
            let pairs = obj
                .iter()
                .map(|(k, v)| (crate::object::HashKey::String(k.clone()), (Object::new_string(k.clone()), json_to_object(v))))
                .collect();
            Object::new_hash(pairs)
        }
    }
}

fn builtin_serialize(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 1 {
        return Ok(Object::new_error(EvalError::arity_error("json.serialize", "1", args.len()).to_string()));
    }
    match serde_json::to_string(&args[0].to_json()) {
        Ok(s) => Ok(Object::new_string(s)),
        Err(e) => Ok(Object::new_error(format!("json.serialize: {e}"))),
    }
}

fn builtin_deserialize(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 1 {
        return Ok(Object::new_error(EvalError::arity_error("json.deserialize", "1", args.len()).to_string()));
    }
    let Object::String(source) = &args[0] else {
        return Ok(Object::new_error(EvalError::type_error("json.deserialize", "STRING", args[0].type_name()).to_string()));
    };
    match serde_json::from_str::<serde_json::Value>(source) {
        Ok(json) => Ok(json_to_object(&json)),
        Err(e) => Ok(Object::new_error(format!("json.deserialize: {e}"))),
    }
}

/// Register the json.* builtins in the environment
pub fn register(env: &Rc<Environment>) {
    let _ = env.set_immutable("json.serialize", crate::object::new_builtin("json.serialize", builtin_serialize));
    let _ = env.set_immutable("json.deserialize", crate::object::new_builtin("json.deserialize", builtin_deserialize));

    crate::help::register_help(crate::help::HelpEntry {
        name: "json.serialize".to_string(),
        signature: "json.serialize(value)".to_string(),
        description: "Converts a cozy value to a JSON string. Errors serialize as {\"error\": message, ...}.".to_string(),
        examples: vec!["json.serialize({\"a\": 1}) => \"{\\\"a\\\":1}\"".to_string()],
        related: vec!["json.deserialize".to_string()],
        category: "JSON".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "json.deserialize".to_string(),
        signature: "json.deserialize(source)".to_string(),
        description: "Parses a JSON string into a cozy value (Hash, Array, Integer, Float, String, Boolean, or null).".to_string(),
        examples: vec!["json.deserialize(\"{\\\"a\\\":1}\").a => 1".to_string()],
        related: vec!["json.serialize".to_string()],
        category: "JSON".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_hash() {
        let env = Environment::new();
        let pairs = [(crate::object::HashKey::Integer(1), (Object::Integer(1), Object::Integer(1)))].into_iter().collect();
        let hash = Object::new_hash(pairs);
        let result = builtin_serialize(&env, &[hash]).unwrap();
        assert_eq!(result.inspect(), "{\"1\":1}");
    }

    #[test]
    fn test_deserialize_object_into_hash() {
        let env = Environment::new();
        let source = Object::new_string("{\"a\": 1, \"b\": [1, 2, 3]}");
        let result = builtin_deserialize(&env, &[source]).unwrap();
        assert!(matches!(result, Object::Hash(_)));
    }

    #[test]
    fn test_deserialize_array() {
        let env = Environment::new();
        let source = Object::new_string("[1, 2, 3]");
        let result = builtin_deserialize(&env, &[source]).unwrap();
        assert_eq!(result.inspect(), "[1, 2, 3]");
    }

    #[test]
    fn test_deserialize_invalid_json_is_error_value() {
        let env = Environment::new();
        let source = Object::new_string("not json");
        let result = builtin_deserialize(&env, &[source]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }

    #[test]
    fn test_deserialize_wrong_arg_type_is_error_value() {
        let env = Environment::new();
        let result = builtin_deserialize(&env, &[Object::Integer(1)]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }
}
