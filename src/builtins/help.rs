//! Help and reflection operations: help, methods
//!
//! - `help`: Show help for a builtin or special form (0 args shows the quick reference)
//! - `methods`: List the method names callable on a value via `value.name(...)` syntax

use crate::env::Environment;
use crate::error::EvalError;
use crate::object::{new_builtin, Object};
use std::rc::Rc;

fn builtin_help(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    use crate::help;

    match args.len() {
        0 => {
            println!("{}", help::format_quick_reference());
            Ok(Object::Null)
        }
        1 => match &args[0] {
            Object::String(name) => match help::get_help(name) {
                Some(entry) => {
                    println!("{}", help::format_help_entry(&entry));
                    Ok(Object::Null)
                }
                None => Ok(Object::new_error(format!("help: no help found for '{}'", name))),
            },
            other => Ok(Object::new_error(EvalError::type_error("help", "STRING", other.type_name()).to_string())),
        },
        n => Ok(Object::new_error(EvalError::arity_error("help", "0 or 1", n).to_string())),
    }
}

fn builtin_methods(env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 1 {
        return Ok(Object::new_error(EvalError::arity_error("methods", "1", args.len()).to_string()));
    }
    let type_name = args[0].type_name().to_lowercase();
    let mut names: Vec<Object> = env
        .names(&format!("{type_name}."))
        .into_iter()
        .map(Object::new_string)
        .collect();
    names.extend(env.names("object.").into_iter().map(Object::new_string));
    Ok(Object::new_array(names))
}

pub fn register(env: &Rc<Environment>) {
    let _ = env.set_immutable("help", new_builtin("help", builtin_help));
    let _ = env.set_immutable("methods", new_builtin("methods", builtin_methods));

    crate::help::register_help(crate::help::HelpEntry {
        name: "help".to_string(),
        signature: "help() or help(name)".to_string(),
        description: "Shows help information. With no arguments, displays the quick reference. With a function name, shows its detailed documentation.".to_string(),
        examples: vec!["help() => shows quick reference".to_string(), "help(\"fs.read\") => detailed help for fs.read".to_string()],
        related: vec!["methods".to_string()],
        category: "Help system".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "methods".to_string(),
        signature: "methods(value)".to_string(),
        description: "Lists the method names callable on a value with `value.name(...)` syntax.".to_string(),
        examples: vec!["methods([1, 2, 3]) => [\"append\", \"methods\", ...]".to_string()],
        related: vec!["help".to_string(), "type".to_string()],
        category: "Help system".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_no_args_prints_quick_reference() {
        let env = Environment::new();
        let result = builtin_help(&env, &[]).unwrap();
        assert_eq!(result.inspect(), "null");
    }

    #[test]
    fn test_help_unknown_name_is_error_value() {
        let env = Environment::new();
        let result = builtin_help(&env, &[Object::new_string("not-a-real-fn")]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }

    #[test]
    fn test_help_wrong_arg_type_is_error_value() {
        let env = Environment::new();
        let result = builtin_help(&env, &[Object::Integer(1)]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }

    #[test]
    fn test_methods_lists_string_functions() {
        let env = Environment::new();
        crate::builtins::register_builtins(env.clone());
        let result = builtin_methods(&env, &[Object::new_string("hi")]).unwrap();
        assert!(result.inspect().contains("string.upper"));
    }

    #[test]
    fn test_methods_wrong_arity_is_error_value() {
        let env = Environment::new();
        let result = builtin_methods(&env, &[]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }
}
