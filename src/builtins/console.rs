//! Console I/O operations: print, printf, sprintf
//!
//! - `print`: Write each argument's inspect form to stdout, space-separated, with a newline
//! - `printf`: Format-string output using `{}` placeholders, written to stdout
//! - `sprintf`: Same formatting as `printf`, returned as a String instead of printed

use crate::env::Environment;
use crate::error::EvalError;
use crate::object::{new_builtin, Object};
use std::rc::Rc;

fn builtin_print(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let rendered: Vec<String> = args.iter().map(|a| a.inspect()).collect();
    println!("{}", rendered.join(" "));
    Ok(Object::Null)
}

fn format_string(template: &str, args: &[Object]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut arg_idx = 0;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'}') {
            chars.next();
            if let Some(arg) = args.get(arg_idx) {
                out.push_str(&arg.to_interface());
            }
            arg_idx += 1;
        } else {
            out.push(c);
        }
    }
    out
}

fn builtin_printf(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let Some(Object::String(template)) = args.first() else {
        return Ok(Object::new_error(EvalError::type_error("printf", "STRING", args.first().map(Object::type_name).unwrap_or("nothing")).to_string()));
    };
    print!("{}", format_string(template, &args[1..]));
    Ok(Object::Null)
}

fn builtin_sprintf(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let Some(Object::String(template)) = args.first() else {
        return Ok(Object::new_error(EvalError::type_error("sprintf", "STRING", args.first().map(Object::type_name).unwrap_or("nothing")).to_string()));
    };
    Ok(Object::new_string(format_string(template, &args[1..])))
}

pub fn register(env: &Rc<Environment>) {
    let _ = env.set_immutable("print", new_builtin("print", builtin_print));
    let _ = env.set_immutable("printf", new_builtin("printf", builtin_printf));
    let _ = env.set_immutable("sprintf", new_builtin("sprintf", builtin_sprintf));

    crate::help::register_help(crate::help::HelpEntry {
        name: "print".to_string(),
        signature: "print(...)".to_string(),
        description: "Writes each argument's inspect form to stdout, space-separated, with a trailing newline.".to_string(),
        examples: vec!["print(\"hello\", 1, 2) => outputs: hello 1 2".to_string()],
        related: vec!["printf".to_string()],
        category: "Console I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "printf".to_string(),
        signature: "printf(template, ...)".to_string(),
        description: "Replaces each `{}` in template with the next argument's string form, written to stdout without a trailing newline.".to_string(),
        examples: vec!["printf(\"{} + {} = {}\\n\", 1, 2, 3) => outputs: 1 + 2 = 3".to_string()],
        related: vec!["sprintf".to_string(), "print".to_string()],
        category: "Console I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "sprintf".to_string(),
        signature: "sprintf(template, ...)".to_string(),
        description: "Same formatting as printf, returned as a String instead of printed.".to_string(),
        examples: vec!["sprintf(\"{}-{}\", 1, 2) => \"1-2\"".to_string()],
        related: vec!["printf".to_string()],
        category: "Console I/O".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_returns_null() {
        let env = Environment::new();
        let result = builtin_print(&env, &[Object::Integer(1), Object::new_string("x")]).unwrap();
        assert_eq!(result.inspect(), "null");
    }

    #[test]
    fn test_format_string_substitutes_placeholders_in_order() {
        let formatted = format_string("{} + {} = {}", &[Object::Integer(1), Object::Integer(2), Object::Integer(3)]);
        assert_eq!(formatted, "1 + 2 = 3");
    }

    #[test]
    fn test_format_string_missing_arg_leaves_gap() {
        let formatted = format_string("{}-{}", &[Object::Integer(1)]);
        assert_eq!(formatted, "1-");
    }

    #[test]
    fn test_sprintf_returns_formatted_string() {
        let env = Environment::new();
        let result = builtin_sprintf(&env, &[Object::new_string("{}-{}"), Object::Integer(1), Object::Integer(2)]).unwrap();
        assert_eq!(result.inspect(), "\"1-2\"");
    }

    #[test]
    fn test_sprintf_missing_template_is_error_value() {
        let env = Environment::new();
        let result = builtin_sprintf(&env, &[]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }

    #[test]
    fn test_printf_wrong_arg_type_is_error_value() {
        let env = Environment::new();
        let result = builtin_printf(&env, &[Object::Integer(1)]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }
}
