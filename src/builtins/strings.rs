//! String method functions: string.split, string.join, string.trim, ...
//!
//! Registered under the `string.` namespace so that `"  x  ".trim()` resolves
//! through the `<typename>.<name>` method-dispatch fallback, with the receiver
//! string passed as the first argument.

use crate::env::Environment;
use crate::error::EvalError;
use crate::object::{new_builtin, Object};
use std::rc::Rc;

fn receiver_str<'a>(function: &str, args: &'a [Object]) -> Result<&'a Rc<str>, Object> {
    match args.first() {
        Some(Object::String(s)) => Ok(s),
        Some(other) => Err(Object::new_error(EvalError::type_error(function, "STRING", other.type_name()).to_string())),
        None => Err(Object::new_error(EvalError::arity_error(function, "at least 1", 0).to_string())),
    }
}

fn string_split(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let s = match receiver_str("string.split", args) {
        Ok(s) => s,
        Err(e) => return Ok(e),
    };
    let Some(Object::String(delim)) = args.get(1) else {
        return Ok(Object::new_error(EvalError::type_error("string.split", "STRING", args.get(1).map(Object::type_name).unwrap_or("nothing")).to_string()));
    };
    let parts = s.split(delim.as_ref()).map(Object::new_string).collect();
    Ok(Object::new_array(parts))
}

fn string_join(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let delim = match receiver_str("string.join", args) {
        Ok(s) => s,
        Err(e) => return Ok(e),
    };
    let Some(Object::Array(a)) = args.get(1) else {
        return Ok(Object::new_error(EvalError::type_error("string.join", "ARRAY", args.get(1).map(Object::type_name).unwrap_or("nothing")).to_string()));
    };
    let elements = &a.borrow().elements;
    let mut parts = Vec::with_capacity(elements.len());
    for el in elements {
        match el {
            Object::String(s) => parts.push(s.to_string()),
            other => return Ok(Object::new_error(EvalError::type_error("string.join", "STRING", other.type_name()).to_string())),
        }
    }
    Ok(Object::new_string(parts.join(delim.as_ref())))
}

fn string_substring(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let s = match receiver_str("string.substring", args) {
        Ok(s) => s,
        Err(e) => return Ok(e),
    };
    let (Some(Object::Integer(start)), Some(Object::Integer(end))) = (args.get(1), args.get(2)) else {
        return Ok(Object::new_error(EvalError::type_error("string.substring", "INTEGER, INTEGER", "something else").to_string()));
    };
    let chars: Vec<char> = s.chars().collect();
    let (start, end) = (*start as usize, *end as usize);
    if start > chars.len() || end > chars.len() || start > end {
        return Ok(Object::new_error(format!("string.substring: index out of bounds for length {}", chars.len())));
    }
    Ok(Object::new_string(chars[start..end].iter().collect::<String>()))
}

fn string_trim(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    match receiver_str("string.trim", args) {
        Ok(s) => Ok(Object::new_string(s.trim())),
        Err(e) => Ok(e),
    }
}

fn string_upper(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    match receiver_str("string.upper", args) {
        Ok(s) => Ok(Object::new_string(s.to_uppercase())),
        Err(e) => Ok(e),
    }
}

fn string_lower(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    match receiver_str("string.lower", args) {
        Ok(s) => Ok(Object::new_string(s.to_lowercase())),
        Err(e) => Ok(e),
    }
}

fn string_replace(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let s = match receiver_str("string.replace", args) {
        Ok(s) => s,
        Err(e) => return Ok(e),
    };
    let (Some(Object::String(from)), Some(Object::String(to))) = (args.get(1), args.get(2)) else {
        return Ok(Object::new_error(EvalError::type_error("string.replace", "STRING, STRING", "something else").to_string()));
    };
    Ok(Object::new_string(s.replace(from.as_ref(), to)))
}

fn string_contains(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let s = match receiver_str("string.contains?", args) {
        Ok(s) => s,
        Err(e) => return Ok(e),
    };
    let Some(Object::String(needle)) = args.get(1) else {
        return Ok(Object::new_error(EvalError::type_error("string.contains?", "STRING", args.get(1).map(Object::type_name).unwrap_or("nothing")).to_string()));
    };
    Ok(Object::Boolean(s.contains(needle.as_ref())))
}

fn string_starts_with(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let s = match receiver_str("string.starts_with?", args) {
        Ok(s) => s,
        Err(e) => return Ok(e),
    };
    let Some(Object::String(prefix)) = args.get(1) else {
        return Ok(Object::new_error(EvalError::type_error("string.starts_with?", "STRING", args.get(1).map(Object::type_name).unwrap_or("nothing")).to_string()));
    };
    Ok(Object::Boolean(s.starts_with(prefix.as_ref())))
}

fn string_ends_with(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let s = match receiver_str("string.ends_with?", args) {
        Ok(s) => s,
        Err(e) => return Ok(e),
    };
    let Some(Object::String(suffix)) = args.get(1) else {
        return Ok(Object::new_error(EvalError::type_error("string.ends_with?", "STRING", args.get(1).map(Object::type_name).unwrap_or("nothing")).to_string()));
    };
    Ok(Object::Boolean(s.ends_with(suffix.as_ref())))
}

fn string_empty(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    match receiver_str("string.empty?", args) {
        Ok(s) => Ok(Object::Boolean(s.is_empty())),
        Err(e) => Ok(e),
    }
}

fn string_length(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    match receiver_str("string.length", args) {
        Ok(s) => Ok(Object::Integer(s.chars().count() as i64)),
        Err(e) => Ok(e),
    }
}

fn string_to_list(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    match receiver_str("string.to_list", args) {
        Ok(s) => Ok(Object::new_array(s.chars().map(|c| Object::new_string(c.to_string())).collect())),
        Err(e) => Ok(e),
    }
}

fn string_append(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let s = match receiver_str("string.append", args) {
        Ok(s) => s,
        Err(e) => return Ok(e),
    };
    let mut out = s.to_string();
    for arg in &args[1..] {
        match arg {
            Object::String(t) => out.push_str(t),
            other => return Ok(Object::new_error(EvalError::type_error("string.append", "STRING", other.type_name()).to_string())),
        }
    }
    Ok(Object::new_string(out))
}

pub fn register(env: &Rc<Environment>) {
    for (name, func) in [
        ("string.split", string_split as fn(&Rc<Environment>, &[Object]) -> Result<Object, EvalError>),
        ("string.join", string_join),
        ("string.substring", string_substring),
        ("string.trim", string_trim),
        ("string.upper", string_upper),
        ("string.lower", string_lower),
        ("string.replace", string_replace),
        ("string.contains?", string_contains),
        ("string.starts_with?", string_starts_with),
        ("string.ends_with?", string_ends_with),
        ("string.empty?", string_empty),
        ("string.length", string_length),
        ("string.to_list", string_to_list),
        ("string.append", string_append),
    ] {
        let _ = env.set_immutable(name, new_builtin(name, func));
    }

    let entries = [
        ("string.split", "string.split(s, delimiter)", "Splits a string by delimiter into an Array of strings.", "\"a,b,c\".split(\",\") => [\"a\", \"b\", \"c\"]", vec!["string.join"]),
        ("string.join", "string.join(delimiter, parts)", "Joins an Array of strings with delimiter.", "\"-\".join([\"a\", \"b\"]) => \"a-b\"", vec!["string.split"]),
        ("string.substring", "string.substring(s, start, end)", "Extracts characters from start (inclusive) to end (exclusive).", "\"hello\".substring(0, 3) => \"hel\"", vec!["string.split"]),
        ("string.trim", "string.trim(s)", "Removes leading and trailing whitespace.", "\"  hi  \".trim() => \"hi\"", vec![]),
        ("string.upper", "string.upper(s)", "Converts to upper case.", "\"hi\".upper() => \"HI\"", vec!["string.lower"]),
        ("string.lower", "string.lower(s)", "Converts to lower case.", "\"HI\".lower() => \"hi\"", vec!["string.upper"]),
        ("string.replace", "string.replace(s, from, to)", "Replaces all occurrences of from with to.", "\"aaa\".replace(\"a\", \"b\") => \"bbb\"", vec![]),
        ("string.contains?", "string.contains?(s, needle)", "Tests whether s contains needle.", "\"hello\".contains?(\"ell\") => true", vec!["string.starts_with?", "string.ends_with?"]),
        ("string.starts_with?", "string.starts_with?(s, prefix)", "Tests whether s starts with prefix.", "\"hello\".starts_with?(\"he\") => true", vec!["string.ends_with?"]),
        ("string.ends_with?", "string.ends_with?(s, suffix)", "Tests whether s ends with suffix.", "\"hello\".ends_with?(\"lo\") => true", vec!["string.starts_with?"]),
        ("string.empty?", "string.empty?(s)", "Tests whether s has zero characters.", "\"\".empty?() => true", vec!["string.length"]),
        ("string.length", "string.length(s)", "Returns the number of characters in s.", "\"hello\".length() => 5", vec!["len"]),
        ("string.to_list", "string.to_list(s)", "Splits s into an Array of single-character strings.", "\"ab\".to_list() => [\"a\", \"b\"]", vec![]),
        ("string.append", "string.append(s, ...)", "Concatenates s with the given string arguments.", "\"foo\".append(\"bar\") => \"foobar\"", vec![]),
    ];
    for (name, signature, description, example, related) in entries {
        crate::help::register_help(crate::help::HelpEntry {
            name: name.to_string(),
            signature: signature.to_string(),
            description: description.to_string(),
            examples: vec![example.to_string()],
            related: related.into_iter().map(str::to_string).collect(),
            category: "Strings".to_string(),
        });
    }
}
