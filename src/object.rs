// ABOUTME: Runtime value model: the Object sum type, hashability, iterability,
// ABOUTME: intrinsic method dispatch, and JSON/inspect rendering.

use crate::ast::{Block, Expr, Param};
use crate::env::Environment;
use crate::error::EvalError;
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

pub type NativeFn = Rc<dyn Fn(&Rc<Environment>, &[Object]) -> Result<Object, EvalError>>;

#[derive(Clone)]
pub enum Object {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(Rc<str>),
    DocString(Rc<str>),
    Null,
    Array(Rc<RefCell<ArrayData>>),
    Hash(Rc<RefCell<HashData>>),
    Function(Rc<FunctionData>),
    Builtin(Rc<BuiltinData>),
    Error(Rc<ErrorData>),
    Module(Rc<ModuleData>),
    Quote(Rc<Expr>),
    Macro(Rc<MacroData>),
    File(Rc<FileData>),
    Regexp(Rc<RegexpData>),
    ReturnValue(Box<Object>),
}

pub struct ArrayData {
    pub elements: Vec<Object>,
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(String),
    DocString(String),
}

pub struct HashData {
    pub pairs: IndexMap<HashKey, (Object, Object)>,
    pub cursor: usize,
}

pub struct FunctionData {
    pub params: Vec<Param>,
    pub body: Block,
    pub env: Rc<Environment>,
    pub doc: Option<String>,
    pub name: RefCell<Option<String>>,
}

pub struct BuiltinData {
    pub name: String,
    pub func: NativeFn,
}

pub struct ErrorData {
    pub message: String,
    pub code: Option<i64>,
    pub data: Option<String>,
    pub from_builtin: bool,
}

pub struct ModuleData {
    pub name: String,
    pub attrs: Object,
}

pub struct MacroData {
    pub params: Vec<String>,
    pub body: Block,
    pub env: Rc<Environment>,
}

pub struct FileData {
    pub path: String,
    pub closed: Cell<bool>,
}

pub struct RegexpData {
    pub pattern: String,
    pub flags: String,
    pub compiled: regex::Regex,
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Float(_) => "FLOAT",
            Object::Boolean(_) => "BOOLEAN",
            Object::String(_) => "STRING",
            Object::DocString(_) => "DOCSTRING",
            Object::Null => "NULL",
            Object::Array(_) => "ARRAY",
            Object::Hash(_) => "HASH",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
            Object::Error(_) => "ERROR",
            Object::Module(_) => "MODULE",
            Object::Quote(_) => "QUOTE",
            Object::Macro(_) => "MACRO",
            Object::File(_) => "FILE",
            Object::Regexp(_) => "REGEXP",
            Object::ReturnValue(_) => "RETURN_VALUE",
        }
    }

    pub fn new_string(s: impl Into<String>) -> Object {
        Object::String(Rc::from(s.into()))
    }

    pub fn new_array(elements: Vec<Object>) -> Object {
        Object::Array(Rc::new(RefCell::new(ArrayData { elements, cursor: 0 })))
    }

    pub fn new_hash(pairs: IndexMap<HashKey, (Object, Object)>) -> Object {
        Object::Hash(Rc::new(RefCell::new(HashData { pairs, cursor: 0 })))
    }

    pub fn new_error(message: impl Into<String>) -> Object {
        Object::Error(Rc::new(ErrorData {
            message: message.into(),
            code: None,
            data: None,
            from_builtin: true,
        }))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    /// Hash key for use as a Hash's key slot. Returns None for non-Hashable types.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(n) => Some(HashKey::Integer(*n)),
            Object::Boolean(b) => Some(HashKey::Boolean(*b)),
            Object::String(s) => Some(HashKey::String(s.to_string())),
            Object::DocString(s) => Some(HashKey::DocString(s.to_string())),
            _ => None,
        }
    }

    /// The human-facing rendering used by `print` and error diagnostics.
    pub fn inspect(&self) -> String {
        match self {
            Object::Integer(n) => n.to_string(),
            Object::Float(n) => format_float(*n),
            Object::Boolean(b) => b.to_string(),
            Object::String(s) => s.to_string(),
            Object::DocString(s) => s.to_string(),
            Object::Null => "null".to_string(),
            Object::Array(arr) => {
                let arr = arr.borrow();
                let items: Vec<String> = arr.elements.iter().map(|e| e.inspect()).collect();
                format!("[{}]", items.join(", "))
            }
            Object::Hash(hash) => {
                let hash = hash.borrow();
                let items: Vec<String> = hash
                    .pairs
                    .values()
                    .map(|(k, v)| format!("{}: {}", k.inspect(), v.inspect()))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
            Object::Function(f) => {
                let name = f.name.borrow().clone().unwrap_or_default();
                format!("fn {}(...) {{ ... }}", name)
            }
            Object::Builtin(b) => format!("<builtin: {}>", b.name),
            Object::Error(e) => match (&e.code, &e.data) {
                (Some(code), Some(data)) => {
                    format!("ERROR: {}; CODE: {}; DATA: {}", e.message, code, data)
                }
                (Some(code), None) => format!("ERROR: {}; CODE: {}", e.message, code),
                (None, Some(data)) => format!("ERROR: {}; DATA: {}", e.message, data),
                (None, None) => format!("ERROR: {}", e.message),
            },
            Object::Module(m) => format!("<MODULE '{}'>", m.name),
            Object::Quote(node) => format!("QUOTE({})", node.print()),
            Object::Macro(_) => "<macro>".to_string(),
            Object::File(f) => format!("<FILE '{}'>", f.path),
            Object::Regexp(r) => format!("/{}/{}", r.pattern, r.flags),
            Object::ReturnValue(inner) => inner.inspect(),
        }
    }

    /// JSON rendering (no indentation: callers needing pretty output post-process
    /// via serde_json's pretty formatter over the Value produced here).
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Object::Integer(n) => J::Number((*n).into()),
            Object::Float(n) => serde_json::Number::from_f64(*n).map(J::Number).unwrap_or(J::Null),
            Object::Boolean(b) => J::Bool(*b),
            Object::String(s) => J::String(s.to_string()),
            Object::DocString(s) => J::String(s.to_string()),
            Object::Null => J::Null,
            Object::Array(arr) => {
                J::Array(arr.borrow().elements.iter().map(Object::to_json).collect())
            }
            Object::Hash(hash) => {
                let mut map = serde_json::Map::new();
                for (k, v) in hash.borrow().pairs.values() {
                    map.insert(k.inspect(), v.to_json());
                }
                J::Object(map)
            }
            Object::Error(e) => {
                let mut map = serde_json::Map::new();
                map.insert("error".to_string(), J::String(e.message.clone()));
                if let Some(code) = e.code {
                    map.insert("code".to_string(), J::Number(code.into()));
                }
                if let Some(data) = &e.data {
                    map.insert("data".to_string(), J::String(data.clone()));
                }
                J::Object(map)
            }
            Object::Function(f) => J::String(format!(
                "fn({}) {{...}}",
                f.params.iter().map(|p| p.name.clone()).collect::<Vec<_>>().join(", ")
            )),
            other => J::String(other.inspect()),
        }
    }

    /// printf-style stringification used by `sprintf`/`printf`.
    pub fn to_interface(&self) -> String {
        self.inspect()
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Null => false,
            Object::Boolean(b) => *b,
            Object::Integer(n) => *n != 0,
            Object::Float(n) => *n != 0.0,
            Object::String(s) => !s.is_empty(),
            Object::DocString(s) => !s.is_empty(),
            Object::Regexp(r) => !r.pattern.is_empty(),
            Object::Array(arr) => !arr.borrow().elements.is_empty(),
            Object::Hash(hash) => !hash.borrow().pairs.is_empty(),
            _ => true,
        }
    }

    /// Intrinsic (native) methods, resolved first in method dispatch.
    pub fn get_method(&self, name: &str) -> Option<Object> {
        match self {
            Object::Array(arr) => array_method(arr, name),
            Object::Hash(hash) => hash_method(hash, name),
            Object::Function(f) => function_method(f, name),
            _ => None,
        }
    }

    /// Resets the iteration cursor. Only Array and Hash are Iterable.
    pub fn iter_reset(&self) -> Result<(), EvalError> {
        match self {
            Object::Array(arr) => {
                arr.borrow_mut().cursor = 0;
                Ok(())
            }
            Object::Hash(hash) => {
                hash.borrow_mut().cursor = 0;
                Ok(())
            }
            other => Err(EvalError::runtime_error(
                "foreach",
                format!("{} is not iterable", other.type_name()),
            )),
        }
    }

    /// Advances the iteration cursor, returning (value, index_or_key, has_more).
    pub fn iter_next(&self) -> Result<(Object, Object, bool), EvalError> {
        match self {
            Object::Array(arr) => {
                let mut arr = arr.borrow_mut();
                let idx = arr.cursor;
                if idx >= arr.elements.len() {
                    return Ok((Object::Null, Object::Null, false));
                }
                arr.cursor += 1;
                let value = arr.elements[idx].clone();
                Ok((value, Object::Integer(idx as i64), true))
            }
            Object::Hash(hash) => {
                let mut hash = hash.borrow_mut();
                let idx = hash.cursor;
                if idx >= hash.pairs.len() {
                    return Ok((Object::Null, Object::Null, false));
                }
                hash.cursor += 1;
                let (_, (key, value)) = hash.pairs.get_index(idx).expect("checked bound above");
                Ok((value.clone(), key.clone(), true))
            }
            other => Err(EvalError::runtime_error(
                "foreach",
                format!("{} is not iterable", other.type_name()),
            )),
        }
    }
}

fn builtin(name: &str, func: impl Fn(&Rc<Environment>, &[Object]) -> Result<Object, EvalError> + 'static) -> Object {
    Object::Builtin(Rc::new(BuiltinData {
        name: name.to_string(),
        func: Rc::new(func),
    }))
}

/// Wraps a native function as a callable `Object::Builtin`, for use by
/// `src/builtins/*.rs` when registering host functions into the environment.
pub fn new_builtin(name: &str, func: impl Fn(&Rc<Environment>, &[Object]) -> Result<Object, EvalError> + 'static) -> Object {
    builtin(name, func)
}

fn array_method(arr: &Rc<RefCell<ArrayData>>, name: &str) -> Option<Object> {
    match name {
        "append" => {
            let arr = arr.clone();
            Some(builtin("array.append", move |_env, args| {
                let mut elements = arr.borrow().elements.clone();
                elements.extend(args.iter().cloned());
                Ok(Object::new_array(elements))
            }))
        }
        "methods" => {
            let static_methods = ["append", "methods"];
            Some(builtin("array.methods", move |env, _args| {
                Ok(methods_list(env, "array.", &static_methods))
            }))
        }
        _ => None,
    }
}

fn hash_method(hash: &Rc<RefCell<HashData>>, name: &str) -> Option<Object> {
    match name {
        "keys" => {
            let hash = hash.clone();
            Some(builtin("hash.keys", move |_env, _args| {
                let keys = hash
                    .borrow()
                    .pairs
                    .values()
                    .map(|(k, _)| k.clone())
                    .collect();
                Ok(Object::new_array(keys))
            }))
        }
        "set" => {
            let hash = hash.clone();
            Some(builtin("hash.set", move |_env, args| {
                if args.len() != 2 {
                    return Ok(Object::new_error(EvalError::arity_error("hash.set", "2", args.len()).to_string()));
                }
                let Some(key) = args[0].hash_key() else {
                    return Ok(Object::new_error(EvalError::UnusableHashKey(args[0].type_name().to_string()).to_string()));
                };
                let mut pairs = hash.borrow().pairs.clone();
                pairs.insert(key, (args[0].clone(), args[1].clone()));
                Ok(Object::new_hash(pairs))
            }))
        }
        "delete" => {
            let hash = hash.clone();
            Some(builtin("hash.delete", move |_env, args| {
                if args.len() != 1 {
                    return Ok(Object::new_error(EvalError::arity_error("hash.delete", "1", args.len()).to_string()));
                }
                let Some(key) = args[0].hash_key() else {
                    return Ok(Object::new_error(EvalError::UnusableHashKey(args[0].type_name().to_string()).to_string()));
                };
                let mut pairs = hash.borrow().pairs.clone();
                pairs.shift_remove(&key);
                Ok(Object::new_hash(pairs))
            }))
        }
        "methods" => {
            let static_methods = ["keys", "set", "delete", "methods"];
            Some(builtin("hash.methods", move |env, _args| {
                Ok(methods_list(env, "hash.", &static_methods))
            }))
        }
        _ => None,
    }
}

fn function_method(f: &Rc<FunctionData>, name: &str) -> Option<Object> {
    match name {
        "doc" => {
            let doc = f.doc.clone().unwrap_or_default();
            Some(builtin("function.doc", move |_env, _args| {
                Ok(Object::new_string(doc.clone()))
            }))
        }
        "name" => {
            let f = f.clone();
            Some(builtin("function.name", move |_env, _args| {
                Ok(Object::new_string(f.name.borrow().clone().unwrap_or_default()))
            }))
        }
        "methods" => {
            let static_methods = ["doc", "name", "methods"];
            Some(builtin("function.methods", move |env, _args| {
                Ok(methods_list(env, "function.", &static_methods))
            }))
        }
        _ => None,
    }
}

fn methods_list(env: &Rc<Environment>, prefix: &str, static_methods: &[&str]) -> Object {
    let mut names: Vec<Object> = static_methods
        .iter()
        .map(|m| Object::new_string(*m))
        .collect();
    for dynamic in env.names(prefix) {
        let short = dynamic.strip_prefix(prefix).unwrap_or(&dynamic).to_string();
        names.push(Object::new_string(short));
    }
    Object::new_array(names)
}

/// `==`/`!=` across possibly-mismatched types: same-type value equality, else
/// identity (meaningful only for Bool/Null, which have no distinct identities
/// to diverge from value equality in this implementation).
pub fn objects_equal(a: &Object, b: &Object) -> bool {
    match (a, b) {
        (Object::Integer(x), Object::Integer(y)) => x == y,
        (Object::Float(x), Object::Float(y)) => x == y,
        (Object::Integer(x), Object::Float(y)) | (Object::Float(y), Object::Integer(x)) => {
            *x as f64 == *y
        }
        (Object::Boolean(x), Object::Boolean(y)) => x == y,
        (Object::String(x), Object::String(y)) => x == y,
        (Object::DocString(x), Object::DocString(y)) => x == y,
        (Object::Null, Object::Null) => true,
        _ => false,
    }
}

fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.1}")
    } else {
        n.to_string()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_name(), self.inspect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_hashable_and_equal() {
        let a = Object::Integer(5);
        let b = Object::Integer(5);
        assert_eq!(a.hash_key(), b.hash_key());
    }

    #[test]
    fn string_and_docstring_keys_are_distinct() {
        let s = Object::String(Rc::from("x"));
        let d = Object::DocString(Rc::from("x"));
        assert_ne!(s.hash_key(), d.hash_key());
    }

    #[test]
    fn truthiness_matches_spec_table() {
        assert!(!Object::Null.is_truthy());
        assert!(!Object::Boolean(false).is_truthy());
        assert!(!Object::Integer(0).is_truthy());
        assert!(!Object::Float(0.0).is_truthy());
        assert!(!Object::new_string("").is_truthy());
        assert!(!Object::new_array(vec![]).is_truthy());
        assert!(Object::Integer(1).is_truthy());
        assert!(Object::new_string("x").is_truthy());
    }

    #[test]
    fn array_append_is_pure() {
        let arr = Object::new_array(vec![Object::Integer(1)]);
        let Object::Array(data) = &arr else { unreachable!() };
        let appended = arr.get_method("append").unwrap();
        let Object::Builtin(b) = appended else { unreachable!() };
        let env = Environment::new();
        let result = (b.func)(&env, &[Object::Integer(2)]).unwrap();
        assert_eq!(data.borrow().elements.len(), 1);
        let Object::Array(result_data) = result else { unreachable!() };
        assert_eq!(result_data.borrow().elements.len(), 2);
    }

    #[test]
    fn hash_iteration_visits_insertion_order() {
        let mut pairs = IndexMap::new();
        pairs.insert(
            HashKey::String("a".into()),
            (Object::new_string("a"), Object::Integer(1)),
        );
        pairs.insert(
            HashKey::String("b".into()),
            (Object::new_string("b"), Object::Integer(2)),
        );
        let hash = Object::new_hash(pairs);
        hash.iter_reset().unwrap();
        let (v1, k1, more1) = hash.iter_next().unwrap();
        assert!(more1);
        assert_eq!(k1.inspect(), "a");
        assert_eq!(v1.inspect(), "1");
        let (_, k2, more2) = hash.iter_next().unwrap();
        assert!(more2);
        assert_eq!(k2.inspect(), "b");
        let (_, _, more3) = hash.iter_next().unwrap();
        assert!(!more3);
    }
}
