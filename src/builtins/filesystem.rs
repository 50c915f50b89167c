//! Filesystem I/O operations: fs.read, fs.write, fs.exists, fs.size, fs.stat, fs.list
//!
//! All paths are resolved against the sandbox's whitelisted roots via
//! capability-based security (see `sandbox.rs`); failures come back as Error
//! values, not as a Rust panic or a hard evaluator abort.

use crate::env::Environment;
use crate::error::EvalError;
use crate::object::{new_builtin, Object};
use std::rc::Rc;

use super::SANDBOX;

fn with_sandbox<T>(f: impl FnOnce(&crate::sandbox::Sandbox) -> Result<T, crate::sandbox::SandboxError>) -> Result<T, String> {
    SANDBOX.with(|s| {
        let sandbox_ref = s.borrow();
        let sandbox = sandbox_ref.as_ref().ok_or_else(|| crate::error::ERR_SANDBOX_NOT_INIT.to_string())?;
        f(sandbox).map_err(|e| e.to_string())
    })
}

fn expect_string(function: &str, args: &[Object], i: usize) -> Result<Rc<str>, Object> {
    match args.get(i) {
        Some(Object::String(s)) => Ok(s.clone()),
        Some(other) => Err(Object::new_error(EvalError::type_error(function, "STRING", other.type_name()).to_string())),
        None => Err(Object::new_error(EvalError::arity_error(function, "at least 1", args.len()).to_string())),
    }
}

fn fs_read(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let path = match expect_string("fs.read", args, 0) {
        Ok(p) => p,
        Err(e) => return Ok(e),
    };
    match with_sandbox(|sb| sb.read_file(&path)) {
        Ok(contents) => Ok(Object::new_string(contents)),
        Err(msg) => Ok(Object::new_error(format!("fs.read: {msg}"))),
    }
}

fn fs_write(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let path = match expect_string("fs.write", args, 0) {
        Ok(p) => p,
        Err(e) => return Ok(e),
    };
    let contents = match expect_string("fs.write", args, 1) {
        Ok(c) => c,
        Err(e) => return Ok(e),
    };
    match with_sandbox(|sb| sb.write_file(&path, &contents)) {
        Ok(()) => Ok(Object::Boolean(true)),
        Err(msg) => Ok(Object::new_error(format!("fs.write: {msg}"))),
    }
}

fn fs_exists(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let path = match expect_string("fs.exists", args, 0) {
        Ok(p) => p,
        Err(e) => return Ok(e),
    };
    match with_sandbox(|sb| sb.file_exists(&path)) {
        Ok(exists) => Ok(Object::Boolean(exists)),
        Err(msg) => Ok(Object::new_error(format!("fs.exists: {msg}"))),
    }
}

fn fs_size(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let path = match expect_string("fs.size", args, 0) {
        Ok(p) => p,
        Err(e) => return Ok(e),
    };
    match with_sandbox(|sb| sb.file_size(&path)) {
        Ok(size) => Ok(Object::Integer(size as i64)),
        Err(msg) => Ok(Object::new_error(format!("fs.size: {msg}"))),
    }
}

fn fs_stat(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let path = match expect_string("fs.stat", args, 0) {
        Ok(p) => p,
        Err(e) => return Ok(e),
    };
    match with_sandbox(|sb| sb.file_stat(&path)) {
        Ok(stat) => {
            let mut pairs = indexmap::IndexMap::new();
            let mut set = |k: &str, v: Object| {
                pairs.insert(crate::object::HashKey::String(k.to_string()), (Object::new_string(k), v));
            };
            set("size", Object::Integer(stat.size as i64));
            set("type", Object::new_string(stat.file_type));
            set("modified", Object::Float(stat.modified));
            set("accessed", Object::Float(stat.accessed));
            set("created", Object::Float(stat.created));
            set("readonly", Object::Boolean(stat.readonly));
            Ok(Object::new_hash(pairs))
        }
        Err(msg) => Ok(Object::new_error(format!("fs.stat: {msg}"))),
    }
}

fn fs_list(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    let dir = match expect_string("fs.list", args, 0) {
        Ok(d) => d,
        Err(e) => return Ok(e),
    };
    match with_sandbox(|sb| sb.list_files(&dir)) {
        Ok(files) => Ok(Object::new_array(files.into_iter().map(Object::new_string).collect())),
        Err(msg) => Ok(Object::new_error(format!("fs.list: {msg}"))),
    }
}

pub fn register(env: &Rc<Environment>) {
    for (name, func) in [
        ("fs.read", fs_read as fn(&Rc<Environment>, &[Object]) -> Result<Object, EvalError>),
        ("fs.write", fs_write),
        ("fs.exists", fs_exists),
        ("fs.size", fs_size),
        ("fs.stat", fs_stat),
        ("fs.list", fs_list),
    ] {
        let _ = env.set_immutable(name, new_builtin(name, func));
    }

    crate::help::register_help(crate::help::HelpEntry {
        name: "fs.read".to_string(),
        signature: "fs.read(path)".to_string(),
        description: "Reads and returns the contents of a file as a String. Path is resolved against sandbox roots.".to_string(),
        examples: vec!["fs.read(\"data/input.txt\")".to_string()],
        related: vec!["fs.write".to_string(), "fs.exists".to_string()],
        category: "Filesystem I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "fs.write".to_string(),
        signature: "fs.write(path, contents)".to_string(),
        description: "Writes contents to a file, creating it if needed. Returns true on success.".to_string(),
        examples: vec!["fs.write(\"out.txt\", \"hello\")".to_string()],
        related: vec!["fs.read".to_string()],
        category: "Filesystem I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "fs.exists".to_string(),
        signature: "fs.exists(path)".to_string(),
        description: "Tests whether a file exists and is accessible within the sandbox.".to_string(),
        examples: vec!["fs.exists(\"out.txt\")".to_string()],
        related: vec!["fs.size".to_string(), "fs.stat".to_string()],
        category: "Filesystem I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "fs.size".to_string(),
        signature: "fs.size(path)".to_string(),
        description: "Returns the size of a file in bytes.".to_string(),
        examples: vec!["fs.size(\"out.txt\")".to_string()],
        related: vec!["fs.exists".to_string()],
        category: "Filesystem I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "fs.stat".to_string(),
        signature: "fs.stat(path)".to_string(),
        description: "Returns a Hash with size/type/modified/accessed/created/readonly metadata.".to_string(),
        examples: vec!["fs.stat(\"out.txt\")".to_string()],
        related: vec!["fs.size".to_string()],
        category: "Filesystem I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "fs.list".to_string(),
        signature: "fs.list(directory)".to_string(),
        description: "Returns an Array of filenames (not full paths) in a directory.".to_string(),
        examples: vec!["fs.list(\"data\")".to_string()],
        related: vec!["fs.exists".to_string()],
        category: "Filesystem I/O".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FsConfig, NetConfig};
    use crate::sandbox::Sandbox;

    fn with_test_sandbox<T>(f: impl FnOnce() -> T) -> T {
        let dir = std::env::temp_dir().join(format!("cozy-fs-builtin-test-{:?}", std::thread::current().id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let fs_config = FsConfig { allowed_paths: vec![dir.clone()], max_file_size: 1024 * 1024 };
        let sandbox = Sandbox::new(fs_config, NetConfig::default()).unwrap();
        super::set_sandbox_storage(sandbox);
        let result = f();
        let _ = std::fs::remove_dir_all(&dir);
        result
    }

    fn path_in_sandbox(rel: &str) -> String {
        format!("{}/{}", std::env::temp_dir().join(format!("cozy-fs-builtin-test-{:?}", std::thread::current().id())).display(), rel)
    }

    #[test]
    fn test_fs_write_then_read() {
        with_test_sandbox(|| {
            let path = Object::new_string(path_in_sandbox("hello.txt"));
            let contents = Object::new_string("hi there");
            let env = Environment::new();
            let written = fs_write(&env, &[path.clone(), contents]).unwrap();
            assert_eq!(written.inspect(), "true");
            let read_back = fs_read(&env, &[path]).unwrap();
            assert_eq!(read_back.inspect(), "hi there");
        });
    }

    #[test]
    fn test_fs_exists_false_for_missing_file() {
        with_test_sandbox(|| {
            let env = Environment::new();
            let path = Object::new_string(path_in_sandbox("nope.txt"));
            let result = fs_exists(&env, &[path]).unwrap();
            assert_eq!(result.inspect(), "false");
        });
    }

    #[test]
    fn test_fs_read_missing_file_is_error_value_not_panic() {
        with_test_sandbox(|| {
            let env = Environment::new();
            let path = Object::new_string(path_in_sandbox("missing.txt"));
            let result = fs_read(&env, &[path]).unwrap();
            assert!(matches!(result, Object::Error(_)));
        });
    }

    #[test]
    fn test_fs_read_wrong_arg_type_is_error_value() {
        let env = Environment::new();
        let result = fs_read(&env, &[Object::Integer(5)]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }
}
