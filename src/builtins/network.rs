//! Network I/O operations: http.get, http.post
//!
//! All requests are checked against the sandbox's URL allowlist.

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

fn response_to_hash(resp: crate::sandbox::HttpResponse) -> Object {
    let mut pairs = indexmap::IndexMap::new();
    let mut set = |k: &str, v: Object| {
        pairs.insert(crate::object::HashKey::String(k.to_string()), (Object::new_string(k), v));
    };
    set("status", Object::Integer(resp.status as i64));
    let headers: indexmap::IndexMap<_, _> = resp
        .headers
        .into_iter()
        .map(|(k, v)| (crate::object::HashKey::String(k.clone()), (Object::new_string(k), Object::new_string(v))))
        .collect();
    set("headers", Object::new_hash(headers));
    set("body", Object::new_string(resp.body));
    Object::new_hash(pairs)
}

fn http_get(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 1 {
        return Ok(Object::new_error(EvalError::arity_error("http.get", "1", args.len()).to_string()));
    }
    let Object::String(url) = &args[0] else {
        return Ok(Object::new_error(EvalError::type_error("http.get", "STRING", args[0].type_name()).to_string()));
    };
    match with_sandbox(|sb| sb.http_request(url, "GET", None, None, None)) {
        Ok(resp) => Ok(response_to_hash(resp)),
        Err(msg) => Ok(Object::new_error(format!("http.get: {msg}"))),
    }
}

fn http_post(_env: &Rc<Environment>, args: &[Object]) -> Result<Object, EvalError> {
    if args.len() != 2 {
        return Ok(Object::new_error(EvalError::arity_error("http.post", "2", args.len()).to_string()));
    }
    let Object::String(url) = &args[0] else {
        return Ok(Object::new_error(EvalError::type_error("http.post", "STRING", args[0].type_name()).to_string()));
    };
    let Object::String(body) = &args[1] else {
        return Ok(Object::new_error(EvalError::type_error("http.post", "STRING", args[1].type_name()).to_string()));
    };
    match with_sandbox(|sb| sb.http_request(url, "POST", None, Some(body), None)) {
        Ok(resp) => Ok(response_to_hash(resp)),
        Err(msg) => Ok(Object::new_error(format!("http.post: {msg}"))),
    }
}

pub fn register(env: &Rc<Environment>) {
    let _ = env.set_immutable("http.get", new_builtin("http.get", http_get));
    let _ = env.set_immutable("http.post", new_builtin("http.post", http_post));

    crate::help::register_help(crate::help::HelpEntry {
        name: "http.get".to_string(),
        signature: "http.get(url)".to_string(),
        description: "Performs an HTTP GET request and returns a Hash with status/headers/body. URL must be allowed by the sandbox's network policy. 30 second timeout.".to_string(),
        examples: vec!["http.get(\"https://example.com\").body".to_string()],
        related: vec!["http.post".to_string()],
        category: "Network I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "http.post".to_string(),
        signature: "http.post(url, body)".to_string(),
        description: "Performs an HTTP POST request with a plain-text body and returns a Hash with status/headers/body.".to_string(),
        examples: vec!["http.post(\"https://api.example.com\", \"data\").status".to_string()],
        related: vec!["http.get".to_string()],
        category: "Network I/O".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FsConfig, NetConfig};
    use crate::sandbox::Sandbox;

    fn init_disabled_sandbox() {
        let sandbox = Sandbox::new(FsConfig::default(), NetConfig::default()).unwrap();
        super::set_sandbox_storage(sandbox);
    }

    #[test]
    fn test_http_get_wrong_arity_is_error_value() {
        init_disabled_sandbox();
        let env = Environment::new();
        let result = http_get(&env, &[]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }

    #[test]
    fn test_http_get_wrong_arg_type_is_error_value() {
        init_disabled_sandbox();
        let env = Environment::new();
        let result = http_get(&env, &[Object::Integer(1)]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }

    #[test]
    fn test_http_get_denied_when_network_disabled() {
        init_disabled_sandbox();
        let env = Environment::new();
        let result = http_get(&env, &[Object::new_string("https://example.com")]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }

    #[test]
    fn test_http_post_wrong_arity_is_error_value() {
        init_disabled_sandbox();
        let env = Environment::new();
        let result = http_post(&env, &[Object::new_string("https://example.com")]).unwrap();
        assert!(matches!(result, Object::Error(_)));
    }
}
