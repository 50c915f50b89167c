// ABOUTME: Lexically nested environment chain: bindings, read-only flags,
// ABOUTME: temporary-scope permits for foreach/regex-capture, and current-args.

use crate::error::EvalError;
use crate::object::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub struct Environment {
    store: RefCell<HashMap<String, Object>>,
    readonly: RefCell<HashMap<String, bool>>,
    outer: Option<Rc<Environment>>,
    /// Names this scope is permitted to bind locally; writes to any other
    /// name bubble to `outer`. Empty means "no restriction" (a regular block).
    permit: Vec<String>,
    current_args: Vec<Object>,
    /// True only for scopes created by a real function call (`enclosed`). Scopes
    /// created for block-local purposes (temporary_scope) don't own an args
    /// list of their own and bubble `...` lookups to the nearest call frame.
    owns_args: bool,
    /// REPL sessions relax the root-scope "assign to undefined is fatal" rule.
    is_repl: bool,
}

impl Environment {
    pub fn new() -> Rc<Environment> {
        Rc::new(Environment {
            store: RefCell::new(HashMap::new()),
            readonly: RefCell::new(HashMap::new()),
            outer: None,
            permit: Vec::new(),
            current_args: Vec::new(),
            owns_args: true,
            is_repl: false,
        })
    }

    pub fn new_repl() -> Rc<Environment> {
        Rc::new(Environment {
            store: RefCell::new(HashMap::new()),
            readonly: RefCell::new(HashMap::new()),
            outer: None,
            permit: Vec::new(),
            current_args: Vec::new(),
            owns_args: true,
            is_repl: true,
        })
    }

    /// A real function-call frame: `...` inside its body refers to `args`.
    pub fn enclosed(outer: &Rc<Environment>, args: Vec<Object>) -> Rc<Environment> {
        Rc::new(Environment {
            store: RefCell::new(HashMap::new()),
            readonly: RefCell::new(HashMap::new()),
            outer: Some(outer.clone()),
            permit: Vec::new(),
            current_args: args,
            owns_args: true,
            is_repl: outer.is_repl,
        })
    }

    /// A scope used for foreach bodies and regex-capture `if` conditions: only
    /// `keys` are writable locally; any other write bubbles to `outer`. Not a
    /// call frame, so `...` bubbles through to the nearest enclosing one.
    pub fn temporary_scope(outer: &Rc<Environment>, keys: Vec<String>) -> Rc<Environment> {
        Rc::new(Environment {
            store: RefCell::new(HashMap::new()),
            readonly: RefCell::new(HashMap::new()),
            outer: Some(outer.clone()),
            permit: keys,
            current_args: Vec::new(),
            owns_args: false,
            is_repl: outer.is_repl,
        })
    }

    /// The enclosing function call's argument list, for `...` evaluation.
    pub fn current_args(&self) -> Vec<Object> {
        if self.owns_args {
            self.current_args.clone()
        } else {
            self.outer.as_ref().map(|o| o.current_args()).unwrap_or_default()
        }
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        if let Some(v) = self.store.borrow().get(name) {
            return Some(v.clone());
        }
        self.outer.as_ref().and_then(|o| o.get(name))
    }

    fn has_local(&self, name: &str) -> bool {
        self.store.borrow().contains_key(name)
    }

    fn is_readonly_here(&self, name: &str) -> bool {
        self.readonly.borrow().get(name).copied().unwrap_or(false)
    }

    /// Updates the nearest enclosing scope that already binds `name`; if none
    /// do, inserts into the current scope. Honors permit lists (foreach/if
    /// temporary scopes) and the root-scope undefined-assignment policy.
    pub fn set(&self, name: &str, value: Object) -> Result<Object, EvalError> {
        if self.has_local(name) && self.is_readonly_here(name) {
            return Err(EvalError::ReadonlyViolation(name.to_string()));
        }
        if let Some(outer) = &self.outer {
            if outer.is_bound_anywhere(name) && outer.readonly_anywhere(name) {
                return Err(EvalError::ReadonlyViolation(name.to_string()));
            }
        }

        if self.outer.is_none() && !self.has_local(name) && !self.is_repl {
            return Err(EvalError::RootAssignToUndefined(name.to_string()));
        }

        if !self.permit.is_empty() {
            if self.permit.iter().any(|p| p == name) {
                self.bind_function_name(name, &value);
                self.store.borrow_mut().insert(name.to_string(), value.clone());
                return Ok(value);
            }
            return match &self.outer {
                Some(outer) => outer.set(name, value),
                None => Err(EvalError::runtime_error(
                    "set",
                    "broken scope: temporary scope has no outer",
                )),
            };
        }

        // Bare assignment never shadows: if an outer scope already has this
        // name, the write goes there instead of creating a new local binding.
        if let Some(outer) = &self.outer {
            if outer.is_bound_anywhere(name) {
                return outer.set(name, value);
            }
        }

        self.bind_function_name(name, &value);
        self.store.borrow_mut().insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// `let NAME = value;` — always binds in the current scope and marks it
    /// read-only.
    pub fn set_immutable(&self, name: &str, value: Object) -> Result<Object, EvalError> {
        if self.has_local(name) && self.is_readonly_here(name) {
            return Err(EvalError::ReadonlyViolation(name.to_string()));
        }
        self.bind_function_name(name, &value);
        self.store.borrow_mut().insert(name.to_string(), value.clone());
        self.readonly.borrow_mut().insert(name.to_string(), true);
        Ok(value)
    }

    /// `mutable NAME = value;` — always binds in the current scope, writable.
    pub fn define_mutable(&self, name: &str, value: Object) -> Result<Object, EvalError> {
        if self.has_local(name) && self.is_readonly_here(name) {
            return Err(EvalError::ReadonlyViolation(name.to_string()));
        }
        self.bind_function_name(name, &value);
        self.store.borrow_mut().insert(name.to_string(), value.clone());
        self.readonly.borrow_mut().insert(name.to_string(), false);
        Ok(value)
    }

    fn bind_function_name(&self, name: &str, value: &Object) {
        if let Object::Function(f) = value {
            *f.name.borrow_mut() = Some(name.to_string());
        }
    }

    fn is_bound_anywhere(&self, name: &str) -> bool {
        self.has_local(name) || self.outer.as_ref().is_some_and(|o| o.is_bound_anywhere(name))
    }

    fn readonly_anywhere(&self, name: &str) -> bool {
        if self.has_local(name) {
            return self.is_readonly_here(name);
        }
        self.outer.as_ref().is_some_and(|o| o.readonly_anywhere(name))
    }

    /// All bound names (in this scope and outward) beginning with `prefix`,
    /// plus anything under `object.` (universal method fallback names).
    pub fn names(&self, prefix: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        let mut env = Some(self);
        while let Some(e) = env {
            for key in e.store.borrow().keys() {
                if (key.starts_with(prefix) || key.starts_with("object.")) && seen.insert(key.clone()) {
                    out.push(key.clone());
                }
            }
            env = e.outer.as_deref();
        }
        out
    }

    /// Snapshots every binding visible from this scope into a Hash, used by
    /// the module system to wrap an evaluated file's top-level bindings.
    pub fn exported_hash(&self) -> indexmap::IndexMap<crate::object::HashKey, (Object, Object)> {
        let mut pairs = indexmap::IndexMap::new();
        for (k, v) in self.store.borrow().iter() {
            pairs.insert(
                crate::object::HashKey::String(k.clone()),
                (Object::new_string(k.clone()), v.clone()),
            );
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let env = Environment::new();
        env.define_mutable("x", Object::Integer(1)).unwrap();
        assert_eq!(env.get("x").unwrap().inspect(), "1");
    }

    #[test]
    fn undefined_lookup_returns_none() {
        let env = Environment::new();
        assert!(env.get("missing").is_none());
    }

    #[test]
    fn child_sees_parent_value() {
        let parent = Environment::new();
        parent.define_mutable("x", Object::Integer(1)).unwrap();
        let child = Environment::enclosed(&parent, vec![]);
        assert_eq!(child.get("x").unwrap().inspect(), "1");
    }

    #[test]
    fn bare_assignment_updates_outer_not_shadow() {
        let parent = Environment::new();
        parent.define_mutable("x", Object::Integer(1)).unwrap();
        let child = Environment::enclosed(&parent, vec![]);
        child.set("x", Object::Integer(2)).unwrap();
        assert_eq!(parent.get("x").unwrap().inspect(), "2");
    }

    #[test]
    fn readonly_write_is_fatal() {
        let env = Environment::new();
        env.set_immutable("x", Object::Integer(1)).unwrap();
        let err = env.set("x", Object::Integer(2)).unwrap_err();
        assert!(err.to_string().contains("constant"));
    }

    #[test]
    fn root_assign_to_undefined_is_fatal_outside_repl() {
        let env = Environment::new();
        let err = env.set("y", Object::Integer(1)).unwrap_err();
        assert!(err.to_string().contains("y"));
    }

    #[test]
    fn root_assign_to_undefined_permitted_in_repl() {
        let env = Environment::new_repl();
        assert!(env.set("y", Object::Integer(1)).is_ok());
    }

    #[test]
    fn temporary_scope_permits_only_listed_names() {
        let parent = Environment::new();
        parent.define_mutable("outside", Object::Integer(0)).unwrap();
        let temp = Environment::temporary_scope(&parent, vec!["i".to_string()]);
        temp.set("i", Object::Integer(5)).unwrap();
        assert_eq!(temp.get("i").unwrap().inspect(), "5");
        assert!(parent.get("i").is_none());

        temp.set("outside", Object::Integer(9)).unwrap();
        assert_eq!(parent.get("outside").unwrap().inspect(), "9");
    }

    #[test]
    fn grandparent_chain_lookup() {
        let grandparent = Environment::new();
        grandparent.define_mutable("g", Object::Integer(1)).unwrap();
        let parent = Environment::enclosed(&grandparent, vec![]);
        let child = Environment::enclosed(&parent, vec![]);
        assert_eq!(child.get("g").unwrap().inspect(), "1");
    }
}
