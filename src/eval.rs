// ABOUTME: Tree-walking evaluator: runs a Program against an Environment,
// ABOUTME: expanding macros first and threading a cancellation flag throughout.

use crate::ast::{AssignOp, Block, Expr, Param, Program, Stmt};
use crate::env::Environment;
use crate::error::EvalError;
use crate::macros::MacroRegistry;
use crate::object::{objects_equal, FunctionData, ModuleData, Object, RegexpData};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const MAX_CAPTURE_GROUPS: usize = 31;

/// If `$expr` evaluates to an Error object, bail out of the enclosing
/// `eval_*` function immediately with that value. Fatal (Rust-level) failures
/// still propagate via `?` as usual.
macro_rules! try_eval {
    ($e:expr) => {{
        let v = $e?;
        if v.is_error() {
            return Ok(v);
        }
        v
    }};
}

/// Cooperative cancellation: checked at every statement/expression boundary so
/// a host embedding this interpreter can interrupt a runaway script.
#[derive(Clone)]
pub struct EvalContext {
    cancelled: Rc<Cell<bool>>,
}

impl Default for EvalContext {
    fn default() -> Self {
        EvalContext {
            cancelled: Rc::new(Cell::new(false)),
        }
    }
}

impl EvalContext {
    pub fn new() -> Self {
        EvalContext::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    fn check(&self) -> Result<(), EvalError> {
        if self.cancelled.get() {
            return Err(EvalError::Cancelled("interrupted".to_string()));
        }
        Ok(())
    }
}

pub fn eval_program(program: &Program, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    let mut registry = MacroRegistry::new();
    let stripped = registry.scan_and_strip(program);
    let expanded = expand_program(&stripped, &registry, env, ctx)?;
    eval_block_stmts(&expanded, env, ctx)
}

fn eval_block_stmts(stmts: &[Stmt], env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    let mut result = Object::Null;
    for stmt in stmts {
        result = eval_statement(stmt, env, ctx)?;
        match &result {
            Object::ReturnValue(_) | Object::Error(_) => return Ok(result),
            _ => {}
        }
    }
    Ok(result)
}

fn eval_statement(stmt: &Stmt, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    ctx.check()?;
    match stmt {
        Stmt::Let { name, value } => {
            let val = try_eval!(eval_expr(value, env, ctx));
            env.set_immutable(name, val)?;
            Ok(Object::Null)
        }
        Stmt::Mutable { name, value } => {
            let val = try_eval!(eval_expr(value, env, ctx));
            env.define_mutable(name, val)?;
            Ok(Object::Null)
        }
        Stmt::Return(value) => {
            let val = match value {
                Some(e) => try_eval!(eval_expr(e, env, ctx)),
                None => Object::Null,
            };
            Ok(Object::ReturnValue(Box::new(val)))
        }
        Stmt::Expression(e) => eval_expr(e, env, ctx),
        Stmt::Block(b) => eval_block_stmts(b, env, ctx),
        Stmt::Foreach {
            index,
            name,
            iterable,
            body,
        } => eval_foreach(index, name, iterable, body, env, ctx),
    }
}

pub fn eval_expr(expr: &Expr, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    ctx.check()?;
    match expr {
        Expr::Identifier(name) => Ok(env
            .get(name)
            .unwrap_or_else(|| Object::new_error(EvalError::UndefinedIdentifier(name.clone()).to_string()))),
        Expr::Int(n) => Ok(Object::Integer(*n)),
        Expr::Float(n) => Ok(Object::Float(*n)),
        Expr::Bool(b) => Ok(Object::Boolean(*b)),
        Expr::Null => Ok(Object::Null),
        Expr::Str(s) => Ok(Object::new_string(interpolate(s, env, ctx)?)),
        Expr::DocString(s) => Ok(Object::DocString(Rc::from(s.as_str()))),
        Expr::Regexp { pattern, flags } => Ok(compile_regexp(pattern, flags)),
        Expr::CurrentArgs => Ok(Object::new_array(env.current_args())),
        Expr::Array(items) => {
            let vals = match eval_expr_list(items, env, ctx) {
                Ok(v) => v,
                Err(e) => return Ok(e),
            };
            Ok(Object::new_array(vals))
        }
        Expr::Hash(pairs) => eval_hash_literal(pairs, env, ctx),
        Expr::Function { params, body, doc } => Ok(Object::Function(Rc::new(FunctionData {
            params: params.clone(),
            body: body.clone(),
            env: env.clone(),
            doc: doc.clone(),
            name: RefCell::new(None),
        }))),
        Expr::Macro { params, body } => Ok(Object::Macro(Rc::new(crate::object::MacroData {
            params: params.clone(),
            body: body.clone(),
            env: env.clone(),
        }))),
        Expr::Quoted(inner) => Ok(Object::Quote(Rc::new((**inner).clone()))),
        Expr::Prefix { op, right } => eval_prefix(op, right, env, ctx),
        Expr::Postfix { op, name } => eval_postfix(op, name, env),
        Expr::Infix { op, left, right } => eval_infix_expr(op, left, right, env, ctx),
        Expr::Assign { name, op, value } => eval_assign(name, op, value, env, ctx),
        Expr::Ternary { condition, yes, no } => {
            let cond = try_eval!(eval_expr(condition, env, ctx));
            if cond.is_truthy() {
                eval_expr(yes, env, ctx)
            } else {
                eval_expr(no, env, ctx)
            }
        }
        Expr::If {
            condition,
            consequence,
            alternative,
        } => eval_if(condition, consequence, alternative, env, ctx),
        Expr::While { condition, body } => eval_loop(condition, body, env, ctx),
        Expr::For { condition, body } => eval_loop(condition, body, env, ctx),
        Expr::Import(path) => eval_import_expr(path, env, ctx),
        Expr::Call { function, args } => eval_call(function, args, env, ctx),
        Expr::Index { left, index } => eval_index_expr(left, index, env, ctx),
    }
}

/// Evaluates a comma-separated list of argument expressions, splicing `...`
/// in place. Short-circuits on the first Error value via `Err`.
fn eval_expr_list(exprs: &[Expr], env: &Rc<Environment>, ctx: &EvalContext) -> Result<Vec<Object>, Object> {
    let mut out = Vec::new();
    for e in exprs {
        if matches!(e, Expr::CurrentArgs) {
            out.extend(env.current_args());
            continue;
        }
        match eval_expr(e, env, ctx) {
            Ok(v) if v.is_error() => return Err(v),
            Ok(v) => out.push(v),
            Err(err) => return Err(Object::new_error(err.to_string())),
        }
    }
    Ok(out)
}

fn eval_hash_literal(pairs: &[(Expr, Expr)], env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    let mut map = IndexMap::new();
    for (k, v) in pairs {
        let key_val = try_eval!(eval_expr(k, env, ctx));
        let val_val = try_eval!(eval_expr(v, env, ctx));
        let hk = match key_val.hash_key() {
            Some(hk) => hk,
            None => {
                return Ok(Object::new_error(EvalError::UnusableHashKey(key_val.type_name().to_string()).to_string()));
            }
        };
        map.insert(hk, (key_val, val_val));
    }
    Ok(Object::new_hash(map))
}

fn compile_regexp(pattern: &str, flags: &str) -> Object {
    let full_pattern = if flags.contains('i') {
        format!("(?i){pattern}")
    } else {
        pattern.to_string()
    };
    match regex::Regex::new(&full_pattern) {
        Ok(compiled) => Object::Regexp(Rc::new(RegexpData {
            pattern: pattern.to_string(),
            flags: flags.to_string(),
            compiled,
        })),
        Err(e) => Object::new_error(
            EvalError::InvalidRegex {
                pattern: pattern.to_string(),
                message: e.to_string(),
            }
            .to_string(),
        ),
    }
}

fn eval_prefix(op: &str, right: &Expr, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    let val = try_eval!(eval_expr(right, env, ctx));
    match (op, &val) {
        ("!", _) => Ok(Object::Boolean(!val.is_truthy())),
        ("-", Object::Integer(n)) => Ok(Object::Integer(-n)),
        ("-", Object::Float(n)) => Ok(Object::Float(-n)),
        ("-", other) => Ok(Object::new_error(format!("unknown operator: -{}", other.type_name()))),
        _ => Ok(Object::new_error(format!("unknown operator: {op}"))),
    }
}

fn eval_postfix(op: &str, name: &str, env: &Rc<Environment>) -> Result<Object, EvalError> {
    let current = match env.get(name) {
        Some(v) => v,
        None => return Ok(Object::new_error(EvalError::UndefinedIdentifier(name.to_string()).to_string())),
    };
    let pre = current.clone();
    let delta = if op == "++" { 1 } else { -1 };
    let new_val = match current {
        Object::Integer(n) => Object::Integer(n + delta),
        other => return Ok(Object::new_error(format!("{}: not a number", other.type_name()))),
    };
    env.set(name, new_val)?;
    Ok(pre)
}

fn eval_infix_expr(op: &str, left: &Expr, right: &Expr, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    if op == "&&" {
        let l = try_eval!(eval_expr(left, env, ctx));
        if !l.is_truthy() {
            return Ok(Object::Boolean(false));
        }
        let r = try_eval!(eval_expr(right, env, ctx));
        return Ok(Object::Boolean(r.is_truthy()));
    }
    if op == "||" {
        let l = try_eval!(eval_expr(left, env, ctx));
        if l.is_truthy() {
            return Ok(Object::Boolean(true));
        }
        let r = try_eval!(eval_expr(right, env, ctx));
        return Ok(Object::Boolean(r.is_truthy()));
    }
    let l = try_eval!(eval_expr(left, env, ctx));
    let r = try_eval!(eval_expr(right, env, ctx));
    eval_infix(op, l, r, env)
}

fn eval_infix(op: &str, left: Object, right: Object, env: &Rc<Environment>) -> Result<Object, EvalError> {
    match op {
        "==" => return Ok(Object::Boolean(objects_equal(&left, &right))),
        "!=" => return Ok(Object::Boolean(!objects_equal(&left, &right))),
        "~=" | "!~" => return eval_match(op, &left, &right, env),
        _ => {}
    }
    match (&left, &right) {
        (Object::Integer(a), Object::Integer(b)) => eval_integer_infix(op, *a, *b),
        (Object::Integer(a), Object::Float(b)) => eval_float_infix(op, *a as f64, *b),
        (Object::Float(a), Object::Integer(b)) => eval_float_infix(op, *a, *b as f64),
        (Object::Float(a), Object::Float(b)) => eval_float_infix(op, *a, *b),
        (Object::String(a), Object::String(b)) => eval_string_infix(op, a, b),
        (Object::Boolean(a), Object::Boolean(b)) => eval_boolean_infix(op, *a, *b),
        _ => Ok(Object::new_error(format!(
            "type mismatch: {} {op} {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn eval_integer_infix(op: &str, a: i64, b: i64) -> Result<Object, EvalError> {
    Ok(match op {
        "+" => Object::Integer(a + b),
        "-" => Object::Integer(a - b),
        "*" => Object::Integer(a * b),
        "/" => {
            if b == 0 {
                return Ok(Object::new_error("division by zero"));
            }
            Object::Integer(a / b)
        }
        "%" => {
            if b == 0 {
                return Ok(Object::new_error("division by zero"));
            }
            Object::Integer(a % b)
        }
        // Power round-trips through f64, matching the historical source's choice
        // to share one `pow` implementation across Integer and Float.
        "**" => Object::Integer((a as f64).powf(b as f64) as i64),
        "<" => Object::Boolean(a < b),
        ">" => Object::Boolean(a > b),
        "<=" => Object::Boolean(a <= b),
        ">=" => Object::Boolean(a >= b),
        ".." => {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            Object::new_array((lo..=hi).map(Object::Integer).collect())
        }
        _ => return Ok(Object::new_error(format!("unknown operator: INTEGER {op} INTEGER"))),
    })
}

/// Boolean comparisons compare the `inspect()` string form ("false" < "true"),
/// a historical quirk preserved for compatibility; `==`/`!=` are handled earlier.
fn eval_boolean_infix(op: &str, a: bool, b: bool) -> Result<Object, EvalError> {
    let (sa, sb) = (a.to_string(), b.to_string());
    Ok(match op {
        "<" => Object::Boolean(sa < sb),
        ">" => Object::Boolean(sa > sb),
        "<=" => Object::Boolean(sa <= sb),
        ">=" => Object::Boolean(sa >= sb),
        _ => Object::new_error(format!("unknown operator: BOOLEAN {op} BOOLEAN")),
    })
}

fn eval_float_infix(op: &str, a: f64, b: f64) -> Result<Object, EvalError> {
    Ok(match op {
        "+" => Object::Float(a + b),
        "-" => Object::Float(a - b),
        "*" => Object::Float(a * b),
        "/" => Object::Float(a / b),
        "%" => Object::Float(a % b),
        "**" => Object::Float(a.powf(b)),
        "<" => Object::Boolean(a < b),
        ">" => Object::Boolean(a > b),
        "<=" => Object::Boolean(a <= b),
        ">=" => Object::Boolean(a >= b),
        _ => return Ok(Object::new_error(format!("unknown operator: FLOAT {op} FLOAT"))),
    })
}

fn eval_string_infix(op: &str, a: &str, b: &str) -> Result<Object, EvalError> {
    Ok(match op {
        "+" => Object::new_string(format!("{a}{b}")),
        "<" => Object::Boolean(a < b),
        ">" => Object::Boolean(a > b),
        "<=" => Object::Boolean(a <= b),
        ">=" => Object::Boolean(a >= b),
        _ => return Ok(Object::new_error(format!("unknown operator: STRING {op} STRING"))),
    })
}

/// `~=`/`!~`: match a string against a regex, binding capture groups $1..$31
/// into the current scope as a side effect (spec-mandated, however surprising).
fn eval_match(op: &str, left: &Object, right: &Object, env: &Rc<Environment>) -> Result<Object, EvalError> {
    let (text, regex) = match (left, right) {
        (Object::String(s), Object::Regexp(r)) => (s.to_string(), r.clone()),
        _ => {
            return Ok(Object::new_error(format!(
                "type mismatch: {} {op} {}",
                left.type_name(),
                right.type_name()
            )))
        }
    };
    match regex.compiled.captures(&text) {
        Some(caps) => {
            for i in 1..=MAX_CAPTURE_GROUPS {
                if let Some(m) = caps.get(i) {
                    env.set(&format!("${i}"), Object::new_string(m.as_str()))?;
                }
            }
            Ok(Object::Boolean(op == "~="))
        }
        None => Ok(Object::Boolean(op == "!~")),
    }
}

fn eval_assign(name: &str, op: &AssignOp, value: &Expr, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    let rhs = try_eval!(eval_expr(value, env, ctx));
    let new_val = match op.as_infix_op() {
        None => rhs,
        Some(infix_op) => {
            let current = match env.get(name) {
                Some(v) => v,
                None => return Ok(Object::new_error(EvalError::UndefinedIdentifier(name.to_string()).to_string())),
            };
            try_eval!(eval_infix(infix_op, current, rhs, env))
        }
    };
    env.set(name, new_val)
}

fn eval_if(
    condition: &Expr,
    consequence: &Block,
    alternative: &Option<Block>,
    env: &Rc<Environment>,
    ctx: &EvalContext,
) -> Result<Object, EvalError> {
    let capture_names: Vec<String> = (1..=MAX_CAPTURE_GROUPS).map(|n| format!("${n}")).collect();
    let cond_scope = Environment::temporary_scope(env, capture_names);
    let cond = try_eval!(eval_expr(condition, &cond_scope, ctx));
    if cond.is_truthy() {
        let body_scope = Environment::temporary_scope(&cond_scope, vec![]);
        eval_block_stmts(consequence, &body_scope, ctx)
    } else if let Some(alt) = alternative {
        let body_scope = Environment::temporary_scope(env, vec![]);
        eval_block_stmts(alt, &body_scope, ctx)
    } else {
        Ok(Object::Null)
    }
}

/// `while` and `for` share a shape (condition + body) in this language; both
/// loop while the condition is truthy, re-evaluated each pass.
fn eval_loop(condition: &Expr, body: &Block, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    loop {
        ctx.check()?;
        let cond = try_eval!(eval_expr(condition, env, ctx));
        if !cond.is_truthy() {
            break;
        }
        let scope = Environment::temporary_scope(env, vec![]);
        let result = eval_block_stmts(body, &scope, ctx)?;
        match &result {
            Object::ReturnValue(_) | Object::Error(_) => return Ok(result),
            _ => {}
        }
    }
    Ok(Object::Null)
}

fn eval_foreach(
    index: &Option<String>,
    name: &str,
    iterable: &Expr,
    body: &Block,
    env: &Rc<Environment>,
    ctx: &EvalContext,
) -> Result<Object, EvalError> {
    let subject = try_eval!(eval_expr(iterable, env, ctx));
    subject.iter_reset()?;
    loop {
        ctx.check()?;
        let (value, key, more) = subject.iter_next()?;
        if !more {
            break;
        }
        let mut permitted = vec![name.to_string()];
        if let Some(idx_name) = index {
            permitted.push(idx_name.clone());
        }
        let scope = Environment::temporary_scope(env, permitted);
        scope.define_mutable(name, value)?;
        if let Some(idx_name) = index {
            scope.define_mutable(idx_name, key)?;
        }
        let result = eval_block_stmts(body, &scope, ctx)?;
        match &result {
            Object::ReturnValue(_) | Object::Error(_) => return Ok(result),
            _ => {}
        }
    }
    Ok(Object::Null)
}

fn eval_import_expr(path: &Expr, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    let path_val = try_eval!(eval_expr(path, env, ctx));
    let name = match &path_val {
        Object::String(s) => s.to_string(),
        other => return Ok(Object::new_error(format!("import: expected string, got {}", other.type_name()))),
    };
    eval_import(&name, ctx)
}

fn eval_import(name: &str, ctx: &EvalContext) -> Result<Object, EvalError> {
    let search_path = std::env::var("COZYPATH").unwrap_or_default();
    for dir in search_path.split(':').filter(|d| !d.is_empty()) {
        let candidate = std::path::Path::new(dir).join(format!("{name}.cz"));
        if candidate.is_file() {
            let source = std::fs::read_to_string(&candidate).map_err(|e| EvalError::Io(e.to_string()))?;
            let mut parser = crate::parser::Parser::from_str(&source);
            let program = parser.parse_program();
            if !parser.errors().is_empty() {
                return Ok(Object::new_error(format!(
                    "import({name}): parse error: {}",
                    parser.errors().join("; ")
                )));
            }
            let module_env = Environment::new();
            eval_program(&program, &module_env, ctx)?;
            return Ok(Object::Module(Rc::new(ModuleData {
                name: name.to_string(),
                attrs: Object::new_hash(module_env.exported_hash()),
            })));
        }
    }
    Ok(Object::new_error(EvalError::ModuleNotFound(name.to_string()).to_string()))
}

fn eval_call(function: &Expr, args: &[Expr], env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    // `quote(expr)` is a special form: its argument tree is never evaluated,
    // only walked for embedded `unquote(...)` calls.
    if let Expr::Identifier(name) = function {
        if name == "quote" {
            if args.len() != 1 {
                return Ok(Object::new_error("quote: expected 1 argument"));
            }
            let quoted = eval_quote_arg(&args[0], env, ctx)?;
            return Ok(Object::Quote(Rc::new(quoted)));
        }
    }

    // `left.name(args)` desugars in the parser to Index{left, Str(name)} as
    // the call's function position; resolve it through method dispatch.
    if let Expr::Index { left, index } = function {
        if let Expr::Str(method_name) = index.as_ref() {
            let receiver = try_eval!(eval_expr(left, env, ctx));
            return eval_method_call(receiver, method_name, args, env, ctx);
        }
    }

    let func_val = try_eval!(eval_expr(function, env, ctx));
    let arg_vals = match eval_expr_list(args, env, ctx) {
        Ok(v) => v,
        Err(e) => return Ok(e),
    };
    apply_function(func_val, arg_vals, env, ctx)
}

fn eval_method_call(
    receiver: Object,
    name: &str,
    arg_exprs: &[Expr],
    env: &Rc<Environment>,
    ctx: &EvalContext,
) -> Result<Object, EvalError> {
    let arg_vals = match eval_expr_list(arg_exprs, env, ctx) {
        Ok(v) => v,
        Err(e) => return Ok(e),
    };
    if let Some(intrinsic) = receiver.get_method(name) {
        return apply_function(intrinsic, arg_vals, env, ctx);
    }
    let type_prefixed = format!("{}.{}", receiver.type_name().to_lowercase(), name);
    if let Some(found) = env.get(&type_prefixed) {
        return apply_method(found, receiver, arg_vals, env, ctx);
    }
    let object_prefixed = format!("object.{name}");
    if let Some(found) = env.get(&object_prefixed) {
        return apply_method(found, receiver, arg_vals, env, ctx);
    }
    Ok(Object::new_error(EvalError::MethodNotFound(name.to_string()).to_string()))
}

fn apply_method(func: Object, receiver: Object, args: Vec<Object>, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    match func {
        Object::Function(f) => {
            let call_env = Environment::enclosed(&f.env, args.clone());
            call_env.define_mutable("self", receiver)?;
            bind_params(&f.params, &args, &call_env, ctx)?;
            Ok(unwrap_return(eval_block_stmts(&f.body, &call_env, ctx)?))
        }
        Object::Builtin(b) => {
            let mut full_args = Vec::with_capacity(args.len() + 1);
            full_args.push(receiver);
            full_args.extend(args);
            (b.func)(env, &full_args)
        }
        other => Err(EvalError::NotCallable(other.inspect())),
    }
}

fn apply_function(func: Object, args: Vec<Object>, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    match func {
        Object::Function(f) => {
            let call_env = Environment::enclosed(&f.env, args.clone());
            bind_params(&f.params, &args, &call_env, ctx)?;
            Ok(unwrap_return(eval_block_stmts(&f.body, &call_env, ctx)?))
        }
        Object::Builtin(b) => (b.func)(env, &args),
        other => Ok(Object::new_error(EvalError::NotCallable(other.inspect()).to_string())),
    }
}

fn unwrap_return(obj: Object) -> Object {
    match obj {
        Object::ReturnValue(inner) => *inner,
        other => other,
    }
}

/// Binds positional args to parameters in `call_env`, evaluating defaults
/// (in `call_env`, so later defaults may reference earlier parameters) for
/// any trailing parameter not supplied by the caller.
fn bind_params(params: &[Param], args: &[Object], call_env: &Rc<Environment>, ctx: &EvalContext) -> Result<(), EvalError> {
    for (i, p) in params.iter().enumerate() {
        let value = if let Some(v) = args.get(i) {
            v.clone()
        } else if let Some(default) = &p.default {
            eval_expr(default, call_env, ctx)?
        } else {
            Object::Null
        };
        call_env.define_mutable(&p.name, value)?;
    }
    Ok(())
}

fn eval_index_expr(left: &Expr, index: &Expr, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Object, EvalError> {
    let left_val = try_eval!(eval_expr(left, env, ctx));
    let index_val = try_eval!(eval_expr(index, env, ctx));
    eval_index(left_val, index_val, env)
}

fn eval_index(left: Object, index: Object, env: &Rc<Environment>) -> Result<Object, EvalError> {
    match (&left, &index) {
        (Object::Array(arr), Object::Integer(i)) => {
            let arr = arr.borrow();
            let len = arr.elements.len() as i64;
            let idx = if *i < 0 { i + len } else { *i };
            if idx < 0 || idx >= len {
                return Ok(Object::new_error(EvalError::IndexOutOfBounds(i.to_string()).to_string()));
            }
            Ok(arr.elements[idx as usize].clone())
        }
        (Object::String(s), Object::Integer(i)) => {
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len() as i64;
            let idx = if *i < 0 { i + len } else { *i };
            if idx < 0 || idx >= len {
                return Ok(Object::new_error(EvalError::IndexOutOfBounds(i.to_string()).to_string()));
            }
            Ok(Object::new_string(chars[idx as usize].to_string()))
        }
        (Object::Hash(hash), key) => match key.hash_key() {
            Some(hk) => {
                let found = hash.borrow().pairs.get(&hk).map(|(_, v)| v.clone());
                match found {
                    Some(v) => Ok(v),
                    None => resolve_method_fallback(&left, key, env),
                }
            }
            None => Ok(Object::new_error(EvalError::UnusableHashKey(key.type_name().to_string()).to_string())),
        },
        (Object::Module(m), _) => eval_index(m.attrs.clone(), index, env),
        _ => resolve_method_fallback(&left, &index, env),
    }
}

/// Plain (non-call) `.name` access: intrinsic method, then `<type>.<name>`,
/// then `object.<name>`, returned unbound (no `self` binding without a call).
fn resolve_method_fallback(receiver: &Object, key: &Object, env: &Rc<Environment>) -> Result<Object, EvalError> {
    let name = match key {
        Object::String(s) => s.to_string(),
        _ => return Ok(Object::new_error(EvalError::UnusableHashKey(key.type_name().to_string()).to_string())),
    };
    if let Some(intrinsic) = receiver.get_method(&name) {
        return Ok(intrinsic);
    }
    let type_prefixed = format!("{}.{}", receiver.type_name().to_lowercase(), name);
    if let Some(found) = env.get(&type_prefixed) {
        return Ok(found);
    }
    let object_prefixed = format!("object.{name}");
    if let Some(found) = env.get(&object_prefixed) {
        return Ok(found);
    }
    Ok(Object::new_error(EvalError::MethodNotFound(name).to_string()))
}

/// Walks `node`, evaluating any embedded `unquote(expr)` call and splicing the
/// result back in as a literal, leaving everything else untouched.
fn eval_quote_arg(node: &Expr, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Expr, EvalError> {
    if let Expr::Call { function, args } = node {
        if matches!(function.as_ref(), Expr::Identifier(n) if n == "unquote") && args.len() == 1 {
            let val = eval_expr(&args[0], env, ctx)?;
            return Ok(object_to_expr(&val));
        }
    }
    Ok(match node {
        Expr::Infix { op, left, right } => Expr::Infix {
            op: op.clone(),
            left: Box::new(eval_quote_arg(left, env, ctx)?),
            right: Box::new(eval_quote_arg(right, env, ctx)?),
        },
        Expr::Prefix { op, right } => Expr::Prefix {
            op: op.clone(),
            right: Box::new(eval_quote_arg(right, env, ctx)?),
        },
        Expr::Call { function, args } => Expr::Call {
            function: Box::new(eval_quote_arg(function, env, ctx)?),
            args: args
                .iter()
                .map(|a| eval_quote_arg(a, env, ctx))
                .collect::<Result<_, _>>()?,
        },
        Expr::Array(items) => Expr::Array(
            items
                .iter()
                .map(|i| eval_quote_arg(i, env, ctx))
                .collect::<Result<_, _>>()?,
        ),
        Expr::Index { left, index } => Expr::Index {
            left: Box::new(eval_quote_arg(left, env, ctx)?),
            index: Box::new(eval_quote_arg(index, env, ctx)?),
        },
        other => other.clone(),
    })
}

fn object_to_expr(obj: &Object) -> Expr {
    match obj {
        Object::Integer(n) => Expr::Int(*n),
        Object::Float(n) => Expr::Float(*n),
        Object::Boolean(b) => Expr::Bool(*b),
        Object::String(s) => Expr::Str(s.to_string()),
        Object::DocString(s) => Expr::DocString(s.to_string()),
        Object::Null => Expr::Null,
        Object::Quote(inner) => (**inner).clone(),
        other => Expr::Str(other.inspect()),
    }
}

/// Expands user-defined macros across the whole program, tree-walking every
/// statement/expression and replacing calls to a registered macro name with
/// its expansion before the evaluator ever sees the call.
pub fn expand_program(program: &Program, registry: &MacroRegistry, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Program, EvalError> {
    if registry.is_empty() {
        return Ok(program.clone());
    }
    program.iter().map(|s| expand_stmt(s, registry, env, ctx)).collect()
}

fn expand_stmt(stmt: &Stmt, registry: &MacroRegistry, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Stmt, EvalError> {
    Ok(match stmt {
        Stmt::Let { name, value } => Stmt::Let {
            name: name.clone(),
            value: expand_expr(value, registry, env, ctx)?,
        },
        Stmt::Mutable { name, value } => Stmt::Mutable {
            name: name.clone(),
            value: expand_expr(value, registry, env, ctx)?,
        },
        Stmt::Return(v) => Stmt::Return(match v {
            Some(e) => Some(expand_expr(e, registry, env, ctx)?),
            None => None,
        }),
        Stmt::Expression(e) => Stmt::Expression(expand_expr(e, registry, env, ctx)?),
        Stmt::Block(b) => Stmt::Block(expand_block(b, registry, env, ctx)?),
        Stmt::Foreach {
            index,
            name,
            iterable,
            body,
        } => Stmt::Foreach {
            index: index.clone(),
            name: name.clone(),
            iterable: expand_expr(iterable, registry, env, ctx)?,
            body: expand_block(body, registry, env, ctx)?,
        },
    })
}

fn expand_block(block: &Block, registry: &MacroRegistry, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Block, EvalError> {
    block.iter().map(|s| expand_stmt(s, registry, env, ctx)).collect()
}

fn expand_expr(expr: &Expr, registry: &MacroRegistry, env: &Rc<Environment>, ctx: &EvalContext) -> Result<Expr, EvalError> {
    match expr {
        Expr::Call { function, args } => {
            if let Expr::Identifier(name) = function.as_ref() {
                if let Some((params, body)) = registry.get(name) {
                    return expand_macro_call(params, body, args, env, ctx);
                }
            }
            Ok(Expr::Call {
                function: Box::new(expand_expr(function, registry, env, ctx)?),
                args: args
                    .iter()
                    .map(|a| expand_expr(a, registry, env, ctx))
                    .collect::<Result<_, _>>()?,
            })
        }
        Expr::Infix { op, left, right } => Ok(Expr::Infix {
            op: op.clone(),
            left: Box::new(expand_expr(left, registry, env, ctx)?),
            right: Box::new(expand_expr(right, registry, env, ctx)?),
        }),
        Expr::Prefix { op, right } => Ok(Expr::Prefix {
            op: op.clone(),
            right: Box::new(expand_expr(right, registry, env, ctx)?),
        }),
        Expr::Index { left, index } => Ok(Expr::Index {
            left: Box::new(expand_expr(left, registry, env, ctx)?),
            index: Box::new(expand_expr(index, registry, env, ctx)?),
        }),
        Expr::Array(items) => Ok(Expr::Array(
            items
                .iter()
                .map(|i| expand_expr(i, registry, env, ctx))
                .collect::<Result<_, _>>()?,
        )),
        Expr::Hash(pairs) => Ok(Expr::Hash(
            pairs
                .iter()
                .map(|(k, v)| Ok((expand_expr(k, registry, env, ctx)?, expand_expr(v, registry, env, ctx)?)))
                .collect::<Result<_, EvalError>>()?,
        )),
        Expr::If {
            condition,
            consequence,
            alternative,
        } => Ok(Expr::If {
            condition: Box::new(expand_expr(condition, registry, env, ctx)?),
            consequence: expand_block(consequence, registry, env, ctx)?,
            alternative: match alternative {
                Some(b) => Some(expand_block(b, registry, env, ctx)?),
                None => None,
            },
        }),
        Expr::While { condition, body } => Ok(Expr::While {
            condition: Box::new(expand_expr(condition, registry, env, ctx)?),
            body: expand_block(body, registry, env, ctx)?,
        }),
        Expr::For { condition, body } => Ok(Expr::For {
            condition: Box::new(expand_expr(condition, registry, env, ctx)?),
            body: expand_block(body, registry, env, ctx)?,
        }),
        Expr::Ternary { condition, yes, no } => Ok(Expr::Ternary {
            condition: Box::new(expand_expr(condition, registry, env, ctx)?),
            yes: Box::new(expand_expr(yes, registry, env, ctx)?),
            no: Box::new(expand_expr(no, registry, env, ctx)?),
        }),
        Expr::Assign { name, op, value } => Ok(Expr::Assign {
            name: name.clone(),
            op: op.clone(),
            value: Box::new(expand_expr(value, registry, env, ctx)?),
        }),
        Expr::Function { params, body, doc } => Ok(Expr::Function {
            params: params.clone(),
            body: expand_block(body, registry, env, ctx)?,
            doc: doc.clone(),
        }),
        Expr::Import(e) => Ok(Expr::Import(Box::new(expand_expr(e, registry, env, ctx)?))),
        other => Ok(other.clone()),
    }
}

fn expand_macro_call(params: &[String], body: &Block, args: &[Expr], env: &Rc<Environment>, ctx: &EvalContext) -> Result<Expr, EvalError> {
    let macro_env = Environment::enclosed(env, vec![]);
    for (p, a) in params.iter().zip(args.iter()) {
        macro_env.define_mutable(p, Object::Quote(Rc::new(a.clone())))?;
    }
    let result = eval_block_stmts(body, &macro_env, ctx)?;
    match result {
        Object::Quote(inner) => Ok((*inner).clone()),
        other => Ok(object_to_expr(&other)),
    }
}

/// Splices `{{ expr }}` placeholders by re-entering the lexer/parser/evaluator
/// on the embedded source and rendering the result with `inspect()`.
fn interpolate(s: &str, env: &Rc<Environment>, ctx: &EvalContext) -> Result<String, EvalError> {
    if !s.contains("{{") {
        return Ok(s.to_string());
    }
    let mut out = String::new();
    let mut rest = s;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| EvalError::runtime_error("string interpolation", "unterminated {{ ... }}"))?;
        let expr_src = &after[..end];
        let mut parser = crate::parser::Parser::from_str(expr_src);
        let parsed = parser.parse_program();
        if !parser.errors().is_empty() || parsed.len() != 1 {
            return Err(EvalError::runtime_error(
                "string interpolation",
                format!("invalid expression: {expr_src}"),
            ));
        }
        let value = match &parsed[0] {
            Stmt::Expression(e) => eval_expr(e, env, ctx)?,
            _ => return Err(EvalError::runtime_error("string interpolation", "expected an expression")),
        };
        out.push_str(&value.inspect());
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn run(src: &str) -> Object {
        let mut parser = Parser::from_str(src);
        let program = parser.parse_program();
        assert!(parser.errors().is_empty(), "parse errors: {:?}", parser.errors());
        let env = Environment::new();
        let ctx = EvalContext::new();
        eval_program(&program, &env, &ctx).expect("eval should not hard-fail")
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(run("1 + 2 * 3;").inspect(), "7");
    }

    #[test]
    fn fibonacci_closure() {
        let result = run(
            r#"
            let make_counter = fn() {
                mutable count = 0;
                return fn() { count += 1; return count; };
            };
            let counter = make_counter();
            counter();
            counter();
            counter();
            "#,
        );
        assert_eq!(result.inspect(), "3");
    }

    #[test]
    fn hash_iterates_in_insertion_order() {
        let result = run(
            r#"
            let h = {"b": 2, "a": 1};
            mutable out = "";
            foreach k, v in h { out += k; }
            out;
            "#,
        );
        assert_eq!(result.inspect(), "ba");
    }

    #[test]
    fn macro_unless_via_unquote() {
        let result = run(
            r#"
            let unless = macro(condition, consequence, alternative) {
                quote(if (!(unquote(condition))) { unquote(consequence) } else { unquote(alternative) })
            };
            unless(false, "yes", "no");
            "#,
        );
        assert_eq!(result.inspect(), "yes");
    }

    #[test]
    fn array_method_fallback() {
        let result = run("[1, 2, 3].append(4);");
        assert_eq!(result.inspect(), "[1, 2, 3, 4]");
    }

    #[test]
    fn regex_capture_into_scope() {
        let result = run(
            r#"
            if ("hello-42" ~= /([a-z]+)-(\d+)/) {
                $1 + "," + $2;
            } else {
                "no match";
            }
            "#,
        );
        assert_eq!(result.inspect(), "hello,42");
    }

    #[test]
    fn immutable_violation_is_fatal() {
        let mut parser = Parser::from_str("let x = 1; x = 2;");
        let program = parser.parse_program();
        let env = Environment::new();
        let ctx = EvalContext::new();
        let err = eval_program(&program, &env, &ctx).unwrap_err();
        assert!(err.to_string().contains("constant"));
    }

    #[test]
    fn string_interpolation_evaluates_expression() {
        let result = run(r#"let x = 40; "answer: {{ x + 2 }}";"#);
        assert_eq!(result.inspect(), "answer: 42");
    }

    #[test]
    fn division_by_zero_is_a_catchable_error_value() {
        let result = run("1 / 0;");
        assert!(result.is_error());
    }

    #[test]
    fn current_args_splice_survives_nested_block() {
        let result = run(
            r#"
            let sum_all = fn() {
                mutable total = 0;
                if (true) {
                    foreach n in [...] { total += n; }
                }
                return total;
            };
            sum_all(1, 2, 3);
            "#,
        );
        assert_eq!(result.inspect(), "6");
    }
}
