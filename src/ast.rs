// ABOUTME: Abstract syntax tree node types produced by the parser

#[derive(Debug, Clone, PartialEq)]
pub enum AssignOp {
    Assign,
    PlusEquals,
    MinusEquals,
    AsteriskEquals,
    SlashEquals,
}

impl AssignOp {
    pub fn as_infix_op(&self) -> Option<&'static str> {
        match self {
            AssignOp::Assign => None,
            AssignOp::PlusEquals => Some("+"),
            AssignOp::MinusEquals => Some("-"),
            AssignOp::AsteriskEquals => Some("*"),
            AssignOp::SlashEquals => Some("/"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

pub type Block = Vec<Stmt>;
pub type Program = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let { name: String, value: Expr },
    Mutable { name: String, value: Expr },
    Return(Option<Expr>),
    Expression(Expr),
    Block(Block),
    Foreach {
        index: Option<String>,
        name: String,
        iterable: Expr,
        body: Block,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier(String),
    Int(i64),
    Float(f64),
    Str(String),
    DocString(String),
    Bool(bool),
    Null,
    Array(Vec<Expr>),
    Hash(Vec<(Expr, Expr)>),
    Regexp {
        pattern: String,
        flags: String,
    },
    Function {
        params: Vec<Param>,
        body: Block,
        doc: Option<String>,
    },
    Call {
        function: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
    Prefix {
        op: String,
        right: Box<Expr>,
    },
    Postfix {
        op: String,
        name: String,
    },
    Infix {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        name: String,
        op: AssignOp,
        value: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        yes: Box<Expr>,
        no: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },
    While {
        condition: Box<Expr>,
        body: Block,
    },
    For {
        condition: Box<Expr>,
        body: Block,
    },
    Import(Box<Expr>),
    Macro {
        params: Vec<String>,
        body: Block,
    },
    CurrentArgs,
    /// Produced only by the macro quoting machinery: an AST subtree ferried
    /// through evaluation as a value rather than interpreted directly.
    Quoted(Box<Expr>),
}

impl Expr {
    /// Renders a source-like form, used for Function::Inspect and for parse/print
    /// round-trip tests. Not a full pretty-printer; covers the node kinds with a
    /// defined printer per the testable-properties requirement.
    pub fn print(&self) -> String {
        match self {
            Expr::Identifier(name) => name.clone(),
            Expr::Int(n) => n.to_string(),
            Expr::Float(n) => n.to_string(),
            Expr::Str(s) => format!("\"{s}\""),
            Expr::DocString(s) => format!("'{s}'"),
            Expr::Bool(b) => b.to_string(),
            Expr::Null => "null".to_string(),
            Expr::Array(items) => {
                format!(
                    "[{}]",
                    items.iter().map(Expr::print).collect::<Vec<_>>().join(", ")
                )
            }
            Expr::Hash(pairs) => {
                let body = pairs
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.print(), v.print()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{body}}}")
            }
            Expr::Regexp { pattern, flags } => format!("/{pattern}/{flags}"),
            Expr::Function { params, .. } => {
                let ps = params
                    .iter()
                    .map(|p| match &p.default {
                        Some(d) => format!("{} = {}", p.name, d.print()),
                        None => p.name.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("fn({ps}) {{ ... }}")
            }
            Expr::Call { function, args } => {
                format!(
                    "{}({})",
                    function.print(),
                    args.iter().map(Expr::print).collect::<Vec<_>>().join(", ")
                )
            }
            Expr::Index { left, index } => format!("({}[{}])", left.print(), index.print()),
            Expr::Prefix { op, right } => format!("({op}{})", right.print()),
            Expr::Postfix { op, name } => format!("({name}{op})"),
            Expr::Infix { op, left, right } => {
                format!("({} {op} {})", left.print(), right.print())
            }
            Expr::Assign { name, op, value } => {
                let op_str = match op {
                    AssignOp::Assign => "=",
                    AssignOp::PlusEquals => "+=",
                    AssignOp::MinusEquals => "-=",
                    AssignOp::AsteriskEquals => "*=",
                    AssignOp::SlashEquals => "/=",
                };
                format!("{name} {op_str} {}", value.print())
            }
            Expr::Ternary { condition, yes, no } => {
                format!("({} ? {} : {})", condition.print(), yes.print(), no.print())
            }
            Expr::If { condition, .. } => format!("if ({}) {{ ... }}", condition.print()),
            Expr::While { condition, .. } => format!("while ({}) {{ ... }}", condition.print()),
            Expr::For { condition, .. } => format!("for ({}) {{ ... }}", condition.print()),
            Expr::Import(path) => format!("import({})", path.print()),
            Expr::Macro { params, .. } => format!("macro({}) {{ ... }}", params.join(", ")),
            Expr::CurrentArgs => "...".to_string(),
            Expr::Quoted(inner) => format!("quote({})", inner.print()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_simple_infix() {
        let e = Expr::Infix {
            op: "+".into(),
            left: Box::new(Expr::Int(1)),
            right: Box::new(Expr::Int(2)),
        };
        assert_eq!(e.print(), "(1 + 2)");
    }

    #[test]
    fn assign_op_maps_to_infix_operator() {
        assert_eq!(AssignOp::PlusEquals.as_infix_op(), Some("+"));
        assert_eq!(AssignOp::Assign.as_infix_op(), None);
    }
}
