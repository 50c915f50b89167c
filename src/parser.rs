// ABOUTME: Pratt parser: token stream -> AST, with error accumulation.
// Grounded on the reference parser's precedence table and prefix/infix/postfix
// registration scheme, rewritten as a hand-rolled recursive-descent/precedence
// climbing parser (the teacher's nom-combinator parser does not model infix
// operator precedence, so this component follows the original source's shape).

use crate::ast::{AssignOp, Block, Expr, Param, Program, Stmt};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
enum Precedence {
    Lowest,
    Logical,    // && ||
    Assign,     // = += -= *= /=
    Equals,     // == !=
    LessGreater,// < <= > >=
    Sum,        // + -
    Product,    // * /
    Power,      // **
    Modulus,    // %
    Prefix,     // !x -x
    Call,       // f(...) obj.method
    Range,      // ..
    Index,      // [
}

fn precedence_of(kind: TokenKind) -> Precedence {
    use TokenKind::*;
    match kind {
        And | Or => Precedence::Logical,
        Assign | PlusEquals | MinusEquals | AsteriskEquals | SlashEquals => Precedence::Assign,
        Eq | NotEq | Match | NotMatch => Precedence::Equals,
        Lt | Gt | Lte | Gte => Precedence::LessGreater,
        Plus | Minus => Precedence::Sum,
        Asterisk | Slash => Precedence::Product,
        Pow => Precedence::Power,
        Percent => Precedence::Modulus,
        Lparen | Period => Precedence::Call,
        Range => Precedence::Range,
        Lbracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

pub struct Parser {
    lexer: Lexer,
    cur: Token,
    peek: Token,
    errors: Vec<String>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Parser {
            lexer,
            cur,
            peek,
            errors: Vec::new(),
        }
    }

    pub fn from_str(src: &str) -> Self {
        Parser::new(Lexer::from_str(src))
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn next_token(&mut self) {
        self.cur = self.peek.clone();
        self.peek = self.lexer.next_token();
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur.kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            true
        } else {
            self.errors.push(format!(
                "line {}: expected next token to be {:?}, got {:?} ({:?})",
                self.peek.line, kind, self.peek.kind, self.peek.literal
            ));
            false
        }
    }

    fn skip_semicolon(&mut self) {
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Vec::new();
        while !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                program.push(stmt);
            }
            self.next_token();
        }
        program
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Mutable => self.parse_mutable_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Foreach => self.parse_foreach_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Stmt> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur.literal.clone();
        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Some(Stmt::Let { name, value })
    }

    fn parse_mutable_statement(&mut self) -> Option<Stmt> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur.literal.clone();
        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Some(Stmt::Mutable { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        if self.peek_is(TokenKind::Semicolon) || self.peek_is(TokenKind::Rbrace) {
            self.skip_semicolon();
            return Some(Stmt::Return(None));
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Some(Stmt::Return(Some(value)))
    }

    fn parse_foreach_statement(&mut self) -> Option<Stmt> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let first = self.cur.literal.clone();
        let (index, name) = if self.peek_is(TokenKind::Comma) {
            self.next_token(); // consume comma
            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            (Some(first), self.cur.literal.clone())
        } else {
            (None, first)
        };

        if !self.expect_peek(TokenKind::In) {
            return None;
        }
        self.next_token();
        let iterable = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let body = self.parse_block_statement();
        Some(Stmt::Foreach {
            index,
            name,
            iterable,
            body,
        })
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Some(Stmt::Expression(expr))
    }

    fn parse_block_statement(&mut self) -> Block {
        let mut stmts = Vec::new();
        self.next_token();
        while !self.cur_is(TokenKind::Rbrace) && !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                stmts.push(stmt);
            }
            self.next_token();
        }
        stmts
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        if let Some(postfix) = self.try_parse_postfix() {
            return Some(postfix);
        }

        let mut left = self.parse_prefix()?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < precedence_of(self.peek.kind) {
            match self.peek.kind {
                TokenKind::Lparen => {
                    self.next_token();
                    left = self.parse_call_expression(left)?;
                }
                TokenKind::Lbracket => {
                    self.next_token();
                    left = self.parse_index_expression(left)?;
                }
                TokenKind::Period => {
                    self.next_token();
                    left = self.parse_dot_expression(left)?;
                }
                TokenKind::Assign
                | TokenKind::PlusEquals
                | TokenKind::MinusEquals
                | TokenKind::AsteriskEquals
                | TokenKind::SlashEquals => {
                    self.next_token();
                    left = self.parse_assign_expression(left)?;
                }
                TokenKind::Question => {
                    self.next_token();
                    left = self.parse_ternary_expression(left)?;
                }
                _ => {
                    self.next_token();
                    left = self.parse_infix_expression(left)?;
                }
            }
        }

        Some(left)
    }

    /// Postfix ++/-- bind to the identifier already in `cur`, matching the
    /// original parser's quirk of checking postfix before prefix dispatch.
    fn try_parse_postfix(&mut self) -> Option<Expr> {
        if self.cur_is(TokenKind::Ident)
            && (self.peek_is(TokenKind::PlusPlus) || self.peek_is(TokenKind::MinusMinus))
        {
            let name = self.cur.literal.clone();
            self.next_token();
            let op = if self.cur_is(TokenKind::PlusPlus) { "++" } else { "--" };
            return Some(Expr::Postfix {
                op: op.to_string(),
                name,
            });
        }
        None
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur.kind {
            TokenKind::Ident => Some(Expr::Identifier(self.cur.literal.clone())),
            TokenKind::Int => self.parse_int_literal(),
            TokenKind::Float => self.parse_float_literal(),
            TokenKind::Str => Some(self.parse_string_literal()),
            TokenKind::DocString => Some(Expr::DocString(self.cur.literal.clone())),
            TokenKind::Regexp => Some(self.parse_regexp_literal()),
            TokenKind::True => Some(Expr::Bool(true)),
            TokenKind::False => Some(Expr::Bool(false)),
            TokenKind::Null => Some(Expr::Null),
            TokenKind::Bang | TokenKind::Minus => self.parse_prefix_expression(),
            TokenKind::Lparen => self.parse_grouped_expression(),
            TokenKind::Lbracket => self.parse_array_literal(),
            TokenKind::Lbrace => self.parse_hash_literal(),
            TokenKind::Function => self.parse_function_literal(),
            TokenKind::Macro => self.parse_macro_literal(),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::While => self.parse_while_expression(),
            TokenKind::For => self.parse_for_expression(),
            TokenKind::Import => self.parse_import_expression(),
            TokenKind::CurrentArgs => Some(Expr::CurrentArgs),
            _ => {
                self.errors.push(format!(
                    "line {}: no prefix parse function for {:?} found",
                    self.cur.line, self.cur.kind
                ));
                None
            }
        }
    }

    fn parse_int_literal(&mut self) -> Option<Expr> {
        let literal = &self.cur.literal;
        let value = if let Some(hex) = literal.strip_prefix("0x").or_else(|| literal.strip_prefix("0X")) {
            i64::from_str_radix(hex, 16).ok()?
        } else if let Some(bin) = literal.strip_prefix("0b").or_else(|| literal.strip_prefix("0B")) {
            i64::from_str_radix(bin, 2).ok()?
        } else {
            match literal.parse::<i64>() {
                Ok(v) => v,
                Err(_) => {
                    self.errors.push(format!("could not parse {literal} as integer"));
                    return None;
                }
            }
        };
        Some(Expr::Int(value))
    }

    fn parse_float_literal(&mut self) -> Option<Expr> {
        match self.cur.literal.parse::<f64>() {
            Ok(v) => Some(Expr::Float(v)),
            Err(_) => {
                self.errors.push(format!("could not parse {} as float", self.cur.literal));
                None
            }
        }
    }

    fn parse_string_literal(&self) -> Expr {
        Expr::Str(self.cur.literal.clone())
    }

    fn parse_regexp_literal(&self) -> Expr {
        let mut parts = self.cur.literal.splitn(2, '\0');
        let pattern = parts.next().unwrap_or_default().to_string();
        let flags = parts.next().unwrap_or_default().to_string();
        Expr::Regexp { pattern, flags }
    }

    fn parse_prefix_expression(&mut self) -> Option<Expr> {
        let op = self.cur.literal.clone();
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::Prefix {
            op,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }
        Some(expr)
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut list = Vec::new();
        if self.peek_is(end) {
            self.next_token();
            return Some(list);
        }
        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        let elements = self.parse_expression_list(TokenKind::Rbracket)?;
        Some(Expr::Array(elements))
    }

    fn parse_hash_literal(&mut self) -> Option<Expr> {
        let mut pairs = Vec::new();
        while !self.peek_is(TokenKind::Rbrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if !self.peek_is(TokenKind::Rbrace) && !self.expect_peek(TokenKind::Comma) {
                return None;
            }
        }
        if !self.expect_peek(TokenKind::Rbrace) {
            return None;
        }
        Some(Expr::Hash(pairs))
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();
        if self.peek_is(TokenKind::Rparen) {
            self.next_token();
            return Some(params);
        }
        self.next_token();
        params.push(self.parse_one_parameter()?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            params.push(self.parse_one_parameter()?);
        }
        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }
        Some(params)
    }

    fn parse_one_parameter(&mut self) -> Option<Param> {
        let name = self.cur.literal.clone();
        if self.peek_is(TokenKind::Assign) {
            self.next_token();
            self.next_token();
            let default = self.parse_expression(Precedence::Lowest)?;
            return Some(Param {
                name,
                default: Some(default),
            });
        }
        Some(Param { name, default: None })
    }

    fn parse_function_literal(&mut self) -> Option<Expr> {
        if !self.expect_peek(TokenKind::Lparen) {
            return None;
        }
        let params = self.parse_function_parameters()?;
        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let mut doc = None;
        if self.peek_is(TokenKind::DocString) {
            self.next_token();
            doc = Some(self.cur.literal.clone());
            self.skip_semicolon();
        }
        let body = self.parse_block_statement();
        Some(Expr::Function { params, body, doc })
    }

    fn parse_macro_literal(&mut self) -> Option<Expr> {
        if !self.expect_peek(TokenKind::Lparen) {
            return None;
        }
        let params = self.parse_function_parameters()?;
        let param_names = params.into_iter().map(|p| p.name).collect();
        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let body = self.parse_block_statement();
        Some(Expr::Macro {
            params: param_names,
            body,
        })
    }

    fn parse_bracket_condition(&mut self) -> Option<Expr> {
        let parenthesized = self.peek_is(TokenKind::Lparen);
        if parenthesized {
            self.next_token();
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if parenthesized && !self.expect_peek(TokenKind::Rparen) {
            return None;
        }
        Some(condition)
    }

    fn parse_if_expression(&mut self) -> Option<Expr> {
        let condition = self.parse_bracket_condition()?;
        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let consequence = self.parse_block_statement();

        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();
            if self.peek_is(TokenKind::If) {
                self.next_token();
                let nested = self.parse_if_expression()?;
                Some(vec![Stmt::Expression(nested)])
            } else {
                if !self.expect_peek(TokenKind::Lbrace) {
                    return None;
                }
                Some(self.parse_block_statement())
            }
        } else {
            None
        };

        Some(Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_while_expression(&mut self) -> Option<Expr> {
        let condition = self.parse_bracket_condition()?;
        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let body = self.parse_block_statement();
        Some(Expr::While {
            condition: Box::new(condition),
            body,
        })
    }

    fn parse_for_expression(&mut self) -> Option<Expr> {
        let condition = self.parse_bracket_condition()?;
        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let body = self.parse_block_statement();
        Some(Expr::For {
            condition: Box::new(condition),
            body,
        })
    }

    fn parse_import_expression(&mut self) -> Option<Expr> {
        if !self.expect_peek(TokenKind::Lparen) {
            return None;
        }
        self.next_token();
        let path = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }
        Some(Expr::Import(Box::new(path)))
    }

    fn parse_call_expression(&mut self, function: Expr) -> Option<Expr> {
        let args = self.parse_expression_list(TokenKind::Rparen)?;
        Some(Expr::Call {
            function: Box::new(function),
            args,
        })
    }

    fn parse_index_expression(&mut self, left: Expr) -> Option<Expr> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Rbracket) {
            return None;
        }
        Some(Expr::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    /// `obj.name` desugars to an Index expression with a synthesized string key,
    /// so method dispatch can reuse the same evaluator path as `hash["name"]`.
    fn parse_dot_expression(&mut self, left: Expr) -> Option<Expr> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur.literal.clone();
        Some(Expr::Index {
            left: Box::new(left),
            index: Box::new(Expr::Str(name)),
        })
    }

    fn parse_assign_expression(&mut self, left: Expr) -> Option<Expr> {
        let name = match left {
            Expr::Identifier(name) => name,
            _ => {
                self.errors.push(format!(
                    "line {}: left-hand side of assignment must be an identifier",
                    self.cur.line
                ));
                return None;
            }
        };
        let op = match self.cur.kind {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusEquals => AssignOp::PlusEquals,
            TokenKind::MinusEquals => AssignOp::MinusEquals,
            TokenKind::AsteriskEquals => AssignOp::AsteriskEquals,
            TokenKind::SlashEquals => AssignOp::SlashEquals,
            _ => unreachable!("parse_assign_expression called on non-assign token"),
        };
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Expr::Assign {
            name,
            op,
            value: Box::new(value),
        })
    }

    fn parse_ternary_expression(&mut self, condition: Expr) -> Option<Expr> {
        self.next_token();
        let yes = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Colon) {
            return None;
        }
        self.next_token();
        let no = self.parse_expression(Precedence::Lowest)?;
        Some(Expr::Ternary {
            condition: Box::new(condition),
            yes: Box::new(yes),
            no: Box::new(no),
        })
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Option<Expr> {
        let op = self.cur.literal.clone();
        let precedence = precedence_of(self.cur.kind);
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expr::Infix {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        let mut p = Parser::from_str(src);
        let program = p.parse_program();
        assert!(p.errors().is_empty(), "parse errors: {:?}", p.errors());
        program
    }

    #[test]
    fn parses_let_and_mutable() {
        let program = parse_ok("let x = 1; mutable y = 2;");
        assert_eq!(program.len(), 2);
        assert!(matches!(program[0], Stmt::Let { .. }));
        assert!(matches!(program[1], Stmt::Mutable { .. }));
    }

    #[test]
    fn parses_infix_precedence() {
        let program = parse_ok("1 + 2 * 3;");
        let Stmt::Expression(expr) = &program[0] else { panic!() };
        assert_eq!(expr.print(), "(1 + (2 * 3))");
    }

    #[test]
    fn parses_assignment_as_expression() {
        let program = parse_ok("mutable x = 1; x += 2;");
        let Stmt::Expression(expr) = &program[1] else { panic!() };
        assert_eq!(expr.print(), "x += 2");
    }

    #[test]
    fn parses_if_else_if_chain() {
        let program = parse_ok("if (x) { 1 } else if (y) { 2 } else { 3 }");
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn parses_foreach_with_index() {
        let program = parse_ok("foreach i, v in arr { print(v) }");
        let Stmt::Foreach { index, name, .. } = &program[0] else { panic!() };
        assert_eq!(index.as_deref(), Some("i"));
        assert_eq!(name, "v");
    }

    #[test]
    fn parses_function_literal_with_default() {
        let program = parse_ok("let f = fn(a, b = 2) { return a + b };");
        let Stmt::Let { value, .. } = &program[0] else { panic!() };
        let Expr::Function { params, .. } = value else { panic!() };
        assert_eq!(params.len(), 2);
        assert!(params[1].default.is_some());
    }

    #[test]
    fn parses_method_call_dot_syntax() {
        let program = parse_ok("[1,2,3].second();");
        let Stmt::Expression(expr) = &program[0] else { panic!() };
        assert!(matches!(expr, Expr::Call { .. }));
    }

    #[test]
    fn parses_postfix_increment() {
        let program = parse_ok("mutable x = 1; x++;");
        let Stmt::Expression(expr) = &program[1] else { panic!() };
        assert!(matches!(expr, Expr::Postfix { .. }));
    }

    #[test]
    fn rejects_non_identifier_assign_lhs() {
        let mut p = Parser::from_str("1 = 2;");
        p.parse_program();
        assert!(!p.errors().is_empty());
    }

    #[test]
    fn parses_hash_literal_preserving_order() {
        let program = parse_ok(r#"{"a": 1, "b": 2};"#);
        let Stmt::Expression(Expr::Hash(pairs)) = &program[0] else { panic!() };
        assert_eq!(pairs[0].0, Expr::Str("a".to_string()));
        assert_eq!(pairs[1].0, Expr::Str("b".to_string()));
    }

    #[test]
    fn parses_regexp_literal() {
        let program = parse_ok(r#"/abc/i;"#);
        let Stmt::Expression(Expr::Regexp { pattern, flags }) = &program[0] else { panic!() };
        assert_eq!(pattern, "abc");
        assert_eq!(flags, "i");
    }
}
