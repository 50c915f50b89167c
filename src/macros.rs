// ABOUTME: Macro registry: scans a program for top-level macro definitions,
// ABOUTME: stripping them out so the evaluator never sees them as bindings.

use crate::ast::{Block, Expr, Program, Stmt};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MacroRegistry {
    macros: HashMap<String, (Vec<String>, Block)>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        MacroRegistry::default()
    }

    /// Registers every top-level `let NAME = macro(...) { ... }` statement and
    /// returns the program with those statements removed.
    pub fn scan_and_strip(&mut self, program: &Program) -> Program {
        program
            .iter()
            .filter(|stmt| !self.register_if_macro_def(stmt))
            .cloned()
            .collect()
    }

    fn register_if_macro_def(&mut self, stmt: &Stmt) -> bool {
        if let Stmt::Let {
            name,
            value: Expr::Macro { params, body },
        } = stmt
        {
            self.macros.insert(name.clone(), (params.clone(), body.clone()));
            true
        } else {
            false
        }
    }

    pub fn get(&self, name: &str) -> Option<&(Vec<String>, Block)> {
        self.macros.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    #[test]
    fn strips_macro_definitions_from_program() {
        let mut parser = Parser::from_str("let m = macro(x) { x }; let y = 1;");
        let program = parser.parse_program();
        assert!(parser.errors().is_empty());
        let mut registry = MacroRegistry::new();
        let stripped = registry.scan_and_strip(&program);
        assert_eq!(stripped.len(), 1);
        assert!(registry.get("m").is_some());
    }

    #[test]
    fn non_macro_lets_are_untouched() {
        let mut parser = Parser::from_str("let y = 1;");
        let program = parser.parse_program();
        let mut registry = MacroRegistry::new();
        let stripped = registry.scan_and_strip(&program);
        assert_eq!(stripped.len(), 1);
        assert!(registry.is_empty());
    }
}
