// ABOUTME: Syntax highlighter for REPL with color support
// Implements rustyline's Highlighter trait to provide ANSI color codes
// for cozy syntax elements while preserving display width

use rustyline::Helper;
use rustyline::completion::Completer;
use rustyline::highlight::{Highlighter, CmdKind};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use std::borrow::Cow;
use std::collections::HashSet;

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_BRACE: &str = "\x1b[1;34m"; // Bold blue
const COLOR_KEYWORD: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_BUILTIN: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_BOOLEAN: &str = "\x1b[33m"; // Yellow
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)

/// Main highlighter helper for the cozy REPL
pub struct LispHelper;

impl LispHelper {
    pub fn new() -> Self {
        LispHelper
    }
}

impl Default for LispHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for LispHelper {}

impl Completer for LispHelper {
    type Candidate = String;
}

impl Hinter for LispHelper {
    type Hint = String;
}

impl Validator for LispHelper {}

impl Highlighter for LispHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let keywords = get_keywords();
        let builtins = get_builtin_prefixes();

        let highlighted = highlight_line(line, &keywords, &builtins);

        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

/// Tokenize a line and apply syntax highlighting
fn highlight_line(line: &str, keywords: &HashSet<&'static str>, builtins: &HashSet<&'static str>) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '/' if i + 1 < chars.len() && chars[i + 1] == '/' => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() && chars[i] != '\n' {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;
                let mut found_close = false;
                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        result.push(chars[i]);
                        result.push(chars[i + 1]);
                        i += 2;
                    } else if chars[i] == '"' {
                        result.push('"');
                        i += 1;
                        found_close = true;
                        break;
                    } else {
                        result.push(chars[i]);
                        i += 1;
                    }
                }
                result.push_str(COLOR_RESET);
                if !found_close {
                    while i < chars.len() && chars[i] != '\n' {
                        result.push(chars[i]);
                        i += 1;
                    }
                }
            }

            '0'..='9' => {
                let start = i;
                if chars[i] == '0' && i + 1 < chars.len() && (chars[i + 1] == 'x' || chars[i + 1] == 'b') {
                    i += 2;
                    while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                        i += 1;
                    }
                } else {
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                    if i < chars.len() && chars[i] == '.' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit() {
                        i += 1;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let num_str: String = chars[start..i].iter().collect();
                result.push_str(COLOR_NUMBER);
                result.push_str(&num_str);
                result.push_str(COLOR_RESET);
            }

            '(' | ')' | '[' | ']' | '{' | '}' => {
                result.push_str(COLOR_BRACE);
                result.push(chars[i]);
                i += 1;
                result.push_str(COLOR_RESET);
            }

            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.' || chars[i] == '?') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();

                if word == "true" || word == "false" || word == "null" {
                    result.push_str(COLOR_BOOLEAN);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if keywords.contains(word.as_str()) {
                    result.push_str(COLOR_KEYWORD);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if builtins.contains(word.as_str()) || word.split('.').next().map(|p| builtins.contains(p)).unwrap_or(false) {
                    result.push_str(COLOR_BUILTIN);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&word);
                }
            }

            _ => {
                result.push(chars[i]);
                i += 1;
            }
        }
    }

    result
}

/// Keywords with special evaluation semantics
fn get_keywords() -> HashSet<&'static str> {
    [
        "fn", "let", "mutable", "if", "else", "return", "for", "foreach", "in", "while", "import", "macro",
    ]
    .iter()
    .copied()
    .collect()
}

/// Prefixes of dot-namespaced built-in functions, plus bare core builtin names
fn get_builtin_prefixes() -> HashSet<&'static str> {
    [
        "array", "core", "float", "fs", "hash", "http", "integer", "json", "math", "net", "object", "string", "sys", "time", "util",
        "int", "len", "type", "eval", "print", "printf", "sprintf", "error", "panic", "help", "methods", "quote", "unquote",
    ]
    .iter()
    .copied()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_highlighting() {
        let keywords = get_keywords();
        let builtins = get_builtin_prefixes();
        let highlighted = highlight_line("42", &keywords, &builtins);
        assert!(highlighted.contains(COLOR_NUMBER));
    }

    #[test]
    fn test_hex_number_highlighting() {
        let keywords = get_keywords();
        let builtins = get_builtin_prefixes();
        let highlighted = highlight_line("0xFF", &keywords, &builtins);
        assert!(highlighted.contains(COLOR_NUMBER));
    }

    #[test]
    fn test_string_highlighting() {
        let keywords = get_keywords();
        let builtins = get_builtin_prefixes();
        let highlighted = highlight_line("\"hello\"", &keywords, &builtins);
        assert!(highlighted.contains(COLOR_STRING));
    }

    #[test]
    fn test_comment_highlighting() {
        let keywords = get_keywords();
        let builtins = get_builtin_prefixes();
        let highlighted = highlight_line("// this is a comment", &keywords, &builtins);
        assert!(highlighted.contains(COLOR_COMMENT));
    }

    #[test]
    fn test_keyword_highlighting() {
        let keywords = get_keywords();
        let builtins = get_builtin_prefixes();
        let highlighted = highlight_line("let x = 5;", &keywords, &builtins);
        assert!(highlighted.contains(COLOR_KEYWORD));
    }

    #[test]
    fn test_brace_highlighting() {
        let keywords = get_keywords();
        let builtins = get_builtin_prefixes();
        let highlighted = highlight_line("fn(x) { x }", &keywords, &builtins);
        assert!(highlighted.contains(COLOR_BRACE));
    }

    #[test]
    fn test_boolean_highlighting() {
        let keywords = get_keywords();
        let builtins = get_builtin_prefixes();
        let highlighted = highlight_line("true false null", &keywords, &builtins);
        assert!(highlighted.contains(COLOR_BOOLEAN));
    }

    #[test]
    fn test_dotted_builtin_highlighting() {
        let keywords = get_keywords();
        let builtins = get_builtin_prefixes();
        let highlighted = highlight_line("fs.read(\"x\")", &keywords, &builtins);
        assert!(highlighted.contains(COLOR_BUILTIN));
    }

    #[test]
    fn test_bare_builtin_highlighting() {
        let keywords = get_keywords();
        let builtins = get_builtin_prefixes();
        let highlighted = highlight_line("print(x)", &keywords, &builtins);
        assert!(highlighted.contains(COLOR_BUILTIN));
    }
}
