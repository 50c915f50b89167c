// ABOUTME: Lexer turning source text into a token stream
// Grounded on the reference lexer's rune-scanning approach: a position/read_position/ch
// cursor over a Vec<char>, lookahead-based disambiguation of multi-character operators,
// and a "previous token kind" used both for line tracking and for the slash/regex split.

use crate::token::{Token, TokenKind};

const STDLIB_PREFIXES: &[&str] = &[
    "array.", "core.", "float.", "fs.", "hash.", "http.", "integer.", "json.", "math.", "net.",
    "object.", "string.", "sys.", "time.", "util.",
];

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    read_position: usize,
    ch: char,
    line: usize,
    prev_kind: Option<TokenKind>,
}

impl Lexer {
    /// Builds a lexer over one or more source fragments, joined the way the host joins
    /// the embedded stdlib modules with the user program: two newlines between each.
    pub fn new(inputs: &[&str]) -> Self {
        let joined = inputs.join("\n\n");
        let mut lexer = Lexer {
            input: joined.chars().collect(),
            position: 0,
            read_position: 0,
            ch: '\0',
            line: 1,
            prev_kind: None,
        };
        lexer.read_char();
        lexer
    }

    pub fn from_str(input: &str) -> Self {
        Lexer::new(&[input])
    }

    fn read_char(&mut self) {
        if self.read_position >= self.input.len() {
            self.ch = '\0';
        } else {
            self.ch = self.input[self.read_position];
        }
        self.position = self.read_position;
        self.read_position += 1;
    }

    fn peek_char(&self) -> char {
        if self.read_position >= self.input.len() {
            '\0'
        } else {
            self.input[self.read_position]
        }
    }

    fn peek_char_at(&self, offset: usize) -> char {
        let idx = self.read_position + offset;
        if idx >= self.input.len() {
            '\0'
        } else {
            self.input[idx]
        }
    }

    fn skip_whitespace(&mut self) {
        while self.ch.is_whitespace() {
            if self.ch == '\n' {
                self.line += 1;
            }
            self.read_char();
        }
    }

    fn skip_comment(&mut self) {
        while self.ch != '\n' && self.ch != '\0' {
            self.read_char();
        }
    }

    fn skip_shebang(&mut self) {
        if self.line == 1 && self.ch == '#' && self.peek_char() == '!' {
            self.skip_comment();
        }
    }

    /// Returns the next token, advancing the cursor past it.
    pub fn next_token(&mut self) -> Token {
        self.skip_shebang();
        self.skip_whitespace();

        while self.ch == '#' {
            self.skip_comment();
            self.skip_whitespace();
        }

        let line = self.line;
        let tok = match self.ch {
            '=' => {
                if self.peek_char() == '=' {
                    self.read_char();
                    Token::new(TokenKind::Eq, "==", line)
                } else {
                    Token::new(TokenKind::Assign, "=", line)
                }
            }
            '+' => {
                if self.peek_char() == '+' {
                    self.read_char();
                    Token::new(TokenKind::PlusPlus, "++", line)
                } else if self.peek_char() == '=' {
                    self.read_char();
                    Token::new(TokenKind::PlusEquals, "+=", line)
                } else {
                    Token::new(TokenKind::Plus, "+", line)
                }
            }
            '-' => {
                if self.peek_char() == '-' {
                    self.read_char();
                    Token::new(TokenKind::MinusMinus, "--", line)
                } else if self.peek_char() == '=' {
                    self.read_char();
                    Token::new(TokenKind::MinusEquals, "-=", line)
                } else {
                    Token::new(TokenKind::Minus, "-", line)
                }
            }
            '!' => {
                if self.peek_char() == '=' {
                    self.read_char();
                    Token::new(TokenKind::NotEq, "!=", line)
                } else if self.peek_char() == '~' {
                    self.read_char();
                    Token::new(TokenKind::NotMatch, "!~", line)
                } else {
                    Token::new(TokenKind::Bang, "!", line)
                }
            }
            '~' => {
                if self.peek_char() == '=' {
                    self.read_char();
                    Token::new(TokenKind::Match, "~=", line)
                } else {
                    Token::new(TokenKind::Illegal, "~", line)
                }
            }
            '/' => {
                if self.peek_char() == '=' {
                    self.read_char();
                    Token::new(TokenKind::SlashEquals, "/=", line)
                } else if self.slash_is_division() {
                    Token::new(TokenKind::Slash, "/", line)
                } else {
                    return self.read_regexp();
                }
            }
            '*' => {
                if self.peek_char() == '*' {
                    self.read_char();
                    Token::new(TokenKind::Pow, "**", line)
                } else if self.peek_char() == '=' {
                    self.read_char();
                    Token::new(TokenKind::AsteriskEquals, "*=", line)
                } else {
                    Token::new(TokenKind::Asterisk, "*", line)
                }
            }
            '%' => Token::new(TokenKind::Percent, "%", line),
            '<' => {
                if self.peek_char() == '=' {
                    self.read_char();
                    Token::new(TokenKind::Lte, "<=", line)
                } else {
                    Token::new(TokenKind::Lt, "<", line)
                }
            }
            '>' => {
                if self.peek_char() == '=' {
                    self.read_char();
                    Token::new(TokenKind::Gte, ">=", line)
                } else {
                    Token::new(TokenKind::Gt, ">", line)
                }
            }
            '&' => {
                if self.peek_char() == '&' {
                    self.read_char();
                    Token::new(TokenKind::And, "&&", line)
                } else {
                    Token::new(TokenKind::Illegal, "&", line)
                }
            }
            '|' => {
                if self.peek_char() == '|' {
                    self.read_char();
                    Token::new(TokenKind::Or, "||", line)
                } else {
                    Token::new(TokenKind::Illegal, "|", line)
                }
            }
            ';' => Token::new(TokenKind::Semicolon, ";", line),
            ':' => Token::new(TokenKind::Colon, ":", line),
            ',' => Token::new(TokenKind::Comma, ",", line),
            '?' => Token::new(TokenKind::Question, "?", line),
            '(' => Token::new(TokenKind::Lparen, "(", line),
            ')' => Token::new(TokenKind::Rparen, ")", line),
            '{' => Token::new(TokenKind::Lbrace, "{", line),
            '}' => Token::new(TokenKind::Rbrace, "}", line),
            '[' => Token::new(TokenKind::Lbracket, "[", line),
            ']' => Token::new(TokenKind::Rbracket, "]", line),
            '.' => {
                if self.peek_char() == '.' {
                    if self.peek_char_at(1) == '.' {
                        if self.peek_char_at(2) == '.' {
                            self.read_char();
                            self.read_char();
                            self.read_char();
                            Token::new(TokenKind::Spread, "....", line)
                        } else {
                            self.read_char();
                            self.read_char();
                            Token::new(TokenKind::CurrentArgs, "...", line)
                        }
                    } else {
                        self.read_char();
                        Token::new(TokenKind::Range, "..", line)
                    }
                } else {
                    Token::new(TokenKind::Period, ".", line)
                }
            }
            '"' => Token::new(TokenKind::Str, self.read_string('"'), line),
            '\'' => Token::new(TokenKind::DocString, self.read_string('\''), line),
            '\0' => Token::new(TokenKind::Eof, "", line),
            c if is_identifier_start(c) => {
                let literal = self.read_identifier();
                let kind = TokenKind::lookup_ident(&literal);
                self.prev_kind = Some(kind);
                return Token::new(kind, literal, line);
            }
            c if c.is_ascii_digit() => {
                let (kind, literal) = self.read_number();
                self.prev_kind = Some(kind);
                return Token::new(kind, literal, line);
            }
            c => Token::new(TokenKind::Illegal, c.to_string(), line),
        };

        self.read_char();
        self.prev_kind = Some(tok.kind);
        tok
    }

    /// `/` is division only directly after a value-producing token; otherwise it
    /// opens a regex literal.
    fn slash_is_division(&self) -> bool {
        matches!(
            self.prev_kind,
            Some(TokenKind::Rbracket)
                | Some(TokenKind::Rparen)
                | Some(TokenKind::Ident)
                | Some(TokenKind::Int)
                | Some(TokenKind::Float)
        )
    }

    fn read_regexp(&mut self) -> Token {
        let line = self.line;
        self.read_char(); // consume opening '/'
        let mut pattern = String::new();
        while self.ch != '/' && self.ch != '\0' {
            if self.ch == '\\' && self.peek_char() == '/' {
                pattern.push('/');
                self.read_char();
                self.read_char();
                continue;
            }
            pattern.push(self.ch);
            self.read_char();
        }
        self.read_char(); // consume closing '/'
        let mut flags = String::new();
        while self.ch.is_ascii_alphabetic() {
            flags.push(self.ch);
            self.read_char();
        }
        self.prev_kind = Some(TokenKind::Regexp);
        Token::new(TokenKind::Regexp, format!("{pattern}\0{flags}"), line)
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while is_identifier_part(self.ch) {
            self.read_char();
        }
        let raw: String = self.input[start..self.position].iter().collect();

        if let Some(dot) = raw.find('.') {
            let prefix_ok = STDLIB_PREFIXES.iter().any(|p| raw.starts_with(p));
            if !prefix_ok {
                // Rewind to just after the truncated identifier so the next
                // next_token() call re-lexes the '.' as PERIOD.
                let rewind_by = raw.len() - dot;
                self.position -= rewind_by;
                self.read_position -= rewind_by;
                self.ch = self.input[self.position];
                return raw[..dot].to_string();
            }
        }
        raw
    }

    fn read_number(&mut self) -> (TokenKind, String) {
        let start = self.position;

        if self.ch == '0' && (self.peek_char() == 'x' || self.peek_char() == 'X') {
            self.read_char();
            self.read_char();
            while self.ch.is_ascii_hexdigit() {
                self.read_char();
            }
            return (
                TokenKind::Int,
                self.input[start..self.position].iter().collect(),
            );
        }

        if self.ch == '0' && (self.peek_char() == 'b' || self.peek_char() == 'B') {
            self.read_char();
            self.read_char();
            while self.ch == '0' || self.ch == '1' {
                self.read_char();
            }
            return (
                TokenKind::Int,
                self.input[start..self.position].iter().collect(),
            );
        }

        while self.ch.is_ascii_digit() {
            self.read_char();
        }

        if self.ch == '.' && self.peek_char().is_ascii_digit() {
            self.read_char();
            while self.ch.is_ascii_digit() {
                self.read_char();
            }
            return (
                TokenKind::Float,
                self.input[start..self.position].iter().collect(),
            );
        }

        (
            TokenKind::Int,
            self.input[start..self.position].iter().collect(),
        )
    }

    fn read_string(&mut self, delim: char) -> String {
        let mut out = String::new();
        self.read_char(); // consume opening delimiter
        while self.ch != delim && self.ch != '\0' {
            if self.ch == '\\' {
                self.read_char();
                match self.ch {
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    '\\' => out.push('\\'),
                    c if c == delim => out.push(delim),
                    c => out.push(c),
                }
                self.read_char();
            } else {
                out.push(self.ch);
                self.read_char();
            }
        }
        self.read_char(); // consume closing delimiter
        out
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '?' || c == '$' || c == '.'
}
