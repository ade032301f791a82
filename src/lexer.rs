//! C1 — hand-written, single-pass, non-backtracking lexer.
//!
//! Whitespace is never emitted as its own token; it is attached as the
//! `head` trivia of whichever token follows it. The parser later folds a
//! token's `head` into the trailing trivia of the previously emitted node,
//! per the printer's contract in `printer.rs`.

use crate::error::IllegalCharacterError;
use crate::token::{Lex, TokenKind};
use crate::trace::{TraceLevel, Tracer};

const SPECIAL: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\', '/',
];

/// Whether `c` is one of the Lucene special characters that may be
/// backslash-escaped inside a TERM.
pub(crate) fn is_special(c: char) -> bool {
    SPECIAL.contains(&c)
}

fn is_term_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\\' || c == '*' || c == '?'
}

fn is_term_continuation(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.' || c == '-' || c == '\\' || c == '*' || c == '?'
}

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tracer: Tracer,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tracer: Tracer::silent(),
        }
    }

    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn tokenize(mut self) -> Result<Vec<Lex>, IllegalCharacterError> {
        let mut tokens = Vec::new();
        loop {
            let head = self.consume_whitespace();
            if self.pos >= self.bytes.len() {
                tokens.push(Lex::new(TokenKind::Eof, "", self.pos, head));
                break;
            }
            let tok = self.next_token(head).map_err(|e| {
                self.tracer.emit(TraceLevel::Default, "lexer", &e);
                e
            })?;
            self.tracer.emit(TraceLevel::Verbose, "lexer", format!("{:?} {:?} @ {}", tok.kind, tok.lexeme, tok.pos));
            tokens.push(tok);
        }
        self.tracer.emit(TraceLevel::Success, "lexer", format!("{} tokens", tokens.len()));
        Ok(tokens)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn consume_whitespace(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == ' ' || c == '\t' || c == '\n' || c == '\r' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        self.source[start..self.pos].to_string()
    }

    fn next_token(&mut self, head: String) -> Result<Lex, IllegalCharacterError> {
        let start = self.pos;
        let c = self.peek_char().expect("checked by caller");

        macro_rules! single {
            ($kind:expr) => {{
                self.pos += c.len_utf8();
                Ok(Lex::new($kind, c.to_string(), start, head))
            }};
        }

        match c {
            '(' => single!(TokenKind::LParen),
            ')' => single!(TokenKind::RParen),
            '[' => single!(TokenKind::LBracket),
            ']' => single!(TokenKind::RBracket),
            '{' => single!(TokenKind::LBrace),
            '}' => single!(TokenKind::RBrace),
            ':' => single!(TokenKind::Colon),
            '+' => single!(TokenKind::Plus),
            '-' => single!(TokenKind::Minus),
            '"' => self.lex_phrase(head),
            '/' => self.lex_regex(head),
            '~' => {
                self.pos += 1;
                if let Some(number) = self.try_lex_number() {
                    Ok(Lex::new(TokenKind::Approx, number, start, head))
                } else {
                    Ok(Lex::new(TokenKind::Tilde, "~", start, head))
                }
            }
            '^' => {
                self.pos += 1;
                if let Some(number) = self.try_lex_number() {
                    Ok(Lex::new(TokenKind::Boost, number, start, head))
                } else {
                    Ok(Lex::new(TokenKind::Caret, "^", start, head))
                }
            }
            '!' => single!(TokenKind::Not),
            '&' if self.rest().starts_with("&&") => {
                self.pos += 2;
                Ok(Lex::new(TokenKind::And, "&&", start, head))
            }
            '|' if self.rest().starts_with("||") => {
                self.pos += 2;
                Ok(Lex::new(TokenKind::Or, "||", start, head))
            }
            c if is_term_start(c) => Ok(self.lex_term(head)),
            c => Err(IllegalCharacterError {
                pointer: start,
                character: c,
            }),
        }
    }

    fn colon_is_time_separator(&self) -> bool {
        let before_digit = self.bytes.get(self.pos.wrapping_sub(1)).is_some_and(u8::is_ascii_digit);
        let after_digit = self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit);
        before_digit && after_digit
    }

    fn try_lex_number(&mut self) -> Option<String> {
        let start = self.pos;
        let mut end = self.pos;
        let bytes = self.bytes;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == b'.' {
            let mut frac_end = end + 1;
            while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
                frac_end += 1;
            }
            if frac_end > end + 1 {
                end = frac_end;
            }
        }
        if end == start {
            None
        } else {
            self.pos = end;
            Some(self.source[start..end].to_string())
        }
    }

    fn lex_phrase(&mut self, head: String) -> Result<Lex, IllegalCharacterError> {
        let start = self.pos;
        self.pos += 1; // opening quote
        loop {
            match self.peek_char() {
                None => {
                    // Unterminated phrase: stop at EOF, leave it for the
                    // parser to reject as a syntax error with the whole
                    // remaining slice as the lexeme.
                    break;
                }
                Some('\\') => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek_char() {
                        self.pos += escaped.len_utf8();
                    }
                }
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some(other) => self.pos += other.len_utf8(),
            }
        }
        Ok(Lex::new(
            TokenKind::Phrase,
            &self.source[start..self.pos],
            start,
            head,
        ))
    }

    fn lex_regex(&mut self, head: String) -> Result<Lex, IllegalCharacterError> {
        let start = self.pos;
        self.pos += 1; // opening slash
        loop {
            match self.peek_char() {
                None => break,
                Some('\\') => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek_char() {
                        self.pos += escaped.len_utf8();
                    }
                }
                Some('/') => {
                    self.pos += 1;
                    break;
                }
                Some(other) => self.pos += other.len_utf8(),
            }
        }
        Ok(Lex::new(
            TokenKind::Regex,
            &self.source[start..self.pos],
            start,
            head,
        ))
    }

    fn lex_term(&mut self, head: String) -> Lex {
        let start = self.pos;
        loop {
            match self.peek_char() {
                Some('\\') => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek_char() {
                        self.pos += escaped.len_utf8();
                    }
                }
                Some(c) if is_term_continuation(c) => self.pos += c.len_utf8(),
                // A colon sandwiched between digits is a time separator
                // inside a date/time literal (`1990-01-01T00:00:00.000Z`),
                // not a field/value boundary.
                Some(':') if self.colon_is_time_separator() => self.pos += 1,
                _ => break,
            }
        }
        let text = &self.source[start..self.pos];
        let kind = match text {
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "NOT" => TokenKind::Not,
            "TO" => TokenKind::To,
            "*" => TokenKind::Star,
            _ => TokenKind::Term,
        };
        Lex::new(kind, text, start, head)
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Lex>, IllegalCharacterError> {
    Lexer::new(source).tokenize()
}

/// Like [`tokenize`], but reports each token and any error through `tracer`.
pub fn tokenize_with_trace(source: &str, tracer: Tracer) -> Result<Vec<Lex>, IllegalCharacterError> {
    Lexer::new(source).with_tracer(tracer).tokenize()
}
