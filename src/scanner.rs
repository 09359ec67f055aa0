//! Lexer: source bytes in, [`Token`]s out.
//!
//! [`Scanner`] is an iterator over `Result<Token>`.  A lexical error is yielded
//! in place of the token that could not be formed and scanning resumes right
//! after it, so one pass reports every bad character.  The stream always ends
//! with a single `EOF` token.
//!
//! Lines are counted from 1.  A token carries the line its lexeme *ends* on,
//! which only differs from the start line for multi‑line strings.
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let kinds: Vec<String> = Scanner::new(b"var x = 1; // set")
//!     .filter_map(Result::ok)
//!     .map(|token| token.token_type.name().to_string())
//!     .collect();
//!
//! assert_eq!(kinds, ["VAR", "IDENTIFIER", "EQUAL", "NUMBER", "SEMICOLON", "EOF"]);
//! ```

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

pub struct Scanner<'a> {
    src: &'a [u8],
    /// First byte of the lexeme being scanned.
    start: usize,
    /// Next byte to read.
    curr: usize,
    line: usize,
    eof_emitted: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            eof_emitted: false,
        }
    }

    fn lexeme(&self) -> String {
        String::from_utf8_lossy(&self.src[self.start..self.curr]).into_owned()
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Consume one byte.  Callers check `is_at_end` first.
    #[inline]
    fn advance(&mut self) -> u8 {
        let byte = self.src[self.curr];
        self.curr += 1;
        byte
    }

    /// Current byte, or `0` at the end of input.
    #[inline]
    fn peek(&self) -> u8 {
        self.src.get(self.curr).copied().unwrap_or(0)
    }

    #[inline]
    fn peek_next(&self) -> u8 {
        self.src.get(self.curr + 1).copied().unwrap_or(0)
    }

    /// `long` when the next byte is `=` (consuming it), otherwise `short`.
    fn with_equals(&mut self, long: TokenType, short: TokenType) -> TokenType {
        if self.peek() == b'=' {
            self.curr += 1;
            long
        } else {
            short
        }
    }

    /// Scan from `start`.  `Ok(None)` means whitespace or a comment was
    /// skipped and nothing is emitted.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let kind = match self.advance() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            b'!' => self.with_equals(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.with_equals(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.with_equals(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equals(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.peek() == b'/' => {
                // the newline itself is left for the line counter
                self.curr = match memchr(b'\n', &self.src[self.curr..]) {
                    Some(offset) => self.curr + offset,
                    None => self.src.len(),
                };
                return Ok(None);
            }
            b'/' => TokenType::SLASH,

            b' ' | b'\r' | b'\t' => return Ok(None),
            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // a multi-byte character is one error, not one per byte
                while self.peek() & 0b1100_0000 == 0b1000_0000 {
                    self.curr += 1;
                }

                debug!("Unexpected {:?} on line {}", self.lexeme(), self.line);
                return Err(LoxError::lex(self.line, "Unexpected character."));
            }
        };

        Ok(Some(kind))
    }

    fn string(&mut self) -> Result<TokenType> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.curr += 1; // closing quote

        let contents = &self.src[self.start + 1..self.curr - 1];
        Ok(TokenType::STRING(
            String::from_utf8_lossy(contents).into_owned(),
        ))
    }

    fn number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.curr += 1;
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.curr += 1;
            while self.peek().is_ascii_digit() {
                self.curr += 1;
            }
        }

        // only ASCII digits and at most one interior '.' were consumed
        TokenType::NUMBER(self.lexeme().parse().unwrap_or_default())
    }

    fn identifier(&mut self) -> TokenType {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.curr += 1;
        }

        KEYWORDS
            .get(&self.src[self.start..self.curr])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.is_at_end() {
            self.start = self.curr;

            match self.scan_token() {
                Ok(Some(kind)) => return Some(Ok(Token::new(kind, self.lexeme(), self.line))),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }

        if self.eof_emitted {
            return None;
        }

        self.eof_emitted = true;
        debug!("Reached end of input on line {}", self.line);
        Some(Ok(Token::new(TokenType::EOF, "", self.line)))
    }
}

impl FusedIterator for Scanner<'_> {}
