//! JSON tokenizer.
//!
//! Works on the bytes of an already UTF-8 validated `&str`, so multi-byte
//! sequences inside strings are copied through untouched.

use super::error::JsonError;
use super::value::{Decimal, Number};

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    Null,
    True,
    False,
    /// String literal, already unescaped
    String(String),
    Number(Number),
    Eof,
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    pub fn next_token(&mut self) -> Result<Token, JsonError> {
        self.skip_whitespace();
        let offset = self.pos;

        let kind = match self.peek() {
            None => TokenKind::Eof,
            Some(b'{') => self.single(TokenKind::LeftBrace),
            Some(b'}') => self.single(TokenKind::RightBrace),
            Some(b'[') => self.single(TokenKind::LeftBracket),
            Some(b']') => self.single(TokenKind::RightBracket),
            Some(b':') => self.single(TokenKind::Colon),
            Some(b',') => self.single(TokenKind::Comma),
            Some(b'"') => TokenKind::String(self.read_string()?),
            Some(b'-' | b'0'..=b'9') => TokenKind::Number(self.read_number()?),
            Some(b't') => self.read_literal(b"true", TokenKind::True)?,
            Some(b'f') => self.read_literal(b"false", TokenKind::False)?,
            Some(b'n') => self.read_literal(b"null", TokenKind::Null)?,
            Some(_) => return Err(JsonError::UnexpectedToken { offset }),
        };

        Ok(Token { kind, offset })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn read_literal(&mut self, expected: &[u8], kind: TokenKind) -> Result<TokenKind, JsonError> {
        let offset = self.pos;
        for &b in expected {
            if self.bump() != Some(b) {
                return Err(JsonError::UnexpectedToken { offset });
            }
        }
        Ok(kind)
    }

    fn read_string(&mut self) -> Result<String, JsonError> {
        let start = self.pos;
        self.pos += 1;

        let mut buf: Vec<u8> = Vec::new();
        loop {
            let escape_at = self.pos;
            match self.bump() {
                None => return Err(JsonError::UnterminatedString { offset: start }),
                Some(b'"') => break,
                Some(b'\\') => {
                    let ch = self.read_escape(escape_at)?;
                    let mut tmp = [0u8; 4];
                    buf.extend_from_slice(ch.encode_utf8(&mut tmp).as_bytes());
                }
                // Raw control characters must be escaped
                Some(b) if b < 0x20 => return Err(JsonError::UnexpectedToken { offset: escape_at }),
                Some(b) => buf.push(b),
            }
        }

        String::from_utf8(buf).map_err(|_| JsonError::InvalidUtf8 { offset: start })
    }

    fn read_escape(&mut self, offset: usize) -> Result<char, JsonError> {
        match self.bump() {
            None => Err(JsonError::UnterminatedString { offset }),
            Some(b'"') => Ok('"'),
            Some(b'\\') => Ok('\\'),
            Some(b'/') => Ok('/'),
            Some(b'b') => Ok('\x08'),
            Some(b'f') => Ok('\x0C'),
            Some(b'n') => Ok('\n'),
            Some(b'r') => Ok('\r'),
            Some(b't') => Ok('\t'),
            Some(b'u') => self.read_unicode_escape(offset),
            Some(_) => Err(JsonError::InvalidEscape { offset }),
        }
    }

    fn read_unicode_escape(&mut self, offset: usize) -> Result<char, JsonError> {
        let first = self.read_hex4(offset)?;

        let code = match first {
            0xD800..=0xDBFF => {
                if self.bump() != Some(b'\\') || self.bump() != Some(b'u') {
                    return Err(JsonError::InvalidEscape { offset });
                }
                let low = self.read_hex4(offset)?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(JsonError::InvalidEscape { offset });
                }
                0x10000 + ((first - 0xD800) << 10) + (low - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(JsonError::InvalidEscape { offset }),
            _ => first,
        };

        char::from_u32(code).ok_or(JsonError::InvalidEscape { offset })
    }

    fn read_hex4(&mut self, offset: usize) -> Result<u32, JsonError> {
        let mut value = 0u32;
        for _ in 0..4 {
            let digit = match self.bump() {
                Some(b @ b'0'..=b'9') => b - b'0',
                Some(b @ b'a'..=b'f') => b - b'a' + 10,
                Some(b @ b'A'..=b'F') => b - b'A' + 10,
                _ => return Err(JsonError::InvalidEscape { offset }),
            };
            value = (value << 4) | u32::from(digit);
        }
        Ok(value)
    }

    fn read_digits(&mut self) -> usize {
        let start = self.pos;
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
        self.pos - start
    }

    fn read_number(&mut self) -> Result<Number, JsonError> {
        let start = self.pos;
        let invalid = JsonError::InvalidNumber { offset: start };

        if self.peek() == Some(b'-') {
            self.pos += 1;
        }

        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                if let Some(b'0'..=b'9') = self.peek() {
                    return Err(invalid);
                }
            }
            Some(b'1'..=b'9') => {
                self.read_digits();
            }
            _ => return Err(invalid),
        }

        let mut integral = true;
        if self.peek() == Some(b'.') {
            integral = false;
            self.pos += 1;
            if self.read_digits() == 0 {
                return Err(invalid);
            }
        }
        if let Some(b'e' | b'E') = self.peek() {
            integral = false;
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            if self.read_digits() == 0 {
                return Err(invalid);
            }
        }

        // The slice holds only ASCII digits and sign/exponent markers.
        let literal = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| JsonError::InvalidNumber { offset: start })?;

        if integral {
            if let Ok(i) = literal.parse::<i64>() {
                return Ok(Number::Int(i));
            }
        }
        match literal.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Number::Float(f)),
            // Valid grammar, but beyond f64 range.
            Ok(_) => Ok(Number::Decimal(Decimal(literal.to_string()))),
            Err(_) => Err(invalid),
        }
    }
}
