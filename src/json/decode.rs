//! Wire text to value tree.
//!
//! The decoder is a push-down state machine over the token stream. Open
//! arrays and objects live on an explicit `Vec` of frames instead of the
//! call stack, so a pathological document fails with
//! [`JsonError::DepthLimitExceeded`] once it passes [`Limits::max_depth`]
//! rather than overflowing a small coroutine stack.

use super::error::JsonError;
use super::lexer::{Lexer, Token, TokenKind};
use super::limits::Limits;
use super::value::{JsonValue, Map};

/// Decode a JSON document with the default [`Limits`].
///
/// ```
/// use docserve::json::{decode, JsonValue};
///
/// let value = decode(r#"{"data":"abcde12345"}"#).unwrap();
/// assert_eq!(value.get("data"), Some(&JsonValue::from("abcde12345")));
/// ```
pub fn decode(input: &str) -> Result<JsonValue, JsonError> {
    decode_with_limits(input, Limits::default())
}

/// Decode raw bytes, validating UTF-8 first.
pub fn decode_bytes(input: &[u8]) -> Result<JsonValue, JsonError> {
    let text = std::str::from_utf8(input).map_err(|e| JsonError::InvalidUtf8 {
        offset: e.valid_up_to(),
    })?;
    decode(text)
}

/// Decode a JSON document with explicit limits.
pub fn decode_with_limits(input: &str, limits: Limits) -> Result<JsonValue, JsonError> {
    if input.len() > limits.max_input_size {
        return Err(JsonError::InputTooLarge {
            size: input.len(),
            limit: limits.max_input_size,
        });
    }
    Decoder::new(input, limits).run()
}

enum Frame {
    Array(Vec<JsonValue>),
    Object { map: Map, key: Option<String> },
}

/// What to do after a finished value has been attached to its parent.
enum Next {
    /// Parse another value starting at this token
    Value(Token),
    /// The innermost container closed
    Close,
}

struct Decoder<'a> {
    lexer: Lexer<'a>,
    limits: Limits,
    stack: Vec<Frame>,
}

impl<'a> Decoder<'a> {
    fn new(input: &'a str, limits: Limits) -> Self {
        Self {
            lexer: Lexer::new(input),
            limits,
            stack: Vec::new(),
        }
    }

    fn run(mut self) -> Result<JsonValue, JsonError> {
        let first = self.lexer.next_token()?;
        if first.kind == TokenKind::Eof {
            return Err(JsonError::EmptyInput);
        }

        let root = self.parse(first)?;

        let rest = self.lexer.next_token()?;
        if rest.kind != TokenKind::Eof {
            return Err(JsonError::TrailingCharacters {
                offset: rest.offset,
            });
        }
        Ok(root)
    }

    fn push(&mut self, frame: Frame) -> Result<(), JsonError> {
        if self.stack.len() >= self.limits.max_depth {
            return Err(JsonError::DepthLimitExceeded {
                limit: self.limits.max_depth,
            });
        }
        self.stack.push(frame);
        Ok(())
    }

    fn parse(&mut self, mut token: Token) -> Result<JsonValue, JsonError> {
        loop {
            let mut value = match token.kind {
                TokenKind::Null => JsonValue::Null,
                TokenKind::True => JsonValue::Bool(true),
                TokenKind::False => JsonValue::Bool(false),
                TokenKind::Number(n) => JsonValue::Number(n),
                TokenKind::String(s) => JsonValue::String(s),
                TokenKind::LeftBracket => {
                    self.push(Frame::Array(Vec::new()))?;
                    let next = self.lexer.next_token()?;
                    if next.kind == TokenKind::RightBracket {
                        self.stack.pop();
                        JsonValue::Array(Vec::new())
                    } else {
                        token = next;
                        continue;
                    }
                }
                TokenKind::LeftBrace => {
                    self.push(Frame::Object {
                        map: Map::new(),
                        key: None,
                    })?;
                    let next = self.lexer.next_token()?;
                    if next.kind == TokenKind::RightBrace {
                        self.stack.pop();
                        JsonValue::Object(Map::new())
                    } else {
                        token = self.read_key(next)?;
                        continue;
                    }
                }
                TokenKind::RightBracket | TokenKind::RightBrace => {
                    return Err(self.misplaced_closer(&token));
                }
                TokenKind::Eof => return Err(JsonError::UnexpectedEof),
                TokenKind::Colon | TokenKind::Comma => {
                    return Err(JsonError::UnexpectedToken {
                        offset: token.offset,
                    })
                }
            };

            // Attach the finished value, closing as many containers as the
            // following tokens end.
            loop {
                let next = match self.stack.last_mut() {
                    None => return Ok(value),
                    Some(Frame::Array(items)) => {
                        items.push(value);
                        let after = self.lexer.next_token()?;
                        match after.kind {
                            TokenKind::Comma => Next::Value(self.lexer.next_token()?),
                            TokenKind::RightBracket => Next::Close,
                            TokenKind::RightBrace => {
                                return Err(JsonError::MismatchedBracket {
                                    offset: after.offset,
                                })
                            }
                            TokenKind::Eof => return Err(JsonError::UnexpectedEof),
                            _ => {
                                return Err(JsonError::UnexpectedToken {
                                    offset: after.offset,
                                })
                            }
                        }
                    }
                    Some(Frame::Object { map, key }) => {
                        if let Some(k) = key.take() {
                            map.insert(k, value);
                        }
                        let after = self.lexer.next_token()?;
                        match after.kind {
                            TokenKind::Comma => {
                                let key_token = self.lexer.next_token()?;
                                Next::Value(self.read_key(key_token)?)
                            }
                            TokenKind::RightBrace => Next::Close,
                            TokenKind::RightBracket => {
                                return Err(JsonError::MismatchedBracket {
                                    offset: after.offset,
                                })
                            }
                            TokenKind::Eof => return Err(JsonError::UnexpectedEof),
                            _ => {
                                return Err(JsonError::UnexpectedToken {
                                    offset: after.offset,
                                })
                            }
                        }
                    }
                };

                match next {
                    Next::Value(t) => {
                        token = t;
                        break;
                    }
                    Next::Close => {
                        value = match self.stack.pop() {
                            Some(Frame::Array(items)) => JsonValue::Array(items),
                            Some(Frame::Object { map, .. }) => JsonValue::Object(map),
                            None => return Err(JsonError::UnexpectedEof),
                        };
                    }
                }
            }
        }
    }

    /// Consume `"key" :` inside an object and return the token that starts
    /// the member's value.
    fn read_key(&mut self, token: Token) -> Result<Token, JsonError> {
        let key = match token.kind {
            TokenKind::String(s) => s,
            TokenKind::Eof => return Err(JsonError::UnexpectedEof),
            TokenKind::RightBracket => {
                return Err(JsonError::MismatchedBracket {
                    offset: token.offset,
                })
            }
            _ => {
                return Err(JsonError::UnexpectedToken {
                    offset: token.offset,
                })
            }
        };

        let colon = self.lexer.next_token()?;
        match colon.kind {
            TokenKind::Colon => {}
            TokenKind::Eof => return Err(JsonError::UnexpectedEof),
            _ => {
                return Err(JsonError::UnexpectedToken {
                    offset: colon.offset,
                })
            }
        }

        if let Some(Frame::Object { key: slot, .. }) = self.stack.last_mut() {
            *slot = Some(key);
        }
        self.lexer.next_token()
    }

    /// A closer where a value was expected: either a trailing comma inside
    /// the matching container, or a closer of the wrong kind.
    fn misplaced_closer(&self, token: &Token) -> JsonError {
        let matches_top = matches!(
            (&token.kind, self.stack.last()),
            (TokenKind::RightBracket, Some(Frame::Array(_)))
                | (TokenKind::RightBrace, Some(Frame::Object { .. }))
        );
        if matches_top || self.stack.is_empty() {
            JsonError::UnexpectedToken {
                offset: token.offset,
            }
        } else {
            JsonError::MismatchedBracket {
                offset: token.offset,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::value::Number;

    #[test]
    fn test_scalar_roots() {
        assert_eq!(decode("42").unwrap(), JsonValue::Number(Number::Int(42)));
        assert_eq!(decode("\"5\"").unwrap(), JsonValue::from("5"));
        assert_eq!(decode("true").unwrap(), JsonValue::Bool(true));
        assert_eq!(decode(" null ").unwrap(), JsonValue::Null);
    }

    #[test]
    fn test_empty_input_is_error() {
        assert_eq!(decode(""), Err(JsonError::EmptyInput));
        assert_eq!(decode("  \n"), Err(JsonError::EmptyInput));
    }

    #[test]
    fn test_nested_document() {
        let value = decode(r#"{"a":[1,{"b":null},[]],"c":{},"d":"x"}"#).unwrap();
        let a = value.get("a").and_then(JsonValue::as_array).unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a[0], JsonValue::from(1i64));
        assert_eq!(a[1].get("b"), Some(&JsonValue::Null));
        assert_eq!(a[2], JsonValue::Array(vec![]));
        assert_eq!(value.get("c"), Some(&JsonValue::Object(Map::new())));
        assert_eq!(value.get("d"), Some(&JsonValue::from("x")));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let value = decode(r#"{"k":1,"k":2}"#).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("k"), Some(&JsonValue::from(2i64)));
    }

    #[test]
    fn test_trailing_garbage() {
        assert!(matches!(
            decode("{} x"),
            Err(JsonError::UnexpectedToken { .. })
        ));
        assert_eq!(
            decode("[1] [2]"),
            Err(JsonError::TrailingCharacters { offset: 4 })
        );
        assert_eq!(
            decode("1 2"),
            Err(JsonError::TrailingCharacters { offset: 2 })
        );
    }

    #[test]
    fn test_mismatched_brackets() {
        assert!(matches!(decode("[1}"), Err(JsonError::MismatchedBracket { .. })));
        assert!(matches!(decode(r#"{"a":1]"#), Err(JsonError::MismatchedBracket { .. })));
        assert!(matches!(decode("[}"), Err(JsonError::MismatchedBracket { .. })));
        assert!(matches!(decode("]"), Err(JsonError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_unclosed_containers() {
        assert_eq!(decode("[1,2"), Err(JsonError::UnexpectedEof));
        assert_eq!(decode(r#"{"a":"#), Err(JsonError::UnexpectedEof));
        assert_eq!(decode("["), Err(JsonError::UnexpectedEof));
    }

    #[test]
    fn test_trailing_commas_rejected() {
        assert!(matches!(decode("[1,]"), Err(JsonError::UnexpectedToken { .. })));
        assert!(matches!(decode(r#"{"a":1,}"#), Err(JsonError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_object_key_must_be_string() {
        assert!(matches!(decode("{1:2}"), Err(JsonError::UnexpectedToken { .. })));
        assert!(matches!(decode(r#"{"a" 1}"#), Err(JsonError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}{}", "[".repeat(2000), "]".repeat(2000));
        assert_eq!(
            decode(&deep),
            Err(JsonError::DepthLimitExceeded { limit: 1000 })
        );

        let ok = format!("{}{}", "[".repeat(1000), "]".repeat(1000));
        assert!(decode(&ok).is_ok());
    }

    #[test]
    fn test_custom_depth_limit() {
        let limits = Limits::with_max_depth(2);
        assert!(decode_with_limits("[[1]]", limits).is_ok());
        assert_eq!(
            decode_with_limits(r#"[{"a":[]}]"#, limits),
            Err(JsonError::DepthLimitExceeded { limit: 2 })
        );
    }

    #[test]
    fn test_input_size_limit() {
        let limits = Limits {
            max_depth: 10,
            max_input_size: 4,
        };
        assert_eq!(
            decode_with_limits("[1,2,3]", limits),
            Err(JsonError::InputTooLarge { size: 7, limit: 4 })
        );
    }

    #[test]
    fn test_decode_bytes_rejects_invalid_utf8() {
        assert_eq!(
            decode_bytes(&[b'"', 0xFF, b'"']),
            Err(JsonError::InvalidUtf8 { offset: 1 })
        );
        assert_eq!(decode_bytes(b"[]").unwrap(), JsonValue::Array(vec![]));
    }
}
