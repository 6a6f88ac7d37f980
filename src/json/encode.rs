//! Value tree to wire text.

use std::fmt::Write as _;

use super::error::JsonError;
use super::value::{JsonValue, Number};

/// Encode a value tree as compact JSON text.
///
/// Objects are written in their internal insertion order. The only failure
/// is a float with no JSON representation (NaN or an infinity).
///
/// ```
/// use docserve::json::{encode, JsonValue};
///
/// let text = encode(&JsonValue::from(vec![JsonValue::from(1i64), JsonValue::Null])).unwrap();
/// assert_eq!(text, "[1,null]");
/// ```
pub fn encode(value: &JsonValue) -> Result<String, JsonError> {
    let mut out = String::new();
    let mut stack: Vec<Frame<'_>> = Vec::new();

    open(value, &mut out, &mut stack)?;

    loop {
        let next = match stack.last_mut() {
            None => break,
            Some(Frame::Array { items, first }) => match items.next() {
                Some(item) => {
                    if !*first {
                        out.push(',');
                    }
                    *first = false;
                    item
                }
                None => {
                    out.push(']');
                    stack.pop();
                    continue;
                }
            },
            Some(Frame::Object { entries, first }) => match entries.next() {
                Some((key, item)) => {
                    if !*first {
                        out.push(',');
                    }
                    *first = false;
                    write_string(key, &mut out);
                    out.push(':');
                    item
                }
                None => {
                    out.push('}');
                    stack.pop();
                    continue;
                }
            },
        };
        open(next, &mut out, &mut stack)?;
    }

    Ok(out)
}

enum Frame<'a> {
    Array {
        items: std::slice::Iter<'a, JsonValue>,
        first: bool,
    },
    Object {
        entries: indexmap::map::Iter<'a, String, JsonValue>,
        first: bool,
    },
}

/// Write a scalar, or the opening bracket of a container and push its frame.
fn open<'a>(value: &'a JsonValue, out: &mut String, stack: &mut Vec<Frame<'a>>) -> Result<(), JsonError> {
    match value {
        JsonValue::Null => out.push_str("null"),
        JsonValue::Bool(true) => out.push_str("true"),
        JsonValue::Bool(false) => out.push_str("false"),
        JsonValue::Number(n) => write_number(n, out)?,
        JsonValue::String(s) => write_string(s, out),
        JsonValue::Array(items) => {
            out.push('[');
            stack.push(Frame::Array {
                items: items.iter(),
                first: true,
            });
        }
        JsonValue::Object(map) => {
            out.push('{');
            stack.push(Frame::Object {
                entries: map.iter(),
                first: true,
            });
        }
    }
    Ok(())
}

fn write_number(n: &Number, out: &mut String) -> Result<(), JsonError> {
    match *n {
        Number::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Number::Float(f) => {
            // serde_json prints the shortest text that parses back to `f`,
            // always with a fraction or exponent so it stays a float.
            let num = serde_json::Number::from_f64(f).ok_or(JsonError::NonFiniteNumber)?;
            let _ = write!(out, "{num}");
        }
        Number::Decimal(ref d) => out.push_str(d.as_str()),
    }
    Ok(())
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::decode::{decode, decode_with_limits};
    use crate::json::limits::Limits;
    use crate::json::value::Map;

    #[test]
    fn test_scalars() {
        assert_eq!(encode(&JsonValue::Null).unwrap(), "null");
        assert_eq!(encode(&JsonValue::Bool(false)).unwrap(), "false");
        assert_eq!(encode(&JsonValue::from(-7i64)).unwrap(), "-7");
        assert_eq!(encode(&JsonValue::from(2.5)).unwrap(), "2.5");
        assert_eq!(encode(&JsonValue::from("5")).unwrap(), "\"5\"");
    }

    #[test]
    fn test_whole_float_stays_float() {
        let text = encode(&JsonValue::from(1.0)).unwrap();
        assert_eq!(decode(&text).unwrap(), JsonValue::from(1.0));
    }

    #[test]
    fn test_string_escaping() {
        let text = encode(&JsonValue::from("q\"b\\n\nt\tc\u{1}é")).unwrap();
        assert_eq!(text, "\"q\\\"b\\\\n\\nt\\tc\\u0001é\"");
    }

    #[test]
    fn test_containers_keep_insertion_order() {
        let mut map = Map::new();
        map.insert("z".to_string(), JsonValue::from(1i64));
        map.insert("a".to_string(), JsonValue::Array(vec![]));
        map.insert("m".to_string(), JsonValue::Object(Map::new()));
        assert_eq!(
            encode(&JsonValue::Object(map)).unwrap(),
            r#"{"z":1,"a":[],"m":{}}"#
        );
    }

    #[test]
    fn test_non_finite_fails() {
        assert_eq!(encode(&JsonValue::from(f64::NAN)), Err(JsonError::NonFiniteNumber));
        let nested = JsonValue::Array(vec![JsonValue::from(f64::INFINITY)]);
        assert_eq!(encode(&nested), Err(JsonError::NonFiniteNumber));
    }

    #[test]
    fn test_round_trip() {
        let text = r#"{"id":"abc123","n":[0,-1,3.25,1e-7,true,false,null],"o":{"s":"é😀","e":{}}}"#;
        let value = decode(text).unwrap();
        let again = decode(&encode(&value).unwrap()).unwrap();
        assert_eq!(value, again);
    }

    #[test]
    fn test_out_of_range_numbers_are_written_verbatim() {
        let text = r#"{"big":1e400,"neg":-1E+400,"arr":[123e999,1]}"#;
        let value = decode(text).unwrap();
        assert_eq!(encode(&value).unwrap(), text);
    }

    #[test]
    fn test_deep_value_encodes_without_recursion() {
        let limits = Limits::with_max_depth(5_000);
        let text = format!("{}{}", "[".repeat(3_000), "]".repeat(3_000));
        let value = decode_with_limits(&text, limits).unwrap();
        assert_eq!(encode(&value).unwrap(), text);
    }
}
