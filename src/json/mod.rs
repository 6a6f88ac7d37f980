//! # JSON Codec
//!
//! Bidirectional conversion between JSON wire text and a [`JsonValue`] tree,
//! used to move opaque documents through the HTTP layer.
//!
//! - [`value`] - the value tree (`JsonValue`, `Number`, `Map`)
//! - [`limits`] - decode limits (nesting depth, input size)
//! - [`lexer`] - tokenizer with escape and surrogate handling
//! - [`decode`] / [`encode`] - the two directions, both without recursion
//!
//! Round-tripping is lossless for every value kind; numbers may come back
//! with normalized formatting (`1.50` decodes and re-encodes as `1.5`).

pub mod decode;
pub mod encode;
pub mod error;
pub mod lexer;
pub mod limits;
pub mod value;

pub use decode::{decode, decode_bytes, decode_with_limits};
pub use encode::encode;
pub use error::JsonError;
pub use limits::Limits;
pub use value::{Decimal, JsonValue, Map, Number};
