use std::fmt;

/// Errors produced by the JSON codec.
///
/// Every decode failure is a flavour of malformed JSON; callers that only
/// care about the taxonomy can use [`JsonError::is_malformed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonError {
    /// Input was empty or only whitespace
    EmptyInput,
    /// Input exceeded `Limits::max_input_size`
    InputTooLarge { size: usize, limit: usize },
    /// Input bytes were not valid UTF-8
    InvalidUtf8 { offset: usize },
    /// A string literal was not closed before end of input
    UnterminatedString { offset: usize },
    /// Unknown escape, bad `\u` hex digits or an unpaired surrogate
    InvalidEscape { offset: usize },
    /// A byte that cannot start or continue a token at this point
    UnexpectedToken { offset: usize },
    /// A number literal that does not follow the JSON grammar
    InvalidNumber { offset: usize },
    /// Opening and closing brackets or braces do not match
    MismatchedBracket { offset: usize },
    /// Input ended inside an array or object
    UnexpectedEof,
    /// Extra content after the root value
    TrailingCharacters { offset: usize },
    /// Arrays/objects nested deeper than `Limits::max_depth`
    DepthLimitExceeded { limit: usize },
    /// Encoding hit a float that has no JSON representation (NaN, ±inf)
    NonFiniteNumber,
}

impl JsonError {
    /// True for every decode-side error (the `MalformedJSON` family).
    pub fn is_malformed(&self) -> bool {
        !matches!(self, JsonError::NonFiniteNumber)
    }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonError::EmptyInput => write!(f, "malformed JSON: empty input"),
            JsonError::InputTooLarge { size, limit } => {
                write!(f, "malformed JSON: input of {size} bytes exceeds limit of {limit}")
            }
            JsonError::InvalidUtf8 { offset } => {
                write!(f, "malformed JSON: invalid UTF-8 at byte {offset}")
            }
            JsonError::UnterminatedString { offset } => {
                write!(f, "malformed JSON: unterminated string starting at byte {offset}")
            }
            JsonError::InvalidEscape { offset } => {
                write!(f, "malformed JSON: invalid escape sequence at byte {offset}")
            }
            JsonError::UnexpectedToken { offset } => {
                write!(f, "malformed JSON: unexpected token at byte {offset}")
            }
            JsonError::InvalidNumber { offset } => {
                write!(f, "malformed JSON: invalid number at byte {offset}")
            }
            JsonError::MismatchedBracket { offset } => {
                write!(f, "malformed JSON: mismatched bracket at byte {offset}")
            }
            JsonError::UnexpectedEof => write!(f, "malformed JSON: unexpected end of input"),
            JsonError::TrailingCharacters { offset } => {
                write!(f, "malformed JSON: trailing characters at byte {offset}")
            }
            JsonError::DepthLimitExceeded { limit } => {
                write!(f, "malformed JSON: nesting deeper than {limit} levels")
            }
            JsonError::NonFiniteNumber => {
                write!(f, "cannot encode non-finite number as JSON")
            }
        }
    }
}

impl std::error::Error for JsonError {}
