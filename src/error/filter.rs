//! Filter compiler error types.
//!
//! Every variant produced from source text carries the position of the
//! offending token. Analyzer errors on trees built in code have no position.

use std::fmt;

use crate::filter::Position;

/// Errors raised while lexing, parsing, analyzing or building filters.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    /// A character that starts no token (`=`, `!`, `-` without a digit, `$`).
    IllegalCharacter {
        found: String,
        pos: Position,
    },

    /// A string literal or escape sequence runs into the end of input.
    UnterminatedString {
        found: String,
        pos: Position,
    },

    /// A number with a dangling fractional point, such as `12.`.
    MalformedNumber {
        found: String,
        pos: Position,
    },

    /// The parser needed a specific token.
    UnexpectedToken {
        expected: String,
        found: String,
        pos: Position,
    },

    /// No expression can start with the current token.
    ExpectedPrimary {
        found: String,
        pos: Position,
    },

    /// `()` with nothing inside.
    EmptyParens {
        pos: Position,
    },

    /// A list literal ends with `,)`.
    TrailingComma {
        pos: Position,
    },

    /// A list literal mixes literal kinds, or contains a non-literal.
    HeterogeneousList {
        expected: String,
        found: String,
        pos: Position,
    },

    /// A boolean used as a subscript.
    BooleanIndex {
        pos: Position,
    },

    /// Input continues after a complete expression.
    TrailingTokens {
        found: String,
        pos: Position,
    },

    /// An operand has the right shape but the wrong literal kind.
    TypeMismatch {
        op: String,
        expected: String,
        actual: String,
        pos: Option<Position>,
    },

    /// An operand has the wrong shape for its operator.
    InvalidOperand {
        op: String,
        message: String,
        pos: Option<Position>,
    },

    /// There is no expression to analyze.
    NilRoot,

    /// A store request failed validation outside of its filter.
    InvalidRequest {
        field: String,
        message: String,
    },
}

impl FilterError {
    /// The source position of the offending token, when known.
    pub fn position(&self) -> Option<Position> {
        match self {
            FilterError::IllegalCharacter { pos, .. }
            | FilterError::UnterminatedString { pos, .. }
            | FilterError::MalformedNumber { pos, .. }
            | FilterError::UnexpectedToken { pos, .. }
            | FilterError::ExpectedPrimary { pos, .. }
            | FilterError::EmptyParens { pos }
            | FilterError::TrailingComma { pos }
            | FilterError::HeterogeneousList { pos, .. }
            | FilterError::BooleanIndex { pos }
            | FilterError::TrailingTokens { pos, .. } => Some(*pos),
            FilterError::TypeMismatch { pos, .. } | FilterError::InvalidOperand { pos, .. } => *pos,
            FilterError::NilRoot | FilterError::InvalidRequest { .. } => None,
        }
    }

    /// Returns true for errors produced while scanning characters.
    pub fn is_lexical(&self) -> bool {
        matches!(
            self,
            FilterError::IllegalCharacter { .. }
                | FilterError::UnterminatedString { .. }
                | FilterError::MalformedNumber { .. }
        )
    }

    /// Returns true for errors produced by the semantic analyzer.
    pub fn is_semantic(&self) -> bool {
        matches!(
            self,
            FilterError::TypeMismatch { .. } | FilterError::InvalidOperand { .. } | FilterError::NilRoot
        )
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        let at = match self.position() {
            Some(pos) if pos.is_known() => format!(" at {}", pos),
            _ => String::new(),
        };
        match self {
            FilterError::IllegalCharacter { found, .. } => {
                format!("Unexpected character '{}'{}.", found, at)
            }
            FilterError::UnterminatedString { .. } => {
                format!("A quoted string is missing its closing quote{}.", at)
            }
            FilterError::MalformedNumber { found, .. } => {
                format!("'{}'{} is not a valid number.", found, at)
            }
            FilterError::UnexpectedToken { expected, found, .. } => {
                format!("Expected {} but found '{}'{}.", expected, found, at)
            }
            FilterError::ExpectedPrimary { found, .. } => {
                format!("Expected a field, value or '(' but found '{}'{}.", found, at)
            }
            FilterError::EmptyParens { .. } => format!("Empty parentheses{}.", at),
            FilterError::TrailingComma { .. } => format!("Remove the trailing comma{}.", at),
            FilterError::HeterogeneousList { expected, found, .. } => format!(
                "List values must all be {} values, found {}{}.",
                expected, found, at
            ),
            FilterError::BooleanIndex { .. } => {
                format!("Subscripts must be numbers or strings{}.", at)
            }
            FilterError::TrailingTokens { found, .. } => {
                format!("Unexpected '{}'{} after the end of the filter.", found, at)
            }
            FilterError::TypeMismatch { op, expected, actual, .. } => format!(
                "Operator '{}' needs a {} value but got {}{}.",
                op, expected, actual, at
            ),
            FilterError::InvalidOperand { op, message, .. } => {
                format!("Invalid use of '{}'{}: {}.", op, at, message)
            }
            FilterError::NilRoot => "The filter is empty.".to_string(),
            FilterError::InvalidRequest { field, message } => {
                format!("Invalid {}: {}.", field, message)
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            FilterError::IllegalCharacter { .. } => "E_FILTER_ILLEGAL",
            FilterError::UnterminatedString { .. } => "E_FILTER_UNTERMINATED",
            FilterError::MalformedNumber { .. } => "E_FILTER_NUMBER",
            FilterError::UnexpectedToken { .. } => "E_FILTER_UNEXPECTED",
            FilterError::ExpectedPrimary { .. } => "E_FILTER_PRIMARY",
            FilterError::EmptyParens { .. } => "E_FILTER_EMPTY_PARENS",
            FilterError::TrailingComma { .. } => "E_FILTER_TRAILING_COMMA",
            FilterError::HeterogeneousList { .. } => "E_FILTER_LIST_KIND",
            FilterError::BooleanIndex { .. } => "E_FILTER_BOOL_INDEX",
            FilterError::TrailingTokens { .. } => "E_FILTER_TRAILING",
            FilterError::TypeMismatch { .. } => "E_FILTER_TYPE",
            FilterError::InvalidOperand { .. } => "E_FILTER_OPERAND",
            FilterError::NilRoot => "E_FILTER_NIL_ROOT",
            FilterError::InvalidRequest { .. } => "E_FILTER_REQUEST",
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::IllegalCharacter { found, pos } => {
                write!(f, "{}: illegal character {:?}", pos, found)
            }
            FilterError::UnterminatedString { pos, .. } => {
                write!(f, "{}: unterminated string literal", pos)
            }
            FilterError::MalformedNumber { found, pos } => {
                write!(f, "{}: malformed number {:?}", pos, found)
            }
            FilterError::UnexpectedToken { expected, found, pos } => {
                write!(f, "{}: expected {}, found {:?}", pos, expected, found)
            }
            FilterError::ExpectedPrimary { found, pos } => {
                write!(f, "{}: expected expression, found {:?}", pos, found)
            }
            FilterError::EmptyParens { pos } => write!(f, "{}: empty parentheses", pos),
            FilterError::TrailingComma { pos } => {
                write!(f, "{}: trailing comma in list literal", pos)
            }
            FilterError::HeterogeneousList { expected, found, pos } => write!(
                f,
                "{}: list literal elements must be {}, found {}",
                pos, expected, found
            ),
            FilterError::BooleanIndex { pos } => write!(f, "{}: boolean index", pos),
            FilterError::TrailingTokens { found, pos } => {
                write!(f, "{}: unexpected {:?} after expression", pos, found)
            }
            FilterError::TypeMismatch { op, expected, actual, pos } => {
                if let Some(pos) = pos {
                    write!(f, "{}: ", pos)?;
                }
                write!(
                    f,
                    "type mismatch for {:?}: expected {}, got {}",
                    op, expected, actual
                )
            }
            FilterError::InvalidOperand { op, message, pos } => {
                if let Some(pos) = pos {
                    write!(f, "{}: ", pos)?;
                }
                write!(f, "invalid operand for {:?}: {}", op, message)
            }
            FilterError::NilRoot => write!(f, "filter expression is nil"),
            FilterError::InvalidRequest { field, message } => {
                write!(f, "invalid request {}: {}", field, message)
            }
        }
    }
}

impl std::error::Error for FilterError {}
