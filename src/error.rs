//! Application-facing error taxonomy
//!
//! The byte-level parse machinery reports failure through
//! [`ParseError`](crate::parse::error::ParseError); everything the encoder,
//! decoder, and registry surface to callers is collapsed into [`CerealError`]
//! here. The distinction that matters to callers is preserved: absence of a
//! key is never an error, while a malformed buffer, a shape mismatch, or an
//! unregistered identifier always is.
//!
//! This module also holds the payload-level validation errors ([`UriError`],
//! [`HexError`]) raised below the document layer.

use std::fmt::{Display, Formatter, Result};

use crate::node::NodeKind;
use crate::parse::error::{ParseError, TokenError, WindowError};

/// Any failure an encode or decode call can surface.
///
/// All cases are terminal for the call that raised them; there is no
/// partial-result mode and no retry.
#[derive(Debug, Clone, PartialEq)]
pub enum CerealError {
    /// A decoded node does not match the statically requested type: a leaf
    /// of the wrong primitive kind, a registry factory product of the wrong
    /// concrete type, or a required field that is absent.
    InvalidEncoding {
        expected: &'static str,
        actual: &'static str,
    },
    /// A dynamically supplied node has a shape matching none of the
    /// recognized capability contracts for encoding.
    UnsupportedCerealRepresentable { kind: NodeKind },
    /// An identified record's identifier has no registry entry.
    UnregisteredCustomType { identifier: String },
    /// The requested root, array, or record shape is absent or structurally
    /// mismatched.
    RootItemNotFound {
        expected: &'static str,
        actual: &'static str,
    },
    /// Malformed byte-level structure: truncation, an unrecognized tag, an
    /// illegal payload.
    InvalidDataContent(ParseError),
    /// A length field too wide to represent in memory on this platform.
    UnsupportedKeyLengthValue { declared: u64 },
    /// A declared content length extending past the end of the remaining
    /// buffer or enclosing container.
    ValueLengthEndNotFound { request: usize, available: usize },
    /// A container whose children did not consume exactly its declared
    /// content length.
    UnsupportedValueLengthValue { residual: usize },
}

/// Type alias for `Result` with an error type of [`CerealError`]
pub type CerealResult<T> = std::result::Result<T, CerealError>;

impl Display for CerealError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            CerealError::InvalidEncoding { expected, actual } => {
                write!(f, "expected {expected}, found {actual}")
            }
            CerealError::UnsupportedCerealRepresentable { kind } => {
                write!(f, "{kind} nodes cannot be encoded as items")
            }
            CerealError::UnregisteredCustomType { identifier } => {
                write!(f, "no registered type for identifier `{identifier}`")
            }
            CerealError::RootItemNotFound { expected, actual } => {
                write!(f, "expected {expected} shape, found {actual}")
            }
            CerealError::InvalidDataContent(err) => {
                write!(f, "malformed data: {err}")
            }
            CerealError::UnsupportedKeyLengthValue { declared } => {
                write!(f, "unsupported length field value {declared}")
            }
            CerealError::ValueLengthEndNotFound { request, available } => {
                write!(
                    f,
                    "declared content length {request} exceeds the {available} bytes available"
                )
            }
            CerealError::UnsupportedValueLengthValue { residual } => {
                write!(
                    f,
                    "container contents fell {residual} bytes short of the declared length"
                )
            }
        }
    }
}

impl From<ParseError> for CerealError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Window(WindowError::OpenWouldExceedBuffer {
                bytes_left,
                request,
            }) => Self::ValueLengthEndNotFound {
                request,
                available: bytes_left,
            },
            ParseError::Window(WindowError::OpenWouldExceedWindow { limit, request }) => {
                Self::ValueLengthEndNotFound {
                    request,
                    available: limit,
                }
            }
            ParseError::Window(WindowError::CloseWithResidue { residual }) => {
                Self::UnsupportedValueLengthValue { residual }
            }
            ParseError::Window(WindowError::OffsetOverflow { excess }) => {
                Self::UnsupportedValueLengthValue { residual: excess }
            }
            ParseError::Token(TokenError::LengthOverflow(declared)) => {
                Self::UnsupportedKeyLengthValue { declared }
            }
            other => Self::InvalidDataContent(other),
        }
    }
}

/// Conditions under which a string is rejected as a URI.
///
/// Validation is structural: a well-formed scheme followed by a body free of
/// whitespace and control characters. Semantic resolution of the URI is out
/// of scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    /// No `scheme:` prefix present.
    MissingScheme(String),
    /// A scheme that does not match `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
    IllegalScheme(String),
    /// Whitespace or a control character in the URI body.
    IllegalCharacter { uri: String, at: usize },
}

impl Display for UriError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            UriError::MissingScheme(uri) => {
                write!(f, "no scheme prefix in `{uri}`")
            }
            UriError::IllegalScheme(uri) => {
                write!(f, "malformed scheme in `{uri}`")
            }
            UriError::IllegalCharacter { uri, at } => {
                write!(f, "illegal character at byte {at} of `{uri}`")
            }
        }
    }
}

/// Conditions for invalidity encountered when interpreting a string as a
/// hex-encoded byte sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    /// Odd-length strings cannot pair up into bytes.
    OddParity(String),
    /// A character outside `[0-9a-fA-F]`.
    NonHex(String),
}

impl Display for HexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            HexError::OddParity(_) => write!(f, "hex-conversion failed on odd-length string"),
            HexError::NonHex(_) => write!(f, "hex-conversion failed on non-hex character"),
        }
    }
}

macro_rules! mk_error {
    ( $( $et:ty ),+ $(,)? ) => {
        $( impl std::error::Error for $et {} )+
    };
}

mk_error! {
    CerealError,
    UriError,
    HexError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_errors_map_to_length_taxonomy() {
        let err: CerealError = ParseError::Window(WindowError::OpenWouldExceedBuffer {
            bytes_left: 4,
            request: 64,
        })
        .into();
        assert_eq!(
            err,
            CerealError::ValueLengthEndNotFound {
                request: 64,
                available: 4
            }
        );

        let err: CerealError =
            ParseError::Window(WindowError::CloseWithResidue { residual: 3 }).into();
        assert_eq!(err, CerealError::UnsupportedValueLengthValue { residual: 3 });

        let err: CerealError = ParseError::Token(TokenError::LengthOverflow(u64::MAX)).into();
        assert_eq!(
            err,
            CerealError::UnsupportedKeyLengthValue { declared: u64::MAX }
        );
    }

    #[test]
    fn lexical_errors_map_to_invalid_data_content() {
        let original = ParseError::Token(TokenError::UnknownTag(0x7f));
        let err: CerealError = original.clone().into();
        assert_eq!(err, CerealError::InvalidDataContent(original));
    }
}
