//! Error types used to report failure in byte-level parsing
//!
//! This module defines the primary type [`ParseError`] and the alias
//! [`ParseResult<T>`], together with the type-level refinements of
//! `ParseError`, grouped according to similar provenance or nature:
//! window violations, lexically invalid tokens, and post-parse conversion
//! failures.
//!
//! All of these are terminal for the parse that raised them; a malformed
//! buffer is never partially decoded.

use std::fmt::{Display, Formatter, Result};
use std::string::FromUtf8Error;

use crate::error::UriError;

/// Any error that may be encountered while parsing a serialized document.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Error class encountered when opening, closing, or respecting the
    /// content windows implied by container byte-lengths.
    Window(WindowError),
    /// Error class encountered when the byte content of the buffer fails a
    /// lexical expectation: unrecognized tags, illegal boolean bytes,
    /// unrepresentable length fields.
    Token(TokenError),
    /// Error class encountered when low-level parsing succeeds but the raw
    /// value cannot be converted into a legal payload value.
    External(ExternalError),
    /// The root node parsed cleanly but left unconsumed bytes behind.
    ///
    /// Only raised when the `check_complete_parse` feature is enabled.
    Incomplete { residual: usize },
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ParseError::Window(err) => write!(f, "content-window error: {}", err),
            ParseError::Token(err) => write!(f, "token error: {}", err),
            ParseError::External(err) => write!(f, "conversion error: {}", err),
            ParseError::Incomplete { residual } => {
                write!(f, "{} unconsumed bytes after root node", residual)
            }
        }
    }
}

/// Type alias for `Result` with an error type of [`ParseError`]
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors related to content windows
///
/// Containers declare their content byte-length on the wire; the parser
/// enforces that declaration as a window over the buffer. These cases cover
/// every way a buffer can disagree with its own declared lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    /// A consume operation would run past the end of the buffer or of the
    /// innermost open window.
    ConsumeWouldExceedLimit {
        offset: usize,
        requested: usize,
        limit: usize,
    },
    /// A declared content length extends beyond the final byte of the
    /// parse-buffer.
    OpenWouldExceedBuffer { bytes_left: usize, request: usize },
    /// A declared content length extends beyond the innermost open window,
    /// i.e. a child container claims to be larger than its parent allows.
    OpenWouldExceedWindow { limit: usize, request: usize },
    /// A container's children were exhausted before its declared content
    /// length was consumed in full.
    CloseWithResidue { residual: usize },
    /// A window close was attempted with no window open.
    ///
    /// This is an implementation bug rather than a property of the input.
    CloseWithoutWindow,
    /// The offset has somehow advanced past the innermost window target.
    ///
    /// Never expected to be reached; it is a critical implementation error
    /// if this is ever reported.
    OffsetOverflow { excess: usize },
}

impl From<WindowError> for ParseError {
    fn from(err: WindowError) -> Self {
        Self::Window(err)
    }
}

impl Display for WindowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match *self {
            WindowError::ConsumeWouldExceedLimit {
                offset,
                requested,
                limit,
            } => write!(
                f,
                "cannot consume {} bytes (currently at byte {} out of limit {})",
                requested, offset, limit
            ),
            WindowError::OpenWouldExceedBuffer {
                bytes_left,
                request,
            } => write!(
                f,
                "declared content length {} exceeds the {} bytes remaining in the buffer",
                request, bytes_left
            ),
            WindowError::OpenWouldExceedWindow { limit, request } => write!(
                f,
                "declared content end {} lies beyond the enclosing window end {}",
                request, limit
            ),
            WindowError::CloseWithResidue { residual } => write!(
                f,
                "container ended with {} declared bytes unconsumed",
                residual
            ),
            WindowError::CloseWithoutWindow => write!(f, "no content window to close"),
            WindowError::OffsetOverflow { excess } => write!(
                f,
                "BUG: offset exceeds the current window target by {} bytes",
                excess
            ),
        }
    }
}

/// Errors arising from unexpected tokens in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// A tag byte matching no case of the tag enumeration.
    UnknownTag(u8),
    /// A recognized tag appearing where the grammar demands a different one
    /// (an identified record whose identifier is not a string leaf).
    UnexpectedTag { expected: u8, actual: u8 },
    /// A boolean payload byte other than `0x00` or `0x01`.
    InvalidBoolean(u8),
    /// A length field that cannot be represented as an in-memory size on
    /// this platform.
    LengthOverflow(u64),
}

impl From<TokenError> for ParseError {
    fn from(err: TokenError) -> Self {
        Self::Token(err)
    }
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match *self {
            TokenError::UnknownTag(byte) => write!(f, "unrecognized tag byte 0x{byte:02x}"),
            TokenError::UnexpectedTag { expected, actual } => write!(
                f,
                "tag byte 0x{actual:02x} where 0x{expected:02x} is required"
            ),
            TokenError::InvalidBoolean(byte) => {
                write!(f, "invalid boolean encoding 0x{byte:02x}")
            }
            TokenError::LengthOverflow(declared) => write!(
                f,
                "declared length {declared} is not representable on this platform"
            ),
        }
    }
}

/// Contextually invalid results from otherwise successful consume operations
///
/// The bytes were present and well-delimited, but do not form a legal value
/// of the payload type demanded by the tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalError {
    /// A string payload that is not valid UTF-8.
    Utf8(FromUtf8Error),
    /// A URI payload that does not satisfy URI syntax.
    Uri(UriError),
}

impl From<FromUtf8Error> for ParseError {
    fn from(err: FromUtf8Error) -> Self {
        Self::External(ExternalError::Utf8(err))
    }
}

impl From<UriError> for ParseError {
    fn from(err: UriError) -> Self {
        Self::External(ExternalError::Uri(err))
    }
}

impl Display for ExternalError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ExternalError::Utf8(err) => {
                write!(f, "string payload is not valid UTF-8: {}", err)
            }
            ExternalError::Uri(err) => write!(f, "URI payload rejected: {}", err),
        }
    }
}

/// Converts a borrowed byte-slice into an owned byte-array of the expected
/// width, reporting a [`WindowError::ConsumeWouldExceedLimit`] mismatch as a
/// bug if the slice has the wrong length.
pub(crate) fn coerce_slice<const N: usize>(bytes: &[u8]) -> ParseResult<[u8; N]> {
    <[u8; N] as std::convert::TryFrom<&[u8]>>::try_from(bytes).map_err(|_| {
        ParseError::Window(WindowError::ConsumeWouldExceedLimit {
            offset: 0,
            requested: N,
            limit: bytes.len(),
        })
    })
}

macro_rules! mk_error {
    ( $( $et:ty ),+ $(,)? ) => {
        $( impl std::error::Error for $et {} )+
    };
}

mk_error! {
    ParseError,
    WindowError,
    TokenError,
    ExternalError,
}
