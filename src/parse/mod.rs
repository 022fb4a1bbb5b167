//! Byte-level parsing model for serialized documents
//!
//! The top level of this module defines the [`Parser`] trait: an abstraction
//! over a stateful parse-object holding an immutable byte-buffer, a cursor,
//! and a stack of content windows. All parsing is non-backtracking and
//! zero-lookahead; a byte can only be viewed by consuming it, and once
//! consumed it cannot be consumed again.
//!
//! Containers in the wire format declare their content byte-length up front.
//! The parser turns each declaration into a *content window* via
//! [`Parser::set_fit`]: while the window is open, no consume operation may
//! cross its end, and the window may only be lifted by
//! [`Parser::enforce_target`] once the cursor sits exactly on that end. This
//! is the mechanism by which a parse detects a buffer that disagrees with
//! its own declared lengths.
//!
//! Two implementing types are provided: [`byteparser::ByteParser`], the
//! streamlined default, and [`traceparser::TraceParser`], which additionally
//! records every consumed span and renders the consumption history to stderr
//! when a consume fails, which helps diagnose a malformed buffer.

pub mod error;

pub use error::ParseResult;
use error::{ParseError, TokenError};

/// Stateful parse-object over an immutable byte-buffer.
///
/// Provides monomorphic `take_*` accessors for the fixed-width payloads of
/// the wire format, all big-endian, on top of the two required consumption
/// primitives and the window-management operations.
///
/// The following properties must hold for every implementation:
///
/// * A fresh parser has `offset() == 0` and `view_len()` equal to the buffer
///   length.
/// * `remainder()` is the largest `n` for which `consume(n)` can succeed,
///   and also the largest `n` for which `set_fit(n)` can succeed.
/// * A failed consume leaves the offset unchanged.
/// * Immediately after `set_fit(n)`, `remainder() == n`.
/// * `enforce_target` succeeds if and only if `test_target()` would have
///   returned `true`.
pub trait Parser {
    /// Buffer type a new parser can be infallibly instantiated from.
    type Buffer;

    /// Constructs an initialized parser over a buffer.
    fn from_buffer(buf: Self::Buffer) -> Self;

    /// Length of the current view of the buffer: the innermost window end,
    /// or the full buffer length when no window is open.
    fn view_len(&self) -> usize;

    /// Current cursor position.
    fn offset(&self) -> usize;

    /// Number of bytes that can still be consumed in the current view.
    fn remainder(&self) -> usize {
        self.view_len() - self.offset()
    }

    /// Consumes and returns a single byte.
    fn consume_byte(&mut self) -> ParseResult<u8>;

    /// Consumes and returns a slice of exactly `nbytes` bytes.
    ///
    /// Must return `Ok(_)` when and only when no bound would be violated; a
    /// failed call must leave the cursor where it was.
    fn consume(&mut self, nbytes: usize) -> ParseResult<&[u8]>;

    /// Opens a content window permitting exactly `n` further bytes.
    fn set_fit(&mut self, n: usize) -> ParseResult<()>;

    /// Tests whether the innermost window has been consumed exactly.
    fn test_target(&self) -> ParseResult<bool>;

    /// Closes the innermost window, failing on residual bytes or when no
    /// window is open.
    fn enforce_target(&mut self) -> ParseResult<()>;

    /// Consumes `N` bytes and returns them in array form.
    fn consume_arr<const N: usize>(&mut self) -> ParseResult<[u8; N]> {
        error::coerce_slice(self.consume(N)?)
    }

    /// Consumes one byte and returns it as a `u8` value.
    #[inline]
    fn take_u8(&mut self) -> ParseResult<u8> {
        self.consume_byte()
    }

    /// Consumes four bytes and returns the corresponding big-endian `i32`.
    #[inline]
    fn take_i32(&mut self) -> ParseResult<i32> {
        self.consume_arr::<4>().map(i32::from_be_bytes)
    }

    /// Consumes eight bytes and returns the corresponding big-endian `i64`.
    #[inline]
    fn take_i64(&mut self) -> ParseResult<i64> {
        self.consume_arr::<8>().map(i64::from_be_bytes)
    }

    /// Consumes eight bytes and returns the corresponding big-endian `u64`.
    ///
    /// This is the width of every length and count field in the wire format.
    #[inline]
    fn take_u64(&mut self) -> ParseResult<u64> {
        self.consume_arr::<8>().map(u64::from_be_bytes)
    }

    /// Consumes four bytes and returns the corresponding big-endian `f32`.
    #[inline]
    fn take_f32(&mut self) -> ParseResult<f32> {
        self.consume_arr::<4>().map(f32::from_be_bytes)
    }

    /// Consumes eight bytes and returns the corresponding big-endian `f64`.
    #[inline]
    fn take_f64(&mut self) -> ParseResult<f64> {
        self.consume_arr::<8>().map(f64::from_be_bytes)
    }

    /// Consumes a single byte and returns the boolean value it represents.
    ///
    /// The only valid boolean encodings are `0x01` for `true` and `0x00` for
    /// `false`; any other byte is a [`TokenError::InvalidBoolean`].
    #[inline]
    fn take_bool(&mut self) -> ParseResult<bool> {
        match self.consume_byte()? {
            0x01 => Ok(true),
            0x00 => Ok(false),
            byte => Err(ParseError::Token(TokenError::InvalidBoolean(byte))),
        }
    }

    /// Consumes a length field and narrows it to a platform size.
    ///
    /// A value wider than `usize` can only occur for a buffer that is
    /// malformed on this platform, and is reported as
    /// [`TokenError::LengthOverflow`].
    fn take_length(&mut self) -> ParseResult<usize> {
        let declared = self.take_u64()?;
        usize::try_from(declared)
            .map_err(|_| ParseError::Token(TokenError::LengthOverflow(declared)))
    }

    /// Consumes and returns a `Vec<u8>` of length `nbytes`.
    #[inline]
    fn take_dynamic(&mut self, nbytes: usize) -> ParseResult<Vec<u8>> {
        self.consume(nbytes).map(Vec::from)
    }
}

pub mod buffer {
    //! Buffer newtype used by the provided [`Parser`](super::Parser)
    //! implementors

    /// Newtype around `Vec<u8>` that only permits immutable access.
    ///
    /// Signals the intended role of the vector as the frozen backing store
    /// of a parser; the contents are never mutated after construction.
    #[derive(Clone, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct VecBuffer(Vec<u8>);

    impl VecBuffer {
        /// Number of bytes in the buffer.
        pub fn len(&self) -> usize {
            self.0.len()
        }

        /// Returns `true` if the buffer contains zero bytes.
        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }

        /// Borrows the byte at index `ix`.
        ///
        /// # Panics
        ///
        /// Panics if `ix` is out of bounds; callers are expected to have
        /// validated the range against the tracked offset limit.
        pub(crate) fn get_byte(&self, ix: usize) -> u8 {
            self.0[ix]
        }

        /// Borrows the range of `len` bytes starting at index `ix`.
        ///
        /// # Panics
        ///
        /// Panics if the range is out of bounds.
        pub(crate) fn get_slice(&self, ix: usize, len: usize) -> &[u8] {
            &self.0[ix..ix + len]
        }
    }

    impl std::fmt::Debug for VecBuffer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            <Vec<u8> as std::fmt::Debug>::fmt(&self.0, f)
        }
    }

    impl From<Vec<u8>> for VecBuffer {
        fn from(bytes: Vec<u8>) -> Self {
            Self(bytes)
        }
    }

    impl From<&[u8]> for VecBuffer {
        fn from(bytes: &[u8]) -> Self {
            Self(bytes.to_owned())
        }
    }

    impl<const N: usize> From<[u8; N]> for VecBuffer {
        fn from(bytes: [u8; N]) -> Self {
            Self(bytes.to_vec())
        }
    }
}

pub mod byteparser {
    use super::buffer::VecBuffer;
    use super::error::{ParseError, ParseResult, WindowError};
    use super::Parser;
    use crate::internal::offset::ContextOffset;

    /// The default [`Parser`] implementation: an owned byte-buffer plus a
    /// [`ContextOffset`] tracking the cursor and open content windows.
    #[derive(Debug)]
    pub struct ByteParser {
        buffer: VecBuffer,
        offset: ContextOffset,
    }

    impl Parser for ByteParser {
        type Buffer = VecBuffer;

        fn from_buffer(buffer: Self::Buffer) -> Self {
            let offset = ContextOffset::with_limit(buffer.len());
            Self { buffer, offset }
        }

        #[inline]
        fn view_len(&self) -> usize {
            self.offset.limit()
        }

        #[inline]
        fn offset(&self) -> usize {
            self.offset.index()
        }

        fn consume_byte(&mut self) -> ParseResult<u8> {
            let (ix, adv) = self.offset.advance(1);
            if adv {
                Ok(self.buffer.get_byte(ix))
            } else {
                Err(ParseError::Window(WindowError::ConsumeWouldExceedLimit {
                    offset: ix,
                    requested: 1,
                    limit: self.view_len(),
                }))
            }
        }

        fn consume(&mut self, nbytes: usize) -> ParseResult<&[u8]> {
            let (ix, adv) = self.offset.advance(nbytes);
            if adv {
                Ok(self.buffer.get_slice(ix, nbytes))
            } else {
                Err(ParseError::Window(WindowError::ConsumeWouldExceedLimit {
                    offset: ix,
                    requested: nbytes,
                    limit: self.view_len(),
                }))
            }
        }

        #[inline]
        fn set_fit(&mut self, n: usize) -> ParseResult<()> {
            self.offset.set_fit(n)
        }

        #[inline]
        fn test_target(&self) -> ParseResult<bool> {
            self.offset.test_target()
        }

        #[inline]
        fn enforce_target(&mut self) -> ParseResult<()> {
            self.offset.enforce_target()
        }
    }
}

pub mod traceparser {
    use super::buffer::VecBuffer;
    use super::error::{ParseError, ParseResult, WindowError};
    use super::Parser;
    use crate::internal::offset::ContextOffset;

    /// Diagnostic [`Parser`] that memoizes the length of every consume.
    ///
    /// Behaves identically to [`ByteParser`](super::byteparser::ByteParser),
    /// but when a consume fails it prints the consumption history as
    /// `|`-delimited hex spans to stderr, which localizes the point at which
    /// a malformed buffer went off the rails. Strictly slower; intended for
    /// debugging, not production decode paths.
    #[derive(Debug)]
    pub struct TraceParser {
        buffer: VecBuffer,
        offset: ContextOffset,
        munches: Vec<usize>,
    }

    impl TraceParser {
        fn eprint_munches(&self) {
            let mut rendered = String::new();
            let mut ix = 0usize;
            for &len in self.munches.iter() {
                rendered.push_str(&crate::util::hex_of_bytes(
                    self.buffer.get_slice(ix, len),
                ));
                rendered.push('|');
                ix += len;
            }
            eprintln!("consumed: {rendered}");
        }
    }

    impl Parser for TraceParser {
        type Buffer = VecBuffer;

        fn from_buffer(buffer: Self::Buffer) -> Self {
            let offset = ContextOffset::with_limit(buffer.len());
            Self {
                buffer,
                offset,
                munches: Vec::new(),
            }
        }

        #[inline]
        fn view_len(&self) -> usize {
            self.offset.limit()
        }

        #[inline]
        fn offset(&self) -> usize {
            self.offset.index()
        }

        fn consume_byte(&mut self) -> ParseResult<u8> {
            let (ix, adv) = self.offset.advance(1);
            if adv {
                self.munches.push(1);
                Ok(self.buffer.get_byte(ix))
            } else {
                self.eprint_munches();
                Err(ParseError::Window(WindowError::ConsumeWouldExceedLimit {
                    offset: ix,
                    requested: 1,
                    limit: self.view_len(),
                }))
            }
        }

        fn consume(&mut self, nbytes: usize) -> ParseResult<&[u8]> {
            let (ix, adv) = self.offset.advance(nbytes);
            if adv {
                self.munches.push(nbytes);
                Ok(self.buffer.get_slice(ix, nbytes))
            } else {
                self.eprint_munches();
                Err(ParseError::Window(WindowError::ConsumeWouldExceedLimit {
                    offset: ix,
                    requested: nbytes,
                    limit: self.view_len(),
                }))
            }
        }

        #[inline]
        fn set_fit(&mut self, n: usize) -> ParseResult<()> {
            self.offset.set_fit(n)
        }

        #[inline]
        fn test_target(&self) -> ParseResult<bool> {
            self.offset.test_target()
        }

        #[inline]
        fn enforce_target(&mut self) -> ParseResult<()> {
            self.offset.enforce_target()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::byteparser::ByteParser;
    use super::error::{ParseError, TokenError};
    use super::Parser;

    #[test]
    fn take_fixed_widths() {
        let mut p = ByteParser::from_buffer(
            [
                0x2a, // u8
                0xff, 0xff, 0xff, 0xfe, // i32
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07, // u64
            ]
            .into(),
        );
        assert_eq!(p.take_u8().unwrap(), 0x2a);
        assert_eq!(p.take_i32().unwrap(), -2);
        assert_eq!(p.take_u64().unwrap(), 7);
        assert_eq!(p.remainder(), 0);
    }

    #[test]
    fn bool_rejects_nonbinary_byte() {
        let mut p = ByteParser::from_buffer([0x01, 0x00, 0x02].into());
        assert_eq!(p.take_bool().unwrap(), true);
        assert_eq!(p.take_bool().unwrap(), false);
        assert_eq!(
            p.take_bool(),
            Err(ParseError::Token(TokenError::InvalidBoolean(0x02)))
        );
    }

    #[test]
    fn consume_past_end_fails_without_moving() {
        let mut p = ByteParser::from_buffer([0xde, 0xad].into());
        assert!(p.consume(3).is_err());
        assert_eq!(p.offset(), 0);
        assert_eq!(p.consume(2).unwrap(), &[0xde, 0xad]);
    }
}
