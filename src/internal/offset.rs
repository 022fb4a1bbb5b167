//! Cursor and container-window bookkeeping for buffer-based parsers
//!
//! A parse of a serialized document is a single monotonically increasing
//! offset into an immutable byte-buffer. Containers in the wire format carry
//! an explicit content byte-length, which the parser turns into a *window*:
//! a target offset that consumption may reach but never exceed, and that must
//! be met exactly before the enclosing container is considered complete.
//!
//! [`ContextOffset`] bundles the offset, the absolute buffer bound, and the
//! stack of open window targets. Windows nest: each new target must fit
//! within the innermost open window, which holds inductively for the whole
//! stack.

use crate::parse::error::{ParseError, ParseResult, WindowError};

/// Stack of target offsets for open container windows.
///
/// Invariant: values are non-increasing from bottom to top, so the innermost
/// window is always the narrowest.
#[derive(Debug, Default)]
#[repr(transparent)]
pub(crate) struct FrameStack(Vec<usize>);

impl FrameStack {
    fn new() -> Self {
        Self(Vec::new())
    }

    /// Innermost window target, if any window is open.
    #[inline]
    fn innermost(&self) -> Option<usize> {
        self.0.last().copied()
    }

    fn pop(&mut self) -> Option<usize> {
        self.0.pop()
    }

    /// Pushes a new target offset, rejecting any target that would extend
    /// past the innermost open window.
    fn push_frame(&mut self, target: usize) -> ParseResult<()> {
        match self.innermost() {
            Some(limit) if target > limit => Err(ParseError::Window(
                WindowError::OpenWouldExceedWindow {
                    limit,
                    request: target,
                },
            )),
            _ => {
                self.0.push(target);
                Ok(())
            }
        }
    }
}

/// Offset tracker for a non-backtracking parse over a fixed-length buffer.
///
/// The offset starts at `0`, never decreases, and never exceeds the limit of
/// the narrowest open window (or the absolute buffer length when no window is
/// open).
#[derive(Debug)]
pub(crate) struct ContextOffset {
    abs: usize,
    frames: FrameStack,
    cur: usize,
}

impl ContextOffset {
    /// Creates a tracker over a buffer of `abs` bytes, with the offset at `0`
    /// and no open windows.
    pub(crate) fn with_limit(abs: usize) -> Self {
        Self {
            abs,
            frames: FrameStack::new(),
            cur: 0,
        }
    }

    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.cur
    }

    /// Upper bound currently in force: the innermost window target, or the
    /// absolute buffer length.
    #[inline]
    pub(crate) fn limit(&self) -> usize {
        self.frames.innermost().unwrap_or(self.abs)
    }

    /// Attempts to advance the offset by `n` bytes.
    ///
    /// Returns the pre-advance offset along with `true` if the advance was
    /// within bounds and performed, or `false` if it would have crossed the
    /// current limit (in which case the offset is unchanged).
    #[inline]
    pub(crate) fn advance(&mut self, n: usize) -> (usize, bool) {
        let ret = self.cur;
        let valid = n <= self.limit() - self.cur;
        if valid {
            self.cur += n;
        }
        (ret, valid)
    }

    /// Opens a window of exactly `winsize` bytes measured from the current
    /// offset.
    pub(crate) fn set_fit(&mut self, winsize: usize) -> ParseResult<()> {
        let remaining = self.abs - self.cur;
        if winsize > remaining {
            Err(ParseError::Window(WindowError::OpenWouldExceedBuffer {
                bytes_left: remaining,
                request: winsize,
            }))
        } else {
            self.frames.push_frame(self.cur + winsize)
        }
    }

    /// Tests whether the offset sits exactly on the innermost window target.
    ///
    /// Returns `false` when no window is open. An offset beyond the target is
    /// an implementation bug and reported as [`WindowError::OffsetOverflow`].
    pub(crate) fn test_target(&self) -> ParseResult<bool> {
        match self.frames.innermost() {
            None => Ok(false),
            Some(tgt) => match tgt.cmp(&self.cur) {
                std::cmp::Ordering::Equal => Ok(true),
                std::cmp::Ordering::Greater => Ok(false),
                std::cmp::Ordering::Less => {
                    Err(ParseError::Window(WindowError::OffsetOverflow {
                        excess: self.cur - tgt,
                    }))
                }
            },
        }
    }

    /// Closes the innermost window, requiring the offset to have landed
    /// exactly on its target.
    ///
    /// Residual bytes mean the declared content length of the container was
    /// not consumed in full; both that case and the absence of any open
    /// window are errors.
    pub(crate) fn enforce_target(&mut self) -> ParseResult<()> {
        match self.frames.pop() {
            None => Err(ParseError::Window(WindowError::CloseWithoutWindow)),
            Some(tgt) => match tgt.cmp(&self.cur) {
                std::cmp::Ordering::Equal => Ok(()),
                std::cmp::Ordering::Greater => {
                    Err(ParseError::Window(WindowError::CloseWithResidue {
                        residual: tgt - self.cur,
                    }))
                }
                std::cmp::Ordering::Less => {
                    Err(ParseError::Window(WindowError::OffsetOverflow {
                        excess: self.cur - tgt,
                    }))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_within_limit() {
        let mut off = ContextOffset::with_limit(4);
        assert_eq!(off.advance(3), (0, true));
        assert_eq!(off.advance(2), (3, false));
        assert_eq!(off.advance(1), (3, true));
        assert_eq!(off.index(), 4);
    }

    #[test]
    fn window_bounds_consumption() {
        let mut off = ContextOffset::with_limit(10);
        off.set_fit(4).unwrap();
        assert_eq!(off.limit(), 4);
        assert_eq!(off.advance(5), (0, false));
        assert_eq!(off.advance(4), (0, true));
        assert!(off.test_target().unwrap());
        off.enforce_target().unwrap();
        assert_eq!(off.limit(), 10);
    }

    #[test]
    fn close_with_residue_fails() {
        let mut off = ContextOffset::with_limit(10);
        off.set_fit(4).unwrap();
        let (_, ok) = off.advance(2);
        assert!(ok);
        assert_eq!(
            off.enforce_target(),
            Err(ParseError::Window(WindowError::CloseWithResidue {
                residual: 2
            }))
        );
    }

    #[test]
    fn nested_windows_must_fit() {
        let mut off = ContextOffset::with_limit(10);
        off.set_fit(4).unwrap();
        assert!(off.set_fit(5).is_err());
        off.set_fit(4).unwrap();
        assert_eq!(off.limit(), 4);
    }

    #[test]
    fn oversized_window_rejected() {
        let mut off = ContextOffset::with_limit(3);
        assert_eq!(
            off.set_fit(7),
            Err(ParseError::Window(WindowError::OpenWouldExceedBuffer {
                bytes_left: 3,
                request: 7
            }))
        );
    }
}
