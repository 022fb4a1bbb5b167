//! Validated URI string newtype
//!
//! The wire format distinguishes URI leaves from plain string leaves so that
//! a decoded URI is known to be at least structurally sound. [`Uri`] is the
//! in-memory form of that guarantee: a string that has passed validation at
//! construction time and is immutable afterwards.
//!
//! Validation is deliberately shallow. A `Uri` must carry an RFC 3986 scheme
//! (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )` followed by `:`) and its
//! body must be free of whitespace and control characters. Percent-encoding,
//! authority syntax, and scheme-specific rules are not checked; callers that
//! need full resolution semantics are expected to layer their own parser on
//! top of the validated text.

use std::convert::TryFrom;

use crate::error::UriError;

/// A structurally validated URI.
///
/// Construct through [`Uri::parse`], [`TryFrom`], or [`str::parse`]; every
/// path runs the same validation. The inner text is reachable via
/// [`as_str`](Uri::as_str) and the `Display`/`AsRef` impls.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize))]
#[repr(transparent)]
pub struct Uri(String);

impl Uri {
    /// Validates `text` and wraps it.
    pub fn parse(text: impl Into<String>) -> Result<Self, UriError> {
        let text = text.into();
        let scheme_len = match text.find(':') {
            Some(ix) => ix,
            None => return Err(UriError::MissingScheme(text)),
        };
        if !valid_scheme(&text[..scheme_len]) {
            return Err(UriError::IllegalScheme(text));
        }
        if let Some(at) = text
            .bytes()
            .position(|b| b.is_ascii_whitespace() || b.is_ascii_control())
        {
            return Err(UriError::IllegalCharacter { uri: text, at });
        }
        Ok(Self(text))
    }

    /// The validated URI text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The scheme portion, without the trailing `:`.
    pub fn scheme(&self) -> &str {
        // Position is guaranteed by construction.
        &self.0[..self.0.find(':').unwrap_or(0)]
    }

    /// Unwraps the inner string, discarding the validation guarantee.
    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }
}

fn valid_scheme(scheme: &str) -> bool {
    let mut bytes = scheme.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}

impl TryFrom<&str> for Uri {
    type Error = UriError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::parse(text)
    }
}

impl TryFrom<String> for Uri {
    type Error = UriError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse(text)
    }
}

impl std::str::FromStr for Uri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Uri {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "serde_impls")]
impl<'de> serde::Deserialize<'de> for Uri {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        Uri::parse(text).map_err(serde::de::Error::custom)
    }
}
