//! Hex formatting and parsing helpers
//!
//! Serialized documents are routinely quoted in error output, test
//! expectations, and trace logs as undelimited hex blobs. These helpers and
//! the [`hex!`](crate::hex) macro are the single implementation of that
//! convention.

use std::fmt::Write;

use crate::error::HexError;

/// Formats a sequence of bytes as a `String` containing a hexadecimal blob
///
/// # Examples
///
/// ```
/// # use cereal::util::hex_of_bytes;
/// assert_eq!(hex_of_bytes(vec![0xde, 0xad, 0xbe, 0xef]), String::from("deadbeef"));
/// ```
#[must_use]
pub fn hex_of_bytes<T>(val: T) -> String
where
    T: AsRef<[u8]>,
{
    let bytes = val.as_ref();
    let mut hex: String = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        // Writing to a String cannot fail.
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Attempts to parse a string-like value as a hexadecimal blob, returning
/// the byte sequence it encodes.
///
/// # Examples
///
/// ```
/// # use cereal::util::bytes_of_hex;
/// assert_eq!(Ok(vec![0xde, 0xad, 0xbe, 0xef]), bytes_of_hex("deadbeef"));
/// ```
pub fn bytes_of_hex<T>(src: &T) -> Result<Vec<u8>, HexError>
where
    T: AsRef<str> + ?Sized,
{
    let src: &str = src.as_ref();
    if src.is_empty() {
        return Ok(Vec::new());
    }
    if src.len() % 2 != 0 {
        return Err(HexError::OddParity(src.to_owned()));
    }

    let n = src.len() / 2;
    let mut dst = Vec::with_capacity(n);
    for ix in 0..n {
        match u8::from_str_radix(&src[ix * 2..(ix + 1) * 2], 16) {
            Ok(word) => dst.push(word),
            Err(_) => return Err(HexError::NonHex(src.to_owned())),
        }
    }
    Ok(dst)
}

/// Converts a hex-string literal or expression into its `Vec<u8>` byte
/// sequence, panicking on malformed input.
///
/// Intended for tests and constant buffers, where the argument is known
/// valid at the call site.
#[macro_export]
macro_rules! hex {
    ($s:expr) => {{
        $crate::util::bytes_of_hex($s).expect("hex! macro encountered error")
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        for blob in ["", "00", "deadbeef", "0123456789abcdef"] {
            assert_eq!(hex_of_bytes(bytes_of_hex(blob).unwrap()), blob);
        }
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(
            bytes_of_hex("abc"),
            Err(HexError::OddParity("abc".to_owned()))
        );
        assert_eq!(
            bytes_of_hex("zz"),
            Err(HexError::NonHex("zz".to_owned()))
        );
    }
}
