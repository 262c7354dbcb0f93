//! # Visual encoder and decoder
//!
//! This crate provides an `Encoder` and a `Decoder` for the `vis` encoding, a reversible
//! representation of arbitrary bytes as printable ASCII. Printable bytes are copied, everything
//! else is written as a backslash escape:
//!
//!  * `\\` for a backslash,
//!  * `\s`, `\t`, `\n`, `\r`, `\v`, `\f` for the whitespace bytes,
//!  * `\ooo`, three octal digits, for any other byte.
//!
//! The encoder always escapes whitespace, the `VIS_WHITE` style of `vis(3)`, so its output never
//! contains a raw space, control character or byte with the high bit set. The decoder
//! additionally understands the meta and control forms (`\M-C`, `\M^C`, `\^C`) that the BSD
//! implementation emits by default.
//!
//! Exemplary use of the one-shot functions:
//!
//! ```
//! let encoded = vis::encode(b"hello world\x07");
//! assert_eq!(encoded, r"hello\sworld\007");
//!
//! let decoded = vis::decode(&encoded).unwrap();
//! assert_eq!(decoded, b"hello world\x07");
//! ```
//!
//! And of the streaming encoder:
//!
//! ```
//! use vis::encode::Encoder;
//! let data = b"a\tb";
//! let mut encoded = vec![];
//!
//! let mut enc = Encoder::new();
//! let result = enc.into_stream(&mut encoded).encode_all(&data[..]);
//! result.status.unwrap();
//! assert_eq!(encoded, br"a\tb");
//! ```
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use crate::alloc::{string::String, vec::Vec};

/// The escape character.
pub(crate) const ESCAPE: u8 = b'\\';

/// The longest escape, `\ooo`.
pub(crate) const MAX_ESCAPE_LEN: usize = 4;

/// Whitespace bytes and the letter that names each of them after a backslash.
///
/// Both directions of the codec consult this one table.
pub(crate) const MNEMONICS: [(u8, u8); 6] = [
    (b' ', b's'),
    (b'\t', b't'),
    (b'\n', b'n'),
    (b'\r', b'r'),
    (0x0b, b'v'),
    (0x0c, b'f'),
];

/// The mnemonic letter for a byte, if it has one.
pub(crate) fn mnemonic_of(byte: u8) -> Option<u8> {
    MNEMONICS
        .iter()
        .find(|&&(raw, _)| raw == byte)
        .map(|&(_, letter)| letter)
}

/// The byte named by a mnemonic letter.
pub(crate) fn byte_of_mnemonic(letter: u8) -> Option<u8> {
    MNEMONICS
        .iter()
        .find(|&&(_, name)| name == letter)
        .map(|&(raw, _)| raw)
}

/// Bytes that are copied to the encoded text unchanged.
pub(crate) fn is_literal(byte: u8) -> bool {
    byte.is_ascii_graphic() && byte != ESCAPE
}

/// The state of a streaming en- or decoder after a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use = "Contains a status with potential error information"]
pub enum VisStatus {
    /// Everything went well.
    Ok,
    /// No bytes were read or written, there is nothing left to do until more input arrives.
    NoProgress,
    /// The input was marked as finished and all of it has been processed.
    Done,
}

/// The error kind after unsuccessful decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum DecodeError {
    /// The input ended inside of an escape sequence.
    #[error("truncated escape sequence at end of input")]
    TruncatedEscape,
    /// A backslash is followed by something that does not form any escape.
    #[error("invalid escape sequence")]
    InvalidEscape,
}

/// The result of a buffer-to-buffer coding call.
#[derive(Debug)]
pub struct StreamResult {
    /// The number of bytes consumed from the input buffer.
    pub consumed_in: usize,
    /// The number of bytes written into the output buffer.
    pub consumed_out: usize,
    /// The status after returning from the call.
    pub status: Result<VisStatus, DecodeError>,
}

/// The result of coding a whole reader into a writer.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct AllResult {
    /// The total number of bytes consumed from the reader.
    pub bytes_read: usize,
    /// The total number of bytes written into the writer.
    pub bytes_written: usize,
    /// The final status of the operation.
    pub status: std::io::Result<()>,
}

/// The exact length of `encode(data)`.
pub fn encoded_len(data: &[u8]) -> usize {
    data.iter()
        .map(|&byte| encode::Escape::of(byte).len())
        .sum()
}

/// Encode a byte sequence into printable text.
///
/// This never fails, the output is at most four times as long as the input.
#[cfg(feature = "alloc")]
pub fn encode(data: &[u8]) -> String {
    let mut text = String::with_capacity(encoded_len(data));
    for &byte in data {
        let escape = encode::Escape::of(byte);
        // Every escape consists of printable ASCII only.
        text.extend(escape.as_bytes().iter().map(|&ch| char::from(ch)));
    }
    text
}

/// Decode text produced by [`encode`] back into the original bytes.
///
/// Decoding is all or nothing: on error no partially decoded data is returned.
///
/// [`encode`]: fn.encode.html
#[cfg(feature = "alloc")]
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    decode_bytes(text.as_bytes())
}

/// Decode encoded text given as raw bytes, which need not be valid UTF-8.
#[cfg(feature = "alloc")]
pub fn decode_bytes(text: &[u8]) -> Result<Vec<u8>, DecodeError> {
    // Every escape shrinks, the output is never longer than the input.
    let mut out = alloc::vec![0; text.len()];
    let mut decoder = decode::Decoder::new();
    decoder.finish();

    let result = decoder.decode_bytes(text, &mut out);
    match result.status? {
        VisStatus::Done => {
            out.truncate(result.consumed_out);
            Ok(out)
        }
        // With room for all output the decoder always reaches the end.
        VisStatus::Ok | VisStatus::NoProgress => Err(DecodeError::TruncatedEscape),
    }
}

pub mod decode;
pub mod encode;

#[cfg(test)]
mod tests {
    use super::{byte_of_mnemonic, is_literal, mnemonic_of, MNEMONICS};

    #[test]
    fn mnemonic_table_is_a_bijection() {
        for &(raw, letter) in MNEMONICS.iter() {
            assert_eq!(mnemonic_of(raw), Some(letter));
            assert_eq!(byte_of_mnemonic(letter), Some(raw));
            assert!(!is_literal(raw));
            assert!(!letter.is_ascii_digit());
        }
    }

    #[test]
    fn literal_class() {
        assert!(is_literal(b'a'));
        assert!(is_literal(b'~'));
        assert!(!is_literal(b' '));
        assert!(!is_literal(b'\\'));
        assert!(!is_literal(0x7f));
        assert!(!is_literal(0x80));
    }
}
