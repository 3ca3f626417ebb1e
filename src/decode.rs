//! Incremental UTF-8 decoding for streaming byte sources.
//!
//! A report is read in fixed-size byte chunks which can split a multi-byte
//! character anywhere. [`Utf8Decoder`] keeps the incomplete suffix of each
//! chunk (at most three bytes) and completes it from the next one, so the
//! decoded text stream is identical no matter how the bytes were chunked.
//!
//! Decoding is strict. The first invalid sequence aborts the parse with
//! [`Error::InvalidUtf8`] carrying the absolute stream offset of the
//! sequence start; input is never repaired with replacement characters.

use crate::error::{Error, Result};

/// A stateful strict UTF-8 decoder for chunked byte input.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Incomplete sequence suffix carried from the previous chunk.
    carry: Vec<u8>,
    /// Total bytes fed through [`Utf8Decoder::decode`] so far.
    seen: u64,
}

impl Utf8Decoder {
    /// Creates a decoder positioned at stream offset zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the next chunk, returning the text it completes.
    ///
    /// The returned string may be empty even for non-empty input when the
    /// chunk only extends a split sequence. An invalid sequence fails the
    /// whole call; none of the chunk's text is returned in that case.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<String> {
        let mut out = String::new();
        let mut rest = bytes;
        let mut pos = 0u64;

        if !self.carry.is_empty() {
            let carry_len = self.carry.len();
            let carry_start = self.seen - carry_len as u64;
            let expected = utf8_seq_len(self.carry[0]);
            if expected == 0 {
                return Err(Error::InvalidUtf8 { offset: carry_start });
            }
            let needed = expected - carry_len;
            if rest.len() < needed {
                self.carry.extend_from_slice(rest);
                self.seen += bytes.len() as u64;
                return Ok(out);
            }
            let mut scratch = [0u8; 4];
            scratch[..carry_len].copy_from_slice(&self.carry);
            scratch[carry_len..expected].copy_from_slice(&rest[..needed]);
            match std::str::from_utf8(&scratch[..expected]) {
                Ok(s) => out.push_str(s),
                Err(_) => return Err(Error::InvalidUtf8 { offset: carry_start }),
            }
            self.carry.clear();
            rest = &rest[needed..];
            pos = needed as u64;
        }

        match std::str::from_utf8(rest) {
            Ok(s) => out.push_str(s),
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                match e.error_len() {
                    Some(_) => {
                        return Err(Error::InvalidUtf8 {
                            offset: self.seen + pos + valid_up_to as u64,
                        });
                    }
                    None => {
                        if valid_up_to > 0 {
                            out.push_str(
                                std::str::from_utf8(&rest[..valid_up_to])
                                    .expect("valid UTF-8 prefix"),
                            );
                        }
                        self.carry.extend_from_slice(&rest[valid_up_to..]);
                    }
                }
            }
        }

        self.seen += bytes.len() as u64;
        Ok(out)
    }

    /// Verifies the stream ended on a character boundary.
    ///
    /// An incomplete sequence still pending at end of stream is an error,
    /// reported at the offset where the sequence began.
    pub fn finish(&mut self) -> Result<()> {
        if self.carry.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidUtf8 {
                offset: self.seen - self.carry.len() as u64,
            })
        }
    }
}

/// Declared sequence length for a UTF-8 lead byte, 0 if the byte cannot
/// start a sequence.
fn utf8_seq_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_offset(err: Error) -> u64 {
        match err {
            Error::InvalidUtf8 { offset } => offset,
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_ascii_passthrough() {
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.decode(b"hello").unwrap(), "hello");
        assert_eq!(dec.decode(b"").unwrap(), "");
        assert!(dec.finish().is_ok());
    }

    #[test]
    fn test_two_byte_sequence_split_across_chunks() {
        let mut dec = Utf8Decoder::new();
        // "×" is C3 97
        assert_eq!(dec.decode(&[0xC3]).unwrap(), "");
        assert_eq!(dec.decode(&[0x97]).unwrap(), "×");
        assert!(dec.finish().is_ok());
    }

    #[test]
    fn test_four_byte_sequence_split_with_trailing_ascii() {
        let mut dec = Utf8Decoder::new();
        // "😀" is F0 9F 98 80
        assert_eq!(dec.decode(&[0xF0, 0x9F]).unwrap(), "");
        assert_eq!(dec.decode(&[0x98, 0x80, b'!']).unwrap(), "😀!");
    }

    #[test]
    fn test_carry_recreated_from_trailing_incomplete_sequence() {
        let mut dec = Utf8Decoder::new();
        // "€" is E2 82 AC; finish one and start another
        assert_eq!(dec.decode(&[0xE2]).unwrap(), "");
        assert_eq!(dec.decode(&[0x82, 0xAC, 0xE2]).unwrap(), "€");
        assert_eq!(dec.decode(&[0x82, 0xAC]).unwrap(), "€");
        assert!(dec.finish().is_ok());
    }

    #[test]
    fn test_invalid_byte_reports_stream_offset() {
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.decode(b"abcd").unwrap(), "abcd");
        let err = dec.decode(&[b'e', 0xFF, b'f']).unwrap_err();
        assert_eq!(invalid_offset(err), 5);
    }

    #[test]
    fn test_lone_continuation_byte_is_invalid() {
        let mut dec = Utf8Decoder::new();
        let err = dec.decode(&[0x80]).unwrap_err();
        assert_eq!(invalid_offset(err), 0);
    }

    #[test]
    fn test_overlong_encoding_is_invalid() {
        let mut dec = Utf8Decoder::new();
        // C0 80 is an overlong NUL
        let err = dec.decode(&[0xC0, 0x80]).unwrap_err();
        assert_eq!(invalid_offset(err), 0);
    }

    #[test]
    fn test_broken_carry_completion_points_at_sequence_start() {
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.decode(b"ok").unwrap(), "ok");
        assert_eq!(dec.decode(&[0xE2, 0x82]).unwrap(), "");
        // 'A' cannot continue the pending three-byte sequence
        let err = dec.decode(&[b'A']).unwrap_err();
        assert_eq!(invalid_offset(err), 2);
    }

    #[test]
    fn test_finish_rejects_pending_carry() {
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.decode(b"abc").unwrap(), "abc");
        assert_eq!(dec.decode(&[0xE2, 0x82]).unwrap(), "");
        let err = dec.finish().unwrap_err();
        assert_eq!(invalid_offset(err), 3);
    }

    #[test]
    fn test_carry_grown_over_single_byte_chunks() {
        let mut dec = Utf8Decoder::new();
        for b in "€".as_bytes() {
            let _ = dec.decode(std::slice::from_ref(b)).unwrap();
        }
        // the last call completed the character
        let mut dec2 = Utf8Decoder::new();
        assert_eq!(dec2.decode(&[0xE2]).unwrap(), "");
        assert_eq!(dec2.decode(&[0x82]).unwrap(), "");
        assert_eq!(dec2.decode(&[0xAC]).unwrap(), "€");
    }

    #[test]
    fn test_mixed_text_chunked_at_every_offset() {
        let text = "res=π <a>×·€ 😀</a>";
        let bytes = text.as_bytes();
        for split in 0..=bytes.len() {
            let mut dec = Utf8Decoder::new();
            let mut out = String::new();
            out.push_str(&dec.decode(&bytes[..split]).unwrap());
            out.push_str(&dec.decode(&bytes[split..]).unwrap());
            assert!(dec.finish().is_ok());
            assert_eq!(out, text, "split at {}", split);
        }
    }
}
