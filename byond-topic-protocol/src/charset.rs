//! CP1251 text conversion.
//!
//! BYOND servers read topics and write string replies in the Windows-1251
//! single-byte code page. The code page is fixed for the whole protocol and
//! is not negotiated.

use encoding_rs::{EncoderResult, WINDOWS_1251};
use std::borrow::Cow;

/// Byte written for characters that CP1251 cannot represent.
pub const REPLACEMENT_BYTE: u8 = b'?';

/// Encodes text into CP1251, writing `?` for unmappable characters.
pub fn encode(text: &str) -> Vec<u8> {
    let mut encoder = WINDOWS_1251.new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut chunk = [0u8; 256];
    let mut rest = text;

    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(rest, &mut chunk, true);
        out.extend_from_slice(&chunk[..written]);
        rest = &rest[read..];

        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => continue,
            EncoderResult::Unmappable(_) => out.push(REPLACEMENT_BYTE),
        }
    }

    out
}

/// Decodes CP1251 bytes. Every byte maps to a character, so this never fails.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let (text, _) = WINDOWS_1251.decode_without_bom_handling(bytes);
    text
}
