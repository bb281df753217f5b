//! Directory entry name decoding
//!
//! Entry names are stored on disk as UTF-16LE in a fixed 64-byte field together
//! with a byte length that counts the terminating null. Turning those bytes into
//! text is delegated to a [`NameDecoder`], so callers that need something other
//! than plain UTF-16 (legacy writers that stored codepage text, case folding,
//! transliteration) can plug their own in through [`OpenOptions`].
//!
//! [`OpenOptions`]: super::OpenOptions

use encoding_rs::UTF_16LE;

/// Converts the raw bytes of a directory entry name into text.
///
/// `raw` holds the first `name_len` bytes of the name field (clamped to the
/// field size), so it normally ends with a UTF-16 null terminator.
/// Returning `None` marks the name as undecodable; the entry is still
/// scanned but gets an empty name.
pub trait NameDecoder: Send + Sync {
    fn decode(&self, raw: &[u8]) -> Option<String>;
}

impl<F> NameDecoder for F
where
    F: Fn(&[u8]) -> Option<String> + Send + Sync,
{
    fn decode(&self, raw: &[u8]) -> Option<String> {
        self(raw)
    }
}

/// Default decoder: UTF-16LE with lossy replacement, trailing nulls removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf16LeNames;

impl NameDecoder for Utf16LeNames {
    fn decode(&self, raw: &[u8]) -> Option<String> {
        // A dangling odd byte cannot be part of a code unit
        let even = &raw[..raw.len() & !1];
        let (text, _had_errors) = UTF_16LE.decode_without_bom_handling(even);
        Some(text.trim_end_matches('\0').to_string())
    }
}
