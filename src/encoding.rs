//! Byte-order mark handling and UTF-8 validation.

use simdutf8::basic::from_utf8;

/// The UTF-8 byte-order mark.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Check if the given bytes are valid UTF-8 (SIMD-accelerated).
pub fn is_utf8(data: &[u8]) -> bool {
    from_utf8(data).is_ok()
}

/// Check if the data starts with a UTF-8 BOM.
pub fn has_utf8_bom(data: &[u8]) -> bool {
    data.starts_with(UTF8_BOM)
}

/// Length of the leading BOM: 3 or 0.
pub fn bom_len(data: &[u8]) -> usize {
    if has_utf8_bom(data) { UTF8_BOM.len() } else { 0 }
}

/// Skip the UTF-8 BOM if present and return the remaining data.
pub fn skip_bom(data: &[u8]) -> &[u8] {
    &data[bom_len(data)..]
}

/// Inspect the BOM and validity of a sample.
///
/// A sample cut in the middle of a multi-byte sequence is still reported
/// as UTF-8.
pub fn detect_encoding(data: &[u8]) -> EncodingInfo {
    // error_len() is None when the input ends inside a character
    let is_utf8 = match simdutf8::compat::from_utf8(skip_bom(data)) {
        Ok(_) => true,
        Err(err) => err.error_len().is_none(),
    };
    EncodingInfo {
        is_utf8,
        has_bom: has_utf8_bom(data),
    }
}

/// BOM and validity of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingInfo {
    /// Whether the data is valid UTF-8.
    pub is_utf8: bool,
    /// Whether a UTF-8 BOM was present.
    pub has_bom: bool,
}
