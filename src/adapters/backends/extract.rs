//! First-JSON extraction from free-form agent output.
//!
//! Agents that speak plain text rarely return bare JSON: the value is
//! usually wrapped in prose or a code fence. The scan starts at each `{` or
//! `[` and tries progressively shorter suffix-trimmed chunks until one
//! parses, returning the first JSON value found in document order.

use serde_json::Value;

/// Decode raw process output, tolerating UTF-16 and UTF-8 BOMs.
pub fn decode_output(raw: &[u8]) -> String {
    if raw.starts_with(&[0xFF, 0xFE]) || raw.starts_with(&[0xFE, 0xFF]) {
        let little_endian = raw.starts_with(&[0xFF, 0xFE]);
        let units: Vec<u16> = raw[2..]
            .chunks_exact(2)
            .map(|pair| {
                if little_endian {
                    u16::from_le_bytes([pair[0], pair[1]])
                } else {
                    u16::from_be_bytes([pair[0], pair[1]])
                }
            })
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(stripped) = raw.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(stripped).into_owned()
    } else {
        String::from_utf8_lossy(raw).into_owned()
    }
}

/// Extract the first parseable JSON object or array from text.
pub fn extract_first_json(text: &str) -> Option<Value> {
    for (start, _) in text.match_indices(['{', '[']) {
        let candidate = &text[start..];
        // Trim from the end until the chunk parses; bounded by the
        // remaining char boundaries.
        let mut end = candidate.len();
        while end > 0 {
            if candidate.is_char_boundary(end) {
                if let Ok(value) = serde_json::from_str::<Value>(&candidate[..end]) {
                    return Some(value);
                }
            }
            end -= 1;
        }
    }
    None
}
