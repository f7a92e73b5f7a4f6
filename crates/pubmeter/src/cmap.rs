//! ToUnicode CMap parsing.
//!
//! Only the `bfchar` and `bfrange` sections matter for text extraction;
//! codespace declarations are ignored because the code width is taken from
//! the font subtype instead.

use std::collections::HashMap;

/// Mapping from character codes to Unicode strings.
#[derive(Debug, Default, Clone)]
pub struct ToUnicodeMap {
    entries: HashMap<u32, String>,
}

impl ToUnicodeMap {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.entries.get(&code).map(String::as_str)
    }

    /// Parse the decoded bytes of a ToUnicode CMap stream.
    ///
    /// Unparseable sections are skipped silently; a partially usable map is
    /// better than none.
    pub fn parse(data: &[u8]) -> Self {
        let text = String::from_utf8_lossy(data);
        let mut entries = HashMap::new();

        for section in sections(&text, "beginbfchar", "endbfchar") {
            let hex: Vec<&str> = hex_tokens(section);
            for pair in hex.chunks_exact(2) {
                if let (Some(code), Some(dst)) = (hex_to_u32(pair[0]), hex_to_utf16(pair[1])) {
                    entries.insert(code, dst);
                }
            }
        }

        for section in sections(&text, "beginbfrange", "endbfrange") {
            parse_bfrange(section, &mut entries);
        }

        Self { entries }
    }
}

/// All slices between `start`/`end` keyword pairs, in order.
fn sections<'a>(text: &'a str, start: &'a str, end: &'a str) -> impl Iterator<Item = &'a str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let s = rest.find(start)? + start.len();
        let e = rest[s..].find(end)? + s;
        let section = &rest[s..e];
        rest = &rest[e + end.len()..];
        Some(section)
    })
}

fn parse_bfrange(section: &str, entries: &mut HashMap<u32, String>) {
    let mut rest = section;
    while let Some(open) = rest.find('<') {
        rest = &rest[open..];
        let Some((lo, after)) = take_hex(rest) else { break };
        rest = after;
        let Some((hi, after)) = take_hex(rest) else { break };
        rest = after;

        let (Some(lo), Some(hi)) = (hex_to_u32(lo), hex_to_u32(hi)) else {
            continue;
        };

        let trimmed = rest.trim_start();
        if trimmed.starts_with('[') {
            // Array form: one destination string per code in the range
            let Some(close) = trimmed.find(']') else { break };
            let array = &trimmed[1..close];
            for (offset, token) in hex_tokens(array).into_iter().enumerate() {
                let code = lo + offset as u32;
                if code > hi {
                    break;
                }
                if let Some(dst) = hex_to_utf16(token) {
                    entries.insert(code, dst);
                }
            }
            rest = &trimmed[close + 1..];
        } else if let Some((dst, after)) = take_hex(trimmed) {
            // Scalar form: destination increments along the range
            rest = after;
            let Some(base) = hex_to_u32(dst) else { continue };
            // Clamp runaway ranges from malformed files
            let hi = hi.min(lo.saturating_add(0xFFFF));
            for code in lo..=hi {
                let value = base + (code - lo);
                if let Some(c) = char::from_u32(value) {
                    entries.insert(code, c.to_string());
                }
            }
        } else {
            break;
        }
    }
}

/// All `<...>` hex token contents in a slice.
fn hex_tokens(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some((token, after)) = take_hex(rest) {
        out.push(token);
        rest = after;
    }
    out
}

/// Consume the next `<...>` token, returning its contents and the remainder.
fn take_hex(text: &str) -> Option<(&str, &str)> {
    let open = text.find('<')?;
    let close = text[open..].find('>')? + open;
    Some((&text[open + 1..close], &text[close + 1..]))
}

fn hex_to_u32(hex: &str) -> Option<u32> {
    let hex = hex.trim();
    if hex.is_empty() || hex.len() > 8 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Decode a destination hex string as big-endian UTF-16 code units.
fn hex_to_utf16(hex: &str) -> Option<String> {
    let hex = hex.trim();
    if hex.len() % 4 != 0 || hex.is_empty() {
        // Tolerate single-byte destinations some producers emit
        return hex_to_u32(hex)
            .and_then(char::from_u32)
            .map(|c| c.to_string());
    }
    let units: Vec<u16> = hex
        .as_bytes()
        .chunks_exact(4)
        .map(|c| u16::from_str_radix(std::str::from_utf8(c).ok()?, 16).ok())
        .collect::<Option<_>>()?;
    Some(String::from_utf16_lossy(&units))
}
