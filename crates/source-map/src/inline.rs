//! Inline `sourceMappingURL` data-URI comments.

use crate::map::SourceMapV3;

/// The comment prefix for an inline base64 source map.
pub const DATA_URI_PREFIX: &str = "//# sourceMappingURL=data:application/json;base64,";

const BASE64_DIGITS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Renders a map as a trailing inline comment line.
pub fn inline_comment(map: &SourceMapV3) -> serde_json::Result<String> {
    let json = map.to_json()?;
    Ok(format!("{DATA_URI_PREFIX}{}", base64_encode(json.as_bytes())))
}

/// Extracts and decodes the map from the last inline comment in `code`.
///
/// Returns `None` if no inline comment is present or the payload does not
/// decode to a valid map.
pub fn decode_inline_comment(code: &str) -> Option<SourceMapV3> {
    let line = code
        .lines()
        .rev()
        .find(|line| line.trim_start().starts_with(DATA_URI_PREFIX))?;
    let payload = line.trim_start().trim_start_matches(DATA_URI_PREFIX).trim_end();
    let bytes = base64_decode(payload)?;
    let json = String::from_utf8(bytes).ok()?;
    SourceMapV3::from_json(&json).ok()
}

fn base64_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);

    for chunk in bytes.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;

        out.push(BASE64_DIGITS[(triple >> 18) as usize & 63] as char);
        out.push(BASE64_DIGITS[(triple >> 12) as usize & 63] as char);
        out.push(if chunk.len() > 1 {
            BASE64_DIGITS[(triple >> 6) as usize & 63] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            BASE64_DIGITS[triple as usize & 63] as char
        } else {
            '='
        });
    }

    out
}

fn base64_decode(text: &str) -> Option<Vec<u8>> {
    let text = text.trim_end_matches('=');
    let mut out = Vec::with_capacity(text.len() * 3 / 4);
    let mut buffer = 0u32;
    let mut bits = 0u32;

    for byte in text.bytes() {
        let digit = BASE64_DIGITS.iter().position(|&d| d == byte)? as u32;
        buffer = (buffer << 6) | digit;
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_known_vectors() {
        assert_eq!(base64_encode(b""), "");
        assert_eq!(base64_encode(b"f"), "Zg==");
        assert_eq!(base64_encode(b"fo"), "Zm8=");
        assert_eq!(base64_encode(b"foo"), "Zm9v");
        assert_eq!(base64_encode(b"foobar"), "Zm9vYmFy");
    }

    #[test]
    fn test_base64_round_trip() {
        let data = br#"{"version":3,"sources":["a.ts"]}"#;
        let encoded = base64_encode(data);
        assert_eq!(base64_decode(&encoded).unwrap(), data.to_vec());
    }

    #[test]
    fn test_inline_comment_round_trip() {
        let map = SourceMapV3::new("a.ts", "let x = 1", "AAAA".to_string());
        let comment = inline_comment(&map).unwrap();
        assert!(comment.starts_with(DATA_URI_PREFIX));

        let code = format!("var x = 1;\n{comment}");
        let decoded = decode_inline_comment(&code).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_decode_without_comment() {
        assert_eq!(decode_inline_comment("var x = 1;"), None);
    }
}
