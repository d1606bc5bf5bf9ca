//! Content-Disposition header handling (disposition type, filename and filename*).

/// True when the header marks the response as a download rather than a page.
///
/// Only the disposition type is checked: `attachment`, case-insensitive, with
/// or without parameters.
pub fn is_attachment(header_value: &str) -> bool {
    let disposition = header_value.split(';').next().unwrap_or("").trim();
    disposition.eq_ignore_ascii_case("attachment")
}

/// Extracts the filename from a raw Content-Disposition header value.
///
/// Supports:
/// - `filename="value"` (quoted, may contain `;`, backslash escapes removed)
/// - `filename=value` (token)
/// - `filename*=UTF-8''percent-encoded` and `ISO-8859-1''...` (RFC 5987)
///
/// `filename*` takes precedence when both are present.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut plain: Option<String> = None;

    for (name, value) in params(header_value) {
        if name.eq_ignore_ascii_case("filename*") {
            if let Some(decoded) = decode_ext_value(&value) {
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
        } else if name.eq_ignore_ascii_case("filename") && !value.is_empty() {
            plain = Some(value);
        }
    }

    plain
}

/// Splits the parameters after the disposition type, honouring quoted strings.
fn params(header_value: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut rest = match header_value.split_once(';') {
        Some((_, params)) => params,
        None => return out,
    };

    loop {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_whitespace());
        if rest.is_empty() {
            break;
        }
        let Some(eq) = rest.find('=') else {
            break;
        };
        let name = rest[..eq].trim().to_string();
        let after = rest[eq + 1..].trim_start();

        let (value, remaining) = if let Some(quoted) = after.strip_prefix('"') {
            unquote(quoted)
        } else {
            let end = after.find(';').unwrap_or(after.len());
            (after[..end].trim().to_string(), &after[end..])
        };
        out.push((name, value));
        rest = remaining;
    }
    out
}

/// Reads a quoted-string body (after the opening quote). Returns the value and
/// the input that follows the closing quote.
fn unquote(s: &str) -> (String, &str) {
    let mut value = String::with_capacity(s.len());
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, next)) = chars.next() {
                    value.push(next);
                }
            }
            '"' => return (value, &s[i + 1..]),
            _ => value.push(c),
        }
    }
    (value, "")
}

/// Decodes an RFC 5987 ext-value: `charset'lang'pct-encoded`.
fn decode_ext_value(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _lang = parts.next()?;
    let encoded = parts.next()?;

    if charset.eq_ignore_ascii_case("utf-8") {
        Some(percent_decode(encoded))
    } else if charset.eq_ignore_ascii_case("iso-8859-1") {
        Some(percent_decode_bytes(encoded).into_iter().map(char::from).collect())
    } else {
        None
    }
}

/// Percent-decodes `input` as UTF-8, replacing invalid sequences.
pub(super) fn percent_decode(input: &str) -> String {
    String::from_utf8_lossy(&percent_decode_bytes(input)).into_owned()
}

fn percent_decode_bytes(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let (Some(h), Some(l)) = (
                bytes.get(i + 1).copied().and_then(hex_digit),
                bytes.get(i + 2).copied().and_then(hex_digit),
            ) {
                out.push(h << 4 | l);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
