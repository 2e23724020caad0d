//! Token escaping shared by the table files and the search widget.
//!
//! Tokens are lowercase. ASCII letters and digits pass through, non-ASCII
//! characters pass through unchanged, and every other ASCII character becomes
//! `_` followed by its code as two lowercase hex digits (`' '` → `_20`,
//! `'_'` → `_5f`, `'.'` → `_2e`).

use crate::error::EscapeError;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Converts display text (or a typed query) into its escaped token form.
pub fn escape_token(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || !c.is_ascii() {
            out.push(c);
        } else {
            let byte = c as u8;
            out.push('_');
            out.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
            out.push(char::from(HEX_DIGITS[usize::from(byte & 0x0f)]));
        }
    }
    out
}

/// Decodes an escaped token. `vlbi_5finit` becomes `vlbi_init`.
pub fn unescape_token(token: &str) -> Result<String, EscapeError> {
    if token.is_empty() {
        return Err(EscapeError::Empty);
    }

    let mut out = String::with_capacity(token.len());
    let mut chars = token.char_indices();

    while let Some((offset, c)) = chars.next() {
        match c {
            '_' => {
                let (Some((_, hi)), Some((_, lo))) = (chars.next(), chars.next()) else {
                    return Err(EscapeError::Truncated { offset });
                };
                let (Some(hi_value), Some(lo_value)) = (hex_value(hi), hex_value(lo)) else {
                    return Err(EscapeError::InvalidHex {
                        offset,
                        digits: format!("{hi}{lo}"),
                    });
                };
                let value = (hi_value << 4) | lo_value;
                if !value.is_ascii() {
                    return Err(EscapeError::NotAscii { offset, value });
                }
                out.push(char::from(value));
            }
            c if c.is_ascii_uppercase() => return Err(EscapeError::Uppercase { offset, ch: c }),
            c if c.is_ascii_alphanumeric() || !c.is_ascii() => out.push(c),
            c => return Err(EscapeError::Unescaped { offset, ch: c }),
        }
    }

    Ok(out)
}

/// Checks a token against the escape-safe character set.
///
/// Non-ASCII characters are legal in tokens written by newer generators; pass
/// `allow_non_ascii = false` to restrict to `[a-z0-9]` plus `_xx` escapes.
pub fn is_valid_token(token: &str, allow_non_ascii: bool) -> bool {
    (allow_non_ascii || token.is_ascii()) && unescape_token(token).is_ok()
}

/// First character of the decoded token, which selects the bucket file that
/// holds the entry.
pub fn bucket_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match chars.next()? {
        '_' => {
            let hi = hex_value(chars.next()?)?;
            let lo = hex_value(chars.next()?)?;
            Some(char::from((hi << 4) | lo))
        }
        c => Some(c),
    }
}

fn hex_value(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        'a'..='f' => Some(c as u8 - b'a' + 10),
        _ => None,
    }
}
