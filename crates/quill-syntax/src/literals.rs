use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LiteralError {
    pub message: String,
    /// Byte range within the provided literal text (not file offsets).
    pub span: Range<usize>,
}

fn err(message: impl Into<String>, span: Range<usize>) -> LiteralError {
    LiteralError {
        message: message.into(),
        span,
    }
}

/// Decode a complete string literal, including surrounding quotes.
pub fn unescape_string_literal(text: &str) -> Result<String, LiteralError> {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| err("string literal is missing quotes", 0..text.len()))?;
    decode_escapes(inner)
}

/// Decode the *contents* of a string literal prefix that may not be
/// terminated. `text` starts with the opening quote; everything after it is
/// decoded. Used by string-literal completion, where the cursor can sit in
/// the middle of an escape sequence (the partial escape is dropped).
pub fn unescape_string_prefix(text: &str) -> String {
    let inner = text.strip_prefix('"').unwrap_or(text);
    decode_escapes_lossy(inner)
}

/// Decode a text block, including the `"""` delimiters. Incidental
/// whitespace stripping follows the common-prefix rule; normalization of
/// line terminators to `\n` is applied first.
pub fn unescape_text_block(text: &str) -> Result<String, LiteralError> {
    let inner = text
        .strip_prefix("\"\"\"")
        .and_then(|t| t.strip_suffix("\"\"\""))
        .ok_or_else(|| err("text block is missing delimiters", 0..text.len()))?;
    let inner = inner.strip_prefix("\r\n").or_else(|| inner.strip_prefix('\n')).unwrap_or(inner);

    let lines: Vec<&str> = inner.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let stripped: Vec<&str> = lines
        .iter()
        .map(|l| if l.len() >= indent { &l[indent..] } else { l.trim_start() })
        .collect();
    decode_escapes(&stripped.join("\n"))
}

/// Decode an integer literal (decimal, hex, octal, binary), honoring digit
/// separators and an optional `l`/`L` suffix. Returns the value as `i64`;
/// overflow of the unsigned magnitude is an error, matching the rule that a
/// literal's magnitude must fit the 64-bit two's-complement range.
pub fn parse_int_literal(text: &str) -> Result<i64, LiteralError> {
    let full = text.len();
    let text = text
        .strip_suffix(['l', 'L'])
        .unwrap_or(text);
    let (digits, radix) = if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (rest, 16)
    } else if let Some(rest) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        (rest, 2)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };
    if digits.is_empty() {
        return Err(err("integer literal has no digits", 0..full));
    }
    let mut value = 0u64;
    for c in digits.chars() {
        if c == '_' {
            continue;
        }
        let digit = c
            .to_digit(radix)
            .ok_or_else(|| err(format!("invalid digit `{c}` for radix {radix}"), 0..full))?;
        value = value
            .checked_mul(u64::from(radix))
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or_else(|| err("integer literal out of range", 0..full))?;
    }
    Ok(value as i64)
}

fn decode_escapes(text: &str) -> Result<String, LiteralError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some((_, esc)) = chars.next() else {
            return Err(err("dangling escape", idx..text.len()));
        };
        match esc {
            'b' => out.push('\u{0008}'),
            's' => out.push(' '),
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'f' => out.push('\u{000C}'),
            'r' => out.push('\r'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\\' => out.push('\\'),
            '\n' => {} // line continuation (text blocks)
            'u' => {
                let mut value = 0u32;
                for _ in 0..4 {
                    let Some((_, h)) = chars.next() else {
                        return Err(err("truncated unicode escape", idx..text.len()));
                    };
                    let digit = h
                        .to_digit(16)
                        .ok_or_else(|| err("invalid unicode escape digit", idx..text.len()))?;
                    value = value * 16 + digit;
                }
                let decoded = char::from_u32(value)
                    .ok_or_else(|| err("invalid unicode scalar", idx..text.len()))?;
                out.push(decoded);
            }
            d if d.is_ascii_digit() => {
                // Octal escape, up to three digits.
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek() {
                        Some(&(_, n)) if n.is_digit(8) => {
                            value = value * 8 + n.to_digit(8).unwrap_or(0);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
            }
            other => return Err(err(format!("unknown escape `\\{other}`"), idx..idx + 2)),
        }
    }
    Ok(out)
}

fn decode_escapes_lossy(text: &str) -> String {
    // Trim a trailing partial escape so `decode_escapes` sees complete
    // sequences only, then fall back to the raw text on any other error.
    let mut end = text.len();
    if let Some(pos) = text.rfind('\\') {
        let tail = &text[pos..];
        let complete = matches!(tail.len(), 2..) && !tail.starts_with("\\u")
            || tail.starts_with("\\u") && tail.len() >= 6;
        if !complete {
            end = pos;
        }
    }
    decode_escapes(&text[..end]).unwrap_or_else(|_| text[..end].to_string())
}
