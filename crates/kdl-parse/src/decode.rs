//! Decoding of string, number and keyword tokens into [`Value`]s.
//!
//! Every function here is pure: the same token text always decodes to the
//! same value or the same error. Error spans point at the exact bytes at
//! fault, in the coordinates of the original source.

use std::borrow::Cow;

use kdl_tokenizer::{is_newline, is_whitespace};

use crate::{ParseError, ParseErrorKind, Radix, Span, Token, TokenKind, Value};

fn error<T>(kind: ParseErrorKind, start: u32, end: u32) -> Result<T, ParseError> {
    Err(ParseError::new(kind, Span::new(start, end)))
}

/// Decode any value token: a string, a number or a keyword.
pub fn decode_value<'src>(token: &Token<'src>) -> Result<Value<'src>, ParseError> {
    match token.kind {
        TokenKind::QuotedString | TokenKind::MultiLineString => {
            decode_string(token).map(Value::String)
        }
        TokenKind::RawString | TokenKind::MultiLineRawString => {
            decode_string(token).map(Value::RawString)
        }
        TokenKind::Number => decode_number(token),
        TokenKind::Keyword => Ok(decode_keyword(token)),
        TokenKind::Ident => error(
            ParseErrorKind::BareIdentifierValue,
            token.span.start,
            token.span.end,
        ),
        _ => error(
            ParseErrorKind::ExpectedValue,
            token.span.start,
            token.span.end,
        ),
    }
}

/// Decode `true`, `false` or `null`.
pub fn decode_keyword<'src>(token: &Token<'src>) -> Value<'src> {
    match token.text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Null,
    }
}

/// Decode the contents of any of the four string token kinds.
///
/// The result borrows from the source unless escapes or dedent rewrote it.
pub fn decode_string<'src>(token: &Token<'src>) -> Result<Cow<'src, str>, ParseError> {
    let text = token.text;
    let base = token.span.start;
    match token.kind {
        TokenKind::QuotedString => unescape(&text[1..text.len() - 1], base + 1),
        TokenKind::RawString => {
            let hashes = raw_hashes(text);
            Ok(Cow::Borrowed(&text[hashes + 2..text.len() - 1 - hashes]))
        }
        TokenKind::MultiLineString => {
            let body = &text[3..text.len() - 3];
            if !body.starts_with(is_newline) {
                return error(
                    ParseErrorKind::MultilineMissingNewline,
                    base,
                    base + 3,
                );
            }
            dedent(body, base + 3, true)
        }
        TokenKind::MultiLineRawString => {
            let hashes = raw_hashes(text);
            let open = hashes + 4;
            dedent(&text[open..text.len() - 3 - hashes], base + open as u32, false)
        }
        _ => error(
            ParseErrorKind::UnexpectedToken,
            token.span.start,
            token.span.end,
        ),
    }
}

/// Number of `#` after the `r` of a raw string.
fn raw_hashes(text: &str) -> usize {
    text[1..].bytes().take_while(|&b| b == b'#').count()
}

/// Resolve escape sequences. `base` is the source offset of `text`.
pub fn unescape(text: &str, base: u32) -> Result<Cow<'_, str>, ParseError> {
    // Check if any escapes present
    if !text.contains('\\') {
        return Ok(Cow::Borrowed(text));
    }

    let mut result = String::with_capacity(text.len());
    let mut chars = text.char_indices();

    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }

        let escape_start = base + i as u32;
        let Some((j, e)) = chars.next() else {
            return error(
                ParseErrorKind::InvalidEscape("\\".to_string()),
                escape_start,
                escape_start + 1,
            );
        };
        let escape_end = base + (j + e.len_utf8()) as u32;

        match e {
            'n' => result.push('\n'),
            'r' => result.push('\r'),
            't' => result.push('\t'),
            '\\' => result.push('\\'),
            '/' => result.push('/'),
            '"' => result.push('"'),
            'b' => result.push('\u{8}'),
            'f' => result.push('\u{C}'),
            'u' => {
                let after = &text[j + 1..];
                let Some(body) = after.strip_prefix('{') else {
                    return error(
                        ParseErrorKind::InvalidUnicodeEscape,
                        escape_start,
                        escape_end,
                    );
                };
                let Some(close) = body.find('}') else {
                    return error(
                        ParseErrorKind::InvalidUnicodeEscape,
                        escape_start,
                        escape_end + 1,
                    );
                };
                // `\u{` + digits + `}`
                let full_end = escape_end + close as u32 + 2;
                let hex = &body[..close];
                let valid_hex = (1..=6).contains(&hex.len())
                    && hex.bytes().all(|b| b.is_ascii_hexdigit());
                let ch = if valid_hex {
                    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                } else {
                    None
                };
                let Some(ch) = ch else {
                    return error(ParseErrorKind::InvalidUnicodeEscape, escape_start, full_end);
                };
                result.push(ch);
                for _ in 0..close + 2 {
                    chars.next();
                }
            }
            other => {
                return error(
                    ParseErrorKind::InvalidEscape(format!("\\{other}")),
                    escape_start,
                    escape_end,
                );
            }
        }
    }

    Ok(Cow::Owned(result))
}

/// Split `text` into lines, returning each line's byte offset and content.
///
/// `\r\n` counts as one terminator. A trailing terminator yields a final
/// empty line.
fn lines(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut line_start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !is_newline(c) {
            continue;
        }
        out.push((line_start, &text[line_start..i]));
        line_start = i + c.len_utf8();
        if c == '\r'
            && let Some(&(_, '\n')) = chars.peek()
        {
            chars.next();
            line_start += 1;
        }
    }
    out.push((line_start, &text[line_start..]));
    out
}

/// Dedent the body of a multi-line string.
///
/// `body` is everything between the opening and closing quotes and starts
/// with a newline; `base` is its source offset. The whitespace in front of
/// the closing quotes is stripped from every content line. When `escaped`
/// is set, escapes are resolved line by line after stripping.
pub fn dedent(body: &str, base: u32, escaped: bool) -> Result<Cow<'_, str>, ParseError> {
    let lines = lines(body);

    // The first entry is the (empty) remainder of the opening line.
    let Some((&(closing_start, prefix), content)) = lines[1..].split_last() else {
        return error(ParseErrorKind::MultilineMissingNewline, base, base);
    };

    if let Some(bad) = prefix.find(|c: char| !is_whitespace(c)) {
        return error(
            ParseErrorKind::MultilineClosingLine,
            base + (closing_start + bad) as u32,
            base + (closing_start + prefix.len()) as u32,
        );
    }

    let mut decoded = Vec::with_capacity(content.len());
    for &(start, line) in content {
        if line.chars().all(is_whitespace) {
            decoded.push(Cow::Borrowed(""));
            continue;
        }
        let Some(stripped) = line.strip_prefix(prefix) else {
            return error(
                ParseErrorKind::InconsistentIndent,
                base + start as u32,
                base + (start + line.len()) as u32,
            );
        };
        let offset = base + (start + prefix.len()) as u32;
        decoded.push(if escaped {
            unescape(stripped, offset)?
        } else {
            Cow::Borrowed(stripped)
        });
    }

    match decoded.len() {
        0 => Ok(Cow::Borrowed("")),
        1 => Ok(decoded.remove(0)),
        _ => Ok(Cow::Owned(decoded.join("\n"))),
    }
}

/// Decode a number token into an integer or float value.
pub fn decode_number<'src>(token: &Token<'src>) -> Result<Value<'src>, ParseError> {
    let text = token.text;
    let (negative, start) = match text.as_bytes().first() {
        Some(b'-') => (true, 1),
        Some(b'+') => (false, 1),
        _ => (false, 0),
    };
    let rest = &text[start..];

    let radix = if rest.starts_with("0x") {
        Radix::Hexadecimal
    } else if rest.starts_with("0o") {
        Radix::Octal
    } else if rest.starts_with("0b") {
        Radix::Binary
    } else {
        return decode_decimal(token, negative, start);
    };

    let digits_start = start + 2;
    if digits_start == text.len() {
        return error(
            ParseErrorKind::MissingDigits,
            token.span.start,
            token.span.end,
        );
    }
    let n = accumulate(token, digits_start, text.len(), radix, negative)?;
    Ok(Value::Integer(n, radix))
}

/// Decode a decimal literal; `start` is the offset just past the sign.
fn decode_decimal<'src>(
    token: &Token<'src>,
    negative: bool,
    start: usize,
) -> Result<Value<'src>, ParseError> {
    let text = token.text;
    let bytes = text.as_bytes();
    let base = token.span.start;

    if !bytes.get(start).is_some_and(u8::is_ascii_digit) {
        return error(
            ParseErrorKind::InvalidNumber,
            token.span.start,
            token.span.end,
        );
    }

    let int_end = scan_digits(token, start)?;
    let mut end = int_end;
    let mut is_float = false;

    if bytes.get(end) == Some(&b'.') {
        check_underscore_before(token, end)?;
        is_float = true;
        end = scan_digits(token, end + 1)?;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        check_underscore_before(token, end)?;
        is_float = true;
        end += 1;
        if matches!(bytes.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        end = scan_digits(token, end)?;
    }

    if end < text.len() {
        let bad = text[end..].chars().next().unwrap_or_default();
        let kind = if bad.is_alphanumeric() {
            ParseErrorKind::InvalidDigit
        } else {
            ParseErrorKind::InvalidNumber
        };
        let at = base + end as u32;
        return error(kind, at, at + bad.len_utf8() as u32);
    }

    if !is_float {
        let n = accumulate(token, start, int_end, Radix::Decimal, negative)?;
        return Ok(Value::Integer(n, Radix::Decimal));
    }

    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Value::Float(n)),
        _ => error(
            ParseErrorKind::InvalidNumber,
            token.span.start,
            token.span.end,
        ),
    }
}

/// Scan one decimal digit group starting at `start`, returning its end.
///
/// The group must start with a digit; underscores may follow.
fn scan_digits(token: &Token<'_>, start: usize) -> Result<usize, ParseError> {
    let bytes = token.text.as_bytes();
    let base = token.span.start;
    match bytes.get(start) {
        Some(b) if b.is_ascii_digit() => {}
        Some(b'_') => {
            let at = base + start as u32;
            return error(ParseErrorKind::MisplacedUnderscore, at, at + 1);
        }
        // Point at the `.`, `e` or sign that wanted digits after it
        _ => {
            let at = base + start as u32;
            return error(ParseErrorKind::MissingDigits, at - 1, at);
        }
    }
    let len = bytes[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b'_')
        .count();
    Ok(start + len)
}

/// An underscore may not sit directly before `.` or the exponent marker.
fn check_underscore_before(token: &Token<'_>, at: usize) -> Result<(), ParseError> {
    if at > 0 && token.text.as_bytes()[at - 1] == b'_' {
        let pos = token.span.start + at as u32 - 1;
        return error(ParseErrorKind::MisplacedUnderscore, pos, pos + 1);
    }
    Ok(())
}

/// Accumulate the digits in `text[start..end]` as a signed 64-bit integer.
fn accumulate(
    token: &Token<'_>,
    start: usize,
    end: usize,
    radix: Radix,
    negative: bool,
) -> Result<i64, ParseError> {
    let base = token.span.start;
    let digits = &token.text[start..end];

    if digits.starts_with('_') {
        let at = base + start as u32;
        return error(ParseErrorKind::MisplacedUnderscore, at, at + 1);
    }

    let mut magnitude: u64 = 0;
    let mut overflow = false;
    for (i, c) in digits.char_indices() {
        if c == '_' {
            continue;
        }
        let Some(digit) = c.to_digit(radix.base()) else {
            let at = base + (start + i) as u32;
            return error(ParseErrorKind::InvalidDigit, at, at + c.len_utf8() as u32);
        };
        // Keep scanning after an overflow so a bad digit is still reported first
        match magnitude
            .checked_mul(u64::from(radix.base()))
            .and_then(|m| m.checked_add(u64::from(digit)))
        {
            Some(m) => magnitude = m,
            None => overflow = true,
        }
    }

    let value = if overflow {
        None
    } else if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    };
    value.ok_or(ParseError::new(ParseErrorKind::IntegerOverflow, token.span))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use kdl_tokenizer::Tokenizer;
    use proptest::prelude::*;

    fn decode(source: &str) -> Result<Value<'static>, ParseError> {
        decode_value(&Tokenizer::new(source).next_token()).map(Value::into_owned)
    }

    proptest! {
        /// Every i64 written in any radix decodes back to itself
        #[test]
        fn integers_decode_exactly(n in any::<i64>()) {
            let sign = if n < 0 { "-" } else { "" };
            let abs = n.unsigned_abs();
            prop_assert_eq!(decode(&n.to_string()).unwrap(), Value::Integer(n, Radix::Decimal));
            prop_assert_eq!(
                decode(&format!("{sign}0x{abs:x}")).unwrap(),
                Value::Integer(n, Radix::Hexadecimal)
            );
            prop_assert_eq!(
                decode(&format!("{sign}0o{abs:o}")).unwrap(),
                Value::Integer(n, Radix::Octal)
            );
            prop_assert_eq!(
                decode(&format!("{sign}0b{abs:b}")).unwrap(),
                Value::Integer(n, Radix::Binary)
            );
        }

        /// Underscores between digits never change the value
        #[test]
        fn underscores_are_ignored(n in 0u32..1_000_000, split in 1usize..6) {
            let digits = n.to_string();
            let split = split.min(digits.len());
            let with_underscore = format!("{}_{}", &digits[..split], &digits[split..]);
            prop_assert_eq!(
                decode(&with_underscore).unwrap(),
                Value::Integer(i64::from(n), Radix::Decimal)
            );
        }

        /// Decoding is deterministic and agrees with the standard float parser
        #[test]
        fn floats_match_std(mantissa in 0u32..100_000, frac in 0u32..1000, exp in -20i32..20) {
            let source = format!("{mantissa}.{frac}e{exp}");
            let expected: f64 = source.parse().unwrap();
            prop_assert_eq!(decode(&source).unwrap(), Value::Float(expected));
            prop_assert_eq!(decode(&source).unwrap(), decode(&source).unwrap());
        }
    }
}
