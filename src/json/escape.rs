//! Purpose: String escaping for hand-assembled JSON responses and the matching decode rule.
//! Exports: `escape_json`, `escape_json_opt`, `unescape_json`.
//! Role: The only escaping primitive response builders may use for dynamic text.
//! Invariants: Encode side escapes `\`, `"`, LF and CR only; tab passes through unescaped.
//! Invariants: Decode side maps `\n`, `\r`, `\t` and emits any other escaped char verbatim.

pub fn escape_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

/// Missing text renders as an empty string.
pub fn escape_json_opt(text: Option<&str>) -> String {
    text.map(escape_json).unwrap_or_default()
}

pub fn unescape_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(escaped) => out.push(unescape_char(escaped)),
            // Lone trailing backslash.
            None => out.push('\\'),
        }
    }
    out
}

pub(crate) fn unescape_char(escaped: char) -> char {
    match escaped {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        other => other,
    }
}
