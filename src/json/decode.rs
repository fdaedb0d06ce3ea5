//! Purpose: Decode the restricted JSON object dialect sent by the test-module endpoints.
//! Exports: `JsonDecoder`, `ParseMode`, `JsonDecode`, `SkippedSegment`, `SegmentIssue`,
//! `decode`, `decode_strict`.
//! Role: Single-pass, allocation-light decoder; values are strings, integers or string arrays.
//! Invariants: Permissive mode never fails; malformed spans are reported in `skipped`.
//! Invariants: Duplicate keys are last-write-wins, keeping the first key position.
//! Invariants: Offsets in diagnostics are byte offsets into the caller's input text.
//! Notes: Outer braces are stripped without checking they match. Brackets inside array strings
//! are not special-cased when locating the end of an array.
use serde::Serialize;

use crate::core::error::{Error, ErrorKind};
use crate::json::document::{JsonDocument, JsonValue};
use crate::json::escape::unescape_char;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ParseMode {
    #[default]
    Permissive,
    Strict,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentIssue {
    ExpectedKey,
    UnterminatedKey,
    MissingColon,
    MissingValue,
    UnterminatedString,
    UnterminatedArray,
    NonStringArrayElement,
    TrailingCharacters,
}

impl SegmentIssue {
    pub fn as_str(self) -> &'static str {
        match self {
            SegmentIssue::ExpectedKey => "expected-key",
            SegmentIssue::UnterminatedKey => "unterminated-key",
            SegmentIssue::MissingColon => "missing-colon",
            SegmentIssue::MissingValue => "missing-value",
            SegmentIssue::UnterminatedString => "unterminated-string",
            SegmentIssue::UnterminatedArray => "unterminated-array",
            SegmentIssue::NonStringArrayElement => "non-string-array-element",
            SegmentIssue::TrailingCharacters => "trailing-characters",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SkippedSegment {
    pub offset: usize,
    pub len: usize,
    pub reason: SegmentIssue,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JsonDecode {
    pub document: JsonDocument,
    pub skipped: Vec<SkippedSegment>,
}

impl JsonDecode {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn into_document(self) -> JsonDocument {
        self.document
    }
}

#[derive(Clone, Debug, Default)]
pub struct JsonDecoder {
    mode: ParseMode,
}

impl JsonDecoder {
    pub fn new(mode: ParseMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn decode(&self, text: &str) -> Result<JsonDecode, Error> {
        let decoded = Parser::new(text).run();
        if self.mode == ParseMode::Strict
            && let Some(first) = decoded.skipped.first()
        {
            return Err(Error::new(ErrorKind::Malformed)
                .with_message(format!(
                    "{} malformed segment(s) in JSON body; first: {}",
                    decoded.skipped.len(),
                    first.reason.as_str()
                ))
                .with_offset(first.offset));
        }
        Ok(decoded)
    }
}

/// Permissive decode: never fails.
pub fn decode(text: &str) -> JsonDecode {
    Parser::new(text).run()
}

pub fn decode_strict(text: &str) -> Result<JsonDocument, Error> {
    JsonDecoder::new(ParseMode::Strict)
        .decode(text)
        .map(JsonDecode::into_document)
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    end: usize,
    out: JsonDecode,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        let bytes = src.as_bytes();
        let mut start = src.len() - src.trim_start().len();
        let mut end = src.trim_end().len().max(start);
        if start < end && bytes[start] == b'{' {
            start += 1;
        }
        if start < end && bytes[end - 1] == b'}' {
            end -= 1;
        }
        Self {
            src,
            bytes,
            pos: start,
            end,
            out: JsonDecode::default(),
        }
    }

    fn run(mut self) -> JsonDecode {
        while self.pos < self.end {
            self.skip_whitespace();
            if self.pos >= self.end {
                break;
            }
            if self.bytes[self.pos] != b'"' {
                let start = self.pos;
                while self.pos < self.end && self.bytes[self.pos] != b'"' {
                    self.pos += 1;
                }
                self.record(start, self.pos, SegmentIssue::ExpectedKey);
                continue;
            }
            if !self.entry() {
                break;
            }
        }
        self.out
    }

    /// Parses one `"key": value` entry; returns false once the input is exhausted.
    fn entry(&mut self) -> bool {
        let entry_start = self.pos;
        self.pos += 1;
        let key_start = self.pos;
        while self.pos < self.end && self.bytes[self.pos] != b'"' {
            self.pos += 1;
        }
        if self.pos >= self.end {
            self.record(entry_start, self.end, SegmentIssue::UnterminatedKey);
            return false;
        }
        let key = &self.src[key_start..self.pos];
        self.pos += 1;

        let gap_start = self.pos;
        while self.pos < self.end && self.bytes[self.pos] != b':' {
            self.pos += 1;
        }
        if self.pos >= self.end {
            self.record(entry_start, self.end, SegmentIssue::MissingColon);
            return false;
        }
        self.record_if_garbage(gap_start, self.pos);
        self.pos += 1;

        self.skip_whitespace();
        if self.pos >= self.end {
            self.record(entry_start, self.end, SegmentIssue::MissingValue);
            return false;
        }

        let value = match self.bytes[self.pos] {
            b'"' => JsonValue::String(self.string_value()),
            b'[' => JsonValue::StringArray(self.array_value()),
            _ => self.bare_value(entry_start),
        };
        let kind = value.kind();
        if self.out.document.insert(key, value).is_some() {
            tracing::debug!(key, kind, "duplicate JSON key overwritten");
        } else {
            tracing::debug!(key, kind, "decoded JSON entry");
        }

        let tail_start = self.pos;
        while self.pos < self.end && !matches!(self.bytes[self.pos], b',' | b'}') {
            self.pos += 1;
        }
        self.record_if_garbage(tail_start, self.pos);
        if self.pos < self.end && self.bytes[self.pos] == b',' {
            self.pos += 1;
        }
        true
    }

    /// Cursor sits on the opening quote; stops after the closing quote.
    fn string_value(&mut self) -> String {
        let start = self.pos;
        self.pos += 1;
        let (value, next, terminated) = self.read_string(self.pos, self.end);
        self.pos = next;
        if !terminated {
            self.record(start, self.end, SegmentIssue::UnterminatedString);
        }
        value
    }

    fn array_value(&mut self) -> Vec<String> {
        let start = self.pos;
        let mut depth = 1usize;
        self.pos += 1;
        while self.pos < self.end && depth > 0 {
            match self.bytes[self.pos] {
                b'[' => depth += 1,
                b']' => depth -= 1,
                _ => {}
            }
            self.pos += 1;
        }
        let close = if depth == 0 {
            self.pos - 1
        } else {
            self.record(start, self.end, SegmentIssue::UnterminatedArray);
            self.end
        };

        let mut items = Vec::new();
        let mut j = start + 1;
        while j < close {
            let gap_start = j;
            while j < close && self.bytes[j] != b'"' {
                j += 1;
            }
            let garbage = self.bytes[gap_start..j]
                .iter()
                .any(|byte| !byte.is_ascii_whitespace() && *byte != b',');
            if garbage {
                self.record(gap_start, j, SegmentIssue::NonStringArrayElement);
            }
            if j >= close {
                break;
            }
            let (item, next, terminated) = self.read_string(j + 1, close);
            if !terminated {
                self.record(j, close, SegmentIssue::UnterminatedString);
            }
            items.push(item);
            j = next;
        }
        items
    }

    fn bare_value(&mut self, entry_start: usize) -> JsonValue {
        let start = self.pos;
        while self.pos < self.end && !matches!(self.bytes[self.pos], b',' | b'}') {
            self.pos += 1;
        }
        let raw = self.src[start..self.pos].trim();
        if raw.is_empty() {
            self.record(entry_start, self.pos, SegmentIssue::MissingValue);
        }
        match raw.parse::<i64>() {
            Ok(number) => JsonValue::Integer(number),
            Err(_) => JsonValue::String(raw.to_string()),
        }
    }

    /// Reads string content starting at `from` up to an unescaped quote before `limit`.
    /// Returns the text, the index after the closing quote, and whether a quote was found.
    fn read_string(&self, from: usize, limit: usize) -> (String, usize, bool) {
        let mut value = String::new();
        let mut i = from;
        while i < limit {
            let byte = self.bytes[i];
            if byte == b'"' {
                return (value, i + 1, true);
            }
            if byte == b'\\' && i + 1 < limit {
                i += 1;
                let escaped = self.char_at(i);
                value.push(unescape_char(escaped));
                i += escaped.len_utf8();
                continue;
            }
            let ch = self.char_at(i);
            value.push(ch);
            i += ch.len_utf8();
        }
        (value, limit, false)
    }

    fn char_at(&self, index: usize) -> char {
        self.src[index..].chars().next().unwrap_or_default()
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.end {
            let ch = self.char_at(self.pos);
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn record_if_garbage(&mut self, start: usize, end: usize) {
        if self.src[start..end].chars().any(|ch| !ch.is_whitespace()) {
            self.record(start, end, SegmentIssue::TrailingCharacters);
        }
    }

    fn record(&mut self, start: usize, end: usize, reason: SegmentIssue) {
        tracing::warn!(
            offset = start,
            len = end - start,
            reason = reason.as_str(),
            "skipping malformed JSON segment"
        );
        self.out.skipped.push(SkippedSegment {
            offset: start,
            len: end - start,
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use super::{JsonDecoder, ParseMode, SegmentIssue, decode, decode_strict};
    use crate::core::error::ErrorKind;
    use crate::json::document::JsonValue;

    #[test]
    fn decodes_question_payload() {
        let decoded = decode(
            r#"{"subject":"physics","options":["a","b","c","d"],"correctIndex":2}"#,
        );
        assert!(decoded.is_clean());
        let doc = decoded.document;
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["subject", "options", "correctIndex"]);
        assert_eq!(doc.get_str("subject"), Some("physics"));
        assert_eq!(
            doc.get_string_array("options"),
            Some(&["a", "b", "c", "d"].map(String::from)[..])
        );
        assert_eq!(doc.get_i64("correctIndex"), Some(2));
    }

    #[test]
    fn empty_inputs_yield_empty_documents() {
        for input in ["", "{}", "   ", " { } ", "{", "}"] {
            let decoded = decode(input);
            assert!(decoded.document.is_empty(), "input {input:?}");
            assert!(decoded.is_clean(), "input {input:?}");
        }
    }

    #[test]
    fn duplicate_keys_are_last_write_wins() {
        let doc = decode(r#"{"id":1,"title":"x","id":2}"#).document;
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get_i64("id"), Some(2));
        assert_eq!(doc.keys().next(), Some("id"));
    }

    #[test]
    fn string_escapes_follow_decode_rule() {
        let doc = decode(r#"{"q":"line\nnext\ttab \"quoted\" \\ \/ \u0041"}"#).document;
        assert_eq!(
            doc.get_str("q"),
            Some("line\nnext\ttab \"quoted\" \\ / u0041")
        );
    }

    #[test]
    fn array_strings_use_same_escape_rule() {
        let doc = decode(r#"{"options":["a\nb", "c\"d", "[x]"]}"#).document;
        assert_eq!(
            doc.get_string_array("options"),
            Some(&["a\nb".to_string(), "c\"d".to_string(), "[x]".to_string()][..])
        );
    }

    #[test]
    fn bare_values_fall_back_to_strings() {
        let doc = decode(r#"{"duration": 45 , "ok": true, "ratio": 1.5, "big": -9000000000}"#)
            .document;
        assert_eq!(doc.get_i64("duration"), Some(45));
        assert_eq!(doc.get_str("ok"), Some("true"));
        assert_eq!(doc.get_str("ratio"), Some("1.5"));
        assert_eq!(doc.get("big"), Some(&JsonValue::Integer(-9_000_000_000)));
    }

    #[test]
    fn non_string_array_elements_are_reported() {
        let decoded = decode(r#"{"options":[1, "b", 3]}"#);
        assert_eq!(
            decoded.document.get_string_array("options"),
            Some(&["b".to_string()][..])
        );
        let reasons: Vec<_> = decoded.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            vec![
                SegmentIssue::NonStringArrayElement,
                SegmentIssue::NonStringArrayElement
            ]
        );
    }

    #[test]
    fn malformed_segments_are_skipped_with_offsets() {
        let input = r#"{"a":1, junk "b":"x"}"#;
        let decoded = decode(input);
        assert_eq!(decoded.document.get_i64("a"), Some(1));
        assert_eq!(decoded.document.get_str("b"), Some("x"));
        assert_eq!(decoded.skipped.len(), 1);
        let segment = &decoded.skipped[0];
        assert_eq!(segment.reason, SegmentIssue::ExpectedKey);
        assert_eq!(&input[segment.offset..segment.offset + segment.len], "junk ");
    }

    #[test]
    fn truncated_input_keeps_complete_entries() {
        let decoded = decode(r#"{"title":"Quiz","duration":"#);
        assert_eq!(decoded.document.len(), 1);
        assert_eq!(decoded.skipped[0].reason, SegmentIssue::MissingValue);

        let decoded = decode(r#"{"title":"Qu"#);
        assert_eq!(decoded.document.get_str("title"), Some("Qu"));
        assert_eq!(decoded.skipped[0].reason, SegmentIssue::UnterminatedString);

        let decoded = decode(r#"{"title"#);
        assert!(decoded.document.is_empty());
        assert_eq!(decoded.skipped[0].reason, SegmentIssue::UnterminatedKey);
    }

    #[test]
    fn strict_mode_fails_on_any_skipped_segment() {
        let err = decode_strict(r#"{"a":1,"b" 2}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert_eq!(err.offset(), Some(7));

        let doc = JsonDecoder::new(ParseMode::Strict)
            .decode(r#"{"a":1}"#)
            .expect("clean input")
            .into_document();
        assert_eq!(doc.get_i64("a"), Some(1));
    }

    #[test]
    fn unicode_whitespace_separates_entries() {
        let decoded = decode("{\"a\":1,\u{3000}\"b\":2\u{a0}}");
        assert!(decoded.is_clean(), "{:?}", decoded.skipped);
        assert_eq!(decoded.document.len(), 2);
        assert_eq!(decoded.document.get_i64("b"), Some(2));

        let doc = decode_strict("{\"a\"\u{2003}:\u{3000}\"x\"\u{2003},\"b\":[]}")
            .expect("strict");
        assert_eq!(doc.get_str("a"), Some("x"));
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("capture lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn every_entry_is_traced_at_debug() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            decode(r#"{"a":1,"b":"x","a":2}"#);
        });

        let logs = String::from_utf8(capture.0.lock().expect("capture lock").clone())
            .expect("utf8 logs");
        assert_eq!(logs.matches("decoded JSON entry").count(), 2);
        assert_eq!(logs.matches("duplicate JSON key overwritten").count(), 1);
        assert!(logs.contains("integer"));
        assert!(logs.contains("string"));
    }

    #[test]
    fn multibyte_text_is_preserved() {
        let doc = decode("{\"title\":\"Ünïcode ✓\",\"tags\":[\"ç\\é\"]}").document;
        assert_eq!(doc.get_str("title"), Some("Ünïcode ✓"));
        assert_eq!(doc.get_string_array("tags"), Some(&["çé".to_string()][..]));
    }
}
