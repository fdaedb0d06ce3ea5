//! Purpose: Lock the restricted JSON codec contract used by the quiz endpoints.
//! Exports: Integration tests only (no runtime exports).
//! Role: Pins decode results, the duplicate-key policy, and the escape asymmetry.
//! Invariants: Escaping covers backslash, quote, LF and CR only; tab passes through raw.

use portal_codec::api::{
    ErrorKind, JsonDecoder, JsonValue, ParseMode, SegmentIssue, escape_json, unescape_json,
};
use portal_codec::json::{decode, decode_strict};

#[test]
fn question_payload_decodes_to_typed_values() {
    let decoded =
        decode(r#"{"subject":"physics","options":["a","b","c","d"],"correctIndex":2}"#);
    assert!(decoded.is_clean());

    let document = decoded.document;
    assert_eq!(document.len(), 3);
    assert_eq!(document.get_str("subject"), Some("physics"));
    assert_eq!(
        document.get_string_array("options"),
        Some(&["a", "b", "c", "d"].map(String::from)[..])
    );
    assert_eq!(document.get_i64("correctIndex"), Some(2));
    assert_eq!(
        document.keys().collect::<Vec<_>>(),
        ["subject", "options", "correctIndex"]
    );
}

#[test]
fn empty_inputs_yield_empty_documents() {
    for input in ["{}", "", "   ", "{ }"] {
        let decoded = decode(input);
        assert!(decoded.document.is_empty(), "input {input:?}");
        assert!(decoded.is_clean(), "input {input:?}");
        assert!(decode_strict(input).expect("strict").is_empty());
    }
}

#[test]
fn duplicate_keys_are_last_write_wins() {
    let document = decode(r#"{"id":1,"id":2}"#).document;
    assert_eq!(document.len(), 1);
    assert_eq!(document.get("id"), Some(&JsonValue::Integer(2)));

    let document = decode(r#"{"id":1,"name":"x","id":3}"#).document;
    assert_eq!(document.keys().collect::<Vec<_>>(), ["id", "name"]);
    assert_eq!(document.get_i64("id"), Some(3));
}

#[test]
fn escape_round_trips_quote_backslash_and_line_breaks() {
    let cases = [
        "plain",
        "He said \"hi\"",
        r"C:\Users\student",
        "line one\nline two",
        "windows\r\nbreak",
        "\\\"\n\r\"\\",
        "",
    ];
    for original in cases {
        let escaped = escape_json(original);
        assert!(!escaped.contains('\n') && !escaped.contains('\r'));
        assert_eq!(unescape_json(&escaped), original, "case {original:?}");
    }
}

#[test]
fn tab_is_decoded_but_not_escaped() {
    let original = "col1\tcol2";

    // Encode side leaves the raw tab in place.
    let escaped = escape_json(original);
    assert_eq!(escaped, original);
    assert!(serde_json::from_str::<String>(&format!("\"{escaped}\"")).is_err());

    // Decode side recognizes `\t`, but escaping the result does not restore it.
    let unescaped = unescape_json(r"col1\tcol2");
    assert_eq!(unescaped, original);
    assert_ne!(escape_json(&unescaped), r"col1\tcol2");

    let document = decode(r#"{"cell":"col1\tcol2"}"#).document;
    assert_eq!(document.get_str("cell"), Some(original));
}

#[test]
fn escaped_text_embeds_in_hand_built_json() {
    let title = "Quiz \"Forces\"\nPart \\ 2";
    let body = format!("{{\"title\":\"{}\",\"id\":7}}", escape_json(title));

    let value: serde_json::Value = serde_json::from_str(&body).expect("valid json");
    assert_eq!(value["title"], title);

    let document = decode(&body).document;
    assert_eq!(document.get_str("title"), Some(title));
    assert_eq!(document.get_i64("id"), Some(7));
}

#[test]
fn strict_mode_reports_first_bad_segment() {
    let input = r#"{"a":1, b:2, "c":"ok"}"#;

    let permissive = JsonDecoder::new(ParseMode::Permissive)
        .decode(input)
        .expect("permissive never fails");
    assert_eq!(permissive.document.get_i64("a"), Some(1));
    assert!(!permissive.is_clean());
    assert_eq!(permissive.skipped[0].reason, SegmentIssue::ExpectedKey);

    let err = JsonDecoder::new(ParseMode::Strict)
        .decode(input)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
    assert_eq!(err.offset(), Some(permissive.skipped[0].offset));
}
