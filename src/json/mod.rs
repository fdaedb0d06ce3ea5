//! Purpose: Restricted JSON codec used by the quiz and scheduled-test endpoints.
//! Exports: `document` value model, `decode` entrypoints, `escape` helpers.
//! Role: Single seam for JSON request decoding and response-text escaping.
//! Invariants: Response builders route dynamic text through `escape_json` only.
//! Invariants: Decoding is pure and deterministic (no hidden global state).

pub mod decode;
pub mod document;
pub mod escape;

pub use decode::{
    JsonDecode, JsonDecoder, ParseMode, SegmentIssue, SkippedSegment, decode, decode_strict,
};
pub use document::{JsonDocument, JsonValue};
pub use escape::{escape_json, escape_json_opt, unescape_json};
