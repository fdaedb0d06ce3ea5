//! Purpose: Define a stable, structured schema for non-fatal decode notices.
//! Exports: `Notice`, `notice_json`, `skipped_part_notice`, `skipped_segment_notice`.
//! Role: Surfaces parts and segments the permissive decoders dropped.
//! Invariants: Notices are non-fatal and never alter the decoded payload.
//! Invariants: JSON schema is stable once published; fields are additive-only.
use serde_json::{Map, Value, json};

use crate::core::multipart::SkippedPart;
use crate::json::SkippedSegment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: String,
    pub time: String,
    pub cmd: String,
    pub input: String,
    pub message: String,
    pub details: Map<String, Value>,
}

pub fn skipped_part_notice(part: &SkippedPart, cmd: &str, input: &str, time: &str) -> Notice {
    let mut details = Map::new();
    details.insert("index".to_string(), json!(part.index));
    details.insert("offset".to_string(), json!(part.offset));
    details.insert("len".to_string(), json!(part.len));
    details.insert("reason".to_string(), json!(part.reason.as_str()));
    Notice {
        kind: "skipped-part".to_string(),
        time: time.to_string(),
        cmd: cmd.to_string(),
        input: input.to_string(),
        message: format!("skipped multipart part {} ({})", part.index, part.reason.as_str()),
        details,
    }
}

pub fn skipped_segment_notice(
    segment: &SkippedSegment,
    cmd: &str,
    input: &str,
    time: &str,
) -> Notice {
    let mut details = Map::new();
    details.insert("offset".to_string(), json!(segment.offset));
    details.insert("len".to_string(), json!(segment.len));
    details.insert("reason".to_string(), json!(segment.reason.as_str()));
    Notice {
        kind: "skipped-segment".to_string(),
        time: time.to_string(),
        cmd: cmd.to_string(),
        input: input.to_string(),
        message: format!(
            "skipped JSON segment at offset {} ({})",
            segment.offset,
            segment.reason.as_str()
        ),
        details,
    }
}

pub fn notice_json(notice: &Notice) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(notice.kind));
    inner.insert("time".to_string(), json!(notice.time));
    inner.insert("cmd".to_string(), json!(notice.cmd));
    inner.insert("input".to_string(), json!(notice.input));
    inner.insert("message".to_string(), json!(notice.message));
    inner.insert("details".to_string(), Value::Object(notice.details.clone()));

    let mut outer = Map::new();
    outer.insert("notice".to_string(), Value::Object(inner));
    Value::Object(outer)
}

#[cfg(test)]
mod tests {
    use super::{notice_json, skipped_part_notice, skipped_segment_notice};
    use crate::core::multipart::{PartSkipReason, SkippedPart};
    use crate::json::{SegmentIssue, SkippedSegment};

    #[test]
    fn part_notice_has_required_fields() {
        let part = SkippedPart {
            index: 2,
            offset: 120,
            len: 9,
            reason: PartSkipReason::MissingHeaderSeparator,
        };
        let notice = skipped_part_notice(&part, "multipart", "-", "2026-02-01T00:00:00Z");
        let value = notice_json(&notice);
        let obj = value
            .get("notice")
            .and_then(|v| v.as_object())
            .expect("notice object");

        assert_eq!(obj.get("kind").and_then(|v| v.as_str()), Some("skipped-part"));
        assert_eq!(
            obj.get("time").and_then(|v| v.as_str()),
            Some("2026-02-01T00:00:00Z")
        );
        assert_eq!(obj.get("cmd").and_then(|v| v.as_str()), Some("multipart"));
        assert_eq!(obj.get("input").and_then(|v| v.as_str()), Some("-"));
        let details = obj.get("details").and_then(|v| v.as_object()).expect("details");
        assert_eq!(details.get("offset").and_then(|v| v.as_u64()), Some(120));
        assert_eq!(
            details.get("reason").and_then(|v| v.as_str()),
            Some("missing-header-separator")
        );
    }

    #[test]
    fn segment_notice_names_reason() {
        let segment = SkippedSegment {
            offset: 7,
            len: 4,
            reason: SegmentIssue::MissingColon,
        };
        let notice = skipped_segment_notice(&segment, "json", "body.json", "t");
        assert_eq!(notice.kind, "skipped-segment");
        assert_eq!(notice.message, "skipped JSON segment at offset 7 (missing-colon)");
    }
}
