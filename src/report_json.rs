//! Purpose: Render decode results as JSON reports for CLI output.
//! Role: Binary-only formatting helpers; not part of the library API.
//! Invariants: Attachment bytes are summarized (length, digest), never inlined.
//! Invariants: Document keys keep their first-insertion order.
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

use portal_codec::api::{
    DecodedAttachment, DecodedForm, JsonDecode, JsonDocument, JsonValue, StoredAttachment,
    format_file_size,
};

pub(super) fn form_json(form: &DecodedForm, stored: Option<&StoredAttachment>) -> Value {
    let fields = form
        .fields
        .iter()
        .map(|field| json!({ "name": field.name, "value": field.value }))
        .collect::<Vec<_>>();

    let mut map = Map::new();
    map.insert("fields".to_string(), Value::Array(fields));
    map.insert(
        "attachment".to_string(),
        form.attachment
            .as_ref()
            .map(attachment_json)
            .unwrap_or(Value::Null),
    );
    if let Some(stored) = stored {
        map.insert("stored".to_string(), stored_json(stored));
    }
    map.insert("skipped".to_string(), json!(form.skipped));
    if !form.lossy_fields.is_empty() {
        map.insert("lossy_fields".to_string(), json!(form.lossy_fields));
    }
    Value::Object(map)
}

fn attachment_json(attachment: &DecodedAttachment) -> Value {
    let digest = Sha256::digest(&attachment.bytes);
    let sha256 = digest
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    json!({
        "field_name": attachment.field_name,
        "original_filename": attachment.original_filename,
        "storage_filename": attachment.storage_filename,
        "content_type": attachment.content_type,
        "len": attachment.bytes.len(),
        "size": format_file_size(attachment.bytes.len() as u64),
        "sha256": sha256,
    })
}

fn stored_json(stored: &StoredAttachment) -> Value {
    json!({
        "path": stored.path.display().to_string(),
        "public_url": stored.public_url,
        "file_type": stored.file_type,
        "size": stored.size_label,
        "len": stored.len,
    })
}

pub(super) fn decode_json(decoded: &JsonDecode) -> Value {
    json!({
        "document": document_json(&decoded.document),
        "skipped": decoded.skipped,
    })
}

pub(super) fn document_json(document: &JsonDocument) -> Value {
    let mut map = Map::new();
    for (key, value) in document.iter() {
        let value = match value {
            JsonValue::String(text) => json!(text),
            JsonValue::Integer(number) => json!(number),
            JsonValue::StringArray(items) => json!(items),
        };
        map.insert(key.to_string(), value);
    }
    Value::Object(map)
}
