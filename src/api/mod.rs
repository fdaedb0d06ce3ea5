//! Purpose: Define the stable public Rust API boundary for the request-body codecs.
//! Exports: Decoder types, JSON codec types, upload helpers and attachment persistence.
//! Role: Public, additive-only surface; handlers should import from here.
//! Invariants: Decoding entrypoints stay pure; only `store` performs filesystem writes.
//! Invariants: Internal helpers (header attribute scanning, parser cursor) stay private.

mod store;
mod upload;

pub use crate::core::boundary::{BoundaryToken, MULTIPART_FORM_DATA};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind, http_status};
pub use crate::core::media::{content_type_for, file_type_label, format_file_size};
pub use crate::core::multipart::{
    AttachmentPolicy, DecodedAttachment, DecodedField, DecodedForm, MultipartConfig,
    MultipartDecoder, PartSkipReason, SkippedPart,
};
pub use crate::core::naming::NamingPolicy;
pub use crate::json::{
    JsonDecode, JsonDecoder, JsonDocument, JsonValue, ParseMode, SegmentIssue, SkippedSegment,
    escape_json, escape_json_opt, unescape_json,
};
pub use store::{AttachmentStore, StoreConfig, StoredAttachment};
pub use upload::UploadBody;
