//! Purpose: Split fully-buffered multipart/form-data bodies into text fields and one attachment.
//! Exports: `MultipartDecoder`, `MultipartConfig`, `AttachmentPolicy`, `DecodedForm`,
//! `DecodedField`, `DecodedAttachment`, `SkippedPart`, `PartSkipReason`, `decode`.
//! Role: Binary-safe decoder used by the upload paths; performs no disk or network I/O.
//! Invariants: Every returned string and byte buffer is an owned copy of the input.
//! Invariants: Malformed parts are skipped and reported in `DecodedForm::skipped`, never fatal.
//! Invariants: Attachment bytes are returned unmodified (no trimming, no decoding).
//! Notes: A boundary token occurring inside a payload truncates that payload; see tests.
//! Notes: A `--boundary--` match only ends decoding when no delimiter follows it.
use std::borrow::Cow;

use bstr::ByteSlice;
use bytes::Bytes;
use serde::Serialize;

use crate::core::boundary::BoundaryToken;
use crate::core::error::{Error, ErrorKind};
use crate::core::media;
use crate::core::naming::{self, NamingPolicy};

const CRLF: &[u8] = b"\r\n";
const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";
const TERMINATOR_SUFFIX: &[u8] = b"--";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedField {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedAttachment {
    pub field_name: String,
    pub original_filename: String,
    pub storage_filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl DecodedAttachment {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartSkipReason {
    MissingHeaderSeparator,
    MissingName,
    ExtraAttachment,
    /// Bytes between a `--boundary--` match and a later delimiter.
    AfterTerminator,
}

impl PartSkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            PartSkipReason::MissingHeaderSeparator => "missing-header-separator",
            PartSkipReason::MissingName => "missing-name",
            PartSkipReason::ExtraAttachment => "extra-attachment",
            PartSkipReason::AfterTerminator => "after-terminator",
        }
    }
}

/// A part that was dropped from the result; `offset`/`len` locate it in the request body.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SkippedPart {
    pub index: usize,
    pub offset: usize,
    pub len: usize,
    pub reason: PartSkipReason,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DecodedForm {
    pub fields: Vec<DecodedField>,
    pub attachment: Option<DecodedAttachment>,
    pub skipped: Vec<SkippedPart>,
    /// Field names whose value contained invalid UTF-8 (replaced with U+FFFD).
    pub lossy_fields: Vec<String>,
}

impl DecodedForm {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// What to do when more than one part carries a filename.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum AttachmentPolicy {
    /// Keep the first file part; later ones are reported as skipped.
    #[default]
    First,
    /// Fail with `ErrorKind::Usage` on a second file part.
    Reject,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MultipartConfig {
    pub default_extension: String,
    pub naming: NamingPolicy,
    pub attachment_policy: AttachmentPolicy,
}

impl MultipartConfig {
    pub fn new() -> Self {
        Self {
            default_extension: ".bin".to_string(),
            naming: NamingPolicy::default(),
            attachment_policy: AttachmentPolicy::default(),
        }
    }

    /// Lecture video uploads; extension-less files are stored as `.mp4`.
    pub fn video() -> Self {
        Self::new().with_default_extension(".mp4")
    }

    /// Study-material uploads.
    pub fn material() -> Self {
        Self::new()
    }

    pub fn with_default_extension(mut self, extension: impl Into<String>) -> Self {
        self.default_extension = extension.into();
        self
    }

    pub fn with_naming(mut self, naming: NamingPolicy) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_attachment_policy(mut self, policy: AttachmentPolicy) -> Self {
        self.attachment_policy = policy;
        self
    }
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MultipartDecoder {
    config: MultipartConfig,
}

/// Decodes with the default configuration.
pub fn decode(content_type: &str, body: &[u8]) -> Result<DecodedForm, Error> {
    MultipartDecoder::default().decode(content_type, body)
}

impl MultipartDecoder {
    pub fn new(config: MultipartConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MultipartConfig {
        &self.config
    }

    pub fn decode(&self, content_type: &str, body: &[u8]) -> Result<DecodedForm, Error> {
        let token = BoundaryToken::from_content_type(content_type)?;
        self.decode_with_token(&token, body)
    }

    pub fn decode_with_token(
        &self,
        token: &BoundaryToken,
        body: &[u8],
    ) -> Result<DecodedForm, Error> {
        let mut form = DecodedForm::default();
        let mut index = 0usize;
        let mut next_boundary = token.find_in(body, 0);

        while let Some(boundary_start) = next_boundary {
            let content_start = boundary_start + token.len();
            next_boundary = token.find_in(body, content_start);
            let content_end = next_boundary.unwrap_or(body.len());

            // `--boundary--` closes the body only when no delimiter follows it.
            if body[content_start..].starts_with(TERMINATOR_SUFFIX) {
                if next_boundary.is_none() {
                    break;
                }
                let len = content_end - content_start;
                tracing::warn!(
                    index,
                    offset = content_start,
                    len,
                    "delimiter followed by more parts; skipping bytes after early terminator"
                );
                form.skipped.push(SkippedPart {
                    index,
                    offset: content_start,
                    len,
                    reason: PartSkipReason::AfterTerminator,
                });
                index += 1;
                continue;
            }

            let (part_offset, part) = trim_part(body, content_start, content_end);
            if !part.is_empty() {
                self.decode_part(&mut form, index, part_offset, part)?;
                index += 1;
            }
        }

        tracing::debug!(
            fields = form.fields.len(),
            attachment = form.attachment.is_some(),
            skipped = form.skipped.len(),
            "decoded multipart body"
        );
        Ok(form)
    }

    fn decode_part(
        &self,
        form: &mut DecodedForm,
        index: usize,
        offset: usize,
        part: &[u8],
    ) -> Result<(), Error> {
        let skip = |form: &mut DecodedForm, reason: PartSkipReason| {
            tracing::warn!(
                index,
                offset,
                len = part.len(),
                reason = reason.as_str(),
                "skipping multipart part"
            );
            form.skipped.push(SkippedPart {
                index,
                offset,
                len: part.len(),
                reason,
            });
        };

        let Some(header_end) = part.find(HEADER_SEPARATOR) else {
            skip(form, PartSkipReason::MissingHeaderSeparator);
            return Ok(());
        };
        let header = part[..header_end].to_str_lossy();
        let payload = &part[header_end + HEADER_SEPARATOR.len()..];

        let Some(name) = quoted_attribute(&header, "name") else {
            skip(form, PartSkipReason::MissingName);
            return Ok(());
        };

        let Some(filename) = quoted_attribute(&header, "filename") else {
            let value = payload.to_str_lossy();
            if matches!(value, Cow::Owned(_)) {
                form.lossy_fields.push(name.clone());
            }
            tracing::debug!(index, name = %name, "decoded text field");
            form.fields.push(DecodedField {
                name,
                value: value.trim().to_string(),
            });
            return Ok(());
        };

        if payload.is_empty() {
            return Err(Error::new(ErrorKind::EmptyAttachment)
                .with_message("attachment payload is empty")
                .with_field(name)
                .with_offset(offset));
        }

        if form.attachment.is_some() {
            if self.config.attachment_policy == AttachmentPolicy::Reject {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("more than one attachment in request")
                    .with_field(name)
                    .with_offset(offset));
            }
            skip(form, PartSkipReason::ExtraAttachment);
            return Ok(());
        }

        let extension =
            media::extension_of(&filename).unwrap_or(self.config.default_extension.as_str());
        let storage_filename = naming::storage_filename(self.config.naming, payload, extension)?;
        let content_type = part_content_type(&header)
            .unwrap_or_else(|| media::content_type_for(&filename).to_string());

        tracing::debug!(
            index,
            name = %name,
            filename = %filename,
            len = payload.len(),
            "decoded attachment"
        );
        form.attachment = Some(DecodedAttachment {
            field_name: name,
            original_filename: filename,
            storage_filename,
            content_type,
            bytes: Bytes::copy_from_slice(payload),
        });
        Ok(())
    }
}

/// Drops one CRLF after the delimiter and one CRLF before the next one.
fn trim_part(body: &[u8], start: usize, end: usize) -> (usize, &[u8]) {
    let mut part = &body[start..end];
    let mut offset = start;
    if let Some(rest) = part.strip_prefix(CRLF) {
        part = rest;
        offset += CRLF.len();
    }
    if let Some(rest) = part.strip_suffix(CRLF) {
        part = rest;
    }
    (offset, part)
}

/// Finds `attr="value"` where `attr` starts a token (so `name` does not match `filename`).
fn quoted_attribute(header: &str, attr: &str) -> Option<String> {
    let needle = format!("{attr}=\"");
    let mut from = 0;
    while let Some(found) = header[from..].find(&needle) {
        let start = from + found;
        let at_token_start = header[..start]
            .chars()
            .next_back()
            .is_none_or(|ch| ch == ';' || ch.is_whitespace());
        let value_start = start + needle.len();
        if at_token_start {
            let value_len = header[value_start..].find('"')?;
            return Some(header[value_start..value_start + value_len].to_string());
        }
        from = value_start;
    }
    None
}

fn part_content_type(header: &str) -> Option<String> {
    header.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim().eq_ignore_ascii_case("content-type") {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}
