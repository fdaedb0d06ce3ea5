//! Purpose: Caller-side helpers that turn decoded forms into handler inputs.
//! Exports: `UploadBody`, field/attachment lookup and validation on `DecodedForm`.
//! Role: Required-field checks live here; the decoder reports exactly what it found.
//! Invariants: Validation failures are `ErrorKind::Usage` and name the offending field.
use bytes::Bytes;

use crate::core::boundary::MULTIPART_FORM_DATA;
use crate::core::error::{Error, ErrorKind};
use crate::core::multipart::{DecodedAttachment, DecodedForm, MultipartDecoder};

impl DecodedForm {
    /// Value of the first field named `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }

    /// Field value, or an empty string when absent.
    pub fn field_or_empty(&self, name: &str) -> &str {
        self.field(name).unwrap_or_default()
    }

    /// Present and non-empty after trimming.
    pub fn require_field(&self, name: &str) -> Result<&str, Error> {
        match self.field(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(Error::new(ErrorKind::Usage)
                .with_message("missing required field")
                .with_field(name)),
        }
    }

    pub fn attachment_for(&self, field_name: &str) -> Option<&DecodedAttachment> {
        self.attachment
            .as_ref()
            .filter(|attachment| attachment.field_name == field_name)
    }

    pub fn require_attachment(&self, field_name: &str) -> Result<&DecodedAttachment, Error> {
        self.attachment_for(field_name).ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message("missing required attachment")
                .with_field(field_name)
        })
    }

    pub fn into_attachment(self) -> Option<DecodedAttachment> {
        self.attachment
    }
}

/// A request body as seen by an upload handler.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UploadBody {
    Multipart(DecodedForm),
    /// Sent without a multipart content type; the whole body is the file.
    Raw(Bytes),
}

impl UploadBody {
    pub fn from_request(
        content_type: Option<&str>,
        body: &[u8],
        decoder: &MultipartDecoder,
    ) -> Result<Self, Error> {
        match content_type {
            Some(value) if value.to_ascii_lowercase().contains(MULTIPART_FORM_DATA) => {
                decoder.decode(value, body).map(UploadBody::Multipart)
            }
            _ => {
                tracing::debug!(len = body.len(), "treating request body as raw upload");
                Ok(UploadBody::Raw(Bytes::copy_from_slice(body)))
            }
        }
    }

    /// Attachment bytes regardless of how they were sent.
    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            UploadBody::Multipart(form) => form.attachment.as_ref().map(|a| &a.bytes),
            UploadBody::Raw(bytes) => Some(bytes),
        }
    }
}
