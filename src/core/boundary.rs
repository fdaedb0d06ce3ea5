//! Purpose: Extract the multipart boundary token and locate it inside request bodies.
//! Exports: `BoundaryToken`, `MULTIPART_FORM_DATA`.
//! Role: Delimiter handling for the multipart decoder; no part parsing happens here.
//! Invariants: The token always carries the `--` prefix and is never empty past it.
//! Invariants: Search is an exact byte match; boundary-like bytes inside payloads are not
//! distinguished from real delimiters (multipart carries no length prefix).
use bstr::ByteSlice;

use crate::core::error::{Error, ErrorKind};

pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

const BOUNDARY_PARAM: &str = "boundary=";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoundaryToken {
    bytes: Vec<u8>,
}

impl BoundaryToken {
    /// Parses `multipart/form-data; boundary=<token>` into `--<token>`.
    ///
    /// The value runs to the next `;` (or end of header); surrounding whitespace and one pair of
    /// double quotes are removed. Media-type and parameter names match ASCII case-insensitively.
    pub fn from_content_type(header: &str) -> Result<Self, Error> {
        let lowered = header.to_ascii_lowercase();
        if !lowered.contains(MULTIPART_FORM_DATA) {
            return Err(Error::new(ErrorKind::InvalidContentType)
                .with_message("content type is not multipart/form-data")
                .with_hint("Send the upload as multipart/form-data with a boundary parameter."));
        }
        let Some(start) = lowered.find(BOUNDARY_PARAM) else {
            return Err(Error::new(ErrorKind::MissingBoundary)
                .with_message("content type has no boundary parameter"));
        };
        let rest = &header[start + BOUNDARY_PARAM.len()..];
        let value = rest.split(';').next().unwrap_or_default().trim();
        let value = value
            .strip_prefix('"')
            .and_then(|inner| inner.strip_suffix('"'))
            .unwrap_or(value);
        if value.is_empty() {
            return Err(Error::new(ErrorKind::MissingBoundary)
                .with_message("boundary parameter is empty"));
        }
        Ok(Self::from_boundary(value))
    }

    pub fn from_boundary(boundary: &str) -> Self {
        let mut bytes = Vec::with_capacity(boundary.len() + 2);
        bytes.extend_from_slice(b"--");
        bytes.extend_from_slice(boundary.as_bytes());
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Absolute offset of the next occurrence at or after `from`.
    pub fn find_in(&self, haystack: &[u8], from: usize) -> Option<usize> {
        if from > haystack.len() {
            return None;
        }
        haystack[from..]
            .find(&self.bytes)
            .map(|relative| from + relative)
    }
}
