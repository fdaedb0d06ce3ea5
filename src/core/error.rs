//! Purpose: Crate-wide error model shared by both codecs and the persistence collaborator.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`, `http_status`.
//! Role: One structured error with builder-style context instead of per-module error enums.
//! Invariants: Exit-code and HTTP-status mappings are stable once published.
//! Invariants: Structural decode failures map to 400-class statuses; I/O maps to 500.
use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    InvalidContentType,
    MissingBoundary,
    EmptyAttachment,
    Malformed,
    AlreadyExists,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    path: Option<PathBuf>,
    offset: Option<usize>,
    field: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            path: None,
            offset: None,
            field: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {field})")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        if let Some(offset) = self.offset {
            write!(f, " (offset: {offset})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::InvalidContentType => 3,
        ErrorKind::MissingBoundary => 4,
        ErrorKind::EmptyAttachment => 5,
        ErrorKind::Malformed => 6,
        ErrorKind::AlreadyExists => 7,
        ErrorKind::Io => 8,
    }
}

/// Status code an HTTP layer should answer with for this kind.
pub fn http_status(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::Usage
        | ErrorKind::InvalidContentType
        | ErrorKind::MissingBoundary
        | ErrorKind::EmptyAttachment
        | ErrorKind::Malformed => 400,
        ErrorKind::AlreadyExists => 409,
        ErrorKind::Internal | ErrorKind::Io => 500,
    }
}
