//! Purpose: Filename-derived hints for uploaded attachments.
//! Exports: `extension_of`, `content_type_for`, `file_type_label`, `format_file_size`.
//! Role: Small lookup helpers shared by the multipart decoder and the attachment store.
//! Invariants: Lookups are case-insensitive on the extension and never fail.

const OCTET_STREAM: &str = "application/octet-stream";
const MAX_EXTENSION_LEN: usize = 16;

/// Returns the extension (with its leading dot) of the filename's basename.
///
/// Client paths such as `C:\clips\intro.mp4` are reduced to their last component first. Only
/// short ASCII-alphanumeric extensions are accepted so the result is safe to embed in a
/// storage filename.
pub fn extension_of(filename: &str) -> Option<&str> {
    let basename = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let dot = basename.rfind('.')?;
    let ext = &basename[dot..];
    let stem = &ext[1..];
    if stem.is_empty()
        || stem.len() > MAX_EXTENSION_LEN
        || !stem.bytes().all(|byte| byte.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext)
}

pub fn content_type_for(filename: &str) -> &'static str {
    let Some(ext) = extension_of(filename) else {
        return OCTET_STREAM;
    };
    match ext.to_ascii_lowercase().as_str() {
        ".mp4" => "video/mp4",
        ".webm" => "video/webm",
        ".ogg" => "video/ogg",
        ".mov" => "video/quicktime",
        ".avi" => "video/x-msvideo",
        ".pdf" => "application/pdf",
        ".doc" | ".docx" => "application/msword",
        ".ppt" | ".pptx" => "application/vnd.ms-powerpoint",
        ".xls" | ".xlsx" => "application/vnd.ms-excel",
        ".txt" => "text/plain",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        _ => OCTET_STREAM,
    }
}

/// Upper-cased extension without the dot, or `FILE` when there is none.
pub fn file_type_label(filename: &str) -> String {
    extension_of(filename)
        .map(|ext| ext[1..].to_ascii_uppercase())
        .unwrap_or_else(|| "FILE".to_string())
}

pub fn format_file_size(len: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if len < KIB {
        format!("{len} B")
    } else if len < MIB {
        format!("{:.1} KB", len as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", len as f64 / MIB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::{content_type_for, extension_of, file_type_label, format_file_size};

    #[test]
    fn extension_uses_basename_and_last_dot() {
        assert_eq!(extension_of("lecture.final.MP4"), Some(".MP4"));
        assert_eq!(extension_of("C:\\clips\\intro.webm"), Some(".webm"));
        assert_eq!(extension_of("dir.v2/README"), None);
        assert_eq!(extension_of("trailing."), None);
        assert_eq!(extension_of("weird.m p4"), None);
    }

    #[test]
    fn content_types_cover_videos_and_documents() {
        assert_eq!(content_type_for("a.MOV"), "video/quicktime");
        assert_eq!(content_type_for("notes.docx"), "application/msword");
        assert_eq!(content_type_for("photo.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("archive.tar"), "application/octet-stream");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn file_type_label_falls_back_to_file() {
        assert_eq!(file_type_label("slides.pptx"), "PPTX");
        assert_eq!(file_type_label("Makefile"), "FILE");
    }

    #[test]
    fn file_size_units() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }
}
