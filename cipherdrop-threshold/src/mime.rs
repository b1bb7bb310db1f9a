//! Best-effort MIME detection for decrypted payloads.

/// Sniffs a MIME type from magic bytes, falling back to a UTF-8 heuristic.
///
/// Returns `None` when the payload is shorter than four bytes; anything
/// unrecognized comes back as `application/octet-stream`.
pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() < 4 {
        return None;
    }

    let mime = if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        "image/png"
    } else if data.starts_with(&[0x47, 0x49, 0x46, 0x38]) {
        "image/gif"
    } else if data.starts_with(b"%PDF") {
        "application/pdf"
    } else if data.starts_with(&[0x50, 0x4B]) {
        "application/zip"
    } else if looks_like_text(data) {
        "text/plain"
    } else {
        "application/octet-stream"
    };
    Some(mime.to_string())
}

/// UTF-8 heuristic over the first 100 bytes: decodable, with fewer than
/// 10% control characters outside tab, LF, and CR.
fn looks_like_text(data: &[u8]) -> bool {
    let head = &data[..data.len().min(100)];
    let Ok(text) = std::str::from_utf8(head) else {
        return false;
    };
    let total = text.chars().count();
    let non_printable = text
        .chars()
        .filter(|c| {
            let code = *c as u32;
            code < 32 && !matches!(code, 9 | 10 | 13)
        })
        .count();
    (non_printable as f64) < (total as f64) * 0.1
}

/// Picks a MIME type from a declared value or a filename extension.
///
/// A declared type always wins. Unknown extensions and missing filenames
/// fall back to `application/octet-stream`.
pub fn detect_file_type(filename: Option<&str>, declared_mime: Option<&str>) -> String {
    if let Some(mime) = declared_mime {
        if !mime.is_empty() {
            return mime.to_string();
        }
    }

    let ext = filename
        .and_then(|f| f.rsplit('.').next())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" => "text/plain",
        "json" => "application/json",
        "html" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    };
    mime.to_string()
}
