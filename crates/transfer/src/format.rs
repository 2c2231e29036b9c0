/// Formats a byte count for display (`0 Bytes`, `1.5 KB`, `2 MB`).
///
/// Base 1024, capped at GB, rounded to two decimals with trailing zeros
/// dropped.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

/// Broad category of a stored file, used to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
    Document,
    Text,
    Other,
}

impl FileKind {
    /// Classifies a MIME type. Checks run in order, so
    /// `application/vnd.openxmlformats-officedocument.wordprocessingml.document`
    /// is a [`FileKind::Document`] even though it also mentions "document".
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            FileKind::Image
        } else if mime_type.contains("pdf") {
            FileKind::Pdf
        } else if mime_type.contains("word") || mime_type.contains("document") {
            FileKind::Document
        } else if mime_type.contains("text") {
            FileKind::Text
        } else {
            FileKind::Other
        }
    }

    /// Icon glyph for terminal and web views.
    pub fn icon(self) -> &'static str {
        match self {
            FileKind::Image => "\u{1f5bc}\u{fe0f}",
            FileKind::Pdf => "\u{1f4c4}",
            FileKind::Document => "\u{1f4dd}",
            FileKind::Text => "\u{1f4c3}",
            FileKind::Other => "\u{1f4ce}",
        }
    }
}
