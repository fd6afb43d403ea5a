//! Extension lookup tables.

use super::types::MediaCategory;

pub const AUDIO_FORMATS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac", "m4a"];
pub const VIDEO_FORMATS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm", "wmv", "flv"];
pub const IMAGE_FORMATS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp", "tiff"];
pub const DOCUMENT_FORMATS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "rtf", "odt", "xls", "xlsx", "ppt", "pptx",
];

/// Lowercases an extension and strips any leading dots and whitespace.
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Returns the category of an extension. Unknown extensions are `Other`.
pub fn category_of(extension: &str) -> MediaCategory {
    let ext = normalize_extension(extension);
    let ext = ext.as_str();
    if AUDIO_FORMATS.contains(&ext) {
        MediaCategory::Audio
    } else if VIDEO_FORMATS.contains(&ext) {
        MediaCategory::Video
    } else if IMAGE_FORMATS.contains(&ext) {
        MediaCategory::Image
    } else if DOCUMENT_FORMATS.contains(&ext) {
        MediaCategory::Document
    } else {
        MediaCategory::Other
    }
}

/// Returns every extension the given source extension may be converted into.
///
/// Video sources additionally allow every audio format (audio track
/// extraction). The source itself is part of its own set.
pub fn compatible_targets(extension: &str) -> Vec<String> {
    let targets: Vec<&str> = match category_of(extension) {
        MediaCategory::Audio => AUDIO_FORMATS.to_vec(),
        MediaCategory::Video => VIDEO_FORMATS
            .iter()
            .chain(AUDIO_FORMATS.iter())
            .copied()
            .collect(),
        MediaCategory::Image => IMAGE_FORMATS.to_vec(),
        MediaCategory::Document => DOCUMENT_FORMATS.to_vec(),
        MediaCategory::Other => Vec::new(),
    };
    targets.into_iter().map(str::to_string).collect()
}

/// Whether `target` is a legal conversion target for `source`.
pub fn is_compatible(source: &str, target: &str) -> bool {
    let target = normalize_extension(target);
    compatible_targets(source).iter().any(|t| *t == target)
}

/// Extracts the lowercased extension after the last dot of a file name.
///
/// Returns an empty string when the name has no extension.
pub fn detect_format(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => normalize_extension(ext),
        _ => String::new(),
    }
}

/// Returns the file name without its extension.
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

/// Returns the MIME type used when serving a file of this extension.
pub fn mime_type(extension: &str) -> &'static str {
    match normalize_extension(extension).as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "rtf" => "application/rtf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "odt" => "application/vnd.oasis.opendocument.text",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}
