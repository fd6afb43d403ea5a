//! Format registry.
//!
//! Static lookup tables mapping a file extension to its media category and
//! to the set of extensions it may legally be converted into. Every function
//! here is pure and total: unknown extensions map to [`MediaCategory::Other`]
//! with no compatible targets, which callers treat as "no conversion
//! possible" rather than as an error.

mod registry;
mod types;

pub use registry::{
    category_of, compatible_targets, detect_format, file_stem, is_compatible, mime_type,
    normalize_extension, AUDIO_FORMATS, DOCUMENT_FORMATS, IMAGE_FORMATS, VIDEO_FORMATS,
};
pub use types::{MediaCategory, MediaFormat};
