pub mod hash;
pub mod storage;

pub use hash::{compute_hash, derive_cache_key};
pub use storage::LocalFileStorage;

const ALLOWED_UPLOAD_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

fn extension_of(file_name: &str) -> Option<String> {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// MIME type from the file extension; unknown extensions are treated as PNG.
pub fn mime_type_for_path(file_name: &str) -> &'static str {
    match extension_of(file_name).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

/// Suffix used when storing an upload: the lower-cased original one when it
/// is an accepted image type, `.png` otherwise.
pub fn upload_suffix(file_name: &str) -> String {
    match extension_of(file_name) {
        Some(ext) if ALLOWED_UPLOAD_EXTENSIONS.contains(&ext.as_str()) => format!(".{ext}"),
        _ => ".png".to_string(),
    }
}
