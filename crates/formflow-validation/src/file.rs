//! Upload checks based on file name and declared content type
//!
//! Nothing here decodes file contents; an "image" is a file whose extension
//! and content type both look like one.

/// Extensions accepted for image uploads
pub const IMAGE_EXTENSIONS: &[&str] = &["bmp", "gif", "jpeg", "jpg", "png", "tif", "tiff", "webp"];

/// Lowercased extension of a file name, if it has one
pub fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether the file's extension is in the allow-list (case-insensitive)
pub fn has_allowed_extension(filename: &str, allowed: &[String]) -> bool {
    file_extension(filename)
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)))
        .unwrap_or(false)
}

/// Extension and content-type check for images
pub fn looks_like_image(filename: &str, content_type: Option<&str>) -> bool {
    let extension_ok = file_extension(filename)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);

    let content_type_ok = content_type
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(true);

    extension_ok && content_type_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("resume.PDF"), Some("pdf".to_string()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(".hidden"), None);
    }

    #[test]
    fn test_allowed_extension() {
        let allowed = vec!["pdf".to_string(), "docx".to_string()];
        assert!(has_allowed_extension("cv.PDF", &allowed));
        assert!(!has_allowed_extension("cv.exe", &allowed));
        assert!(!has_allowed_extension("cv", &allowed));
    }

    #[test]
    fn test_looks_like_image() {
        assert!(looks_like_image("me.png", Some("image/png")));
        assert!(looks_like_image("me.JPG", None));
        assert!(!looks_like_image("me.png", Some("application/pdf")));
        assert!(!looks_like_image("me.pdf", Some("image/png")));
    }
}
