// src/media.rs

/// What the declared media type tells us about how to read the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Page-description document: try native text first.
    Pdf,
    /// Raster image: straight to OCR.
    Image,
    Unsupported,
}

impl MediaKind {
    /// Classify a declared MIME type. Parameters and case are ignored.
    pub fn from_declared(media_type: &str) -> Self {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/pdf" | "application/x-pdf" => MediaKind::Pdf,
            "image/jpeg" | "image/jpg" | "image/png" | "image/webp" | "image/tiff"
            | "image/bmp" => MediaKind::Image,
            _ => MediaKind::Unsupported,
        }
    }
}

/// Guess a media type from a file extension. Only the CLI uses this; the
/// pipeline always trusts the caller's declared type.
pub fn media_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => Some("application/pdf"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "tif" | "tiff" => Some("image/tiff"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_declared_types() {
        assert_eq!(MediaKind::from_declared("application/pdf"), MediaKind::Pdf);
        assert_eq!(MediaKind::from_declared("image/jpeg"), MediaKind::Image);
        assert_eq!(MediaKind::from_declared("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_declared("image/webp"), MediaKind::Image);
        assert_eq!(MediaKind::from_declared("text/plain"), MediaKind::Unsupported);
        assert_eq!(MediaKind::from_declared(""), MediaKind::Unsupported);
    }

    #[test]
    fn ignores_case_and_parameters() {
        assert_eq!(
            MediaKind::from_declared("Application/PDF; name=bl.pdf"),
            MediaKind::Pdf
        );
        assert_eq!(MediaKind::from_declared(" IMAGE/PNG "), MediaKind::Image);
    }

    #[test]
    fn extension_lookup() {
        assert_eq!(media_type_for_extension("PDF"), Some("application/pdf"));
        assert_eq!(media_type_for_extension("jpg"), Some("image/jpeg"));
        assert_eq!(media_type_for_extension("docx"), None);
    }
}
