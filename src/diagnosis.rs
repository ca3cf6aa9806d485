//! Canned diagnosis for uploaded plant images.
//!
//! No model looks at the pixels. The upload is checked for size and a
//! recognised image signature, hashed for a stable id, and answered with a
//! fixed finding whose advice comes from the same keyword lookup as the form.

use crate::error::{AgriError, Result};
use crate::lookup;
use crate::models::Diagnosis;

pub const FINDING: &str =
    "Leaf discoloration consistent with early nutrient stress; confirm with a soil test.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
        }
    }

    /// Identify the format from leading magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }
}

/// Stable id for an upload: first 16 hex chars of its BLAKE3 hash
pub fn image_id(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex()[..16].to_string()
}

pub fn diagnose(bytes: &[u8], max_bytes: usize) -> Result<Diagnosis> {
    if bytes.is_empty() {
        return Err(AgriError::validation("uploaded image is empty"));
    }
    if bytes.len() > max_bytes {
        return Err(AgriError::PayloadTooLarge { limit: max_bytes });
    }
    let format = ImageFormat::sniff(bytes).ok_or_else(|| AgriError::UnsupportedMedia {
        message: "expected a PNG, JPEG, GIF, or WebP image".to_string(),
    })?;

    let diagnosis = Diagnosis {
        image_id: image_id(bytes),
        format: format.as_str().to_string(),
        size_bytes: bytes.len(),
        finding: FINDING.to_string(),
        recommendations: lookup::recommend(FINDING),
    };
    tracing::debug!(
        "Diagnosed {} image {} ({} bytes)",
        diagnosis.format,
        diagnosis.image_id,
        diagnosis.size_bytes
    );
    Ok(diagnosis)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    #[test]
    fn sniffs_supported_formats() {
        assert_eq!(ImageFormat::sniff(PNG), Some(ImageFormat::Png));
        assert_eq!(
            ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::sniff(b"GIF89a...."), Some(ImageFormat::Gif));
        assert_eq!(
            ImageFormat::sniff(b"RIFF\x10\x00\x00\x00WEBPVP8 "),
            Some(ImageFormat::Webp)
        );
        assert_eq!(ImageFormat::sniff(b"RIFF\x10\x00\x00\x00WAVE"), None);
        assert_eq!(ImageFormat::sniff(b"%PDF-1.7"), None);
    }

    #[test]
    fn diagnosis_is_canned_and_stable() {
        let a = diagnose(PNG, 1024).unwrap();
        let b = diagnose(PNG, 1024).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.format, "png");
        assert_eq!(a.size_bytes, PNG.len());
        assert_eq!(a.image_id.len(), 16);
        assert_eq!(a.finding, FINDING);
        assert_eq!(a.recommendations, lookup::recommend(FINDING));
    }

    #[test]
    fn different_bytes_get_different_ids() {
        let mut other = PNG.to_vec();
        other.push(0);
        assert_ne!(image_id(PNG), image_id(&other));
    }

    #[test]
    fn rejects_empty_oversized_and_unknown() {
        assert!(matches!(diagnose(&[], 10), Err(AgriError::Validation { .. })));
        assert!(matches!(
            diagnose(PNG, 4),
            Err(AgriError::PayloadTooLarge { limit: 4 })
        ));
        assert!(matches!(
            diagnose(b"hello world", 1024),
            Err(AgriError::UnsupportedMedia { .. })
        ));
    }
}
