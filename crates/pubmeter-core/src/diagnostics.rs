//! Non-fatal diagnostic channel for extraction and annotation.
//!
//! Page-level recoverable issues and advisories accumulate as [`Diagnostic`]
//! values on the result instead of aborting the document. Fatal conditions
//! use the error type in the `pubmeter` crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable code categorizing a non-fatal condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail")]
pub enum DiagnosticCode {
    /// A page carries no usable text layer and is covered by raster images.
    RasterizedPage,
    /// Character codes on a page could not be mapped to Unicode.
    UndecodableGlyphs,
    /// The page declares no CropBox; MediaBox was used instead.
    MissingCropBox,
    /// A measured margin was negative and was clamped to zero.
    ClampedMargin,
    /// The document type classifier fired too few signals to be confident.
    LowConfidenceType,
    /// A painted image's placement could not be resolved.
    UnresolvedImagePlacement,
    /// An annotation request referenced a page outside the document.
    AnnotationSkipped,
    /// Any other condition not covered by specific variants.
    Other(String),
}

impl DiagnosticCode {
    /// Returns the string tag for this code.
    pub fn as_str(&self) -> &str {
        match self {
            DiagnosticCode::RasterizedPage => "RASTERIZED_PAGE",
            DiagnosticCode::UndecodableGlyphs => "UNDECODABLE_GLYPHS",
            DiagnosticCode::MissingCropBox => "MISSING_CROP_BOX",
            DiagnosticCode::ClampedMargin => "CLAMPED_MARGIN",
            DiagnosticCode::LowConfidenceType => "LOW_CONFIDENCE_TYPE",
            DiagnosticCode::UnresolvedImagePlacement => "UNRESOLVED_IMAGE_PLACEMENT",
            DiagnosticCode::AnnotationSkipped => "ANNOTATION_SKIPPED",
            DiagnosticCode::Other(_) => "OTHER",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal condition recorded during extraction or annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Category of the condition.
    pub code: DiagnosticCode,
    /// Human-readable description.
    pub message: String,
    /// 0-based page index the condition applies to, if page-scoped.
    pub page: Option<usize>,
}

impl Diagnostic {
    /// Create a document-scoped diagnostic.
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
        }
    }

    /// Create a page-scoped diagnostic.
    pub fn on_page(code: DiagnosticCode, message: impl Into<String>, page: usize) -> Self {
        Self {
            code,
            message: message.into(),
            page: Some(page),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(f, "[{}] page {}: {}", self.code, page, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_string_tags() {
        assert_eq!(DiagnosticCode::RasterizedPage.as_str(), "RASTERIZED_PAGE");
        assert_eq!(DiagnosticCode::ClampedMargin.as_str(), "CLAMPED_MARGIN");
        assert_eq!(
            DiagnosticCode::Other("custom".to_string()).as_str(),
            "OTHER"
        );
    }

    #[test]
    fn display_includes_page_when_scoped() {
        let d = Diagnostic::on_page(DiagnosticCode::MissingCropBox, "fallback to MediaBox", 4);
        assert_eq!(
            d.to_string(),
            "[MISSING_CROP_BOX] page 4: fallback to MediaBox"
        );

        let d = Diagnostic::new(DiagnosticCode::LowConfidenceType, "no signals fired");
        assert_eq!(d.to_string(), "[LOW_CONFIDENCE_TYPE] no signals fired");
    }

    #[test]
    fn serializes_with_tagged_code() {
        let d = Diagnostic::on_page(DiagnosticCode::RasterizedPage, "scan", 0);
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"code\":\"RasterizedPage\""));
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
