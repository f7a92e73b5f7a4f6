//! Document extraction pipeline.
//!
//! Orchestrates the per-page interpreter and the measurement primitives in
//! `pubmeter-core` into a single [`ExtractionResult`]: text runs in reading
//! order, image placements with effective resolution, margins, page content
//! classification, identifier scanning, and document type detection.

use pubmeter_core::{
    BBox, DetectionResult, Diagnostic, DiagnosticCode, DocumentMetadata, ImageRecord,
    MarginOptions, PageExtraction, PageKind, PageRecord, RasterOptions, SignalInput, TextRun,
    assign_reading_order, classify, compute_margins, derive_weight, effective_dpi, fold_text,
    is_full_bleed, normalize_family, placement_bbox, scan_identifiers,
};
use tracing::{debug, warn};

use crate::content::{RawImage, RawSpan, interpret_page};
use crate::document::Document;
use crate::error::ExtractError;

/// Undecodable-glyph ratio above which a page earns a diagnostic.
const UNDECODABLE_WARN_RATIO: f64 = 0.05;

/// Detection confidence below which the result earns a diagnostic.
const LOW_CONFIDENCE: f64 = 0.2;

/// Pages sampled for the classifier text and table-of-contents probe.
const CLASSIFIER_SAMPLE_PAGES: usize = 5;

/// Tuning knobs for one extraction pass.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub margins: MarginOptions,
    pub raster: RasterOptions,
}

pub use pubmeter_core::ExtractionResult;

/// Run the full measurement pass over a document already in memory.
pub fn extract_document(bytes: &[u8]) -> Result<ExtractionResult, ExtractError> {
    extract_document_with(bytes, &ExtractOptions::default())
}

/// [`extract_document`] with explicit options.
pub fn extract_document_with(
    bytes: &[u8],
    options: &ExtractOptions,
) -> Result<ExtractionResult, ExtractError> {
    let doc = Document::open(bytes)?;
    extract_opened(&doc, options)
}

/// Extract from a document that may require a password.
pub fn extract_document_with_password(
    bytes: &[u8],
    password: &str,
    options: &ExtractOptions,
) -> Result<ExtractionResult, ExtractError> {
    let doc = Document::open_with_password(bytes, password)?;
    extract_opened(&doc, options)
}

fn extract_opened(doc: &Document, options: &ExtractOptions) -> Result<ExtractionResult, ExtractError> {
    let page_count = doc.page_count();
    let mut pages = Vec::with_capacity(page_count);
    let mut diagnostics = Vec::new();
    let mut folded_pages = Vec::with_capacity(page_count);

    for index in 0..page_count {
        let (geometry, crop_diag) = doc.page_geometry(index)?;
        diagnostics.extend(crop_diag);

        let content = match interpret_page(doc, index) {
            Ok(content) => content,
            Err(ExtractError::CorruptDocument(msg)) => {
                // A broken content stream loses one page, not the document
                warn!(page = index, error = %msg, "skipping unreadable page content");
                diagnostics.push(Diagnostic::on_page(
                    DiagnosticCode::Other("unreadable-content".to_string()),
                    msg,
                    index,
                ));
                Default::default()
            }
            Err(other) => return Err(other),
        };

        let crop = geometry.crop_rect();
        let mut runs = build_text_runs(index, &geometry, &content.spans);
        assign_reading_order(&mut runs);

        let images = build_image_records(index, &crop, &geometry, &content.images, &mut diagnostics);

        let (margins, margin_diags) =
            compute_margins(index, &crop, &runs, &images, &options.margins);
        diagnostics.extend(margin_diags);

        let text_yield: usize = runs.iter().map(|r| r.text.chars().count()).sum();
        let undecodable: usize = runs.iter().map(TextRun::undecodable_count).sum();
        let undecodable_ratio = if text_yield == 0 {
            0.0
        } else {
            undecodable as f64 / text_yield as f64
        };
        if undecodable_ratio > UNDECODABLE_WARN_RATIO {
            diagnostics.push(Diagnostic::on_page(
                DiagnosticCode::UndecodableGlyphs,
                format!(
                    "{undecodable} of {text_yield} characters could not be decoded"
                ),
                index,
            ));
        }

        let coverage = image_coverage(&crop, &images);
        let kind = pubmeter_core::classify_page_content(text_yield, coverage, &options.raster);
        if kind == PageKind::Rasterized {
            diagnostics.push(Diagnostic::on_page(
                DiagnosticCode::RasterizedPage,
                "page has no usable text layer",
                index,
            ));
        }

        debug!(
            page = index,
            runs = runs.len(),
            images = images.len(),
            text_yield,
            kind = ?kind,
            "extracted page"
        );

        folded_pages.push(fold_text(
            &runs.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join(" "),
        ));

        pages.push(PageExtraction {
            page: PageRecord {
                index,
                rotation: geometry.rotation,
                crop_box: crop,
                kind,
                text_yield,
                undecodable_ratio,
            },
            text_runs: runs,
            images,
            margins,
        });
    }

    let metadata = build_metadata(doc, &folded_pages);
    let detection = detect_type(&pages, &folded_pages, metadata.isbn.is_some());
    if detection.confidence < LOW_CONFIDENCE {
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::LowConfidenceType,
            format!(
                "document type {} detected at confidence {:.2}",
                detection.predicted_type.label(),
                detection.confidence
            ),
        ));
    }

    Ok(ExtractionResult {
        metadata,
        detection,
        pages,
        diagnostics,
    })
}

/// Convert raw interpreter spans into page-space text runs.
fn build_text_runs(
    index: usize,
    geometry: &crate::document::PageGeometry,
    spans: &[RawSpan],
) -> Vec<TextRun> {
    spans
        .iter()
        .map(|span| {
            // Raw bbox holds PDF y-min/y-max; both corners map through the
            // crop transform, which flips the y order.
            let a = geometry.to_top_left(span.bbox.x0, span.bbox.bottom);
            let b = geometry.to_top_left(span.bbox.x1, span.bbox.top);
            let flags = (span.font_flags != 0).then_some(span.font_flags);
            TextRun {
                page: index,
                text: span.text.clone(),
                bbox: BBox::new(a.x, a.y, b.x, b.y),
                font_family: normalize_family(&span.font_name),
                font_family_raw: span.font_name.clone(),
                size_pt: span.size_pt,
                weight: derive_weight(&span.font_name, flags),
                color: span.color,
                reading_order_index: 0,
            }
        })
        .collect()
}

/// Convert raw image placements into measured records, dropping placements
/// whose XObject never resolved.
fn build_image_records(
    index: usize,
    crop: &BBox,
    geometry: &crate::document::PageGeometry,
    images: &[RawImage],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ImageRecord> {
    images
        .iter()
        .filter_map(|raw| {
            if !raw.resolved {
                diagnostics.push(Diagnostic::on_page(
                    DiagnosticCode::UnresolvedImagePlacement,
                    format!("XObject /{} could not be resolved", raw.name),
                    index,
                ));
                return None;
            }
            // Flip against the raw crop's y-max, then shift x onto the
            // crop origin, mirroring the text run transform.
            let raw_crop = &geometry.crop_box_raw;
            let flipped = placement_bbox(&raw.ctm, raw_crop.bottom);
            let bbox = BBox::new(
                flipped.x0 - raw_crop.x0,
                flipped.top,
                flipped.x1 - raw_crop.x0,
                flipped.bottom,
            );
            Some(ImageRecord {
                page: index,
                bbox,
                pixel_width: raw.pixel_width,
                pixel_height: raw.pixel_height,
                dpi_x: effective_dpi(raw.pixel_width, bbox.width()),
                dpi_y: effective_dpi(raw.pixel_height, bbox.height()),
                color_space: raw.color_space.clone(),
                is_full_bleed: is_full_bleed(&bbox, crop),
            })
        })
        .collect()
}

/// Fraction of the crop area covered by image placements, clamped to 1.
fn image_coverage(crop: &BBox, images: &[ImageRecord]) -> f64 {
    let crop_area = crop.area();
    if crop_area <= 0.0 {
        return 0.0;
    }
    let covered: f64 = images
        .iter()
        .map(|i| i.bbox.intersection_area(crop))
        .sum();
    (covered / crop_area).min(1.0)
}

fn build_metadata(doc: &Document, folded_pages: &[String]) -> DocumentMetadata {
    let info = doc.info_fields();
    let (isbn, doi, job_number, identifier_sources) = scan_identifiers(folded_pages);

    if isbn.is_none() && doi.is_none() && job_number.is_none() {
        debug!("no identifiers found in document text");
    }

    DocumentMetadata {
        title: info.title,
        author: info.author,
        creator: info.creator,
        producer: info.producer,
        creation_date: info.creation_date,
        isbn,
        doi,
        job_number,
        page_count: doc.page_count(),
        identifier_sources,
    }
}

fn detect_type(
    pages: &[PageExtraction],
    folded_pages: &[String],
    has_isbn: bool,
) -> DetectionResult {
    let sample = folded_pages
        .iter()
        .take(CLASSIFIER_SAMPLE_PAGES)
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    let has_toc = pages
        .iter()
        .take(CLASSIFIER_SAMPLE_PAGES)
        .flat_map(|p| p.text_runs.iter())
        .any(|run| {
            let folded = fold_text(&run.text);
            folded == "contents" || folded == "table of contents"
        });

    classify(&SignalInput {
        page_count: pages.len(),
        text: &sample,
        has_isbn,
        has_toc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubmeter_core::Ctm;

    fn image(bbox: BBox) -> ImageRecord {
        ImageRecord {
            page: 0,
            bbox,
            pixel_width: 100,
            pixel_height: 100,
            dpi_x: 72.0,
            dpi_y: 72.0,
            color_space: "DeviceRGB".to_string(),
            is_full_bleed: false,
        }
    }

    #[test]
    fn coverage_sums_intersections() {
        let crop = BBox::new(0.0, 0.0, 100.0, 100.0);
        let images = [
            image(BBox::new(0.0, 0.0, 50.0, 100.0)),
            image(BBox::new(50.0, 0.0, 100.0, 50.0)),
        ];
        let coverage = image_coverage(&crop, &images);
        assert!((coverage - 0.75).abs() < 1e-9);
    }

    #[test]
    fn coverage_clamps_overlapping_images() {
        let crop = BBox::new(0.0, 0.0, 100.0, 100.0);
        let full = image(BBox::new(-10.0, -10.0, 110.0, 110.0));
        let images = [full.clone(), full];
        assert_eq!(image_coverage(&crop, &images), 1.0);
    }

    #[test]
    fn unresolved_placement_becomes_diagnostic() {
        let crop = BBox::new(0.0, 0.0, 100.0, 100.0);
        let geometry = crate::document::PageGeometry {
            index: 0,
            rotation: 0,
            crop_box_raw: BBox::new(0.0, 0.0, 100.0, 100.0),
            crop_missing: false,
        };
        let raw = RawImage {
            name: "Im1".to_string(),
            ctm: Ctm::IDENTITY,
            pixel_width: 0,
            pixel_height: 0,
            color_space: String::new(),
            resolved: false,
        };
        let mut diagnostics = Vec::new();
        let records = build_image_records(0, &crop, &geometry, &[raw], &mut diagnostics);
        assert!(records.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].code,
            DiagnosticCode::UnresolvedImagePlacement
        );
    }
}
