//! Annotation writing.
//!
//! Turns [`AnnotationRequest`]s into standard `/Text` annotations appended
//! to each page's `/Annots` array, so any stock viewer renders them without
//! a custom appearance stream. Placement is delegated to the deterministic
//! layout in `pubmeter_core::annotate`; this module only converts resolved
//! top-left positions back into PDF coordinates and serializes.

use std::collections::HashMap;

use lopdf::{Dictionary, Object, ObjectId, StringFormat};
use pubmeter_core::{
    AnnotationRequest, Diagnostic, DiagnosticCode, PageLayout, PlacedAnnotation, Severity,
    summary_message,
};
use tracing::{debug, warn};

use crate::document::{Document, PageGeometry};
use crate::error::ExtractError;

/// Rendered square of a text note icon in points.
const NOTE_RECT_PT: f64 = 18.0;

/// Author string written into each note's /T entry.
const NOTE_AUTHOR: &[u8] = b"pubmeter";

/// Writes reviewer annotations into a copy of a document.
///
/// Open, place one batch of requests, then [`finish`](Self::finish) to get
/// the annotated bytes. Requests for pages the document does not have are
/// skipped with a diagnostic rather than failing the batch.
pub struct AnnotationWriter {
    doc: Document,
    layouts: HashMap<usize, PageLayout>,
    geometries: HashMap<usize, PageGeometry>,
    placed: Vec<PlacedAnnotation>,
    diagnostics: Vec<Diagnostic>,
}

/// Output of a one-shot [`annotate_document`] run.
#[derive(Debug)]
pub struct AnnotatedPdf {
    /// Serialized document with the notes applied.
    pub bytes: Vec<u8>,
    /// Resolved note positions, summary first, in placement order.
    pub placed: Vec<PlacedAnnotation>,
    /// Per-request conditions (skipped pages and the like).
    pub diagnostics: Vec<Diagnostic>,
}

/// Write one batch of reviewer annotations onto a document.
pub fn annotate_document(
    bytes: &[u8],
    requests: &[AnnotationRequest],
) -> Result<AnnotatedPdf, ExtractError> {
    let mut writer = AnnotationWriter::open(bytes)?;
    writer.place(requests);
    writer.into_annotated()
}

impl AnnotationWriter {
    /// Open a document for annotation.
    pub fn open(bytes: &[u8]) -> Result<Self, ExtractError> {
        Ok(Self {
            doc: Document::open(bytes)?,
            layouts: HashMap::new(),
            geometries: HashMap::new(),
            placed: Vec::new(),
            diagnostics: Vec::new(),
        })
    }

    /// Place a batch of annotation requests.
    ///
    /// A summary note counting errors and warnings is placed on page 1
    /// before any individual notes, so it always claims the first slot of
    /// the margin column. An empty batch writes nothing. Requests that
    /// cannot be written (out-of-range or malformed pages) are skipped
    /// with a diagnostic; a batch never fails as a whole.
    pub fn place(&mut self, requests: &[AnnotationRequest]) {
        if requests.is_empty() {
            return;
        }

        let summary = AnnotationRequest {
            page: 0,
            anchor: None,
            message: summary_message(requests),
            severity: Severity::Info,
            reviewer_note: None,
        };
        self.note_or_skip(&summary);

        for request in requests {
            if request.page >= self.doc.page_count() {
                warn!(
                    page = request.page,
                    pages = self.doc.page_count(),
                    "annotation request beyond last page, skipping"
                );
                self.diagnostics.push(Diagnostic::on_page(
                    DiagnosticCode::AnnotationSkipped,
                    format!(
                        "requested page {} but document has {} pages",
                        request.page,
                        self.doc.page_count()
                    ),
                    request.page,
                ));
                continue;
            }
            self.note_or_skip(request);
        }
    }

    /// Write one note, downgrading any failure to a skip diagnostic.
    /// A malformed page loses its own notes, never the rest of the batch.
    fn note_or_skip(&mut self, request: &AnnotationRequest) {
        if let Err(e) = self.write_note(request) {
            warn!(page = request.page, error = %e, "failed to write note, skipping");
            self.diagnostics.push(Diagnostic::on_page(
                DiagnosticCode::AnnotationSkipped,
                format!("page {}: {e}", request.page),
                request.page,
            ));
        }
    }

    /// Diagnostics accumulated while placing requests.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Resolved positions of every note written so far, summary included.
    pub fn placed(&self) -> &[PlacedAnnotation] {
        &self.placed
    }

    /// Serialize the annotated document.
    pub fn finish(mut self) -> Result<Vec<u8>, ExtractError> {
        let mut out = Vec::new();
        self.doc
            .inner_mut()
            .save_to(&mut out)
            .map_err(|e| ExtractError::Write(format!("failed to serialize document: {e}")))?;
        debug!(
            notes = self.placed.len(),
            bytes = out.len(),
            "annotated document serialized"
        );
        Ok(out)
    }

    /// Serialize, keeping the placement list and diagnostics.
    fn into_annotated(mut self) -> Result<AnnotatedPdf, ExtractError> {
        let placed = std::mem::take(&mut self.placed);
        let diagnostics = std::mem::take(&mut self.diagnostics);
        let bytes = self.finish()?;
        Ok(AnnotatedPdf {
            bytes,
            placed,
            diagnostics,
        })
    }

    fn write_note(&mut self, request: &AnnotationRequest) -> Result<(), ExtractError> {
        let geometry = match self.geometries.get(&request.page) {
            Some(g) => g.clone(),
            None => {
                let (g, _) = self.doc.page_geometry(request.page)?;
                self.geometries.insert(request.page, g.clone());
                g
            }
        };
        let layout = self
            .layouts
            .entry(request.page)
            .or_insert_with(|| PageLayout::new(geometry.crop_rect()));
        let placed = layout.resolve(request.page, request.anchor);

        // Back to PDF space: x offsets from the crop origin, y flips.
        let pdf_x = geometry.crop_box_raw.x0 + placed.x;
        let pdf_y = geometry.crop_box_raw.bottom - placed.y;

        let mut contents = request.message.clone();
        if let Some(note) = &request.reviewer_note {
            contents.push_str("\n\n");
            contents.push_str(note);
        }

        let (r, g, b) = request.severity.color();
        let mut annot = Dictionary::new();
        annot.set("Type", Object::Name(b"Annot".to_vec()));
        annot.set("Subtype", Object::Name(b"Text".to_vec()));
        annot.set(
            "Rect",
            Object::Array(vec![
                Object::Real(pdf_x as f32),
                Object::Real((pdf_y - NOTE_RECT_PT) as f32),
                Object::Real((pdf_x + NOTE_RECT_PT) as f32),
                Object::Real(pdf_y as f32),
            ]),
        );
        annot.set(
            "Contents",
            Object::String(contents.into_bytes(), StringFormat::Literal),
        );
        annot.set(
            "T",
            Object::String(NOTE_AUTHOR.to_vec(), StringFormat::Literal),
        );
        annot.set(
            "C",
            Object::Array(vec![
                Object::Real(r),
                Object::Real(g),
                Object::Real(b),
            ]),
        );
        annot.set("Open", Object::Boolean(false));

        let page_id = self.doc.page_id(request.page)?;
        let annot_id = self.doc.inner_mut().add_object(Object::Dictionary(annot));
        append_to_annots(self.doc.inner_mut(), page_id, annot_id)?;
        debug!(
            page = request.page,
            x = placed.x,
            y = placed.y,
            rank = placed.rank,
            severity = ?request.severity,
            "placed note"
        );
        self.placed.push(placed);
        Ok(())
    }
}

/// Push a reference into the page's /Annots array, creating it when absent
/// and following an indirect reference when the array lives elsewhere.
fn append_to_annots(
    doc: &mut lopdf::Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> Result<(), ExtractError> {
    let annots_target = {
        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|e| ExtractError::Write(format!("page object: {e}")))?;
        match page.get(b"Annots") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    };

    let target = match annots_target {
        Some(array_id) => doc
            .get_object_mut(array_id)
            .map_err(|e| ExtractError::Write(format!("annots array: {e}")))?,
        None => {
            let page = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| ExtractError::Write(format!("page object: {e}")))?;
            if page.get(b"Annots").is_err() {
                page.set("Annots", Object::Array(Vec::new()));
            }
            page.get_mut(b"Annots")
                .map_err(|e| ExtractError::Write(format!("annots entry: {e}")))?
        }
    };

    match target {
        Object::Array(arr) => {
            arr.push(Object::Reference(annot_id));
            Ok(())
        }
        _ => Err(ExtractError::Write(
            "/Annots entry is not an array".to_string(),
        )),
    }
}
