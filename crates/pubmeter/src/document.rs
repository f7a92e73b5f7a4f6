//! Document loader over lopdf.
//!
//! Owns the only conversion between PDF native bottom-left coordinates and
//! the top-left origin convention used by every downstream component. Also
//! pulls the /Info dictionary fields for the metadata extractor.

use lopdf::{Dictionary, Object, ObjectId};
use pubmeter_core::{BBox, Diagnostic, DiagnosticCode, Point};

use crate::error::ExtractError;

/// A PDF document opened read-only for extraction.
///
/// Mutation (annotation writing) happens on a separate
/// [`AnnotationWriter`](crate::AnnotationWriter) handle so extraction and
/// writes can never interleave on one object.
pub struct Document {
    inner: lopdf::Document,
    page_ids: Vec<ObjectId>,
}

/// Raw /Info dictionary fields, before identifier scanning.
#[derive(Debug, Default, Clone)]
pub struct InfoFields {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
}

/// Geometry of one page: boxes in raw PDF coordinates plus the transform
/// into top-left crop-relative space.
#[derive(Debug, Clone)]
pub struct PageGeometry {
    /// 0-based page index.
    pub index: usize,
    /// `/Rotate` value normalized to 0, 90, 180, or 270.
    pub rotation: i32,
    /// CropBox in raw PDF coordinates (x0 = left, top = y-min, x1 = right,
    /// bottom = y-max). Falls back to MediaBox when absent.
    pub crop_box_raw: BBox,
    /// Whether the CropBox was missing and MediaBox was substituted.
    pub crop_missing: bool,
}

impl PageGeometry {
    /// Visible page width in points.
    pub fn width(&self) -> f64 {
        self.crop_box_raw.width()
    }

    /// Visible page height in points.
    pub fn height(&self) -> f64 {
        self.crop_box_raw.height()
    }

    /// The crop rectangle in normalized top-left coordinates.
    pub fn crop_rect(&self) -> BBox {
        BBox::new(0.0, 0.0, self.width(), self.height())
    }

    /// Convert a point from raw PDF space to top-left crop-relative space.
    pub fn to_top_left(&self, x: f64, y: f64) -> Point {
        Point::new(
            x - self.crop_box_raw.x0,
            // Raw `bottom` holds the PDF y-max of the crop box.
            self.crop_box_raw.bottom - y,
        )
    }
}

impl Document {
    /// Open a PDF document from bytes.
    ///
    /// # Errors
    ///
    /// [`ExtractError::CorruptDocument`] on unparseable input,
    /// [`ExtractError::EncryptedDocument`] when a password is required.
    pub fn open(bytes: &[u8]) -> Result<Self, ExtractError> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| ExtractError::CorruptDocument(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            return Err(ExtractError::EncryptedDocument);
        }

        Self::from_inner(inner)
    }

    /// Open a PDF document from bytes, decrypting with `password` if the
    /// document is encrypted.
    pub fn open_with_password(bytes: &[u8], password: &str) -> Result<Self, ExtractError> {
        let mut inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| ExtractError::CorruptDocument(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            inner.decrypt(password).map_err(|e| {
                let msg = e.to_string();
                if msg.contains("password") || msg.contains("incorrect") {
                    ExtractError::InvalidPassword
                } else {
                    ExtractError::CorruptDocument(format!("decryption failed: {e}"))
                }
            })?;
        }

        Self::from_inner(inner)
    }

    fn from_inner(inner: lopdf::Document) -> Result<Self, ExtractError> {
        // get_pages returns a BTreeMap<u32, ObjectId> keyed 1-based, in order
        let page_ids: Vec<ObjectId> = inner.get_pages().values().copied().collect();
        if page_ids.is_empty() {
            return Err(ExtractError::CorruptDocument(
                "document has no pages".to_string(),
            ));
        }
        Ok(Self { inner, page_ids })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub(crate) fn inner(&self) -> &lopdf::Document {
        &self.inner
    }

    pub(crate) fn inner_mut(&mut self) -> &mut lopdf::Document {
        &mut self.inner
    }

    pub(crate) fn page_id(&self, index: usize) -> Result<ObjectId, ExtractError> {
        self.page_ids
            .get(index)
            .copied()
            .ok_or(ExtractError::PageOutOfRange {
                index,
                count: self.page_ids.len(),
            })
    }

    /// Resolve the geometry of one page.
    ///
    /// A missing CropBox falls back to the MediaBox and reports a
    /// [`DiagnosticCode::MissingCropBox`] diagnostic rather than failing.
    pub fn page_geometry(
        &self,
        index: usize,
    ) -> Result<(PageGeometry, Option<Diagnostic>), ExtractError> {
        let page_id = self.page_id(index)?;

        let media_box = match resolve_inherited(&self.inner, page_id, b"MediaBox") {
            Some(obj) => bbox_from_object(&self.inner, obj).ok_or_else(|| {
                ExtractError::CorruptDocument(format!("page {index}: malformed MediaBox"))
            })?,
            None => {
                return Err(ExtractError::CorruptDocument(format!(
                    "page {index}: MediaBox not found on page or ancestors"
                )));
            }
        };

        let crop_box = resolve_inherited(&self.inner, page_id, b"CropBox")
            .and_then(|obj| bbox_from_object(&self.inner, obj));
        let crop_missing = crop_box.is_none();
        let diagnostic = crop_missing.then(|| {
            Diagnostic::on_page(
                DiagnosticCode::MissingCropBox,
                "page declares no CropBox; margins measured against MediaBox",
                index,
            )
        });

        let rotation = resolve_inherited(&self.inner, page_id, b"Rotate")
            .and_then(|obj| match obj {
                Object::Integer(i) => Some(*i as i32),
                _ => None,
            })
            .unwrap_or(0);
        // Normalize into [0, 360) and snap off-axis values to the
        // nearest quarter turn, so downstream always sees 0/90/180/270
        let rotation = (rotation.rem_euclid(360) + 45) / 90 * 90 % 360;

        Ok((
            PageGeometry {
                index,
                rotation,
                crop_box_raw: crop_box.unwrap_or(media_box),
                crop_missing,
            },
            diagnostic,
        ))
    }

    /// Concatenated, decoded content stream bytes of one page.
    pub(crate) fn page_content(&self, index: usize) -> Result<Vec<u8>, ExtractError> {
        let page_id = self.page_id(index)?;
        self.inner
            .get_page_content(page_id)
            .map_err(|e| ExtractError::CorruptDocument(format!("page {index} content: {e}")))
    }

    /// The page's resource dictionary, following inheritance.
    pub(crate) fn page_resources(&self, index: usize) -> Result<&Dictionary, ExtractError> {
        static EMPTY: std::sync::LazyLock<Dictionary> = std::sync::LazyLock::new(Dictionary::new);
        let page_id = self.page_id(index)?;
        match resolve_inherited(&self.inner, page_id, b"Resources") {
            Some(obj) => {
                let obj = resolve_ref(&self.inner, obj);
                obj.as_dict().map_err(|_| {
                    ExtractError::CorruptDocument(format!(
                        "page {index}: /Resources is not a dictionary"
                    ))
                })
            }
            None => Ok(&EMPTY),
        }
    }

    /// Pull the /Info dictionary fields, dropping empty strings.
    pub fn info_fields(&self) -> InfoFields {
        let Some(dict) = self
            .inner
            .trailer
            .get(b"Info")
            .ok()
            .map(|obj| resolve_ref(&self.inner, obj))
            .and_then(|obj| obj.as_dict().ok())
        else {
            return InfoFields::default();
        };

        let field = |key: &[u8]| -> Option<String> {
            let obj = resolve_ref(&self.inner, dict.get(key).ok()?);
            let value = match obj {
                Object::String(bytes, _) => decode_pdf_string(bytes),
                Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
                _ => return None,
            };
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        };

        InfoFields {
            title: field(b"Title"),
            author: field(b"Author"),
            creator: field(b"Creator"),
            producer: field(b"Producer"),
            creation_date: field(b"CreationDate"),
        }
    }
}

/// Follow an indirect reference, returning the object itself otherwise.
pub(crate) fn resolve_ref<'a>(doc: &'a lopdf::Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Look up a key in the page dictionary, walking up the page tree via
/// /Parent when the key is not on the page itself.
pub(crate) fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current_id = page_id;
    // Bounded walk guards against /Parent cycles in malformed files
    for _ in 0..64 {
        let dict = doc.get_object(current_id).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub(crate) fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

/// Read a 4-element box array into a [`BBox`] in raw PDF coordinates,
/// normalizing a flipped y order.
fn bbox_from_object(doc: &lopdf::Document, obj: &Object) -> Option<BBox> {
    let arr = resolve_ref(doc, obj).as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let x0 = object_to_f64(resolve_ref(doc, &arr[0]))?;
    let y0 = object_to_f64(resolve_ref(doc, &arr[1]))?;
    let x1 = object_to_f64(resolve_ref(doc, &arr[2]))?;
    let y1 = object_to_f64(resolve_ref(doc, &arr[3]))?;
    Some(BBox::new(
        x0.min(x1),
        y0.min(y1),
        x0.max(x1),
        y0.max(y1),
    ))
}

/// Decode a PDF text string: UTF-16BE when BOM-prefixed, else UTF-8 with
/// a Latin-1 fallback for legacy producers.
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => {
                let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
                decoded.into_owned()
            }
        }
    }
}
