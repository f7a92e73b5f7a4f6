//! Shared fixture builders for integration tests.
//!
//! Fixtures are built with lopdf directly so tests control every byte of
//! page geometry, fonts, and content streams.

#![allow(dead_code)]

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// One page of a fixture document.
pub struct PageSpec {
    /// Raw content stream text.
    pub content: String,
    /// Adds an /Im1 image XObject with these pixel dimensions.
    pub image: Option<(u32, u32)>,
    /// Page-level CropBox, raw PDF coordinates.
    pub crop_box: Option<[f64; 4]>,
    /// Page-level /Rotate value.
    pub rotate: Option<i64>,
}

impl PageSpec {
    pub fn text_only(content: String) -> Self {
        Self {
            content,
            image: None,
            crop_box: None,
            rotate: None,
        }
    }
}

/// A `BT .. Tj .. ET` block showing `text` at `(x, y)` in PDF coordinates.
pub fn text_op(x: f64, y: f64, size: f64, text: &str) -> String {
    format!("BT /F1 {size} Tf {x} {y} Td ({text}) Tj ET\n")
}

/// An image placement: unit square scaled to `w x h` points at `(x, y)`.
pub fn image_op(x: f64, y: f64, w: f64, h: f64) -> String {
    format!("q {w} 0 0 {h} {x} {y} cm /Im1 Do Q\n")
}

/// Build a US-Letter document from page specs, with an optional /Info title.
pub fn build_pdf(pages: Vec<PageSpec>, title: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut page_ids: Vec<Object> = Vec::new();
    for spec in pages {
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            spec.content.into_bytes(),
        ));

        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        if let Some((w, h)) = spec.image {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => w as i64,
                    "Height" => h as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                },
                vec![0u8; 16],
            ));
            resources.set("XObject", dictionary! { "Im1" => image_id });
        }

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => Object::Dictionary(resources),
        };
        if let Some([a, b, c, d]) = spec.crop_box {
            page.set(
                "CropBox",
                vec![
                    Object::Real(a as f32),
                    Object::Real(b as f32),
                    Object::Real(c as f32),
                    Object::Real(d as f32),
                ],
            );
        }
        if let Some(rotate) = spec.rotate {
            page.set("Rotate", rotate);
        }

        let page_id = doc.add_object(page);
        page_ids.push(page_id.into());
    }

    let count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Producer" => Object::string_literal("pubmeter fixtures"),
        });
        doc.trailer.set("Info", info_id);
    }

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save fixture PDF");
    buf
}
