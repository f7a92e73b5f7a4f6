//! Annotation writing round-trip tests: write notes, reload the bytes with
//! lopdf, and inspect the /Annots arrays directly.

mod common;

use common::{PageSpec, build_pdf, text_op};
use lopdf::{Dictionary, Object};
use pubmeter::pubmeter_core::{AnnotationRequest, Point, Severity};
use pubmeter::{AnnotationWriter, DiagnosticCode};

fn two_page_fixture() -> Vec<u8> {
    build_pdf(
        vec![
            PageSpec::text_only(text_op(72.0, 720.0, 12.0, "page one")),
            PageSpec::text_only(text_op(72.0, 720.0, 12.0, "page two")),
        ],
        None,
    )
}

fn request(page: usize, severity: Severity, message: &str) -> AnnotationRequest {
    AnnotationRequest {
        page,
        anchor: None,
        message: message.to_string(),
        severity,
        reviewer_note: None,
    }
}

/// Collect the annotation dictionaries of one page, in array order.
fn page_annots(bytes: &[u8]) -> Vec<Vec<Dictionary>> {
    let doc = lopdf::Document::load_mem(bytes).expect("reload annotated PDF");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
            match page.get(b"Annots") {
                Ok(Object::Array(refs)) => refs
                    .iter()
                    .map(|r| {
                        let id = r.as_reference().unwrap();
                        doc.get_object(id).unwrap().as_dict().unwrap().clone()
                    })
                    .collect(),
                _ => Vec::new(),
            }
        })
        .collect()
}

fn rect_of(annot: &Dictionary) -> [f64; 4] {
    let arr = annot.get(b"Rect").unwrap().as_array().unwrap();
    let mut out = [0.0; 4];
    for (slot, obj) in out.iter_mut().zip(arr) {
        *slot = match obj {
            Object::Real(f) => *f as f64,
            Object::Integer(i) => *i as f64,
            _ => panic!("non-numeric Rect entry"),
        };
    }
    out
}

#[test]
fn writes_summary_then_notes() {
    let mut writer = AnnotationWriter::open(&two_page_fixture()).unwrap();
    let requests = vec![
        AnnotationRequest {
            page: 0,
            anchor: Some(Point::new(100.0, 200.0)),
            message: "Margin below minimum".to_string(),
            severity: Severity::Error,
            reviewer_note: Some("check inside gutter".to_string()),
        },
        request(1, Severity::Warning, "Low image resolution"),
    ];
    writer.place(&requests);
    assert_eq!(writer.placed().len(), 3);
    assert!(writer.diagnostics().is_empty());

    let annots = page_annots(&writer.finish().unwrap());
    assert_eq!(annots[0].len(), 2);
    assert_eq!(annots[1].len(), 1);

    // The summary always claims the first slot on page 1
    let summary = &annots[0][0];
    assert_eq!(summary.get(b"Subtype").unwrap().as_name().unwrap(), b"Text");
    let contents = summary.get(b"Contents").unwrap().as_str().unwrap();
    let contents = String::from_utf8_lossy(contents);
    assert!(contents.contains("1 error"), "summary was: {contents}");
    assert!(contents.contains("1 warning"), "summary was: {contents}");

    let note = &annots[0][1];
    let contents = String::from_utf8_lossy(note.get(b"Contents").unwrap().as_str().unwrap());
    assert!(contents.contains("Margin below minimum"));
    assert!(contents.contains("check inside gutter"));
}

#[test]
fn severity_maps_to_note_color() {
    let mut writer = AnnotationWriter::open(&two_page_fixture()).unwrap();
    writer
        .place(&[request(0, Severity::Error, "bad")]);
    let annots = page_annots(&writer.finish().unwrap());

    // Summary note is Info (blue), the error note is red
    let color = |annot: &Dictionary| -> Vec<f64> {
        annot
            .get(b"C")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| match o {
                Object::Real(f) => *f as f64,
                Object::Integer(i) => *i as f64,
                _ => panic!("non-numeric color entry"),
            })
            .collect()
    };
    assert_eq!(color(&annots[0][0]), vec![0.0, 0.0, 1.0]);
    assert_eq!(color(&annots[0][1]), vec![1.0, 0.0, 0.0]);
}

#[test]
fn anchored_note_lands_at_its_anchor() {
    let mut writer = AnnotationWriter::open(&two_page_fixture()).unwrap();
    writer
        .place(&[AnnotationRequest {
            page: 1,
            anchor: Some(Point::new(150.0, 300.0)),
            message: "here".to_string(),
            severity: Severity::Warning,
            reviewer_note: None,
        }]);
    let annots = page_annots(&writer.finish().unwrap());

    // Top-left (150, 300) on a 792pt page is PDF y 492; Rect top edge there
    let rect = rect_of(&annots[1][0]);
    assert!((rect[0] - 150.0).abs() < 0.5);
    assert!((rect[3] - 492.0).abs() < 0.5);
}

#[test]
fn unanchored_notes_stack_down_the_margin_column() {
    let mut writer = AnnotationWriter::open(&two_page_fixture()).unwrap();
    writer
        .place(&[
            request(1, Severity::Warning, "first"),
            request(1, Severity::Warning, "second"),
        ]);
    let annots = page_annots(&writer.finish().unwrap());

    assert_eq!(annots[1].len(), 2);
    let a = rect_of(&annots[1][0]);
    let b = rect_of(&annots[1][1]);
    assert!((a[0] - b[0]).abs() < 1e-6, "same column x");
    // Second note sits one spacing step lower (lower PDF y)
    assert!((a[3] - b[3] - 20.0).abs() < 0.5, "a={a:?} b={b:?}");
}

#[test]
fn out_of_range_page_is_skipped_with_diagnostic() {
    let mut writer = AnnotationWriter::open(&two_page_fixture()).unwrap();
    writer
        .place(&[
            request(0, Severity::Error, "real"),
            request(9, Severity::Error, "phantom"),
        ]);

    assert_eq!(writer.placed().len(), 2);
    let diags = writer.diagnostics().to_vec();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagnosticCode::AnnotationSkipped);
    assert_eq!(diags[0].page, Some(9));

    // The surviving requests still serialize
    let annots = page_annots(&writer.finish().unwrap());
    assert_eq!(annots[0].len(), 2);
    assert_eq!(annots[1].len(), 0);
}

#[test]
fn malformed_page_loses_its_note_but_not_the_batch() {
    // Replace page 2's MediaBox with a string so its geometry fails
    let mut doc = lopdf::Document::load_mem(&two_page_fixture()).unwrap();
    let second = *doc.get_pages().get(&2).unwrap();
    let page = doc.get_object_mut(second).unwrap().as_dict_mut().unwrap();
    page.set("MediaBox", Object::string_literal("not a box"));
    let mut broken = Vec::new();
    doc.save_to(&mut broken).unwrap();

    let mut writer = AnnotationWriter::open(&broken).unwrap();
    writer.place(&[
        request(0, Severity::Error, "good page"),
        request(1, Severity::Error, "bad page"),
    ]);

    // Summary plus the page-1 note survive; the bad page only diagnoses
    assert_eq!(writer.placed().len(), 2);
    let diags = writer.diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagnosticCode::AnnotationSkipped);
    assert_eq!(diags[0].page, Some(1));

    let annots = page_annots(&writer.finish().unwrap());
    assert_eq!(annots[0].len(), 2);
    assert_eq!(annots[1].len(), 0);
}

#[test]
fn empty_batch_writes_nothing() {
    let mut writer = AnnotationWriter::open(&two_page_fixture()).unwrap();
    writer.place(&[]);
    assert_eq!(writer.placed().len(), 0);

    let annots = page_annots(&writer.finish().unwrap());
    assert!(annots.iter().all(Vec::is_empty));
}

#[test]
fn annotated_document_still_extracts() {
    let mut writer = AnnotationWriter::open(&two_page_fixture()).unwrap();
    writer
        .place(&[request(0, Severity::Info, "note")]);
    let bytes = writer.finish().unwrap();

    let result = pubmeter::extract_document(&bytes).unwrap();
    assert_eq!(result.metadata.page_count, 2);
    assert_eq!(result.pages[0].text_runs[0].text, "page one");
}

#[test]
fn one_shot_annotate_returns_bytes_and_placements() {
    let output = pubmeter::annotate_document(
        &two_page_fixture(),
        &[
            request(0, Severity::Error, "real"),
            request(9, Severity::Error, "phantom"),
        ],
    )
    .unwrap();

    // Summary plus the in-range note; the phantom page only diagnoses
    assert_eq!(output.placed.len(), 2);
    assert_eq!(output.placed[0].rank, 0);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code, DiagnosticCode::AnnotationSkipped);

    let annots = page_annots(&output.bytes);
    assert_eq!(annots[0].len(), 2);
}
