//! Content stream interpreter.
//!
//! Walks the decoded operator list of a page, maintaining graphics and text
//! state, and emits raw text spans and image placements in PDF coordinates.
//! Form XObjects are entered recursively with their matrix concatenated onto
//! the current transform.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object};
use pubmeter_core::{BBox, Ctm, Point, Rgb};
use tracing::debug;

use crate::cmap::ToUnicodeMap;
use crate::document::{Document, object_to_f64, resolve_ref};
use crate::error::ExtractError;

/// Form XObject recursion limit.
const MAX_FORM_DEPTH: usize = 8;

/// Approximate ascent/descent fractions of the em square, used for span
/// height when the font carries no usable metrics.
const ASCENT_FRACTION: f64 = 0.75;
const DESCENT_FRACTION: f64 = 0.25;

/// One uninterrupted show-text run, still in raw PDF coordinates.
#[derive(Debug, Clone)]
pub struct RawSpan {
    pub text: String,
    /// Bounding box in raw PDF space (top = y-min, bottom = y-max).
    pub bbox: BBox,
    /// BaseFont name as written in the font dictionary.
    pub font_name: String,
    /// Effective glyph size after the text and transformation matrices.
    pub size_pt: f64,
    pub color: Rgb,
    /// Codes that produced U+FFFD because no mapping was available.
    pub undecodable: usize,
    /// /Flags from the font descriptor, zero when absent.
    pub font_flags: u32,
}

/// One image XObject placement.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub name: String,
    /// CTM in effect at the `Do` operator.
    pub ctm: Ctm,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Color space name, with Indexed spaces resolved to their base.
    pub color_space: String,
    /// False when the XObject could not be resolved to pixel dimensions.
    pub resolved: bool,
}

/// Everything the interpreter recovered from one page.
#[derive(Debug, Default)]
pub struct PageContent {
    pub spans: Vec<RawSpan>,
    pub images: Vec<RawImage>,
}

/// Decoded font program state, cached per resource name.
struct Font {
    raw_name: String,
    /// Two-byte codes (Type0 composite fonts).
    two_byte: bool,
    to_unicode: ToUnicodeMap,
    /// Glyph widths in 1/1000 em, keyed by character code.
    widths: HashMap<u32, f64>,
    default_width: f64,
    flags: u32,
}

impl Font {
    fn width(&self, code: u32) -> f64 {
        self.widths.get(&code).copied().unwrap_or(self.default_width) / 1000.0
    }
}

#[derive(Clone)]
struct GraphicsState {
    ctm: Ctm,
    fill: Rgb,
}

struct TextState {
    font_key: Option<Vec<u8>>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    leading: f64,
    tm: Ctm,
    tlm: Ctm,
}

impl TextState {
    fn begin() -> Self {
        Self {
            font_key: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            leading: 0.0,
            tm: Ctm::IDENTITY,
            tlm: Ctm::IDENTITY,
        }
    }

    fn next_line(&mut self, tx: f64, ty: f64) {
        self.tlm = self.tlm.concat(&Ctm([1.0, 0.0, 0.0, 1.0, tx, ty]));
        self.tm = self.tlm;
    }
}

/// Interpret the content stream of page `index`, returning spans and image
/// placements in raw PDF coordinates.
pub fn interpret_page(doc: &Document, index: usize) -> Result<PageContent, ExtractError> {
    let bytes = doc.page_content(index)?;
    let resources = doc.page_resources(index)?;

    let mut interp = Interpreter {
        doc: doc.inner(),
        out: PageContent::default(),
        fonts: HashMap::new(),
    };
    interp.run(&bytes, resources, Ctm::IDENTITY, 0)?;
    debug!(
        page = index,
        spans = interp.out.spans.len(),
        images = interp.out.images.len(),
        "interpreted page content"
    );
    Ok(interp.out)
}

struct Interpreter<'a> {
    doc: &'a lopdf::Document,
    out: PageContent,
    /// Font cache keyed by resource name, rebuilt per page.
    fonts: HashMap<Vec<u8>, Font>,
}

impl<'a> Interpreter<'a> {
    fn run(
        &mut self,
        bytes: &[u8],
        resources: &Dictionary,
        base_ctm: Ctm,
        depth: usize,
    ) -> Result<(), ExtractError> {
        let content = Content::decode(bytes)
            .map_err(|e| ExtractError::CorruptDocument(format!("content stream: {e}")))?;

        let mut gs = GraphicsState {
            ctm: base_ctm,
            fill: Rgb::BLACK,
        };
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut text = TextState::begin();

        for op in &content.operations {
            match op.operator.as_str() {
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operands(op) {
                        gs.ctm = gs.ctm.concat(&m);
                    }
                }

                "BT" => text = TextState::begin(),
                "ET" => {}

                "Tf" => {
                    if let (Some(Object::Name(name)), Some(size)) =
                        (op.operands.first(), op.operands.get(1).and_then(object_to_f64))
                    {
                        self.load_font(name, resources);
                        text.font_key = Some(name.clone());
                        text.size = size;
                    }
                }
                "Td" => {
                    if let (Some(tx), Some(ty)) = (num(op, 0), num(op, 1)) {
                        text.next_line(tx, ty);
                    }
                }
                "TD" => {
                    if let (Some(tx), Some(ty)) = (num(op, 0), num(op, 1)) {
                        text.leading = -ty;
                        text.next_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_operands(op) {
                        text.tm = m;
                        text.tlm = m;
                    }
                }
                "T*" => text.next_line(0.0, -text.leading),
                "TL" => {
                    if let Some(l) = num(op, 0) {
                        text.leading = l;
                    }
                }
                "Tc" => {
                    if let Some(c) = num(op, 0) {
                        text.char_spacing = c;
                    }
                }
                "Tw" => {
                    if let Some(w) = num(op, 0) {
                        text.word_spacing = w;
                    }
                }

                "Tj" => {
                    if let Some(Object::String(s, _)) = op.operands.first() {
                        self.show_text(s, &mut text, &gs);
                    }
                }
                "'" => {
                    text.next_line(0.0, -text.leading);
                    if let Some(Object::String(s, _)) = op.operands.first() {
                        self.show_text(s, &mut text, &gs);
                    }
                }
                "\"" => {
                    if let (Some(aw), Some(ac)) = (num(op, 0), num(op, 1)) {
                        text.word_spacing = aw;
                        text.char_spacing = ac;
                    }
                    text.next_line(0.0, -text.leading);
                    if let Some(Object::String(s, _)) = op.operands.get(2) {
                        self.show_text(s, &mut text, &gs);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        for item in items {
                            match item {
                                Object::String(s, _) => self.show_text(s, &mut text, &gs),
                                Object::Integer(_) | Object::Real(_) => {
                                    if let Some(adj) = object_to_f64(item) {
                                        let tx = -adj / 1000.0 * text.size;
                                        text.tm = text.tm.concat(&Ctm([1.0, 0.0, 0.0, 1.0, tx, 0.0]));
                                    }
                                }
                                _ => {}
                            }
                        }
                    }
                }

                "g" => {
                    if let Some(v) = num(op, 0) {
                        gs.fill = Rgb::from_unit(v as f32, v as f32, v as f32);
                    }
                }
                "rg" => {
                    if let (Some(r), Some(g), Some(b)) = (num(op, 0), num(op, 1), num(op, 2)) {
                        gs.fill = Rgb::from_unit(r as f32, g as f32, b as f32);
                    }
                }
                "k" => {
                    if let (Some(c), Some(m), Some(y), Some(kk)) =
                        (num(op, 0), num(op, 1), num(op, 2), num(op, 3))
                    {
                        gs.fill = cmyk_to_rgb(c, m, y, kk);
                    }
                }
                "sc" | "scn" => {
                    let nums: Vec<f64> = op.operands.iter().filter_map(object_to_f64).collect();
                    match nums.as_slice() {
                        [v] => gs.fill = Rgb::from_unit(*v as f32, *v as f32, *v as f32),
                        [r, g, b] => {
                            gs.fill = Rgb::from_unit(*r as f32, *g as f32, *b as f32);
                        }
                        [c, m, y, kk] => gs.fill = cmyk_to_rgb(*c, *m, *y, *kk),
                        _ => {}
                    }
                }

                "Do" => {
                    if let Some(Object::Name(name)) = op.operands.first() {
                        self.do_xobject(name, resources, &gs, depth)?;
                    }
                }

                // Path and clipping operators carry nothing the measurement
                // pipeline consumes.
                _ => {}
            }
        }

        Ok(())
    }

    fn do_xobject(
        &mut self,
        name: &[u8],
        resources: &Dictionary,
        gs: &GraphicsState,
        depth: usize,
    ) -> Result<(), ExtractError> {
        let doc = self.doc;
        let Some(stream) = xobject_stream(doc, name, resources) else {
            // Unresolvable placements still get reported so the caller can
            // record a diagnostic.
            self.out.images.push(RawImage {
                name: String::from_utf8_lossy(name).into_owned(),
                ctm: gs.ctm,
                pixel_width: 0,
                pixel_height: 0,
                color_space: String::new(),
                resolved: false,
            });
            return Ok(());
        };

        let subtype = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok());

        match subtype {
            Some(b"Image") => {
                let dim = |key: &[u8]| {
                    stream
                        .dict
                        .get(key)
                        .ok()
                        .map(|o| resolve_ref(doc, o))
                        .and_then(object_to_f64)
                        .map(|v| v.max(0.0) as u32)
                };
                let (width, height) = (dim(b"Width"), dim(b"Height"));
                self.out.images.push(RawImage {
                    name: String::from_utf8_lossy(name).into_owned(),
                    ctm: gs.ctm,
                    pixel_width: width.unwrap_or(0),
                    pixel_height: height.unwrap_or(0),
                    color_space: color_space_name(doc, stream.dict.get(b"ColorSpace").ok()),
                    resolved: width.is_some() && height.is_some(),
                });
            }
            Some(b"Form") if depth < MAX_FORM_DEPTH => {
                let form_ctm = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|o| matrix_from_array(doc, o))
                    .map(|m| gs.ctm.concat(&m))
                    .unwrap_or(gs.ctm);
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .map(|o| resolve_ref(doc, o))
                    .and_then(|o| o.as_dict().ok())
                    .unwrap_or(resources);
                let bytes = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                self.run(&bytes, form_resources, form_ctm, depth + 1)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Decode and place one show-text string, advancing the text matrix.
    fn show_text(&mut self, bytes: &[u8], text: &mut TextState, gs: &GraphicsState) {
        let Some(font) = text.font_key.as_ref().and_then(|k| self.fonts.get(k)) else {
            return;
        };
        if bytes.is_empty() {
            return;
        }

        let start_tm = text.tm;
        let mut decoded = String::new();
        let mut undecodable = 0usize;
        let mut advance = 0.0;

        let codes: Vec<u32> = if font.two_byte {
            bytes
                .chunks(2)
                .map(|c| {
                    if c.len() == 2 {
                        u32::from(u16::from_be_bytes([c[0], c[1]]))
                    } else {
                        u32::from(c[0])
                    }
                })
                .collect()
        } else {
            bytes.iter().map(|b| u32::from(*b)).collect()
        };

        for code in codes {
            match font.to_unicode.lookup(code) {
                Some(s) => decoded.push_str(s),
                None if !font.two_byte => {
                    // WinAnsi fallback for simple fonts without a ToUnicode map
                    let byte = [code as u8];
                    let (s, _, _) = encoding_rs::WINDOWS_1252.decode(&byte);
                    decoded.push_str(&s);
                }
                None => {
                    decoded.push('\u{FFFD}');
                    undecodable += 1;
                }
            }

            let mut tx = font.width(code) * text.size + text.char_spacing;
            if !font.two_byte && code == 32 {
                tx += text.word_spacing;
            }
            advance += tx;
        }

        // Shift the text matrix past the shown string
        text.tm = text.tm.concat(&Ctm([1.0, 0.0, 0.0, 1.0, advance, 0.0]));

        if decoded.trim().is_empty() {
            return;
        }

        // Span rectangle in text space spans the nominal em box around the
        // baseline, then maps through Tm and the CTM.
        let trm = gs.ctm.concat(&start_tm);
        let ascent = text.size * ASCENT_FRACTION;
        let descent = text.size * DESCENT_FRACTION;
        let corners = [
            trm.transform_point(Point::new(0.0, -descent)),
            trm.transform_point(Point::new(advance, -descent)),
            trm.transform_point(Point::new(0.0, ascent)),
            trm.transform_point(Point::new(advance, ascent)),
        ];
        let xs = corners.iter().map(|p| p.x);
        let ys = corners.iter().map(|p| p.y);
        let bbox = BBox::new(
            xs.clone().fold(f64::INFINITY, f64::min),
            ys.clone().fold(f64::INFINITY, f64::min),
            xs.fold(f64::NEG_INFINITY, f64::max),
            ys.fold(f64::NEG_INFINITY, f64::max),
        );

        // Effective size after scaling, from the y column of the matrix
        let scale = (trm.0[1] * trm.0[1] + trm.0[3] * trm.0[3]).sqrt();
        self.out.spans.push(RawSpan {
            text: decoded,
            bbox,
            font_name: font.raw_name.clone(),
            size_pt: text.size * scale,
            color: gs.fill,
            undecodable,
            font_flags: font.flags,
        });
    }

    /// Resolve and cache a font from the resource dictionary.
    fn load_font(&mut self, name: &[u8], resources: &Dictionary) {
        if self.fonts.contains_key(name) {
            return;
        }
        let font = self.build_font(name, resources).unwrap_or_else(|| Font {
            raw_name: String::from_utf8_lossy(name).into_owned(),
            two_byte: false,
            to_unicode: ToUnicodeMap::default(),
            widths: HashMap::new(),
            default_width: 500.0,
            flags: 0,
        });
        self.fonts.insert(name.to_vec(), font);
    }

    fn build_font(&self, name: &[u8], resources: &Dictionary) -> Option<Font> {
        let fonts = resolve_ref(self.doc, resources.get(b"Font").ok()?)
            .as_dict()
            .ok()?;
        let dict = resolve_ref(self.doc, fonts.get(name).ok()?).as_dict().ok()?;

        let subtype = dict.get(b"Subtype").ok().and_then(|o| o.as_name().ok());
        let two_byte = matches!(subtype, Some(b"Type0"));

        let raw_name = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_else(|| String::from_utf8_lossy(name).into_owned());

        let to_unicode = dict
            .get(b"ToUnicode")
            .ok()
            .map(|o| resolve_ref(self.doc, o))
            .and_then(|o| match o {
                Object::Stream(s) => s.decompressed_content().ok().or_else(|| Some(s.content.clone())),
                _ => None,
            })
            .map(|bytes| ToUnicodeMap::parse(&bytes))
            .unwrap_or_default();

        let mut widths = HashMap::new();
        let mut default_width = 500.0;
        let descriptor_dict;

        if two_byte {
            // Metrics live on the descendant CIDFont
            let descendant = dict
                .get(b"DescendantFonts")
                .ok()
                .map(|o| resolve_ref(self.doc, o))
                .and_then(|o| o.as_array().ok())
                .and_then(|a| a.first())
                .map(|o| resolve_ref(self.doc, o))
                .and_then(|o| o.as_dict().ok());
            if let Some(desc) = descendant {
                if let Some(dw) = desc.get(b"DW").ok().and_then(object_to_f64) {
                    default_width = dw;
                } else {
                    default_width = 1000.0;
                }
                if let Some(w) = desc.get(b"W").ok().map(|o| resolve_ref(self.doc, o)) {
                    parse_cid_widths(self.doc, w, &mut widths);
                }
                descriptor_dict = desc.get(b"FontDescriptor").ok();
            } else {
                default_width = 1000.0;
                descriptor_dict = None;
            }
        } else {
            let first_char = dict
                .get(b"FirstChar")
                .ok()
                .and_then(object_to_f64)
                .unwrap_or(0.0) as u32;
            if let Some(arr) = dict
                .get(b"Widths")
                .ok()
                .map(|o| resolve_ref(self.doc, o))
                .and_then(|o| o.as_array().ok())
            {
                for (i, w) in arr.iter().enumerate() {
                    if let Some(w) = object_to_f64(resolve_ref(self.doc, w)) {
                        widths.insert(first_char + i as u32, w);
                    }
                }
            }
            descriptor_dict = dict.get(b"FontDescriptor").ok();
        }

        let flags = descriptor_dict
            .map(|o| resolve_ref(self.doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(b"Flags").ok())
            .and_then(object_to_f64)
            .map(|f| f.max(0.0) as u32)
            .unwrap_or(0);

        Some(Font {
            raw_name,
            two_byte,
            to_unicode,
            widths,
            default_width,
            flags,
        })
    }
}

/// Resolve an image /ColorSpace entry to a plain name.
///
/// Indexed spaces report their base space; ICCBased streams map through
/// the /N component count.
fn color_space_name(doc: &lopdf::Document, obj: Option<&Object>) -> String {
    let Some(obj) = obj else {
        return "Unknown".to_string();
    };
    match resolve_ref(doc, obj) {
        Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
        Object::Array(items) => {
            let head = items
                .first()
                .map(|o| resolve_ref(doc, o))
                .and_then(|o| o.as_name().ok());
            match head {
                Some(b"Indexed") if items.len() >= 2 => color_space_name(doc, items.get(1)),
                Some(b"ICCBased") => {
                    let components = items
                        .get(1)
                        .map(|o| resolve_ref(doc, o))
                        .and_then(|o| match o {
                            Object::Stream(s) => s.dict.get(b"N").ok().and_then(object_to_f64),
                            _ => None,
                        });
                    match components.map(|n| n as u32) {
                        Some(1) => "DeviceGray".to_string(),
                        Some(4) => "DeviceCMYK".to_string(),
                        _ => "DeviceRGB".to_string(),
                    }
                }
                Some(name) => String::from_utf8_lossy(name).into_owned(),
                None => "Unknown".to_string(),
            }
        }
        _ => "Unknown".to_string(),
    }
}

/// Look up an XObject stream in the resource dictionary.
fn xobject_stream<'x>(
    doc: &'x lopdf::Document,
    name: &[u8],
    resources: &'x Dictionary,
) -> Option<&'x lopdf::Stream> {
    let xobjects = resolve_ref(doc, resources.get(b"XObject").ok()?)
        .as_dict()
        .ok()?;
    match resolve_ref(doc, xobjects.get(name).ok()?) {
        Object::Stream(stream) => Some(stream),
        _ => None,
    }
}

/// Parse a CID /W array: `[c [w1 w2 ...] c1 c2 w ...]`.
fn parse_cid_widths(doc: &lopdf::Document, obj: &Object, widths: &mut HashMap<u32, f64>) {
    let Ok(items) = obj.as_array() else { return };
    let mut i = 0;
    while i < items.len() {
        let Some(first) = object_to_f64(resolve_ref(doc, &items[i])) else {
            break;
        };
        let first = first.max(0.0) as u32;
        match items.get(i + 1).map(|o| resolve_ref(doc, o)) {
            Some(Object::Array(run)) => {
                for (offset, w) in run.iter().enumerate() {
                    if let Some(w) = object_to_f64(resolve_ref(doc, w)) {
                        widths.insert(first + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(other) => {
                let (Some(last), Some(w)) = (
                    object_to_f64(other),
                    items.get(i + 2).and_then(|o| object_to_f64(resolve_ref(doc, o))),
                ) else {
                    break;
                };
                let last = (last.max(0.0) as u32).min(first.saturating_add(0xFFFF));
                for code in first..=last {
                    widths.insert(code, w);
                }
                i += 3;
            }
            None => break,
        }
    }
}

fn num(op: &Operation, index: usize) -> Option<f64> {
    op.operands.get(index).and_then(object_to_f64)
}

fn matrix_operands(op: &Operation) -> Option<Ctm> {
    if op.operands.len() < 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (slot, operand) in m.iter_mut().zip(&op.operands) {
        *slot = object_to_f64(operand)?;
    }
    Some(Ctm(m))
}

fn matrix_from_array(doc: &lopdf::Document, obj: &Object) -> Option<Ctm> {
    let arr = resolve_ref(doc, obj).as_array().ok()?;
    if arr.len() != 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (slot, item) in m.iter_mut().zip(arr) {
        *slot = object_to_f64(resolve_ref(doc, item))?;
    }
    Some(Ctm(m))
}

fn cmyk_to_rgb(c: f64, m: f64, y: f64, k: f64) -> Rgb {
    Rgb::from_unit(
        ((1.0 - c) * (1.0 - k)) as f32,
        ((1.0 - m) * (1.0 - k)) as f32,
        ((1.0 - y) * (1.0 - k)) as f32,
    )
}
