//! Document metadata and identifier scanning.
//!
//! Info-dictionary fields come from the document loader; this module owns
//! the scan of normalized full-document text for checksum-validated ISBNs,
//! DOI prefixes, and job numbers, recording the page each match came from.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Kind of publication identifier found in the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierKind {
    Isbn,
    Doi,
    JobNumber,
}

/// Where an identifier match was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierSource {
    pub kind: IdentifierKind,
    pub value: String,
    /// 0-based page index of the match.
    pub page: usize,
}

/// Document-level metadata: info-dictionary fields plus scanned identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Document title from the /Info dictionary.
    pub title: Option<String>,
    /// Document author from the /Info dictionary.
    pub author: Option<String>,
    /// Application that created the original document.
    pub creator: Option<String>,
    /// Application that produced the PDF.
    pub producer: Option<String>,
    /// Creation date (raw PDF date string).
    pub creation_date: Option<String>,
    /// First checksum-valid ISBN found in the text, digits only.
    pub isbn: Option<String>,
    /// First DOI found in the text.
    pub doi: Option<String>,
    /// First job number found in the text.
    pub job_number: Option<String>,
    /// Number of pages in the document.
    pub page_count: usize,
    /// Every identifier match with its source page.
    pub identifier_sources: Vec<IdentifierSource>,
}

static ISBN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"isbn[:\s-]*([0-9][-0-9]{8,16}[0-9x])").unwrap());

static DOI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(10\.\d{4,}/\S+)").unwrap());

static JOB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"job\s*(?:no\.?|number)?[:#\s]\s*([a-z0-9][-a-z0-9/]{3,})").unwrap());

/// Normalize page text for identifier scanning: Unicode NFKC fold,
/// whitespace collapse, case fold.
pub fn fold_text(raw: &str) -> String {
    let folded: String = raw.nfkc().flat_map(|c| c.to_lowercase()).collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validate an ISBN-10 check digit over the bare digit string.
fn valid_isbn10(digits: &str) -> bool {
    if digits.len() != 10 {
        return false;
    }
    let mut sum: u32 = 0;
    for (i, c) in digits.chars().enumerate() {
        let value = match c {
            '0'..='9' => c as u32 - '0' as u32,
            'x' | 'X' if i == 9 => 10,
            _ => return false,
        };
        sum += value * (10 - i as u32);
    }
    sum % 11 == 0
}

/// Validate an ISBN-13 check digit over the bare digit string.
fn valid_isbn13(digits: &str) -> bool {
    if digits.len() != 13 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let sum: u32 = digits
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let d = c as u32 - '0' as u32;
            if i % 2 == 0 { d } else { d * 3 }
        })
        .sum();
    sum % 10 == 0
}

/// Returns `true` if the digit string is a checksum-valid ISBN-10 or -13.
pub fn valid_isbn(digits: &str) -> bool {
    valid_isbn10(digits) || valid_isbn13(digits)
}

/// Scan per-page folded text for identifiers.
///
/// Every match is recorded in the returned sources; the first
/// checksum-valid ISBN, first DOI, and first job number also populate the
/// scalar fields of the returned tuple.
pub fn scan_identifiers(
    pages: &[String],
) -> (
    Option<String>,
    Option<String>,
    Option<String>,
    Vec<IdentifierSource>,
) {
    let mut isbn = None;
    let mut doi = None;
    let mut job = None;
    let mut sources = Vec::new();

    for (page, text) in pages.iter().enumerate() {
        for cap in ISBN_RE.captures_iter(text) {
            let digits: String = cap[1]
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect();
            if valid_isbn(&digits) {
                sources.push(IdentifierSource {
                    kind: IdentifierKind::Isbn,
                    value: digits.clone(),
                    page,
                });
                isbn.get_or_insert(digits);
            }
        }

        for cap in DOI_RE.captures_iter(text) {
            let value = cap[1].trim_end_matches(['.', ',', ';', ':', ')']).to_string();
            sources.push(IdentifierSource {
                kind: IdentifierKind::Doi,
                value: value.clone(),
                page,
            });
            doi.get_or_insert(value);
        }

        for cap in JOB_RE.captures_iter(text) {
            let value = cap[1].to_string();
            sources.push(IdentifierSource {
                kind: IdentifierKind::JobNumber,
                value: value.clone(),
                page,
            });
            job.get_or_insert(value);
        }
    }

    (isbn, doi, job, sources)
}
