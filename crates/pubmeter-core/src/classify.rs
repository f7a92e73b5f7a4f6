//! Document type classification from weighted signals.
//!
//! An explicit table of `(name, target, weight, predicate)` tuples votes
//! toward fixed type categories. Keeping the signals in data rather than
//! nested conditionals makes each threshold unit-testable on its own.

use serde::{Deserialize, Serialize};

/// Publication categories, most specific first.
///
/// The declaration order doubles as the tie-break priority; `Publication`
/// is the least specific and serves as the fallback when nothing fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    Factsheet,
    PolicyBrief,
    WorkingPaper,
    TechnicalReport,
    Publication,
}

impl DocumentType {
    /// All categories in tie-break priority order.
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Factsheet,
        DocumentType::PolicyBrief,
        DocumentType::WorkingPaper,
        DocumentType::TechnicalReport,
        DocumentType::Publication,
    ];

    /// Display name of the category.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Factsheet => "Factsheet",
            DocumentType::PolicyBrief => "Policy Brief",
            DocumentType::WorkingPaper => "Working Paper",
            DocumentType::TechnicalReport => "Technical Report",
            DocumentType::Publication => "Publication",
        }
    }
}

/// A signal that fired during classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredSignal {
    pub name: String,
    pub weight: f64,
}

/// Classification outcome. Always produced; an absence of signals yields
/// [`DocumentType::Publication`] at zero confidence, never a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub predicted_type: DocumentType,
    /// Normalized margin between the two best-scoring categories, 0..1.
    pub confidence: f64,
    /// Signals that fired, in table order.
    pub fired: Vec<FiredSignal>,
}

/// Inputs to the classifier, precomputed by the extraction pipeline.
#[derive(Debug, Clone)]
pub struct SignalInput<'a> {
    pub page_count: usize,
    /// Folded text sample (see `metadata::fold_text`) from the opening pages.
    pub text: &'a str,
    /// A checksum-valid ISBN was found anywhere in the document.
    pub has_isbn: bool,
    /// The opening pages show a table-of-contents-like structure.
    pub has_toc: bool,
}

struct Signal {
    name: &'static str,
    target: DocumentType,
    weight: f64,
    predicate: fn(&SignalInput) -> bool,
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

const SIGNALS: &[Signal] = &[
    Signal {
        name: "factsheet-keywords",
        target: DocumentType::Factsheet,
        weight: 2.0,
        predicate: |i| {
            contains_any(
                i.text,
                &["fact sheet", "factsheet", "key facts", "at a glance", "quick facts"],
            )
        },
    },
    Signal {
        name: "policy-brief-keywords",
        target: DocumentType::PolicyBrief,
        weight: 2.0,
        predicate: |i| {
            contains_any(
                i.text,
                &["policy brief", "policy recommendations", "policy options", "policy note"],
            )
        },
    },
    Signal {
        name: "working-paper-keywords",
        target: DocumentType::WorkingPaper,
        weight: 2.0,
        predicate: |i| {
            contains_any(
                i.text,
                &["working paper", "discussion paper", "preliminary findings", "working document"],
            )
        },
    },
    Signal {
        name: "technical-report-keywords",
        target: DocumentType::TechnicalReport,
        weight: 2.0,
        predicate: |i| {
            contains_any(
                i.text,
                &["technical report", "methodology", "technical annex", "technical assessment"],
            )
        },
    },
    Signal {
        name: "publication-keywords",
        target: DocumentType::Publication,
        weight: 1.0,
        predicate: |i| {
            contains_any(
                i.text,
                &["published by", "all rights reserved", "copyright", "printed in"],
            )
        },
    },
    Signal {
        name: "very-short-document",
        target: DocumentType::Factsheet,
        weight: 2.0,
        predicate: |i| i.page_count > 0 && i.page_count <= 4,
    },
    Signal {
        name: "short-document",
        target: DocumentType::PolicyBrief,
        weight: 1.0,
        predicate: |i| (5..=12).contains(&i.page_count),
    },
    Signal {
        name: "long-document",
        target: DocumentType::Publication,
        weight: 2.0,
        predicate: |i| i.page_count >= 50,
    },
    Signal {
        name: "long-technical-document",
        target: DocumentType::TechnicalReport,
        weight: 1.0,
        predicate: |i| i.page_count >= 50,
    },
    Signal {
        name: "isbn-present",
        target: DocumentType::Publication,
        weight: 3.0,
        predicate: |i| i.has_isbn,
    },
    Signal {
        name: "toc-structure",
        target: DocumentType::Publication,
        weight: 1.0,
        predicate: |i| i.has_toc,
    },
];

/// Classify a document from precomputed signals.
///
/// Score per category = sum of fired signal weights. Highest score wins;
/// confidence is the margin between the top two scores normalized by the
/// total fired weight, so unanimity approaches 1 and an even split
/// approaches 0. Ties resolve by the fixed [`DocumentType::ALL`] order.
pub fn classify(input: &SignalInput) -> DetectionResult {
    let mut fired = Vec::new();
    let mut scores: Vec<(DocumentType, f64)> =
        DocumentType::ALL.iter().map(|t| (*t, 0.0)).collect();
    let mut total = 0.0;

    for signal in SIGNALS {
        if (signal.predicate)(input) {
            fired.push(FiredSignal {
                name: signal.name.to_string(),
                weight: signal.weight,
            });
            total += signal.weight;
            for (t, score) in scores.iter_mut() {
                if *t == signal.target {
                    *score += signal.weight;
                }
            }
        }
    }

    if total == 0.0 {
        return DetectionResult {
            predicted_type: DocumentType::Publication,
            confidence: 0.0,
            fired,
        };
    }

    // Scan in priority order with a strictly-greater comparison so ties
    // keep the earlier (more specific) category.
    let mut best_index = 0;
    for (i, (_, score)) in scores.iter().enumerate() {
        if *score > scores[best_index].1 {
            best_index = i;
        }
    }
    let (predicted_type, best_score) = scores[best_index];

    let second_score = scores
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != best_index)
        .map(|(_, (_, s))| *s)
        .fold(0.0, f64::max);

    DetectionResult {
        predicted_type,
        confidence: (best_score - second_score) / total,
        fired,
    }
}
