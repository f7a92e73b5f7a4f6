//! Font name normalization and weight derivation.
//!
//! PDF font names arrive in non-canonical forms: subset-tagged
//! (`BAAAAA+Arial`), style-suffixed (`Roboto-Bold`), foundry-suffixed
//! (`TimesNewRomanPSMT`). Normalization strips all of these and folds the
//! remainder against an alias table, keeping a canonical display form.
//! The operation is idempotent: `normalize_family(normalize_family(x)) ==
//! normalize_family(x)`.

use crate::text::FontWeight;

/// FontDescriptor `/Flags` bit marking a bold-rendered font (PDF 32000-1,
/// table 123: ForceBold, bit position 19).
pub const FLAG_FORCE_BOLD: u32 = 1 << 18;

/// Style vocabulary recognized in font name tokens, longest first so that
/// compound tokens like `BoldItalic` strip greedily.
const STYLE_WORDS: &[&str] = &[
    "extracondensed",
    "semicondensed",
    "ultralight",
    "extralight",
    "extrabold",
    "ultrabold",
    "condensed",
    "semibold",
    "demibold",
    "oblique",
    "slanted",
    "regular",
    "italic",
    "medium",
    "heavy",
    "light",
    "black",
    "roman",
    "bold",
    "book",
    "demi",
    "thin",
    "cond",
    "it",
];

/// Known family aliases, keyed by the case/space/hyphen-folded name.
/// Values are the canonical display forms.
const FAMILY_ALIASES: &[(&str, &str)] = &[
    ("arial", "Arial"),
    ("arialmt", "Arial"),
    ("arialnarrow", "Arial Narrow"),
    ("arialunicodems", "Arial Unicode MS"),
    ("calibri", "Calibri"),
    ("cambria", "Cambria"),
    ("courier", "Courier"),
    ("couriernew", "Courier New"),
    ("couriernewps", "Courier New"),
    ("couriernewpsmt", "Courier New"),
    ("garamond", "Garamond"),
    ("georgia", "Georgia"),
    ("helvetica", "Helvetica"),
    ("helveticaneue", "Helvetica Neue"),
    ("lato", "Lato"),
    ("minionpro", "Minion Pro"),
    ("montserrat", "Montserrat"),
    ("myriadpro", "Myriad Pro"),
    ("notosans", "Noto Sans"),
    ("notoserif", "Noto Serif"),
    ("opensans", "Open Sans"),
    ("roboto", "Roboto"),
    ("sourcesanspro", "Source Sans Pro"),
    ("symbol", "Symbol"),
    ("times", "Times"),
    ("timesnewroman", "Times New Roman"),
    ("timesnewromanps", "Times New Roman"),
    ("timesnewromanpsmt", "Times New Roman"),
    ("timesroman", "Times"),
    ("verdana", "Verdana"),
    ("zapfdingbats", "ZapfDingbats"),
];

/// Strip a subset tag (exactly six uppercase letters followed by `+`)
/// from the start of a font name.
pub fn strip_subset_tag(raw: &str) -> &str {
    if let Some((prefix, rest)) = raw.split_once('+') {
        if prefix.len() == 6 && prefix.chars().all(|c| c.is_ascii_uppercase()) {
            return rest;
        }
    }
    raw
}

/// Returns `true` if the token is made entirely of style vocabulary,
/// ignoring case and trailing foundry suffixes (`MT`, `PSMT`, `PS`).
fn is_style_token(token: &str) -> bool {
    let mut rest = strip_foundry_suffix(&token.to_ascii_lowercase());
    if rest.is_empty() {
        return false;
    }
    'outer: while !rest.is_empty() {
        for word in STYLE_WORDS {
            if let Some(tail) = rest.strip_prefix(word) {
                rest = tail.to_string();
                continue 'outer;
            }
        }
        return false;
    }
    true
}

/// Strip a trailing foundry suffix from a lowercase token.
fn strip_foundry_suffix(token: &str) -> String {
    for suffix in ["psmt", "mt", "ps"] {
        if let Some(base) = token.strip_suffix(suffix) {
            if !base.is_empty() {
                return base.to_string();
            }
        }
    }
    token.to_string()
}

/// Fold a name for alias lookup: lowercase with spaces and hyphens removed.
fn fold_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Normalize a raw PDF font name to its canonical family.
///
/// Steps: strip the subset tag, drop trailing style tokens (split on `-`
/// and `,`), drop foundry suffixes, then fold against the alias table.
/// Names without an alias entry are returned with their original casing.
pub fn normalize_family(raw: &str) -> String {
    let name = strip_subset_tag(raw);

    // Drop trailing style tokens: "Roboto-Bold" -> "Roboto",
    // "FreightText-BoldItalic" -> "FreightText".
    let mut tokens: Vec<&str> = name.split(['-', ',']).filter(|t| !t.is_empty()).collect();
    while tokens.len() > 1 && is_style_token(tokens[tokens.len() - 1]) {
        tokens.pop();
    }
    let base = tokens.join(" ");

    let key = fold_key(&base);
    // Alias lookup first on the full key, then with foundry suffix removed
    // ("timesnewromanpsmt" hits directly; unknown "somefontmt" falls back).
    for (alias, canonical) in FAMILY_ALIASES {
        if key == *alias {
            return (*canonical).to_string();
        }
    }
    let bare = strip_foundry_suffix(&key);
    for (alias, canonical) in FAMILY_ALIASES {
        if bare == *alias {
            return (*canonical).to_string();
        }
    }

    if base.is_empty() { name.to_string() } else { base }
}

/// Derive a font weight from name tokens.
///
/// Compound grades are checked before their substrings so `ExtraBold`
/// resolves to `Black` rather than `Bold`.
pub fn weight_from_name(raw: &str) -> FontWeight {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("extrabold") || lower.contains("ultrabold") {
        FontWeight::Black
    } else if lower.contains("black") || lower.contains("heavy") {
        FontWeight::Black
    } else if lower.contains("semibold") || lower.contains("demibold") {
        FontWeight::SemiBold
    } else if lower.contains("bold") {
        FontWeight::Bold
    } else if lower.contains("medium") {
        FontWeight::Medium
    } else if lower.contains("extralight")
        || lower.contains("ultralight")
        || lower.contains("light")
        || lower.contains("thin")
    {
        FontWeight::Light
    } else {
        FontWeight::Regular
    }
}

/// Derive weight from the raw name and the FontDescriptor flags.
///
/// The name decides; the ForceBold flag only upgrades a name that carries
/// no weight information of its own.
pub fn derive_weight(raw_name: &str, descriptor_flags: Option<u32>) -> FontWeight {
    let from_name = weight_from_name(raw_name);
    if from_name == FontWeight::Regular
        && descriptor_flags.is_some_and(|f| f & FLAG_FORCE_BOLD != 0)
    {
        FontWeight::Bold
    } else {
        from_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_six_letter_subset_tag() {
        assert_eq!(strip_subset_tag("BAAAAA+Arial"), "Arial");
        assert_eq!(strip_subset_tag("ABCDEF+Roboto-Bold"), "Roboto-Bold");
    }

    #[test]
    fn keeps_non_subset_plus_names() {
        // Wrong length or lowercase prefix is not a subset tag
        assert_eq!(strip_subset_tag("ABC+Font"), "ABC+Font");
        assert_eq!(strip_subset_tag("abcdef+Font"), "abcdef+Font");
        assert_eq!(strip_subset_tag("NoPlusHere"), "NoPlusHere");
    }

    #[test]
    fn normalizes_subset_and_style() {
        assert_eq!(normalize_family("ABCDEF+Roboto-Bold"), "Roboto");
        assert_eq!(normalize_family("Roboto-Bold"), "Roboto");
        assert_eq!(normalize_family("Roboto"), "Roboto");
    }

    #[test]
    fn normalizes_aliases() {
        assert_eq!(normalize_family("ArialMT"), "Arial");
        assert_eq!(normalize_family("Arial-BoldMT"), "Arial");
        assert_eq!(normalize_family("TimesNewRomanPSMT"), "Times New Roman");
        assert_eq!(normalize_family("TimesNewRomanPS-BoldMT"), "Times New Roman");
        assert_eq!(normalize_family("Times-Roman"), "Times");
        assert_eq!(normalize_family("Helvetica-Oblique"), "Helvetica");
        assert_eq!(normalize_family("CourierNewPSMT"), "Courier New");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "ABCDEF+Roboto-Bold",
            "ArialMT",
            "TimesNewRomanPSMT",
            "FreightText-BoldItalic",
            "SomeUnknownFace-Light",
            "Helvetica",
        ] {
            let once = normalize_family(raw);
            assert_eq!(normalize_family(&once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn unknown_families_keep_base_name() {
        assert_eq!(normalize_family("FreightText-BoldItalic"), "FreightText");
        assert_eq!(normalize_family("FrutigerLTStd-Roman"), "FrutigerLTStd");
    }

    #[test]
    fn compound_style_tokens_are_stripped() {
        assert_eq!(normalize_family("Lato-BoldItalic"), "Lato");
        assert_eq!(normalize_family("OpenSans-SemiBoldIt"), "Open Sans");
    }

    #[test]
    fn weight_from_name_grades() {
        assert_eq!(weight_from_name("Roboto-Bold"), FontWeight::Bold);
        assert_eq!(weight_from_name("Roboto-Black"), FontWeight::Black);
        assert_eq!(weight_from_name("Lato-Heavy"), FontWeight::Black);
        assert_eq!(weight_from_name("OpenSans-SemiBold"), FontWeight::SemiBold);
        assert_eq!(weight_from_name("Roboto-ExtraBold"), FontWeight::Black);
        assert_eq!(weight_from_name("Roboto-Medium"), FontWeight::Medium);
        assert_eq!(weight_from_name("Roboto-Light"), FontWeight::Light);
        assert_eq!(weight_from_name("Roboto-Thin"), FontWeight::Light);
        assert_eq!(weight_from_name("Roboto"), FontWeight::Regular);
    }

    #[test]
    fn force_bold_flag_upgrades_regular_only() {
        assert_eq!(
            derive_weight("SomeFace", Some(FLAG_FORCE_BOLD)),
            FontWeight::Bold
        );
        assert_eq!(derive_weight("SomeFace", Some(0)), FontWeight::Regular);
        assert_eq!(derive_weight("SomeFace", None), FontWeight::Regular);
        // Name wins over the flag
        assert_eq!(
            derive_weight("SomeFace-Light", Some(FLAG_FORCE_BOLD)),
            FontWeight::Light
        );
    }
}
