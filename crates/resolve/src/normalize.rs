//! Text normalization for comparison.
//!
//! Every function here is total: bad input degrades to an empty string.
//! Normalized forms are only ever compared, never displayed or exported.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Record;

/// Separator used when joining location parts and free-text notes.
pub const JOIN_SEPARATOR: &str = " | ";

/// Institution-type abbreviations. Matched as whole words, with or without
/// dots between letters ("ceip", "c.e.i.p.").
const ORG_ABBREVIATIONS: &[&str] = &[
    "ceip", "ies", "cp", "cpi", "cpr", "cra", "ceo", "cepa", "cifp", "cee", "eoi", "eei", "ei",
    "epa", "sies", "ipep", "cc", "esc", "col", "inst",
];

/// Generic institution words that carry no identifying information.
const ORG_GENERIC_WORDS: &[&str] = &[
    "colegio",
    "instituto",
    "escuela",
    "centro",
    "educacion",
    "educación",
    "infantil",
    "primaria",
    "secundaria",
    "publico",
    "público",
    "publica",
    "pública",
    "concertado",
    "privado",
    "privada",
    "rural",
    "agrupado",
    "school",
    "college",
    "institute",
];

static ORG_BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    let abbreviations = ORG_ABBREVIATIONS.iter().map(|abbr| {
        abbr.chars()
            .map(|c| regex::escape(&c.to_string()))
            .collect::<Vec<_>>()
            .join(r"\.?")
    });
    let words = ORG_GENERIC_WORDS.iter().map(|w| regex::escape(w));
    let alternation = abbreviations.chain(words).collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b\.?")).expect("boilerplate pattern is valid")
});

/// Characters dropped outright by [`clean`].
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
    )
}

/// Trim, drop invisible and control characters, map non-breaking spaces to
/// plain spaces and collapse whitespace runs to a single space.
pub fn clean(text: &str) -> String {
    let mapped: String = text
        .chars()
        .filter(|c| !is_invisible(*c))
        .map(|c| match c {
            '\u{00A0}' | '\u{202F}' | '\u{2007}' => ' ',
            c => c,
        })
        .filter(|c| c.is_whitespace() || !c.is_control())
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical form of an organization name for similarity comparison.
pub fn normalize_org_name(name: &str) -> String {
    let lowered = clean(name).to_lowercase();
    let stripped = ORG_BOILERPLATE.replace_all(&lowered, " ");
    let unpunctuated: String = stripped
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    unpunctuated.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase + trim. No validation.
pub fn normalize_email(email: &str) -> String {
    clean(email).to_lowercase()
}

/// Composite location key: non-empty locality, province and region joined
/// with [`JOIN_SEPARATOR`], lowercased. Records without any location share
/// the empty key, which callers must not treat as evidence.
pub fn location_key(record: &Record) -> String {
    [&record.locality, &record.province, &record.region]
        .iter()
        .map(|part| clean(part).to_lowercase())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(JOIN_SEPARATOR)
}
