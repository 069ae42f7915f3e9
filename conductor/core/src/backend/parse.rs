//! Prompt and Answer Parsing
//!
//! Shared by every text-generating backend: the prompt that asks the model
//! for a DOI and title, and the parser that pulls them back out of free text.
//!
//! Models are asked to answer with two labelled lines:
//!
//! ```text
//! DOI: 10.1000/xyz123
//! Title: The canonical article title
//! ```
//!
//! with `NOT_FOUND` for anything they could not determine. A labelled DOI
//! is taken as written, minus link prefixes and markdown decoration. Answers
//! that ignore the format still get a best-effort scan for the first
//! DOI-shaped token. Extraction only; DOI syntax is not validated, so SICI
//! DOIs with `<`, `>`, `;` or `#` come through intact.

use once_cell::sync::Lazy;
use regex::Regex;

/// Marker the model is asked to use for missing values
pub const NOT_FOUND_MARKER: &str = "NOT_FOUND";

/// Resolver prefixes stripped from a labelled DOI
const DOI_PREFIXES: [&str; 6] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi.org/",
    "doi:",
];

static DOI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"10\.\d{4,9}/[^\s"']+"#).expect("valid doi regex"));
static DOI_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[\s*_>#-]*doi[\s*_]*:\s*(.*)$").expect("valid doi line regex")
});
static TITLE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[\s*_>#-]*title[\s*_]*:\s*(.*)$").expect("valid title line regex")
});

/// Build the lookup prompt for one citation
#[must_use]
pub fn build_prompt(citation: &str) -> String {
    format!(
        "You are a bibliographic research assistant. Identify the scholarly work \
         referenced by the citation below and find its Digital Object Identifier (DOI). \
         Search authoritative sources (publisher pages, Crossref, doi.org) and do not \
         invent a DOI.\n\
         \n\
         Answer with exactly these two lines:\n\
         DOI: <the bare DOI, e.g. 10.1000/xyz123, or {NOT_FOUND_MARKER}>\n\
         Title: <the canonical title of the work, or {NOT_FOUND_MARKER}>\n\
         \n\
         Citation:\n{}",
        citation.trim()
    )
}

/// Extract `(doi, title)` from a model answer
#[must_use]
pub fn parse_answer(raw: &str) -> (Option<String>, Option<String>) {
    let doi = match DOI_LINE_RE.captures(raw) {
        Some(caps) => caps.get(1).and_then(|m| labelled_doi(m.as_str())),
        None => extract_doi(raw),
    };

    let title = TITLE_LINE_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| clean_value(m.as_str()));

    (doi, title)
}

/// First DOI-shaped token in `text`, without trailing punctuation
#[must_use]
pub fn extract_doi(text: &str) -> Option<String> {
    if is_not_found(text) {
        return None;
    }
    DOI_RE.find(text).and_then(|m| {
        let doi = trim_doi_tail(m.as_str());
        (!doi.is_empty()).then(|| doi.to_string())
    })
}

/// The value of a `DOI:` line, taken as written
///
/// Only decoration is removed: markdown markers, a resolver prefix and
/// trailing sentence punctuation. Anything after the first whitespace is
/// commentary. If the value does not start like a DOI, it is scanned.
fn labelled_doi(value: &str) -> Option<String> {
    let value = strip_markers(value);
    if value.is_empty() || is_not_found(value) {
        return None;
    }

    let value = DOI_PREFIXES
        .iter()
        .find_map(|prefix| {
            value
                .get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| value[prefix.len()..].trim_start())
        })
        .unwrap_or(value);

    let token = strip_markers(value.split_whitespace().next().unwrap_or_default());
    if token.starts_with("10.") {
        let doi = trim_doi_tail(token);
        return (!doi.is_empty()).then(|| doi.to_string());
    }
    extract_doi(value)
}

/// Drop trailing punctuation and unbalanced closing brackets
fn trim_doi_tail(doi: &str) -> &str {
    let mut doi = doi;
    loop {
        let Some(last) = doi.chars().last() else {
            return doi;
        };
        let unbalanced = |open: char, close: char| {
            doi.matches(close).count() > doi.matches(open).count()
        };
        let strip = match last {
            '.' | ',' | ';' | ':' | '*' | '`' | '"' | '\'' => true,
            ')' => unbalanced('(', ')'),
            ']' => unbalanced('[', ']'),
            '>' => unbalanced('<', '>'),
            _ => false,
        };
        if !strip {
            return doi;
        }
        doi = &doi[..doi.len() - last.len_utf8()];
    }
}

fn strip_markers(value: &str) -> &str {
    value.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '*' | '_' | '`' | '"' | '\u{201c}' | '\u{201d}')
    })
}

fn clean_value(value: &str) -> Option<String> {
    let cleaned = strip_markers(value);
    if cleaned.is_empty() || is_not_found(cleaned) {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn is_not_found(value: &str) -> bool {
    let normalized = value
        .trim()
        .trim_matches(|c: char| matches!(c, '*' | '_' | '`' | '.' | '"'))
        .to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "not_found" | "not found" | "none" | "n/a" | "null" | "unknown" | "-"
    )
}
