pub mod fuzzy;
pub mod names;

pub use fuzzy::{normalized_titles_match, Tolerance};

use deunicode::deunicode;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Bracketed suffix sometimes appended to imported DOIs and titles
    static ref BRACKETED: Regex = Regex::new(r"\[.*\]").unwrap();
}

/// Canonicalizes a free-text title for comparison: every non-alphanumeric run
/// becomes a single space, diacritics fold to ASCII, the result is lowercased
/// and trimmed.
pub fn normalize_title(s: &str) -> String {
    let spaced: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    deunicode(&spaced)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes a DOI for identity comparison: lowercase, resolver URL prefix
/// stripped, bracketed suffix dropped. Returns `None` when nothing usable
/// remains.
pub fn normalize_doi(doi: &str) -> Option<String> {
    let mut d = doi.trim().to_lowercase();
    for prefix in [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
    ] {
        if let Some(rest) = d.strip_prefix(prefix) {
            d = rest.to_string();
            break;
        }
    }
    let d = BRACKETED.replace_all(&d, "").trim().to_string();
    if d.is_empty() {
        None
    } else {
        Some(d)
    }
}

/// Characters the archive search syntax treats as operators.
const QUERY_SPECIALS: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '~', '*', '?', ':', '"',
];

/// Backslash-escapes query syntax characters before embedding free text in a
/// search expression.
pub fn escape_query(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if ch == '\\' || QUERY_SPECIALS.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Drops a trailing bracketed segment from bilingually-imported titles when
/// the two segments detect as different natural languages. Detection failure
/// leaves the title untouched; this is a heuristic, not a guarantee.
pub fn trim_bilingual_suffix(title: &str) -> &str {
    if !title.ends_with(']') {
        return title;
    }
    let Some(open) = title.rfind('[') else {
        return title;
    };
    let head = title[..open].trim_end();
    let tail = &title[open + 1..title.len() - 1];
    if head.is_empty() || tail.is_empty() {
        return title;
    }
    match (whatlang::detect_lang(head), whatlang::detect_lang(tail)) {
        (Some(a), Some(b)) if a != b => head,
        _ => title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title_folds_diacritics() {
        assert_eq!(normalize_title("Étude sur le climat"), "etude sur le climat");
    }

    #[test]
    fn test_normalize_title_collapses_punctuation() {
        assert_eq!(
            normalize_title("Deep   learning: a (brief) survey!"),
            "deep learning a brief survey"
        );
    }

    #[test]
    fn test_normalize_title_trims() {
        assert_eq!(normalize_title("  spaced out  "), "spaced out");
        assert_eq!(normalize_title("???"), "");
    }

    #[test]
    fn test_normalize_doi_strips_url_prefix() {
        assert_eq!(
            normalize_doi("https://doi.org/10.1234/ABC.def").as_deref(),
            Some("10.1234/abc.def")
        );
        assert_eq!(
            normalize_doi("http://dx.doi.org/10.1/X").as_deref(),
            Some("10.1/x")
        );
    }

    #[test]
    fn test_normalize_doi_drops_bracketed_suffix() {
        assert_eq!(
            normalize_doi("10.1234/abc[pii]").as_deref(),
            Some("10.1234/abc")
        );
    }

    #[test]
    fn test_normalize_doi_empty() {
        assert_eq!(normalize_doi(""), None);
        assert_eq!(normalize_doi("   "), None);
        assert_eq!(normalize_doi("https://doi.org/"), None);
    }

    #[test]
    fn test_escape_query() {
        assert_eq!(escape_query("a+b:c"), r"a\+b\:c");
        assert_eq!(escape_query(r"back\slash"), r"back\\slash");
        assert_eq!(escape_query("plain words"), "plain words");
    }

    #[test]
    fn test_trim_bilingual_suffix_different_scripts() {
        let title = "Analysis of crop rotation effects on soil quality \
                     [Анализ влияния севооборота на качество почвы]";
        assert_eq!(
            trim_bilingual_suffix(title),
            "Analysis of crop rotation effects on soil quality"
        );
    }

    #[test]
    fn test_trim_bilingual_suffix_no_bracket_is_noop() {
        let title = "A perfectly ordinary monolingual title";
        assert_eq!(trim_bilingual_suffix(title), title);
    }

    #[test]
    fn test_trim_bilingual_suffix_same_language_is_noop() {
        let title = "Results of the annual national survey of household income \
                     [including all the supplementary tables and figures for reference]";
        assert_eq!(trim_bilingual_suffix(title), title);
    }

    #[test]
    fn test_trim_bilingual_suffix_empty_segment_is_noop() {
        assert_eq!(trim_bilingual_suffix("[only brackets]"), "[only brackets]");
        assert_eq!(trim_bilingual_suffix("head []"), "head []");
    }
}
