//! Pattern-based detection of script-injection attempts in free text.
//!
//! This is a heuristic blocklist, not an HTML parser. It runs on every
//! submission before the validator's other checks.

use once_cell::sync::Lazy;
use regex::Regex;

struct Rule {
    name: &'static str,
    pattern: Regex,
}

/// Case-insensitive rules. Matches are never deduplicated; only "any match" matters.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    [
        ("script-tag", r"(?i)<\s*/?\s*script\b"),
        ("iframe-tag", r"(?i)<\s*/?\s*iframe\b"),
        ("javascript-uri", r"(?i)javascript\s*:"),
        ("vbscript-uri", r"(?i)vbscript\s*:"),
        ("data-html-uri", r"(?i)data\s*:\s*text/html"),
        ("event-handler", r"(?i)\bon[a-z]+\s*="),
        ("embed-tag", r"(?i)<\s*embed\b"),
        ("object-tag", r"(?i)<\s*object\b"),
        ("link-tag", r"(?i)<\s*link\b"),
        ("meta-tag", r"(?i)<\s*meta\b"),
        ("style-tag", r"(?i)<\s*/?\s*style\b"),
        ("css-expression", r"(?i)expression\s*\("),
        ("svg-onload", r"(?i)<\s*svg\b[^>]*onload"),
        ("alert-call", r"(?i)\balert\s*\("),
        ("eval-call", r"(?i)\beval\s*\("),
        ("document-cookie", r"(?i)document\s*\.\s*cookie"),
        ("window-location", r"(?i)window\s*\.\s*location"),
        ("inner-html", r"(?i)innerhtml"),
        ("outer-html", r"(?i)outerhtml"),
    ]
    .into_iter()
    .map(|(name, pattern)| Rule {
        name,
        // Patterns are literals above; a failure here is a programming error.
        pattern: Regex::new(pattern).expect("threat rule must compile"),
    })
    .collect()
});

/// Returns `true` when `text` matches any rule.
pub fn detect(text: &str) -> bool {
    !findings(text).is_empty()
}

/// Names of every rule that matches `text`, in rule order.
pub fn findings(text: &str) -> Vec<&'static str> {
    RULES
        .iter()
        .filter(|rule| rule.pattern.is_match(text))
        .map(|rule| rule.name)
        .collect()
}
