//! Cleanup of captured identifiers before lookup

/// Captures containing one of these are sentences, not package names
const DISCARD_PHRASES: &[&str] = &[
    "is wanted",
    "should be defined",
    "is broken",
    "are broken",
];

/// Probes that ask a question instead of naming something
const DISCARD_PREFIXES: &[&str] = &["whether ", "if ", "how to ", "size of "];

const STRIP_PREFIXES: &[&str] = &[
    "for ",
    "Checking for ",
    "library containing ",
    "the ",
];

const STRIP_SUFFIXES: &[&str] = &[
    " usability",
    " presence",
    " headers",
    " library",
    " program",
    " works",
];

/// Separators after which only a version constraint follows
const VERSION_SEPARATORS: &[&str] = &[" >= ", " <= ", " > ", " < ", " = ", " version "];

/// Quote characters, including the typographic ones localized tools emit
const QUOTES: &[char] = &['\'', '"', '`', '\u{2018}', '\u{2019}', '\u{201c}', '\u{201d}'];

/// Normalize a raw capture to a lookup name; `None` when nothing usable remains
#[must_use]
pub fn normalize(raw: &str) -> Option<String> {
    let mut name = raw.trim();
    if DISCARD_PHRASES.iter().any(|phrase| name.contains(phrase))
        || DISCARD_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
    {
        return None;
    }

    name = name.trim_matches(QUOTES);
    for prefix in STRIP_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            name = rest;
        }
    }
    for separator in VERSION_SEPARATORS {
        if let Some(at) = name.find(separator) {
            name = &name[..at];
        }
    }
    for suffix in STRIP_SUFFIXES {
        if let Some(rest) = name.strip_suffix(suffix) {
            name = rest;
        }
    }

    let name = name
        .trim_start_matches(['(', ' '])
        .trim_end_matches(['.', ',', ':', ';', '!', ')', ' '])
        .trim_matches(QUOTES);

    (!name.is_empty()).then(|| name.to_string())
}
