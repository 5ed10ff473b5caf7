use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonical form of a free-text player or team name: accents stripped,
/// uppercased, internal whitespace collapsed. Idempotent, so normalized
/// values can be compared against each other directly.
pub fn normalize(raw: &str) -> String {
    let stripped: String = raw.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let mut out = String::with_capacity(stripped.len());
    let mut pending_space = false;
    for ch in stripped.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        for upper in ch.to_uppercase() {
            out.push(upper);
        }
    }
    out
}

/// Equality under `normalize`. Used for goalie hint matching, where the
/// source PDFs and rosters disagree on case, accents and spacing.
pub fn names_match(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}
