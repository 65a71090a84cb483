//! Title to identifier derivation
//!
//!     Identifiers are lower case ASCII words joined by `-`. Greek letters and a handful
//!     of symbols are spelled out as words, latin letters are decomposed and lose their
//!     combining marks, and every other run of characters becomes a single separator:
//!
//!         "Ω & α-Decay"       ->  "omega-and-alpha-decay"
//!         "Café au lait"      ->  "cafe-au-lait"
//!         "  --Hello--  "     ->  "hello"
//!
//!     Scopes add `/` between the scope identifier and the local one; this module never
//!     produces `/` itself.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static SEPARATOR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

const GREEK: &[(char, &str)] = &[
    ('α', "alpha"),
    ('β', "beta"),
    ('γ', "gamma"),
    ('δ', "delta"),
    ('ε', "epsilon"),
    ('ζ', "zeta"),
    ('η', "eta"),
    ('θ', "theta"),
    ('ι', "iota"),
    ('κ', "kappa"),
    ('λ', "lambda"),
    ('μ', "mu"),
    ('ν', "nu"),
    ('ξ', "xi"),
    ('ο', "omicron"),
    ('π', "pi"),
    ('ρ', "rho"),
    ('σ', "sigma"),
    ('ς', "sigma"),
    ('τ', "tau"),
    ('υ', "upsilon"),
    ('φ', "phi"),
    ('χ', "chi"),
    ('ψ', "psi"),
    ('ω', "omega"),
];

const PUNCTUATION: &[(char, &str)] = &[
    ('%', "percent"),
    ('&', "and"),
    ('+', "plus"),
    ('@', "at"),
    ('\u{2212}', "minus"),
];

/// Latin letters with a stroke or ligature, which canonical decomposition leaves alone
const UNDECOMPOSED: &[(char, &str)] = &[
    ('ß', "ss"),
    ('æ', "ae"),
    ('œ', "oe"),
    ('ø', "o"),
    ('đ', "d"),
    ('ð', "d"),
    ('ħ', "h"),
    ('ı', "i"),
    ('ł', "l"),
    ('ŧ', "t"),
    ('þ', "th"),
];

fn spelled_out(ch: char) -> Option<&'static str> {
    GREEK
        .iter()
        .chain(PUNCTUATION.iter())
        .find(|(c, _)| *c == ch)
        .map(|(_, word)| *word)
}

/// Derive an identifier from plain title text
pub fn title_to_id(title: &str) -> String {
    let mut words = String::with_capacity(title.len());
    let lowered: String = title.chars().flat_map(char::to_lowercase).collect();
    for ch in lowered.as_str().nfd().filter(|c| !is_combining_mark(*c)) {
        if let Some((_, ascii)) = UNDECOMPOSED.iter().find(|(c, _)| *c == ch) {
            words.push_str(ascii);
        } else if let Some(word) = spelled_out(ch) {
            words.push('-');
            words.push_str(word);
            words.push('-');
        } else {
            words.push(ch);
        }
    }
    SEPARATOR_RUN
        .replace_all(&words, "-")
        .trim_matches('-')
        .to_string()
}

/// Derive an identifier and put the macro's identifier prefix in front
///
/// An empty title yields an empty identifier regardless of the prefix.
pub fn prefixed_title_to_id(title: &str, prefix: &str) -> String {
    let id = title_to_id(title);
    if id.is_empty() || prefix.is_empty() {
        id
    } else {
        format!("{}-{}", prefix, id)
    }
}

/// Put a scope in front of a local identifier
pub fn scoped(scope: Option<&str>, id: &str) -> String {
    match scope {
        Some(scope) if !scope.is_empty() => format!("{}/{}", scope, id),
        _ => id.to_string(),
    }
}
