//! Singular and plural variants of identifiers
//!
//! Only the last `-` separated word of an identifier is inflected, so `big-dogs` and
//! `big-dog` are variants of each other. The rules are a small English table; anything
//! they get wrong simply does not resolve and falls back to the exact identifier.

const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("person", "people"),
    ("tooth", "teeth"),
    ("woman", "women"),
];

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "fish",
    "information",
    "news",
    "series",
    "sheep",
    "species",
];

/// Singulars ending in `ie`, whose plural would otherwise read as `-y` + `ies`
const IE_SINGULAR: &[&str] = &[
    "brownie", "calorie", "cookie", "genie", "lie", "movie", "pie", "prairie", "rookie",
    "selfie", "tie", "zombie",
];

/// Singulars ending in `o` that take `es`
const O_ES_SINGULAR: &[&str] = &[
    "echo", "embargo", "hero", "mosquito", "potato", "tomato", "torpedo", "veto", "volcano",
];

fn is_vowel(ch: char) -> bool {
    matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn singular_word(word: &str) -> String {
    if UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((single, _)) = IRREGULAR.iter().find(|(_, plural)| *plural == word) {
        return single.to_string();
    }
    if IRREGULAR.iter().any(|(single, _)| *single == word) {
        return word.to_string();
    }
    if let Some(single) = word.strip_suffix('s').filter(|w| IE_SINGULAR.contains(w)) {
        return single.to_string();
    }
    if let Some(single) = word.strip_suffix("es").filter(|w| O_ES_SINGULAR.contains(w)) {
        return single.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies").filter(|s| !s.is_empty()) {
        return format!("{}y", stem);
    }
    // bus, virus, status; but not house or cause
    if let Some(stem) = word.strip_suffix("uses") {
        if stem.chars().last().map(|c| !matches!(c, 'a' | 'o' | 'u')).unwrap_or(false) {
            return format!("{}us", stem);
        }
    }
    for suffix in ["sses", "xes", "zes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("yses") {
        return format!("{}is", &word[..word.len() - 2]);
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

fn plural_word(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(single, _)| *single == word) {
        return plural.to_string();
    }
    if IRREGULAR.iter().any(|(_, plural)| *plural == word) || singular_word(word) != word {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("is") {
        return format!("{}es", stem);
    }
    if O_ES_SINGULAR.contains(&word) {
        return format!("{}es", word);
    }
    if let Some(stem) = word.strip_suffix('y') {
        if stem.chars().last().map(|c| !is_vowel(c)).unwrap_or(false) {
            return format!("{}ies", stem);
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

fn map_last_word(id: &str, f: fn(&str) -> String) -> String {
    match id.rsplit_once('-') {
        Some((head, last)) => format!("{}-{}", head, f(last)),
        None => f(id),
    }
}

pub fn singularize(id: &str) -> String {
    map_last_word(id, singular_word)
}

pub fn pluralize(id: &str) -> String {
    map_last_word(id, plural_word)
}

/// Inflected variants of `id`, without `id` itself
pub fn variants(id: &str) -> Vec<String> {
    let mut out = Vec::new();
    for variant in [singularize(id), pluralize(id)] {
        if variant != id && !variant.is_empty() && !out.contains(&variant) {
            out.push(variant);
        }
    }
    out
}
