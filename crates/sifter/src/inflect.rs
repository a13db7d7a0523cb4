//! English singularization for table and countable names.

const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("data", "datum"),
    ("movies", "movie"),
    ("series", "series"),
    ("species", "species"),
    ("news", "news"),
];

const ES_ENDINGS: &[&str] = &["sses", "xes", "zes", "ches", "shes"];

/// Stems that take `-es` after a final `s`.
const SES_STEMS: &[&str] = &["alias", "status", "bus", "virus", "campus", "bonus", "census"];

/// Singular form of a snake_case name; only the last segment is inflected.
pub(crate) fn singular(word: &str) -> String {
    let (head, last) = match word.rfind('_') {
        Some(index) => word.split_at(index + 1),
        None => ("", word),
    };
    format!("{head}{}", singular_word(last))
}

fn singular_word(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some((_, single)) = IRREGULAR.iter().find(|(plural, _)| *plural == lower) {
        return (*single).to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.chars().last().is_some_and(is_consonant) {
            return format!("{stem}y");
        }
    }
    if lower
        .strip_suffix("es")
        .is_some_and(|stem| SES_STEMS.contains(&stem))
    {
        return word[..word.len() - 2].to_string();
    }
    if ES_ENDINGS.iter().any(|ending| lower.ends_with(ending)) {
        return word[..word.len() - 2].to_string();
    }
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

fn is_consonant(ch: char) -> bool {
    ch.is_ascii_alphabetic() && !matches!(ch.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}
