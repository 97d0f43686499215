// Client-side text search over the searchable fields of a record list

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::core::{display_text, resolve_path, Record};

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s+\-@]").expect("static search pattern"));

/// Strip characters outside `[word, whitespace, +, -, @]`
pub fn clean_term(term: &str) -> String {
    DISALLOWED.replace_all(term, "").trim().to_string()
}

/// Case-insensitive substring match of `term` against `fields`.
///
/// An empty cleaned term, or no searchable fields, leaves the list unfiltered.
pub fn search_records(items: Vec<Record>, term: &str, fields: &[String]) -> Vec<Record> {
    let cleaned = clean_term(term);
    if cleaned.is_empty() || fields.is_empty() {
        return items;
    }

    let Ok(matcher) = RegexBuilder::new(&regex::escape(&cleaned))
        .case_insensitive(true)
        .build()
    else {
        return items;
    };

    items
        .into_iter()
        .filter(|record| {
            fields.iter().any(|path| {
                resolve_path(record, path)
                    .map(|value| matcher.is_match(&display_text(value)))
                    .unwrap_or(false)
            })
        })
        .collect()
}
