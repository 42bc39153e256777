//! Locality extraction from free-text queries.
//!
//! A single best guess from a few regex heuristics: quoted text first, then
//! the first run of capitalized words once command verbs are stripped, then
//! the last remaining word.  Compare queries naming several localities yield
//! the first one; callers issue one query per locality.

use once_cell::sync::Lazy;
use regex::Regex;

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());

static STOP_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(analyze|show|compare|give|for|price|growth|trend|trends",
        r"|demand|of|the|last|over|years)\b",
    ))
    .unwrap()
});

/// Guess the locality named in `query`.  Returns an empty string when nothing
/// usable remains.
pub fn extract_locality(query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        return String::new();
    }

    if let Some(quoted) = QUOTED.captures(query).and_then(|c| c.get(1)) {
        return quoted.as_str().trim().to_string();
    }

    let stripped = STOP_WORDS.replace_all(query, " ");
    let tokens: Vec<&str> = stripped.split_whitespace().collect();

    if let Some(run) = first_capitalized_run(&tokens) {
        return run;
    }

    tokens.last().map(|t| t.to_string()).unwrap_or_default()
}

fn first_capitalized_run(tokens: &[&str]) -> Option<String> {
    let start = tokens.iter().position(|t| is_capitalized(t))?;
    let run: Vec<&str> = tokens[start..]
        .iter()
        .copied()
        .take_while(|t| is_capitalized(t))
        .collect();
    Some(run.join(" "))
}

fn is_capitalized(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}
