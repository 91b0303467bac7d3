//! Text Helpers
//!
//! Normalization, key-term extraction and similarity metrics shared by the
//! relevance validator and the clarification deduplicator.

use std::collections::HashSet;

/// Words carrying no topical signal. Tokens of three characters or fewer
/// are dropped before this list is consulted.
const STOPWORDS: &[&str] = &[
    "what", "which", "where", "when", "whom", "whose", "with", "would", "should", "could",
    "will", "shall", "must", "need", "needs", "have", "does", "that", "this", "these", "those",
    "there", "their", "they", "them", "then", "than", "from", "into", "onto", "about", "your",
    "being", "been", "were", "also", "some", "such", "very", "just", "like", "want", "using",
    "used", "pick", "choose", "select", "make", "please", "each", "other", "only", "over",
];

/// Common abbreviations expanded before term extraction
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("db", "database"),
    ("dbs", "database"),
    ("auth", "authentication"),
    ("authn", "authentication"),
    ("authz", "authorization"),
    ("ui", "interface"),
    ("ux", "experience"),
    ("infra", "infrastructure"),
    ("env", "environment"),
    ("perf", "performance"),
    ("repo", "repository"),
    ("config", "configuration"),
    ("k8s", "kubernetes"),
];

/// Lowercase, drop punctuation, collapse whitespace
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase, collapse whitespace, strip surrounding quotes and trailing
/// punctuation. Used for verbatim containment checks, so inner punctuation
/// is preserved.
pub fn normalize_for_match(text: &str) -> String {
    let collapsed = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    collapsed
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '“' | '”' | '‘' | '’'))
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim()
        .to_string()
}

fn expand_abbreviation(token: &str) -> &str {
    ABBREVIATIONS
        .iter()
        .find(|(short, _)| *short == token)
        .map(|(_, long)| *long)
        .unwrap_or(token)
}

fn singularize(token: &str) -> String {
    if token.len() > 4 && token.ends_with("ies") {
        format!("{}y", &token[..token.len() - 3])
    } else if token.len() > 4
        && token.ends_with('s')
        && !token.ends_with("ss")
        && !token.ends_with("us")
        && !token.ends_with("is")
    {
        token[..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}

/// Key terms of a text: normalized tokens longer than three characters,
/// abbreviations expanded, plurals folded, stopwords removed.
pub fn significant_terms(text: &str) -> HashSet<String> {
    normalize_text(text)
        .split_whitespace()
        .map(expand_abbreviation)
        .map(singularize)
        .filter(|t| t.chars().count() > 3 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Edit distance over chars
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// `1 - distance / max(len)` over normalized text. Two empty strings are identical.
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_text(a);
    let b = normalize_text(b);
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(&a, &b) as f64 / max_len as f64
}

/// Jaccard similarity of two term sets. Empty sets share nothing.
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Cut to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
