//! Structured Response Parsing
//!
//! Locates the single structured-data block a response is asked to carry.
//! Parsing never fails: anything that does not decode comes back as
//! `ParsedResponse::Unstructured` for the prose scanners.

use serde::de::DeserializeOwned;

use crate::models::RequirementsAnalysis;

/// Outcome of parsing one service response
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// A decoded JSON object or array
    Structured(serde_json::Value),
    /// No decodable block; the raw text
    Unstructured(String),
}

impl ParsedResponse {
    /// Try the fenced/raw JSON block first, keep the text otherwise
    pub fn parse(text: &str) -> Self {
        extract_json_block(text)
            .and_then(|block| serde_json::from_str::<serde_json::Value>(&block).ok())
            .filter(|value| value.is_object() || value.is_array())
            .map(ParsedResponse::Structured)
            .unwrap_or_else(|| ParsedResponse::Unstructured(text.to_string()))
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, ParsedResponse::Structured(_))
    }

    /// Decode the structured payload into `T`
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        match self {
            ParsedResponse::Structured(value) => serde_json::from_value(value.clone()).ok(),
            ParsedResponse::Unstructured(_) => None,
        }
    }
}

/// Extract the first JSON block from a response.
///
/// Order: a ```json fence, then a bare fence whose body starts with `{` or
/// `[`, then the outermost `{...}` or `[...]` span of the raw text.
pub fn extract_json_block(text: &str) -> Option<String> {
    if let Some(start) = text.find("```json") {
        let after_fence = &text[start + "```json".len()..];
        if let Some(end) = after_fence.find("```") {
            return Some(after_fence[..end].trim().to_string());
        }
    }

    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find("```") {
        let after_fence = &text[search_from + offset + 3..];
        let body = match after_fence.find('\n') {
            Some(nl) => &after_fence[nl + 1..],
            None => after_fence,
        };
        let Some(end) = body.find("```") else {
            break;
        };
        let content = body[..end].trim();
        if content.starts_with('{') || content.starts_with('[') {
            return Some(content.to_string());
        }
        // Skip past the closing fence of this block
        let consumed = text.len() - body.len() + end + 3;
        if consumed >= text.len() {
            break;
        }
        search_from = consumed;
    }

    let start = text.find(|c: char| c == '{' || c == '[')?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| text[start..=end].to_string())
}

/// Decode an analysis response, falling back to neutral defaults
pub fn parse_analysis(text: &str) -> RequirementsAnalysis {
    match ParsedResponse::parse(text).decode::<RequirementsAnalysis>() {
        Some(analysis) => analysis,
        None => {
            tracing::warn!(
                response_len = text.len(),
                "analysis response carried no decodable block; using neutral defaults"
            );
            RequirementsAnalysis::default()
        }
    }
}
