//! Structured-answer extraction from generative-AI completion text
//!
//! Completions are free text that usually, but not always, embed a JSON
//! object. Extraction takes the first balanced `{...}` substring (brace
//! counting is string- and escape-aware, so braces inside JSON strings do
//! not terminate the scan) and parses it into the requested type.
//!
//! The outcome is a three-way verdict rather than an `Option`, because the
//! two failure cases carry different default sets downstream: "no JSON at
//! all" and "JSON-looking text that failed to parse" are handled with
//! distinct placeholder values by both consumers.

use serde::de::DeserializeOwned;
use tracing::debug;

/// Verdict of extracting a structured answer from completion text.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    /// A balanced `{...}` substring was found and parsed.
    Structured(T),
    /// A balanced `{...}` substring was found but was not valid JSON
    /// (or did not match the expected shape).
    InvalidJson,
    /// No brace-delimited substring in the completion at all.
    NoJson,
}

/// Extract the first balanced `{...}` substring from `text`.
///
/// Returns `None` when there is no opening brace or the braces never
/// balance. Quoted strings and escape sequences are skipped, so a `}`
/// inside a JSON string value does not close the object early.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    // Brace positions are ASCII, so the slice is on char boundaries.
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Extract and parse a structured answer of type `T` from completion text.
pub fn extract_structured<T: DeserializeOwned>(text: &str) -> Extraction<T> {
    match extract_json_object(text) {
        Some(snippet) => match serde_json::from_str(snippet) {
            Ok(value) => Extraction::Structured(value),
            Err(e) => {
                debug!(error = %e, "embedded JSON snippet failed to parse");
                Extraction::InvalidJson
            }
        },
        None => Extraction::NoJson,
    }
}
