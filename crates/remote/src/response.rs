// crates/remote/src/response.rs
//! Parsing of remote write responses
//!
//! The remote API answers a successful POST with either structured JSON
//! (`{"id": 17}`) or a free-text sentence (`"Line created with id: 17"`,
//! `"Created Station with id: 17"`). Both shapes must be handled.
//!
//! The sentence form is parsed by scanning for the last `id:` marker and is
//! deliberately not hardened further: it is a known compatibility risk
//! against upstream wording changes, and an unparseable body is surfaced as
//! a hard error rather than guessed at.

use crate::error::{RemoteError, RemoteResult};

/// Extracts the remote-assigned identifier from a create response body
pub fn parse_created_id(entity: &str, body: &str) -> RemoteResult<i64> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(id) = value.get("id").and_then(|v| v.as_i64()) {
            return Ok(id);
        }
        // A bare integer body also counts as an id
        if let Some(id) = value.as_i64() {
            return Ok(id);
        }
    }

    parse_id_sentence(body).ok_or_else(|| {
        RemoteError::MalformedResponse(format!(
            "could not extract the created {entity} id from response: {body}"
        ))
    })
}

/// Parses the trailing integer of an `... id: N` sentence
fn parse_id_sentence(body: &str) -> Option<i64> {
    let trimmed = body.trim();
    let marker = trimmed.to_ascii_lowercase().rfind("id:")?;
    let tail = trimmed[marker + 3..].trim();
    let digits: String = tail
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    digits.parse().ok()
}
