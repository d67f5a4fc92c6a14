//! Clan/player tag handling
//!
//! Tags arrive from the API and from configuration in mixed shapes: with or
//! without a leading `#`, sometimes lowercased. Everything downstream
//! (checkpoint, dataset keys, API paths) works on the canonical form, so
//! canonicalization happens at the edges and nowhere else.

/// Canonicalizes a clan or player tag.
///
/// Strips surrounding whitespace and a leading `#`, then uppercases. The
/// result is the form stored in the visited-set checkpoint and the dataset.
pub fn canonical(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_ascii_uppercase()
}

/// Returns true if a canonical tag looks plausible (non-empty, ASCII
/// alphanumeric). The API itself is the final authority; this only catches
/// configuration typos early.
pub fn is_valid(tag: &str) -> bool {
    !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Percent-encodes a canonical tag for use in an API path segment.
///
/// The API addresses entities as `#TAG`, which must be sent as `%23TAG`.
pub fn encode_for_path(tag: &str) -> String {
    format!("%23{}", canonical(tag))
}
