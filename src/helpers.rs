use strsim::levenshtein;

use crate::error::{Error, Result};

pub const MAX_SLUG_LEN: usize = 128;
pub const MAX_IDENTITY_LEN: usize = 256;

/// Find the most similar ID from a list of candidates
pub fn find_similar_id<'a>(target: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&candidate| (candidate, levenshtein(target, candidate)))
        .filter(|(_, distance)| *distance <= 2)
        .min_by_key(|(_, distance)| *distance)
        .map(|(id, _)| id)
}

/// Trim comment text and enforce the length limit (counted in characters, not bytes).
pub fn normalize_content(content: &str, max_chars: usize) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Comment content is required"));
    }
    let len = trimmed.chars().count();
    if len > max_chars {
        return Err(Error::validation(format!(
            "Comment is too long: {len} characters (maximum {max_chars})"
        )));
    }
    Ok(trimmed.to_owned())
}

/// Post ids double as directory names, so only slug characters are accepted.
pub fn validate_post_id(post_id: &str) -> Result<()> {
    if post_id.is_empty() || post_id.len() > MAX_SLUG_LEN {
        return Err(Error::validation(format!(
            "Post id must be 1 to {MAX_SLUG_LEN} characters"
        )));
    }
    if !post_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::validation(format!(
            "Post id '{post_id}' may only contain letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}

pub fn normalize_identity(identity: &str) -> Result<String> {
    let trimmed = identity.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Identity token is required"));
    }
    if trimmed.len() > MAX_IDENTITY_LEN {
        return Err(Error::validation(format!(
            "Identity token exceeds {MAX_IDENTITY_LEN} bytes"
        )));
    }
    Ok(trimmed.to_owned())
}

/// Blank optional text collapses to `None`.
pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
