use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the comment engine reports to its callers.
///
/// Variants stay distinct so a front end can render a specific message
/// ("content required" vs "comment no longer exists").
#[derive(Error, Debug)]
pub enum Error {
    /// Bad input: empty or oversized content, malformed slug, missing report details.
    #[error("{0}")]
    Validation(String),

    #[error("{kind} not found: {id}{}", did_you_mean(.suggestion))]
    NotFound {
        kind: &'static str,
        id: String,
        suggestion: Option<String>,
    },

    #[error("Comment {parent_id} belongs to post '{parent_post}', not '{post_id}'")]
    CrossPost {
        parent_id: String,
        parent_post: String,
        post_id: String,
    },

    #[error("Comments are disabled for post '{post_id}'")]
    CommentsDisabled { post_id: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("Too many {action} requests: limit is {limit} per {window_secs}s")]
    RateLimited {
        action: &'static str,
        limit: u32,
        window_secs: u64,
    },

    /// A concurrent writer held the vote ledger for too long.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage or I/O failure underneath the store.
    #[error(transparent)]
    Unavailable(#[from] anyhow::Error),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!("\nDid you mean: {s}"))
        .unwrap_or_default()
}

impl Error {
    pub fn validation<T: ToString>(message: T) -> Self {
        Self::Validation(message.to_string())
    }

    pub fn comment_not_found(id: &str, suggestion: Option<&str>) -> Self {
        Self::NotFound {
            kind: "Comment",
            id: id.to_owned(),
            suggestion: suggestion.map(str::to_owned),
        }
    }

    /// Whether the caller may simply retry the same request later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_) | Self::RateLimited { .. } | Self::Unavailable(_)
        )
    }
}
