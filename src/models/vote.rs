use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::db::atomic_write;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(ascii_case_insensitive)]
pub enum VoteType {
    #[strum(to_string = "upvote", serialize = "up")]
    Upvote,
    #[strum(to_string = "downvote", serialize = "down")]
    Downvote,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    pub voter: String,
    pub vote_type: VoteType,
    pub cast_at: Timestamp,
}

/// One vote request, kept whether it created, replaced or withdrew a row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteCast {
    pub voter: String,
    pub at: Timestamp,
}

/// All votes on one comment. Persisted as a single file so a voter's row can
/// be replaced under one lock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteLedger {
    pub comment_id: String,
    pub post_id: String,
    #[serde(default)]
    pub votes: Vec<Vote>,
    /// Recent vote requests, for rate limiting. Pruned on every write.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub casts: Vec<VoteCast>,
}

impl VoteLedger {
    pub fn new(comment_id: String, post_id: String) -> Self {
        Self {
            comment_id,
            post_id,
            votes: Vec::new(),
            casts: Vec::new(),
        }
    }

    /// Log a vote request and drop entries older than `keep_since`.
    pub fn record_cast(&mut self, voter: &str, at: Timestamp, keep_since: Timestamp) {
        self.casts.retain(|c| c.at >= keep_since);
        self.casts.push(VoteCast {
            voter: voter.to_owned(),
            at,
        });
    }

    pub fn dir(base: &Path, post_id: &str) -> PathBuf {
        base.join("posts").join(post_id).join("votes")
    }

    pub fn file_path(&self, base: &Path) -> PathBuf {
        Self::dir(base, &self.post_id).join(format!("{}.toml", self.comment_id))
    }

    pub fn lock_path(base: &Path, post_id: &str, comment_id: &str) -> PathBuf {
        Self::dir(base, post_id).join(format!("{comment_id}.lock"))
    }

    pub fn write_file(&self, base: &Path) -> Result<()> {
        let path = self.file_path(base);
        let content = toml::to_string(self).context("Failed to serialize vote ledger")?;
        atomic_write(&path, content.as_bytes())
    }
}
