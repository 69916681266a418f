use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::db::atomic_write;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub content: String,
    /// Opaque identity token of the poster. Never shown in listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<Timestamp>,
    pub depth: u32,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl Comment {
    /// A new top-level comment.
    pub fn new(
        id: String,
        post_id: String,
        content: String,
        author: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            post_id,
            parent_id: None,
            content,
            author,
            created_at,
            edited_at: None,
            depth: 0,
            pinned: false,
            deleted: false,
            hidden: false,
        }
    }

    /// A reply to `parent`, one level deeper and on the same post.
    pub fn reply_to(
        parent: &Comment,
        id: String,
        content: String,
        author: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            parent_id: Some(parent.id.clone()),
            depth: parent.depth + 1,
            ..Self::new(id, parent.post_id.clone(), content, author, created_at)
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Deleted or hidden comments drop out of normal listings.
    pub fn is_removed(&self) -> bool {
        self.deleted || self.hidden
    }

    pub fn is_authored_by(&self, identity: &str) -> bool {
        self.author.as_deref() == Some(identity)
    }

    pub fn edit(&mut self, content: String, at: Timestamp) {
        self.content = content;
        self.edited_at = Some(at);
    }

    pub fn file_path(&self, base: &Path) -> PathBuf {
        base.join("posts")
            .join(&self.post_id)
            .join("comments")
            .join(format!("{}.toml", self.id))
    }

    pub fn write_file(&self, base: &Path) -> Result<()> {
        let path = self.file_path(base);
        let content = toml::to_string(self).context("Failed to serialize comment")?;
        atomic_write(&path, content.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Comment {
        Comment::new(
            "c1".to_string(),
            "p1".to_string(),
            "Great article!".to_string(),
            Some("v1".to_string()),
            Timestamp::from_second(1_000).unwrap(),
        )
    }

    #[test]
    fn reply_inherits_post_and_increments_depth() {
        let parent = root();
        let child = Comment::reply_to(
            &parent,
            "c2".to_string(),
            "Agreed".to_string(),
            None,
            Timestamp::from_second(2_000).unwrap(),
        );
        let grandchild = Comment::reply_to(
            &child,
            "c3".to_string(),
            "Same".to_string(),
            None,
            Timestamp::from_second(3_000).unwrap(),
        );

        assert_eq!(child.post_id, "p1");
        assert_eq!(child.parent_id.as_deref(), Some("c1"));
        assert_eq!(child.depth, 1);
        assert_eq!(grandchild.depth, 2);
        assert!(parent.is_top_level());
        assert!(!child.is_top_level());
    }

    #[test]
    fn edit_stamps_edited_at() {
        let mut comment = root();
        assert!(comment.edited_at.is_none());
        let at = Timestamp::from_second(5_000).unwrap();
        comment.edit("Great article, really".to_string(), at);
        assert_eq!(comment.content, "Great article, really");
        assert_eq!(comment.edited_at, Some(at));
    }

    #[test]
    fn removal_flags() {
        let mut comment = root();
        assert!(!comment.is_removed());
        comment.hidden = true;
        assert!(comment.is_removed());
        comment.hidden = false;
        comment.deleted = true;
        assert!(comment.is_removed());
    }

    #[test]
    fn authorship_is_exact_match() {
        let comment = root();
        assert!(comment.is_authored_by("v1"));
        assert!(!comment.is_authored_by("v2"));

        let anonymous = Comment {
            author: None,
            ..root()
        };
        assert!(!anonymous.is_authored_by(""));
    }

    #[test]
    fn toml_round_trip_keeps_flags() {
        let mut comment = root();
        comment.pinned = true;
        let text = toml::to_string(&comment).unwrap();
        let loaded: Comment = toml::from_str(&text).unwrap();
        assert_eq!(loaded, comment);
    }
}
