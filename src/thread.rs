//! Turns a post's flat comment rows into ordered, paginated reply trees.

use std::cmp::Ordering;
use std::collections::HashMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::models::Comment;
use crate::votes::VoteTally;

pub const DELETED_PLACEHOLDER: &str = "[deleted]";
pub const HIDDEN_PLACEHOLDER: &str = "[removed]";

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    /// Pinned first, then highest score, then newest.
    #[default]
    Top,
    Newest,
    Oldest,
    /// Most evenly split votes first.
    Controversial,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Live,
    Deleted,
    Hidden,
}

/// One comment as shown to a reader, with its reply subtree attached.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub status: CommentStatus,
    pub created_at: Timestamp,
    pub edited_at: Option<Timestamp>,
    pub depth: u32,
    /// Nesting level used for rendering; never above the configured cap.
    pub display_depth: u32,
    pub pinned: bool,
    #[serde(flatten)]
    pub votes: VoteTally,
    pub replies: Vec<CommentView>,
}

impl CommentView {
    fn live(comment: &Comment, votes: VoteTally, display_depth: u32) -> Self {
        Self {
            id: comment.id.clone(),
            post_id: comment.post_id.clone(),
            parent_id: comment.parent_id.clone(),
            content: comment.content.clone(),
            status: CommentStatus::Live,
            created_at: comment.created_at,
            edited_at: comment.edited_at,
            depth: comment.depth,
            display_depth,
            pinned: comment.pinned,
            votes,
            replies: Vec::new(),
        }
    }

    /// Stand-in for a removed comment that still anchors live replies.
    /// Content, votes and pin are withheld.
    fn placeholder(comment: &Comment, display_depth: u32) -> Self {
        let (status, content) = if comment.deleted {
            (CommentStatus::Deleted, DELETED_PLACEHOLDER)
        } else {
            (CommentStatus::Hidden, HIDDEN_PLACEHOLDER)
        };
        Self {
            content: content.to_owned(),
            status,
            edited_at: None,
            pinned: false,
            ..Self::live(comment, VoteTally::default(), display_depth)
        }
    }

    /// Number of comments in the subtree below this one.
    pub fn reply_count(&self) -> usize {
        self.replies.iter().map(|r| 1 + r.reply_count()).sum()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ThreadOptions {
    pub sort: SortOrder,
    pub max_nesting_level: u32,
}

/// Assemble the reply forest for one post.
///
/// Replies whose parent is not in `comments` are promoted to top level.
/// Replies deeper than `max_nesting_level` hang off their ancestor at
/// `max_nesting_level - 1`, so they render at the cap instead of disappearing.
/// Removed comments survive only as placeholders for live descendants.
pub fn build(
    comments: &[&Comment],
    tallies: &HashMap<String, VoteTally>,
    options: &ThreadOptions,
) -> Vec<CommentView> {
    let by_id: HashMap<&str, &Comment> = comments.iter().map(|c| (c.id.as_str(), *c)).collect();
    let flatten_at = options.max_nesting_level.saturating_sub(1);

    let mut roots: Vec<&Comment> = Vec::new();
    let mut children: HashMap<&str, Vec<&Comment>> = HashMap::new();

    for &comment in comments {
        let parent = comment
            .parent_id
            .as_deref()
            .and_then(|pid| by_id.get(pid).copied());

        match parent {
            None => roots.push(comment),
            Some(parent) => {
                let anchor = if comment.depth > options.max_nesting_level {
                    ancestor_at_or_above(parent, flatten_at, &by_id)
                } else {
                    parent
                };
                children.entry(anchor.id.as_str()).or_default().push(comment);
            }
        }
    }

    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| chronological(a, b));
    }

    let mut threads: Vec<CommentView> = roots
        .into_iter()
        .filter_map(|root| assemble(root, 0, &children, tallies))
        .collect();
    threads.sort_by(|a, b| compare(options.sort, a, b));
    threads
}

/// Walk up from `start` to the nearest ancestor whose depth is at most `depth`.
fn ancestor_at_or_above<'a>(
    start: &'a Comment,
    depth: u32,
    by_id: &HashMap<&str, &'a Comment>,
) -> &'a Comment {
    let mut current = start;
    // Depth strictly decreases on the way up; the bound only matters for corrupt data.
    for _ in 0..by_id.len() {
        if current.depth <= depth {
            break;
        }
        match current
            .parent_id
            .as_deref()
            .and_then(|pid| by_id.get(pid).copied())
        {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}

fn assemble(
    comment: &Comment,
    display_depth: u32,
    children: &HashMap<&str, Vec<&Comment>>,
    tallies: &HashMap<String, VoteTally>,
) -> Option<CommentView> {
    let replies: Vec<CommentView> = children
        .get(comment.id.as_str())
        .map(|kids| {
            kids.iter()
                .filter_map(|kid| assemble(kid, display_depth + 1, children, tallies))
                .collect()
        })
        .unwrap_or_default();

    let mut view = if comment.is_removed() {
        if replies.is_empty() {
            return None;
        }
        CommentView::placeholder(comment, display_depth)
    } else {
        let votes = tallies.get(&comment.id).copied().unwrap_or_default();
        CommentView::live(comment, votes, display_depth)
    };
    view.replies = replies;
    Some(view)
}

fn chronological(a: &Comment, b: &Comment) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Ordering of top-level threads. Ties fall back to id so pages stay stable.
pub fn compare(sort: SortOrder, a: &CommentView, b: &CommentView) -> Ordering {
    let primary = match sort {
        SortOrder::Top => b
            .pinned
            .cmp(&a.pinned)
            .then_with(|| b.votes.score.cmp(&a.votes.score))
            .then_with(|| b.created_at.cmp(&a.created_at)),
        SortOrder::Newest => b.created_at.cmp(&a.created_at),
        SortOrder::Oldest => a.created_at.cmp(&b.created_at),
        SortOrder::Controversial => b
            .votes
            .contention()
            .cmp(&a.votes.contention())
            .then_with(|| b.votes.total().cmp(&a.votes.total())),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentPage {
    pub comments: Vec<CommentView>,
    pub pagination: Pagination,
}

/// Cut one page of top-level threads. Replies always travel with their
/// thread. `page` is 1-based and `page_size` must be non-zero; a page past
/// the end is empty.
pub fn paginate(threads: Vec<CommentView>, page: usize, page_size: usize) -> CommentPage {
    let total_count = threads.len();
    let total_pages = total_count.div_ceil(page_size);
    let skip = page.saturating_sub(1).saturating_mul(page_size);

    CommentPage {
        comments: threads.into_iter().skip(skip).take(page_size).collect(),
        pagination: Pagination {
            page,
            page_size,
            total_pages,
            total_count,
        },
    }
}
