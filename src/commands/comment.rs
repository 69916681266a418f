use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::models::Comment;
use crate::service::{CommentService, ListQuery, Requester};
use crate::thread::{CommentPage, SortOrder};

fn requester(identity: Option<String>, closed: bool) -> Requester {
    Requester {
        identity,
        comments_enabled: !closed,
    }
}

pub fn list(
    post_id: &str,
    page: usize,
    limit: Option<usize>,
    sort: SortOrder,
    identity: Option<String>,
    db: &mut Database,
    config: &Config,
) -> Result<CommentPage> {
    let query = ListQuery {
        page,
        page_size: limit,
        sort,
    };
    CommentService::new(db, config).list_comments(post_id, &query, identity.as_deref())
}

/// A top-level comment, or a reply when `reply_to` names a parent.
pub fn post(
    post_id: &str,
    content: &str,
    reply_to: Option<&str>,
    identity: Option<String>,
    closed: bool,
    db: &mut Database,
    config: &Config,
) -> Result<Comment> {
    let requester = requester(identity, closed);
    let mut service = CommentService::new(db, config);
    match reply_to {
        Some(parent_id) => service.post_reply(post_id, parent_id, content, &requester),
        None => service.post_comment(post_id, content, &requester),
    }
}

pub fn edit(
    comment_id: &str,
    content: &str,
    identity: Option<String>,
    closed: bool,
    db: &mut Database,
    config: &Config,
) -> Result<Comment> {
    CommentService::new(db, config).edit_comment(comment_id, content, &requester(identity, closed))
}

pub fn delete(
    comment_id: &str,
    identity: Option<String>,
    db: &mut Database,
    config: &Config,
) -> Result<Comment> {
    CommentService::new(db, config).delete_comment(comment_id, &requester(identity, false))
}
