use crate::db::Database;
use crate::error::Result;
use crate::models::{Comment, Report};
use crate::moderation::{self, ModerationAction};

pub fn apply(comment_id: &str, action: ModerationAction, db: &mut Database) -> Result<Comment> {
    moderation::moderate(db, comment_id, action)
}

pub fn reports(comment_id: Option<&str>, db: &Database) -> Vec<Report> {
    db.list_reports(comment_id).into_iter().cloned().collect()
}
