use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::models::ReportReason;
use crate::moderation::ReportReceipt;
use crate::service::CommentService;

pub fn run(
    comment_id: &str,
    reason: ReportReason,
    details: Option<String>,
    reporter: Option<&str>,
    db: &mut Database,
    config: &Config,
) -> Result<ReportReceipt> {
    CommentService::new(db, config).report(comment_id, reason, details, reporter)
}
