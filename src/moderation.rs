use jiff::Timestamp;
use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};
use tracing::info;

use crate::config::ReportSettings;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::helpers::normalize_optional_text;
use crate::id::generate_id;
use crate::models::{Comment, Report, ReportReason};

/// Flags a moderator can flip on a comment. Resolving reports is left to
/// the admin tooling; these are the outcomes listings have to respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ModerationAction {
    Pin,
    Unpin,
    Hide,
    Unhide,
    Delete,
}

impl ModerationAction {
    /// Apply to `comment`, returning whether anything changed.
    pub fn apply(self, comment: &mut Comment) -> bool {
        let (flag, value) = match self {
            Self::Pin => (&mut comment.pinned, true),
            Self::Unpin => (&mut comment.pinned, false),
            Self::Hide => (&mut comment.hidden, true),
            Self::Unhide => (&mut comment.hidden, false),
            Self::Delete => (&mut comment.deleted, true),
        };
        let changed = *flag != value;
        *flag = value;
        changed
    }
}

/// What the reporter gets back: enough to reference the report, nothing
/// about the reported comment.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportReceipt {
    pub id: String,
    pub received_at: Timestamp,
}

/// Validate a report against the reason taxonomy and build the record.
pub fn build_report(
    comment: &Comment,
    reason: ReportReason,
    details: Option<String>,
    reporter: Option<String>,
    settings: &ReportSettings,
    now: Timestamp,
) -> Result<Report> {
    let details = normalize_optional_text(details);

    if reason.requires_details() && details.is_none() {
        return Err(Error::validation(
            "Details are required when the reason is OTHER",
        ));
    }
    if let Some(text) = &details {
        let len = text.chars().count();
        if len > settings.max_details_chars {
            return Err(Error::validation(format!(
                "Report details are too long: {len} characters (maximum {})",
                settings.max_details_chars
            )));
        }
    }

    Ok(Report {
        id: generate_id(),
        comment_id: comment.id.clone(),
        post_id: comment.post_id.clone(),
        reason,
        details,
        reporter,
        created_at: now,
    })
}

pub fn file_report(
    db: &mut Database,
    comment_id: &str,
    reason: ReportReason,
    details: Option<String>,
    reporter: Option<String>,
    settings: &ReportSettings,
    now: Timestamp,
) -> Result<ReportReceipt> {
    let comment = db.get_comment(comment_id)?;
    let report = build_report(comment, reason, details, reporter, settings, now)?;
    let receipt = ReportReceipt {
        id: report.id.clone(),
        received_at: report.created_at,
    };
    db.create_report(report)?;
    Ok(receipt)
}

/// Apply a moderation flag and persist it. Replies are never touched.
pub fn moderate(db: &mut Database, comment_id: &str, action: ModerationAction) -> Result<Comment> {
    let mut comment = db.get_comment(comment_id)?.clone();
    if action.apply(&mut comment) {
        db.update_comment(comment.clone())?;
        info!(comment_id, %action, "applied moderation action");
    }
    Ok(comment)
}
