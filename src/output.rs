use anyhow::Result;
use console::{Term, style};
use serde::Serialize;

use crate::models::{Comment, Report};
use crate::moderation::{ModerationAction, ReportReceipt};
use crate::thread::{CommentPage, CommentStatus, CommentView, SortOrder};
use crate::votes::VoteTally;

const WRAP_WIDTH: usize = 80;
const INDENT: &str = "    ";

pub struct Output {
    term: Term,
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self {
            term: Term::stdout(),
            json,
        }
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let output = serde_json::to_string_pretty(value)?;
        self.term.write_line(&output)?;
        Ok(())
    }

    pub fn comment_posted(&self, comment: &Comment) -> Result<()> {
        if self.json {
            return self.print_json(comment);
        }

        let label = if comment.is_top_level() {
            "Posted comment:"
        } else {
            "Posted reply:"
        };
        self.term.write_line(&format!(
            "{} {}",
            style(label).green(),
            style(&comment.id).cyan().bold()
        ))?;
        self.term.write_line(&format!("  Post: {}", comment.post_id))?;
        if let Some(parent_id) = &comment.parent_id {
            self.term
                .write_line(&format!("  In reply to: {parent_id} (depth {})", comment.depth))?;
        }
        Ok(())
    }

    pub fn comment_edited(&self, comment: &Comment) -> Result<()> {
        if self.json {
            return self.print_json(comment);
        }

        self.term.write_line(&format!(
            "{} {}",
            style("Edited comment:").green(),
            style(&comment.id).cyan().bold()
        ))?;
        self.term
            .write_line(&format!("  Content: {}", comment.content))?;
        Ok(())
    }

    pub fn comment_deleted(&self, comment: &Comment) -> Result<()> {
        self.term.write_line(&format!(
            "{} {}",
            style("Deleted comment:").yellow(),
            style(&comment.id).cyan().bold()
        ))?;
        Ok(())
    }

    pub fn comment_page(&self, post_id: &str, sort: SortOrder, page: &CommentPage) -> Result<()> {
        if self.json {
            return self.print_json(page);
        }

        if page.comments.is_empty() {
            self.term
                .write_line(&format!("No comments on {post_id}."))?;
            return Ok(());
        }

        let p = &page.pagination;
        self.term.write_line(&format!(
            "{} {} {}",
            style("Comments on").bold(),
            style(post_id).cyan().bold(),
            style(format!(
                "(sorted by {sort}, page {} of {}, {} threads)",
                p.page, p.total_pages, p.total_count
            ))
            .dim()
        ))?;

        for view in &page.comments {
            self.term.write_line("")?;
            self.print_view(view)?;
        }
        Ok(())
    }

    fn print_view(&self, view: &CommentView) -> Result<()> {
        let indent = INDENT.repeat(view.display_depth as usize);

        let mut header = format!("{indent}{}", style(&view.id).cyan().bold());
        if view.status == CommentStatus::Live {
            let votes = &view.votes;
            header.push_str(&format!(
                " {} {}",
                style(format!("{:+}", votes.score)).yellow(),
                style(format!("(+{} / -{})", votes.upvotes, votes.downvotes)).dim()
            ));
            if let Some(mine) = votes.user_vote {
                header.push_str(&format!(" {}", style(format!("you: {mine}")).magenta()));
            }
        }
        if view.pinned {
            header.push_str(&format!(" {}", style("[pinned]").green()));
        }
        header.push_str(&format!(" {}", style(view.created_at).dim()));
        if view.edited_at.is_some() {
            header.push_str(&format!(" {}", style("(edited)").dim()));
        }
        self.term.write_line(&header)?;

        let body_indent = format!("{indent}  ");
        let options = textwrap::Options::new(WRAP_WIDTH)
            .initial_indent(&body_indent)
            .subsequent_indent(&body_indent);
        let body = textwrap::fill(&view.content, options);
        if view.status == CommentStatus::Live {
            self.term.write_line(&body)?;
        } else {
            self.term.write_line(&style(body).dim().italic().to_string())?;
        }

        for reply in &view.replies {
            self.print_view(reply)?;
        }
        Ok(())
    }

    pub fn vote_cast(&self, comment_id: &str, tally: &VoteTally) -> Result<()> {
        if self.json {
            return self.print_json(tally);
        }

        let verb = match tally.user_vote {
            Some(vote) => format!("Recorded {vote} on"),
            None => "Withdrew vote on".to_owned(),
        };
        self.term.write_line(&format!(
            "{} {}",
            style(verb).green(),
            style(comment_id).cyan().bold()
        ))?;
        self.term.write_line(&format!(
            "  Score: {} (+{} / -{})",
            tally.score, tally.upvotes, tally.downvotes
        ))?;
        Ok(())
    }

    pub fn report_filed(&self, receipt: &ReportReceipt) -> Result<()> {
        if self.json {
            return self.print_json(receipt);
        }

        self.term.write_line(&format!(
            "{} {}",
            style("Report received:").green(),
            style(&receipt.id).cyan().bold()
        ))?;
        Ok(())
    }

    pub fn report_list(&self, reports: &[Report]) -> Result<()> {
        if self.json {
            return self.print_json(reports);
        }

        if reports.is_empty() {
            self.term.write_line("No reports found.")?;
            return Ok(());
        }

        for report in reports {
            self.term.write_line(&format!(
                "{} [{}] on {} {}",
                style(&report.id).cyan().bold(),
                style(report.reason).yellow(),
                style(&report.comment_id).cyan(),
                style(report.created_at).dim()
            ))?;
            self.term.write_line(&format!("  Post: {}", report.post_id))?;
            if let Some(reporter) = &report.reporter {
                self.term.write_line(&format!("  Reporter: {reporter}"))?;
            }
            if let Some(details) = &report.details {
                self.term.write_line(&format!("  Details: {details}"))?;
            }
        }
        Ok(())
    }

    pub fn moderation_applied(&self, comment: &Comment, action: ModerationAction) -> Result<()> {
        let mut flags = Vec::new();
        if comment.pinned {
            flags.push("pinned");
        }
        if comment.hidden {
            flags.push("hidden");
        }
        if comment.deleted {
            flags.push("deleted");
        }

        self.term.write_line(&format!(
            "{} {}",
            style(format!("Applied {action} to")).green(),
            style(&comment.id).cyan().bold()
        ))?;
        if flags.is_empty() {
            self.term
                .write_line(&format!("  Flags: {}", style("(none)").dim()))?;
        } else {
            self.term
                .write_line(&format!("  Flags: {}", flags.join(", ")))?;
        }
        Ok(())
    }
}
