use jiff::Timestamp;
use tracing::{debug, info};

use crate::config::Config;
use crate::db::{Database, NewComment};
use crate::error::{Error, Result};
use crate::helpers::{normalize_content, normalize_identity, validate_post_id};
use crate::models::{Comment, ReportReason, VoteType};
use crate::moderation::{self, ModerationAction, ReportReceipt};
use crate::rate_limit::{Action, RateLimiter};
use crate::thread::{self, CommentPage, SortOrder, ThreadOptions};
use crate::votes::{self, VoteTally};

/// Who is asking, and what the blog says about the post. Supplied by the
/// caller on every request; the engine keeps no session state.
#[derive(Debug, Clone)]
pub struct Requester {
    pub identity: Option<String>,
    pub comments_enabled: bool,
}

impl Requester {
    pub fn anonymous() -> Self {
        Self {
            identity: None,
            comments_enabled: true,
        }
    }

    pub fn with_identity(identity: impl Into<String>) -> Self {
        Self {
            identity: Some(identity.into()),
            comments_enabled: true,
        }
    }

    pub fn comments_enabled(mut self, enabled: bool) -> Self {
        self.comments_enabled = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ListQuery {
    pub page: usize,
    /// Falls back to the configured default.
    pub page_size: Option<usize>,
    pub sort: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: None,
            sort: SortOrder::default(),
        }
    }
}

pub struct CommentService<'a> {
    db: &'a mut Database,
    config: &'a Config,
    clock: Box<dyn Fn() -> Timestamp + 'a>,
}

impl<'a> CommentService<'a> {
    pub fn new(db: &'a mut Database, config: &'a Config) -> Self {
        Self::with_clock(db, config, Timestamp::now)
    }

    pub fn with_clock(
        db: &'a mut Database,
        config: &'a Config,
        clock: impl Fn() -> Timestamp + 'a,
    ) -> Self {
        Self {
            db,
            config,
            clock: Box::new(clock),
        }
    }

    fn limiter(&self) -> RateLimiter<'a> {
        RateLimiter::new(&self.config.rate_limit)
    }

    /// One page of top-level threads for a post, each with its full reply tree.
    pub fn list_comments(
        &self,
        post_id: &str,
        query: &ListQuery,
        voter: Option<&str>,
    ) -> Result<CommentPage> {
        validate_post_id(post_id)?;
        let settings = &self.config.comments;

        if query.page == 0 {
            return Err(Error::validation("Page numbers start at 1"));
        }
        let page_size = query.page_size.unwrap_or(settings.default_page_size);
        if page_size == 0 || page_size > settings.max_page_size {
            return Err(Error::validation(format!(
                "Page size must be between 1 and {}",
                settings.max_page_size
            )));
        }

        let voter = voter.map(normalize_identity).transpose()?;

        let comments = self.db.comments_for_post(post_id, true);
        let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        let tallies = votes::aggregate(&ids, self.db.votes_for_post(post_id), voter.as_deref());

        let options = ThreadOptions {
            sort: query.sort,
            max_nesting_level: settings.max_nesting_level,
        };
        let threads = thread::build(&comments, &tallies, &options);
        let page = thread::paginate(threads, query.page, page_size);

        debug!(
            post_id,
            sort = %query.sort,
            page = query.page,
            total_count = page.pagination.total_count,
            "listed comments"
        );
        Ok(page)
    }

    pub fn post_comment(
        &mut self,
        post_id: &str,
        content: &str,
        requester: &Requester,
    ) -> Result<Comment> {
        self.create(post_id, None, content, requester)
    }

    pub fn post_reply(
        &mut self,
        post_id: &str,
        parent_id: &str,
        content: &str,
        requester: &Requester,
    ) -> Result<Comment> {
        self.create(post_id, Some(parent_id), content, requester)
    }

    fn create(
        &mut self,
        post_id: &str,
        parent_id: Option<&str>,
        content: &str,
        requester: &Requester,
    ) -> Result<Comment> {
        validate_post_id(post_id)?;
        ensure_open(post_id, requester)?;

        let now = (self.clock)();
        let author = requester
            .identity
            .as_deref()
            .map(normalize_identity)
            .transpose()?;
        if let Some(author) = &author {
            let limiter = self.limiter();
            let recent = self
                .db
                .comments_by_author_since(author, limiter.window_start(now));
            limiter.check(Action::Comment, recent)?;
        }

        self.db.create_comment(
            NewComment {
                post_id: post_id.to_owned(),
                parent_id: parent_id.map(str::to_owned),
                content: content.to_owned(),
                author,
                created_at: now,
            },
            &self.config.comments,
        )
    }

    /// Cast, switch or withdraw the requester's vote on a comment.
    pub fn vote(
        &mut self,
        comment_id: &str,
        vote_type: VoteType,
        requester: &Requester,
    ) -> Result<VoteTally> {
        let voter = requester
            .identity
            .as_deref()
            .ok_or_else(|| Error::validation("An identity is required to vote"))
            .and_then(normalize_identity)?;
        let comment = self.db.get_comment(comment_id)?;
        if comment.is_removed() {
            return Err(Error::comment_not_found(comment_id, None));
        }
        ensure_open(&comment.post_id, requester)?;

        let now = (self.clock)();
        let limiter = self.limiter();
        let window_start = limiter.window_start(now);
        let recent = self.db.votes_by_voter_since(&voter, window_start);
        limiter.check(Action::Vote, recent)?;

        self.db
            .cast_vote(comment_id, &voter, vote_type, now, window_start)
    }

    /// File an abuse report. Only an acknowledgement comes back.
    pub fn report(
        &mut self,
        comment_id: &str,
        reason: ReportReason,
        details: Option<String>,
        reporter: Option<&str>,
    ) -> Result<ReportReceipt> {
        let reporter = reporter.map(normalize_identity).transpose()?;
        let now = (self.clock)();

        if let Some(reporter) = &reporter {
            let limiter = self.limiter();
            let recent = self
                .db
                .reports_by_reporter_since(reporter, limiter.window_start(now));
            limiter.check(Action::Report, recent)?;
        }

        moderation::file_report(
            self.db,
            comment_id,
            reason,
            details,
            reporter,
            &self.config.reports,
            now,
        )
    }

    /// Replace the content of the requester's own comment.
    pub fn edit_comment(
        &mut self,
        comment_id: &str,
        content: &str,
        requester: &Requester,
    ) -> Result<Comment> {
        let mut comment = self.owned_comment(comment_id, requester, "edit")?;
        ensure_open(&comment.post_id, requester)?;

        let content = normalize_content(content, self.config.comments.max_content_chars)?;
        comment.edit(content, (self.clock)());
        self.db.update_comment(comment.clone())?;
        info!(comment_id, "edited comment");
        Ok(comment)
    }

    /// Soft-delete the requester's own comment. Replies stay in place.
    pub fn delete_comment(&mut self, comment_id: &str, requester: &Requester) -> Result<Comment> {
        self.owned_comment(comment_id, requester, "delete")?;
        moderation::moderate(self.db, comment_id, ModerationAction::Delete)
    }

    fn owned_comment(&self, comment_id: &str, requester: &Requester, verb: &str) -> Result<Comment> {
        let comment = self.db.get_comment(comment_id)?;
        if comment.is_removed() {
            return Err(Error::comment_not_found(comment_id, None));
        }
        let identity = requester.identity.as_deref().map(str::trim);
        if !identity.is_some_and(|id| comment.is_authored_by(id)) {
            return Err(Error::Forbidden(format!(
                "Only the author can {verb} comment {comment_id}"
            )));
        }
        Ok(comment.clone())
    }
}

fn ensure_open(post_id: &str, requester: &Requester) -> Result<()> {
    if requester.comments_enabled {
        Ok(())
    } else {
        Err(Error::CommentsDisabled {
            post_id: post_id.to_owned(),
        })
    }
}
