use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use fs2::FileExt;
use jiff::Timestamp;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::CommentSettings;
use crate::error::{Error, Result};
use crate::helpers::{find_similar_id, normalize_content, validate_post_id};
use crate::id::generate_id;
use crate::models::{Comment, Report, VoteLedger, VoteType};
use crate::votes::{VoteTally, apply_vote};

const LOCK_ATTEMPTS: u32 = 50;
const LOCK_BACKOFF: Duration = Duration::from_millis(20);

/// Atomically write content to a file using a temporary file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let temp = path.with_extension("toml.tmp");
    let mut file = File::create(&temp)
        .with_context(|| format!("Failed to create temporary file: {}", temp.display()))?;
    file.lock_exclusive()
        .context("Failed to acquire file lock")?;
    file.write_all(content)
        .context("Failed to write file content")?;
    file.sync_all().context("Failed to sync file")?;
    FileExt::unlock(&file).context("Failed to unlock file")?;
    fs::rename(&temp, path).with_context(|| format!("Failed to rename to {}", path.display()))?;
    Ok(())
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Every `*.toml` file directly inside `dir`; a missing directory is empty.
fn toml_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry.context("Failed to read directory entry")?.path();
        if path.is_file() && path.extension() == Some(OsStr::new("toml")) {
            files.push(path);
        }
    }
    Ok(files)
}

/// Take an exclusive lock without blocking forever; contention past the
/// retry budget surfaces as a conflict.
fn lock_with_retry(file: &File, what: &str) -> Result<()> {
    for _ in 0..LOCK_ATTEMPTS {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                thread::sleep(LOCK_BACKOFF);
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to lock {what}"))
                    .into());
            }
        }
    }
    warn!(what, attempts = LOCK_ATTEMPTS, "lock still held after retries");
    Err(Error::Conflict(format!(
        "{what} is busy with another request, try again"
    )))
}

/// Input for [`Database::create_comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub author: Option<String>,
    pub created_at: Timestamp,
}

pub struct Database {
    path: PathBuf,
    comments: HashMap<String, Comment>,
    ledgers: HashMap<String, VoteLedger>,
    reports: HashMap<String, Report>,
}

impl Database {
    /// Open an existing database from the given directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Database directory does not exist: {}",
                path.display()
            )
            .into());
        }

        let mut db = Self {
            path,
            comments: HashMap::new(),
            ledgers: HashMap::new(),
            reports: HashMap::new(),
        };

        db.load()?;
        debug!(
            comments = db.comments.len(),
            ledgers = db.ledgers.len(),
            reports = db.reports.len(),
            "loaded comment store"
        );
        Ok(db)
    }

    /// Load all data from the per-entity TOML files into memory.
    fn load(&mut self) -> anyhow::Result<()> {
        let posts_dir = self.path.join("posts");
        if posts_dir.is_dir() {
            for entry in fs::read_dir(&posts_dir).context("Failed to read posts directory")? {
                let post_dir = entry.context("Failed to read post entry")?.path();
                if !post_dir.is_dir() {
                    continue;
                }

                for file in toml_files(&post_dir.join("comments"))? {
                    let comment: Comment = read_toml(&file)?;
                    self.comments.insert(comment.id.clone(), comment);
                }

                for file in toml_files(&post_dir.join("votes"))? {
                    let ledger: VoteLedger = read_toml(&file)?;
                    self.ledgers.insert(ledger.comment_id.clone(), ledger);
                }
            }
        }

        for file in toml_files(&Report::dir(&self.path))? {
            let report: Report = read_toml(&file)?;
            self.reports.insert(report.id.clone(), report);
        }

        Ok(())
    }

    fn comment_not_found(&self, id: &str) -> Error {
        let ids: Vec<&str> = self.comments.keys().map(String::as_str).collect();
        Error::comment_not_found(id, find_similar_id(id, &ids))
    }

    // Comment operations

    /// Validate and persist a new comment or reply.
    pub fn create_comment(
        &mut self,
        draft: NewComment,
        settings: &CommentSettings,
    ) -> Result<Comment> {
        validate_post_id(&draft.post_id)?;
        let content = normalize_content(&draft.content, settings.max_content_chars)?;

        let comment = match draft.parent_id.as_deref() {
            None => Comment::new(
                generate_id(),
                draft.post_id,
                content,
                draft.author,
                draft.created_at,
            ),
            Some(parent_id) => {
                let parent = self.get_comment(parent_id)?;
                if parent.post_id != draft.post_id {
                    return Err(Error::CrossPost {
                        parent_id: parent.id.clone(),
                        parent_post: parent.post_id.clone(),
                        post_id: draft.post_id,
                    });
                }
                if parent.depth >= settings.max_depth {
                    return Err(Error::validation(format!(
                        "Reply chain is too deep (maximum depth {})",
                        settings.max_depth
                    )));
                }
                Comment::reply_to(
                    parent,
                    generate_id(),
                    content,
                    draft.author,
                    draft.created_at,
                )
            }
        };

        if self.comments.contains_key(&comment.id) {
            return Err(Error::Conflict(format!(
                "Comment id collision: {}",
                comment.id
            )));
        }

        comment.write_file(&self.path)?;
        info!(
            comment_id = %comment.id,
            post_id = %comment.post_id,
            depth = comment.depth,
            "created comment"
        );
        self.comments.insert(comment.id.clone(), comment.clone());

        Ok(comment)
    }

    pub fn get_comment(&self, id: &str) -> Result<&Comment> {
        self.comments
            .get(id)
            .ok_or_else(|| self.comment_not_found(id))
    }

    /// Flat list of a post's comments at every depth, oldest first.
    /// Deleted and hidden comments are included only when asked for.
    pub fn comments_for_post(&self, post_id: &str, include_removed: bool) -> Vec<&Comment> {
        let mut comments: Vec<&Comment> = self
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .filter(|c| include_removed || !c.is_removed())
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        comments
    }

    /// Persist changes to an existing comment (edit or moderation flags).
    /// Identity fields must not change.
    pub fn update_comment(&mut self, comment: Comment) -> Result<()> {
        let existing = self.get_comment(&comment.id)?;
        if existing.post_id != comment.post_id
            || existing.parent_id != comment.parent_id
            || existing.depth != comment.depth
        {
            return Err(Error::validation(format!(
                "Comment {} cannot be moved to another post or parent",
                comment.id
            )));
        }

        comment.write_file(&self.path)?;
        debug!(comment_id = %comment.id, "updated comment");
        self.comments.insert(comment.id.clone(), comment);
        Ok(())
    }

    pub fn comments_by_author_since(&self, author: &str, since: Timestamp) -> usize {
        self.comments
            .values()
            .filter(|c| c.is_authored_by(author) && c.created_at >= since)
            .count()
    }

    // Vote operations

    /// Cast, replace or withdraw a vote. The decision is made against the
    /// ledger as it is on disk while holding the ledger's lock, so two
    /// concurrent requests from one voter can never leave two rows.
    ///
    /// Every request is also logged on the ledger; log entries older than
    /// `keep_since` are dropped.
    pub fn cast_vote(
        &mut self,
        comment_id: &str,
        voter: &str,
        vote_type: VoteType,
        now: Timestamp,
        keep_since: Timestamp,
    ) -> Result<VoteTally> {
        let post_id = self.get_comment(comment_id)?.post_id.clone();

        let lock_path = VoteLedger::lock_path(&self.path, &post_id, comment_id);
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open {}", lock_path.display()))?;
        lock_with_retry(&lock, "vote ledger")?;

        let outcome =
            self.apply_vote_locked(comment_id, &post_id, voter, vote_type, now, keep_since);

        if let Err(e) = FileExt::unlock(&lock) {
            warn!(error = %e, "failed to release vote ledger lock");
        }
        outcome
    }

    fn apply_vote_locked(
        &mut self,
        comment_id: &str,
        post_id: &str,
        voter: &str,
        vote_type: VoteType,
        now: Timestamp,
        keep_since: Timestamp,
    ) -> Result<VoteTally> {
        let mut ledger = VoteLedger::new(comment_id.to_owned(), post_id.to_owned());
        let ledger_path = ledger.file_path(&self.path);
        if ledger_path.exists() {
            ledger = read_toml(&ledger_path)?;
        }

        let change = apply_vote(&mut ledger, voter, vote_type, now);
        ledger.record_cast(voter, now, keep_since);
        ledger.write_file(&self.path)?;
        info!(comment_id, ?vote_type, ?change, "recorded vote");

        let tally = VoteTally::from_votes(&ledger.votes, Some(voter));
        self.ledgers.insert(comment_id.to_owned(), ledger);
        Ok(tally)
    }

    /// Every vote ledger belonging to one post.
    pub fn votes_for_post(&self, post_id: &str) -> Vec<&VoteLedger> {
        self.ledgers
            .values()
            .filter(|l| l.post_id == post_id)
            .collect()
    }

    /// Vote requests by `voter` at or after `since`, counting withdrawals
    /// and switches as well as new votes.
    pub fn votes_by_voter_since(&self, voter: &str, since: Timestamp) -> usize {
        self.ledgers
            .values()
            .flat_map(|l| l.casts.iter())
            .filter(|c| c.voter == voter && c.at >= since)
            .count()
    }

    // Report operations

    pub fn create_report(&mut self, report: Report) -> Result<()> {
        if self.reports.contains_key(&report.id) {
            return Err(Error::Conflict(format!(
                "Report id collision: {}",
                report.id
            )));
        }
        self.get_comment(&report.comment_id)?;

        report.write_file(&self.path)?;
        info!(
            report_id = %report.id,
            comment_id = %report.comment_id,
            reason = %report.reason,
            "filed report"
        );
        self.reports.insert(report.id.clone(), report);
        Ok(())
    }

    /// Reports for review, newest first, optionally for a single comment.
    pub fn list_reports(&self, comment_id: Option<&str>) -> Vec<&Report> {
        let mut reports: Vec<&Report> = self
            .reports
            .values()
            .filter(|r| comment_id.is_none_or(|id| r.comment_id == id))
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        reports
    }

    pub fn reports_by_reporter_since(&self, reporter: &str, since: Timestamp) -> usize {
        self.reports
            .values()
            .filter(|r| r.reporter.as_deref() == Some(reporter) && r.created_at >= since)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportReason;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_second(secs).unwrap()
    }

    fn draft(post_id: &str, parent_id: Option<&str>, content: &str, at: i64) -> NewComment {
        NewComment {
            post_id: post_id.to_string(),
            parent_id: parent_id.map(str::to_string),
            content: content.to_string(),
            author: Some("author".to_string()),
            created_at: ts(at),
        }
    }

    fn report(comment_id: &str, reporter: Option<&str>, at: i64) -> Report {
        Report {
            id: generate_id(),
            comment_id: comment_id.to_string(),
            post_id: "p1".to_string(),
            reason: ReportReason::Spam,
            details: None,
            reporter: reporter.map(str::to_string),
            created_at: ts(at),
        }
    }

    /// A fresh empty Database backed by a temp directory.
    #[fixture]
    fn db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path()).unwrap();
        (dir, db)
    }

    #[fixture]
    fn settings() -> CommentSettings {
        CommentSettings::default()
    }

    // -- atomic_write --

    #[rstest]
    #[case::plain_text(b"hello" as &[u8], "hello")]
    #[case::with_newlines(b"line1\nline2", "line1\nline2")]
    #[case::empty(b"", "")]
    fn atomic_write_persists_content(#[case] input: &[u8], #[case] expected: &str) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("test.toml");
        atomic_write(&path, input).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), expected);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    // -- create_comment --

    // Top-level comments sit at depth 0 and each reply one below its parent.
    #[rstest]
    fn depth_follows_parent(db: (TempDir, Database), settings: CommentSettings) {
        let (_dir, mut db) = db;
        let root = db
            .create_comment(draft("p1", None, "Great article!", 1), &settings)
            .unwrap();
        let reply = db
            .create_comment(draft("p1", Some(&root.id), "Agreed", 2), &settings)
            .unwrap();
        let nested = db
            .create_comment(draft("p1", Some(&reply.id), "Same here", 3), &settings)
            .unwrap();

        assert_eq!(root.depth, 0);
        assert_eq!(reply.depth, 1);
        assert_eq!(nested.depth, 2);

        for c in db.comments_for_post("p1", true) {
            match c.parent_id.as_deref() {
                None => assert_eq!(c.depth, 0),
                Some(pid) => assert_eq!(c.depth, db.get_comment(pid).unwrap().depth + 1),
            }
        }
    }

    #[rstest]
    fn comment_file_lands_under_post(db: (TempDir, Database), settings: CommentSettings) {
        let (dir, mut db) = db;
        let c = db
            .create_comment(draft("p1", None, "  padded  ", 1), &settings)
            .unwrap();
        assert_eq!(c.content, "padded");

        let path = dir
            .path()
            .join("posts")
            .join("p1")
            .join("comments")
            .join(format!("{}.toml", c.id));
        let loaded: Comment = toml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(loaded, c);
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    fn blank_content_fails_without_writing(
        db: (TempDir, Database),
        settings: CommentSettings,
        #[case] content: &str,
    ) {
        let (dir, mut db) = db;
        let err = db
            .create_comment(draft("p1", None, content, 1), &settings)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!dir.path().join("posts").exists());
        assert!(db.comments_for_post("p1", true).is_empty());
    }

    #[rstest]
    fn unknown_parent_is_not_found(db: (TempDir, Database), settings: CommentSettings) {
        let (_dir, mut db) = db;
        let err = db
            .create_comment(draft("p1", Some("missing1"), "hi", 1), &settings)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[rstest]
    fn parent_on_other_post_is_cross_post(db: (TempDir, Database), settings: CommentSettings) {
        let (_dir, mut db) = db;
        let root = db
            .create_comment(draft("p1", None, "on p1", 1), &settings)
            .unwrap();
        let err = db
            .create_comment(draft("p2", Some(&root.id), "on p2", 2), &settings)
            .unwrap_err();
        assert!(matches!(err, Error::CrossPost { .. }));
        assert!(db.comments_for_post("p2", true).is_empty());
    }

    #[rstest]
    fn depth_ceiling_is_enforced(db: (TempDir, Database)) {
        let (_dir, mut db) = db;
        let settings = CommentSettings {
            max_depth: 2,
            ..CommentSettings::default()
        };
        let c0 = db.create_comment(draft("p1", None, "0", 1), &settings).unwrap();
        let c1 = db
            .create_comment(draft("p1", Some(&c0.id), "1", 2), &settings)
            .unwrap();
        let c2 = db
            .create_comment(draft("p1", Some(&c1.id), "2", 3), &settings)
            .unwrap();
        let err = db
            .create_comment(draft("p1", Some(&c2.id), "3", 4), &settings)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[rstest]
    fn not_found_suggests_close_id(db: (TempDir, Database), settings: CommentSettings) {
        let (_dir, mut db) = db;
        let c = db.create_comment(draft("p1", None, "hi", 1), &settings).unwrap();
        let typo = format!("{}x", &c.id[..c.id.len() - 1]);

        match db.get_comment(&typo).unwrap_err() {
            Error::NotFound { suggestion, .. } => assert_eq!(suggestion, Some(c.id.clone())),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    // -- comments_for_post / update_comment --

    // Hiding a parent leaves its replies stored and retrievable.
    #[rstest]
    fn removing_parent_keeps_children(db: (TempDir, Database), settings: CommentSettings) {
        let (dir, mut db) = db;
        let root = db.create_comment(draft("p1", None, "root", 1), &settings).unwrap();
        let child = db
            .create_comment(draft("p1", Some(&root.id), "child", 2), &settings)
            .unwrap();

        let mut hidden = root.clone();
        hidden.hidden = true;
        db.update_comment(hidden).unwrap();

        let visible: Vec<_> = db.comments_for_post("p1", false).iter().map(|c| c.id.clone()).collect();
        assert_eq!(visible, vec![child.id.clone()]);
        assert_eq!(db.comments_for_post("p1", true).len(), 2);

        let reopened = Database::open(dir.path()).unwrap();
        assert!(reopened.get_comment(&child.id).is_ok());
        assert!(reopened.get_comment(&root.id).unwrap().hidden);
    }

    #[rstest]
    fn update_cannot_reparent(db: (TempDir, Database), settings: CommentSettings) {
        let (_dir, mut db) = db;
        let a = db.create_comment(draft("p1", None, "a", 1), &settings).unwrap();
        let b = db.create_comment(draft("p1", None, "b", 2), &settings).unwrap();

        let mut moved = b.clone();
        moved.parent_id = Some(a.id.clone());
        moved.depth = 1;
        assert!(matches!(db.update_comment(moved), Err(Error::Validation(_))));
    }

    #[rstest]
    fn comments_sorted_oldest_first(db: (TempDir, Database), settings: CommentSettings) {
        let (_dir, mut db) = db;
        let late = db.create_comment(draft("p1", None, "late", 20), &settings).unwrap();
        let early = db.create_comment(draft("p1", None, "early", 10), &settings).unwrap();
        db.create_comment(draft("p2", None, "elsewhere", 5), &settings).unwrap();

        let ids: Vec<_> = db.comments_for_post("p1", false).iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![early.id, late.id]);
    }

    // -- cast_vote --

    #[rstest]
    fn vote_toggle_and_replace_persist(db: (TempDir, Database), settings: CommentSettings) {
        let (dir, mut db) = db;
        let c = db.create_comment(draft("p1", None, "hi", 1), &settings).unwrap();

        let t = db.cast_vote(&c.id, "v1", VoteType::Upvote, ts(2), ts(0)).unwrap();
        assert_eq!((t.upvotes, t.downvotes, t.score), (1, 0, 1));
        assert_eq!(t.user_vote, Some(VoteType::Upvote));

        let t = db.cast_vote(&c.id, "v1", VoteType::Downvote, ts(3), ts(0)).unwrap();
        assert_eq!((t.upvotes, t.downvotes, t.score), (0, 1, -1));
        assert_eq!(db.ledgers[&c.id].votes.len(), 1);

        let t = db.cast_vote(&c.id, "v1", VoteType::Downvote, ts(4), ts(0)).unwrap();
        assert_eq!(t, VoteTally::default());

        let reopened = Database::open(dir.path()).unwrap();
        assert!(reopened.ledgers[&c.id].votes.is_empty());
    }

    // A second store handle sees the first one's vote because the ledger
    // is re-read under the lock rather than trusted from memory.
    #[rstest]
    fn vote_rereads_ledger_from_disk(db: (TempDir, Database), settings: CommentSettings) {
        let (dir, mut first) = db;
        let c = first.create_comment(draft("p1", None, "hi", 1), &settings).unwrap();
        let mut second = Database::open(dir.path()).unwrap();

        first.cast_vote(&c.id, "v1", VoteType::Upvote, ts(2), ts(0)).unwrap();
        let t = second.cast_vote(&c.id, "v1", VoteType::Upvote, ts(3), ts(0)).unwrap();

        assert_eq!(t.upvotes, 0);
        assert_eq!(t.user_vote, None);
    }

    // Same voter, several store handles, racing threads: the ledger never
    // holds more than one row for that voter and every request is logged.
    #[rstest]
    fn concurrent_votes_from_one_voter_keep_one_row(
        db: (TempDir, Database),
        settings: CommentSettings,
    ) {
        let (dir, mut db) = db;
        let c = db.create_comment(draft("p1", None, "hi", 1), &settings).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = dir.path().to_path_buf();
                let comment_id = c.id.clone();
                std::thread::spawn(move || {
                    let mut handle = Database::open(&path).unwrap();
                    let vote_type = if i % 2 == 0 {
                        VoteType::Upvote
                    } else {
                        VoteType::Downvote
                    };
                    handle
                        .cast_vote(&comment_id, "v1", vote_type, ts(10 + i), ts(0))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let reopened = Database::open(dir.path()).unwrap();
        let ledger = &reopened.ledgers[&c.id];
        assert!(ledger.votes.iter().filter(|v| v.voter == "v1").count() <= 1);
        assert_eq!(ledger.casts.len(), 8);
        assert_eq!(reopened.votes_by_voter_since("v1", ts(0)), 8);
    }

    // Withdrawing and switching still count as vote requests.
    #[rstest]
    fn toggles_are_counted_as_vote_requests(db: (TempDir, Database), settings: CommentSettings) {
        let (_dir, mut db) = db;
        let c = db.create_comment(draft("p1", None, "hi", 1), &settings).unwrap();
        for at in 2..6 {
            db.cast_vote(&c.id, "v1", VoteType::Upvote, ts(at), ts(0)).unwrap();
        }
        assert!(db.ledgers[&c.id].votes.is_empty());
        assert_eq!(db.votes_by_voter_since("v1", ts(0)), 4);

        // Older log entries are pruned on the next write.
        db.cast_vote(&c.id, "v1", VoteType::Downvote, ts(100), ts(50)).unwrap();
        assert_eq!(db.ledgers[&c.id].casts.len(), 1);
        assert_eq!(db.votes_by_voter_since("v1", ts(0)), 1);
    }

    #[rstest]
    fn vote_on_unknown_comment_fails(db: (TempDir, Database)) {
        let (_dir, mut db) = db;
        let err = db.cast_vote("nope", "v1", VoteType::Upvote, ts(1), ts(0)).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[rstest]
    fn votes_for_post_is_scoped(db: (TempDir, Database), settings: CommentSettings) {
        let (_dir, mut db) = db;
        let a = db.create_comment(draft("p1", None, "a", 1), &settings).unwrap();
        let b = db.create_comment(draft("p2", None, "b", 1), &settings).unwrap();
        db.cast_vote(&a.id, "v1", VoteType::Upvote, ts(2), ts(0)).unwrap();
        db.cast_vote(&b.id, "v1", VoteType::Upvote, ts(2), ts(0)).unwrap();

        let ledgers = db.votes_for_post("p1");
        assert_eq!(ledgers.len(), 1);
        assert_eq!(ledgers[0].comment_id, a.id);
        assert_eq!(db.votes_by_voter_since("v1", ts(0)), 2);
        assert_eq!(db.votes_by_voter_since("v1", ts(3)), 0);
    }

    // -- reports --

    #[rstest]
    fn reports_persist_and_list_newest_first(db: (TempDir, Database), settings: CommentSettings) {
        let (dir, mut db) = db;
        let c = db.create_comment(draft("p1", None, "hi", 1), &settings).unwrap();
        let older = report(&c.id, Some("r1"), 10);
        let newer = report(&c.id, None, 20);
        db.create_report(older.clone()).unwrap();
        db.create_report(newer.clone()).unwrap();

        let reopened = Database::open(dir.path()).unwrap();
        let ids: Vec<_> = reopened.list_reports(Some(&c.id)).iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert!(reopened.list_reports(Some("other")).is_empty());
        assert_eq!(reopened.reports_by_reporter_since("r1", ts(0)), 1);
    }

    #[rstest]
    fn report_on_unknown_comment_is_not_recorded(db: (TempDir, Database)) {
        let (_dir, mut db) = db;
        let err = db.create_report(report("ghost", None, 1)).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(db.list_reports(None).is_empty());
    }

    // -- open --

    #[rstest]
    fn open_nonexistent_dir_fails() {
        assert!(Database::open("/tmp/definitely_does_not_exist_murmur").is_err());
    }

    #[rstest]
    fn open_rejects_corrupt_files(db: (TempDir, Database), settings: CommentSettings) {
        let (dir, mut db) = db;
        let c = db.create_comment(draft("p1", None, "hi", 1), &settings).unwrap();
        std::fs::write(c.file_path(dir.path()), "not = [valid").unwrap();
        assert!(matches!(
            Database::open(dir.path()),
            Err(Error::Unavailable(_))
        ));
    }
}
