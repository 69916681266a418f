use clap::{Parser, Subcommand};

use crate::models::{ReportReason, VoteType};
use crate::moderation::ModerationAction;
use crate::thread::SortOrder;

#[derive(Parser)]
#[command(name = "mm")]
#[command(about = "Threaded comments, voting and moderation for blog posts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a comment store in the current directory
    Init {
        /// Keep the store out of version control (adds .murmur to .gitignore or .git/info/exclude)
        #[arg(long)]
        stealth: bool,
    },

    /// List comment threads for a post
    List {
        /// The post slug
        post_id: String,

        /// Page of top-level threads, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Threads per page (defaults to the configured page size)
        #[arg(long)]
        limit: Option<usize>,

        /// Ordering of top-level threads: top, newest, oldest, controversial
        #[arg(long, default_value_t = SortOrder::Top)]
        sort: SortOrder,

        /// Identity token used to show your own votes
        #[arg(long = "as", env = "MURMUR_IDENTITY")]
        identity: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Post a comment, or a reply with --reply-to
    Post {
        /// The post slug
        post_id: String,

        /// The comment text
        content: String,

        /// ID of the comment being replied to
        #[arg(long)]
        reply_to: Option<String>,

        /// Identity token of the poster
        #[arg(long = "as", env = "MURMUR_IDENTITY")]
        identity: Option<String>,

        /// The post has comments disabled
        #[arg(long)]
        closed: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit one of your comments
    Edit {
        /// The comment ID to edit
        comment_id: String,

        /// The new text
        content: String,

        /// Identity token of the author
        #[arg(long = "as", env = "MURMUR_IDENTITY")]
        identity: Option<String>,

        /// The post has comments disabled
        #[arg(long)]
        closed: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete one of your comments (replies are kept)
    Delete {
        /// The comment ID to delete
        comment_id: String,

        /// Identity token of the author
        #[arg(long = "as", env = "MURMUR_IDENTITY")]
        identity: Option<String>,
    },

    /// Vote on a comment; repeating the same vote withdraws it
    Vote {
        /// The comment ID to vote on
        comment_id: String,

        /// up or down
        vote_type: VoteType,

        /// Identity token of the voter
        #[arg(long = "as", env = "MURMUR_IDENTITY")]
        identity: String,

        /// The post has comments disabled
        #[arg(long)]
        closed: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report a comment for moderation
    Report {
        /// The comment ID to report
        comment_id: String,

        /// spam, harassment, hate_speech, inappropriate_content, off_topic, copyright or other
        reason: ReportReason,

        /// Explanation (required for 'other')
        #[arg(long)]
        details: Option<String>,

        /// Identity token of the reporter
        #[arg(long = "as", env = "MURMUR_IDENTITY")]
        identity: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Moderation tools
    #[command(subcommand)]
    Mod(ModCommands),
}

#[derive(Subcommand)]
pub enum ModCommands {
    /// Pin a comment to the top of its post
    Pin { comment_id: String },

    /// Remove a pin
    Unpin { comment_id: String },

    /// Hide a comment from listings
    Hide { comment_id: String },

    /// Make a hidden comment visible again
    Unhide { comment_id: String },

    /// Delete a comment (replies are kept)
    Delete { comment_id: String },

    /// List filed reports, newest first
    Reports {
        /// Only reports for this comment
        #[arg(long)]
        comment: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl ModCommands {
    /// The flag change this command asks for, if it is one.
    pub fn into_action(self) -> Option<(ModerationAction, String)> {
        match self {
            Self::Pin { comment_id } => Some((ModerationAction::Pin, comment_id)),
            Self::Unpin { comment_id } => Some((ModerationAction::Unpin, comment_id)),
            Self::Hide { comment_id } => Some((ModerationAction::Hide, comment_id)),
            Self::Unhide { comment_id } => Some((ModerationAction::Unhide, comment_id)),
            Self::Delete { comment_id } => Some((ModerationAction::Delete, comment_id)),
            Self::Reports { .. } => None,
        }
    }
}
