mod comment;
mod report;
mod vote;

pub use comment::Comment;
pub use report::{Report, ReportReason};
pub use vote::{Vote, VoteCast, VoteLedger, VoteType};
