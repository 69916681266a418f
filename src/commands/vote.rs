use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::models::VoteType;
use crate::service::{CommentService, Requester};
use crate::votes::VoteTally;

pub fn run(
    comment_id: &str,
    vote_type: VoteType,
    voter: String,
    closed: bool,
    db: &mut Database,
    config: &Config,
) -> Result<VoteTally> {
    let requester = Requester::with_identity(voter).comments_enabled(!closed);
    CommentService::new(db, config).vote(comment_id, vote_type, &requester)
}
