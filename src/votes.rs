use std::collections::HashMap;

use jiff::Timestamp;
use serde::Serialize;

use crate::models::{Vote, VoteLedger, VoteType};

/// Vote counts for one comment, as seen by one (optional) voter.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct VoteTally {
    pub upvotes: u64,
    pub downvotes: u64,
    pub score: i64,
    pub user_vote: Option<VoteType>,
}

impl VoteTally {
    pub fn from_votes<'a>(votes: impl IntoIterator<Item = &'a Vote>, voter: Option<&str>) -> Self {
        let mut tally = Self::default();
        for vote in votes {
            match vote.vote_type {
                VoteType::Upvote => tally.upvotes += 1,
                VoteType::Downvote => tally.downvotes += 1,
            }
            if voter == Some(vote.voter.as_str()) {
                tally.user_vote = Some(vote.vote_type);
            }
        }
        tally.score = signed(tally.upvotes) - signed(tally.downvotes);
        tally
    }

    pub fn total(&self) -> u64 {
        self.upvotes + self.downvotes
    }

    /// How evenly split the votes are: the size of the smaller side.
    pub fn contention(&self) -> u64 {
        self.upvotes.min(self.downvotes)
    }
}

fn signed(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// Tallies for every requested comment in one pass over the post's ledgers.
/// Comments without a ledger get a zero tally.
pub fn aggregate<'a>(
    comment_ids: &[&str],
    ledgers: impl IntoIterator<Item = &'a VoteLedger>,
    voter: Option<&str>,
) -> HashMap<String, VoteTally> {
    let by_comment: HashMap<&str, &VoteLedger> = ledgers
        .into_iter()
        .map(|l| (l.comment_id.as_str(), l))
        .collect();

    comment_ids
        .iter()
        .map(|&id| {
            let tally = by_comment
                .get(id)
                .map(|l| VoteTally::from_votes(&l.votes, voter))
                .unwrap_or_default();
            (id.to_owned(), tally)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    Created,
    Replaced,
    Removed,
}

/// Apply one vote to a ledger: a repeat of the voter's current vote removes
/// it, the opposite type replaces it, and no prior vote creates one.
pub fn apply_vote(
    ledger: &mut VoteLedger,
    voter: &str,
    vote_type: VoteType,
    now: Timestamp,
) -> VoteChange {
    match ledger.votes.iter().position(|v| v.voter == voter) {
        Some(idx) if ledger.votes[idx].vote_type == vote_type => {
            ledger.votes.remove(idx);
            VoteChange::Removed
        }
        Some(idx) => {
            let existing = &mut ledger.votes[idx];
            existing.vote_type = vote_type;
            existing.cast_at = now;
            VoteChange::Replaced
        }
        None => {
            ledger.votes.push(Vote {
                voter: voter.to_owned(),
                vote_type,
                cast_at: now,
            });
            VoteChange::Created
        }
    }
}
