#![allow(clippy::needless_pass_by_value)]

pub mod comment;
pub mod init;
pub mod moderate;
pub mod report;
pub mod vote;
