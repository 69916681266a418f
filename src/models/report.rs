use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::db::atomic_write;

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    AsRefStr,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ReportReason {
    Spam,
    Harassment,
    HateSpeech,
    InappropriateContent,
    OffTopic,
    Copyright,
    Other,
}

impl ReportReason {
    /// `Other` is meaningless without an explanation.
    pub fn requires_details(self) -> bool {
        self == Self::Other
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: String,
    pub comment_id: String,
    pub post_id: String,
    pub reason: ReportReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter: Option<String>,
    pub created_at: Timestamp,
}

impl Report {
    pub fn dir(base: &Path) -> PathBuf {
        base.join("reports")
    }

    pub fn file_path(&self, base: &Path) -> PathBuf {
        Self::dir(base).join(format!("{}.toml", self.id))
    }

    pub fn write_file(&self, base: &Path) -> Result<()> {
        let path = self.file_path(base);
        let content = toml::to_string(self).context("Failed to serialize report")?;
        atomic_write(&path, content.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    #[rstest]
    #[case("spam", ReportReason::Spam)]
    #[case("hate_speech", ReportReason::HateSpeech)]
    #[case("HATE_SPEECH", ReportReason::HateSpeech)]
    #[case("inappropriate_content", ReportReason::InappropriateContent)]
    #[case("off_topic", ReportReason::OffTopic)]
    fn parses_reasons(#[case] input: &str, #[case] expected: ReportReason) {
        assert_eq!(input.parse::<ReportReason>().unwrap(), expected);
    }

    #[rstest]
    fn taxonomy_is_closed() {
        assert_eq!(ReportReason::iter().count(), 7);
        assert!("rude".parse::<ReportReason>().is_err());
    }

    #[rstest]
    fn only_other_requires_details() {
        let needing: Vec<_> = ReportReason::iter()
            .filter(|r| r.requires_details())
            .collect();
        assert_eq!(needing, vec![ReportReason::Other]);
    }

    #[rstest]
    fn wire_casing_is_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&ReportReason::OffTopic).unwrap(),
            "\"OFF_TOPIC\""
        );
    }
}
