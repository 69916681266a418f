use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::db::atomic_write;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommentSettings {
    pub max_content_chars: usize,
    /// Hard ceiling on stored reply depth.
    pub max_depth: u32,
    /// Deepest level rendered as its own nesting step; deeper replies are flattened onto it.
    pub max_nesting_level: u32,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for CommentSettings {
    fn default() -> Self {
        Self {
            max_content_chars: 5000,
            max_depth: 50,
            max_nesting_level: 5,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportSettings {
    pub max_details_chars: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            max_details_chars: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub window_secs: u64,
    pub comments_per_window: u32,
    pub votes_per_window: u32,
    pub reports_per_window: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 60,
            comments_per_window: 5,
            votes_per_window: 30,
            reports_per_window: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub comments: CommentSettings,
    pub reports: ReportSettings,
    pub rate_limit: RateLimitSettings,
}

impl Config {
    pub fn file_path(base: &Path) -> PathBuf {
        base.join(CONFIG_FILE)
    }

    /// Load `config.toml` from the data directory, falling back to defaults when absent.
    pub fn load(base: &Path) -> Result<Self> {
        let path = Self::file_path(base);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    pub fn write_file(&self, base: &Path) -> Result<()> {
        let content = toml::to_string(self).context("Failed to serialize config")?;
        atomic_write(&Self::file_path(base), content.as_bytes())
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.comments;
        if c.max_content_chars == 0 {
            bail!("comments.max_content_chars must be at least 1");
        }
        if c.max_nesting_level == 0 {
            bail!("comments.max_nesting_level must be at least 1");
        }
        if c.default_page_size == 0 || c.max_page_size == 0 {
            bail!("page sizes must be at least 1");
        }
        if c.default_page_size > c.max_page_size {
            bail!(
                "comments.default_page_size ({}) exceeds comments.max_page_size ({})",
                c.default_page_size,
                c.max_page_size
            );
        }
        if self.rate_limit.enabled && self.rate_limit.window_secs == 0 {
            bail!("rate_limit.window_secs must be at least 1 when rate limiting is enabled");
        }
        Ok(())
    }
}
