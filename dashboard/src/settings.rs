use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::Deserialize;

use crate::api::DEFAULT_EXCERPT_CHARS;
use crate::format::TimeMode;
use crate::hooks;

/// Dashboard configuration (TOML). Every key is optional.
///
/// ```toml
/// api_base = "http://localhost:5000"
/// time_mode = "utc"
/// log_level = "debug"
/// excerpt_chars = 200
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardSettings {
    /// Prefix for `/api/...` paths; empty means same origin.
    pub api_base: String,
    pub time_mode: TimeMode,
    pub log_level: String,
    /// How much of an error response body the status line shows.
    pub excerpt_chars: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            time_mode: TimeMode::Local,
            log_level: "info".to_string(),
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }
}

impl DashboardSettings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut settings: Self = toml::from_str(s).context("parse dashboard settings")?;
        settings.api_base = settings.api_base.trim().to_string();
        settings.excerpt_chars = settings.excerpt_chars.max(1);
        Ok(settings)
    }

    /// Missing file means defaults; an unreadable or invalid one is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            hooks::log_settings_fallback(format!(
                "{} not found; using defaults",
                path.display()
            ));
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("load {}", path.display()))
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.trim().parse().unwrap_or_else(|_| {
            hooks::log_settings_fallback(format!("unknown log_level {:?}", self.log_level));
            LevelFilter::Info
        })
    }

    /// Resolves the API base against the page origin when left empty.
    pub fn api_base_or(&self, origin: &str) -> String {
        if self.api_base.is_empty() {
            origin.trim_end_matches('/').to_string()
        } else {
            self.api_base.trim_end_matches('/').to_string()
        }
    }
}
