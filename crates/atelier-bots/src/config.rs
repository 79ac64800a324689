//! Engine configuration.
//!
//! Resolution order follows the usual layering: built-in defaults, an
//! optional TOML file, then the `ATELIER_SKILLS_DIR` environment variable
//! (a path-separator-joined list) overriding the discovery roots.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};

/// Environment variable overriding the discovery roots. Multiple roots are
/// joined with the platform path separator, PATH-style.
pub const SKILLS_DIR_ENV: &str = "ATELIER_SKILLS_DIR";

/// Engine-wide tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directories scanned for skill bundles.
    #[serde(default = "default_roots")]
    pub skills_roots: Vec<PathBuf>,

    /// How many characters of a skill's instructions a response previews.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Keywords whose presence in a message suggests a skill should
    /// handle it.
    #[serde(default = "default_affinity_keywords")]
    pub affinity_keywords: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            skills_roots: default_roots(),
            preview_chars: default_preview_chars(),
            affinity_keywords: default_affinity_keywords(),
        }
    }
}

impl EngineConfig {
    /// Defaults with the environment override applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(raw) = std::env::var_os(SKILLS_DIR_ENV) {
            let roots: Vec<PathBuf> = std::env::split_paths(&raw).collect();
            if !roots.is_empty() {
                config.skills_roots = roots;
            }
        }
        config
    }

    /// Load from a TOML file, then apply the environment override.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let mut config: Self = toml::from_str(&content).map_err(|e| BotError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if let Some(raw) = std::env::var_os(SKILLS_DIR_ENV) {
            let roots: Vec<PathBuf> = std::env::split_paths(&raw).collect();
            if !roots.is_empty() {
                config.skills_roots = roots;
            }
        }

        Ok(config)
    }
}

fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("skills")]
}

fn default_preview_chars() -> usize {
    500
}

fn default_affinity_keywords() -> Vec<String> {
    [
        "notification",
        "slack",
        "linear",
        "clickup",
        "widget",
        "report",
        "plugin",
        "script",
    ]
    .map(str::to_owned)
    .to_vec()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
