//! Error types for the bots layer.

use std::path::PathBuf;

use atelier_skills::SkillError;

/// Bot-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// An invocation referenced a skill id that is not registered.
    #[error("skill not found: `{0}`")]
    SkillNotFound(String),

    /// The engine configuration file could not be decoded.
    #[error("invalid engine config at `{path}`: {reason}")]
    Config { path: PathBuf, reason: String },

    /// A failure bubbled up from the skills subsystem.
    #[error(transparent)]
    Skills(#[from] SkillError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, BotError>;
