//! Error types for the skills subsystem.

use std::path::PathBuf;

/// Skill-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    /// The bundle directory has no declaration file.
    #[error("no skill declaration found in `{path}`")]
    BundleNotFound { path: PathBuf },

    /// The declaration header is not fenced by the delimiter twice.
    #[error("malformed header in `{path}`: {reason}")]
    MalformedHeader { path: PathBuf, reason: String },

    /// The header is fenced correctly but does not decode as key-value data.
    #[error("invalid header syntax in `{path}`: {reason}")]
    InvalidHeaderSyntax { path: PathBuf, reason: String },

    /// A lookup or invocation referenced an unregistered skill id.
    #[error("skill not found: `{0}`")]
    SkillNotFound(String),

    /// An invocation referenced a script the bundle does not declare.
    #[error("script `{script}` not found in skill `{skill}`")]
    ScriptNotFound { skill: String, script: String },

    /// Loading a declared script from disk failed.
    #[error("failed to load script `{script}` of skill `{skill}`: {reason}")]
    ModuleLoadFailure {
        skill: String,
        script: String,
        reason: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SkillError>;
