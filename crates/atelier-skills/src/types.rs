//! Skill bundle type definitions.
//!
//! A skill is a self-contained unit of capability living in one bundle
//! directory: a `SKILL.md` declaration (frontmatter metadata plus free-text
//! instructions), an optional `scripts/` directory of executable scripts,
//! and an optional `resources/` tree of supporting files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Identity and classification of a skill, parsed from the declaration
/// header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMetadata {
    /// Unique skill name / slug. Registry key.
    pub name: String,

    /// Short human-readable description of what the skill does.
    pub description: String,

    /// The bundle directory this skill was parsed from. Provenance only,
    /// never used for identity.
    pub path: PathBuf,

    /// Version string (e.g. `1.2.0`).
    pub version: Option<String>,

    /// Author name or handle.
    pub author: Option<String>,

    /// Tags for categorization and search.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Free-form dependency declarations.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// An executable script declared by a bundle's `scripts/` directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptFile {
    /// The script filename (e.g. `send.py`, `run.sh`).
    pub filename: String,

    /// Full path to the script file.
    pub path: PathBuf,

    /// The interpreter inferred from the extension.
    pub interpreter: ScriptInterpreter,
}

/// A supporting file under a bundle's `resources/` tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceFile {
    /// Path relative to the `resources/` root.
    pub rel_path: PathBuf,

    /// Full path to the resource file.
    pub path: PathBuf,
}

/// A fully parsed skill bundle: everything needed to register and invoke
/// one skill. Immutable after creation.
#[derive(Debug, Clone)]
pub struct SkillBundle {
    /// Parsed declaration header.
    pub metadata: SkillMetadata,

    /// The free-text body of the declaration, describing what the skill
    /// does and how.
    pub instructions: String,

    /// Declared scripts, in directory enumeration order.
    pub scripts: Vec<ScriptFile>,

    /// Declared resources, in directory enumeration order.
    pub resources: Vec<ResourceFile>,
}

impl SkillBundle {
    /// Look up a declared script by filename.
    pub fn script(&self, filename: &str) -> Option<&ScriptFile> {
        self.scripts.iter().find(|s| s.filename == filename)
    }

    /// Filenames of all declared scripts, in declaration order.
    pub fn script_names(&self) -> Vec<&str> {
        self.scripts.iter().map(|s| s.filename.as_str()).collect()
    }

    /// Relative paths of all declared resources, in declaration order.
    pub fn resource_names(&self) -> Vec<String> {
        self.resources
            .iter()
            .map(|r| r.rel_path.display().to_string())
            .collect()
    }
}

/// Supported script interpreters, inferred from file extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptInterpreter {
    /// Shell script (`.sh`, `.bash`).
    Shell,
    /// Python script (`.py`).
    Python,
    /// JavaScript (`.js`, `.mjs`).
    JavaScript,
    /// TypeScript (`.ts`, `.mts`).
    TypeScript,
}

impl ScriptInterpreter {
    /// Detect the interpreter from a file extension. Returns `None` for
    /// anything that is not a recognized script type.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "sh" | "bash" => Some(Self::Shell),
            "py" => Some(Self::Python),
            "js" | "mjs" => Some(Self::JavaScript),
            "ts" | "mts" => Some(Self::TypeScript),
            _ => None,
        }
    }

    /// Detect the interpreter from a file path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// The command a caller would use to execute scripts of this type.
    pub fn command(&self) -> &str {
        match self {
            Self::Shell => "bash",
            Self::Python => "python3",
            Self::JavaScript => "node",
            Self::TypeScript => "deno",
        }
    }

    /// Arguments the command needs before the script path.
    pub fn args(&self) -> &[&str] {
        match self {
            Self::Shell | Self::Python | Self::JavaScript => &[],
            Self::TypeScript => &["run", "--allow-all"],
        }
    }
}

/// A loaded script module: the memoized handle returned by
/// [`crate::registry::SkillRegistry::load_script_module`].
///
/// Loading verifies the script exists on disk and reads its source. The
/// engine never executes the script itself; `command_line` describes how a
/// caller would invoke it.
#[derive(Debug)]
pub struct ScriptModule {
    /// The owning skill id.
    pub skill: String,

    /// The script filename within the bundle.
    pub script: String,

    /// Full path to the script file.
    pub path: PathBuf,

    /// The interpreter inferred from the extension.
    pub interpreter: ScriptInterpreter,

    /// The script source as read at load time.
    pub source: String,
}

impl ScriptModule {
    /// The cache key this module is memoized under.
    pub fn key(&self) -> String {
        format!("{}/{}", self.skill, self.script)
    }

    /// The argv a caller would use to run this script.
    pub fn command_line(&self) -> Vec<String> {
        let mut argv = vec![self.interpreter.command().to_owned()];
        argv.extend(self.interpreter.args().iter().map(|a| (*a).to_owned()));
        argv.push(self.path.display().to_string());
        argv
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
