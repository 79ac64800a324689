//! Skill subsystem for Atelier.
//!
//! This crate turns a directory tree of skill bundles into registered,
//! invocable units:
//!
//! - **Declaration parser** — parses a bundle's `SKILL.md` (fenced
//!   key-value header plus free-text instructions) into typed metadata.
//!
//! - **Bundle discovery** — walks one or more roots for bundles, parses
//!   each, and collects per-bundle failures instead of aborting the scan.
//!
//! - **Skill registry** — the authoritative in-memory table: point lookup,
//!   tag lookup, keyword search, and memoized script-module loading.
//!
//! - **Execution wrapper** — one per registered skill; builds execution
//!   contexts and stable-shape textual results, and enumerates declared
//!   actions.
//!
//! The registry is purely in-memory and rebuilt from the filesystem on
//! each scan; nothing is persisted.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use atelier_skills::{scan_roots, SkillRegistry};
//!
//! # async fn demo() {
//! let registry = SkillRegistry::new();
//! let report = scan_roots(&[PathBuf::from("skills")]).await;
//! for bundle in report.bundles {
//!     registry.register(bundle);
//! }
//! # }
//! ```

pub mod discovery;
pub mod error;
pub mod parser;
pub mod registry;
pub mod types;
pub mod wrapper;

pub use discovery::{DECLARATION_FILE, ScanReport, find_bundles, parse_bundle, scan_roots};
pub use error::{Result, SkillError};
pub use parser::parse_declaration;
pub use registry::{RegistryConfig, SkillEntry, SkillRegistry};
pub use types::{
    ResourceFile, ScriptFile, ScriptInterpreter, ScriptModule, SkillBundle, SkillMetadata,
};
pub use wrapper::{ExecutionContext, SkillWrapper};
