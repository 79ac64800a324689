//! Bot layer for Atelier.
//!
//! This crate sits between the skill subsystem and the hosting
//! application:
//!
//! - **[`SkillRouter`]** — resolves free text to a skill id through a
//!   strict cascade: explicit hint, keyword search, tag fallback.
//!
//! - **[`CommandMatcher`]** — detects catalog commands ("list skills",
//!   "search skills: …") and skill-affinity wording with case-insensitive
//!   phrase automata.
//!
//! - **[`SkillBot`]** — the capability trait every addressable bot
//!   implements, with one [`factory::AddressableSkillBot`] per discovered
//!   skill created by the [`SkillBotFactory`].
//!
//! - **[`SkillEngine`]** — the facade the hosting layer consumes:
//!   discovery, lookup, search, routing, and invocation behind one handle,
//!   with an explicit `reset()` for test isolation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use atelier_bots::SkillEngine;
//!
//! # async fn demo() {
//! let engine = SkillEngine::from_env();
//! let loaded = engine.discover_and_load(&[PathBuf::from("skills")]).await;
//! println!("loaded {loaded} skills");
//!
//! if let Some(skill_id) = engine.route_query("please use slack", None) {
//!     let reply = engine.invoke_skill(&skill_id, "ping the channel", None).await;
//!     println!("{}", reply.unwrap_or_else(|e| e.to_string()));
//! } else {
//!     println!("{}", engine.catalog());
//! }
//! # }
//! ```

pub mod bot;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod router;

pub use bot::{BotSettings, SkillBot};
pub use commands::{CatalogCommand, CommandMatcher};
pub use config::{EngineConfig, SKILLS_DIR_ENV};
pub use engine::SkillEngine;
pub use error::{BotError, Result};
pub use factory::{AddressableSkillBot, LoadReport, SkillBotFactory};
pub use router::{MatchType, RouterMatch, SkillRouter};
