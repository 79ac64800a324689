//! The bot capability trait.
//!
//! Every externally-addressable skill bot implements [`SkillBot`], giving
//! the hosting layer one uniform surface for invocation, action
//! enumeration, and introspection — regardless of which skill sits behind
//! it.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Introspection settings a bot reports to the hosting layer.
#[derive(Debug, Clone, Serialize)]
pub struct BotSettings {
    /// The message a host presents when the bot is first addressed.
    pub introduction: String,

    /// Whether the bot accepts file attachments.
    pub allow_attachments: bool,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            introduction: String::new(),
            allow_attachments: false,
        }
    }
}

/// Minimal capability set of an addressable skill bot.
#[async_trait]
pub trait SkillBot: Send + Sync {
    /// The skill id this bot fronts.
    fn id(&self) -> &str;

    /// Produce the textual result for one query.
    async fn respond(&self, query: &str, context: Option<Value>) -> Result<String>;

    /// Enumerate the skill's declared actions.
    async fn list_actions(&self) -> Result<Vec<String>>;

    /// Introspection settings for the hosting layer.
    async fn settings(&self) -> Result<BotSettings>;
}
