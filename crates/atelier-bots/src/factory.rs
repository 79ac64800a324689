//! Bot factory — one externally-addressable bot per discovered skill.
//!
//! The factory runs discovery + registration and then materializes one
//! [`AddressableSkillBot`] per registered skill id, cached for the
//! factory's lifetime. Initialization is idempotent and accumulating:
//! re-initializing re-discovers and may add or overwrite bots, but never
//! removes stale ones — a stale bot fails at first use instead.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use atelier_skills::{SkillError, SkillRegistry, SkillWrapper, scan_roots};

use crate::bot::{BotSettings, SkillBot};
use crate::error::{BotError, Result};

/// The outcome of one factory initialization pass.
#[derive(Debug)]
pub struct LoadReport {
    /// How many bundles were registered this pass.
    pub loaded: usize,

    /// Bundle directories that failed to parse, with the failure.
    pub failures: Vec<(PathBuf, SkillError)>,
}

/// An addressable bot fronting one skill id.
///
/// The underlying execution wrapper is resolved lazily on first use, so
/// constructing a bot never forces registry materialization. If the skill
/// id is absent at resolution time, invocation fails with
/// [`BotError::SkillNotFound`].
pub struct AddressableSkillBot {
    skill_id: String,
    registry: SkillRegistry,
    wrapper: OnceLock<Arc<SkillWrapper>>,
}

impl AddressableSkillBot {
    pub(crate) fn new(skill_id: String, registry: SkillRegistry) -> Self {
        Self {
            skill_id,
            registry,
            wrapper: OnceLock::new(),
        }
    }

    /// Resolve the underlying wrapper, caching it on first success.
    fn ensure_loaded(&self) -> Result<Arc<SkillWrapper>> {
        if let Some(wrapper) = self.wrapper.get() {
            return Ok(Arc::clone(wrapper));
        }

        let entry = self
            .registry
            .get(&self.skill_id)
            .ok_or_else(|| BotError::SkillNotFound(self.skill_id.clone()))?;

        Ok(Arc::clone(
            self.wrapper.get_or_init(|| Arc::clone(&entry.wrapper)),
        ))
    }
}

#[async_trait]
impl SkillBot for AddressableSkillBot {
    fn id(&self) -> &str {
        &self.skill_id
    }

    async fn respond(&self, query: &str, context: Option<Value>) -> Result<String> {
        let wrapper = self.ensure_loaded()?;
        tracing::info!(skill = %self.skill_id, "dispatching query to skill bot");
        Ok(wrapper.respond(query, context).await)
    }

    async fn list_actions(&self) -> Result<Vec<String>> {
        let wrapper = self.ensure_loaded()?;
        Ok(wrapper.list_actions().await)
    }

    async fn settings(&self) -> Result<BotSettings> {
        let wrapper = self.ensure_loaded()?;
        Ok(BotSettings {
            introduction: format!(
                "**{}**\n\n{}\n\nAsk me to help with tasks related to this skill.",
                self.skill_id,
                wrapper.description()
            ),
            allow_attachments: false,
        })
    }
}

/// Creates and caches addressable bots over a shared registry.
pub struct SkillBotFactory {
    registry: SkillRegistry,
    bots: DashMap<String, Arc<AddressableSkillBot>>,
}

impl SkillBotFactory {
    /// Create a factory over the given registry handle.
    pub fn new(registry: SkillRegistry) -> Self {
        Self {
            registry,
            bots: DashMap::new(),
        }
    }

    /// Run a full discovery + registration pass over `roots`, then ensure
    /// one cached bot per registered skill id.
    pub async fn initialize(&self, roots: &[PathBuf]) -> LoadReport {
        let report = scan_roots(roots).await;

        let mut loaded = 0;
        for bundle in report.bundles {
            if self.registry.register(bundle) {
                loaded += 1;
            }
        }

        for metadata in self.registry.list() {
            self.bots.entry(metadata.name.clone()).or_insert_with(|| {
                Arc::new(AddressableSkillBot::new(
                    metadata.name,
                    self.registry.clone(),
                ))
            });
        }

        tracing::info!(loaded, bots = self.bots.len(), "skill bots initialized");

        LoadReport {
            loaded,
            failures: report.failures,
        }
    }

    /// The cached bot for a skill id, if one was ever created.
    pub fn bot(&self, skill_id: &str) -> Option<Arc<AddressableSkillBot>> {
        self.bots.get(skill_id).map(|b| Arc::clone(b.value()))
    }

    /// Snapshot of every cached bot, keyed by skill id.
    pub fn all_bots(&self) -> HashMap<String, Arc<AddressableSkillBot>> {
        self.bots
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect()
    }

    /// Number of cached bots.
    pub fn count(&self) -> usize {
        self.bots.len()
    }

    /// Drop every cached bot. Test isolation hook.
    pub fn clear(&self) {
        self.bots.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_skills::DECLARATION_FILE;
    use std::path::Path;

    async fn write_bundle(root: &Path, name: &str) {
        let dir = root.join(name);
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(
            dir.join(DECLARATION_FILE),
            format!("---\nname: {name}\ndescription: skill {name}\n---\nbody"),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn initialize_creates_one_bot_per_skill() {
        let tmp = tempfile::tempdir().unwrap();
        write_bundle(tmp.path(), "alpha").await;
        write_bundle(tmp.path(), "beta").await;

        let factory = SkillBotFactory::new(SkillRegistry::new());
        let report = factory.initialize(&[tmp.path().to_path_buf()]).await;

        assert_eq!(report.loaded, 2);
        assert!(report.failures.is_empty());
        assert_eq!(factory.count(), 2);
        assert!(factory.bot("alpha").is_some());
        assert!(factory.bot("missing").is_none());
        assert_eq!(factory.all_bots().len(), 2);
    }

    #[tokio::test]
    async fn reinitialize_accumulates_and_never_removes() {
        let tmp = tempfile::tempdir().unwrap();
        write_bundle(tmp.path(), "alpha").await;

        let registry = SkillRegistry::new();
        let factory = SkillBotFactory::new(registry.clone());
        factory.initialize(&[tmp.path().to_path_buf()]).await;
        assert_eq!(factory.count(), 1);

        // The bundle disappears from disk; the bot stays cached.
        tokio::fs::remove_dir_all(tmp.path().join("alpha"))
            .await
            .unwrap();
        registry.reset();
        factory.initialize(&[tmp.path().to_path_buf()]).await;
        assert_eq!(factory.count(), 1);
    }

    #[tokio::test]
    async fn stale_bot_fails_lazily_with_skill_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        write_bundle(tmp.path(), "alpha").await;

        let registry = SkillRegistry::new();
        let factory = SkillBotFactory::new(registry.clone());
        factory.initialize(&[tmp.path().to_path_buf()]).await;

        let bot = factory.bot("alpha").unwrap();
        registry.reset();

        let err = bot.respond("hello", None).await.unwrap_err();
        assert!(matches!(err, BotError::SkillNotFound(_)));
    }

    #[tokio::test]
    async fn resolved_bot_survives_registry_reset() {
        let tmp = tempfile::tempdir().unwrap();
        write_bundle(tmp.path(), "alpha").await;

        let registry = SkillRegistry::new();
        let factory = SkillBotFactory::new(registry.clone());
        factory.initialize(&[tmp.path().to_path_buf()]).await;

        let bot = factory.bot("alpha").unwrap();
        // First use resolves and caches the wrapper.
        bot.respond("hello", None).await.unwrap();

        registry.reset();
        let out = bot.respond("again", None).await.unwrap();
        assert!(out.contains("alpha"));
    }

    #[tokio::test]
    async fn settings_introduce_the_skill() {
        let tmp = tempfile::tempdir().unwrap();
        write_bundle(tmp.path(), "alpha").await;

        let factory = SkillBotFactory::new(SkillRegistry::new());
        factory.initialize(&[tmp.path().to_path_buf()]).await;

        let bot = factory.bot("alpha").unwrap();
        let settings = bot.settings().await.unwrap();
        assert!(settings.introduction.contains("**alpha**"));
        assert!(settings.introduction.contains("skill alpha"));
        assert!(!settings.allow_attachments);
    }
}
