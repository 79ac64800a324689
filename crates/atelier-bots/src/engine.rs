//! The engine facade — the API surface the hosting layer consumes.
//!
//! One [`SkillEngine`] is constructed at process start and passed by
//! reference to every consumer. It owns the registry, router, command
//! matcher, and bot factory, and exposes discovery, lookup, search,
//! routing, and invocation in one place. [`SkillEngine::reset`] gives
//! tests a fresh state without process-global tricks.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use atelier_skills::{RegistryConfig, SkillMetadata, SkillRegistry};

use crate::commands::{CatalogCommand, CommandMatcher};
use crate::config::EngineConfig;
use crate::error::{BotError, Result};
use crate::factory::SkillBotFactory;
use crate::router::{RouterMatch, SkillRouter};

/// The skill engine: discovery, registry, routing, and per-skill bots
/// behind one handle.
pub struct SkillEngine {
    config: EngineConfig,
    registry: SkillRegistry,
    router: SkillRouter,
    factory: SkillBotFactory,
    commands: CommandMatcher,
    scan_failures: Mutex<Vec<(PathBuf, String)>>,
}

impl SkillEngine {
    /// Build an engine from explicit configuration.
    pub fn new(config: EngineConfig) -> Self {
        let registry = SkillRegistry::with_config(RegistryConfig {
            preview_chars: config.preview_chars,
        });
        let router = SkillRouter::new(registry.clone());
        let factory = SkillBotFactory::new(registry.clone());
        let commands = CommandMatcher::new(&config.affinity_keywords);

        Self {
            config,
            registry,
            router,
            factory,
            commands,
            scan_failures: Mutex::new(Vec::new()),
        }
    }

    /// Build an engine from defaults plus environment overrides.
    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    /// Discover and register every bundle under `roots`, creating one
    /// addressable bot per skill. Returns the number of bundles loaded;
    /// per-bundle failures are recorded and retrievable via
    /// [`SkillEngine::scan_failures`].
    pub async fn discover_and_load(&self, roots: &[PathBuf]) -> usize {
        let report = self.factory.initialize(roots).await;

        let mut failures = self.lock_failures();
        failures.clear();
        failures.extend(
            report
                .failures
                .into_iter()
                .map(|(path, e)| (path, e.to_string())),
        );
        drop(failures);

        report.loaded
    }

    /// Discover and register from the configured roots.
    pub async fn load_configured_roots(&self) -> usize {
        let roots = self.config.skills_roots.clone();
        self.discover_and_load(&roots).await
    }

    /// Metadata for one registered skill.
    pub fn get_skill(&self, id: &str) -> Option<SkillMetadata> {
        self.registry.get(id).map(|e| e.bundle.metadata.clone())
    }

    /// Metadata for every registered skill, in registration order.
    pub fn list_skills(&self) -> Vec<SkillMetadata> {
        self.registry.list()
    }

    /// Tiered search over the registry.
    pub fn search_skills(&self, term: &str) -> Vec<RouterMatch> {
        self.router.search(term)
    }

    /// Resolve free text to a skill id, honoring an explicit hint first.
    pub fn route_query(&self, text: &str, hint: Option<&str>) -> Option<String> {
        self.router.route(text, hint)
    }

    /// Invoke a registered skill against a query.
    ///
    /// Fails with [`BotError::SkillNotFound`] when the id is absent; the
    /// message carries the id, never internals.
    pub async fn invoke_skill(
        &self,
        id: &str,
        query: &str,
        context: Option<Value>,
    ) -> Result<String> {
        let entry = self
            .registry
            .get(id)
            .ok_or_else(|| BotError::SkillNotFound(id.to_owned()))?;

        tracing::info!(skill = %id, "invoking skill");
        Ok(entry.wrapper.respond(query, context).await)
    }

    /// The markdown skill directory, for presentation when a route fails
    /// to resolve.
    pub fn catalog(&self) -> String {
        self.router.render_catalog()
    }

    /// Classify text as a catalog command, if it contains one.
    pub fn classify_command(&self, text: &str) -> Option<CatalogCommand> {
        self.commands.classify(text)
    }

    /// Whether text mentions any configured affinity keyword.
    pub fn has_skill_affinity(&self, text: &str) -> bool {
        self.commands.has_skill_affinity(text)
    }

    /// Handle a catalog command in one step: `None` when the text carries
    /// no command, otherwise the rendered reply.
    pub fn handle_catalog_command(&self, text: &str) -> Option<String> {
        match self.commands.classify(text)? {
            CatalogCommand::List => Some(self.catalog()),
            CatalogCommand::Search { term } if term.is_empty() => {
                Some("Please provide a search term".to_owned())
            }
            CatalogCommand::Search { term } => Some(self.render_search_results(&term)),
        }
    }

    /// Failures recorded by the most recent discovery pass.
    pub fn scan_failures(&self) -> Vec<(PathBuf, String)> {
        self.lock_failures().clone()
    }

    /// The shared registry handle.
    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    /// The router.
    pub fn router(&self) -> &SkillRouter {
        &self.router
    }

    /// The bot factory.
    pub fn factory(&self) -> &SkillBotFactory {
        &self.factory
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drop every registered skill, cached bot, and recorded failure.
    /// Test isolation hook.
    pub fn reset(&self) {
        self.registry.reset();
        self.factory.clear();
        self.lock_failures().clear();
        tracing::debug!("engine reset");
    }

    fn render_search_results(&self, term: &str) -> String {
        let results = self.router.search(term);
        if results.is_empty() {
            return format!("No skills found matching: {term}");
        }

        let mut out = format!("Found {} skill(s) matching '{term}':\n\n", results.len());
        for result in results {
            out.push_str(&format!(
                "### {}\n{}\n\n**Match Type:** {}\n\n",
                result.skill_id, result.description, result.match_type
            ));
        }
        out
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, Vec<(PathBuf, String)>> {
        self.scan_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SkillEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
