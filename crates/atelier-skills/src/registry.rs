//! Skill registry — the authoritative in-memory table of parsed skills.
//!
//! Backed by [`DashMap`] for lock-free concurrent reads with fine-grained
//! write locking, so a registry handle can be shared across tasks without a
//! global lock. The handle is cheaply cloneable (`Arc`-backed) and
//! `Send + Sync`.
//!
//! Registration is last-write-wins: re-registering a name overwrites the
//! existing entry with a warning. An overwrite keeps the entry's original
//! registration position, so [`SkillRegistry::list`] order is stable across
//! re-discovery.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::{Result, SkillError};
use crate::types::{ScriptModule, SkillBundle, SkillMetadata};
use crate::wrapper::SkillWrapper;

/// Tunables threaded through to the wrappers a registry constructs.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How many characters of a skill's instructions a response previews.
    pub preview_chars: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { preview_chars: 500 }
    }
}

/// One registered skill: the parsed bundle plus its execution wrapper.
#[derive(Clone)]
pub struct SkillEntry {
    /// The parsed bundle. Owned by the registry, shared read-only.
    pub bundle: Arc<SkillBundle>,

    /// The per-skill execution wrapper.
    pub wrapper: Arc<SkillWrapper>,

    /// Registration sequence, preserved across overwrites.
    seq: u64,
}

pub(crate) struct RegistryInner {
    entries: DashMap<String, SkillEntry>,
    modules: DashMap<String, Arc<ScriptModule>>,
    next_seq: AtomicU64,
    preview_chars: usize,
}

/// Concurrent skill registry. Clone freely; all clones share one table.
#[derive(Clone)]
pub struct SkillRegistry {
    inner: Arc<RegistryInner>,
}

impl SkillRegistry {
    /// Create an empty registry with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: DashMap::new(),
                modules: DashMap::new(),
                next_seq: AtomicU64::new(0),
                preview_chars: config.preview_chars,
            }),
        }
    }

    /// Register a parsed bundle under its metadata name.
    ///
    /// An existing entry under the same name is overwritten with a warning.
    /// Returns `false` only when the bundle's name is empty, which the
    /// registry rejects.
    pub fn register(&self, bundle: SkillBundle) -> bool {
        let name = bundle.metadata.name.clone();
        if name.is_empty() {
            tracing::warn!(
                path = %bundle.metadata.path.display(),
                "rejecting bundle with empty name"
            );
            return false;
        }

        let bundle = Arc::new(bundle);
        let wrapper = Arc::new(SkillWrapper::new(
            Arc::clone(&bundle),
            Arc::downgrade(&self.inner),
            self.inner.preview_chars,
        ));

        match self.inner.entries.entry(name.clone()) {
            Entry::Occupied(mut occupied) => {
                tracing::warn!(name = %name, "skill already registered, overwriting");
                let seq = occupied.get().seq;
                occupied.insert(SkillEntry {
                    bundle,
                    wrapper,
                    seq,
                });
            }
            Entry::Vacant(vacant) => {
                let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
                vacant.insert(SkillEntry {
                    bundle,
                    wrapper,
                    seq,
                });
                tracing::info!(name = %name, "skill registered");
            }
        }

        true
    }

    /// Retrieve a snapshot of one entry.
    pub fn get(&self, name: &str) -> Option<SkillEntry> {
        self.inner.entries.get(name).map(|e| e.value().clone())
    }

    /// Whether a skill is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.entries.contains_key(name)
    }

    /// Metadata of every registered skill, in registration order.
    pub fn list(&self) -> Vec<SkillMetadata> {
        let mut rows: Vec<(u64, SkillMetadata)> = self
            .inner
            .entries
            .iter()
            .map(|e| (e.value().seq, e.value().bundle.metadata.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, metadata)| metadata).collect()
    }

    /// Skills whose tag set contains `tag` exactly (case-sensitive), in
    /// registration order.
    pub fn find_by_tag(&self, tag: &str) -> Vec<Arc<SkillBundle>> {
        self.collect_where(|bundle| bundle.metadata.tags.iter().any(|t| t == tag))
    }

    /// Skills whose description or name contains `keyword`,
    /// case-insensitively, in registration order.
    pub fn find_by_keyword(&self, keyword: &str) -> Vec<Arc<SkillBundle>> {
        let keyword = keyword.to_lowercase();
        self.collect_where(|bundle| {
            bundle.metadata.description.to_lowercase().contains(&keyword)
                || bundle.metadata.name.to_lowercase().contains(&keyword)
        })
    }

    /// Resolve and load a declared script as a module, memoizing the handle.
    ///
    /// An absent skill or absent script reports `Ok(None)` — callers must
    /// check explicitly. An I/O failure while loading the script file is
    /// [`SkillError::ModuleLoadFailure`]. The cache is never invalidated
    /// for the registry's lifetime.
    pub async fn load_script_module(
        &self,
        skill_id: &str,
        script_name: &str,
    ) -> Result<Option<Arc<ScriptModule>>> {
        self.inner.load_module(skill_id, script_name).await
    }

    /// Number of registered skills.
    pub fn count(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether the registry has no skills.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Drop every entry and the module cache. Test isolation hook.
    pub fn reset(&self) {
        self.inner.entries.clear();
        self.inner.modules.clear();
        self.inner.next_seq.store(0, Ordering::Relaxed);
        tracing::debug!("registry reset");
    }

    fn collect_where(&self, pred: impl Fn(&SkillBundle) -> bool) -> Vec<Arc<SkillBundle>> {
        let mut rows: Vec<(u64, Arc<SkillBundle>)> = self
            .inner
            .entries
            .iter()
            .filter(|e| pred(&e.value().bundle))
            .map(|e| (e.value().seq, Arc::clone(&e.value().bundle)))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, bundle)| bundle).collect()
    }
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryInner {
    pub(crate) async fn load_module(
        &self,
        skill_id: &str,
        script_name: &str,
    ) -> Result<Option<Arc<ScriptModule>>> {
        let Some(entry) = self.entries.get(skill_id).map(|e| e.value().clone()) else {
            tracing::warn!(skill = %skill_id, "module load for unregistered skill");
            return Ok(None);
        };

        let Some(script) = entry.bundle.script(script_name) else {
            tracing::warn!(
                skill = %skill_id,
                script = %script_name,
                "module load for undeclared script"
            );
            return Ok(None);
        };

        let key = format!("{skill_id}/{script_name}");
        if let Some(module) = self.modules.get(&key) {
            tracing::trace!(module = %key, "module cache hit");
            return Ok(Some(Arc::clone(module.value())));
        }

        let source = tokio::fs::read_to_string(&script.path).await.map_err(|e| {
            SkillError::ModuleLoadFailure {
                skill: skill_id.to_owned(),
                script: script_name.to_owned(),
                reason: e.to_string(),
            }
        })?;

        let module = Arc::new(ScriptModule {
            skill: skill_id.to_owned(),
            script: script_name.to_owned(),
            path: script.path.clone(),
            interpreter: script.interpreter,
            source,
        });

        // A concurrent loader may have won the race; the stored handle wins
        // so every caller shares one instance.
        let module = Arc::clone(&self.modules.entry(key.clone()).or_insert(module));
        tracing::info!(module = %key, "script module loaded");
        Ok(Some(module))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn bundle(name: &str, description: &str, tags: &[&str]) -> SkillBundle {
        SkillBundle {
            metadata: SkillMetadata {
                name: name.into(),
                description: description.into(),
                path: PathBuf::from(format!("/skills/{name}")),
                version: None,
                author: None,
                tags: tags.iter().map(|t| (*t).to_owned()).collect(),
                dependencies: vec![],
            },
            instructions: String::new(),
            scripts: vec![],
            resources: vec![],
        }
    }

    #[test]
    fn register_and_get() {
        let registry = SkillRegistry::new();
        assert!(registry.register(bundle("a", "first skill", &[])));

        let entry = registry.get("a").expect("registered");
        assert_eq!(entry.bundle.metadata.description, "first skill");
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn empty_name_is_rejected() {
        let registry = SkillRegistry::new();
        assert!(!registry.register(bundle("", "nameless", &[])));
        assert!(registry.is_empty());
    }

    #[test]
    fn overwrite_keeps_single_entry_and_position() {
        let registry = SkillRegistry::new();
        registry.register(bundle("a", "original", &[]));
        registry.register(bundle("b", "second", &[]));
        registry.register(bundle("a", "replacement", &[]));

        assert_eq!(registry.count(), 2);
        assert_eq!(registry.get("a").unwrap().bundle.metadata.description, "replacement");

        // The overwritten entry keeps its original list position.
        let names: Vec<String> = registry.list().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn list_preserves_registration_order() {
        let registry = SkillRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(bundle(name, "", &[]));
        }
        let names: Vec<String> = registry.list().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn find_by_tag_is_exact_and_case_sensitive() {
        let registry = SkillRegistry::new();
        registry.register(bundle("a", "", &["slack", "linear"]));
        registry.register(bundle("b", "", &["Slack"]));

        let hits = registry.find_by_tag("slack");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.name, "a");

        assert!(registry.find_by_tag("slac").is_empty());
    }

    #[test]
    fn find_by_keyword_matches_name_or_description() {
        let registry = SkillRegistry::new();
        registry.register(bundle("notifier", "Handles Slack notifications", &[]));
        registry.register(bundle("reporter", "Builds weekly reports", &[]));

        let hits = registry.find_by_keyword("SLACK");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.name, "notifier");

        // Name matches count too.
        let hits = registry.find_by_keyword("report");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.name, "reporter");
    }

    #[tokio::test]
    async fn load_script_module_memoizes() {
        let tmp = tempfile::tempdir().unwrap();
        let script_path = tmp.path().join("send.py");
        tokio::fs::write(&script_path, "print('hi')").await.unwrap();

        let mut b = bundle("notifier", "", &[]);
        b.scripts.push(crate::types::ScriptFile {
            filename: "send.py".into(),
            path: script_path,
            interpreter: crate::types::ScriptInterpreter::Python,
        });

        let registry = SkillRegistry::new();
        registry.register(b);

        let first = registry
            .load_script_module("notifier", "send.py")
            .await
            .unwrap()
            .expect("module loads");
        assert_eq!(first.source, "print('hi')");

        let second = registry
            .load_script_module("notifier", "send.py")
            .await
            .unwrap()
            .expect("cached module");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn load_script_module_reports_absence() {
        let registry = SkillRegistry::new();
        registry.register(bundle("a", "", &[]));

        assert!(registry
            .load_script_module("missing", "x.py")
            .await
            .unwrap()
            .is_none());
        assert!(registry
            .load_script_module("a", "x.py")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn load_script_module_io_failure() {
        let mut b = bundle("a", "", &[]);
        b.scripts.push(crate::types::ScriptFile {
            filename: "gone.py".into(),
            path: PathBuf::from("/nope/gone.py"),
            interpreter: crate::types::ScriptInterpreter::Python,
        });

        let registry = SkillRegistry::new();
        registry.register(b);

        let err = registry
            .load_script_module("a", "gone.py")
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::ModuleLoadFailure { .. }));
    }

    #[test]
    fn reset_clears_everything() {
        let registry = SkillRegistry::new();
        registry.register(bundle("a", "", &[]));
        registry.reset();
        assert!(registry.is_empty());
        assert!(registry.list().is_empty());
    }
}
