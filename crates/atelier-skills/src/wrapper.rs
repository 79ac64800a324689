//! Per-skill execution wrapper.
//!
//! One wrapper exists per registered skill. It is a description/dispatch
//! layer: it builds the execution context and a stable-shape textual result
//! for a query, and enumerates the skill's declared actions. It never
//! interprets or executes the instructions — execution policy belongs to
//! the caller, because instruction semantics are bundle-specific.

use std::sync::{Arc, Weak};

use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SkillError};
use crate::registry::RegistryInner;
use crate::types::{ScriptModule, SkillBundle};

/// Marker in the instruction body that signals a task list. A substring
/// heuristic, not a grammar — the body has no defined structure.
const TASK_LIST_MARKER: &str = "Task:";

/// Everything a downstream executor needs to act on one query.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionContext {
    /// The responding skill's name.
    pub skill_name: String,

    /// The incoming free-text query.
    pub query: String,

    /// The skill's full instruction body.
    pub instructions: String,

    /// Caller-supplied context, or null.
    pub context: Value,
}

/// Execution wrapper for one registered skill.
///
/// Holds non-owning back-references: the bundle is shared with the
/// registry entry, and the registry link is weak so a wrapper can never
/// keep a dropped registry alive.
pub struct SkillWrapper {
    bundle: Arc<SkillBundle>,
    registry: Weak<RegistryInner>,
    preview_chars: usize,
}

impl SkillWrapper {
    pub(crate) fn new(
        bundle: Arc<SkillBundle>,
        registry: Weak<RegistryInner>,
        preview_chars: usize,
    ) -> Self {
        Self {
            bundle,
            registry,
            preview_chars,
        }
    }

    /// The wrapped skill's name.
    pub fn name(&self) -> &str {
        &self.bundle.metadata.name
    }

    /// The wrapped skill's description.
    pub fn description(&self) -> &str {
        &self.bundle.metadata.description
    }

    /// The wrapped bundle.
    pub fn bundle(&self) -> &SkillBundle {
        &self.bundle
    }

    /// Build the execution context for one query.
    pub fn execution_context(&self, query: &str, context: Option<Value>) -> ExecutionContext {
        ExecutionContext {
            skill_name: self.bundle.metadata.name.clone(),
            query: query.to_owned(),
            instructions: self.bundle.instructions.clone(),
            context: context.unwrap_or(Value::Null),
        }
    }

    /// Produce the textual result for a query: the skill's name, a
    /// truncated instruction preview, the echoed query, and the declared
    /// scripts and resources. Downstream formatting depends on this shape.
    pub async fn respond(&self, query: &str, context: Option<Value>) -> String {
        let ctx = self.execution_context(query, context);
        tracing::debug!(
            skill = %ctx.skill_name,
            query_len = ctx.query.len(),
            "building skill response"
        );

        let mut out = format!("# Skill: {}\n\n", ctx.skill_name);
        out.push_str("**Instructions:**\n");
        out.push_str(&preview(&ctx.instructions, self.preview_chars));
        out.push_str("\n\n");
        out.push_str(&format!("**Query:** {}\n\n", ctx.query));
        out.push_str("**Status:** Ready to execute\n\n");
        out.push_str(&format!(
            "**Available Scripts:** {}\n",
            join_or_none(&self.bundle.script_names())
        ));
        out.push_str(&format!(
            "**Available Resources:** {}\n",
            join_or_none(&self.bundle.resource_names())
        ));
        out
    }

    /// Enumerate the skill's declared actions: one `run-script:<name>`
    /// token per script, plus `list-tasks` when the instruction body
    /// carries the task-list marker.
    pub async fn list_actions(&self) -> Vec<String> {
        let mut actions: Vec<String> = self
            .bundle
            .scripts
            .iter()
            .map(|s| format!("run-script:{}", s.filename))
            .collect();

        if self.bundle.instructions.contains(TASK_LIST_MARKER) {
            actions.push("list-tasks".to_owned());
        }

        actions
    }

    /// Load one of this skill's declared scripts through the registry.
    ///
    /// Fails with [`SkillError::ScriptNotFound`] for an undeclared script
    /// and [`SkillError::SkillNotFound`] when the wrapper's registry entry
    /// no longer exists.
    pub async fn load_script(&self, script_name: &str) -> Result<Arc<ScriptModule>> {
        let Some(registry) = self.registry.upgrade() else {
            return Err(SkillError::SkillNotFound(self.name().to_owned()));
        };

        match registry.load_module(self.name(), script_name).await? {
            Some(module) => Ok(module),
            None if self.bundle.script(script_name).is_none() => Err(SkillError::ScriptNotFound {
                skill: self.name().to_owned(),
                script: script_name.to_owned(),
            }),
            None => Err(SkillError::SkillNotFound(self.name().to_owned())),
        }
    }
}

/// Truncate to at most `limit` characters, marking elision.
fn preview(text: &str, limit: usize) -> String {
    let mut out: String = text.chars().take(limit).collect();
    if text.chars().nth(limit).is_some() {
        out.push_str("...");
    }
    out
}

fn join_or_none<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        "none".to_owned()
    } else {
        items
            .iter()
            .map(S::as_ref)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
