//! Skill router — decides which skill (if any) should handle free text.
//!
//! Resolution is a strict three-tier cascade, first success wins:
//!
//! | Tier | Technique |
//! |------|-----------|
//! | 1 | Explicit hint naming a registered skill — no search runs |
//! | 2 | Keyword search over descriptions and names; tag search as fallback |
//! | 3 | No match — the caller presents the catalog instead |
//!
//! Within a search tier, hits come back in registration order; keyword
//! hits always outrank tag hits because the tag tier only runs when the
//! keyword tier is empty.

use serde::Serialize;

use atelier_skills::{SkillMetadata, SkillRegistry};

/// Why a search hit matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Case-insensitive substring of the description or name.
    Keyword,
    /// Exact tag membership.
    Tag,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyword => write!(f, "keyword"),
            Self::Tag => write!(f, "tag"),
        }
    }
}

/// One search hit. Transient — produced for display and routing, never
/// stored.
#[derive(Debug, Clone, Serialize)]
pub struct RouterMatch {
    /// The matching skill's id.
    pub skill_id: String,

    /// Why it matched.
    pub match_type: MatchType,

    /// The skill's description, for display.
    pub description: String,

    /// The skill's tags, for display.
    pub tags: Vec<String>,
}

/// Routes free-text queries over a shared registry.
#[derive(Clone)]
pub struct SkillRouter {
    registry: SkillRegistry,
}

impl SkillRouter {
    /// Create a router over the given registry handle.
    pub fn new(registry: SkillRegistry) -> Self {
        Self { registry }
    }

    /// Resolve a query to a skill id.
    ///
    /// A hint naming a registered skill returns immediately; an unknown
    /// hint falls through to search. The search tier derives candidate
    /// terms from the query (the full text, then its individual words) so
    /// that "please use slack" still reaches a skill that only mentions
    /// "slack". Keyword matches on any term outrank tag matches on any
    /// term. No match resolves to `None` — the caller decides the
    /// fallback.
    pub fn route(&self, query: &str, hint: Option<&str>) -> Option<String> {
        if let Some(hinted) = hint {
            if self.registry.contains(hinted) {
                tracing::debug!(skill = %hinted, "routed by explicit hint");
                return Some(hinted.to_owned());
            }
            tracing::debug!(hint = %hinted, "hint names no registered skill, searching");
        }

        let terms = candidate_terms(query);

        for term in &terms {
            if let Some(bundle) = self.registry.find_by_keyword(term).into_iter().next() {
                tracing::debug!(
                    skill = %bundle.metadata.name,
                    term = %term,
                    "routed by keyword match"
                );
                return Some(bundle.metadata.name.clone());
            }
        }

        for term in &terms {
            if let Some(bundle) = self.registry.find_by_tag(term).into_iter().next() {
                tracing::debug!(
                    skill = %bundle.metadata.name,
                    term = %term,
                    "routed by tag match"
                );
                return Some(bundle.metadata.name.clone());
            }
        }

        tracing::debug!("no skill matched query");
        None
    }

    /// Search the registry: keyword tier first, tag tier only when the
    /// keyword tier comes back empty. Hits are classified for display.
    pub fn search(&self, term: &str) -> Vec<RouterMatch> {
        let keyword_hits = self.registry.find_by_keyword(term);
        if !keyword_hits.is_empty() {
            return keyword_hits
                .into_iter()
                .map(|b| to_match(&b.metadata, MatchType::Keyword))
                .collect();
        }

        self.registry
            .find_by_tag(term)
            .into_iter()
            .map(|b| to_match(&b.metadata, MatchType::Tag))
            .collect()
    }

    /// Read-only projection of the registry, in registration order.
    pub fn list_skills(&self) -> Vec<SkillMetadata> {
        self.registry.list()
    }

    /// Render the markdown skill directory a host presents when a route
    /// fails to resolve.
    pub fn render_catalog(&self) -> String {
        let skills = self.registry.list();
        if skills.is_empty() {
            return "No skills available".to_owned();
        }

        let mut out = String::new();
        for metadata in skills {
            out.push_str(&format!("## {}\n\n", metadata.name.to_uppercase()));
            out.push_str(&format!("**Description:** {}\n\n", metadata.description));
            out.push_str(&format!(
                "**Version:** {}\n\n",
                metadata.version.as_deref().unwrap_or("unknown")
            ));
            out.push_str(&format!("**Tags:** {}\n\n", metadata.tags.join(", ")));

            let scripts = self
                .registry
                .get(&metadata.name)
                .map(|entry| entry.bundle.script_names().join(", "))
                .unwrap_or_default();
            out.push_str(&format!("**Scripts:** {scripts}\n\n---\n\n"));
        }
        out
    }
}

/// Candidate search terms for a free-text query: the full trimmed text,
/// then each word of at least three characters with punctuation stripped
/// from its edges. Case-insensitive duplicates are dropped.
fn candidate_terms(query: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let full = query.trim();
    if !full.is_empty() {
        terms.push(full.to_owned());
    }

    for word in query.split_whitespace() {
        let word = word.trim_matches(|c: char| !c.is_alphanumeric());
        if word.len() >= 3 && !terms.iter().any(|t| t.eq_ignore_ascii_case(word)) {
            terms.push(word.to_owned());
        }
    }

    terms
}

fn to_match(metadata: &SkillMetadata, match_type: MatchType) -> RouterMatch {
    RouterMatch {
        skill_id: metadata.name.clone(),
        match_type,
        description: metadata.description.clone(),
        tags: metadata.tags.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
