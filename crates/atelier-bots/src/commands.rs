//! Catalog-command detection.
//!
//! Free text addressed to the hosting layer may carry a catalog command
//! ("list skills", "search skills: slack") or wording that suggests a
//! skill should handle it. Both checks are exact phrase containment over a
//! case-insensitive [`AhoCorasick`] automaton — fast enough to run on
//! every incoming message before any routing happens.

use aho_corasick::{AhoCorasick, MatchKind};

/// A recognized catalog command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCommand {
    /// Present the full skill directory.
    List,

    /// Search the directory. The term may be empty when the command
    /// carries no argument.
    Search { term: String },
}

/// Phrases that request the skill directory.
const LIST_PHRASES: [&str; 3] = ["list skills", "show skills", "available skills"];

/// Phrases that open a directory search; the remainder of the text is the
/// search term.
const SEARCH_PHRASES: [&str; 2] = ["search skills", "search:"];

/// Classifies free text into catalog commands and checks skill affinity.
pub struct CommandMatcher {
    commands: Option<AhoCorasick>,
    affinity: Option<AhoCorasick>,
}

impl CommandMatcher {
    /// Build a matcher with the given affinity keyword list.
    pub fn new(affinity_keywords: &[String]) -> Self {
        let phrases: Vec<&str> = LIST_PHRASES
            .iter()
            .chain(SEARCH_PHRASES.iter())
            .copied()
            .collect();

        Self {
            commands: build_automaton(&phrases),
            affinity: if affinity_keywords.is_empty() {
                None
            } else {
                build_automaton(affinity_keywords)
            },
        }
    }

    /// Classify text as a catalog command, if it contains one.
    ///
    /// The leftmost command phrase wins. For search commands the term is
    /// whatever follows the phrase, with separators trimmed.
    pub fn classify(&self, text: &str) -> Option<CatalogCommand> {
        let automaton = self.commands.as_ref()?;
        let mat = automaton.find(text)?;

        if mat.pattern().as_usize() < LIST_PHRASES.len() {
            tracing::debug!("catalog list command detected");
            return Some(CatalogCommand::List);
        }

        let term = text[mat.end()..]
            .trim_start_matches([':', ' '])
            .trim()
            .to_owned();
        tracing::debug!(term = %term, "catalog search command detected");
        Some(CatalogCommand::Search { term })
    }

    /// Whether the text mentions any configured affinity keyword —
    /// wording that suggests a skill (rather than a generic handler)
    /// should take the query.
    pub fn has_skill_affinity(&self, text: &str) -> bool {
        self.affinity.as_ref().is_some_and(|a| a.is_match(text))
    }
}

fn build_automaton<P: AsRef<[u8]>>(patterns: &[P]) -> Option<AhoCorasick> {
    match AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostFirst)
        .build(patterns)
    {
        Ok(automaton) => Some(automaton),
        Err(e) => {
            tracing::error!(error = %e, "failed to build phrase automaton");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
