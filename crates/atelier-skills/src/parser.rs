//! Declaration file parser.
//!
//! A skill declaration consists of:
//! 1. A key-value header fenced by `---` lines.
//! 2. A free-text body containing the skill's instructions.
//!
//! ```text
//! ---
//! name: notifier
//! description: Sends notifications to team channels.
//! version: 1.0.0
//! tags: [slack, linear]
//! dependencies:
//!   - requests
//! ---
//!
//! # Notifier
//!
//! Instructions for the skill go here...
//! ```
//!
//! Structural problems are hard failures: a missing or unclosed `---` fence
//! is [`SkillError::MalformedHeader`], and a header that does not decode as
//! key-value data is [`SkillError::InvalidHeaderSyntax`]. Field-level
//! problems degrade gracefully instead: a missing or wrong-typed `name`
//! falls back to `"unknown"`, a missing `description` to the empty string,
//! and unknown keys are ignored.

use std::path::Path;

use serde_json::Value;

use crate::error::{Result, SkillError};
use crate::types::SkillMetadata;

/// Fallback skill name when the header declares none.
const UNKNOWN_NAME: &str = "unknown";

/// Split a declaration into its fenced header and free-text body.
///
/// Returns `(header, body)`.
fn split_header(content: &str) -> Option<(&str, &str)> {
    let content = content.trim_start();

    if !content.starts_with("---") {
        return None;
    }

    let after_first = &content[3..];
    let end = after_first.find("\n---")?;
    let header = after_first[..end].trim();
    let body = after_first[end + 4..].trim_start_matches(['\n', '\r']);

    Some((header, body))
}

/// Parse a declaration file's text into metadata and instructions.
///
/// `declaration` is the path of the declaration file; the metadata's
/// provenance `path` is its parent bundle directory.
pub fn parse_declaration(content: &str, declaration: &Path) -> Result<(SkillMetadata, String)> {
    let (header, body) = match split_header(content) {
        Some(parts) => parts,
        None => {
            let reason = if content.trim_start().starts_with("---") {
                "header fence is never closed"
            } else {
                "document does not start with a `---` fence"
            };
            return Err(SkillError::MalformedHeader {
                path: declaration.to_path_buf(),
                reason: reason.into(),
            });
        }
    };

    let fields = decode_header(header).map_err(|reason| SkillError::InvalidHeaderSyntax {
        path: declaration.to_path_buf(),
        reason,
    })?;

    let bundle_dir = declaration.parent().unwrap_or(declaration);

    let name = match string_field(&fields, "name") {
        Some(name) => name,
        None => {
            tracing::debug!(
                path = %declaration.display(),
                "declaration has no usable `name`, defaulting"
            );
            UNKNOWN_NAME.to_owned()
        }
    };

    let metadata = SkillMetadata {
        name,
        description: string_field(&fields, "description").unwrap_or_default(),
        path: bundle_dir.to_path_buf(),
        version: string_field(&fields, "version"),
        author: string_field(&fields, "author"),
        tags: list_field(&fields, "tags"),
        dependencies: list_field(&fields, "dependencies"),
    };

    Ok((metadata, body.to_owned()))
}

/// Extract a string field, treating null/absent/wrong-typed values as absent.
fn string_field(fields: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Extract a string-list field, treating anything else as empty.
fn list_field(fields: &serde_json::Map<String, Value>, key: &str) -> Vec<String> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Header decoding
// ---------------------------------------------------------------------------

/// Decode the fenced header into a flat key-value map.
///
/// This handles the subset of YAML used by skill declarations: scalar
/// key-value pairs, block lists (`- item`), and inline flow lists
/// (`[a, b]`). Scalars always stay strings — the declaration schema has no
/// numeric or boolean fields, so `version: 1.0` and `version: "1.0"` decode
/// identically. Indented sub-blocks under unknown keys are skipped, which
/// is what makes unknown nested structures forward compatible.
fn decode_header(header: &str) -> std::result::Result<serde_json::Map<String, Value>, String> {
    if header.is_empty() {
        return Err("header is empty".into());
    }

    let lines: Vec<&str> = header.lines().collect();
    let mut fields = serde_json::Map::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            i += 1;
            continue;
        }

        let indent = indent_of(line);
        if indent > 0 {
            // Indented lines are only reachable here when an unknown key
            // opened a sub-block; skip_block consumes well-formed ones, so
            // a stray indented line means the document is not a flat map.
            return Err(format!("unexpected indented line: `{trimmed}`"));
        }

        if trimmed.starts_with("- ") || trimmed == "-" {
            return Err("header root is a list, expected a key-value map".into());
        }

        let Some(colon) = trimmed.find(':') else {
            return Err(format!("expected `key: value`, found `{trimmed}`"));
        };

        let key = trimmed[..colon].trim().to_owned();
        let rest = trimmed[colon + 1..].trim();

        if rest.is_empty() {
            // Block list, nested structure, or a bare `key:` with no value.
            let (value, next) = decode_block(&lines, i + 1);
            fields.insert(key, value);
            i = next;
        } else {
            fields.insert(key, decode_scalar(rest));
            i += 1;
        }
    }

    Ok(fields)
}

/// Decode the block following a `key:` line with no inline value.
///
/// Returns the decoded value and the index of the first line after the
/// block. A block of `- item` lines becomes a list; any other indented
/// block is an unknown nested structure and decodes to null (ignored by
/// the field extractors); no block at all is a null value.
fn decode_block(lines: &[&str], start: usize) -> (Value, usize) {
    let mut i = start;

    // Find the first non-blank, non-comment line.
    while i < lines.len() {
        let trimmed = lines[i].trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            break;
        }
        i += 1;
    }

    if i >= lines.len() || indent_of(lines[i]) == 0 {
        return (Value::Null, i);
    }

    let block_indent = indent_of(lines[i]);

    if lines[i].trim().starts_with("- ") || lines[i].trim() == "-" {
        let mut items = Vec::new();
        while i < lines.len() {
            let trimmed = lines[i].trim();
            if trimmed.is_empty() {
                i += 1;
                continue;
            }
            if indent_of(lines[i]) < block_indent || !trimmed.starts_with('-') {
                break;
            }
            let item = trimmed.trim_start_matches('-').trim();
            items.push(decode_scalar(item));
            i += 1;
        }
        return (Value::Array(items), i);
    }

    // Unknown nested structure: consume it and ignore it.
    while i < lines.len() {
        let trimmed = lines[i].trim();
        if !trimmed.is_empty() && indent_of(lines[i]) < block_indent {
            break;
        }
        i += 1;
    }
    (Value::Null, i)
}

/// Decode an inline scalar: a quoted or bare string, or a `[a, b]` flow
/// list.
fn decode_scalar(raw: &str) -> Value {
    let raw = raw.trim();

    if (raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2)
        || (raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2)
    {
        return Value::String(raw[1..raw.len() - 1].to_owned());
    }

    if raw.starts_with('[') && raw.ends_with(']') {
        let inner = raw[1..raw.len() - 1].trim();
        if inner.is_empty() {
            return Value::Array(Vec::new());
        }
        let items = inner
            .split(',')
            .map(|item| {
                let item = item.trim().trim_matches('"').trim_matches('\'');
                Value::String(item.to_owned())
            })
            .collect();
        return Value::Array(items);
    }

    // Strip a trailing comment from bare scalars.
    let raw = match raw.find(" #") {
        Some(pos) => raw[..pos].trim_end(),
        None => raw,
    };

    Value::String(raw.to_owned())
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(content: &str) -> Result<(SkillMetadata, String)> {
        parse_declaration(content, Path::new("/skills/test/SKILL.md"))
    }

    #[test]
    fn parse_full_declaration() {
        let content = r#"---
name: notifier
description: Sends notifications to team channels.
version: 1.2.0
author: ops-team
tags: [slack, linear]
dependencies:
  - requests
  - slack-sdk
---

# Notifier

Send updates when builds finish.
"#;

        let (metadata, instructions) = parse(content).unwrap();
        assert_eq!(metadata.name, "notifier");
        assert_eq!(metadata.description, "Sends notifications to team channels.");
        assert_eq!(metadata.version, Some("1.2.0".into()));
        assert_eq!(metadata.author, Some("ops-team".into()));
        assert_eq!(metadata.tags, vec!["slack", "linear"]);
        assert_eq!(metadata.dependencies, vec!["requests", "slack-sdk"]);
        assert_eq!(metadata.path, PathBuf::from("/skills/test"));
        assert!(instructions.contains("# Notifier"));
    }

    #[test]
    fn missing_optional_fields_default() {
        let (metadata, _) = parse("---\ndescription: no name here\n---\nbody").unwrap();
        assert_eq!(metadata.name, "unknown");

        let (metadata, _) = parse("---\nname: bare\n---\nbody").unwrap();
        assert_eq!(metadata.description, "");
        assert!(metadata.tags.is_empty());
        assert!(metadata.dependencies.is_empty());
        assert_eq!(metadata.version, None);
    }

    #[test]
    fn explicit_empty_name_defaults_too() {
        let (metadata, _) = parse("---\nname: \"\"\ndescription: d\n---\nbody").unwrap();
        assert_eq!(metadata.name, "unknown");
    }

    #[test]
    fn missing_opening_fence_is_malformed() {
        let err = parse("# Just markdown\nno header").unwrap_err();
        assert!(matches!(err, SkillError::MalformedHeader { .. }));
    }

    #[test]
    fn unclosed_fence_is_malformed() {
        let err = parse("---\nname: broken\ndescription: never closed\n").unwrap_err();
        assert!(matches!(err, SkillError::MalformedHeader { .. }));
    }

    #[test]
    fn empty_header_is_invalid_syntax() {
        let err = parse("---\n---\nbody").unwrap_err();
        assert!(matches!(err, SkillError::InvalidHeaderSyntax { .. }));
    }

    #[test]
    fn non_mapping_header_is_invalid_syntax() {
        let err = parse("---\njust a bare line\n---\nbody").unwrap_err();
        assert!(matches!(err, SkillError::InvalidHeaderSyntax { .. }));

        let err = parse("---\n- item\n- item\n---\nbody").unwrap_err();
        assert!(matches!(err, SkillError::InvalidHeaderSyntax { .. }));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let content = "---\nname: fwd\nemoji: sparkles\nhomepage: https://example.com\n---\nbody";
        let (metadata, _) = parse(content).unwrap();
        assert_eq!(metadata.name, "fwd");
    }

    #[test]
    fn unknown_nested_block_is_skipped() {
        let content = "---\nname: nested\nmetadata:\n  provider:\n    key: value\ntags:\n  - one\n---\nbody";
        let (metadata, _) = parse(content).unwrap();
        assert_eq!(metadata.name, "nested");
        assert_eq!(metadata.tags, vec!["one"]);
    }

    #[test]
    fn wrong_typed_fields_degrade() {
        // `tags` as a nested block and `name` as a bare key both fall back.
        let content = "---\nname:\ntags:\n  sub: structure\ndescription: still fine\n---\nbody";
        let (metadata, _) = parse(content).unwrap();
        assert_eq!(metadata.name, "unknown");
        assert!(metadata.tags.is_empty());
        assert_eq!(metadata.description, "still fine");
    }

    #[test]
    fn inline_list_forms() {
        let (metadata, _) =
            parse("---\nname: x\ntags: [\"a\", 'b', c]\ndependencies: []\n---\nbody").unwrap();
        assert_eq!(metadata.tags, vec!["a", "b", "c"]);
        assert!(metadata.dependencies.is_empty());
    }

    #[test]
    fn quoted_scalars_and_comments() {
        let content =
            "---\nname: 'quoted name'\n# a comment line\nversion: 2.0 # trailing note\n---\nbody";
        let (metadata, _) = parse(content).unwrap();
        assert_eq!(metadata.name, "quoted name");
        assert_eq!(metadata.version, Some("2.0".into()));
    }

    #[test]
    fn body_is_preserved_verbatim_after_fence() {
        let (_, instructions) = parse("---\nname: b\n---\nline one\n\nline two\n").unwrap();
        assert_eq!(instructions, "line one\n\nline two\n");
    }
}
