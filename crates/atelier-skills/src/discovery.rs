//! Bundle discovery — finds and parses skill bundles on the filesystem.
//!
//! A bundle is any directory containing a `SKILL.md` declaration file.
//! Discovery is a point-in-time scan, not a watch: call again to re-scan.
//! One bad bundle or one missing root never aborts a scan — per-bundle
//! failures are collected into the [`ScanReport`] side list.

use std::path::{Path, PathBuf};

use crate::error::{Result, SkillError};
use crate::parser::parse_declaration;
use crate::types::{ResourceFile, ScriptFile, ScriptInterpreter, SkillBundle};

/// The conventional declaration filename that identifies a bundle.
pub const DECLARATION_FILE: &str = "SKILL.md";

/// Subdirectory holding a bundle's executable scripts.
const SCRIPTS_DIR: &str = "scripts";

/// Subdirectory holding a bundle's resource files.
const RESOURCES_DIR: &str = "resources";

/// The outcome of scanning one or more roots: successfully parsed bundles
/// plus the per-bundle failures that were recovered along the way.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Bundles that parsed cleanly.
    pub bundles: Vec<SkillBundle>,

    /// Bundle directories that failed to parse, with the failure.
    pub failures: Vec<(PathBuf, SkillError)>,
}

/// Recursively find bundle directories under `root`.
///
/// Each directory containing a declaration file is yielded once, in
/// filesystem enumeration order (platform-dependent, not sorted). A missing
/// root is not an error: it yields nothing and logs a warning, since the
/// directory may legitimately not exist yet.
pub async fn find_bundles(root: &Path) -> Vec<PathBuf> {
    let mut bundles = Vec::new();

    match tokio::fs::try_exists(root).await {
        Ok(true) => {}
        _ => {
            tracing::warn!(path = %root.display(), "skills root not found, skipping");
            return bundles;
        }
    }

    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "cannot read directory");
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(path = %dir.display(), error = %e, "directory walk error");
                    break;
                }
            };

            let path = entry.path();
            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => pending.push(path),
                Ok(ft) if ft.is_file() => {
                    if entry.file_name() == DECLARATION_FILE {
                        bundles.push(dir.clone());
                    }
                }
                _ => {}
            }
        }
    }

    tracing::info!(root = %root.display(), count = bundles.len(), "bundles discovered");
    bundles
}

/// Parse one bundle directory into a [`SkillBundle`].
///
/// Reads the declaration file, then enumerates the conventional `scripts/`
/// subdirectory (non-recursive, recognized script types only) and the
/// `resources/` subdirectory (recursive, files only).
pub async fn parse_bundle(dir: &Path) -> Result<SkillBundle> {
    let declaration = dir.join(DECLARATION_FILE);

    let content = match tokio::fs::read_to_string(&declaration).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SkillError::BundleNotFound {
                path: dir.to_path_buf(),
            });
        }
        Err(e) => return Err(SkillError::Io(e)),
    };

    let (metadata, instructions) = parse_declaration(&content, &declaration)?;

    let scripts = enumerate_scripts(dir).await?;
    let resources = enumerate_resources(dir).await?;

    tracing::debug!(
        name = %metadata.name,
        scripts = scripts.len(),
        resources = resources.len(),
        "bundle parsed"
    );

    Ok(SkillBundle {
        metadata,
        instructions,
        scripts,
        resources,
    })
}

/// Scan multiple roots, concatenating results.
///
/// Failure scanning one root or parsing one bundle is isolated: the scan
/// continues and the failure lands in the report's side list.
pub async fn scan_roots(roots: &[PathBuf]) -> ScanReport {
    let mut report = ScanReport::default();

    for root in roots {
        for bundle_dir in find_bundles(root).await {
            match parse_bundle(&bundle_dir).await {
                Ok(bundle) => report.bundles.push(bundle),
                Err(e) => {
                    tracing::warn!(
                        path = %bundle_dir.display(),
                        error = %e,
                        "failed to parse bundle"
                    );
                    report.failures.push((bundle_dir, e));
                }
            }
        }
    }

    tracing::info!(
        loaded = report.bundles.len(),
        failed = report.failures.len(),
        "scan complete"
    );
    report
}

/// Enumerate the `scripts/` subdirectory: direct children only, files with
/// a recognized interpreter extension.
async fn enumerate_scripts(dir: &Path) -> Result<Vec<ScriptFile>> {
    let scripts_dir = dir.join(SCRIPTS_DIR);
    let mut scripts = Vec::new();

    if !tokio::fs::try_exists(&scripts_dir).await.unwrap_or(false) {
        return Ok(scripts);
    }

    let mut entries = tokio::fs::read_dir(&scripts_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() {
            continue;
        }

        let Some(interpreter) = ScriptInterpreter::from_path(&path) else {
            tracing::trace!(path = %path.display(), "not a recognized script type");
            continue;
        };

        scripts.push(ScriptFile {
            filename: entry.file_name().to_string_lossy().into_owned(),
            path,
            interpreter,
        });
    }

    Ok(scripts)
}

/// Enumerate the `resources/` subdirectory recursively: files only, keyed
/// by path relative to the resources root.
async fn enumerate_resources(dir: &Path) -> Result<Vec<ResourceFile>> {
    let resources_dir = dir.join(RESOURCES_DIR);
    let mut resources = Vec::new();

    if !tokio::fs::try_exists(&resources_dir).await.unwrap_or(false) {
        return Ok(resources);
    }

    let mut pending = vec![resources_dir.clone()];

    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let ft = entry.file_type().await?;
            if ft.is_dir() {
                pending.push(path);
            } else if ft.is_file() {
                let rel_path = path
                    .strip_prefix(&resources_dir)
                    .unwrap_or(&path)
                    .to_path_buf();
                resources.push(ResourceFile { rel_path, path });
            }
        }
    }

    Ok(resources)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_bundle(root: &Path, rel: &str, declaration: &str) -> PathBuf {
        let dir = root.join(rel);
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join(DECLARATION_FILE), declaration)
            .await
            .unwrap();
        dir
    }

    #[tokio::test]
    async fn find_bundles_walks_nested_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        write_bundle(tmp.path(), "a", "---\nname: a\n---\nbody").await;
        write_bundle(tmp.path(), "grouped/deep/b", "---\nname: b\n---\nbody").await;
        tokio::fs::create_dir_all(tmp.path().join("not-a-bundle"))
            .await
            .unwrap();

        let mut found = find_bundles(tmp.path()).await;
        found.sort();
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("a"));
        assert!(found[1].ends_with("grouped/deep/b"));
    }

    #[tokio::test]
    async fn missing_root_yields_empty() {
        let found = find_bundles(Path::new("/definitely/not/here")).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn parse_bundle_with_scripts_and_resources() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_bundle(
            tmp.path(),
            "notif",
            "---\nname: notifier\ndescription: Sends notifications.\ntags: [slack]\n---\nPing the channel.",
        )
        .await;

        let scripts = dir.join("scripts");
        tokio::fs::create_dir(&scripts).await.unwrap();
        tokio::fs::write(scripts.join("send.py"), "print('hi')")
            .await
            .unwrap();
        tokio::fs::write(scripts.join("notes.txt"), "not a script")
            .await
            .unwrap();

        let resources = dir.join("resources").join("templates");
        tokio::fs::create_dir_all(&resources).await.unwrap();
        tokio::fs::write(resources.join("report.md"), "# Report")
            .await
            .unwrap();

        let bundle = parse_bundle(&dir).await.unwrap();
        assert_eq!(bundle.metadata.name, "notifier");
        assert_eq!(bundle.metadata.path, dir);
        assert_eq!(bundle.script_names(), vec!["send.py"]);
        assert_eq!(
            bundle.scripts[0].interpreter,
            ScriptInterpreter::Python
        );
        assert_eq!(bundle.resource_names(), vec!["templates/report.md"]);
        assert_eq!(bundle.instructions, "Ping the channel.");
    }

    #[tokio::test]
    async fn scripts_enumeration_is_non_recursive() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_bundle(tmp.path(), "s", "---\nname: s\n---\nbody").await;

        let nested = dir.join("scripts").join("nested");
        tokio::fs::create_dir_all(&nested).await.unwrap();
        tokio::fs::write(dir.join("scripts").join("top.sh"), "echo hi")
            .await
            .unwrap();
        tokio::fs::write(nested.join("hidden.py"), "pass")
            .await
            .unwrap();

        let bundle = parse_bundle(&dir).await.unwrap();
        assert_eq!(bundle.script_names(), vec!["top.sh"]);
    }

    #[tokio::test]
    async fn missing_declaration_is_bundle_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("empty");
        tokio::fs::create_dir(&dir).await.unwrap();

        let err = parse_bundle(&dir).await.unwrap_err();
        assert!(matches!(err, SkillError::BundleNotFound { .. }));
    }

    #[tokio::test]
    async fn scan_isolates_malformed_bundles() {
        let tmp = tempfile::tempdir().unwrap();
        write_bundle(tmp.path(), "good", "---\nname: good\n---\nbody").await;
        write_bundle(tmp.path(), "bad", "---\nname: bad\nnever closed").await;

        let report = scan_roots(&[tmp.path().to_path_buf()]).await;
        assert_eq!(report.bundles.len(), 1);
        assert_eq!(report.bundles[0].metadata.name, "good");
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].0.ends_with("bad"));
        assert!(matches!(
            report.failures[0].1,
            SkillError::MalformedHeader { .. }
        ));
    }

    #[tokio::test]
    async fn scan_concatenates_roots_and_skips_missing() {
        let tmp_a = tempfile::tempdir().unwrap();
        let tmp_b = tempfile::tempdir().unwrap();
        write_bundle(tmp_a.path(), "one", "---\nname: one\n---\nbody").await;
        write_bundle(tmp_b.path(), "two", "---\nname: two\n---\nbody").await;

        let roots = vec![
            tmp_a.path().to_path_buf(),
            PathBuf::from("/nope/missing"),
            tmp_b.path().to_path_buf(),
        ];
        let report = scan_roots(&roots).await;
        assert_eq!(report.bundles.len(), 2);
        assert!(report.failures.is_empty());
    }
}
