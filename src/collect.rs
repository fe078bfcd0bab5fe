//! Harvest orchestration.
//!
//! Coordinates the collect flow: clone → scan each checkout → extract
//! chunks → append the knowledge text → write the chunk file. Per-file and
//! per-clone failures are logged and skipped.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{CollectConfig, Config};
use crate::connector_fs::{list_repo_dirs, scan_repo};
use crate::connector_git::clone_repos;
use crate::extract::{extract_file, read_lossy};
use crate::knowledge::{knowledge_chunks, GPFS_KNOWLEDGE};
use crate::models::{Chunk, ChunkKind};
use crate::progress::{CollectProgressEvent, CollectProgressReporter};

pub fn run_collect(
    config: &Config,
    skip_clone: bool,
    progress: &dyn CollectProgressReporter,
) -> Result<Vec<Chunk>> {
    let repos_dir = config.paths.repos_dir();

    if skip_clone {
        tracing::info!("skipping clone step");
    } else {
        let report = clone_repos(&config.collect.repos, &repos_dir, progress)?;
        println!(
            "clone: {} cloned, {} already present, {} failed",
            report.cloned.len(),
            report.skipped.len(),
            report.failed.len()
        );
    }

    let mut all_chunks = Vec::new();

    let repo_dirs = list_repo_dirs(&repos_dir)?;
    let total = repo_dirs.len() as u64;
    for (i, repo_dir) in repo_dirs.iter().enumerate() {
        let repo_name = repo_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        progress.report(CollectProgressEvent::Extracting {
            repo: repo_name.clone(),
            n: i as u64 + 1,
            total,
        });

        let chunks = harvest_repo(repo_dir, &repo_name, &config.collect)?;
        print_repo_counts(&repo_name, &chunks);
        progress.report(CollectProgressEvent::Extracted {
            repo: repo_name,
            chunks: chunks.len() as u64,
        });
        all_chunks.extend(chunks);
    }

    let knowledge = load_knowledge(&config.collect)?;
    let doc_chunks = knowledge_chunks(&knowledge, &config.collect.documentation);
    println!("knowledge: {} documentation sections", doc_chunks.len());
    all_chunks.extend(doc_chunks);

    let output = config.paths.chunks_file();
    write_chunks(&output, &all_chunks)?;

    println!("collect");
    println!("  total chunks: {}", all_chunks.len());
    println!("  saved to: {}", output.display());
    println!("ok");

    Ok(all_chunks)
}

/// Extract every harvestable chunk from one checkout, grouped by type
/// (markdown, then YAML, then docstrings).
pub fn harvest_repo(repo_dir: &Path, repo_name: &str, config: &CollectConfig) -> Result<Vec<Chunk>> {
    let files = scan_repo(repo_dir, config)?;

    let mut chunks = Vec::new();
    for file in &files {
        match extract_file(repo_name, file, config) {
            Ok(Some(chunk)) => chunks.push(chunk),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(file = %file.path.display(), error = %e, "skipping file");
            }
        }
    }

    // Stable sort keeps path order within each type
    chunks.sort_by_key(|c| c.kind);
    Ok(chunks)
}

fn print_repo_counts(repo_name: &str, chunks: &[Chunk]) {
    let mut counts: BTreeMap<ChunkKind, usize> = BTreeMap::new();
    for chunk in chunks {
        *counts.entry(chunk.kind).or_default() += 1;
    }
    let count = |kind| counts.get(&kind).copied().unwrap_or(0);
    println!("repo {}", repo_name);
    println!("  markdown files: {}", count(ChunkKind::Markdown));
    println!("  yaml configs: {}", count(ChunkKind::YamlConfig));
    println!("  code docstrings: {}", count(ChunkKind::PythonDocstring));
}

fn load_knowledge(config: &CollectConfig) -> Result<String> {
    match &config.knowledge_file {
        Some(path) => read_lossy(path)
            .with_context(|| format!("Failed to load knowledge file: {}", path.display())),
        None => Ok(GPFS_KNOWLEDGE.to_string()),
    }
}

pub fn write_chunks(path: &Path, chunks: &[Chunk]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(chunks)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write chunk file: {}", path.display()))?;
    Ok(())
}

pub fn read_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read chunk file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse chunk file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use std::fs;
    use tempfile::TempDir;

    fn seed_repo(root: &Path) {
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(
            root.join("README.md"),
            format!("# CSI driver\n\n{}", "Driver overview text. ".repeat(20)),
        )
        .unwrap();
        fs::write(
            root.join("docs/cr.yaml"),
            "apiVersion: csi.ibm.com/v1\nkind: CSIScaleOperator\nmetadata:\n  name: ibm-spectrum-scale-csi\n",
        )
        .unwrap();
        fs::write(
            root.join("tool.py"),
            "\"\"\"Helpers that talk to the Spectrum Scale GUI REST API for tests.\"\"\"\n",
        )
        .unwrap();
    }

    #[test]
    fn harvest_groups_by_type() {
        let tmp = TempDir::new().unwrap();
        seed_repo(tmp.path());

        let chunks = harvest_repo(tmp.path(), "csi", &CollectConfig::default()).unwrap();
        let kinds: Vec<ChunkKind> = chunks.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ChunkKind::Markdown, ChunkKind::YamlConfig, ChunkKind::PythonDocstring]
        );
        assert_eq!(chunks[1].source, "csi/docs/cr.yaml");
    }

    #[test]
    fn run_collect_without_network() {
        let tmp = TempDir::new().unwrap();
        let data_dir = tmp.path().join("data");
        seed_repo(&data_dir.join("repos").join("csi"));

        let mut config = Config::default();
        config.paths.data_dir = data_dir.clone();
        config.collect.repos.clear();

        let chunks = run_collect(&config, false, &NoProgress).unwrap();
        // 3 harvested + 3 knowledge sections
        assert_eq!(chunks.len(), 6);

        let written = read_chunks(&config.paths.chunks_file()).unwrap();
        assert_eq!(written, chunks);
        for chunk in &written {
            let cap = match chunk.kind {
                ChunkKind::Markdown => config.collect.markdown.max_chars,
                ChunkKind::YamlConfig => config.collect.yaml.max_chars,
                ChunkKind::PythonDocstring => config.collect.docstring.max_chars,
                ChunkKind::Documentation => config.collect.documentation.max_chars,
            };
            assert!(chunk.content.chars().count() <= cap);
        }
    }

    #[test]
    fn knowledge_file_overrides_builtin() {
        let tmp = TempDir::new().unwrap();
        let knowledge = tmp.path().join("notes.md");
        fs::write(&knowledge, "## One\nalpha\n## Two\nbeta\n").unwrap();

        let mut config = Config::default();
        config.paths.data_dir = tmp.path().join("data");
        config.collect.repos.clear();
        config.collect.knowledge_file = Some(knowledge);

        let chunks = run_collect(&config, true, &NoProgress).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "## One\nalpha");
    }
}
