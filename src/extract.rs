//! Text extraction from repository files into [`Chunk`]s.
//!
//! Each file kind has a keep threshold and a truncation cap (see
//! [`Limits`]). Truncation counts Unicode scalar values, so a cap never
//! splits a code point.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::{CollectConfig, Limits};
use crate::connector_fs::{FileKind, RepoFile};
use crate::models::{Chunk, ChunkKind};

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Read a file as UTF-8, replacing invalid sequences.
pub fn read_lossy(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extract a chunk from one repository file, or `None` if it is too short.
pub fn extract_file(repo_name: &str, file: &RepoFile, config: &CollectConfig) -> Result<Option<Chunk>> {
    let content = read_lossy(&file.path)?;
    let source = format!("{}/{}", repo_name, file.relative);

    let chunk = match file.kind {
        FileKind::Markdown => keep(source, ChunkKind::Markdown, &content, &config.markdown),
        FileKind::Yaml => keep(source, ChunkKind::YamlConfig, &content, &config.yaml),
        FileKind::Python => module_docstring(&content)
            .and_then(|doc| keep(source, ChunkKind::PythonDocstring, doc, &config.docstring)),
    };
    Ok(chunk)
}

/// Apply the keep threshold to the trimmed text, then truncate the raw text.
fn keep(source: String, kind: ChunkKind, content: &str, limits: &Limits) -> Option<Chunk> {
    if content.trim().chars().count() <= limits.min_chars {
        return None;
    }
    Some(Chunk {
        source,
        kind,
        content: truncate_chars(content, limits.max_chars).to_string(),
    })
}

/// Module docstring of a Python file: the file must open with a triple quote.
pub fn module_docstring(content: &str) -> Option<&str> {
    let delim = if content.starts_with("\"\"\"") {
        "\"\"\""
    } else if content.starts_with("'''") {
        "'''"
    } else {
        return None;
    };
    let rest = &content[3..];
    let end = rest.find(delim)?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo_file(dir: &Path, rel: &str, body: &str) -> RepoFile {
        let path = dir.join(rel);
        fs::write(&path, body).unwrap();
        RepoFile {
            kind: FileKind::from_path(&path).unwrap(),
            path,
            relative: rel.to_string(),
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
    }

    #[test]
    fn docstring_double_and_single_quotes() {
        assert_eq!(module_docstring("\"\"\"Hello.\"\"\"\nimport os"), Some("Hello."));
        assert_eq!(module_docstring("'''Hi'''"), Some("Hi"));
        assert_eq!(module_docstring("import os\n\"\"\"late\"\"\""), None);
        assert_eq!(module_docstring("\"\"\"never closed"), None);
        // A mismatched closing delimiter does not end the docstring
        assert_eq!(module_docstring("'''a\"\"\"b'''"), Some("a\"\"\"b"));
    }

    #[test]
    fn markdown_truncated_to_cap() {
        let tmp = TempDir::new().unwrap();
        let body = "# Title\n\n".to_string() + &"word ".repeat(3000);
        let file = repo_file(tmp.path(), "README.md", &body);
        let config = CollectConfig::default();

        let chunk = extract_file("repo", &file, &config).unwrap().unwrap();
        assert_eq!(chunk.kind, ChunkKind::Markdown);
        assert_eq!(chunk.source, "repo/README.md");
        assert_eq!(chunk.content.chars().count(), config.markdown.max_chars);
    }

    #[test]
    fn short_files_are_dropped() {
        let tmp = TempDir::new().unwrap();
        let config = CollectConfig::default();

        let md = repo_file(tmp.path(), "short.md", "# Tiny\n\nNot much here.");
        assert!(extract_file("repo", &md, &config).unwrap().is_none());

        let yaml = repo_file(tmp.path(), "a.yaml", "kind: Pod\n");
        assert!(extract_file("repo", &yaml, &config).unwrap().is_none());

        let py = repo_file(tmp.path(), "a.py", "\"\"\"short\"\"\"\n");
        assert!(extract_file("repo", &py, &config).unwrap().is_none());
    }

    #[test]
    fn python_docstring_extracted() {
        let tmp = TempDir::new().unwrap();
        let doc = "Test automation for the Spectrum Scale CSI operator using pytest fixtures.";
        let py = repo_file(tmp.path(), "conftest.py", &format!("\"\"\"{}\"\"\"\nimport pytest\n", doc));

        let chunk = extract_file("csi", &py, &CollectConfig::default()).unwrap().unwrap();
        assert_eq!(chunk.kind, ChunkKind::PythonDocstring);
        assert_eq!(chunk.content, doc);
    }

    #[test]
    fn invalid_utf8_is_read_lossily() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.yaml");
        let mut bytes = b"kind: StorageClass\nprovisioner: spectrumscale.csi.ibm.com\n".to_vec();
        bytes.push(0xff);
        fs::write(&path, &bytes).unwrap();
        let file = RepoFile {
            path,
            relative: "bad.yaml".to_string(),
            kind: FileKind::Yaml,
        };
        let chunk = extract_file("csi", &file, &CollectConfig::default()).unwrap().unwrap();
        assert!(chunk.content.contains('\u{FFFD}'));
    }
}
