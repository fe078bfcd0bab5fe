//! Git connector: shallow clones of the source repositories.
//!
//! Each URL is cloned with `git clone --depth 1` into `<repos_dir>/<name>`.
//! Existing checkouts are left alone, and a failed clone is recorded in the
//! [`CloneReport`] without stopping the others.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::progress::{CollectProgressEvent, CollectProgressReporter};

/// Outcome of cloning the configured repositories.
#[derive(Debug, Default)]
pub struct CloneReport {
    pub cloned: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Directory name for a repository URL: last path segment without `.git`.
pub fn repo_name(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed);
    last.trim_end_matches(".git").to_string()
}

/// Shallow-clone every URL into `repos_dir/<name>`.
///
/// Existing checkouts are left untouched. A failed clone is logged and
/// recorded in the report; the remaining URLs are still attempted.
pub fn clone_repos(
    urls: &[String],
    repos_dir: &Path,
    progress: &dyn CollectProgressReporter,
) -> Result<CloneReport> {
    std::fs::create_dir_all(repos_dir)
        .with_context(|| format!("Failed to create repos directory: {}", repos_dir.display()))?;

    let mut report = CloneReport::default();

    for url in urls {
        let name = repo_name(url);
        let dest: PathBuf = repos_dir.join(&name);

        if dest.exists() {
            tracing::info!(repo = %name, "already cloned, skipping");
            report.skipped.push(name);
            continue;
        }

        progress.report(CollectProgressEvent::Cloning { repo: name.clone() });
        match git_clone(url, &dest) {
            Ok(()) => {
                tracing::info!(repo = %name, "cloned");
                report.cloned.push(name);
            }
            Err(e) => {
                tracing::warn!(repo = %name, error = %e, "clone failed");
                // A partial checkout would be mistaken for a finished one next run
                let _ = std::fs::remove_dir_all(&dest);
                report.failed.push((name, e.to_string()));
            }
        }
    }

    Ok(report)
}

fn git_clone(url: &str, dest: &Path) -> Result<()> {
    let output = Command::new("git")
        .args(["clone", "--depth", "1"])
        .arg(url)
        .arg(dest)
        .output()
        .with_context(|| "Failed to execute 'git clone'. Is git installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git clone failed: {}", stderr.trim());
    }

    Ok(())
}
