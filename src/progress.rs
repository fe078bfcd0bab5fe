//! Collect progress reporting.
//!
//! Reports observable progress during `gpfs-tune collect` so users see which
//! repository is being cloned or harvested and how many remain. Progress is
//! emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for collect.
#[derive(Clone, Debug)]
pub enum CollectProgressEvent {
    /// A shallow clone is starting for this repository.
    Cloning { repo: String },
    /// Repository `n` of `total` is being harvested.
    Extracting { repo: String, n: u64, total: u64 },
    /// Harvesting for one repository finished with this many chunks.
    Extracted { repo: String, chunks: u64 },
}

/// Reports collect progress. Implementations write to stderr (human or JSON).
pub trait CollectProgressReporter: Send + Sync {
    fn report(&self, event: CollectProgressEvent);
}

/// Human-friendly progress on stderr: "collect  extracting  2 / 4  ibm-spectrum-scale-csi".
pub struct StderrProgress;

impl CollectProgressReporter for StderrProgress {
    fn report(&self, event: CollectProgressEvent) {
        let line = match &event {
            CollectProgressEvent::Cloning { repo } => {
                format!("collect  cloning  {}\n", repo)
            }
            CollectProgressEvent::Extracting { repo, n, total } => {
                format!(
                    "collect  extracting  {} / {}  {}\n",
                    format_number(*n),
                    format_number(*total),
                    repo
                )
            }
            CollectProgressEvent::Extracted { repo, chunks } => {
                format!("collect  {}  {} chunks\n", repo, format_number(*chunks))
            }
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl CollectProgressReporter for JsonProgress {
    fn report(&self, event: CollectProgressEvent) {
        let obj = match &event {
            CollectProgressEvent::Cloning { repo } => serde_json::json!({
                "event": "progress",
                "phase": "cloning",
                "repo": repo
            }),
            CollectProgressEvent::Extracting { repo, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "extracting",
                "repo": repo,
                "n": n,
                "total": total
            }),
            CollectProgressEvent::Extracted { repo, chunks } => serde_json::json!({
                "event": "progress",
                "phase": "extracted",
                "repo": repo,
                "chunks": chunks
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl CollectProgressReporter for NoProgress {
    fn report(&self, _event: CollectProgressEvent) {}
}

pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn CollectProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
