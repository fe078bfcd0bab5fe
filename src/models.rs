//! Core data models shared by the collect, generate, and finetune stages.
//!
//! These are the only records that cross stage boundaries. Chunks are written
//! as one pretty-printed JSON array, QA pairs as JSON Lines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of harvested text. Serialized in snake_case (`yaml_config`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Markdown,
    YamlConfig,
    PythonDocstring,
    Documentation,
}

impl ChunkKind {
    pub const ALL: [ChunkKind; 4] = [
        ChunkKind::Markdown,
        ChunkKind::YamlConfig,
        ChunkKind::PythonDocstring,
        ChunkKind::Documentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Markdown => "markdown",
            ChunkKind::YamlConfig => "yaml_config",
            ChunkKind::PythonDocstring => "python_docstring",
            ChunkKind::Documentation => "documentation",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One harvested unit of text with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `<repo>/<relative path>` for harvested files, a fixed label otherwise.
    pub source: String,
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    pub content: String,
}

impl Chunk {
    /// Repository name portion of `source` (everything before the first `/`).
    pub fn repo(&self) -> &str {
        self.source.split('/').next().unwrap_or(&self.source)
    }
}

/// One synthesized training example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// True when both fields carry non-whitespace text.
    pub fn is_complete(&self) -> bool {
        !self.question.trim().is_empty() && !self.answer.trim().is_empty()
    }
}

/// A QA pair rendered through the chat template, as handed to the trainer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedExample {
    pub question: String,
    pub answer: String,
    pub text: String,
}
