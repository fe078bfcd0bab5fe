//! QA dataset I/O, splitting, and prompt formatting.
//!
//! The dataset is JSON Lines of `{question, answer}`. Splitting uses a
//! seeded Fisher-Yates shuffle so a given seed always yields the same
//! train/test partition.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::models::{FormattedExample, QaPair};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("line {line}: malformed record: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: empty {field}")]
    EmptyField { line: usize, field: &'static str },
    #[error("dataset contains no records")]
    Empty,
}

/// Parse JSONL text into pairs. Blank lines are skipped; line numbers are 1-based.
pub fn parse_jsonl(content: &str) -> Result<Vec<QaPair>, DatasetError> {
    let mut pairs = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let pair: QaPair = serde_json::from_str(line).map_err(|source| DatasetError::Malformed {
            line: line_no,
            source,
        })?;
        if pair.question.trim().is_empty() {
            return Err(DatasetError::EmptyField {
                line: line_no,
                field: "question",
            });
        }
        if pair.answer.trim().is_empty() {
            return Err(DatasetError::EmptyField {
                line: line_no,
                field: "answer",
            });
        }
        pairs.push(pair);
    }
    Ok(pairs)
}

/// Load a non-empty dataset from disk.
pub fn load_dataset(path: &Path) -> Result<Vec<QaPair>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    parse_dataset(&content, path)
}

/// Parse dataset text already read from `origin`, rejecting an empty file.
pub fn parse_dataset(content: &str, origin: &Path) -> Result<Vec<QaPair>> {
    let pairs = parse_jsonl(content)
        .with_context(|| format!("Invalid dataset: {}", origin.display()))?;
    if pairs.is_empty() {
        return Err(DatasetError::Empty).with_context(|| origin.display().to_string());
    }
    Ok(pairs)
}

/// Write records as JSON Lines, creating parent directories.
pub fn write_jsonl<T: serde::Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Number of held-out samples for `total` records.
///
/// With at least two records both sides are non-empty.
pub fn test_size(total: usize, test_fraction: f64) -> usize {
    if total < 2 {
        return 0;
    }
    let n = ((total as f64) * test_fraction).round() as usize;
    n.clamp(1, total - 1)
}

/// Shuffle with `seed` and split into (train, test).
pub fn split_train_test<T>(mut samples: Vec<T>, test_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total = samples.len();
    let test = samples.split_off(total - test_size(total, test_fraction));

    tracing::debug!(train = samples.len(), test = test.len(), "dataset split");
    (samples, test)
}

/// Render a pair through a chat template with `{question}` / `{answer}` slots.
pub fn render_template(template: &str, question: &str, answer: &str) -> String {
    // Substitute the question last so an answer containing "{question}" is left alone
    template
        .replace("{answer}", answer)
        .replacen("{question}", question, 1)
}

/// The prompt half of the template: everything up to the `{answer}` slot.
pub fn prompt_prefix(template: &str, question: &str) -> String {
    let head = template.split("{answer}").next().unwrap_or(template);
    head.replace("{question}", question)
}

pub fn format_examples(pairs: &[QaPair], template: &str) -> Vec<FormattedExample> {
    pairs
        .iter()
        .map(|p| FormattedExample {
            question: p.question.clone(),
            answer: p.answer.clone(),
            text: render_template(template, &p.question, &p.answer),
        })
        .collect()
}
