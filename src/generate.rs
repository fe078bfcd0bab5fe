//! Dataset generation: curated pairs + templated pairs → deduplicated JSONL.

use anyhow::Result;

use crate::collect::read_chunks;
use crate::config::{Config, GenerateConfig};
use crate::curated::{curated_pairs, load_curated_file};
use crate::dataset::write_jsonl;
use crate::dedup::{dedup_pairs, DedupPolicy};
use crate::extract::truncate_chars;
use crate::models::{Chunk, ChunkKind, QaPair};
use crate::templates::{qa_from_markdown, qa_from_yaml};

/// Pair counts by origin, before deduplication.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerateCounts {
    pub curated: usize,
    pub markdown: usize,
    pub yaml: usize,
    pub incomplete: usize,
    pub unique: usize,
}

/// Build the deduplicated pair list from curated pairs and harvested chunks.
///
/// Order is curated, then markdown, then YAML; earlier pairs win dedup.
pub fn build_pairs(
    curated: Vec<QaPair>,
    chunks: &[Chunk],
    config: &GenerateConfig,
) -> (Vec<QaPair>, GenerateCounts) {
    let mut counts = GenerateCounts {
        curated: curated.len(),
        ..GenerateCounts::default()
    };
    let mut all = curated;

    for chunk in chunks.iter().filter(|c| c.kind == ChunkKind::Markdown) {
        let pairs = qa_from_markdown(&chunk.content, &chunk.source, config);
        counts.markdown += pairs.len();
        all.extend(pairs);
    }

    for chunk in chunks
        .iter()
        .take(config.yaml_window)
        .filter(|c| c.kind == ChunkKind::YamlConfig)
    {
        if let Some(pair) = qa_from_yaml(&chunk.content, config) {
            counts.yaml += 1;
            all.push(pair);
        }
    }

    let before = all.len();
    all.retain(QaPair::is_complete);
    counts.incomplete = before - all.len();

    let unique = dedup_pairs(all, DedupPolicy::from_config(&config.dedup));
    counts.unique = unique.len();
    (unique, counts)
}

pub fn run_generate(config: &Config) -> Result<Vec<QaPair>> {
    let chunks = read_chunks(&config.paths.chunks_file())?;

    let mut curated = curated_pairs();
    if let Some(path) = &config.generate.curated_file {
        let extra = load_curated_file(path)?;
        tracing::info!(count = extra.len(), path = %path.display(), "loaded curated file");
        curated.extend(extra);
    }

    let (pairs, counts) = build_pairs(curated, &chunks, &config.generate);
    if counts.incomplete > 0 {
        tracing::warn!(count = counts.incomplete, "dropped pairs with empty question or answer");
    }

    let output = &config.paths.dataset_file;
    write_jsonl(output, &pairs)?;

    println!("generate");
    println!("  curated pairs: {}", counts.curated);
    println!("  markdown pairs: {}", counts.markdown);
    println!("  yaml pairs: {}", counts.yaml);
    println!("  unique pairs: {}", counts.unique);
    println!("  saved to: {}", output.display());

    println!();
    println!("Sample pairs:");
    for pair in pairs.iter().take(3) {
        println!();
        println!("Q: {}", pair.question);
        println!("A: {}...", truncate_chars(&pair.answer, 200));
    }

    Ok(pairs)
}
