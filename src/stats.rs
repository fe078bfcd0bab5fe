//! Chunk-file and dataset statistics.
//!
//! Gives a quick summary of what was harvested and generated: chunk counts
//! per type and per repository, dataset size, mean field lengths, and a
//! dedup collision check. Used by `gpfs-tune stats` to confirm each stage
//! produced what it should.

use anyhow::Result;
use std::collections::BTreeMap;

use crate::collect::read_chunks;
use crate::config::Config;
use crate::dataset::load_dataset;
use crate::dedup::{count_collisions, DedupPolicy};
use crate::models::{Chunk, ChunkKind, QaPair};
use crate::progress::format_number;

#[derive(Debug, Default, PartialEq)]
pub struct ChunkStats {
    pub total: usize,
    pub total_chars: usize,
    pub by_kind: BTreeMap<ChunkKind, usize>,
    pub by_repo: BTreeMap<String, usize>,
}

impl ChunkStats {
    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        let mut stats = ChunkStats::default();
        for chunk in chunks {
            stats.total += 1;
            stats.total_chars += chunk.content.chars().count();
            *stats.by_kind.entry(chunk.kind).or_default() += 1;
            *stats.by_repo.entry(chunk.repo().to_string()).or_default() += 1;
        }
        stats
    }
}

#[derive(Debug, PartialEq)]
pub struct DatasetStats {
    pub pairs: usize,
    pub mean_question_chars: f64,
    pub mean_answer_chars: f64,
    pub collisions: usize,
}

impl DatasetStats {
    pub fn from_pairs(pairs: &[QaPair], policy: DedupPolicy) -> Self {
        let n = pairs.len().max(1) as f64;
        let q: usize = pairs.iter().map(|p| p.question.chars().count()).sum();
        let a: usize = pairs.iter().map(|p| p.answer.chars().count()).sum();
        DatasetStats {
            pairs: pairs.len(),
            mean_question_chars: q as f64 / n,
            mean_answer_chars: a as f64 / n,
            collisions: count_collisions(pairs, policy),
        }
    }
}

/// Run the stats command: read both stage outputs and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let chunks_path = config.paths.chunks_file();
    let dataset_path = &config.paths.dataset_file;

    println!("GPFS Tune — Stats");
    println!("=================");
    println!();
    println!("  Chunks:   {}", chunks_path.display());

    if chunks_path.exists() {
        let stats = ChunkStats::from_chunks(&read_chunks(&chunks_path)?);
        println!("  Total:    {}", format_number(stats.total as u64));
        println!("  Size:     {}", format_chars(stats.total_chars));
        println!();
        println!("  By type:");
        for kind in ChunkKind::ALL {
            let count = stats.by_kind.get(&kind).copied().unwrap_or(0);
            println!("  {:<24} {:>8}", kind.as_str(), count);
        }
        if !stats.by_repo.is_empty() {
            println!();
            println!("  By source:");
            println!("  {:<48} {:>8}", "SOURCE", "CHUNKS");
            println!("  {}", "-".repeat(57));
            for (repo, count) in &stats.by_repo {
                println!("  {:<48} {:>8}", repo, count);
            }
        }
    } else {
        println!("  not found (run `gpfs-tune collect`)");
    }

    println!();
    println!("  Dataset:  {}", dataset_path.display());
    if dataset_path.exists() {
        let policy = DedupPolicy::from_config(&config.generate.dedup);
        let stats = DatasetStats::from_pairs(&load_dataset(dataset_path)?, policy);
        println!("  Pairs:    {}", format_number(stats.pairs as u64));
        println!("  Mean question length: {:.1} chars", stats.mean_question_chars);
        println!("  Mean answer length:   {:.1} chars", stats.mean_answer_chars);
        println!("  Dedup collisions:     {}", stats.collisions);
    } else {
        println!("  not found (run `gpfs-tune generate`)");
    }
    println!();

    Ok(())
}

/// Format a character count as a human-readable string.
fn format_chars(chars: usize) -> String {
    if chars < 1000 {
        format!("{} chars", chars)
    } else if chars < 1_000_000 {
        format!("{:.1}K chars", chars as f64 / 1000.0)
    } else {
        format!("{:.2}M chars", chars as f64 / 1_000_000.0)
    }
}
