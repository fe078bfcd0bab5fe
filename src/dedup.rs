//! Question deduplication.
//!
//! The first occurrence of each key wins, so callers control priority by
//! ordering their input.

use std::collections::HashSet;

use crate::config::DedupConfig;
use crate::models::QaPair;

/// How two questions are judged equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Lowercased, whitespace-collapsed, trailing `?`/`.` trimmed; compared in full.
    Normalized,
    /// First `n` characters of the lowercased question.
    Prefix(usize),
}

impl DedupPolicy {
    pub fn from_config(config: &DedupConfig) -> DedupPolicy {
        match config.policy.as_str() {
            "prefix" => DedupPolicy::Prefix(config.chars),
            _ => DedupPolicy::Normalized,
        }
    }

    pub fn key(&self, question: &str) -> String {
        let lower = question.to_lowercase();
        match self {
            DedupPolicy::Normalized => lower
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .trim_end_matches(['?', '.'])
                .trim_end()
                .to_string(),
            DedupPolicy::Prefix(n) => lower.chars().take(*n).collect(),
        }
    }
}

/// Drop pairs whose key was already seen.
pub fn dedup_pairs(pairs: Vec<QaPair>, policy: DedupPolicy) -> Vec<QaPair> {
    let mut seen = HashSet::new();
    pairs
        .into_iter()
        .filter(|pair| seen.insert(policy.key(&pair.question)))
        .collect()
}

/// Number of pairs that share a key with an earlier pair.
pub fn count_collisions(pairs: &[QaPair], policy: DedupPolicy) -> usize {
    let mut seen = HashSet::new();
    pairs
        .iter()
        .filter(|pair| !seen.insert(policy.key(&pair.question)))
        .count()
}
