//! # GPFS Tune
//!
//! Builds a question/answer fine-tuning dataset about IBM Storage Scale
//! (GPFS) and prepares LoRA training runs on it.
//!
//! The pipeline is three linear stages coupled only by files:
//!
//! ```text
//! ┌──────────────┐   chunks.json   ┌──────────────┐   dataset.jsonl   ┌──────────────┐
//! │   collect    │────────────────▶│   generate   │──────────────────▶│   finetune   │
//! │ clone + walk │                 │ curated+rules│                   │ split + plan │
//! └──────────────┘                 └──────────────┘                   └──────┬───────┘
//!                                                                            ▼
//!                                                                   external trainer
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! gpfs-tune collect          # clone repos, harvest markdown/YAML/docstrings
//! gpfs-tune generate         # template Q&A pairs, dedup, write JSONL
//! gpfs-tune finetune         # split 80/20, write plan, launch trainer
//! gpfs-tune stats            # inspect both outputs
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Chunk and QA pair records |
//! | [`connector_git`] | Shallow repository cloning |
//! | [`connector_fs`] | Checkout scanning |
//! | [`extract`] | Per-type text extraction and truncation |
//! | [`knowledge`] | Built-in diagnostics knowledge text |
//! | [`collect`] | Harvest stage |
//! | [`curated`] | Hand-written QA pairs |
//! | [`templates`] | Header and YAML question rules |
//! | [`dedup`] | Question deduplication policies |
//! | [`generate`] | Templating stage |
//! | [`dataset`] | JSONL I/O, splitting, prompt formatting |
//! | [`finetune`] | Training plan and trainer launch |
//! | [`stats`] | Output summaries |
//! | [`progress`] | Collect progress reporting |

pub mod collect;
pub mod config;
pub mod connector_fs;
pub mod connector_git;
pub mod curated;
pub mod dataset;
pub mod dedup;
pub mod extract;
pub mod finetune;
pub mod generate;
pub mod knowledge;
pub mod models;
pub mod progress;
pub mod stats;
pub mod templates;
