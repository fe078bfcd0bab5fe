//! Fine-tuning run preparation and launch.
//!
//! `prepare` splits the dataset, renders both halves through the chat
//! template, and writes a [`TrainingPlan`] manifest. `finetune` then hands
//! that manifest to an external trainer command, which owns quantized model
//! loading, the LoRA adapter, and the optimisation loop.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use uuid::Uuid;

use crate::config::{Config, FinetuneConfig, LoraConfig, QuantizationConfig, TrainingConfig};
use crate::dataset::{format_examples, parse_dataset, prompt_prefix, split_train_test, write_jsonl};

pub const PLAN_FILE: &str = "training_plan.json";

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no trainer launcher configured (set finetune.launcher)")]
    NotConfigured,
    #[error("failed to start trainer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("trainer exited with {}", exit_description(.code))]
    Failed { code: Option<i32> },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "a signal".to_string(),
    }
}

/// Manifest consumed by the external trainer.
#[derive(Debug, Serialize)]
pub struct TrainingPlan {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub base_model: String,
    pub quantization: QuantizationConfig,
    pub lora: LoraConfig,
    pub training: TrainingConfig,
    pub chat_template: String,
    pub dataset: DatasetSummary,
    pub output_dir: PathBuf,
    pub final_model_dir: PathBuf,
    pub evaluation: Vec<EvalPrompt>,
}

#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    pub source: PathBuf,
    pub sha256: String,
    pub total: usize,
    pub train_file: PathBuf,
    pub train_count: usize,
    pub test_file: PathBuf,
    pub test_count: usize,
    pub seed: u64,
    pub test_fraction: f64,
}

/// A question asked before and after training, with its rendered prompt.
#[derive(Debug, Serialize)]
pub struct EvalPrompt {
    pub question: String,
    pub prompt: String,
}

/// Split, format, and write the training inputs. Returns the plan and its path.
pub fn prepare(config: &Config) -> Result<(TrainingPlan, PathBuf)> {
    let ft = &config.finetune;
    let dataset_path = &config.paths.dataset_file;

    let start = Instant::now();
    let bytes = std::fs::read(dataset_path)
        .with_context(|| format!("Failed to read dataset: {}", dataset_path.display()))?;
    let sha256 = sha256_hex(&bytes);
    let content = String::from_utf8(bytes)
        .with_context(|| format!("Dataset is not UTF-8: {}", dataset_path.display()))?;
    let pairs = parse_dataset(&content, dataset_path)?;
    let total = pairs.len();
    tracing::info!(records = total, elapsed_ms = start.elapsed().as_millis() as u64, "dataset loaded");

    let (train, test) = split_train_test(pairs, ft.test_fraction, ft.seed);

    let train_file = ft.output_dir.join("train.jsonl");
    let test_file = ft.output_dir.join("test.jsonl");
    write_jsonl(&train_file, &format_examples(&train, &ft.chat_template))?;
    write_jsonl(&test_file, &format_examples(&test, &ft.chat_template))?;

    let plan = build_plan(
        ft,
        DatasetSummary {
            source: dataset_path.clone(),
            sha256,
            total,
            train_file,
            train_count: train.len(),
            test_file,
            test_count: test.len(),
            seed: ft.seed,
            test_fraction: ft.test_fraction,
        },
    );

    let plan_path = ft.output_dir.join(PLAN_FILE);
    let json = serde_json::to_string_pretty(&plan)?;
    std::fs::write(&plan_path, json)
        .with_context(|| format!("Failed to write plan: {}", plan_path.display()))?;

    println!("prepare");
    println!("  run id: {}", plan.run_id);
    println!("  training samples: {}", plan.dataset.train_count);
    println!("  test samples: {}", plan.dataset.test_count);
    println!("  plan: {}", plan_path.display());

    Ok((plan, plan_path))
}

pub fn build_plan(ft: &FinetuneConfig, dataset: DatasetSummary) -> TrainingPlan {
    let evaluation = ft
        .eval_questions
        .iter()
        .map(|q| EvalPrompt {
            question: q.clone(),
            prompt: prompt_prefix(&ft.chat_template, q),
        })
        .collect();

    TrainingPlan {
        run_id: Uuid::new_v4(),
        created_at: Utc::now(),
        base_model: ft.model.clone(),
        quantization: ft.quantization.clone(),
        lora: ft.lora.clone(),
        training: ft.training.clone(),
        chat_template: ft.chat_template.clone(),
        dataset,
        output_dir: ft.output_dir.clone(),
        final_model_dir: ft.output_dir.join("final"),
        evaluation,
    }
}

/// Prepare, then run the configured trainer on the plan.
pub async fn run_finetune(config: &Config, dry_run: bool) -> Result<()> {
    let (plan, plan_path) = prepare(config)?;

    if dry_run {
        println!("finetune (dry-run): trainer not launched");
        return Ok(());
    }

    let start = Instant::now();
    launch(&config.finetune.launcher, &plan_path).await?;

    println!("finetune");
    println!("  training completed in {:.1}s", start.elapsed().as_secs_f64());
    println!("  model: {}", plan.final_model_dir.display());
    println!("ok");
    Ok(())
}

/// Spawn `launcher` with `plan_path` appended, streaming its output into the log.
pub async fn launch(launcher: &[String], plan_path: &Path) -> Result<(), LaunchError> {
    let (program, args) = launcher.split_first().ok_or(LaunchError::NotConfigured)?;

    tracing::info!(program = %program, plan = %plan_path.display(), "launching trainer");
    let mut child = Command::new(program)
        .args(args)
        .arg(plan_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            program: program.clone(),
            source,
        })?;

    let stdout = child.stdout.take().map(|out| {
        tokio::spawn(async move {
            let mut lines = BufReader::new(out).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::info!(target: "gpfs_tune::trainer", "{}", line);
            }
        })
    });
    let stderr = child.stderr.take().map(|err| {
        tokio::spawn(async move {
            let mut lines = BufReader::new(err).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::info!(target: "gpfs_tune::trainer", stream = "stderr", "{}", line);
            }
        })
    });

    let status = child.wait().await.map_err(|source| LaunchError::Spawn {
        program: program.clone(),
        source,
    })?;
    for task in [stdout, stderr].into_iter().flatten() {
        let _ = task.await;
    }

    if !status.success() {
        return Err(LaunchError::Failed {
            code: status.code(),
        });
    }
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
