use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub collect: CollectConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
    #[serde(default)]
    pub finetune: FinetuneConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Clone destination. Defaults to `<data_dir>/repos`.
    #[serde(default)]
    pub repos_dir: Option<PathBuf>,
    /// Harvest output. Defaults to `<data_dir>/extracted/gpfs_chunks.json`.
    #[serde(default)]
    pub chunks_file: Option<PathBuf>,
    #[serde(default = "default_dataset_file")]
    pub dataset_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            repos_dir: None,
            chunks_file: None,
            dataset_file: default_dataset_file(),
        }
    }
}

impl PathsConfig {
    pub fn repos_dir(&self) -> PathBuf {
        self.repos_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("repos"))
    }

    pub fn chunks_file(&self) -> PathBuf {
        self.chunks_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("extracted").join("gpfs_chunks.json"))
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("gpfs_data")
}
fn default_dataset_file() -> PathBuf {
    PathBuf::from("gpfs_dataset.jsonl")
}

/// Per-type keep threshold and truncation cap, both in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub min_chars: usize,
    pub max_chars: usize,
}

/// A `[collect.<type>]` table; absent keys keep that type's defaults.
#[derive(Debug, Deserialize)]
struct LimitsOverride {
    min_chars: Option<usize>,
    max_chars: Option<usize>,
}

impl LimitsOverride {
    fn over(self, base: Limits) -> Limits {
        Limits {
            min_chars: self.min_chars.unwrap_or(base.min_chars),
            max_chars: self.max_chars.unwrap_or(base.max_chars),
        }
    }
}

fn markdown_limits<'de, D: Deserializer<'de>>(d: D) -> Result<Limits, D::Error> {
    Ok(LimitsOverride::deserialize(d)?.over(default_markdown_limits()))
}
fn yaml_limits<'de, D: Deserializer<'de>>(d: D) -> Result<Limits, D::Error> {
    Ok(LimitsOverride::deserialize(d)?.over(default_yaml_limits()))
}
fn docstring_limits<'de, D: Deserializer<'de>>(d: D) -> Result<Limits, D::Error> {
    Ok(LimitsOverride::deserialize(d)?.over(default_docstring_limits()))
}
fn documentation_limits<'de, D: Deserializer<'de>>(d: D) -> Result<Limits, D::Error> {
    Ok(LimitsOverride::deserialize(d)?.over(default_documentation_limits()))
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectConfig {
    #[serde(default = "default_repos")]
    pub repos: Vec<String>,
    #[serde(default = "default_markdown_limits", deserialize_with = "markdown_limits")]
    pub markdown: Limits,
    #[serde(default = "default_yaml_limits", deserialize_with = "yaml_limits")]
    pub yaml: Limits,
    #[serde(default = "default_docstring_limits", deserialize_with = "docstring_limits")]
    pub docstring: Limits,
    #[serde(default = "default_documentation_limits", deserialize_with = "documentation_limits")]
    pub documentation: Limits,
    /// Extra globs; a file must also match its type's extension.
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    /// Replaces the built-in diagnostics knowledge text.
    #[serde(default)]
    pub knowledge_file: Option<PathBuf>,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            repos: default_repos(),
            markdown: default_markdown_limits(),
            yaml: default_yaml_limits(),
            docstring: default_docstring_limits(),
            documentation: default_documentation_limits(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            knowledge_file: None,
        }
    }
}

fn default_repos() -> Vec<String> {
    [
        "https://github.com/IBM/ibm-spectrum-scale-csi.git",
        "https://github.com/IBM/ibm-spectrum-scale-cloud-install.git",
        "https://github.com/IBM/ibm-spectrum-scale-bridge-for-grafana.git",
        "https://github.com/IBM/ibm-spectrum-scale-container-native.git",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_markdown_limits() -> Limits {
    Limits {
        min_chars: 100,
        max_chars: 8000,
    }
}
fn default_yaml_limits() -> Limits {
    Limits {
        min_chars: 50,
        max_chars: 4000,
    }
}
fn default_docstring_limits() -> Limits {
    Limits {
        min_chars: 50,
        max_chars: 4000,
    }
}
fn default_documentation_limits() -> Limits {
    Limits {
        min_chars: 0,
        max_chars: 8000,
    }
}
fn default_include_globs() -> Vec<String> {
    vec!["**/*".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerateConfig {
    #[serde(default = "default_body_min")]
    pub body_min_chars: usize,
    #[serde(default = "default_body_max")]
    pub body_max_chars: usize,
    #[serde(default = "default_answer_max")]
    pub answer_max_chars: usize,
    #[serde(default = "default_yaml_answer_max")]
    pub yaml_answer_max_chars: usize,
    /// Only the first N chunks are considered for YAML templating.
    #[serde(default = "default_yaml_window")]
    pub yaml_window: usize,
    #[serde(default = "default_product_prefix")]
    pub product_prefix: String,
    #[serde(default = "default_yaml_keywords")]
    pub yaml_keywords: Vec<String>,
    #[serde(default)]
    pub curated_file: Option<PathBuf>,
    #[serde(default)]
    pub dedup: DedupConfig,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            body_min_chars: default_body_min(),
            body_max_chars: default_body_max(),
            answer_max_chars: default_answer_max(),
            yaml_answer_max_chars: default_yaml_answer_max(),
            yaml_window: default_yaml_window(),
            product_prefix: default_product_prefix(),
            yaml_keywords: default_yaml_keywords(),
            curated_file: None,
            dedup: DedupConfig::default(),
        }
    }
}

fn default_body_min() -> usize {
    50
}
fn default_body_max() -> usize {
    2000
}
fn default_answer_max() -> usize {
    1500
}
fn default_yaml_answer_max() -> usize {
    1200
}
fn default_yaml_window() -> usize {
    50
}
fn default_product_prefix() -> String {
    "ibm-spectrum-scale-".to_string()
}
fn default_yaml_keywords() -> Vec<String> {
    vec!["Spectrum".to_string(), "CSI".to_string(), "Scale".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct DedupConfig {
    /// `normalized` (full question) or `prefix` (first `chars` characters).
    #[serde(default = "default_dedup_policy")]
    pub policy: String,
    #[serde(default = "default_dedup_chars")]
    pub chars: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            policy: default_dedup_policy(),
            chars: default_dedup_chars(),
        }
    }
}

fn default_dedup_policy() -> String {
    "normalized".to_string()
}
fn default_dedup_chars() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct FinetuneConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_chat_template")]
    pub chat_template: String,
    /// Trainer command line; the plan path is appended as the last argument.
    #[serde(default = "default_launcher")]
    pub launcher: Vec<String>,
    #[serde(default = "default_eval_questions")]
    pub eval_questions: Vec<String>,
    #[serde(default)]
    pub lora: LoraConfig,
    #[serde(default)]
    pub quantization: QuantizationConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

impl Default for FinetuneConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            seed: default_seed(),
            test_fraction: default_test_fraction(),
            output_dir: default_output_dir(),
            chat_template: default_chat_template(),
            launcher: default_launcher(),
            eval_questions: default_eval_questions(),
            lora: LoraConfig::default(),
            quantization: QuantizationConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

fn default_model() -> String {
    "ibm-granite/granite-3.1-2b-instruct".to_string()
}
fn default_seed() -> u64 {
    42
}
fn default_test_fraction() -> f64 {
    0.2
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("gpfs_results")
}
fn default_chat_template() -> String {
    "<|start_of_role|>user<|end_of_role|>{question}<|end_of_text|>\n\
     <|start_of_role|>assistant<|end_of_role|>{answer}<|end_of_text|>"
        .to_string()
}
fn default_launcher() -> Vec<String> {
    vec!["python3".to_string(), "trainer/train_sft.py".to_string()]
}
fn default_eval_questions() -> Vec<String> {
    vec![
        "How do I check network connectivity in GPFS?".to_string(),
        "What is mmdiag used for?".to_string(),
        "How do I deploy the IBM Spectrum Scale CSI driver?".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone, serde::Serialize, PartialEq)]
pub struct LoraConfig {
    #[serde(default = "default_lora_r")]
    pub r: u32,
    #[serde(default = "default_lora_alpha")]
    pub alpha: u32,
    #[serde(default = "default_lora_dropout")]
    pub dropout: f64,
    #[serde(default = "default_lora_targets")]
    pub target_modules: Vec<String>,
    #[serde(default = "default_lora_bias")]
    pub bias: String,
}

impl Default for LoraConfig {
    fn default() -> Self {
        Self {
            r: default_lora_r(),
            alpha: default_lora_alpha(),
            dropout: default_lora_dropout(),
            target_modules: default_lora_targets(),
            bias: default_lora_bias(),
        }
    }
}

fn default_lora_r() -> u32 {
    16
}
fn default_lora_alpha() -> u32 {
    32
}
fn default_lora_dropout() -> f64 {
    0.1
}
fn default_lora_targets() -> Vec<String> {
    vec!["q_proj".to_string(), "v_proj".to_string()]
}
fn default_lora_bias() -> String {
    "none".to_string()
}

#[derive(Debug, Deserialize, Clone, serde::Serialize, PartialEq)]
pub struct QuantizationConfig {
    #[serde(default = "default_true")]
    pub load_in_4bit: bool,
    #[serde(default = "default_quant_type")]
    pub quant_type: String,
    #[serde(default = "default_true")]
    pub double_quant: bool,
    #[serde(default = "default_compute_dtype")]
    pub compute_dtype: String,
}

impl Default for QuantizationConfig {
    fn default() -> Self {
        Self {
            load_in_4bit: true,
            quant_type: default_quant_type(),
            double_quant: true,
            compute_dtype: default_compute_dtype(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_quant_type() -> String {
    "nf4".to_string()
}
fn default_compute_dtype() -> String {
    "bfloat16".to_string()
}

#[derive(Debug, Deserialize, Clone, serde::Serialize, PartialEq)]
pub struct TrainingConfig {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_batch_size")]
    pub per_device_train_batch_size: u32,
    #[serde(default = "default_batch_size")]
    pub per_device_eval_batch_size: u32,
    #[serde(default = "default_epochs")]
    pub num_train_epochs: u32,
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    #[serde(default = "default_logging_steps")]
    pub logging_steps: u32,
    #[serde(default = "default_save_steps")]
    pub save_steps: u32,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default = "default_true")]
    pub bf16: bool,
    #[serde(default = "default_max_new_tokens")]
    pub eval_max_new_tokens: u32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            per_device_train_batch_size: default_batch_size(),
            per_device_eval_batch_size: default_batch_size(),
            num_train_epochs: default_epochs(),
            max_steps: default_max_steps(),
            logging_steps: default_logging_steps(),
            save_steps: default_save_steps(),
            max_length: default_max_length(),
            bf16: true,
            eval_max_new_tokens: default_max_new_tokens(),
        }
    }
}

fn default_learning_rate() -> f64 {
    2e-4
}
fn default_batch_size() -> u32 {
    2
}
fn default_epochs() -> u32 {
    3
}
fn default_max_steps() -> u32 {
    100
}
fn default_logging_steps() -> u32 {
    10
}
fn default_save_steps() -> u32 {
    50
}
fn default_max_length() -> u32 {
    512
}
fn default_max_new_tokens() -> u32 {
    200
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists; otherwise fall back to built-in defaults.
///
/// `explicit` marks a path the user passed on the command line, which must exist.
pub fn load_or_default(path: &Path, explicit: bool) -> Result<Config> {
    if path.exists() || explicit {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    // Validate collect limits
    for (name, limits) in [
        ("markdown", &config.collect.markdown),
        ("yaml", &config.collect.yaml),
        ("docstring", &config.collect.docstring),
        ("documentation", &config.collect.documentation),
    ] {
        if limits.max_chars == 0 || limits.max_chars <= limits.min_chars {
            anyhow::bail!("collect.{name}.max_chars must be > min_chars and > 0");
        }
    }

    // Validate generate
    let gc = &config.generate;
    if gc.body_max_chars < gc.body_min_chars {
        anyhow::bail!("generate.body_max_chars must be >= generate.body_min_chars");
    }
    if gc.answer_max_chars == 0 || gc.yaml_answer_max_chars == 0 {
        anyhow::bail!("generate answer caps must be > 0");
    }
    match gc.dedup.policy.as_str() {
        "normalized" => {}
        "prefix" => {
            if gc.dedup.chars == 0 {
                anyhow::bail!("generate.dedup.chars must be > 0 for the prefix policy");
            }
        }
        other => anyhow::bail!(
            "Unknown dedup policy: '{}'. Must be normalized or prefix.",
            other
        ),
    }

    // Validate finetune
    let ft = &config.finetune;
    if !(ft.test_fraction > 0.0 && ft.test_fraction < 1.0) {
        anyhow::bail!("finetune.test_fraction must be in (0.0, 1.0)");
    }
    if !ft.chat_template.contains("{question}") || !ft.chat_template.contains("{answer}") {
        anyhow::bail!("finetune.chat_template must contain {{question}} and {{answer}}");
    }
    if ft.lora.r == 0 {
        anyhow::bail!("finetune.lora.r must be > 0");
    }
    if !(0.0..1.0).contains(&ft.lora.dropout) {
        anyhow::bail!("finetune.lora.dropout must be in [0.0, 1.0)");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.collect.repos.len(), 4);
        assert_eq!(config.collect.markdown.max_chars, 8000);
        assert_eq!(
            config.paths.chunks_file(),
            PathBuf::from("gpfs_data/extracted/gpfs_chunks.json")
        );
        assert_eq!(config.paths.repos_dir(), PathBuf::from("gpfs_data/repos"));
        assert_eq!(config.generate.dedup.policy, "normalized");
        assert_eq!(config.finetune.lora.r, 16);
        assert_eq!(
            config.finetune.launcher,
            vec!["python3".to_string(), "trainer/train_sft.py".to_string()]
        );
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = parse(
            r#"
[paths]
data_dir = "/tmp/x"

[collect]
repos = []

[finetune.lora]
r = 8
"#,
        )
        .unwrap();
        assert!(config.collect.repos.is_empty());
        assert_eq!(config.paths.repos_dir(), PathBuf::from("/tmp/x/repos"));
        assert_eq!(config.finetune.lora.r, 8);
        assert_eq!(config.finetune.lora.alpha, 32);
    }

    #[test]
    fn rejects_bad_test_fraction() {
        assert!(parse("[finetune]\ntest_fraction = 1.0\n").is_err());
        assert!(parse("[finetune]\ntest_fraction = 0.0\n").is_err());
    }

    #[test]
    fn rejects_unknown_dedup_policy() {
        let err = parse("[generate.dedup]\npolicy = \"fuzzy\"\n").unwrap_err();
        assert!(err.to_string().contains("Unknown dedup policy"));
    }

    #[test]
    fn rejects_template_without_placeholders() {
        assert!(parse("[finetune]\nchat_template = \"{question}\"\n").is_err());
    }

    #[test]
    fn rejects_cap_below_minimum() {
        assert!(parse("[collect.yaml]\nmin_chars = 100\nmax_chars = 50\n").is_err());
    }

    #[test]
    fn partial_limits_table_keeps_type_defaults() {
        let config = parse("[collect.yaml]\nmax_chars = 3000\n").unwrap();
        assert_eq!(
            config.collect.yaml,
            Limits {
                min_chars: 50,
                max_chars: 3000
            }
        );
        assert_eq!(config.collect.markdown.min_chars, 100);

        let config = parse("[collect.markdown]\nmin_chars = 20\n").unwrap();
        assert_eq!(config.collect.markdown.min_chars, 20);
        assert_eq!(config.collect.markdown.max_chars, 8000);
    }

    #[test]
    fn missing_default_path_falls_back() {
        let config = load_or_default(Path::new("/nonexistent/gpfs-tune.toml"), false).unwrap();
        assert_eq!(config.finetune.seed, 42);
        assert!(load_or_default(Path::new("/nonexistent/gpfs-tune.toml"), true).is_err());
    }
}
