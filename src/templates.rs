//! Rule-based question templates over harvested chunks.
//!
//! Markdown sections are classified by keywords in their header; YAML
//! manifests yield "show me an example" questions keyed on their `kind:`.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::GenerateConfig;
use crate::extract::truncate_chars;
use crate::models::QaPair;

static SECTION_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n##?\s+").expect("valid section regex"));
static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid newline regex"));
static YAML_KIND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"kind:\s*(\w+)").expect("valid kind regex"));

/// Header families recognised by the markdown rule, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRule {
    Install,
    Configure,
    Prerequisite,
    Troubleshoot,
    Usage,
}

impl HeaderRule {
    pub fn classify(header: &str) -> Option<HeaderRule> {
        let lower = header.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has(&["install", "setup", "deploy"]) {
            Some(HeaderRule::Install)
        } else if has(&["configur"]) {
            Some(HeaderRule::Configure)
        } else if has(&["prerequisite", "requirement"]) {
            Some(HeaderRule::Prerequisite)
        } else if has(&["troubleshoot"]) {
            Some(HeaderRule::Troubleshoot)
        } else if has(&["usage", "example"]) {
            Some(HeaderRule::Usage)
        } else {
            None
        }
    }
}

/// Product name for a chunk source: repository name minus the product prefix.
pub fn product_name(source: &str, prefix: &str) -> String {
    let repo = source.split('/').next().unwrap_or(source);
    repo.replace(prefix, "")
}

/// Synthesize a question for a markdown header.
pub fn question_for_header(header: &str, product: &str) -> Option<String> {
    let header = header.trim().trim_end_matches(':').trim();
    let question = match HeaderRule::classify(header)? {
        HeaderRule::Install => {
            let subject = header
                .to_lowercase()
                .replace("installation", "install")
                .replace("deployment", "deploy");
            format!("How do I {}?", subject)
        }
        HeaderRule::Configure => {
            let subject = header
                .replace("Configuration", "")
                .replace("Configuring", "")
                .trim()
                .to_string();
            format!("How do I configure {}?", or_product(subject, product))
        }
        HeaderRule::Prerequisite => format!("What are the {}?", header.to_lowercase()),
        HeaderRule::Troubleshoot => {
            let subject = header.replace("Troubleshooting", "").trim().to_string();
            format!("How do I troubleshoot {}?", or_product(subject, product))
        }
        HeaderRule::Usage => format!("How do I use {}?", product),
    };
    Some(question)
}

fn or_product(subject: String, product: &str) -> String {
    if subject.is_empty() {
        product.to_string()
    } else {
        subject
    }
}

/// QA pairs from the level-1/2 sections of a markdown document.
pub fn qa_from_markdown(content: &str, source: &str, config: &GenerateConfig) -> Vec<QaPair> {
    let product = product_name(source, &config.product_prefix);
    let mut pairs = Vec::new();

    // Skip content before the first header
    for section in SECTION_SPLIT.split(content).skip(1) {
        let section = section.trim();
        let mut lines = section.lines();
        let Some(header) = lines.next() else {
            continue;
        };
        let body = lines.collect::<Vec<_>>().join("\n");
        let body = body.trim();

        let body_len = body.chars().count();
        if body_len < config.body_min_chars || body_len > config.body_max_chars {
            continue;
        }

        let Some(question) = question_for_header(header, &product) else {
            continue;
        };

        let answer = truncate_chars(body, config.answer_max_chars);
        let answer = EXCESS_NEWLINES.replace_all(answer, "\n\n").into_owned();

        pairs.push(QaPair { question, answer });
    }

    pairs
}

/// An example-configuration QA pair for a product YAML manifest.
pub fn qa_from_yaml(content: &str, config: &GenerateConfig) -> Option<QaPair> {
    if !content.contains("kind:") {
        return None;
    }
    if !config.yaml_keywords.iter().any(|k| content.contains(k.as_str())) {
        return None;
    }
    let kind = YAML_KIND.captures(content)?.get(1)?.as_str();

    Some(QaPair {
        question: format!(
            "Can you show an example {} configuration for IBM Spectrum Scale?",
            kind
        ),
        answer: format!(
            "Here's an example {} configuration:\n\n```yaml\n{}\n```",
            kind,
            truncate_chars(content, config.yaml_answer_max_chars)
        ),
    })
}
