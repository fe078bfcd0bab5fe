//! Built-in GPFS diagnostics knowledge appended to every harvest.
//!
//! The text is split into one `documentation` chunk per level-2 heading;
//! `###` subsections stay with their parent section.

use crate::config::Limits;
use crate::extract::truncate_chars;
use crate::models::{Chunk, ChunkKind};

/// Source label for chunks produced from the knowledge text.
pub const KNOWLEDGE_SOURCE: &str = "gpfs_diagnostics_research";

pub const GPFS_KNOWLEDGE: &str = r#"
## Built-in GPFS Diagnostic & Verification Commands

IBM Storage Scale includes a comprehensive suite of "mm" commands for testing and diagnostics:

### Core Diagnostic Tools
- **mmdiag** - Displays diagnostic information about the internal GPFS state on the current node
  - mmdiag --network - Check network connectivity and pending operations
  - mmdiag --iohist - Lists last 512 I/O operations performed

- **mmfsadm** - Intended for use by trained service personnel. It extracts data from GPFS without using locking, so it can collect data even in the event of locking errors.
  - mmfsadm dump waiters - Find long-lasting processes
  - mmfsadm dump all - Comprehensive debug dump
  - mmfsadm showtrace - Display current trace levels
  - mmfsadm dump deadlock - Deadlock detection

- **mmhealth** - Health monitoring that creates alerts based on callhome data for recent findings

- **mmnetverify** - Network verification command

- **gpfs.snap** - A debug data collection script that gathers all logs and configurations from nodes. Run "gpfs.snap -deadlock" if a deadlock is suspected.

- **mmtracectl** - Sets up and enables tracing using default settings for various common problem scenarios. Trace level can be set from 0 through 14, representing increasing levels of detail.

### Cluster Status Commands
- **mmgetstate** - Check GPFS daemon state on nodes
- **mmlsconfig** - List cluster configuration
- **mmlscluster** - Display cluster information
- **mmlsdisk** - List disk status

## Performance Testing Tools

### nsdperf (IBM's Network Performance Tool)
IBM has several tools to test a Spectrum Scale cluster, which includes nsdperf. Tools like iperf are good for testing throughput between two nodes, but trying to use these tools on a larger configuration and coordinating the startup can be difficult.

nsdperf tests network performance, simulating GPFS NSD client/server operations. It's located in /usr/lpp/mmfs/samples/net.

### Industry-Standard Benchmarks
- **IOR** - A parallel IO benchmark testing storage systems using various interfaces and access patterns
- **mdtest** - Tests peak metadata rates of storage systems under different directory structures
- **fio** - Used to validate infrastructure before running actual performance tests

## Test Automation & Development Tools

### For CSI/Kubernetes Testing
Test automation for IBM Spectrum Scale (GPFS) CSI Operator uses the Kubernetes Python client and Pytest.

### Infrastructure Automation
- **Ansible** - IBM provides playbooks for automated installation and configuration
- **Vagrant** - IBM provides StorageScaleVagrant for development/test environments
- **Terraform** - Used for cloud provisioning, delivering Storage Scale as Terraform modules
"#;

/// Split markdown text at level-2 headings. Text before the first heading
/// forms its own section when non-blank.
pub fn split_sections(text: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if line.starts_with("## ") && !current.trim().is_empty() {
            sections.push(current.trim().to_string());
            current.clear();
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        sections.push(current.trim().to_string());
    }

    sections
}

/// Turn knowledge text into `documentation` chunks.
pub fn knowledge_chunks(text: &str, limits: &Limits) -> Vec<Chunk> {
    split_sections(text)
        .into_iter()
        .filter(|section| section.chars().count() > limits.min_chars)
        .map(|section| Chunk {
            source: KNOWLEDGE_SOURCE.to_string(),
            kind: ChunkKind::Documentation,
            content: truncate_chars(&section, limits.max_chars).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_text_has_three_sections() {
        let sections = split_sections(GPFS_KNOWLEDGE);
        assert_eq!(sections.len(), 3);
        assert!(sections[0].starts_with("## Built-in GPFS Diagnostic"));
        assert!(sections[0].contains("### Cluster Status Commands"));
        assert!(sections[1].starts_with("## Performance Testing Tools"));
        assert!(sections[2].starts_with("## Test Automation"));
    }

    #[test]
    fn preamble_kept_and_subheadings_do_not_split() {
        let text = "intro line\n## A\nbody a\n### A.1\nmore\n## B\nbody b\n";
        let sections = split_sections(text);
        assert_eq!(sections, vec!["intro line", "## A\nbody a\n### A.1\nmore", "## B\nbody b"]);
    }

    #[test]
    fn chunks_respect_cap() {
        let limits = Limits {
            min_chars: 0,
            max_chars: 40,
        };
        let chunks = knowledge_chunks(GPFS_KNOWLEDGE, &limits);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert_eq!(chunk.kind, ChunkKind::Documentation);
            assert_eq!(chunk.source, KNOWLEDGE_SOURCE);
            assert!(chunk.content.chars().count() <= 40);
        }
    }
}
