//! Curated question/answer pairs.
//!
//! Hand-written pairs covering diagnostics, cluster status, performance
//! testing, CSI, troubleshooting, automation, and monitoring. They lead the
//! dataset so they win deduplication against templated questions.

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::QaPair;

const CURATED: &[(&str, &str)] = &[
    (
        "How do I check network connectivity in GPFS?",
        "Use the mmdiag --network command to check network connectivity and pending operations in GPFS. This displays diagnostic information about the network state on the current node.",
    ),
    (
        "What does mmdiag --iohist show?",
        "The mmdiag --iohist command lists the last 512 I/O operations performed by GPFS on the current node. This is useful for diagnosing I/O performance issues and understanding recent file system activity.",
    ),
    (
        "How do I collect debug data from a GPFS cluster?",
        "Use the gpfs.snap command to collect debug data. This script gathers all logs and configurations from nodes. If you suspect a deadlock, run 'gpfs.snap -deadlock' to collect additional deadlock-specific information.",
    ),
    (
        "What is mmfsadm used for in GPFS?",
        "mmfsadm is a diagnostic tool intended for trained service personnel. It extracts data from GPFS without using locking, allowing data collection even during locking errors. Common uses include: 'mmfsadm dump waiters' to find long-lasting processes, 'mmfsadm dump all' for comprehensive debug dumps, and 'mmfsadm dump deadlock' for deadlock detection.",
    ),
    (
        "How do I check the health of a GPFS cluster?",
        "Use the mmhealth command for health monitoring. It creates alerts based on callhome data for recent findings. You can run 'mmhealth node show' to see the health status of nodes, or 'mmhealth node show --unhealthy' to only show unhealthy nodes.",
    ),
    (
        "How do I enable tracing in GPFS?",
        "Use the mmtracectl command to set up and enable tracing. Trace levels range from 0 to 14, with higher numbers providing more detail. Use 'mmtracectl --set' to configure tracing and 'mmfsadm showtrace' to display current trace levels.",
    ),
    (
        "How do I check the state of GPFS daemons on nodes?",
        "Use the mmgetstate command to check the GPFS daemon state on nodes. This shows whether the GPFS daemon (mmfsd) is active, down, or in an arbitrating state on each node in the cluster.",
    ),
    (
        "How do I list GPFS cluster configuration?",
        "Use mmlsconfig to list the cluster configuration parameters. This displays all configuration settings for the GPFS cluster including network settings, timeouts, and performance tuning parameters.",
    ),
    (
        "How do I display GPFS cluster information?",
        "Use the mmlscluster command to display cluster information including the cluster name, cluster ID, primary and secondary configuration servers, and a list of all nodes in the cluster.",
    ),
    (
        "How do I test network performance in a GPFS cluster?",
        "Use nsdperf, IBM's network performance tool located in /usr/lpp/mmfs/samples/net. Unlike iperf which tests between two nodes, nsdperf simulates GPFS NSD client/server operations and can coordinate tests across multiple nodes in a large cluster configuration.",
    ),
    (
        "What tools can I use to benchmark GPFS performance?",
        "Common benchmarking tools for GPFS include: 1) IOR - a parallel IO benchmark for testing storage systems with various interfaces and access patterns, 2) mdtest - tests peak metadata rates including mkdir, stat, rmdir, creat, open, close, and unlink operations, 3) fio - validates infrastructure with configurable block sizes and I/O patterns.",
    ),
    (
        "How do I deploy the IBM Spectrum Scale CSI driver?",
        "Deploy the IBM Spectrum Scale CSI driver using the operator pattern. Install the CSI operator from OperatorHub or using kubectl/oc. Then create a CSIScaleOperator custom resource that specifies your cluster configuration, including the primary and GUI clusters, secret references for authentication, and node selectors for driver placement.",
    ),
    (
        "What are the prerequisites for IBM Spectrum Scale CSI driver?",
        "Prerequisites include: 1) A running IBM Spectrum Scale cluster with GUI enabled, 2) Kubernetes 1.19+ or OpenShift 4.6+, 3) The Spectrum Scale client installed on all Kubernetes worker nodes, 4) Network connectivity between Kubernetes nodes and the Spectrum Scale cluster, 5) A Kubernetes secret containing the Scale GUI credentials.",
    ),
    (
        "How do I create a PersistentVolumeClaim with IBM Spectrum Scale CSI?",
        "Create a StorageClass referencing the CSI driver (spectrumscale.csi.ibm.com), then create a PVC referencing that StorageClass. The CSI driver will dynamically provision a fileset on your Spectrum Scale filesystem. Example: Create a StorageClass with 'provisioner: spectrumscale.csi.ibm.com' and configure volBackendFs to specify which filesystem to use.",
    ),
    (
        "How do I diagnose a GPFS deadlock?",
        "To diagnose a GPFS deadlock: 1) Run 'gpfs.snap -deadlock' to collect deadlock-specific debug data, 2) Use 'mmfsadm dump deadlock' for deadlock detection, 3) Check 'mmfsadm dump waiters' to find long-lasting processes that may be blocking others. The collected data can be analyzed by IBM support.",
    ),
    (
        "What should I check when GPFS nodes are being expelled from the cluster?",
        "When nodes are expelled: 1) Check mmfs.log for the reason - in GPFS 6.0.0+, the log provides clearer details about expel decisions, 2) Use mmhealth to see expel reports via the postExpel callback, 3) Common causes include network issues (check with mmnetverify), lease expiration, or inter-node RPC failures.",
    ),
    (
        "How do I automate IBM Storage Scale installation?",
        "IBM provides several automation options: 1) Ansible playbooks for automated installation, configuration, verification, and upgrades, 2) Terraform modules for cloud provisioning in AWS, Azure, and IBM Cloud, 3) Vagrant with StorageScaleVagrant for development/test environments. The Installation Toolkit also provides automated deployment capabilities.",
    ),
    (
        "What is IBM Storage Scale Container Native?",
        "IBM Storage Scale Container Native provides native integration of Spectrum Scale with Kubernetes/OpenShift environments. It allows containers to directly access Spectrum Scale filesystems with enterprise features like snapshots, quotas, and data tiering. It's deployed alongside the CSI driver for complete container storage integration.",
    ),
    (
        "How do I monitor IBM Storage Scale with Grafana?",
        "Use the IBM Spectrum Scale Bridge for Grafana. This bridge collects performance metrics from your Scale cluster and exposes them to Prometheus, which Grafana can then visualize. Install the bridge, configure it to connect to your Scale cluster's performance monitoring (mmperfmon), and import the provided Grafana dashboards.",
    ),
    (
        "What metrics are available for IBM Storage Scale monitoring?",
        "IBM Storage Scale exposes metrics through mmperfmon including: filesystem throughput (read/write MB/s), IOPS, latency, metadata operations, network statistics, disk utilization, and per-fileset metrics. These can be collected via the Grafana bridge or directly queried using mmpmon.",
    ),
];

/// The built-in curated pairs, in order.
pub fn curated_pairs() -> Vec<QaPair> {
    CURATED.iter().map(|(q, a)| QaPair::new(*q, *a)).collect()
}

/// Load additional curated pairs from a JSONL file.
pub fn load_curated_file(path: &Path) -> Result<Vec<QaPair>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read curated file: {}", path.display()))?;
    crate::dataset::parse_jsonl(&content)
        .with_context(|| format!("Invalid curated file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_pairs_complete_and_distinct() {
        let pairs = curated_pairs();
        assert_eq!(pairs.len(), 20);
        assert!(pairs.iter().all(QaPair::is_complete));

        let questions: HashSet<String> = pairs.iter().map(|p| p.question.to_lowercase()).collect();
        assert_eq!(questions.len(), pairs.len());
    }

    #[test]
    fn curated_file_appends_pairs() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "{\"question\":\"What is mmlsfs?\",\"answer\":\"It lists file system attributes.\"}\n",
        )
        .unwrap();
        let pairs = load_curated_file(tmp.path()).unwrap();
        assert_eq!(pairs, vec![QaPair::new("What is mmlsfs?", "It lists file system attributes.")]);
    }
}
