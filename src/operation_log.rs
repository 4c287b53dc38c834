use anyhow::Result;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Cluster;
use crate::user_settings::app_data_dir;

const OPERATION_LOG_FILE: &str = "operation_log.txt";

fn log_path() -> PathBuf {
    app_data_dir().join(OPERATION_LOG_FILE)
}

/// Get the full path to the operation log file as a string for display
pub fn log_file_path() -> String {
    log_path().display().to_string()
}

/// Append a structured log entry describing a user-requested operation.
pub fn append_log(operation: &str, cluster: Cluster, details: impl AsRef<str>) -> Result<()> {
    append_log_to(&log_path(), operation, cluster, details.as_ref())
}

fn append_log_to(path: &Path, operation: &str, cluster: Cluster, body: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let timestamp = Utc::now().to_rfc3339();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    writeln!(
        file,
        "[{}] cluster={} chain_id={} operation={}",
        timestamp,
        cluster.slug(),
        cluster.chain_id(),
        operation
    )?;

    if body.trim().is_empty() {
        writeln!(file, "  (no additional details)")?;
    } else {
        for line in body.lines() {
            if line.trim().is_empty() {
                writeln!(file)?;
            } else {
                writeln!(file, "  {}", line)?;
            }
        }
    }

    writeln!(file)?;
    Ok(())
}

/// Read the entire log file content
pub fn read_log() -> Result<String> {
    let path = log_path();
    if path.exists() {
        Ok(fs::read_to_string(&path)?)
    } else {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tokendrop_oplog_{}_{}", name, std::process::id()))
            .join(OPERATION_LOG_FILE)
    }

    #[test]
    fn test_append_log_writes_header_and_indented_details() {
        let path = temp_log("details");
        append_log_to(&path, "drop", Cluster::Sepolia, "0xaa 100\n\n0xbb 50").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let _ = fs::remove_dir_all(path.parent().unwrap());

        assert!(content.contains("cluster=sepolia chain_id=11155111 operation=drop"));
        assert!(content.contains("\n  0xaa 100\n\n  0xbb 50\n"));
    }

    #[test]
    fn test_append_log_empty_details() {
        let path = temp_log("empty");
        append_log_to(&path, "drop_dev", Cluster::Localhost, "  ").unwrap();
        append_log_to(&path, "drop_dev", Cluster::Localhost, "").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let _ = fs::remove_dir_all(path.parent().unwrap());

        assert_eq!(content.matches("(no additional details)").count(), 2);
    }
}
