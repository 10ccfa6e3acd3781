use crate::config::Network;
use crate::dispatch::DispatchResult;
use crate::error::Result;
use chrono::Utc;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Log file name
const OPERATION_LOG_FILE: &str = "operation_log.txt";

/// Append-only text record of dispatch attempts, one block per run.
#[derive(Clone, Debug)]
pub struct OperationLog {
    path: PathBuf,
}

impl OperationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/multisend/operation_log.txt`, or the working directory when the
    /// platform has no config dir.
    pub fn default_path() -> PathBuf {
        match dirs::config_dir() {
            Some(config_dir) => config_dir.join("multisend").join(OPERATION_LOG_FILE),
            None => PathBuf::from(OPERATION_LOG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a structured entry describing one operation.
    pub fn append(&self, operation: &str, network: Network, details: impl AsRef<str>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let timestamp = Utc::now().to_rfc3339();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(
            file,
            "[{}] network={} chain_id={} operation={}",
            timestamp,
            network,
            network.chain_id(),
            operation
        )?;

        let body = details.as_ref();
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

    /// Record the outcome of a dispatch, with an explorer link per submitted transfer.
    pub fn record_dispatch(&self, result: &DispatchResult) -> Result<()> {
        let (network, submitted, failure) = match result {
            Ok(report) => (report.network, &report.submitted, None),
            Err(failure) => (failure.network, &failure.submitted, Some(&failure.error)),
        };

        let mut details = String::new();
        for (i, sent) in submitted.iter().enumerate() {
            let hash = format!("{:?}", sent.tx_hash);
            let _ = writeln!(
                details,
                "{}. {} ({})",
                i + 1,
                sent.transfer.describe(),
                network.tx_explorer_url(&hash)
            );
        }
        match failure {
            None => {
                let _ = writeln!(details, "Completed: {} transfer(s)", submitted.len());
            }
            Some(error) => {
                let _ = writeln!(
                    details,
                    "Stopped after {} transfer(s): {}",
                    submitted.len(),
                    error
                );
            }
        }

        self.append("multisend", network, details)
    }

    /// Entire log content; empty when nothing has been written yet.
    pub fn read(&self) -> Result<String> {
        if self.path.exists() {
            Ok(fs::read_to_string(&self.path)?)
        } else {
            Ok(String::new())
        }
    }
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}
