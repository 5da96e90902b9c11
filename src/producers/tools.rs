//! External tool invocation
//!
//! Archiving and dumping are delegated to system binaries. They sit behind
//! `ExternalTools` so the pipeline can run against a fake in tests.

use std::path::Path;
use std::process::{Command, Output};

use crate::error::{BackupError, BackupResult};
use crate::models::ARCHIVE_EXTENSION;

/// Runs the external programs backups depend on
pub trait ExternalTools {
    /// Create `archive` from `entry`, resolved relative to `base_dir`
    fn archive(&self, archive: &Path, base_dir: &Path, entry: &str) -> BackupResult<()>;

    /// Run a prepared command to completion
    fn run(&self, tool: &str, command: Command) -> BackupResult<()>;
}

/// Uses `tar` and the database dump tools installed on the host
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTools;

impl ExternalTools for SystemTools {
    fn archive(&self, archive: &Path, base_dir: &Path, entry: &str) -> BackupResult<()> {
        if !archive.to_string_lossy().ends_with(ARCHIVE_EXTENSION) {
            return Err(BackupError::Archive(format!(
                "archive must have {} extension, got: {}",
                ARCHIVE_EXTENSION,
                archive.display()
            )));
        }

        let mut cmd = Command::new("tar");
        cmd.arg("-czf").arg(archive).arg("-C").arg(base_dir).arg(entry);
        self.run("tar", cmd)
    }

    fn run(&self, tool: &str, mut command: Command) -> BackupResult<()> {
        let output = command
            .output()
            .map_err(|e| BackupError::tool(tool, format!("could not start: {}", e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(BackupError::tool(tool, describe_failure(&output)))
        }
    }
}

/// Exit status plus whatever the tool printed
fn describe_failure(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(stdout.trim());
    }

    if text.is_empty() {
        output.status.to_string()
    } else {
        format!("{}, output: {}", output.status, text)
    }
}
