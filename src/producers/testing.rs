//! Stand-in for the external tools in tests

use std::path::Path;
use std::process::Command;
use std::sync::Mutex;

use super::ExternalTools;
use crate::error::{BackupError, BackupResult};

/// Records invocations and writes empty archives instead of running tar
#[derive(Default)]
pub struct FakeTools {
    calls: Mutex<Vec<String>>,
    failing: Vec<String>,
    skip_output: bool,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `tool` fail
    pub fn failing(mut self, tool: &str) -> Self {
        self.failing.push(tool.to_string());
        self
    }

    /// Report success without writing the archive
    pub fn without_output(mut self) -> Self {
        self.skip_output = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self, tool: &str) -> BackupResult<()> {
        if self.failing.iter().any(|t| t == tool) {
            Err(BackupError::tool(tool, "exit status: 2"))
        } else {
            Ok(())
        }
    }
}

impl ExternalTools for FakeTools {
    fn archive(&self, archive: &Path, base_dir: &Path, entry: &str) -> BackupResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("tar {} from {}", entry, base_dir.display()));
        self.check("tar")?;

        if !self.skip_output {
            std::fs::write(archive, b"")?;
        }
        Ok(())
    }

    fn run(&self, tool: &str, _command: Command) -> BackupResult<()> {
        self.calls.lock().unwrap().push(format!("run {}", tool));
        self.check(tool)
    }
}
