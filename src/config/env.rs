//! Environment handling for configuration files
//!
//! Configuration values may reference the environment with `$ENV:KEY`
//! placeholders. They are resolved on the raw file text before JSON parsing.
//! A `.env` file, when present, is loaded into the process environment first.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{BackupError, BackupResult};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$ENV:([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern is valid")
});

/// Result of placeholder substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// Text with every resolvable placeholder replaced
    pub text: String,
    /// Keys that had no value and were left verbatim
    pub unresolved: Vec<String>,
}

/// Replace `$ENV:KEY` placeholders with values from the process environment
pub fn substitute_env(input: &str) -> Substitution {
    substitute_with(input, |key| std::env::var(key).ok())
}

/// Replace `$ENV:KEY` placeholders using a custom lookup
///
/// Values are JSON-escaped so that quotes or backslashes in a secret cannot
/// break the surrounding string literal. Unresolved placeholders are kept
/// as written.
pub fn substitute_with<F>(input: &str, lookup: F) -> Substitution
where
    F: Fn(&str) -> Option<String>,
{
    let mut unresolved = Vec::new();

    let text = PLACEHOLDER
        .replace_all(input, |caps: &Captures| {
            let key = &caps[1];
            match lookup(key) {
                Some(value) => json_escape(&value),
                None => {
                    if !unresolved.iter().any(|k| k == key) {
                        unresolved.push(key.to_string());
                    }
                    caps[0].to_string()
                }
            }
        })
        .into_owned();

    Substitution { text, unresolved }
}

/// Escape a value for inclusion inside a JSON string literal
fn json_escape(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// Load a `.env` file into the process environment if it exists
///
/// Returns `Ok(false)` when the file is absent.
pub fn load_dotenv(path: &Path) -> BackupResult<bool> {
    if !path.exists() {
        return Ok(false);
    }

    dotenvy::from_path(path).map_err(|e| {
        BackupError::Config(format!("Failed to load {}: {}", path.display(), e))
    })?;

    Ok(true)
}
