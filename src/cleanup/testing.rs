//! In-memory share session for tests

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

use chrono::NaiveDateTime;

use crate::error::{BackupError, BackupResult};
use crate::remote::{join_remote, normalize_remote, ShareSession};
use crate::storage::CandidateEntry;

#[derive(Default)]
struct State {
    dirs: BTreeMap<String, BTreeMap<String, CandidateEntry>>,
    failing_removals: BTreeSet<String>,
    failing_listings: BTreeSet<String>,
}

/// A share whose contents live in memory
#[derive(Default)]
pub struct MemoryShare {
    state: Mutex<State>,
}

impl MemoryShare {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&self, dir: &str, entry: CandidateEntry) {
        let mut state = self.state.lock().unwrap();
        state
            .dirs
            .entry(normalize_remote(dir))
            .or_default()
            .insert(entry.name.clone(), entry);
    }

    pub fn add_file(&self, dir: &str, name: &str, modified: Option<NaiveDateTime>) {
        self.add_entry(dir, CandidateEntry::file(name, modified));
    }

    pub fn fail_removal_of(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_removals
            .insert(normalize_remote(path));
    }

    pub fn fail_listing_of(&self, dir: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_listings
            .insert(normalize_remote(dir));
    }

    pub fn contains(&self, path: &str) -> bool {
        let path = normalize_remote(path);
        let (dir, name) = path.rsplit_once('/').unwrap_or(("", path.as_str()));
        self.state
            .lock()
            .unwrap()
            .dirs
            .get(dir)
            .is_some_and(|entries| entries.contains_key(name))
    }

    pub fn files_in(&self, dir: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .dirs
            .get(&normalize_remote(dir))
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl ShareSession for MemoryShare {
    fn read_dir(&self, path: &str) -> BackupResult<Vec<CandidateEntry>> {
        let path = normalize_remote(path);
        let state = self.state.lock().unwrap();
        if state.failing_listings.contains(&path) {
            return Err(BackupError::Remote(format!("access denied: {}", path)));
        }
        state
            .dirs
            .get(&path)
            .map(|entries| entries.values().cloned().collect())
            .ok_or_else(|| BackupError::directory_not_found(path))
    }

    fn remove_file(&self, path: &str) -> BackupResult<()> {
        let path = normalize_remote(path);
        let mut state = self.state.lock().unwrap();
        if state.failing_removals.contains(&path) {
            return Err(BackupError::Remote(format!("sharing violation: {}", path)));
        }
        let (dir, name) = path.rsplit_once('/').unwrap_or(("", path.as_str()));
        state
            .dirs
            .get_mut(dir)
            .and_then(|entries| entries.remove(name))
            .map(|_| ())
            .ok_or_else(|| BackupError::Remote(format!("no such file: {}", path)))
    }

    fn create_dir_all(&self, path: &str) -> BackupResult<()> {
        let path = normalize_remote(path);
        let mut state = self.state.lock().unwrap();
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let parent = current.clone();
            current = join_remote(&current, segment);
            state
                .dirs
                .entry(parent)
                .or_default()
                .entry(segment.to_string())
                .or_insert_with(|| CandidateEntry::dir(segment));
            state.dirs.entry(current.clone()).or_default();
        }
        Ok(())
    }

    fn upload_file(&self, local: &Path, remote: &str) -> BackupResult<u64> {
        let size = std::fs::metadata(local)?.len();
        let remote = normalize_remote(remote);
        let (dir, name) = remote.rsplit_once('/').unwrap_or(("", remote.as_str()));
        let mut entry = CandidateEntry::file(name, None);
        entry.size = Some(size);
        self.add_entry(dir, entry);
        Ok(size)
    }
}
