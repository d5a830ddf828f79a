use crate::{
    snapshot::ProfileSnapshot,
    storage::snapshot_storage::SnapshotStorage,
};
use std::sync::{
    Arc,
    Mutex,
};

/// Keeps every saved snapshot in memory. Clones share the same history.
#[derive(Clone, Default)]
pub struct InMemorySnapshotStorage {
    saved: Arc<Mutex<Vec<ProfileSnapshot>>>,
}

impl InMemorySnapshotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_snapshot(snapshot: ProfileSnapshot) -> Self {
        Self {
            saved: Arc::new(Mutex::new(vec![snapshot])),
        }
    }

    /// Every snapshot saved so far, oldest first.
    pub fn history(&self) -> Vec<ProfileSnapshot> {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl SnapshotStorage for InMemorySnapshotStorage {
    fn latest_profile(&self) -> anyhow::Result<Option<ProfileSnapshot>> {
        let guard = self.saved.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.last().cloned())
    }

    fn save_profile(&mut self, snapshot: &ProfileSnapshot) -> anyhow::Result<()> {
        let mut guard = self.saved.lock().unwrap_or_else(|e| e.into_inner());
        guard.push(snapshot.clone());
        Ok(())
    }
}
