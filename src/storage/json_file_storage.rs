// Single JSON file holding the latest profile snapshot.
use crate::{
    snapshot::ProfileSnapshot,
    storage::snapshot_storage::SnapshotStorage,
};
use anyhow::Context;
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

pub const PROFILE_FILE: &str = "profile.json";

#[derive(Clone, Debug)]
pub struct JsonFileSnapshotStorage {
    path: PathBuf,
}

impl JsonFileSnapshotStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at `<dir>/profile.json`, creating `dir` when missing.
    pub fn in_dir(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create data directory {}", dir.display()))?;
        }
        Ok(Self::new(dir.join(PROFILE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStorage for JsonFileSnapshotStorage {
    fn latest_profile(&self) -> anyhow::Result<Option<ProfileSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path)
            .with_context(|| format!("read profile file {}", self.path.display()))?;
        if data.is_empty() {
            return Ok(None);
        }
        let snapshot = serde_json::from_slice::<ProfileSnapshot>(&data)
            .with_context(|| format!("parse profile file {}", self.path.display()))?;
        Ok(Some(snapshot))
    }

    fn save_profile(&mut self, snapshot: &ProfileSnapshot) -> anyhow::Result<()> {
        let json =
            serde_json::to_vec_pretty(snapshot).context("serialize profile snapshot")?;
        // staged write, then an atomic rename over the target
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)
            .with_context(|| format!("write profile file {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("replace profile file {}", self.path.display()))?;
        Ok(())
    }
}
