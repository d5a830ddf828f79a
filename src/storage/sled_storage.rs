// Sled-backed profile snapshot storage. Every save becomes a new revision; the
// newest `retention` revisions are kept.
use crate::{
    snapshot::ProfileSnapshot,
    storage::snapshot_storage::SnapshotStorage,
};
use anyhow::{
    Context,
    anyhow,
};
use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
    de::DeserializeOwned,
};
use sled::{
    Config,
    Db,
    Tree,
};
use std::{
    convert::TryInto,
    path::Path,
};

const LATEST_REVISION_KEY: &[u8] = b"latest_revision";
pub const DEFAULT_RETENTION: u64 = 50;

#[derive(Clone)]
pub struct SledSnapshotStorage {
    profile_tree: Tree,
    profile_meta: Tree,
    retention: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord<T> {
    snapshot: T,
    revision: u64,
    saved_at: DateTime<Utc>,
}

impl SledSnapshotStorage {
    pub fn new(db: &Db) -> anyhow::Result<Self> {
        let profile_tree = db
            .open_tree("profile_snapshots")
            .context("open profile_snapshots tree")?;
        let profile_meta = db
            .open_tree("profile_snapshots_meta")
            .context("open profile_snapshots_meta tree")?;
        Ok(Self {
            profile_tree,
            profile_meta,
            retention: DEFAULT_RETENTION,
        })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let config = Config::default().path(path);
        let db = config.open().context("open sled database")?;
        Self::new(&db)
    }

    /// Keep at most `retention` revisions (at least one).
    pub fn with_retention(mut self, retention: u64) -> Self {
        self.retention = retention.max(1);
        self
    }

    pub fn latest_revision(&self) -> anyhow::Result<Option<u64>> {
        match self.profile_meta.get(LATEST_REVISION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_ref()
                    .try_into()
                    .context("latest revision should be 8 bytes")?;
                Ok(Some(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    fn set_latest_revision(&self, revision: u64) -> anyhow::Result<()> {
        self.profile_meta
            .insert(LATEST_REVISION_KEY, revision.to_be_bytes().as_slice())
            .context("write latest profile revision")?;
        self.profile_meta
            .flush()
            .context("flush latest profile revision")?;
        Ok(())
    }

    fn clear_latest_revision(&self) -> anyhow::Result<()> {
        self.profile_meta
            .remove(LATEST_REVISION_KEY)
            .context("remove latest profile revision")?;
        self.profile_meta
            .flush()
            .context("flush latest profile revision")?;
        Ok(())
    }

    /// Snapshot saved under `revision`, with its save time.
    pub fn profile_at(
        &self,
        revision: u64,
    ) -> anyhow::Result<Option<(ProfileSnapshot, DateTime<Utc>)>> {
        let value = match self.profile_tree.get(revision.to_be_bytes())? {
            Some(value) => value,
            None => return Ok(None),
        };
        let record = deserialize::<SnapshotRecord<ProfileSnapshot>>(value.as_ref())?;
        Ok(Some((record.snapshot, record.saved_at)))
    }

    pub fn revisions(&self) -> anyhow::Result<Vec<u64>> {
        self.profile_tree
            .iter()
            .keys()
            .map(|key| {
                let key = key.context("iterate profile snapshots")?;
                revision_from_key(key.as_ref())
            })
            .collect()
    }

    /// Drop every revision above `to_revision` and make it the latest.
    pub fn roll_back_to(&mut self, to_revision: u64) -> anyhow::Result<()> {
        let mut latest_candidate = None;
        for revision in self.revisions()? {
            if revision > to_revision {
                self.profile_tree
                    .remove(revision.to_be_bytes())
                    .context("remove profile snapshot during rollback")?;
            } else {
                latest_candidate = Some(revision);
            }
        }
        self.profile_tree
            .flush()
            .context("flush profile snapshots")?;

        match latest_candidate {
            Some(revision) => self.set_latest_revision(revision),
            None => self.clear_latest_revision(),
        }
    }

    fn prune_older_than(&self, keep_from: u64) -> anyhow::Result<()> {
        for revision in self.revisions()? {
            if revision >= keep_from {
                break;
            }
            self.profile_tree
                .remove(revision.to_be_bytes())
                .context("remove expired profile snapshot")?;
        }
        Ok(())
    }
}

impl SnapshotStorage for SledSnapshotStorage {
    fn latest_profile(&self) -> anyhow::Result<Option<ProfileSnapshot>> {
        let Some(revision) = self.latest_revision()? else {
            return Ok(None);
        };
        let record = self
            .profile_at(revision)?
            .ok_or_else(|| anyhow!("latest profile revision {revision} is missing"))?;
        Ok(Some(record.0))
    }

    fn save_profile(&mut self, snapshot: &ProfileSnapshot) -> anyhow::Result<()> {
        let revision = self.latest_revision()?.map_or(0, |latest| latest + 1);
        let record = SnapshotRecord {
            snapshot: snapshot.clone(),
            revision,
            saved_at: Utc::now(),
        };
        let bytes =
            serde_json::to_vec(&record).context("serialize profile snapshot record")?;
        self.profile_tree
            .insert(revision.to_be_bytes(), bytes)
            .context("persist profile snapshot")?;
        self.prune_older_than((revision + 1).saturating_sub(self.retention))?;
        self.profile_tree
            .flush()
            .context("flush profile snapshots")?;
        self.set_latest_revision(revision)
    }
}

fn revision_from_key(key: &[u8]) -> anyhow::Result<u64> {
    let arr: [u8; 8] = key
        .try_into()
        .context("profile snapshot key must be 8 bytes")?;
    Ok(u64::from_be_bytes(arr))
}

fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> anyhow::Result<T> {
    serde_json::from_slice(bytes).context("deserialize sled record")
}
