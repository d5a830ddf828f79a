use crate::snapshot::ProfileSnapshot;

pub trait SnapshotStorage {
    /// retrieve the most recently saved profile snapshot, if one was ever saved
    fn latest_profile(&self) -> anyhow::Result<Option<ProfileSnapshot>>;

    /// write a new profile snapshot, replacing the latest one
    fn save_profile(&mut self, snapshot: &ProfileSnapshot) -> anyhow::Result<()>;
}
