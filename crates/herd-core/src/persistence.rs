//! Snapshot files for groups.
//!
//! The engine hands snapshots to whatever save manager the host runs. These
//! helpers cover the simple case of a JSON array of snapshots on disk.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use herd_types::GroupSnapshot;

use crate::error::Result;
use crate::group::GroupRecord;
use crate::policy::PolicyRegistry;

/// Writes snapshots to a JSON file, replacing it.
pub fn write_snapshots(path: &Path, snapshots: &[GroupSnapshot]) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, snapshots)?;
    Ok(())
}

/// Reads snapshots written by [`write_snapshots`].
pub fn read_snapshots(path: &Path) -> Result<Vec<GroupSnapshot>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Rebuilds a group from its snapshot using the configured policy it names.
pub fn restore_group(snapshot: GroupSnapshot, policies: &PolicyRegistry) -> Result<GroupRecord> {
    let policy = policies.get(&snapshot.policy)?;
    GroupRecord::from_snapshot(snapshot, policy)
}
