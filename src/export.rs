//! Workspace snapshot export and import.
//!
//! A snapshot is the full [`Collections`] bundle wrapped with a schema
//! version and an export timestamp, written as JSON or gzipped JSON. Import
//! refuses to clobber a non-empty store unless forced.

use crate::store::{now_ms, Collections, Store};
use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    pub exported_at: i64,
    pub collections: Collections,
}

/// Export every collection to `path`. A `.gz` suffix or `gzip = true` selects
/// gzipped output.
pub fn export_snapshot(store: &dyn Store, path: &Path, gzip: bool) -> Result<()> {
    let snapshot = Snapshot {
        schema_version: SCHEMA_VERSION,
        exported_at: now_ms(),
        collections: store.collections(),
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    if gzip || path.extension().is_some_and(|e| e == "gz") {
        let mut encoder = GzEncoder::new(file, Compression::default());
        serde_json::to_writer(&mut encoder, &snapshot)?;
        encoder.finish()?;
    } else {
        serde_json::to_writer_pretty(file, &snapshot)?;
    }
    info!(path = %path.display(), "Exported workspace snapshot");
    Ok(())
}

/// Read a snapshot from `path`, transparently handling gzip.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut magic = [0u8; 2];
    let gzipped = file.read_exact(&mut magic).is_ok() && magic == [0x1f, 0x8b];
    let mut file = File::open(path)?;
    let mut raw = Vec::new();
    if gzipped {
        GzDecoder::new(&mut file).read_to_end(&mut raw)?;
    } else {
        file.read_to_end(&mut raw)?;
    }
    let snapshot: Snapshot = serde_json::from_slice(&raw)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
    if snapshot.schema_version > SCHEMA_VERSION {
        bail!(
            "Snapshot schema version {} is newer than supported version {}",
            snapshot.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(snapshot)
}

/// Import a snapshot, replacing every collection. Refuses when the store
/// already holds data unless `force` is set.
pub fn import_snapshot(store: &dyn Store, path: &Path, force: bool) -> Result<()> {
    let snapshot = read_snapshot(path)?;
    if !force && !store.collections().is_empty() {
        bail!("Store is not empty; pass --force to replace its contents");
    }
    store.set_collections(&snapshot.collections)?;
    info!(
        path = %path.display(),
        tasks = snapshot.collections.tasks.len(),
        users = snapshot.collections.users.len(),
        "Imported workspace snapshot"
    );
    Ok(())
}
