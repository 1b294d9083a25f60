//! Whole-snapshot disk store
//!
//! `DiskStore` owns a full-store path and a temp-store path and moves whole
//! snapshots between them and memory. Every operation opens its file,
//! finishes with it, and drops the handle before returning, on error paths
//! as well.
//!
//! The store itself is not synchronized. The overflow coordinator keeps it
//! behind a mutex so at most one disk sequence runs at a time.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;

use spillkv_core::{SnapshotPaths, SpillKey, SpillValue};
use spillkv_storage::{MemoryTier, Snapshot};
use tracing::debug;

use crate::frame::{read_frame, write_frame, SnapshotError, SnapshotInfo};

/// Reads and writes whole snapshots of a map
#[derive(Debug)]
pub struct DiskStore<K, V> {
    paths: SnapshotPaths,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K: SpillKey, V: SpillValue> DiskStore<K, V> {
    /// Create a store over the given paths
    ///
    /// No file is touched until the first write.
    pub fn new(paths: SnapshotPaths) -> Self {
        DiskStore {
            paths,
            _marker: PhantomData,
        }
    }

    /// Configured paths
    pub fn paths(&self) -> &SnapshotPaths {
        &self.paths
    }

    /// Full-store path
    pub fn full_path(&self) -> &Path {
        &self.paths.full
    }

    /// Temp-store path
    pub fn temp_path(&self) -> &Path {
        &self.paths.temp
    }

    /// Write `entries` as one snapshot, replacing anything at `path`
    ///
    /// Non-destructive: `entries` is left as it was.
    pub fn write_snapshot(
        &self,
        entries: &Snapshot<K, V>,
        path: &Path,
    ) -> Result<SnapshotInfo, SnapshotError> {
        debug!(target: "spillkv::disk", path = %path.display(), entries = entries.len(), "Writing snapshot");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(path)?);
        write_frame(&mut writer, entries)?;
        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        let size_bytes = fs::metadata(path)?.len();
        debug!(target: "spillkv::disk", path = %path.display(), size_bytes, "Snapshot written");

        Ok(SnapshotInfo {
            path: path.to_path_buf(),
            entries: entries.len(),
            size_bytes,
        })
    }

    /// Move the memory tier's entries into a snapshot at `path`
    ///
    /// Drains the tier first and then writes what it drained, so a key
    /// removed from the tier concurrently is never written. If the write
    /// fails the drained entries go back into the tier, without replacing
    /// anything inserted in the meantime.
    pub fn flush_and_clear(
        &self,
        tier: &MemoryTier<K, V>,
        path: &Path,
    ) -> Result<SnapshotInfo, SnapshotError> {
        let drained = tier.drain();
        match self.write_snapshot(&drained, path) {
            Ok(info) => {
                debug!(target: "spillkv::disk", path = %path.display(), evicted = info.entries, "Memory tier flushed");
                Ok(info)
            }
            Err(e) => {
                let restored = tier.insert_missing(drained);
                debug!(target: "spillkv::disk", path = %path.display(), restored, "Flush failed, entries restored");
                Err(e)
            }
        }
    }

    /// Read the snapshot at `path`
    ///
    /// Fails with [`SnapshotError::Empty`] if the file holds no frame.
    pub fn read_snapshot(&self, path: &Path) -> Result<Snapshot<K, V>, SnapshotError> {
        let mut reader = BufReader::new(File::open(path)?);
        read_frame(&mut reader)?.ok_or_else(|| SnapshotError::Empty {
            path: path.to_path_buf(),
        })
    }

    /// Scan the snapshots at `path` for `key`
    ///
    /// Frames are decoded one at a time until the key turns up or the
    /// stream ends. Running out of frames is not an error.
    pub fn find_key(&self, path: &Path, key: &K) -> Result<Option<V>, SnapshotError> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut frames = 0usize;
        while let Some(mut entries) = read_frame::<_, K, V>(&mut reader)? {
            frames += 1;
            if let Some(value) = entries.remove(key) {
                debug!(target: "spillkv::disk", path = %path.display(), frames, "Key found on disk");
                return Ok(Some(value));
            }
        }
        debug!(target: "spillkv::disk", path = %path.display(), frames, "Key not on disk");
        Ok(None)
    }

    /// Remove `key` from every snapshot at `path`, rewriting the file
    ///
    /// Each frame is rewritten to `path` in turn, so the last frame read
    /// decides the file's final content. Returns whether any frame held
    /// the key.
    pub fn remove_key(&self, path: &Path, key: &K) -> Result<bool, SnapshotError> {
        let frames = self.read_all(path)?;
        let mut removed = false;
        for mut entries in frames {
            removed |= entries.remove(key).is_some();
            self.write_snapshot(&entries, path)?;
        }
        debug!(target: "spillkv::disk", path = %path.display(), removed, "Key removal rewrote snapshot");
        Ok(removed)
    }

    /// Delete the file at `path`
    ///
    /// Returns `false` if there was nothing to delete.
    pub fn discard(&self, path: &Path) -> Result<bool, SnapshotError> {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(target: "spillkv::disk", path = %path.display(), "Snapshot file deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn read_all(&self, path: &Path) -> Result<Vec<Snapshot<K, V>>, SnapshotError> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut frames = Vec::new();
        while let Some(entries) = read_frame(&mut reader)? {
            frames.push(entries);
        }
        Ok(frames)
    }
}
