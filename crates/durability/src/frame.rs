//! Snapshot frame format
//!
//! A snapshot file is a sequence of frames. Every write truncates the file,
//! so in practice a file holds exactly one frame.
//!
//! ## Frame Layout
//!
//! ```text
//! +------------------+
//! | Magic (8 bytes)  |  "SPILLKV1"
//! +------------------+
//! | Version (4)      |  Format version (1)
//! +------------------+
//! | Entries          |  bincode-encoded map
//! +------------------+
//! ```
//!
//! The entry encoding is bincode's default (fixed-width little-endian), so
//! files are tied to the key and value types that wrote them.

use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use thiserror::Error;

use spillkv_core::{SpillKey, SpillValue};
use spillkv_storage::Snapshot;

/// Frame magic bytes
pub const SNAPSHOT_MAGIC: [u8; 8] = *b"SPILLKV1";

/// Frame format version 1
pub const SNAPSHOT_VERSION_1: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct FrameHeader {
    magic: [u8; 8],
    version: u32,
}

impl FrameHeader {
    fn current() -> Self {
        FrameHeader {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION_1,
        }
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidMagic {
                found: self.magic.to_vec(),
            });
        }
        if self.version != SNAPSHOT_VERSION_1 {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Encode one frame
pub(crate) fn write_frame<W, K, V>(
    writer: &mut W,
    entries: &Snapshot<K, V>,
) -> Result<(), SnapshotError>
where
    W: Write,
    K: SpillKey,
    V: SpillValue,
{
    bincode::serialize_into(&mut *writer, &FrameHeader::current())?;
    bincode::serialize_into(&mut *writer, entries)?;
    Ok(())
}

/// Decode the next frame, or `None` at a clean end of stream
///
/// End of stream between frames is normal termination. Running out of
/// bytes inside a frame is a codec error.
pub(crate) fn read_frame<R, K, V>(
    reader: &mut R,
) -> Result<Option<Snapshot<K, V>>, SnapshotError>
where
    R: BufRead,
    K: SpillKey,
    V: SpillValue,
{
    if reader.fill_buf()?.is_empty() {
        return Ok(None);
    }
    let header: FrameHeader = bincode::deserialize_from(&mut *reader)?;
    header.validate()?;
    let entries: Snapshot<K, V> = bincode::deserialize_from(&mut *reader)?;
    Ok(Some(entries))
}

/// Information about a written snapshot
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    /// Path written
    pub path: PathBuf,
    /// Number of entries in the snapshot
    pub entries: usize,
    /// File size in bytes
    pub size_bytes: u64,
}

/// Snapshot errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding failed (includes truncated frames)
    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Invalid magic bytes
    #[error("Invalid magic bytes: expected SPILLKV1, found {:?}", found)]
    InvalidMagic {
        /// Found bytes
        found: Vec<u8>,
    },

    /// Unsupported version
    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),

    /// File holds no snapshot
    #[error("No snapshot in {}", path.display())]
    Empty {
        /// Path read
        path: PathBuf,
    },
}

impl SnapshotError {
    /// Whether this error means the file does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, SnapshotError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

impl From<SnapshotError> for spillkv_core::Error {
    fn from(e: SnapshotError) -> Self {
        use spillkv_core::Error;
        match e {
            SnapshotError::Io(io) => Error::IoError(io),
            SnapshotError::Codec(codec) => Error::SerializationError(codec.to_string()),
            other => Error::Corruption(other.to_string()),
        }
    }
}
