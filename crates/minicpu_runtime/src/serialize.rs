//! Machine snapshot serialization using `MessagePack`.
//!
//! Snapshots are wrapped in a small versioned envelope so a dump records how
//! many instructions ran before it was taken.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use minicpu_foundation::{Error, ErrorKind, Result};
use minicpu_language::Snapshot;
use serde::{Deserialize, Serialize};

/// Current dump format version.
pub const FORMAT_VERSION: u32 = 1;

/// A dumped machine state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDump {
    /// Dump format version.
    pub version: u32,
    /// Instructions executed before the dump.
    pub steps: u64,
    /// Registers, flags, stack, and program counter.
    pub snapshot: Snapshot,
}

impl StateDump {
    /// Wraps a snapshot in the current format.
    #[must_use]
    pub fn new(snapshot: Snapshot, steps: u64) -> Self {
        Self {
            version: FORMAT_VERSION,
            steps,
            snapshot,
        }
    }
}

/// Serializes a dump to bytes using `MessagePack` format.
///
/// Uses named serialization to preserve struct field names.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(dump: &StateDump) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(dump).map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

/// Deserializes a dump from `MessagePack` bytes.
///
/// # Errors
///
/// Returns an error if deserialization fails or the format version is
/// unsupported.
pub fn from_bytes(bytes: &[u8]) -> Result<StateDump> {
    let dump: StateDump = rmp_serde::from_slice(bytes)
        .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))?;
    if dump.version != FORMAT_VERSION {
        return Err(Error::new(ErrorKind::Serialization(format!(
            "unsupported dump version {} (expected {FORMAT_VERSION})",
            dump.version
        ))));
    }
    Ok(dump)
}

/// Saves a dump to a file using `MessagePack` format.
///
/// Creates the file if it doesn't exist, or overwrites it if it does.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to,
/// or if serialization fails.
pub fn save_to_file<P: AsRef<Path>>(dump: &StateDump, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| {
        Error::io(format!("failed to create file '{}': {e}", path.display()))
    })?;

    let mut writer = BufWriter::new(file);
    let bytes = to_bytes(dump)?;

    writer
        .write_all(&bytes)
        .and_then(|()| writer.flush())
        .map_err(|e| Error::io(format!("failed to write to file '{}': {e}", path.display())))?;

    Ok(())
}

/// Loads a dump from a `MessagePack` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or if deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<StateDump> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::io(format!("failed to open file '{}': {e}", path.display())))?;

    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(format!("failed to read file '{}': {e}", path.display())))?;

    from_bytes(&bytes)
}
