//! Roster snapshot storage.
//!
//! The snapshot is a single pretty-printed JSON array of
//! [`InstructorRecord`]s. Writes always replace the whole file: each write
//! serializes into its own temporary file in the destination directory, which
//! is then renamed over the destination. Readers see either the previous
//! snapshot or the new one, and concurrent writers never share a temp file.

use anyhow::{Context, Result};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::models::InstructorRecord;

pub fn exists(path: &Path) -> bool {
    path.is_file()
}

/// Read and decode the full snapshot.
pub fn load(path: &Path) -> Result<Vec<InstructorRecord>> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open snapshot: {}", path.display()))?;
    let records: Vec<InstructorRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;
    Ok(records)
}

/// Replace the snapshot at `path` with `records`.
pub fn write(path: &Path, records: &[InstructorRecord]) -> Result<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            parent
        }
        None => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(path)
        .with_context(|| format!("Failed to move snapshot into place: {}", path.display()))?;
    Ok(())
}
