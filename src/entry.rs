//! Format-independent view of one archive entry.

/// What an entry represents on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file with a byte stream.
    File,
    /// Directory.
    Directory,
    /// Symbolic or hard link. Never materialized.
    Symlink { target: String },
    /// Device file, fifo and the like. Never materialized.
    Unsupported { kind: String },
}

/// Metadata for one archive entry, produced while iterating the archive.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Raw entry name as stored in the archive.
    pub name: String,
    /// Declared uncompressed size.
    pub size: u64,
    pub kind: EntryKind,
    /// Unix permission bits, if the archive recorded them.
    pub mode: Option<u32>,
}

impl EntryInfo {
    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }
}
