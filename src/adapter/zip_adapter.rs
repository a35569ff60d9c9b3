//! ZIP archive adapter.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use crate::entry::{EntryInfo, EntryKind};
use crate::error::{IoContext, Result};

/// Adapter for ZIP archives.
///
/// ZIP has a central directory, so entry metadata can be listed without
/// decompressing anything.
pub struct ZipAdapter<R: Read + Seek> {
    archive: zip::ZipArchive<R>,
}

impl<R: Read + Seek> ZipAdapter<R> {
    /// Create a new ZipAdapter from a seekable reader.
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            archive: zip::ZipArchive::new(reader)?,
        })
    }

    /// Number of entries in the central directory.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Process each entry with a callback, in central-directory order.
    ///
    /// The callback receives entry info and, for regular files, a reader
    /// over the decompressed content.
    ///
    /// Return `Ok(true)` to continue, `Ok(false)` to stop, or `Err` to abort.
    pub fn for_each<F>(&mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(EntryInfo, Option<&mut dyn Read>) -> Result<bool>,
    {
        for i in 0..self.archive.len() {
            let mut file = self.archive.by_index(i)?;
            let info = zip_entry_info(
                file.name(),
                file.size(),
                file.is_dir(),
                file.is_symlink(),
                file.unix_mode(),
            );

            let continue_extraction = if info.is_file() {
                callback(info, Some(&mut file))?
            } else {
                callback(info, None)?
            };

            if !continue_extraction {
                break;
            }
        }

        Ok(())
    }

    /// Read metadata for every entry without decompressing.
    pub fn list(&mut self) -> Result<Vec<EntryInfo>> {
        let mut entries = Vec::with_capacity(self.archive.len());

        for i in 0..self.archive.len() {
            let file = self.archive.by_index_raw(i)?;
            entries.push(zip_entry_info(
                file.name(),
                file.size(),
                file.is_dir(),
                file.is_symlink(),
                file.unix_mode(),
            ));
        }

        Ok(entries)
    }
}

impl ZipAdapter<BufReader<File>> {
    /// Open a ZIP file from a path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open zip file {}", path.display()))?;
        Self::new(BufReader::new(file))
    }
}

fn zip_entry_info(
    name: &str,
    size: u64,
    is_dir: bool,
    is_symlink: bool,
    mode: Option<u32>,
) -> EntryInfo {
    let kind = if is_dir {
        EntryKind::Directory
    } else if is_symlink {
        // ZIP stores the link target as the entry body
        EntryKind::Symlink {
            target: String::new(),
        }
    } else {
        EntryKind::File
    };

    EntryInfo {
        name: name.to_string(),
        size,
        kind,
        mode,
    }
}
