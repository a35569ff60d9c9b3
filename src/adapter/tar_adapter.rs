//! TAR archive adapter.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::entry::{EntryInfo, EntryKind};
use crate::error::{IoContext, Result};

/// Adapter for TAR archives.
///
/// Unlike ZIP, TAR is a sequential format without a central directory:
/// headers and bodies are interleaved on one stream, so entries can only
/// be visited in order, once.
pub struct TarAdapter<R: Read> {
    archive: tar::Archive<R>,
}

impl<R: Read> TarAdapter<R> {
    /// Create a new TarAdapter from an uncompressed tar stream.
    ///
    /// For `.tar.gz` files, wrap the reader in `GzDecoder` first,
    /// or use `TarAdapter::open_gz()`.
    pub fn new(reader: R) -> Self {
        Self {
            archive: tar::Archive::new(reader),
        }
    }

    /// Process each entry with a callback.
    ///
    /// The callback receives entry info and, for regular files, a reader
    /// bounded to the entry's declared size. The end of the entry stream
    /// ends the iteration normally.
    ///
    /// Return `Ok(true)` to continue, `Ok(false)` to stop, or `Err` to abort.
    pub fn for_each<F>(&mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(EntryInfo, Option<&mut dyn Read>) -> Result<bool>,
    {
        let entries = self
            .archive
            .entries()
            .context("failed to read tar stream")?;

        for entry_result in entries {
            let mut entry = entry_result.context("failed to read tar entry")?;
            let info = entry_info(&entry)?;

            let continue_extraction = if info.is_file() {
                callback(info, Some(&mut entry))?
            } else {
                callback(info, None)?
            };

            if !continue_extraction {
                break;
            }
        }

        Ok(())
    }

    /// Read metadata for every entry. Bodies are skipped, not inflated to disk.
    pub fn list(&mut self) -> Result<Vec<EntryInfo>> {
        let mut entries = Vec::new();
        self.for_each(|info, _| {
            entries.push(info);
            Ok(true)
        })?;
        Ok(entries)
    }
}

impl TarAdapter<GzDecoder<BufReader<File>>> {
    /// Open a gzip-compressed TAR file (.tar.gz, .tgz) from a path.
    pub fn open_gz<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open tar.gz file {}", path.display()))?;
        let decoder = GzDecoder::new(BufReader::new(file));
        Ok(Self::new(decoder))
    }
}

fn entry_info<R: Read>(entry: &tar::Entry<'_, R>) -> Result<EntryInfo> {
    let header = entry.header();
    let name = entry
        .path()
        .context("invalid path in tar header")?
        .to_string_lossy()
        .into_owned();

    let entry_type = header.entry_type();
    let kind = match entry_type {
        tar::EntryType::Regular | tar::EntryType::Continuous => EntryKind::File,
        tar::EntryType::Directory => EntryKind::Directory,
        tar::EntryType::Symlink | tar::EntryType::Link => {
            let target = entry
                .link_name()
                .with_context(|| format!("invalid link target for {}", name))?
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            EntryKind::Symlink { target }
        }
        other => EntryKind::Unsupported {
            kind: entry_type_name(other),
        },
    };

    Ok(EntryInfo {
        size: header
            .size()
            .with_context(|| format!("invalid size in tar header for {}", name))?,
        name,
        kind,
        mode: header.mode().ok(),
    })
}

/// Convert TAR entry type to a human-readable name.
fn entry_type_name(entry_type: tar::EntryType) -> String {
    match entry_type {
        tar::EntryType::Char => "character device".into(),
        tar::EntryType::Block => "block device".into(),
        tar::EntryType::Fifo => "fifo (named pipe)".into(),
        tar::EntryType::GNUSparse => "GNU sparse file".into(),
        tar::EntryType::XGlobalHeader => "pax global header".into(),
        _ => format!("unknown (0x{:02x})", entry_type.as_byte()),
    }
}
