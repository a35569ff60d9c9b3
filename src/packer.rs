//! Directory-to-archive packing.
//!
//! One directory walk feeds every format. The format-specific part is an
//! [`EntryWriter`]: it begins an entry (a ZIP local header, or a TAR header
//! built from the file's metadata) and streams the file body into it.

use std::fs::{File, Metadata};
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::error::{Error, IoContext, Result};
use crate::format::ArchiveFormat;
use crate::path::{FsPath, FILE_MODE};

/// Files at or above this size need ZIP64 extensions.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Format-specific sink for archive entries.
pub trait EntryWriter {
    /// Begin an entry called `name` and copy `source` into it.
    ///
    /// `metadata` describes `source`; writers use it for the entry header.
    fn write_entry(&mut self, name: &str, metadata: &Metadata, source: &mut dyn Read)
        -> Result<()>;

    /// Write trailers and flush everything down to the underlying file.
    fn finish(self) -> Result<()>
    where
        Self: Sized;
}

/// Writes entries into a ZIP container. Directories are implied by names.
pub struct ZipEntryWriter<W: Write + Seek> {
    zip: zip::ZipWriter<W>,
}

impl<W: Write + Seek> ZipEntryWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            zip: zip::ZipWriter::new(inner),
        }
    }
}

impl<W: Write + Seek> EntryWriter for ZipEntryWriter<W> {
    fn write_entry(
        &mut self,
        name: &str,
        metadata: &Metadata,
        source: &mut dyn Read,
    ) -> Result<()> {
        #[allow(unused_mut)]
        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(metadata.len() >= ZIP64_THRESHOLD);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            options = options.unix_permissions(metadata.permissions().mode() & 0o777);
        }

        self.zip.start_file(name, options)?;
        std::io::copy(source, &mut self.zip)
            .with_context(|| format!("failed to write file {}", name))?;
        Ok(())
    }

    fn finish(self) -> Result<()> {
        let mut inner = self.zip.finish()?;
        inner.flush().context("failed to flush zip file")?;
        Ok(())
    }
}

/// Writes entries into a gzip-compressed TAR stream.
///
/// TAR multiplexes headers and bodies on one stream, so each entry is a
/// header followed by exactly `size` body bytes before the next header.
pub struct TarGzEntryWriter<W: Write> {
    builder: tar::Builder<GzEncoder<W>>,
}

impl<W: Write> TarGzEntryWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            builder: tar::Builder::new(GzEncoder::new(inner, Compression::default())),
        }
    }
}

impl<W: Write> EntryWriter for TarGzEntryWriter<W> {
    fn write_entry(
        &mut self,
        name: &str,
        metadata: &Metadata,
        source: &mut dyn Read,
    ) -> Result<()> {
        let mut header = tar::Header::new_gnu();
        header.set_metadata(metadata);
        header.set_size(metadata.len());

        // append_data records `name` in place of the on-disk path
        self.builder
            .append_data(&mut header, name, source.take(metadata.len()))
            .with_context(|| format!("failed to write tar entry {}", name))
    }

    fn finish(self) -> Result<()> {
        let encoder = self
            .builder
            .into_inner()
            .context("failed to finish tar stream")?;
        let mut inner = encoder.finish().context("failed to finish gzip stream")?;
        inner.flush().context("failed to flush tar.gz file")?;
        Ok(())
    }
}

/// Pack every regular file below `source` into a ZIP archive.
///
/// The archive is created next to `source` (in its parent directory) as
/// `archive_name`, with `.zip` appended if missing. An existing file of
/// that name is replaced. Returns the archive path and the number of files
/// written.
///
/// # Errors
///
/// [`Error::NotADirectory`] if `source` is not a directory (nothing is
/// created in that case); [`Error::Io`], [`Error::Zip`] or [`Error::Walk`]
/// for failures while packing.
pub fn compress_dir_to_zip(source: &FsPath, archive_name: &str) -> Result<(FsPath, usize)> {
    compress_dir(source, archive_name, ArchiveFormat::Zip, ZipEntryWriter::new)
}

/// Pack every regular file below `source` into a `.tar.gz` archive.
///
/// Same placement, naming and error contract as [`compress_dir_to_zip`].
pub fn compress_dir_to_tar_gz(source: &FsPath, archive_name: &str) -> Result<(FsPath, usize)> {
    compress_dir(source, archive_name, ArchiveFormat::TarGz, TarGzEntryWriter::new)
}

fn compress_dir<W, F>(
    source: &FsPath,
    archive_name: &str,
    format: ArchiveFormat,
    make_writer: F,
) -> Result<(FsPath, usize)>
where
    W: EntryWriter,
    F: FnOnce(BufWriter<File>) -> W,
{
    if !source.is_dir() {
        return Err(Error::NotADirectory {
            path: source.as_path().to_path_buf(),
        });
    }

    let archive = source.parent().join(format.archive_file_name(archive_name));
    let file = archive
        .create(FILE_MODE)
        .with_context(|| format!("failed to create {} file {}", format.suffix(), archive))?;

    let mut writer = make_writer(BufWriter::new(file));
    let total_files = write_dir(source, &mut writer)?;
    writer.finish()?;

    log::info!("packed {} files from {} into {}", total_files, source, archive);
    Ok((archive, total_files))
}

/// Walk `source` in lexical order and hand each regular file to `writer`.
fn write_dir<W: EntryWriter>(source: &FsPath, writer: &mut W) -> Result<usize> {
    let mut total_files = 0;

    for entry in WalkDir::new(source.as_path()).sort_by_file_name() {
        let entry = entry?;
        let file_type = entry.file_type();

        if file_type.is_dir() {
            continue;
        }
        if !file_type.is_file() {
            log::warn!("skipping non-regular file {}", entry.path().display());
            continue;
        }

        let name = entry_name(source.as_path(), entry.path())?;
        let mut file = File::open(entry.path())
            .with_context(|| format!("failed to open file {}", entry.path().display()))?;
        let metadata = file
            .metadata()
            .with_context(|| format!("failed to stat file {}", entry.path().display()))?;

        writer.write_entry(&name, &metadata, &mut file)?;
        log::debug!("added {} ({} bytes)", name, metadata.len());
        total_files += 1;
    }

    Ok(total_files)
}

/// `/`-separated name of `path` relative to `root`.
fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|e| Error::Io {
        context: format!("{} is not below {}", path.display(), root.display()),
        source: std::io::Error::other(e),
    })?;

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
