//! Archive-to-directory extraction.
//!
//! The driver orchestrates extraction using adapters (format-specific) and
//! policies (security checks). Every entry goes through the same steps:
//!
//! 1. path policy (traversal guard), then size policy
//! 2. directories are created, files are streamed to disk
//! 3. the number of bytes written must match the declared size
//!
//! Extraction is streaming: if entry N fails, entries 1..N-1 stay on disk.

use std::io::{Read, Seek};
use std::path::Path;

use crate::adapter::{copy_limited, TarAdapter, ZipAdapter};
use crate::entry::{EntryInfo, EntryKind};
use crate::error::{Error, IoContext, Result};
use crate::format::ArchiveFormat;
use crate::options::CompressOptions;
use crate::path::{FsPath, DIR_MODE, FILE_MODE};
use crate::policy::{PathPolicy, PolicyChain, SizePolicy};

/// Extraction report with statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Number of files successfully extracted.
    pub files_extracted: usize,
    /// Number of directory entries created.
    pub dirs_created: usize,
    /// Total bytes written.
    pub bytes_written: u64,
    /// Number of entries skipped (links, device files).
    pub entries_skipped: usize,
}

/// Extracts archive entries under a fixed root directory.
pub struct Driver {
    root: FsPath,
    options: CompressOptions,
    policies: PolicyChain,
}

impl Driver {
    /// Create a driver extracting into `root`, creating it if absent.
    pub fn new(root: FsPath, options: CompressOptions) -> Result<Self> {
        root.mkdir_all(DIR_MODE)
            .with_context(|| format!("failed to create subdirectory {}", root))?;

        let policies = PolicyChain::new()
            .with(PathPolicy::new(&root)?)
            .with(SizePolicy::new(options.max_size));

        Ok(Self {
            root,
            options,
            policies,
        })
    }

    pub fn root(&self) -> &FsPath {
        &self.root
    }

    /// Extract a ZIP archive.
    pub fn extract_zip<R: Read + Seek>(
        &self,
        mut adapter: ZipAdapter<R>,
    ) -> Result<ExtractionReport> {
        let mut report = ExtractionReport::default();
        adapter.for_each(|info, reader| {
            self.extract_entry(&info, reader, &mut report)?;
            Ok(true)
        })?;
        Ok(report)
    }

    /// Extract a TAR archive.
    ///
    /// For `.tar.gz` files, use [`TarAdapter::open_gz`] or wrap the reader
    /// in `flate2::read::GzDecoder`.
    pub fn extract_tar<R: Read>(&self, mut adapter: TarAdapter<R>) -> Result<ExtractionReport> {
        let mut report = ExtractionReport::default();
        adapter.for_each(|info, reader| {
            self.extract_entry(&info, reader, &mut report)?;
            Ok(true)
        })?;
        Ok(report)
    }

    fn extract_entry(
        &self,
        info: &EntryInfo,
        reader: Option<&mut dyn Read>,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        self.policies.check_all(info)?;

        let target = self.root.join(&info.name);
        let mode = info.mode.map(|m| m & 0o777).filter(|m| *m != 0);

        match &info.kind {
            EntryKind::Directory => {
                target
                    .mkdir_all(mode.unwrap_or(DIR_MODE))
                    .with_context(|| format!("failed to create directory {}", target))?;

                // The directory may predate this entry (created as a file's
                // parent), and DirBuilder's mode is filtered by umask.
                #[cfg(unix)]
                if let Some(mode) = mode {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::set_permissions(target.as_path(), std::fs::Permissions::from_mode(mode))
                        .with_context(|| format!("failed to set permissions on {}", target))?;
                }

                report.dirs_created += 1;
            }
            EntryKind::File => {
                let Some(reader) = reader else {
                    return Err(Error::Io {
                        context: format!("no data stream for {}", info.name),
                        source: std::io::ErrorKind::UnexpectedEof.into(),
                    });
                };

                target
                    .mk_parent_dir()
                    .with_context(|| format!("failed to create parent directory of {}", target))?;

                let mut outfile = target
                    .create(mode.unwrap_or(FILE_MODE))
                    .with_context(|| format!("failed to create destination file {}", target))?;

                let written = copy_limited(reader, &mut outfile, self.options.max_size)
                    .with_context(|| format!("failed to write file {}", info.name))?;

                if written != info.size {
                    return Err(Error::IncompleteWrite {
                        entry: info.name.clone(),
                        written,
                        expected: info.size,
                    });
                }

                // Creation mode is filtered by umask and ignored for
                // truncated files; apply the masked bits explicitly.
                #[cfg(unix)]
                if let Some(mode) = mode {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::set_permissions(target.as_path(), std::fs::Permissions::from_mode(mode))
                        .with_context(|| format!("failed to set permissions on {}", target))?;
                }

                log::debug!("extracted {} ({} bytes)", info.name, written);
                report.bytes_written += written;
                report.files_extracted += 1;
            }
            EntryKind::Symlink { target: link } => {
                log::warn!("skipping link entry '{}' -> '{}'", info.name, link);
                report.entries_skipped += 1;
            }
            EntryKind::Unsupported { kind } => {
                log::warn!("skipping unsupported entry '{}' ({})", info.name, kind);
                report.entries_skipped += 1;
            }
        }

        Ok(())
    }
}

/// Extraction root for `archive`: `<dest_dir>/<archive name without suffix>`.
fn extraction_root(archive: &FsPath, dest_dir: &Path, format: ArchiveFormat) -> Result<FsPath> {
    let dest = FsPath::new(dest_dir)
        .with_context(|| format!("failed to resolve {}", dest_dir.display()))?;
    Ok(dest.join(format.base_name(archive.name())))
}

/// Extract a ZIP archive into `<dest_dir>/<archive base name>/`.
///
/// # Errors
///
/// - [`Error::IllegalPath`] if an entry would land outside the extraction root
/// - [`Error::FileTooLarge`] if an entry declares more than `options.max_size` bytes
/// - [`Error::IncompleteWrite`] if the bytes written differ from the declared size
/// - [`Error::Zip`] / [`Error::Io`] for codec and filesystem failures
pub fn extract_zip<P: AsRef<Path>>(
    archive: &FsPath,
    dest_dir: P,
    options: CompressOptions,
) -> Result<ExtractionReport> {
    let root = extraction_root(archive, dest_dir.as_ref(), ArchiveFormat::Zip)?;
    let adapter = ZipAdapter::open(archive)?;
    let report = Driver::new(root, options)?.extract_zip(adapter)?;
    log::info!(
        "extracted {} files ({} bytes) from {}",
        report.files_extracted,
        report.bytes_written,
        archive
    );
    Ok(report)
}

/// Extract a gzip-compressed TAR archive into `<dest_dir>/<archive base name>/`.
///
/// Same error contract as [`extract_zip`]; TAR format errors surface as
/// [`Error::Io`].
pub fn extract_tar_gz<P: AsRef<Path>>(
    archive: &FsPath,
    dest_dir: P,
    options: CompressOptions,
) -> Result<ExtractionReport> {
    let root = extraction_root(archive, dest_dir.as_ref(), ArchiveFormat::TarGz)?;
    let adapter = TarAdapter::open_gz(archive)?;
    let report = Driver::new(root, options)?.extract_tar(adapter)?;
    log::info!(
        "extracted {} files ({} bytes) from {}",
        report.files_extracted,
        report.bytes_written,
        archive
    );
    Ok(report)
}

/// Extract `archive`, picking the format from its file name.
pub fn extract<P: AsRef<Path>>(
    archive: &FsPath,
    dest_dir: P,
    options: CompressOptions,
) -> Result<ExtractionReport> {
    match detect(archive)? {
        ArchiveFormat::Zip => extract_zip(archive, dest_dir, options),
        ArchiveFormat::TarGz => extract_tar_gz(archive, dest_dir, options),
    }
}

/// List the entries of `archive` without extracting, picking the format
/// from its file name.
pub fn list_entries(archive: &FsPath) -> Result<Vec<EntryInfo>> {
    match detect(archive)? {
        ArchiveFormat::Zip => ZipAdapter::open(archive)?.list(),
        ArchiveFormat::TarGz => TarAdapter::open_gz(archive)?.list(),
    }
}

fn detect(archive: &FsPath) -> Result<ArchiveFormat> {
    ArchiveFormat::detect(archive).ok_or_else(|| Error::Io {
        context: format!("unrecognized archive format: {}", archive),
        source: std::io::ErrorKind::Unsupported.into(),
    })
}
