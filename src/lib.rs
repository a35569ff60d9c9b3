//! Pack directories into ZIP / tar.gz archives and unpack them safely.
//!
//! Extraction enforces a per-entry size ceiling ([`CompressOptions::max_size`])
//! and refuses entries whose names would escape the destination directory.
//!
//! ```no_run
//! use safe_pack::{CompressOptions, FsPath};
//!
//! let source = FsPath::new("/tmp/src")?;
//! let (archive, files) = safe_pack::compress_dir_to_zip(&source, "src_archive")?;
//! println!("packed {} files into {}", files, archive);
//!
//! // Unpacks into /tmp/out/src_archive/
//! safe_pack::extract_zip(&archive, "/tmp/out", CompressOptions::default().max_size(1 << 20))?;
//! # Ok::<(), safe_pack::Error>(())
//! ```

pub mod adapter;
mod driver;
pub mod entry;
mod error;
mod format;
mod options;
mod packer;
mod path;
pub mod policy;

pub use adapter::{TarAdapter, ZipAdapter};
pub use driver::{extract, extract_tar_gz, extract_zip, list_entries, Driver, ExtractionReport};
pub use entry::{EntryInfo, EntryKind};
pub use error::{Error, Result};
pub use format::ArchiveFormat;
pub use options::{CompressOptions, DEFAULT_MAX_SIZE};
pub use packer::{
    compress_dir_to_tar_gz, compress_dir_to_zip, EntryWriter, TarGzEntryWriter, ZipEntryWriter,
};
pub use path::{FsPath, DIR_MODE, FILE_MODE};
