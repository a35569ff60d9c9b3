use std::io;
use std::path::PathBuf;

/// Errors that can occur while packing or unpacking an archive.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in minor versions without breaking existing code. Always include a
/// catch-all `_ =>` arm when matching.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Compression source is not an existing directory.
    #[error("'{}' is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    /// Entry resolves outside the extraction root (Zip Slip).
    #[error("illegal file path '{entry}': {detail}")]
    IllegalPath { entry: String, detail: String },

    /// Entry declares more bytes than the configured maximum.
    #[error(
        "file '{entry}' exceeded maximum allowed size: {} (limit: {})",
        format_bytes(*size),
        format_bytes(*limit)
    )]
    FileTooLarge { entry: String, size: u64, limit: u64 },

    /// Bytes written for an entry differ from its declared size.
    #[error(
        "incomplete write of '{entry}': wrote {written} of {expected} bytes \
         (consider increasing the maximum size or checking for disk space issues)"
    )]
    IncompleteWrite {
        entry: String,
        written: u64,
        expected: u64,
    },

    /// IO error (includes TAR format errors since tar crate uses io::Error).
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Zip format error.
    #[error("zip format error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory traversal failed while packing.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io {
            context: "I/O error".to_string(),
            source: e,
        }
    }
}

/// Attach the name of the file in flight to an `io::Error`.
pub(crate) trait IoContext<T> {
    fn context<C: Into<String>>(self, context: C) -> Result<T>;

    fn with_context<C: Into<String>, F: FnOnce() -> C>(self, f: F) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|source| Error::Io {
            context: context.into(),
            source,
        })
    }

    fn with_context<C: Into<String>, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.map_err(|source| Error::Io {
            context: f().into(),
            source,
        })
    }
}

/// Format bytes in human-readable form (e.g., "1.5 GB").
pub(crate) fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
