//! Absolute path handle used by the packer and the extractor.
//!
//! An [`FsPath`] is resolved and normalized once, at construction. All later
//! path arithmetic (`join`, `parent`, `relative_to`) is purely lexical, so the
//! handle keeps pointing at the same location even if the working directory
//! changes afterwards.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Default permission bits for directories created by this crate.
pub const DIR_MODE: u32 = 0o755;
/// Default permission bits for files created by this crate.
pub const FILE_MODE: u32 = 0o644;

/// Immutable handle to a filesystem location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FsPath {
    abs_path: PathBuf,
    name: String,
    stem: String,
    suffix: String,
}

impl FsPath {
    /// Resolve `path` to an absolute, normalized handle.
    ///
    /// Relative inputs are resolved against the current working directory.
    /// Fails only if the working directory cannot be determined.
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        Ok(Self::from_normalized(normalize(&absolute)))
    }

    fn from_normalized(abs_path: PathBuf) -> Self {
        let name = abs_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = abs_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = abs_path
            .extension()
            .map(|s| format!(".{}", s.to_string_lossy()))
            .unwrap_or_default();

        Self {
            abs_path,
            name,
            stem,
            suffix,
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.abs_path
    }

    /// Final component including its suffix (`"file.txt"`). Empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Final component without its last suffix (`"archive.tar"` for `archive.tar.gz`).
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Last suffix including the dot (`".gz"`), or empty.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn exists(&self) -> bool {
        self.abs_path.exists()
    }

    pub fn is_dir(&self) -> bool {
        self.abs_path.is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.abs_path.is_file()
    }

    /// Lexically join `segment` onto this path.
    ///
    /// A leading root or prefix in `segment` is ignored, so the result is
    /// always built on top of `self`. `..` components are resolved, which
    /// means the result may land outside of `self`; use
    /// [`relative_to`](Self::relative_to) to check containment.
    pub fn join<P: AsRef<Path>>(&self, segment: P) -> FsPath {
        let mut joined = self.abs_path.clone();
        for component in segment.as_ref().components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                Component::ParentDir => {
                    joined.pop();
                }
                Component::Normal(part) => joined.push(part),
            }
        }
        Self::from_normalized(joined)
    }

    /// Parent directory. The root is its own parent.
    pub fn parent(&self) -> FsPath {
        match self.abs_path.parent() {
            Some(parent) => Self::from_normalized(parent.to_path_buf()),
            None => self.clone(),
        }
    }

    /// Path of `self` relative to `base`, if `self` is `base` or lies below it.
    pub fn relative_to(&self, base: &FsPath) -> Option<PathBuf> {
        self.abs_path
            .strip_prefix(&base.abs_path)
            .ok()
            .map(Path::to_path_buf)
    }

    /// Create this directory and any missing ancestors.
    ///
    /// `mode` is honored on Unix only (subject to the process umask).
    pub fn mkdir_all(&self, mode: u32) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode & 0o777);
        }
        #[cfg(not(unix))]
        let _ = mode;
        builder.create(&self.abs_path)
    }

    /// Create the parent directory chain of this path.
    pub fn mk_parent_dir(&self) -> io::Result<()> {
        self.parent().mkdir_all(DIR_MODE)
    }

    /// Open for reading.
    pub fn open(&self) -> io::Result<File> {
        File::open(&self.abs_path)
    }

    /// Create or truncate for writing.
    ///
    /// An existing symlink at this location is removed first, so the write
    /// never follows it. `mode` applies to newly created files on Unix.
    pub fn create(&self, mode: u32) -> io::Result<File> {
        if let Ok(m) = fs::symlink_metadata(&self.abs_path) {
            if m.file_type().is_symlink() {
                fs::remove_file(&self.abs_path)?;
            }
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode & 0o777);
        }
        #[cfg(not(unix))]
        let _ = mode;
        options.open(&self.abs_path)
    }
}

impl fmt::Display for FsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abs_path.display())
    }
}

impl AsRef<Path> for FsPath {
    fn as_ref(&self) -> &Path {
        &self.abs_path
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::RootDir => result.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
        }
    }

    result
}
