/// Default per-entry ceiling: 1 GiB.
pub const DEFAULT_MAX_SIZE: u64 = 1024 * 1024 * 1024;

/// Options for packing and unpacking.
///
/// Built once per call and left untouched while it runs.
///
/// ```
/// use safe_pack::CompressOptions;
///
/// let options = CompressOptions::default().max_size(10 * 1024 * 1024);
/// assert_eq!(options.max_size, 10 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
    /// Maximum size in bytes of any single archived file.
    pub max_size: u64,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl CompressOptions {
    /// Override the per-entry size ceiling.
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }
}
