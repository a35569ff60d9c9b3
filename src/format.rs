use std::path::Path;

/// Archive container formats this crate reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    /// Detect the format from a file name suffix (case-insensitive).
    ///
    /// `.zip` is ZIP; `.tar.gz` and `.tgz` are gzip-compressed TAR.
    pub fn detect<P: AsRef<Path>>(path: P) -> Option<Self> {
        let name = path
            .as_ref()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_lowercase();

        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }

    /// Canonical suffix appended to archive names that lack it.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Zip => ".zip",
            Self::TarGz => ".tar.gz",
        }
    }

    fn suffixes(self) -> &'static [&'static str] {
        match self {
            Self::Zip => &[".zip"],
            Self::TarGz => &[".tar.gz", ".tgz"],
        }
    }

    /// `file_name` with `suffix` appended unless it already ends with it.
    pub fn archive_file_name(self, file_name: &str) -> String {
        if file_name.ends_with(self.suffix()) {
            file_name.to_string()
        } else {
            format!("{}{}", file_name, self.suffix())
        }
    }

    /// `file_name` with this format's suffix stripped, if present.
    ///
    /// Matches case-insensitively, like [`detect`](Self::detect).
    pub fn base_name(self, file_name: &str) -> &str {
        self.suffixes()
            .iter()
            .find_map(|suffix| strip_suffix_ignore_case(file_name, suffix))
            .unwrap_or(file_name)
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    let tail = s.get(split..)?;
    if tail.eq_ignore_ascii_case(suffix) {
        s.get(..split)
    } else {
        None
    }
}
