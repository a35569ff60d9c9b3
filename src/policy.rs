//! Security policies for archive extraction.
//!
//! Policies validate entries before they are extracted, providing
//! protection against path traversal (Zip Slip) and oversized entries.

use std::path::Path;

use path_jail::Jail;

use crate::entry::EntryInfo;
use crate::error::{Error, Result};
use crate::path::FsPath;

/// A security policy that validates entries before extraction.
pub trait Policy: Send + Sync {
    /// Validate an entry against this policy.
    ///
    /// Returns `Ok(())` if the entry passes, or an error if it violates the policy.
    fn check(&self, entry: &EntryInfo) -> Result<()>;
}

/// A chain of policies that all must pass, checked in insertion order.
pub struct PolicyChain {
    policies: Vec<Box<dyn Policy>>,
}

impl PolicyChain {
    /// Create a new empty policy chain.
    pub fn new() -> Self {
        Self {
            policies: Vec::new(),
        }
    }

    /// Add a policy to the chain.
    pub fn with<P: Policy + 'static>(mut self, policy: P) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    /// Check all policies against an entry. The first failure wins.
    pub fn check_all(&self, entry: &EntryInfo) -> Result<()> {
        for policy in &self.policies {
            policy.check(entry)?;
        }
        Ok(())
    }
}

impl Default for PolicyChain {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Path Security Policy
// ============================================================================

/// Policy that prevents path traversal attacks (Zip Slip).
///
/// An entry passes when its name is relative and, joined under the
/// extraction root, stays the root or a descendant of it. The name is then
/// also resolved through a [`Jail`] so a symlink already on disk cannot
/// redirect the write.
pub struct PathPolicy {
    root: FsPath,
    jail: Jail,
}

impl PathPolicy {
    /// Create a new path policy for the given extraction root.
    ///
    /// The root must already exist.
    pub fn new(root: &FsPath) -> Result<Self> {
        let jail = Jail::new(root.as_path()).map_err(|e| Error::IllegalPath {
            entry: root.to_string(),
            detail: e.to_string(),
        })?;
        Ok(Self {
            root: root.clone(),
            jail,
        })
    }
}

impl Policy for PathPolicy {
    fn check(&self, entry: &EntryInfo) -> Result<()> {
        let name = entry.name.as_str();

        if name.starts_with('/') || name.starts_with('\\') || Path::new(name).has_root() {
            return Err(Error::IllegalPath {
                entry: entry.name.clone(),
                detail: "absolute path".to_string(),
            });
        }

        let target = self.root.join(name);
        if target.relative_to(&self.root).is_none() {
            return Err(Error::IllegalPath {
                entry: entry.name.clone(),
                detail: format!("resolves to '{}' outside of '{}'", target, self.root),
            });
        }

        self.jail.join(name).map_err(|e| Error::IllegalPath {
            entry: entry.name.clone(),
            detail: e.to_string(),
        })?;

        Ok(())
    }
}

// ============================================================================
// Size Limits Policy
// ============================================================================

/// Policy that rejects file entries declaring more than `max_size` bytes.
pub struct SizePolicy {
    pub max_size: u64,
}

impl SizePolicy {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }
}

impl Policy for SizePolicy {
    fn check(&self, entry: &EntryInfo) -> Result<()> {
        if entry.is_file() && entry.size > self.max_size {
            return Err(Error::FileTooLarge {
                entry: entry.name.clone(),
                size: entry.size,
                limit: self.max_size,
            });
        }
        Ok(())
    }
}
