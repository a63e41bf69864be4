//! Atomic, collision-aware file persistence.
//!
//! Content is written to a temporary file in the target's directory and
//! renamed into place, so a partially-written file is never visible at
//! the target path. Writes on one instance are serialized by an
//! exclusive lock; read-only accessors take the shared lock.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::{debug, warn};
use serde::Deserialize;
use tempfile::NamedTempFile;

/// Bound on suffix probing before falling back to overwrite.
const MAX_SUFFIX_ATTEMPTS: u32 = 1000;

/// What to do when the target path already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Always replace the existing file.
    Overwrite,
    /// Leave the existing file untouched and report the write skipped.
    Skip,
    /// Probe `name_1.ext`, `name_2.ext`, ... and write to the first
    /// free name; after [`MAX_SUFFIX_ATTEMPTS`] probes, overwrite the
    /// original target with a logged warning.
    Suffix,
}

pub struct AtomicWriter {
    policy: CollisionPolicy,
    last_written: RwLock<Option<PathBuf>>,
}

impl AtomicWriter {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            last_written: RwLock::new(None),
        }
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Write content to the target path under the configured collision
    /// policy. Returns `Ok(false)` when the write was skipped; I/O
    /// failures propagate after the temporary file is cleaned up.
    pub fn write(&self, target: &Path, content: &str) -> std::io::Result<bool> {
        let mut last = match self.last_written.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let resolved = match self.resolve_collision(target) {
            Some(path) => path,
            None => {
                debug!("write skipped, file exists: {}", target.display());
                return Ok(false);
            }
        };

        write_atomically(&resolved, content)?;
        debug!("wrote file: {}", resolved.display());
        *last = Some(resolved);
        Ok(true)
    }

    /// Path of the most recent successful write, if any.
    pub fn last_written_path(&self) -> Option<PathBuf> {
        match self.last_written.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn resolve_collision(&self, target: &Path) -> Option<PathBuf> {
        if !target.exists() {
            return Some(target.to_path_buf());
        }

        match self.policy {
            CollisionPolicy::Overwrite => Some(target.to_path_buf()),
            CollisionPolicy::Skip => None,
            CollisionPolicy::Suffix => Some(suffixed_path(target)),
        }
    }
}

/// First free `name_N.ext` sibling, or the original target when every
/// probe within the bound is taken.
fn suffixed_path(target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    // A leading dot (".gitignore") is a name, not an extension.
    let (base, extension) = match file_name.rfind('.') {
        Some(dot) if dot > 0 => (&file_name[..dot], &file_name[dot..]),
        _ => (file_name.as_str(), ""),
    };

    let parent = target.parent().unwrap_or_else(|| Path::new(""));
    for i in 1..MAX_SUFFIX_ATTEMPTS {
        let candidate = parent.join(format!("{}_{}{}", base, i, extension));
        if !candidate.exists() {
            debug!("resolved collision to: {}", candidate.display());
            return candidate;
        }
    }

    warn!(
        "no free file name after {} attempts, overwriting {}",
        MAX_SUFFIX_ATTEMPTS,
        target.display()
    );
    target.to_path_buf()
}

fn write_atomically(target: &Path, content: &str) -> std::io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent)?;
            parent
        }
        _ => Path::new("."),
    };

    // The temp file is removed on drop, so a failed write leaves
    // nothing behind; persist() renames it over the target atomically.
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.flush()?;
    temp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
