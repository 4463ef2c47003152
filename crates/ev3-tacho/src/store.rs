//! The attribute store seam.
//!
//! Every attribute of a device is a single text-valued file; reads and
//! writes are whole-value transactions. The [`AttrStore`] trait is the
//! boundary between the motor logic and the host filesystem, so the
//! resolution algorithm and the accessors can be exercised against an
//! in-memory store in tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Whole-value access to a hierarchical attribute file space.
///
/// Paths are relative to the store root. No atomicity is guaranteed beyond
/// what the underlying filesystem provides.
pub trait AttrStore: Send + Sync {
    /// Reads the whole value stored at `path`.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Replaces the whole value stored at `path`.
    fn write(&self, path: &Path, data: &str) -> io::Result<()>;

    /// Lists the entry names of the directory at `path`.
    fn list(&self, path: &Path) -> io::Result<Vec<String>>;
}

/// The real sysfs class tree.
#[derive(Debug, Clone)]
pub struct Sysfs {
    root: PathBuf,
}

impl Sysfs {
    /// Where Linux mounts the device class directories.
    pub const DEFAULT_ROOT: &'static str = "/sys/class";

    /// A store rooted at `root` instead of [`Sysfs::DEFAULT_ROOT`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Sysfs { root: root.into() }
    }

    /// Returns the root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for Sysfs {
    fn default() -> Self {
        Sysfs::new(Self::DEFAULT_ROOT)
    }
}

impl AttrStore for Sysfs {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(self.root.join(path))
    }

    fn write(&self, path: &Path, data: &str) -> io::Result<()> {
        fs::write(self.root.join(path), data)
    }

    fn list(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.root.join(path))? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        // read_dir order is filesystem-dependent; sort so resolution over a
        // fixed tree is deterministic.
        names.sort();
        Ok(names)
    }
}

/// Strips a single trailing line terminator, the way the kernel terminates
/// attribute values.
pub(crate) fn chomp(value: &str) -> &str {
    value.strip_suffix('\n').unwrap_or(value)
}
