//! In-memory attribute store for tests.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::store::AttrStore;

/// Driver name used by the fixtures.
pub(crate) const DRIVER: &str = "lego-ev3-l-motor";

/// An in-memory [`AttrStore`] recording every write it receives.
///
/// `write_pause` stretches the window of each write call so overlapping
/// writers are actually observed when per-handle locking is broken.
pub(crate) struct FakeStore {
    files: Mutex<BTreeMap<PathBuf, String>>,
    dirs: Mutex<BTreeSet<PathBuf>>,
    writes: Mutex<Vec<(PathBuf, String)>>,
    write_pause: Duration,
    busy: AtomicBool,
    overlapped: AtomicBool,
}

impl FakeStore {
    pub(crate) fn new() -> Self {
        Self::with_write_pause(Duration::ZERO)
    }

    pub(crate) fn with_write_pause(write_pause: Duration) -> Self {
        FakeStore {
            files: Mutex::new(BTreeMap::new()),
            dirs: Mutex::new(BTreeSet::new()),
            writes: Mutex::new(Vec::new()),
            write_pause,
            busy: AtomicBool::new(false),
            overlapped: AtomicBool::new(false),
        }
    }

    /// Seeds an attribute value, creating ancestor directories.
    pub(crate) fn insert(&self, path: &str, value: &str) {
        let path = PathBuf::from(path);
        self.register_dirs(path.parent());
        self.files.lock().insert(path, value.to_owned());
    }

    /// Creates a (possibly empty) directory and its ancestors.
    pub(crate) fn mkdir(&self, path: &str) {
        let path = PathBuf::from(path);
        self.register_dirs(Some(path.as_path()));
    }

    /// Drops an attribute so later reads fail.
    pub(crate) fn remove(&self, path: &str) {
        self.files.lock().remove(Path::new(path));
    }

    /// Every write performed against the store, in completion order.
    pub(crate) fn writes(&self) -> Vec<(PathBuf, String)> {
        self.writes.lock().clone()
    }

    /// Whether two write calls were ever in flight at once.
    pub(crate) fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    fn register_dirs(&self, mut dir: Option<&Path>) {
        let mut dirs = self.dirs.lock();
        while let Some(d) = dir {
            if d.as_os_str().is_empty() {
                break;
            }
            dirs.insert(d.to_path_buf());
            dir = d.parent();
        }
    }
}

impl AttrStore for FakeStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such attribute"))
    }

    fn write(&self, path: &Path, data: &str) -> io::Result<()> {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        std::thread::sleep(self.write_pause);
        self.writes
            .lock()
            .push((path.to_path_buf(), data.to_owned()));
        self.files.lock().insert(path.to_path_buf(), data.to_owned());
        self.busy.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn list(&self, path: &Path) -> io::Result<Vec<String>> {
        let dirs = self.dirs.lock();
        if !dirs.contains(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
        }
        let mut names = BTreeSet::new();
        for child in dirs.iter() {
            if child.parent() == Some(path) {
                if let Some(name) = child.file_name() {
                    names.insert(name.to_string_lossy().into_owned());
                }
            }
        }
        for file in self.files.lock().keys() {
            if file.parent() == Some(path) {
                if let Some(name) = file.file_name() {
                    names.insert(name.to_string_lossy().into_owned());
                }
            }
        }
        Ok(names.into_iter().collect())
    }
}

/// Seeds a complete port-to-motor chain: a lego-port node whose `address`
/// matches `port`, a bound device subtree, a mapping entry for the port,
/// and a motor node reporting `driver`.
pub(crate) fn wire_motor(store: &FakeStore, port: &str, node: &str, id: u32, driver: &str) {
    store.insert(&format!("lego-port/{node}/address"), &format!("{port}\n"));
    store.mkdir(&format!(
        "lego-port/{node}/ev3-ports:{port}/{port}:{driver}/tacho-motor/motor{id}"
    ));
    store.insert(
        &format!("tacho-motor/motor{id}/driver_name"),
        &format!("{driver}\n"),
    );
}
