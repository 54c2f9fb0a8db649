//! Controller catalog and change detection for the controllers directory.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::{Duration, Instant, SystemTime},
};

use walkdir::WalkDir;

/// Lists the controller programs an operator can pick from.
pub trait ControllerCatalog: Send {
    fn list(&self) -> Vec<String>;
}

impl<T: ControllerCatalog + ?Sized> ControllerCatalog for Box<T> {
    fn list(&self) -> Vec<String> {
        (**self).list()
    }
}

/// Every subdirectory of a controllers directory is one controller.
pub struct DirCatalog {
    dir: PathBuf,
    exclude: Option<String>,
}

impl DirCatalog {
    /// `exclude` names the supervisor's own directory, if it lives there too.
    pub fn new(dir: impl Into<PathBuf>, exclude: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            exclude,
        }
    }
}

impl ControllerCatalog for DirCatalog {
    fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    log::warn!("Failed to list controllers: {}", err);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_owned))
            .filter(|name| Some(name) != self.exclude.as_ref())
            .collect();
        names.sort();
        names
    }
}

/// A fixed list, for setups without a controllers directory.
pub struct StaticCatalog(pub Vec<String>);

impl ControllerCatalog for StaticCatalog {
    fn list(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// Lets a reload request through at most once per interval.
#[derive(Debug)]
pub struct ReloadDebouncer {
    interval: Duration,
    last: Instant,
    pending: bool,
}

impl ReloadDebouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
            pending: false,
        }
    }

    pub fn request(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// True when a pending request should be served now.
    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> bool {
        if self.pending && now.saturating_duration_since(self.last) > self.interval {
            self.pending = false;
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Polls a directory tree for changed, added or removed files.
pub struct ControllerWatcher {
    root: PathBuf,
    scan_interval: Duration,
    last_scan: Instant,
    files: BTreeMap<PathBuf, SystemTime>,
}

impl ControllerWatcher {
    pub fn new(root: impl Into<PathBuf>, scan_interval: Duration) -> Self {
        let root = root.into();
        let files = scan(&root);
        log::debug!("Watching {} files under {}", files.len(), root.display());
        Self {
            root,
            scan_interval,
            last_scan: Instant::now(),
            files,
        }
    }

    /// Rescan if the scan interval elapsed. Returns true if anything changed.
    pub fn poll(&mut self) -> bool {
        if self.last_scan.elapsed() < self.scan_interval {
            return false;
        }
        self.rescan()
    }

    pub fn rescan(&mut self) -> bool {
        self.last_scan = Instant::now();
        let files = scan(&self.root);
        let changed = files != self.files;
        if changed {
            log::debug!("Change detected under {}", self.root.display());
        }
        self.files = files;
        changed
    }
}

fn scan(root: &Path) -> BTreeMap<PathBuf, SystemTime> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((entry.into_path(), modified))
        })
        .collect()
}
