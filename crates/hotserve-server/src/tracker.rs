//! Change detection by polling modification times.
//!
//! The tracker reduces a directory tree to a single [`Freshness`] value: the
//! newest modification time among watched files. Nothing is cached between
//! calls, so every sample is an independent read of the filesystem and any
//! number of callers may sample concurrently.
//!
//! Whole-tree max-mtime tracking cannot see a change that *lowers* the
//! maximum, e.g. deleting the newest file and creating one with an older
//! timestamp. Such edits go unnoticed until something newer is written.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// File extensions whose edits trigger a reload.
pub const WATCHED_EXTENSIONS: &[&str] = &["html", "js", "css"];

/// Directory names skipped entirely, including their subtrees.
pub const EXCLUDED_DIRS: &[&str] = &[".git", "node_modules"];

/// Newest modification time observed among watched files.
///
/// Only ordering is meaningful. [`Freshness::NONE`] means no watched file was
/// found and compares less than every real timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Freshness(Option<SystemTime>);

impl Freshness {
    /// Sentinel for a tree without watched files.
    pub const NONE: Self = Self(None);

    /// Seconds since the Unix epoch, `0.0` for [`Freshness::NONE`].
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0.0, |d| d.as_secs_f64())
    }
}

impl From<SystemTime> for Freshness {
    fn from(time: SystemTime) -> Self {
        Self(Some(time))
    }
}

/// Computes the [`Freshness`] of a directory tree.
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    root: PathBuf,
    extensions: Vec<String>,
    excluded_dirs: Vec<String>,
}

impl ChangeTracker {
    /// Create a tracker with explicit extension and exclusion sets.
    ///
    /// # Arguments
    ///
    /// * `root` - Directory tree to sample
    /// * `extensions` - Extensions (without the dot) of watched files
    /// * `excluded_dirs` - Directory names that are never descended into
    pub fn new<E, D>(root: PathBuf, extensions: E, excluded_dirs: D) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            root,
            extensions: extensions.into_iter().map(Into::into).collect(),
            excluded_dirs: excluded_dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a tracker watching [`WATCHED_EXTENSIONS`] and skipping [`EXCLUDED_DIRS`].
    #[must_use]
    pub fn for_root(root: PathBuf) -> Self {
        Self::new(
            root,
            WATCHED_EXTENSIONS.iter().copied(),
            EXCLUDED_DIRS.iter().copied(),
        )
    }

    /// Root directory being sampled.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sample the tree and return the newest watched modification time.
    ///
    /// Blocking. Files that disappear or become unreadable mid-walk are
    /// left out of this sample.
    #[must_use]
    pub fn freshness(&self) -> Freshness {
        let mut newest = Freshness::NONE;
        self.scan_directory(&self.root, &mut newest);
        newest
    }

    /// Whether a file name ends in one of the watched extensions.
    #[must_use]
    pub fn is_watched(&self, file_name: &str) -> bool {
        self.has_watched_extension(OsStr::new(file_name))
    }

    // Byte-level so names that are not valid UTF-8 still match
    fn has_watched_extension(&self, file_name: &OsStr) -> bool {
        let name = file_name.as_encoded_bytes();
        self.extensions.iter().any(|ext| {
            name.strip_suffix(ext.as_bytes())
                .is_some_and(|stem| stem.ends_with(b"."))
        })
    }

    fn is_excluded(&self, dir_name: &OsStr) -> bool {
        self.excluded_dirs.iter().any(|d| dir_name == OsStr::new(d))
    }

    fn scan_directory(&self, dir: &Path, newest: &mut Freshness) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                return;
            }
        };

        for entry in entries.filter_map(Result::ok) {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let name = entry.file_name();

            if file_type.is_dir() {
                if !self.is_excluded(&name) {
                    self.scan_directory(&entry.path(), newest);
                }
                continue;
            }

            if !self.has_watched_extension(&name) {
                continue;
            }

            // Follows symlinks, so a linked stylesheet reports its target's mtime
            let path = entry.path();
            match fs::metadata(&path).and_then(|m| m.modified().map(|t| (m.is_file(), t))) {
                Ok((true, modified)) => *newest = (*newest).max(Freshness::from(modified)),
                Ok((false, _)) => {}
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "File vanished during scan");
                }
            }
        }
    }
}
