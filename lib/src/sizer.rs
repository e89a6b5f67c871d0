use std::{
    collections::HashMap,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{fs::DirEntryEx, SweepError};

/// Recursive directory sizing with per-session memoization.
///
/// Every directory total is cached under its absolute path, so sizing a
/// candidate and later its parent never re-walks the shared subtree. The
/// cache lives as long as the calculator, which a session owns and drops on
/// completion.
pub struct SizeCalculator {
    cache: Mutex<HashMap<PathBuf, u64>>,
    tolerate_errors: bool,
}

impl SizeCalculator {
    /// Strict mode: an unreadable subtree fails the whole request.
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            tolerate_errors: false,
        }
    }

    /// Best-effort mode: unreadable subtrees are logged, counted as zero and
    /// the partial sum is returned.
    pub fn tolerant() -> Self {
        Self {
            tolerate_errors: true,
            ..Self::new()
        }
    }

    /// Total size in bytes of the file or directory tree at `path`.
    /// Symlinks are counted as zero-size leaves and never followed.
    pub fn size_of(&self, path: &Path) -> Result<u64, SweepError> {
        self.size_of_normalized(&absolute(path))
    }

    fn size_of_normalized(&self, path: &Path) -> Result<u64, SweepError> {
        if let Some(&size) = self.cache.lock().unwrap().get(path) {
            return Ok(size);
        }

        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(error) => return self.unreadable(path, error),
        };
        if meta.is_file() {
            return Ok(meta.len());
        }
        if !meta.is_dir() {
            /* symlink or special file, a leaf */
            return Ok(0);
        }

        let size = self.walk_dir(path)?;
        self.cache.lock().unwrap().insert(path.to_owned(), size);
        Ok(size)
    }

    fn walk_dir(&self, dir: &Path) -> Result<u64, SweepError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(error) => return self.unreadable(dir, error),
        };

        let mut total = 0u64;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    total += self.unreadable(dir, error)?;
                    continue;
                }
            };

            if entry.is_file() {
                match entry.metadata() {
                    Ok(meta) => total += meta.len(),
                    Err(error) => total += self.unreadable(&entry.path(), error)?,
                }
            } else if entry.is_dir() {
                total += self.size_of_normalized(&entry.path())?;
            }
        }

        Ok(total)
    }

    fn unreadable(&self, path: &Path, error: io::Error) -> Result<u64, SweepError> {
        if self.tolerate_errors {
            log::warn!("Failed to size {}: {}", path.display(), error);
            Ok(0)
        } else {
            Err(SweepError::Access {
                path: path.to_owned(),
                source: error,
            })
        }
    }
}

impl Default for SizeCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Fresh, cache-free measurement. Used after a failed deletion to determine
/// how much of a tree is actually left on disk.
pub(crate) fn size_on_disk(path: &Path) -> u64 {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return 0;
    };
    if meta.is_file() {
        return meta.len();
    }
    if !meta.is_dir() {
        return 0;
    }

    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| size_on_disk(&entry.path()))
        .sum()
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_owned()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_owned())
    }
}
