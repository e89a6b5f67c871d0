use std::{
    fs::{self, DirEntry},
    io,
    path::Path,
};

/// Depth aware variant of the plain entry stack: every pending entry carries
/// the depth relative to the walk root (root children are depth 1).
pub(crate) struct DirWalker {
    pending_entries: Vec<(DirEntry, usize)>,
}

impl DirWalker {
    pub fn new() -> Self {
        Self {
            pending_entries: Vec::with_capacity(1024),
        }
    }

    pub fn next_item(&mut self) -> Option<(DirEntry, usize)> {
        self.pending_entries.pop()
    }

    pub fn insert_entries(&mut self, path: &Path, depth: usize) -> io::Result<()> {
        for entry in fs::read_dir(path)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_err) => continue,
            };

            self.pending_entries.push((entry, depth));
        }

        Ok(())
    }
}

/// Literal filesystem emptiness, independent of any filter criteria.
pub fn dir_is_empty(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

pub trait DirEntryEx {
    fn is_file(&self) -> bool;
    fn is_dir(&self) -> bool;
    fn is_symlink(&self) -> bool;
}

impl DirEntryEx for DirEntry {
    fn is_file(&self) -> bool {
        self.file_type()
            .map_or(false, |file_type| file_type.is_file())
    }

    /// Symlinks pointing at directories report `false`, so walkers relying on
    /// this never follow links.
    fn is_dir(&self) -> bool {
        self.file_type()
            .map_or(false, |file_type| file_type.is_dir())
    }

    fn is_symlink(&self) -> bool {
        self.file_type()
            .map_or(false, |file_type| file_type.is_symlink())
    }
}
