use std::{
    ffi::OsStr,
    path::Path,
};

static EMPTY_STR: &'static str = "";

/// Utility functions for the systems path library
pub trait PathEx {
    /// Returns the file name from the current path, or an empty string if the file name is empty
    fn file_name_truncate(&self) -> &str;

    /// Tests whether the path is a strict prefix directory of `other`.
    fn is_ancestor_of(&self, other: &Path) -> bool;
}

impl PathEx for Path {
    fn file_name_truncate(&self) -> &str {
        self.file_name()
            .map(OsStr::to_str)
            .flatten()
            .unwrap_or(EMPTY_STR)
    }

    fn is_ancestor_of(&self, other: &Path) -> bool {
        other != self && other.starts_with(self)
    }
}
