use std::{
    path::Path,
    time::SystemTime,
};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::{PathEx, SweepError};

const SECONDS_PER_DAY: u64 = 24 * 3600;

/// Caller supplied filter bundle, compiled once at scan start.
///
/// Exclude patterns take precedence over everything else: an excluded
/// directory is pruned with all its descendants before any other predicate
/// runs. Include, age and size predicates only narrow down entries that
/// already matched the scan kind.
#[derive(Default)]
pub struct FilterCriteria {
    min_size: Option<u64>,
    older_than_days: Option<u64>,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl FilterCriteria {
    pub fn new(
        include: &[String],
        exclude: &[String],
        min_size: Option<u64>,
        older_than_days: Option<u64>,
    ) -> Result<Self, SweepError> {
        Ok(Self {
            min_size,
            older_than_days,
            include: build_set(include)?,
            exclude: build_set(exclude)?,
        })
    }

    /// Evaluated at directory enter time, against the full path and the bare
    /// entry name.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let Some(set) = &self.exclude else {
            return false;
        };

        set.is_match(path) || set.is_match(path.file_name_truncate())
    }

    /// An empty include list accepts everything.
    pub fn matches_include(&self, path: &Path) -> bool {
        let Some(set) = &self.include else {
            return true;
        };

        set.is_match(path) || set.is_match(path.file_name_truncate())
    }

    /// Entries younger than the configured bound do not pass, even when the
    /// name already matched. A missing mtime never filters.
    pub fn passes_age(&self, modified: Option<SystemTime>) -> bool {
        let Some(days) = self.older_than_days else {
            return true;
        };
        let Some(modified) = modified else {
            return true;
        };

        match SystemTime::now().duration_since(modified) {
            Ok(age) => age.as_secs() >= days * SECONDS_PER_DAY,
            /* mtime lies in the future, younger than any bound */
            Err(_) => false,
        }
    }

    pub fn min_size(&self) -> Option<u64> {
        self.min_size
    }
}

fn build_set(patterns: &[String]) -> Result<Option<GlobSet>, SweepError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }

    Ok(Some(builder.build()?))
}
