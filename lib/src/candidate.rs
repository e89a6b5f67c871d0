use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

/// Classification tag for a scan hit. Closed set, matched exhaustively by
/// downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    NodeModules,
    Empty,
    Pattern,
    Preset,
    Subdirectory,
}

impl CandidateKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NodeModules => "node_modules",
            Self::Empty => "empty directory",
            Self::Pattern => "pattern match",
            Self::Preset => "preset match",
            Self::Subdirectory => "subdirectory",
        }
    }
}

/// A directory (or file, for file patterns) identified as a deletion target.
/// Immutable once produced by the scanner.
#[derive(Debug, Clone)]
pub struct DirectoryCandidate {
    path: PathBuf,
    kind: CandidateKind,
    size: Option<u64>,
    modified: Option<SystemTime>,
    matched_rule: Option<String>,
}

impl DirectoryCandidate {
    pub(crate) fn new(
        path: PathBuf,
        kind: CandidateKind,
        size: Option<u64>,
        modified: Option<SystemTime>,
        matched_rule: Option<String>,
    ) -> Self {
        Self {
            path,
            kind,
            size,
            modified,
            matched_rule,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> CandidateKind {
        self.kind
    }

    /// Recursive size in bytes, if it has already been computed. Candidates
    /// scanned without a size filter carry `None`; the executor sizes them on
    /// demand through the session cache.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Identifier of the rule that matched, e.g. a preset name or the glob.
    pub fn matched_rule(&self) -> Option<&str> {
        self.matched_rule.as_deref()
    }
}
