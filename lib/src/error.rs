use std::{
    io,
    path::PathBuf,
    time::Duration,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("invalid root {}: not an existing directory", path.display())]
    InvalidRoot { path: PathBuf },

    #[error("access denied below {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("trash integration unavailable: {0}")]
    TrashUnavailable(String),

    #[error("operation exceeded {0:?}")]
    Timeout(Duration),

    #[error("partially deleted {}: {source}", path.display())]
    PartialDeletion {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("invalid size: {0}")]
    InvalidSize(String),
}

impl SweepError {
    /// Classify a removal error, keeping the permission denied case distinct.
    pub(crate) fn from_fs(path: &std::path::Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::Access {
                path: path.to_owned(),
                source,
            }
        } else {
            Self::Io(source)
        }
    }
}
