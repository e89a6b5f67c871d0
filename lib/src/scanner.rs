use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Receiver},
        Arc,
    },
    thread::{self, JoinHandle},
};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::{
    candidate::{CandidateKind, DirectoryCandidate},
    cancel::CancelToken,
    criteria::FilterCriteria,
    fs::{dir_is_empty, DirEntryEx, DirWalker},
    preset::PresetRule,
    sizer::SizeCalculator,
    PathEx, SweepError,
};

/// What a scan is looking for.
pub enum TargetKind {
    /// Any directory literally named `node_modules`, at any depth. Matched
    /// subtrees are not descended into, so nested installations are never
    /// reported separately.
    NodeModules,
    /// Directories with zero entries on the real filesystem. Emptiness is
    /// deliberately independent of filter patterns: a directory whose only
    /// children are excluded still counts as occupied.
    EmptyDirs,
    /// Entries whose name matches a glob, optionally bounded in depth and
    /// optionally including plain files.
    Pattern {
        glob: String,
        max_depth: Option<usize>,
        match_files: bool,
    },
    /// Only the immediate children of the root.
    Subdirectories,
    /// The union of a preset's bundled name patterns.
    Preset(&'static PresetRule),
}

impl TargetKind {
    fn compile(self) -> Result<CompiledKind, SweepError> {
        Ok(match self {
            Self::NodeModules => CompiledKind::NodeModules,
            Self::EmptyDirs => CompiledKind::EmptyDirs,
            Self::Subdirectories => CompiledKind::Subdirectories,
            Self::Pattern {
                glob,
                max_depth,
                match_files,
            } => CompiledKind::Pattern {
                matcher: compile_set(&[&glob])?,
                rule: glob,
                max_depth,
                match_files,
            },
            Self::Preset(rule) => CompiledKind::Preset {
                matcher: compile_set(rule.patterns)?,
                rule,
            },
        })
    }
}

enum CompiledKind {
    NodeModules,
    EmptyDirs,
    Pattern {
        matcher: GlobSet,
        rule: String,
        max_depth: Option<usize>,
        match_files: bool,
    },
    Subdirectories,
    Preset {
        matcher: GlobSet,
        rule: &'static PresetRule,
    },
}

fn compile_set<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet, SweepError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern.as_ref())?);
    }

    Ok(builder.build()?)
}

/// Incremental scan notifications. Informational only, never part of the
/// correctness contract.
pub enum ScanEvent {
    Inspecting(PathBuf),
    Found { path: PathBuf, kind: CandidateKind },
    Error(io::Error),
}

pub trait ScanEventSink {
    fn consume(&mut self, event: ScanEvent);
}

pub struct VoidEventSink;
impl ScanEventSink for VoidEventSink {
    fn consume(&mut self, _event: ScanEvent) {}
}

pub struct ScanOptions {
    pub criteria: FilterCriteria,
    pub cancel: CancelToken,
    pub event_sink: Box<dyn ScanEventSink + Send>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::default(),
            cancel: CancelToken::new(),
            event_sink: Box::new(VoidEventSink),
        }
    }
}

/// Single pass, depth-first, pre-order walker producing deletion candidates
/// over a channel. Symlinks are recorded as leaves and never followed.
pub struct Scanner {
    kind: TargetKind,
}

impl Scanner {
    pub fn new(kind: TargetKind) -> Self {
        Self { kind }
    }

    /// Validates the root, then walks it on a background thread, streaming
    /// candidates over the returned channel. Consumers may stop early by
    /// dropping the receiver; the walk aborts on the next entry.
    pub fn scan(
        self,
        root: PathBuf,
        sizer: Arc<SizeCalculator>,
        options: ScanOptions,
    ) -> Result<(JoinHandle<()>, Receiver<DirectoryCandidate>), SweepError> {
        if !root.is_dir() {
            return Err(SweepError::InvalidRoot { path: root });
        }
        let kind = self.kind.compile()?;

        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let worker = ScanWorker {
                kind,
                criteria: options.criteria,
                cancel: options.cancel,
                event_sink: options.event_sink,
                sizer,
            };
            worker.run(&root, tx);
        });

        Ok((handle, rx))
    }

    /// Convenience wrapper draining the whole walk into a vector.
    pub fn scan_collect(
        self,
        root: PathBuf,
        sizer: Arc<SizeCalculator>,
        options: ScanOptions,
    ) -> Result<Vec<DirectoryCandidate>, SweepError> {
        let (handle, rx) = self.scan(root, sizer, options)?;
        let candidates = rx.into_iter().collect();
        let _ = handle.join();
        Ok(candidates)
    }
}

struct ScanWorker {
    kind: CompiledKind,
    criteria: FilterCriteria,
    cancel: CancelToken,
    event_sink: Box<dyn ScanEventSink + Send>,
    sizer: Arc<SizeCalculator>,
}

impl ScanWorker {
    fn run(mut self, root: &Path, tx: mpsc::Sender<DirectoryCandidate>) {
        let mut walker = DirWalker::new();
        if let Err(error) = walker.insert_entries(root, 1) {
            log::warn!("Failed to read root dir: {}", error);
            self.event_sink.consume(ScanEvent::Error(error));
            return;
        }

        'walk: while let Some((entry, depth)) = walker.next_item() {
            if self.cancel.is_cancelled() {
                log::debug!("Scan cancelled, stopping walk");
                break;
            }

            let path = entry.path();
            self.event_sink.consume(ScanEvent::Inspecting(path.clone()));

            // exclude is evaluated first and prunes the whole subtree
            if self.criteria.is_excluded(&path) {
                log::trace!("Pruned excluded subtree {}", path.display());
                continue;
            }

            let is_dir = entry.is_dir();
            let matched = self.matches(&path, is_dir, depth);

            if let Some(kind) = matched {
                match self.build_candidate(path.clone(), is_dir, kind) {
                    Ok(Some(candidate)) => {
                        log::trace!(
                            "Identified {} candidate at {}",
                            kind.label(),
                            path.display()
                        );
                        self.event_sink.consume(ScanEvent::Found {
                            path: path.clone(),
                            kind,
                        });

                        if tx.send(candidate).is_err() {
                            /* Abort search */
                            log::debug!("Aborting scan as receiving end has been closed");
                            break 'walk;
                        }
                    }
                    Ok(None) => {
                        /* matched the kind but filtered out by include/age/size */
                    }
                    Err(error) => {
                        log::warn!("Failed to qualify {}: {}", path.display(), error);
                    }
                }
            }

            // matched directories are terminal: a selected tree is removed as
            // one unit, so nothing inside it can be a candidate of its own
            if is_dir && matched.is_none() && self.descend_below(depth) {
                if let Err(error) = walker.insert_entries(&path, depth + 1) {
                    log::warn!(
                        "Failed to read directory {}: {}",
                        path.display(),
                        error
                    );
                    self.event_sink.consume(ScanEvent::Error(error));
                }
            }
        }
    }

    fn matches(&self, path: &Path, is_dir: bool, depth: usize) -> Option<CandidateKind> {
        match &self.kind {
            CompiledKind::NodeModules => {
                (is_dir && path.file_name_truncate() == "node_modules")
                    .then_some(CandidateKind::NodeModules)
            }
            CompiledKind::EmptyDirs => (is_dir && dir_is_empty(path).unwrap_or(false))
                .then_some(CandidateKind::Empty),
            CompiledKind::Subdirectories => {
                (is_dir && depth == 1).then_some(CandidateKind::Subdirectory)
            }
            CompiledKind::Pattern {
                matcher,
                max_depth,
                match_files,
                ..
            } => {
                let in_depth = max_depth.map_or(true, |limit| depth <= limit);
                (in_depth
                    && (is_dir || *match_files)
                    && matcher.is_match(path.file_name_truncate()))
                .then_some(CandidateKind::Pattern)
            }
            CompiledKind::Preset { matcher, .. } => {
                (is_dir && matcher.is_match(path.file_name_truncate()))
                    .then_some(CandidateKind::Preset)
            }
        }
    }

    fn descend_below(&self, depth: usize) -> bool {
        match &self.kind {
            CompiledKind::Subdirectories => false,
            CompiledKind::Pattern {
                max_depth: Some(limit),
                ..
            } => depth < *limit,
            _ => true,
        }
    }

    fn build_candidate(
        &self,
        path: PathBuf,
        is_dir: bool,
        kind: CandidateKind,
    ) -> Result<Option<DirectoryCandidate>, SweepError> {
        if !self.criteria.matches_include(&path) {
            return Ok(None);
        }

        let modified = fs::symlink_metadata(&path)
            .ok()
            .and_then(|meta| meta.modified().ok());
        if !self.criteria.passes_age(modified) {
            return Ok(None);
        }

        let mut size = None;
        if let Some(min_size) = self.criteria.min_size() {
            let total = if is_dir {
                self.sizer.size_of(&path)?
            } else {
                fs::symlink_metadata(&path).map(|meta| meta.len())?
            };
            if total < min_size {
                return Ok(None);
            }
            size = Some(total);
        }

        let matched_rule = match &self.kind {
            CompiledKind::Pattern { rule, .. } => Some(rule.clone()),
            CompiledKind::Preset { rule, .. } => Some(rule.name.to_string()),
            _ => None,
        };

        Ok(Some(DirectoryCandidate::new(
            path,
            kind,
            size,
            modified,
            matched_rule,
        )))
    }
}

#[cfg(test)]
mod test {
    use std::{
        fs,
        path::Path,
        sync::Arc,
        time::Duration,
    };

    use super::{ScanOptions, Scanner, TargetKind};
    use crate::{
        CancelToken, CandidateKind, DirectoryCandidate, FilterCriteria, SizeCalculator,
        SweepError,
    };

    fn scan(root: &Path, kind: TargetKind, options: ScanOptions) -> Vec<DirectoryCandidate> {
        let mut candidates = Scanner::new(kind)
            .scan_collect(
                root.to_path_buf(),
                Arc::new(SizeCalculator::tolerant()),
                options,
            )
            .unwrap();
        candidates.sort_by(|a, b| a.path().cmp(b.path()));
        candidates
    }

    fn write_tree(root: &Path, size: usize, dir: &str) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("blob.bin"), vec![0u8; size]).unwrap();
    }

    #[test]
    fn invalid_root_is_fatal() {
        let result = Scanner::new(TargetKind::NodeModules).scan_collect(
            "/no/such/root".into(),
            Arc::new(SizeCalculator::tolerant()),
            ScanOptions::default(),
        );
        assert!(matches!(result, Err(SweepError::InvalidRoot { .. })));
    }

    #[test]
    fn finds_node_modules_without_nesting() {
        let root = tempfile::tempdir().unwrap();
        write_tree(root.path(), 64, "node_modules");
        write_tree(root.path(), 64, "node_modules/nested/node_modules");
        write_tree(root.path(), 64, "a/node_modules");

        let found = scan(root.path(), TargetKind::NodeModules, ScanOptions::default());
        let paths = found.iter().map(|c| c.path().to_owned()).collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec![
                root.path().join("a/node_modules"),
                root.path().join("node_modules"),
            ]
        );
        assert!(found.iter().all(|c| c.kind() == CandidateKind::NodeModules));
    }

    #[test]
    fn empty_dirs_are_literal() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("empty")).unwrap();
        write_tree(root.path(), 8, "notempty");

        let found = scan(root.path(), TargetKind::EmptyDirs, ScanOptions::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path(), root.path().join("empty"));
        assert_eq!(found[0].kind(), CandidateKind::Empty);
    }

    #[test]
    fn occupied_dir_with_excluded_children_is_not_empty() {
        let root = tempfile::tempdir().unwrap();
        // "holder" only contains the excluded, itself empty, "ignored"
        fs::create_dir_all(root.path().join("holder/ignored")).unwrap();

        let options = ScanOptions {
            criteria: FilterCriteria::new(&[], &["ignored".to_string()], None, None).unwrap(),
            ..ScanOptions::default()
        };
        let found = scan(root.path(), TargetKind::EmptyDirs, options);
        assert!(found.is_empty());
    }

    #[test]
    fn exclude_prunes_whole_subtrees() {
        let root = tempfile::tempdir().unwrap();
        write_tree(root.path(), 8, "keep/node_modules");
        write_tree(root.path(), 8, "skipme/deep/node_modules");

        let options = ScanOptions {
            criteria: FilterCriteria::new(&[], &["skipme".to_string()], None, None).unwrap(),
            ..ScanOptions::default()
        };
        let found = scan(root.path(), TargetKind::NodeModules, options);
        assert_eq!(found.len(), 1);
        assert!(found
            .iter()
            .all(|c| !c.path().starts_with(root.path().join("skipme"))));
    }

    #[test]
    fn pattern_respects_age_filter() {
        let root = tempfile::tempdir().unwrap();
        write_tree(root.path(), 8, "my-cache");

        // fresh directory, bound of 30 days: name matches but age does not
        let options = ScanOptions {
            criteria: FilterCriteria::new(&[], &[], None, Some(30)).unwrap(),
            ..ScanOptions::default()
        };
        let found = scan(
            root.path(),
            TargetKind::Pattern {
                glob: "*cache*".to_string(),
                max_depth: None,
                match_files: false,
            },
            options,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn pattern_matches_files_when_asked() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("scratch.tmp"), b"x").unwrap();
        fs::create_dir(root.path().join("tmp")).unwrap();

        let dirs_only = scan(
            root.path(),
            TargetKind::Pattern {
                glob: "*tmp".to_string(),
                max_depth: None,
                match_files: false,
            },
            ScanOptions::default(),
        );
        assert_eq!(dirs_only.len(), 1);

        let with_files = scan(
            root.path(),
            TargetKind::Pattern {
                glob: "*tmp".to_string(),
                max_depth: None,
                match_files: true,
            },
            ScanOptions::default(),
        );
        assert_eq!(with_files.len(), 2);
    }

    #[test]
    fn pattern_depth_bound() {
        let root = tempfile::tempdir().unwrap();
        write_tree(root.path(), 8, "build");
        write_tree(root.path(), 8, "deep/deeper/build");

        let found = scan(
            root.path(),
            TargetKind::Pattern {
                glob: "build".to_string(),
                max_depth: Some(1),
                match_files: false,
            },
            ScanOptions::default(),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path(), root.path().join("build"));
    }

    #[test]
    fn subdirectories_are_depth_one_only() {
        let root = tempfile::tempdir().unwrap();
        write_tree(root.path(), 8, "a/inner");
        write_tree(root.path(), 8, "b");
        fs::write(root.path().join("toplevel.txt"), b"x").unwrap();

        let found = scan(root.path(), TargetKind::Subdirectories, ScanOptions::default());
        let paths = found.iter().map(|c| c.path().to_owned()).collect::<Vec<_>>();
        assert_eq!(paths, vec![root.path().join("a"), root.path().join("b")]);
    }

    #[test]
    fn min_size_filter_sets_candidate_size() {
        let root = tempfile::tempdir().unwrap();
        write_tree(root.path(), 4096, "big/node_modules");
        write_tree(root.path(), 16, "small/node_modules");

        let options = ScanOptions {
            criteria: FilterCriteria::new(&[], &[], Some(1024), None).unwrap(),
            ..ScanOptions::default()
        };
        let found = scan(root.path(), TargetKind::NodeModules, options);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path(), root.path().join("big/node_modules"));
        assert_eq!(found[0].size(), Some(4096));
    }

    #[test]
    fn cancelled_token_stops_production() {
        let root = tempfile::tempdir().unwrap();
        write_tree(root.path(), 8, "node_modules");

        let cancel = CancelToken::new();
        cancel.cancel();
        let options = ScanOptions {
            cancel,
            ..ScanOptions::default()
        };
        let found = scan(root.path(), TargetKind::NodeModules, options);
        assert!(found.is_empty());
    }

    #[test]
    fn receiver_drop_aborts_walk() {
        let root = tempfile::tempdir().unwrap();
        for index in 0..16 {
            write_tree(root.path(), 8, &format!("p{index}/node_modules"));
        }

        let (handle, rx) = Scanner::new(TargetKind::NodeModules)
            .scan(
                root.path().to_path_buf(),
                Arc::new(SizeCalculator::tolerant()),
                ScanOptions::default(),
            )
            .unwrap();
        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.path().file_name().unwrap(), "node_modules");
        drop(rx);
        let _ = handle.join();
    }
}
