use std::{
    cmp::Ordering,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use globset::GlobSet;

use crate::{
    candidate::{CandidateKind, DirectoryCandidate},
    fs::{DirEntryEx, DirWalker},
    sizer::SizeCalculator,
    PathEx, SweepError,
};

const MB: u64 = 1024 * 1024;

/// Ranked disk-usage breakdowns and heuristic cleanup suggestions on top of
/// the shared size cache.
pub struct Analyzer {
    sizer: Arc<SizeCalculator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpportunityCategory {
    NodeModules,
    BuildArtifacts,
    CacheDirs,
    TempEntries,
    LargeDirs,
}

impl OpportunityCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NodeModules => "node_modules",
            Self::BuildArtifacts => "build artifacts",
            Self::CacheDirs => "cache directories",
            Self::TempEntries => "temporary entries",
            Self::LargeDirs => "large directories",
        }
    }
}

/// A suggested cleanup target with its heuristic weight.
#[derive(Debug)]
pub struct Opportunity {
    pub candidate: DirectoryCandidate,
    pub category: OpportunityCategory,
    pub score: f64,
}

impl Analyzer {
    pub fn new(sizer: Arc<SizeCalculator>) -> Self {
        Self { sizer }
    }

    /// Largest directory subtrees down to `max_depth`, descending by size.
    /// Entries below the bound still roll into their ancestors' totals but
    /// are not listed separately. Ties break on lexical path order so the
    /// report is reproducible.
    pub fn analyze(
        &self,
        root: &Path,
        max_depth: usize,
        top_n: usize,
    ) -> Result<Vec<(PathBuf, u64)>, SweepError> {
        if !root.is_dir() {
            return Err(SweepError::InvalidRoot {
                path: root.to_owned(),
            });
        }

        let mut results = Vec::new();
        self.collect_dir_sizes(root, 1, max_depth, &mut results);
        results.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        results.truncate(top_n);
        Ok(results)
    }

    fn collect_dir_sizes(
        &self,
        dir: &Path,
        depth: usize,
        max_depth: usize,
        results: &mut Vec<(PathBuf, u64)>,
    ) {
        if depth > max_depth {
            return;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(error) => {
                log::warn!("Failed to read directory {}: {}", dir.display(), error);
                return;
            }
        };

        for entry in entries.filter_map(|entry| entry.ok()) {
            if !entry.is_dir() {
                continue;
            }

            let path = entry.path();
            match self.sizer.size_of(&path) {
                Ok(size) => results.push((path.clone(), size)),
                Err(error) => {
                    log::warn!("Failed to size {}: {}", path.display(), error);
                    continue;
                }
            }
            self.collect_dir_sizes(&path, depth + 1, max_depth, results);
        }
    }

    /// Walks the tree once and suggests cleanup targets per category, each
    /// gated on a category specific minimum size. Output is ranked by a
    /// size-times-staleness score; the exact weighting is a tunable, not a
    /// contract, but the ordering is deterministic for equal scores.
    pub fn discover(&self, root: &Path) -> Result<Vec<Opportunity>, SweepError> {
        if !root.is_dir() {
            return Err(SweepError::InvalidRoot {
                path: root.to_owned(),
            });
        }

        let build_set = compile(&["build", "dist", "target", "bin", "obj"])?;
        let cache_set = compile(&[".cache", ".npm", ".gradle", "__pycache__", ".nuget"])?;
        let temp_set = compile(&["tmp", "temp", "*.tmp", "*.bak"])?;

        let mut opportunities = Vec::new();
        let mut large_dirs = Vec::new();
        let mut suggested: Vec<PathBuf> = Vec::new();

        let mut walker = DirWalker::new();
        if let Err(error) = walker.insert_entries(root, 1) {
            log::warn!("Failed to read root dir: {}", error);
        }

        while let Some((entry, depth)) = walker.next_item() {
            let path = entry.path();
            let name = path.file_name_truncate().to_string();
            let is_dir = entry.is_dir();
            let covered = suggested.iter().any(|parent| parent.is_ancestor_of(&path));

            // category hits nested below an already suggested subtree are not
            // re-reported, their bytes are part of the suggestion above them
            let category = if covered {
                None
            } else if is_dir && name == "node_modules" {
                Some((OpportunityCategory::NodeModules, 10 * MB))
            } else if is_dir && build_set.is_match(&name) {
                Some((OpportunityCategory::BuildArtifacts, 5 * MB))
            } else if is_dir && cache_set.is_match(&name) {
                Some((OpportunityCategory::CacheDirs, 5 * MB))
            } else if temp_set.is_match(&name) {
                Some((OpportunityCategory::TempEntries, MB))
            } else {
                None
            };

            let size = if category.is_some() || is_dir {
                self.sizer.size_of(&path).unwrap_or(0)
            } else {
                0
            };

            if let Some((category, min_size)) = category {
                if size >= min_size {
                    suggested.push(path.clone());
                    opportunities.push(self.opportunity(&path, size, category));
                }
            } else if is_dir && size >= 100 * MB {
                large_dirs.push((path.clone(), size));
            }

            // the large-directory sweep covers the whole tree, so suggested
            // subtrees are still walked
            if is_dir {
                if let Err(error) = walker.insert_entries(&path, depth + 1) {
                    log::warn!("Failed to read directory {}: {}", path.display(), error);
                }
            }
        }

        // unusually large directories: top ten, largest first
        large_dirs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        large_dirs.truncate(10);
        for (path, size) in large_dirs {
            opportunities.push(self.opportunity(&path, size, OpportunityCategory::LargeDirs));
        }

        opportunities.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.candidate.path().cmp(b.candidate.path()))
        });
        Ok(opportunities)
    }

    fn opportunity(
        &self,
        path: &Path,
        size: u64,
        category: OpportunityCategory,
    ) -> Opportunity {
        let modified = fs::symlink_metadata(path)
            .ok()
            .and_then(|meta| meta.modified().ok());
        let candidate = DirectoryCandidate::new(
            path.to_owned(),
            match category {
                OpportunityCategory::NodeModules => CandidateKind::NodeModules,
                _ => CandidateKind::Pattern,
            },
            Some(size),
            modified,
            Some(category.label().to_string()),
        );

        Opportunity {
            score: score(size, modified),
            candidate,
            category,
        }
    }
}

/// Stale data weighs heavier than recently touched data of the same size.
fn score(size: u64, modified: Option<SystemTime>) -> f64 {
    let age_days = modified
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .map(|age| age.as_secs_f64() / 86_400.0)
        .unwrap_or(0.0);

    size as f64 * (1.0 + age_days / 30.0)
}

fn compile(patterns: &[&str]) -> Result<GlobSet, SweepError> {
    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(globset::Glob::new(pattern)?);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod test {
    use std::{
        fs,
        path::Path,
        sync::Arc,
    };

    use super::{Analyzer, OpportunityCategory};
    use crate::{SizeCalculator, SweepError};

    fn analyzer() -> Analyzer {
        Analyzer::new(Arc::new(SizeCalculator::tolerant()))
    }

    fn write_blob(root: &Path, dir: &str, size: usize) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("blob.bin"), vec![0u8; size]).unwrap();
    }

    // sparse blob, so the big sizes never touch the disk
    fn sparse_blob(root: &Path, dir: &str, size: u64) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        let file = fs::File::create(dir.join("blob.bin")).unwrap();
        file.set_len(size).unwrap();
    }

    #[test]
    fn invalid_root() {
        let result = analyzer().analyze(Path::new("/no/such/root"), 3, 10);
        assert!(matches!(result, Err(SweepError::InvalidRoot { .. })));
    }

    #[test]
    fn ranks_by_size_then_path() {
        let root = tempfile::tempdir().unwrap();
        write_blob(root.path(), "small", 100);
        write_blob(root.path(), "big", 4000);
        // two equally sized directories tie-break lexically
        write_blob(root.path(), "twin-b", 2000);
        write_blob(root.path(), "twin-a", 2000);

        let results = analyzer().analyze(root.path(), 3, 10).unwrap();
        let paths = results.iter().map(|(path, _)| path.clone()).collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec![
                root.path().join("big"),
                root.path().join("twin-a"),
                root.path().join("twin-b"),
                root.path().join("small"),
            ]
        );
        assert_eq!(results[0].1, 4000);
    }

    #[test]
    fn depth_bound_still_counts_descendants() {
        let root = tempfile::tempdir().unwrap();
        write_blob(root.path(), "top/nested/deep", 3000);

        let results = analyzer().analyze(root.path(), 1, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, root.path().join("top"));
        // deep blob is rolled into the ancestor total
        assert_eq!(results[0].1, 3000);
    }

    #[test]
    fn top_n_truncates() {
        let root = tempfile::tempdir().unwrap();
        for index in 0..5 {
            write_blob(root.path(), &format!("d{index}"), 100 * (index + 1));
        }

        let results = analyzer().analyze(root.path(), 1, 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, root.path().join("d4"));
    }

    #[test]
    fn discover_is_gated_and_ordered() {
        let root = tempfile::tempdir().unwrap();
        // 11 MB node_modules passes its 10 MB gate
        write_blob(root.path(), "proj/node_modules", 11 * 1024 * 1024);
        // 6 MB build dir passes its 5 MB gate
        write_blob(root.path(), "proj/build", 6 * 1024 * 1024);
        // tiny cache dir stays below its gate
        write_blob(root.path(), "proj/.cache", 1024);

        let opportunities = analyzer().discover(root.path()).unwrap();
        let paths = opportunities
            .iter()
            .map(|o| o.candidate.path().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec![
                root.path().join("proj/node_modules"),
                root.path().join("proj/build"),
            ]
        );
        assert!(opportunities[0].score >= opportunities[1].score);
    }

    #[test]
    fn discover_sees_large_dirs_inside_suggestions() {
        let root = tempfile::tempdir().unwrap();
        let mb = 1024 * 1024;
        // the installation passes its gate through the heavy dependency alone
        sparse_blob(root.path(), "proj/node_modules/heavy-dep", 150 * mb);
        // nested category hit, already part of the suggestion above it
        sparse_blob(root.path(), "proj/node_modules/pkg/build", 6 * mb);

        let opportunities = analyzer().discover(root.path()).unwrap();
        let by_category = |category| {
            opportunities
                .iter()
                .filter(|o| o.category == category)
                .map(|o| o.candidate.path().to_owned())
                .collect::<Vec<_>>()
        };

        assert_eq!(
            by_category(OpportunityCategory::NodeModules),
            vec![root.path().join("proj/node_modules")]
        );
        assert!(by_category(OpportunityCategory::LargeDirs)
            .contains(&root.path().join("proj/node_modules/heavy-dep")));
        assert!(by_category(OpportunityCategory::BuildArtifacts).is_empty());
    }
}
