use std::{
    collections::VecDeque,
    fs,
    path::PathBuf,
    sync::{mpsc, Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use crate::{
    candidate::DirectoryCandidate,
    cancel::CancelToken,
    sizer::{self, SizeCalculator},
    PathEx, SweepError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionMode {
    /// Compute what would happen, mutate nothing.
    DryRun,
    /// Recursively remove the tree.
    Permanent,
    /// Move to the system trash. Never silently falls back to permanent
    /// deletion when the integration is unavailable.
    Trash,
}

#[derive(Debug)]
pub enum OutcomeStatus {
    Succeeded,
    SkippedDryRun,
    MovedToTrash,
    Failed(SweepError),
}

/// Per-candidate result of a deletion batch.
#[derive(Debug)]
pub struct DeletionOutcome {
    pub candidate: DirectoryCandidate,
    pub status: OutcomeStatus,
    pub bytes_reclaimed: u64,
    pub started: Instant,
    pub finished: Instant,
}

impl DeletionOutcome {
    pub fn failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed(_))
    }
}

pub trait ExecEventSink {
    fn consume(&mut self, outcome: &DeletionOutcome);
}

pub struct VoidExecSink;
impl ExecEventSink for VoidExecSink {
    fn consume(&mut self, _outcome: &DeletionOutcome) {}
}

pub struct ExecOptions {
    pub mode: DeletionMode,
    pub parallel: bool,
    pub workers: usize,
    /// Bound on a single candidate's removal. On expiry the coordinator stops
    /// waiting and records a timeout failure; the filesystem call itself is
    /// not interruptible and finishes detached.
    pub timeout: Option<Duration>,
    pub cancel: CancelToken,
    pub event_sink: Box<dyn ExecEventSink + Send>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            mode: DeletionMode::DryRun,
            parallel: false,
            workers: thread::available_parallelism()
                .map(|count| count.get())
                .unwrap_or(4),
            timeout: None,
            cancel: CancelToken::new(),
            event_sink: Box::new(VoidExecSink),
        }
    }
}

/// Executes a finalized candidate list.
///
/// Failures are always per candidate: a locked file, a missing trash
/// integration or a timeout fails that one outcome and the batch moves on.
pub struct DeletionExecutor {
    sizer: Arc<SizeCalculator>,
}

impl DeletionExecutor {
    pub fn new(sizer: Arc<SizeCalculator>) -> Self {
        Self { sizer }
    }

    /// Processes candidates ancestor-first: when one candidate's path is a
    /// prefix of another's, the ancestor fully completes (success or failure)
    /// before the descendant starts. Unrelated paths run concurrently in
    /// parallel mode.
    pub fn execute(
        &self,
        candidates: Vec<DirectoryCandidate>,
        mut options: ExecOptions,
    ) -> Vec<DeletionOutcome> {
        let waves = schedule_waves(candidates);
        let mut outcomes = Vec::new();

        for wave in waves {
            if options.cancel.is_cancelled() {
                log::debug!("Deletion cancelled, {} candidates not started", wave.len());
                break;
            }

            if options.parallel && wave.len() > 1 {
                outcomes.extend(self.run_wave_parallel(wave, &mut options));
            } else {
                for candidate in wave {
                    if options.cancel.is_cancelled() {
                        break;
                    }
                    let outcome = self.process(candidate, options.mode, options.timeout);
                    options.event_sink.consume(&outcome);
                    outcomes.push(outcome);
                }
            }
        }

        outcomes
    }

    fn run_wave_parallel(
        &self,
        wave: Vec<DirectoryCandidate>,
        options: &mut ExecOptions,
    ) -> Vec<DeletionOutcome> {
        let queue = Arc::new(Mutex::new(wave.into_iter().collect::<VecDeque<_>>()));
        let workers = options.workers.max(1);
        let mode = options.mode;
        let timeout = options.timeout;
        let cancel = &options.cancel;
        let event_sink = &mut options.event_sink;

        let (tx, rx) = mpsc::channel();
        thread::scope(|scope| {
            for _ in 0..workers {
                let queue = Arc::clone(&queue);
                let tx = tx.clone();
                let cancel = cancel.clone();
                scope.spawn(move || loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let candidate = queue.lock().unwrap().pop_front();
                    let Some(candidate) = candidate else {
                        break;
                    };

                    let outcome = self.process(candidate, mode, timeout);
                    if tx.send(outcome).is_err() {
                        break;
                    }
                });
            }
            drop(tx);

            let mut outcomes = Vec::new();
            for outcome in rx {
                event_sink.consume(&outcome);
                outcomes.push(outcome);
            }
            outcomes
        })
    }

    fn process(
        &self,
        candidate: DirectoryCandidate,
        mode: DeletionMode,
        timeout: Option<Duration>,
    ) -> DeletionOutcome {
        let started = Instant::now();
        let (status, bytes_reclaimed) = match timeout {
            Some(limit) => self.remove_with_timeout(&candidate, mode, limit),
            None => self.remove(&candidate, mode),
        };

        DeletionOutcome {
            candidate,
            status,
            bytes_reclaimed,
            started,
            finished: Instant::now(),
        }
    }

    fn remove_with_timeout(
        &self,
        candidate: &DirectoryCandidate,
        mode: DeletionMode,
        limit: Duration,
    ) -> (OutcomeStatus, u64) {
        let (tx, rx) = mpsc::channel();
        let candidate = candidate.clone();
        let sizer = Arc::clone(&self.sizer);
        thread::spawn(move || {
            let detached = DeletionExecutor { sizer };
            let _ = tx.send(detached.remove(&candidate, mode));
        });

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(_) => (OutcomeStatus::Failed(SweepError::Timeout(limit)), 0),
        }
    }

    fn remove(&self, candidate: &DirectoryCandidate, mode: DeletionMode) -> (OutcomeStatus, u64) {
        let path = candidate.path();

        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            // already gone: deletion ensures absence, not a mutation of a
            // required-present target
            Err(_) => return (OutcomeStatus::Succeeded, 0),
        };

        let size = candidate
            .size()
            .or_else(|| self.sizer.size_of(path).ok())
            .unwrap_or(0);

        match mode {
            DeletionMode::DryRun => (OutcomeStatus::SkippedDryRun, size),
            DeletionMode::Trash => match trash::delete(path) {
                Ok(()) => {
                    log::debug!("Moved {} to trash", path.display());
                    (OutcomeStatus::MovedToTrash, size)
                }
                Err(error) => {
                    log::warn!("Failed to trash {}: {}", path.display(), error);
                    (
                        OutcomeStatus::Failed(SweepError::TrashUnavailable(error.to_string())),
                        0,
                    )
                }
            },
            DeletionMode::Permanent => {
                let result = if meta.is_dir() {
                    fs::remove_dir_all(path)
                } else {
                    fs::remove_file(path)
                };

                match result {
                    Ok(()) => {
                        log::debug!("Deleted {}", path.display());
                        (OutcomeStatus::Succeeded, size)
                    }
                    Err(error) => {
                        log::warn!("Failed to delete {}: {}", path.display(), error);
                        // measure what is actually left so the outcome
                        // reflects partial progress
                        let remaining = sizer::size_on_disk(path);
                        let reclaimed = size.saturating_sub(remaining);
                        let status = if reclaimed > 0 {
                            OutcomeStatus::Failed(SweepError::PartialDeletion {
                                path: path.to_owned(),
                                source: error,
                            })
                        } else {
                            OutcomeStatus::Failed(SweepError::from_fs(path, error))
                        };
                        (status, reclaimed)
                    }
                }
            }
        }
    }
}

/// Groups candidates into waves so that every candidate lands strictly after
/// all of its ancestors. Built once before execution begins.
fn schedule_waves(mut candidates: Vec<DirectoryCandidate>) -> Vec<Vec<DirectoryCandidate>> {
    // lexical order puts ancestors before their descendants
    candidates.sort_by(|a, b| a.path().cmp(b.path()));

    let mut assigned: Vec<(PathBuf, usize)> = Vec::with_capacity(candidates.len());
    let mut waves: Vec<Vec<DirectoryCandidate>> = Vec::new();

    for candidate in candidates {
        let wave = assigned
            .iter()
            .filter(|(path, _)| path.is_ancestor_of(candidate.path()))
            .map(|(_, wave)| wave + 1)
            .max()
            .unwrap_or(0);
        assigned.push((candidate.path().to_owned(), wave));

        if waves.len() <= wave {
            waves.resize_with(wave + 1, Vec::new);
        }
        waves[wave].push(candidate);
    }

    waves
}
