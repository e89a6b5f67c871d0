use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    candidate::DirectoryCandidate,
    cancel::CancelToken,
    executor::{DeletionExecutor, DeletionOutcome, ExecOptions, OutcomeStatus},
    scanner::{ScanOptions, Scanner, TargetKind},
    sizer::SizeCalculator,
    SweepError,
};

/// Aggregate of one cleaning run. Immutable once produced.
#[derive(Debug)]
pub struct SessionResult {
    pub outcomes: Vec<DeletionOutcome>,
    pub bytes_freed: u64,
    pub succeeded: usize,
    pub skipped_dry_run: usize,
    pub moved_to_trash: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl SessionResult {
    fn new(outcomes: Vec<DeletionOutcome>, elapsed: Duration, cancelled: bool) -> Self {
        let mut result = Self {
            bytes_freed: 0,
            succeeded: 0,
            skipped_dry_run: 0,
            moved_to_trash: 0,
            failed: 0,
            cancelled,
            elapsed,
            outcomes,
        };

        for outcome in &result.outcomes {
            result.bytes_freed += outcome.bytes_reclaimed;
            match outcome.status {
                OutcomeStatus::Succeeded => result.succeeded += 1,
                OutcomeStatus::SkippedDryRun => result.skipped_dry_run += 1,
                OutcomeStatus::MovedToTrash => result.moved_to_trash += 1,
                OutcomeStatus::Failed(_) => result.failed += 1,
            }
        }

        result
    }

    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn fully_succeeded(&self) -> bool {
        self.failed == 0
    }
}

pub struct SessionOptions {
    pub criteria: crate::FilterCriteria,
    pub exec: ExecOptions,
    pub scan_sink: Box<dyn crate::ScanEventSink + Send>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            criteria: crate::FilterCriteria::default(),
            exec: ExecOptions::default(),
            scan_sink: Box::new(crate::VoidEventSink),
        }
    }
}

/// Orchestrates scan, external selection and deletion, and owns the
/// session-scoped size cache. The cache dies with the session.
pub struct CleaningSession {
    sizer: Arc<SizeCalculator>,
    cancel: CancelToken,
}

impl CleaningSession {
    pub fn new() -> Self {
        Self {
            sizer: Arc::new(SizeCalculator::tolerant()),
            cancel: CancelToken::new(),
        }
    }

    /// Handle for cancelling the session from another thread. Cancellation
    /// stops candidate production and keeps the executor from starting new
    /// candidates; an in-flight deletion completes or fails on its own.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn sizer(&self) -> Arc<SizeCalculator> {
        Arc::clone(&self.sizer)
    }

    /// Runs a full cleaning pass. The scanned candidates are handed to
    /// `select` (an interactive or selective UI, or the identity function)
    /// before anything is deleted. Always returns a complete outcome list;
    /// per-candidate failures are summarized, never raised.
    pub fn run<F>(
        &self,
        root: PathBuf,
        kind: TargetKind,
        options: SessionOptions,
        select: F,
    ) -> Result<SessionResult, SweepError>
    where
        F: FnOnce(Vec<DirectoryCandidate>) -> Vec<DirectoryCandidate>,
    {
        let started = Instant::now();

        let scan_options = ScanOptions {
            criteria: options.criteria,
            cancel: self.cancel.clone(),
            event_sink: options.scan_sink,
        };
        let candidates =
            Scanner::new(kind).scan_collect(root, Arc::clone(&self.sizer), scan_options)?;
        log::debug!("Scan produced {} candidates", candidates.len());

        let candidates = if self.cancel.is_cancelled() {
            Vec::new()
        } else {
            select(candidates)
        };

        let mut exec = options.exec;
        exec.cancel = self.cancel.clone();
        let outcomes = DeletionExecutor::new(Arc::clone(&self.sizer)).execute(candidates, exec);

        Ok(SessionResult::new(
            outcomes,
            started.elapsed(),
            self.cancel.is_cancelled(),
        ))
    }
}

impl Default for CleaningSession {
    fn default() -> Self {
        Self::new()
    }
}
