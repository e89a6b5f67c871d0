use std::time::Duration;

use dirsweep::{
    utils::format_file_size,
    DeletionOutcome,
    ExecEventSink,
    OutcomeStatus,
    ScanEvent,
    ScanEventSink,
};
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner fed by the scanner's event stream.
pub struct ScanProgress {
    bar: ProgressBar,
    inspected: u64,
    found: u64,
}

impl ScanProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            bar,
            inspected: 0,
            found: 0,
        }
    }
}

impl ScanEventSink for ScanProgress {
    fn consume(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::Inspecting(path) => {
                self.inspected += 1;
                if self.inspected % 64 == 0 {
                    self.bar.set_message(format!(
                        "Scanning ({} entries): {}",
                        self.inspected,
                        path.display()
                    ));
                }
            }
            ScanEvent::Found { path, kind } => {
                self.found += 1;
                self.bar
                    .println(format!("Found {}: {}", kind.label(), path.display()));
            }
            ScanEvent::Error(error) => {
                self.bar.println(format!("Warning: {}", error));
            }
        }
    }
}

impl Drop for ScanProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
        println!(
            "Scan complete: {} candidates ({} entries inspected)",
            self.found, self.inspected
        );
    }
}

/// Prints one line per processed candidate, in the order outcomes arrive.
pub struct OutcomePrinter;

impl ExecEventSink for OutcomePrinter {
    fn consume(&mut self, outcome: &DeletionOutcome) {
        let path = outcome.candidate.path();
        let size = format_file_size(outcome.bytes_reclaimed);
        match &outcome.status {
            OutcomeStatus::Succeeded => println!("✓ Deleted: {} ({})", path.display(), size),
            OutcomeStatus::MovedToTrash => {
                println!("✓ Moved to trash: {} ({})", path.display(), size)
            }
            OutcomeStatus::SkippedDryRun => {
                println!("Would delete: {} ({})", path.display(), size)
            }
            OutcomeStatus::Failed(error) => {
                println!("✗ Failed: {} - {}", path.display(), error)
            }
        }
    }
}
