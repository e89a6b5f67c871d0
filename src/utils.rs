use std::{
    io::{self, Write},
    time::Duration,
};

use dirsweep::DirectoryCandidate;

pub fn format_duration(value: &Duration) -> String {
    if value.as_secs() < 60 * 60 {
        format!(
            "{:0>2}:{:0>2}.{:0>2}",
            value.as_secs() / 60,
            value.as_secs() % 60,
            value.subsec_millis() / 10
        )
    } else {
        format!(
            "{:0>2}:{:0>2}:{:0>2}",
            value.as_secs() / (60 * 60),
            (value.as_secs() / 60) % 60,
            value.as_secs() % 60
        )
    }
}

/// Per-candidate yes/no prompt, defaulting to no. Answers are read from
/// stdin; a closed stream keeps everything unanswered unselected.
pub fn prompt_selection(candidates: Vec<DirectoryCandidate>) -> Vec<DirectoryCandidate> {
    let stdin = io::stdin();
    let mut selected = Vec::new();

    for candidate in candidates {
        print!("Delete {}? [y/N] ", candidate.path().display());
        let _ = io::stdout().flush();

        let mut line = String::new();
        if stdin.read_line(&mut line).is_err() || line.is_empty() {
            break;
        }

        if line.trim().eq_ignore_ascii_case("y") {
            selected.push(candidate);
        } else {
            println!("Skipping: {}", candidate.path().display());
        }
    }

    selected
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::format_duration;

    #[test]
    fn durations() {
        assert_eq!(format_duration(&Duration::from_secs(75)), "01:15.00");
        assert_eq!(format_duration(&Duration::from_secs(2 * 3600 + 60)), "02:01:00");
    }
}
