use std::fs;
use std::path::Path;

use dirsweep::{
    CleaningSession,
    DeletionMode,
    ExecOptions,
    FilterCriteria,
    SessionOptions,
    TargetKind,
};

fn write_tree(root: &Path, size: usize, dir: &str) {
    let dir = root.join(dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("blob.bin"), vec![0u8; size]).unwrap();
}

fn permanent() -> SessionOptions {
    SessionOptions {
        exec: ExecOptions {
            mode: DeletionMode::Permanent,
            ..ExecOptions::default()
        },
        ..SessionOptions::default()
    }
}

#[test]
fn node_modules_cleanup_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    write_tree(root.path(), 10 * 1024, "node_modules");
    write_tree(root.path(), 5 * 1024, "a/node_modules");
    write_tree(root.path(), 64, "a/src");

    let session = CleaningSession::new();
    let result = session
        .run(
            root.path().to_path_buf(),
            TargetKind::NodeModules,
            permanent(),
            |candidates| candidates,
        )
        .unwrap();

    assert_eq!(result.processed(), 2);
    assert_eq!(result.succeeded, 2);
    assert_eq!(result.bytes_freed, 15 * 1024);
    assert!(result.fully_succeeded());

    assert!(!root.path().join("node_modules").exists());
    assert!(!root.path().join("a/node_modules").exists());
    assert!(root.path().join("a/src/blob.bin").exists());
}

#[test]
fn dry_run_leaves_the_tree_untouched() {
    let root = tempfile::tempdir().unwrap();
    write_tree(root.path(), 2048, "node_modules");

    let session = CleaningSession::new();
    let result = session
        .run(
            root.path().to_path_buf(),
            TargetKind::NodeModules,
            SessionOptions::default(),
            |candidates| candidates,
        )
        .unwrap();

    assert_eq!(result.skipped_dry_run, 1);
    assert_eq!(result.bytes_freed, 2048);
    assert!(root.path().join("node_modules/blob.bin").exists());
}

#[test]
fn preset_removes_only_its_patterns() {
    let root = tempfile::tempdir().unwrap();
    for dir in ["build", "dist", "target"] {
        write_tree(root.path(), 128, dir);
    }
    write_tree(root.path(), 128, "src");

    let rule = dirsweep::find_preset("build-artifacts").unwrap();
    let session = CleaningSession::new();
    let result = session
        .run(
            root.path().to_path_buf(),
            TargetKind::Preset(rule),
            permanent(),
            |candidates| candidates,
        )
        .unwrap();

    assert_eq!(result.succeeded, 3);
    for dir in ["build", "dist", "target"] {
        assert!(!root.path().join(dir).exists());
    }
    assert!(root.path().join("src").exists());

    for outcome in &result.outcomes {
        assert_eq!(outcome.candidate.matched_rule(), Some("build-artifacts"));
    }
}

#[test]
fn filters_compose_across_the_session() {
    let root = tempfile::tempdir().unwrap();
    write_tree(root.path(), 4096, "big/node_modules");
    write_tree(root.path(), 16, "small/node_modules");
    write_tree(root.path(), 4096, "precious/node_modules");

    let options = SessionOptions {
        criteria: FilterCriteria::new(
            &[],
            &["precious".to_string()],
            Some(1024),
            None,
        )
        .unwrap(),
        exec: ExecOptions {
            mode: DeletionMode::Permanent,
            ..ExecOptions::default()
        },
        ..SessionOptions::default()
    };

    let session = CleaningSession::new();
    let result = session
        .run(
            root.path().to_path_buf(),
            TargetKind::NodeModules,
            options,
            |candidates| candidates,
        )
        .unwrap();

    assert_eq!(result.succeeded, 1);
    assert!(!root.path().join("big/node_modules").exists());
    assert!(root.path().join("small/node_modules").exists());
    assert!(root.path().join("precious/node_modules").exists());
}

#[test]
fn overlapping_candidates_resolve_parallel() {
    let root = tempfile::tempdir().unwrap();
    write_tree(root.path(), 256, "outer/tmp");
    write_tree(root.path(), 256, "tmp");
    fs::create_dir(root.path().join("outer/tmp/tmp")).unwrap();

    let options = SessionOptions {
        exec: ExecOptions {
            mode: DeletionMode::Permanent,
            parallel: true,
            workers: 4,
            ..ExecOptions::default()
        },
        ..SessionOptions::default()
    };

    let session = CleaningSession::new();
    let result = session
        .run(
            root.path().to_path_buf(),
            TargetKind::Pattern {
                glob: "tmp".to_string(),
                max_depth: None,
                match_files: false,
            },
            options,
            |candidates| candidates,
        )
        .unwrap();

    // outer/tmp is terminal once matched, so outer/tmp/tmp is never reported
    assert_eq!(result.processed(), 2);
    assert!(result.fully_succeeded());
    assert!(!root.path().join("outer/tmp").exists());
    assert!(!root.path().join("tmp").exists());
}
