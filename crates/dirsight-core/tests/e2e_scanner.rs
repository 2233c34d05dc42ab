/// End-to-end scanner integration tests.
///
/// These exercise `SizeAggregator`, `list_children` and `ScanCoordinator`
/// against real temporary directory trees, plus the in-memory filesystem
/// where a scenario needs deterministic denial or a scan held in flight.
use dirsight_core::scanner::{
    ScanCoordinator, ScanHandle, ScanMessage, ScanRequest, ScanStart, SizeAggregator,
};
use dirsight_core::{
    EngineConfig, MemoryFilesystem, OsFilesystem, RefreshOutcome, ScanResult, SizeUnit,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Create a reproducible directory tree:
///
/// ```text
/// root/
///   alpha/
///     a.txt   (100 bytes)
///     b.rs    (200 bytes)
///     inner/
///       e.log (500 bytes)
///   beta/
///     c.png   (300 bytes)
///   d.zip     (400 bytes)
/// ```
fn build_test_tree(root: &Path) {
    let alpha = root.join("alpha");
    let beta = root.join("beta");
    fs::create_dir_all(alpha.join("inner")).unwrap();
    fs::create_dir_all(&beta).unwrap();

    write_bytes(&alpha.join("a.txt"), 100);
    write_bytes(&alpha.join("b.rs"), 200);
    write_bytes(&alpha.join("inner").join("e.log"), 500);
    write_bytes(&beta.join("c.png"), 300);
    write_bytes(&root.join("d.zip"), 400);
}

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

/// A config that shows every entry, however small.
fn show_all() -> EngineConfig {
    EngineConfig {
        display_threshold: 0.0,
        ..EngineConfig::default()
    }
}

fn completed(outcome: RefreshOutcome) -> Arc<ScanResult> {
    match outcome {
        RefreshOutcome::Completed(result) => result,
        RefreshOutcome::Busy => panic!("expected a completed refresh"),
    }
}

fn started(start: ScanStart) -> ScanHandle {
    match start {
        ScanStart::Started(handle) => handle,
        ScanStart::Busy => panic!("expected the scan to start"),
    }
}

/// Drain messages until `Complete`, returning the result and the number of
/// progress updates seen. Panics after 30 seconds.
fn drain_to_completion(handle: &ScanHandle) -> (ScanResult, usize) {
    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    let mut updates = 0;
    loop {
        assert!(
            std::time::Instant::now() < deadline,
            "scanner did not complete within 30 seconds"
        );
        match handle.progress_rx.try_recv() {
            Ok(ScanMessage::Complete { result, .. }) => return (*result, updates),
            Ok(ScanMessage::Update { .. }) => updates += 1,
            Err(crossbeam_channel::TryRecvError::Empty) => {
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                panic!("scanner channel disconnected before Complete was sent");
            }
        }
    }
}

/// `true` if the current process can read a directory even after its mode
/// is set to 000 (i.e. it runs as root), which defeats permission tests.
#[cfg(unix)]
fn permissions_are_bypassed(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn test_aggregate_real_tree() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let mut agg = SizeAggregator::new(&OsFilesystem, 1_000);
    assert_eq!(agg.aggregate(tmp.path()), 1_500);
    assert_eq!(agg.stats().files_counted, 5);
    assert_eq!(agg.stats().error_count, 0);

    assert_eq!(dirsight_core::scanner::aggregate(&tmp.path().join("alpha")), 800);
    assert_eq!(dirsight_core::scanner::aggregate(&tmp.path().join("beta")), 300);
}

#[test]
fn test_aggregate_missing_path_is_zero() {
    let tmp = TempDir::new().unwrap();
    assert_eq!(dirsight_core::scanner::aggregate(&tmp.path().join("gone")), 0);
}

#[test]
fn test_refresh_real_tree_sorted_with_file_count() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let mut coord = ScanCoordinator::with_os(show_all());
    let result = completed(coord.refresh(&ScanRequest::new(tmp.path(), SizeUnit::Bytes)));

    let order: Vec<(&str, u64)> = result
        .entries
        .iter()
        .map(|e| (e.name.as_str(), e.size_bytes))
        .collect();
    assert_eq!(order, [("alpha", 800), ("beta", 300)]);
    assert_eq!(result.file_count, 1, "only d.zip is a direct file");
    assert!(result.failure.is_none());
    assert_eq!(result.scanned_path, tmp.path());
    assert!(result.entries.iter().all(|e| e.path.is_absolute()));
}

#[test]
fn test_default_threshold_hides_small_dirs() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    // 800 bytes is 0.78 KB (shown); 300 bytes is 0.29 KB (shown); in MB
    // both fall below 0.01 and are hidden.
    let mut coord = ScanCoordinator::with_os(EngineConfig::default());
    let kb = completed(coord.refresh(&ScanRequest::new(tmp.path(), SizeUnit::Kb)));
    assert_eq!(kb.entries.len(), 2);
    assert_eq!(kb.hidden_count, 0);

    let mb = completed(coord.refresh(&ScanRequest::new(tmp.path(), SizeUnit::Mb)));
    assert!(mb.entries.is_empty());
    assert_eq!(mb.hidden_count, 2);
}

#[cfg(unix)]
#[test]
fn test_restricted_child_scenario() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("testroot");
    let a = root.join("a");
    let b = root.join("b");
    fs::create_dir_all(&a).unwrap();
    fs::create_dir_all(&b).unwrap();
    for i in 0..10 {
        write_bytes(&a.join(format!("f{i}.bin")), 100);
    }
    write_bytes(&root.join("top.txt"), 7);
    fs::set_permissions(&b, fs::Permissions::from_mode(0o000)).unwrap();

    if permissions_are_bypassed(&b) {
        fs::set_permissions(&b, fs::Permissions::from_mode(0o755)).unwrap();
        eprintln!("skipping: running with elevated privileges");
        return;
    }

    let mut coord = ScanCoordinator::with_os(EngineConfig::default());
    let result = completed(coord.refresh(&ScanRequest::new(&root, SizeUnit::Bytes)));

    fs::set_permissions(&b, fs::Permissions::from_mode(0o755)).unwrap();

    let order: Vec<(&str, u64, bool)> = result
        .entries
        .iter()
        .map(|e| (e.name.as_str(), e.size_bytes, e.accessible))
        .collect();
    assert_eq!(order, [("a", 1_000, true), ("b", 0, false)]);
    assert_eq!(result.file_count, 1);
    assert_eq!(result.error_count, 1);
}

#[cfg(unix)]
#[test]
fn test_symlink_loop_terminates() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("real")).unwrap();
    write_bytes(&root.join("real").join("data.bin"), 64);
    std::os::unix::fs::symlink(root, root.join("real").join("loop")).unwrap();
    std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();

    let mut coord = ScanCoordinator::with_os(show_all());
    let result = completed(coord.refresh(&ScanRequest::new(root, SizeUnit::Bytes)));

    let names: Vec<&str> = result.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["real"], "symlinked directories are not listed");
    assert_eq!(result.entries[0].size_bytes, 64);
}

#[test]
fn test_background_refresh_delivers_complete() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let mut coord = ScanCoordinator::with_os(EngineConfig {
        progress_interval: 1,
        ..show_all()
    });
    let handle = started(
        coord
            .start_refresh(ScanRequest::new(tmp.path(), SizeUnit::Bytes))
            .unwrap(),
    );
    let (result, updates) = drain_to_completion(&handle);

    assert!(updates >= 1, "progress_interval 1 reports every directory");
    assert!(!coord.is_busy());
    assert_eq!(result.generation, handle.generation());
    assert!(coord.accept(result));
    assert_eq!(coord.latest().map(|r| r.entries.len()), Some(2));
}

#[test]
fn test_concurrent_refresh_is_coalesced() {
    let fs = Arc::new(MemoryFilesystem::new());
    fs.add_file("/data/a/x.bin", 10).add_file("/data/b/y.bin", 20);
    let release = fs.pause_at("/data");

    let mut coord = ScanCoordinator::new(fs.clone(), show_all());
    let handle = started(
        coord
            .start_refresh(ScanRequest::new("/data", SizeUnit::Bytes))
            .unwrap(),
    );

    // Second call while the first is held inside read_dir("/data").
    assert!(matches!(
        coord
            .start_refresh(ScanRequest::new("/data", SizeUnit::Bytes))
            .unwrap(),
        ScanStart::Busy
    ));
    assert!(matches!(
        coord.refresh(&ScanRequest::new("/data", SizeUnit::Bytes)),
        RefreshOutcome::Busy
    ));

    release.send(()).unwrap();
    let (result, _) = drain_to_completion(&handle);
    assert!(coord.accept(result));

    // One walk: /data, /data/a, /data/b.
    assert_eq!(fs.read_dir_calls(), 3);

    // Once idle, a new refresh runs to completion.
    let again = completed(coord.refresh(&ScanRequest::new("/data", SizeUnit::Bytes)));
    assert_eq!(again.entries.len(), 2);
    assert_eq!(fs.read_dir_calls(), 6);
}

#[test]
fn test_superseded_scan_is_discarded() {
    let fs = Arc::new(MemoryFilesystem::new());
    fs.add_file("/data/a/x.bin", 10);
    let release = fs.pause_at("/data");

    let mut coord = ScanCoordinator::new(fs.clone(), show_all());
    let handle = started(
        coord
            .start_refresh(ScanRequest::new("/data", SizeUnit::Bytes))
            .unwrap(),
    );
    coord.invalidate();
    release.send(()).unwrap();

    let (result, _) = drain_to_completion(&handle);
    assert!(!coord.accept(result));
    assert!(coord.latest().is_none());

    // The walk stopped at the first child once stale: /data/a was never read.
    assert_eq!(fs.read_dir_calls(), 1);
}

#[test]
fn test_clear_results() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let mut coord = ScanCoordinator::with_os(show_all());
    completed(coord.refresh(&ScanRequest::new(tmp.path(), SizeUnit::Bytes)));
    assert!(coord.latest().is_some());
    coord.clear_results();
    assert!(coord.latest().is_none());
}
