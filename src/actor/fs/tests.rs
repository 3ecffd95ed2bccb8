use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tempfile::TempDir;

use super::classifier::classify;
use super::debouncer::{Debouncer, POLL_INTERVAL_MS, STABILITY_MS};
use super::index::DirectoryIndex;
use super::types::{ChangeKind, WatchedPath};
use super::*;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Probe reporting a fixed size for every path.
fn steady(_: &Path) -> Option<u64> {
    Some(10)
}

fn make_templates(names: &[(&str, &[&str])]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for (dir, files) in names {
        let dir = temp.path().join(dir);
        std::fs::create_dir_all(&dir).unwrap();
        for file in *files {
            std::fs::write(dir.join(file), "{}").unwrap();
        }
    }
    temp
}

// =============================================================================
// Debouncer
// =============================================================================

#[test]
fn test_debouncer_empty() {
    let mut debouncer = Debouncer::new();
    assert!(debouncer.is_idle());
    assert!(debouncer.poll(Instant::now(), steady).is_empty());
}

#[test]
fn test_idle_again_after_settling() {
    let mut debouncer = Debouncer::new();
    let start = Instant::now();
    debouncer.add("/t/a/index.html".into(), ChangeKind::Modified, start);
    assert!(!debouncer.is_idle());

    assert_eq!(debouncer.poll(start + ms(STABILITY_MS), steady).len(), 1);
    assert!(debouncer.is_idle());
}

#[test]
fn test_burst_settles_into_one_batch() {
    let mut debouncer = Debouncer::new();
    let start = Instant::now();
    let path = PathBuf::from("/t/a/index.html");

    // Ten writes 20ms apart
    for i in 0..10 {
        debouncer.add(path.clone(), ChangeKind::Modified, start + ms(i * 20));
    }
    let last = start + ms(180);

    let mut batches = Vec::new();
    let mut now = start;
    while now <= last + ms(STABILITY_MS + 2 * POLL_INTERVAL_MS) {
        if now >= last {
            let settled = debouncer.poll(now, steady);
            if !settled.is_empty() {
                batches.push(settled);
            }
        }
        now += ms(POLL_INTERVAL_MS);
    }

    assert_eq!(batches, vec![vec![(path, ChangeKind::Modified)]]);
    assert!(debouncer.is_idle());
}

#[test]
fn test_not_settled_before_stability_window() {
    let mut debouncer = Debouncer::new();
    let start = Instant::now();
    debouncer.add("/t/a/index.html".into(), ChangeKind::Created, start);

    assert!(debouncer.poll(start + ms(100), steady).is_empty());
    assert!(debouncer.poll(start + ms(STABILITY_MS - 1), steady).is_empty());
    assert_eq!(debouncer.poll(start + ms(STABILITY_MS), steady).len(), 1);
}

#[test]
fn test_growing_file_restarts_window() {
    let mut debouncer = Debouncer::new();
    let start = Instant::now();
    let path = PathBuf::from("/t/a/manifest.json");
    debouncer.add(path.clone(), ChangeKind::Modified, start);

    let sizes = std::cell::Cell::new(100);
    let growing = |_: &Path| Some(sizes.get());

    // First sample only records the size
    assert!(debouncer.poll(start + ms(100), growing).is_empty());
    // Size moves without a new event
    sizes.set(200);
    assert!(debouncer.poll(start + ms(200), growing).is_empty());
    // 300ms after the event but only 100ms after the last size change
    assert!(debouncer.poll(start + ms(300), growing).is_empty());
    assert!(debouncer.poll(start + ms(400), growing).is_empty());
    assert_eq!(
        debouncer.poll(start + ms(500), growing),
        vec![(path, ChangeKind::Modified)]
    );
}

#[test]
fn test_settled_paths_are_sorted() {
    let mut debouncer = Debouncer::new();
    let start = Instant::now();
    for path in ["/t/c/index.html", "/t/a/index.html", "/t/b/manifest.json"] {
        debouncer.add(path.into(), ChangeKind::Modified, start);
    }

    let settled: Vec<_> = debouncer
        .poll(start + ms(STABILITY_MS), steady)
        .into_iter()
        .map(|(p, _)| p)
        .collect();
    assert_eq!(
        settled,
        ["/t/a/index.html", "/t/b/manifest.json", "/t/c/index.html"].map(PathBuf::from)
    );
}

#[test]
fn test_dedup_first_event_wins() {
    let mut debouncer = Debouncer::new();
    let now = Instant::now();
    debouncer.add("/t/a/index.html".into(), ChangeKind::Created, now);
    debouncer.add("/t/a/index.html".into(), ChangeKind::Modified, now);

    assert_eq!(debouncer.pending.len(), 1);
    assert_eq!(
        debouncer.pending[&PathBuf::from("/t/a/index.html")].kind,
        ChangeKind::Created
    );
}

#[test]
fn test_remove_then_create_restores() {
    let mut debouncer = Debouncer::new();
    let now = Instant::now();
    debouncer.add("/t/a/index.html".into(), ChangeKind::Removed, now);
    debouncer.add("/t/a/index.html".into(), ChangeKind::Created, now);

    assert_eq!(
        debouncer.pending[&PathBuf::from("/t/a/index.html")].kind,
        ChangeKind::Created
    );
}

#[test]
fn test_create_then_remove_discards() {
    let mut debouncer = Debouncer::new();
    let now = Instant::now();
    debouncer.add("/t/a/index.html".into(), ChangeKind::Created, now);
    debouncer.add("/t/a/index.html".into(), ChangeKind::Removed, now);

    assert!(debouncer.is_idle(), "created+removed should discard");
}

#[test]
fn test_modify_then_remove_upgrades() {
    let mut debouncer = Debouncer::new();
    let now = Instant::now();
    debouncer.add("/t/a/index.html".into(), ChangeKind::Modified, now);
    debouncer.add("/t/a/index.html".into(), ChangeKind::Removed, now);

    assert_eq!(
        debouncer.pending[&PathBuf::from("/t/a/index.html")].kind,
        ChangeKind::Removed
    );
}

#[test]
fn test_metadata_events_ignored() {
    use notify::EventKind;
    use notify::event::{AccessKind, MetadataKind, ModifyKind};

    assert_eq!(
        ChangeKind::from_event(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))),
        None
    );
    assert_eq!(ChangeKind::from_event(&EventKind::Access(AccessKind::Any)), None);
    assert_eq!(
        ChangeKind::from_event(&EventKind::Modify(ModifyKind::Any)),
        Some(ChangeKind::Modified)
    );
}

// =============================================================================
// Classifier
// =============================================================================

#[test]
fn test_classify_depth_one() {
    let root = Path::new("/t");

    assert_eq!(classify(root, Path::new("/t/a")), Some(WatchedPath::Dir("a".into())));
    assert_eq!(
        classify(root, Path::new("/t/a/index.html")),
        Some(WatchedPath::File {
            dir: "a".into(),
            file: "index.html".into()
        })
    );
    assert_eq!(
        classify(root, Path::new("/t/a/manifest.json")).map(|w| w.dir().to_string()),
        Some("a".into())
    );
}

#[test]
fn test_classify_ignores_noise() {
    let root = Path::new("/t");

    assert_eq!(classify(root, Path::new("/t")), None);
    assert_eq!(classify(root, Path::new("/t/a/style.css")), None);
    assert_eq!(classify(root, Path::new("/t/a/nested/index.html")), None);
    assert_eq!(classify(root, Path::new("/t/.git/index.html")), None);
    assert_eq!(classify(root, Path::new("/elsewhere/a/index.html")), None);
}

// =============================================================================
// DirectoryIndex
// =============================================================================

#[test]
fn test_scan_lists_template_dirs_only() {
    let temp = make_templates(&[
        ("b", &["index.html"]),
        ("a", &["manifest.json"]),
        ("empty", &[]),
        ("assets", &["logo.png"]),
        (".hidden", &["index.html"]),
    ]);
    std::fs::write(temp.path().join("README.md"), "").unwrap();

    let index = DirectoryIndex::scan(temp.path()).unwrap();
    let names: Vec<_> = index.iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["a", "b"]);

    let a = index.get("a").unwrap();
    assert!(a.manifest && !a.index);
}

#[test]
fn test_scan_missing_root_fails() {
    let temp = TempDir::new().unwrap();
    assert!(DirectoryIndex::scan(&temp.path().join("missing")).is_err());
}

#[test]
fn test_refresh_adds_and_drops() {
    let temp = make_templates(&[("a", &["index.html"])]);
    let root = temp.path();
    let mut index = DirectoryIndex::scan(root).unwrap();

    std::fs::create_dir(root.join("b")).unwrap();
    std::fs::write(root.join("b/manifest.json"), "{}").unwrap();
    index.refresh(root, "b");
    assert_eq!(index.len(), 2);

    std::fs::remove_file(root.join("a/index.html")).unwrap();
    index.refresh(root, "a");
    assert!(index.get("a").is_none());
    assert_eq!(index.len(), 1);
}

// =============================================================================
// TemplateWatcher
// =============================================================================

#[tokio::test]
async fn test_watch_missing_root_fails() {
    let temp = TempDir::new().unwrap();
    let err = TemplateWatcher::watch(temp.path().join("missing"))
        .err()
        .expect("missing root must fail");
    assert!(matches!(err, WatchError::Root { .. }));
}

#[tokio::test]
async fn test_snapshot_normalizes_manifests() {
    let temp = make_templates(&[("lower-third", &["index.html"]), ("plain", &["index.html"])]);
    std::fs::write(
        temp.path().join("lower-third/manifest.json"),
        r#"{"previewImages":["./thumb.png"]}"#,
    )
    .unwrap();

    let watcher = TemplateWatcher::watch(temp.path()).unwrap();
    let snapshot = watcher.snapshot();

    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].name, "lower-third");
    assert_eq!(
        snapshot[0].manifest.as_ref().unwrap().preview_images(),
        Some(vec!["/templates/lower-third/thumb.png"])
    );
    assert_eq!(snapshot[1].name, "plain");
    assert!(snapshot[1].manifest.is_none());
}

#[tokio::test]
async fn test_snapshot_survives_broken_manifest() {
    let temp = make_templates(&[("a", &["index.html"])]);
    std::fs::write(temp.path().join("a/manifest.json"), "{ not json").unwrap();

    let watcher = TemplateWatcher::watch(temp.path()).unwrap();
    let snapshot = watcher.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot[0].manifest.is_none());
}

#[tokio::test]
async fn test_change_reaches_subscriber() {
    let temp = make_templates(&[("a", &["index.html"])]);
    let watcher = TemplateWatcher::watch(temp.path()).unwrap();
    let mut rx = watcher.subscribe();

    std::fs::create_dir(temp.path().join("b")).unwrap();
    std::fs::write(temp.path().join("b/index.html"), "<html></html>").unwrap();

    // Keep waiting until the new template shows up; the directory creation
    // and the file write may settle in separate batches.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let batch = tokio::time::timeout_at(deadline, rx.recv())
            .await
            .expect("timed out waiting for change")
            .expect("watcher closed");
        assert!(!batch.paths.is_empty());
        if watcher.snapshot().iter().any(|t| t.name == "b") {
            break;
        }
    }
}

#[tokio::test]
async fn test_change_settles_while_unrelated_files_churn() {
    let temp = make_templates(&[("a", &["index.html"])]);
    let watcher = TemplateWatcher::watch(temp.path()).unwrap();
    let mut rx = watcher.subscribe();

    std::fs::write(temp.path().join("a/manifest.json"), r#"{"previewImages":[]}"#).unwrap();

    // Bundler-style output rewritten faster than the sampling interval
    let noise = temp.path().join("a/bundle.tmp");
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut settled = None;
    let mut i = 0u32;
    while Instant::now() < deadline {
        i += 1;
        std::fs::write(&noise, i.to_string()).unwrap();
        if let Ok(batch) = tokio::time::timeout(ms(50), rx.recv()).await {
            let batch = batch.expect("watcher closed");
            assert!(batch.paths.iter().all(|p| !p.ends_with("a/bundle.tmp")));
            if batch.paths.iter().any(|p| p.ends_with("a/manifest.json")) {
                settled = Some(batch);
                break;
            }
        }
    }

    assert!(settled.is_some(), "manifest change never settled under churn");
}

#[tokio::test]
async fn test_close_is_idempotent_and_ends_subscriptions() {
    let temp = make_templates(&[("a", &["index.html"])]);
    let watcher = TemplateWatcher::watch(temp.path()).unwrap();
    let mut before = watcher.subscribe();

    watcher.close();
    watcher.close();
    assert!(watcher.is_closed());

    assert!(before.recv().await.is_none());
    let mut after = watcher.subscribe();
    assert!(after.recv().await.is_none());
}
