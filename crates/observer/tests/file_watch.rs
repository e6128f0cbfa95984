//! End-to-end file watching through the event bus

use anyhow::Result;
use observer::{Event, EventKind, Observer, ObserverError, WatchError};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::timeout;

fn recording_listener(observer: &Observer<String>) -> Result<UnboundedReceiver<Event<String>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    observer.add_listener(move |event| {
        let _ = tx.send(event);
    })?;
    Ok(rx)
}

async fn next(rx: &mut UnboundedReceiver<Event<String>>) -> Result<Event<String>> {
    timeout(Duration::from_secs(5), rx.recv())
        .await?
        .ok_or_else(|| anyhow::anyhow!("listener dropped"))
}

/// Fail if anything else arrives within a short quiet period
async fn assert_quiet(rx: &mut UnboundedReceiver<Event<String>>) {
    if let Ok(Some(extra)) = timeout(Duration::from_millis(800), rx.recv()).await {
        panic!("unexpected extra event: {:?}", extra);
    }
}

fn changed_path(event: &Event<String>) -> Option<&Path> {
    event.as_change().map(|change| change.path.as_path())
}

#[tokio::test]
async fn test_watch_file_reports_write() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path().canonicalize()?;
    let file = dir.join("test_watch.txt");
    fs::write(&file, b"temporary content")?;

    let observer: Observer<String> = Observer::new();
    observer.watch([&file])?;
    let mut rx = recording_listener(&observer)?;

    // Watching opens the bus on demand
    assert!(observer.is_open());

    fs::write(&file, b"temporary content")?;

    let event = next(&mut rx).await?;
    assert_eq!(changed_path(&event), Some(file.as_path()));
    assert_eq!(event.as_change().map(|c| c.kind), Some(EventKind::Modify));

    // One rewrite, one event
    assert_quiet(&mut rx).await;
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_reported_path_matches_watched_path() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let real = temp_dir.path().canonicalize()?.join("real");
    let link = temp_dir.path().join("link");
    fs::create_dir(&real)?;
    std::os::unix::fs::symlink(&real, &link)?;

    let watched = link.join("main.c");
    fs::write(&watched, b"v1")?;

    let observer: Observer<String> = Observer::new();
    observer.watch([&watched])?;
    let mut rx = recording_listener(&observer)?;

    fs::write(&watched, b"v2")?;

    // Reported through the link, not the resolved directory
    let event = next(&mut rx).await?;
    assert_eq!(changed_path(&event), Some(watched.as_path()));
    Ok(())
}

#[tokio::test]
async fn test_watch_glob_ignores_other_names() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path().canonicalize()?;

    let observer: Observer<String> = Observer::new();
    observer.open()?;
    observer.watch([dir.join("*.c")])?;
    let mut rx = recording_listener(&observer)?;

    fs::write(dir.join("bar.txt"), b"ignored")?;
    fs::write(dir.join("foo.c"), b"int foo;")?;

    let event = next(&mut rx).await?;
    assert_eq!(changed_path(&event), Some(dir.join("foo.c").as_path()));

    // Anything else that trickles in is still about foo.c
    while let Ok(Some(event)) = timeout(Duration::from_millis(300), rx.recv()).await {
        assert_eq!(changed_path(&event), Some(dir.join("foo.c").as_path()));
    }
    Ok(())
}

#[tokio::test]
async fn test_replaced_file_keeps_reporting() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path().canonicalize()?;
    let file = dir.join("main.c");
    fs::write(&file, b"v1")?;

    let observer: Observer<String> = Observer::new();
    observer.watch([&file])?;
    let mut rx = recording_listener(&observer)?;

    fs::remove_file(&file)?;
    fs::write(&file, b"v2")?;

    let event = next(&mut rx).await?;
    assert_eq!(changed_path(&event), Some(file.as_path()));
    Ok(())
}

#[tokio::test]
async fn test_file_changes_are_damped_with_emits() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path().canonicalize()?;
    let file = dir.join("notes.md");
    fs::write(&file, b"draft")?;

    let observer: Observer<String> = Observer::new();
    observer.set_buffer_duration(Duration::from_millis(400));
    observer.watch([&file])?;
    let mut rx = recording_listener(&observer)?;

    observer.emit("manual".to_string());
    fs::write(&file, b"draft 2")?;

    let event = next(&mut rx).await?;
    let batch = event
        .as_batch()
        .ok_or_else(|| anyhow::anyhow!("expected a batch, got {:?}", event))?;

    assert_eq!(batch.first(), Some(&Event::Value("manual".to_string())));
    assert!(batch.len() >= 2);
    for change in &batch[1..] {
        assert_eq!(changed_path(change), Some(file.as_path()));
    }
    Ok(())
}

#[tokio::test]
async fn test_watch_missing_directory_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path().canonicalize()?;

    let observer: Observer<String> = Observer::new();
    let result = observer.watch([dir.join("ok.c"), dir.join("missing").join("gone.c")]);

    assert!(matches!(
        result,
        Err(ObserverError::Watch(WatchError::Register { .. }))
    ));

    // The failed call does not leave the bus running
    assert!(!observer.is_open());

    // The first path stays registered
    assert_eq!(
        observer.watched_directories(),
        vec![dir.to_string_lossy().into_owned()]
    );
    assert_eq!(observer.watched_patterns().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_watch_keeps_open_bus_open() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path().canonicalize()?;

    let observer: Observer<String> = Observer::new();
    observer.open()?;
    let mut rx = recording_listener(&observer)?;

    assert!(observer.watch([dir.join("missing").join("gone.c")]).is_err());
    assert!(observer.is_open());

    observer.emit("still here".to_string());
    assert_eq!(next(&mut rx).await?, Event::Value("still here".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_close_releases_watcher() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path().canonicalize()?;

    let observer: Observer<String> = Observer::new();
    observer.watch([dir.join("*.rs")])?;
    assert_eq!(observer.watched_patterns().len(), 1);

    observer.close()?;
    assert!(!observer.is_open());
    assert!(observer.watched_patterns().is_empty());
    assert!(observer.watched_directories().is_empty());
    Ok(())
}
