//! Watch-and-run loop

use crate::config::Config;
use crate::script;
use anyhow::{Context, Result};
use observer::{Event, Observer};
use parking_lot::Mutex;
use tracing::info;

/// Build an observer that runs the configured scripts on every event
///
/// Must be called from within a Tokio runtime.
pub fn start(config: &Config) -> Result<Observer<String>> {
    let observer: Observer<String> = Observer::new();

    if config.damping_secs != 0 {
        observer.set_buffer_duration(config.damping());
    }

    observer.watch(&config.watch).context("Failed to watch files")?;

    // One burst's scripts finish before the next burst's start
    let scripts = config.run.clone();
    let running = Mutex::new(());

    observer.add_listener(move |event: Event<String>| {
        let _guard = running.lock();
        info!("Received: {:?}", event);
        script::run_all(&scripts);
    })?;

    Ok(observer)
}

/// Run until Ctrl+C
pub async fn run(config: Config) -> Result<()> {
    let observer = start(&config)?;

    info!("Observer starting.");
    info!("Press Ctrl+C to exit.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Shutting down");
    observer.close()?;
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_write_runs_scripts() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path().canonicalize()?;
        let watched = dir.join("main.c");
        let marker = dir.join("built");
        std::fs::write(&watched, b"int main;")?;

        let config = Config {
            watch: vec![watched.to_string_lossy().into_owned()],
            run: vec![format!("touch {}", marker.display())],
            ..Config::default()
        };
        let observer = start(&config)?;
        assert!(observer.is_open());
        assert_eq!(observer.listener_count(), 1);

        let deadline = Instant::now() + Duration::from_secs(10);
        while !marker.exists() && Instant::now() < deadline {
            std::fs::write(&watched, b"int main;")?;
            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        assert!(marker.exists());
        observer.close()?;
        Ok(())
    }

    #[tokio::test]
    async fn test_start_applies_damping() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = Config {
            watch: vec![temp_dir.path().join("*.c").to_string_lossy().into_owned()],
            run: vec!["true".to_string()],
            damping_secs: 3,
            verbose: false,
        };

        let observer = start(&config)?;

        assert_eq!(observer.buffer_duration(), Duration::from_secs(3));
        assert_eq!(observer.watched_patterns().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_start_fails_on_missing_directory() {
        let config = Config {
            watch: vec!["/definitely/not/here/main.c".to_string()],
            run: vec!["true".to_string()],
            ..Config::default()
        };

        let err = start(&config).err().unwrap();
        assert!(err.to_string().contains("Failed to watch files"));
    }
}
