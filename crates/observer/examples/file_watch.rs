//! Log modifications of this crate's manifest and lib.rs for 12 seconds

use observer::{Event, Observer};
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> observer::Result<()> {
    tracing_subscriber::fmt::init();

    let observer: Observer<String> = Observer::new();
    observer.watch([
        concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"),
        concat!(env!("CARGO_MANIFEST_DIR"), "/src/lib.rs"),
    ])?;

    observer.add_listener(|event: Event<String>| {
        if let Some(change) = event.as_change() {
            info!("File modified: {}", change.path.display());
        }
    })?;

    info!("Observer is watching Cargo.toml and src/lib.rs");
    tokio::time::sleep(Duration::from_secs(12)).await;
    observer.close()
}
