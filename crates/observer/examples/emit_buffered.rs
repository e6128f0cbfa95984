//! Two bursts of emits, coalesced by a 2 second damping window into one batch

use observer::{Event, Observer};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> observer::Result<()> {
    tracing_subscriber::fmt::init();

    let observer: Arc<Observer<String>> = Arc::new(Observer::new());
    observer.open()?;
    observer.set_buffer_duration(Duration::from_secs(2));

    observer.add_listener(|event: Event<String>| {
        info!("Received: {:?}", event);
    })?;

    let first = Arc::clone(&observer);
    tokio::spawn(async move {
        first.emit("Holla".to_string());
        first.emit("Ciao".to_string());
    });

    // Lands inside the same window as the first burst
    let second = Arc::clone(&observer);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        second.emit("Hello".to_string());
        second.emit("Bonjour".to_string());
    });

    tokio::time::sleep(Duration::from_secs(4)).await;
    observer.close()
}
