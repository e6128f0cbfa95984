//! Emit two values from background tasks and log them as they arrive

use observer::{Event, Observer};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> observer::Result<()> {
    tracing_subscriber::fmt::init();

    // Open an observer and start running
    let observer: Arc<Observer<String>> = Arc::new(Observer::new());
    observer.open()?;

    observer.add_listener(|event: Event<String>| {
        if let Some(value) = event.as_value() {
            info!("Received: {}", value);
        }
    })?;

    let late = Arc::clone(&observer);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        late.emit("Holla".to_string());
    });

    let early = Arc::clone(&observer);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        early.emit("Hello".to_string());
    });

    tokio::time::sleep(Duration::from_secs(3)).await;
    observer.close()
}
