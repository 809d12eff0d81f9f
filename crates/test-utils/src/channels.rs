//! Helpers for asserting on event channels.

use tokio::sync::mpsc;

/// Take every message currently queued on the receiver without waiting.
pub fn drain<T>(rx: &mut mpsc::Receiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Ok(item) = rx.try_recv() {
        items.push(item);
    }
    items
}
