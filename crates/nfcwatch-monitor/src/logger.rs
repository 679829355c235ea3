//! Listener that writes every notification to the log.

use nfcwatch_core::StatusNotification;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Log each notification received on `events` at `info` until the bus
/// closes.
pub fn spawn_event_logger(mut events: broadcast::Receiver<StatusNotification>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(notification) => log_notification(&notification),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event logger fell behind, notifications dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("event logger stopped");
    })
}

fn log_notification(notification: &StatusNotification) {
    match notification {
        StatusNotification::ConnectionChanged { connected } => {
            info!(connected, "reader connection status");
        }
        StatusNotification::TagChanged(snapshot) => {
            info!(
                present = snapshot.present,
                uid = snapshot.uid.map(|uid| uid.hex()),
                text = snapshot.text.as_deref(),
                "tag status"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventBus, EventSink};
    use nfcwatch_core::{CardUid, TagSnapshot};

    #[tokio::test]
    async fn test_logger_drains_and_stops_when_bus_closes() {
        let bus = EventBus::new(4);
        let logger = spawn_event_logger(bus.subscribe());

        bus.publish(StatusNotification::connection(true));
        bus.publish(StatusNotification::TagChanged(TagSnapshot::with_text(
            CardUid::new(0xAB),
            "TESTING",
        )));
        drop(bus);

        logger.await.unwrap();
    }

    #[tokio::test]
    async fn test_logger_survives_lag() {
        let bus = EventBus::new(1);
        let events = bus.subscribe();

        for _ in 0..5 {
            bus.publish(StatusNotification::connection(false));
        }

        let logger = spawn_event_logger(events);
        drop(bus);
        logger.await.unwrap();
    }
}
