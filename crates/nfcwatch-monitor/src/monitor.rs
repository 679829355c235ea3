//! Spawned reader monitor.
//!
//! [`spawn_monitor`] validates the configuration, wires a [`PollLoop`] to an
//! [`EventBus`] and runs it on a Tokio task. The returned [`ReaderMonitor`]
//! is the only handle to that task.

use crate::config::MonitorConfig;
use crate::events::{EventBus, EventSink};
use crate::scheduler::PollLoop;
use nfcwatch_core::{Error, Result, StatusNotification};
use nfcwatch_hardware::AnyReaderDevice;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Handle to a running poll loop.
///
/// # Examples
///
/// ```no_run
/// use nfcwatch_hardware::mock::MockReader;
/// use nfcwatch_monitor::{MonitorConfig, spawn_monitor};
///
/// #[tokio::main]
/// async fn main() -> nfcwatch_core::Result<()> {
///     let (reader, _handle) = MockReader::new();
///     let monitor = spawn_monitor(reader.into(), MonitorConfig::default())?;
///
///     let mut events = monitor.subscribe();
///     if let Ok(notification) = events.recv().await {
///         println!("{notification:?}");
///     }
///
///     let _reader = monitor.shutdown().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct ReaderMonitor {
    bus: Arc<EventBus>,
    cancel: CancellationToken,
    task: JoinHandle<AnyReaderDevice>,
}

/// Start polling `device` on a new Tokio task.
///
/// Listeners registered through [`ReaderMonitor::subscribe`] only see
/// notifications published after they subscribe. Use
/// [`spawn_monitor_with_bus`] to attach listeners before the first cycle.
pub fn spawn_monitor(device: AnyReaderDevice, config: MonitorConfig) -> Result<ReaderMonitor> {
    config.validate()?;
    let bus = Arc::new(EventBus::new(config.event_capacity));
    spawn_monitor_with_bus(device, config, bus)
}

/// Start polling `device`, publishing to an existing bus.
pub fn spawn_monitor_with_bus(
    device: AnyReaderDevice,
    config: MonitorConfig,
    bus: Arc<EventBus>,
) -> Result<ReaderMonitor> {
    config.validate()?;

    let cancel = CancellationToken::new();
    let sink: Arc<dyn EventSink> = bus.clone();
    let poll_loop = PollLoop::new(device, sink, &config, cancel.clone());

    info!(
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        ndef_buffer_size = config.ndef_buffer_size,
        "starting reader monitor"
    );
    let task = tokio::spawn(poll_loop.run());

    Ok(ReaderMonitor { bus, cancel, task })
}

impl ReaderMonitor {
    /// Register a listener for status notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusNotification> {
        self.bus.subscribe()
    }

    /// Token that stops the poll loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the poll loop and wait for it to close the reader.
    ///
    /// Interrupts a recovery wait in progress. Returns the reader so it can be
    /// reused.
    pub async fn shutdown(self) -> Result<AnyReaderDevice> {
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| Error::TaskFailed(e.to_string()))
    }
}
