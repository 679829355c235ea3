//! Poll cycle driver.
//!
//! [`PollLoop`] runs cycles strictly one after another with a fixed delay
//! measured from the end of each cycle, so a slow reader pushes the next
//! cycle out instead of overlapping it.

use crate::config::MonitorConfig;
use crate::events::EventSink;
use crate::poller::TagPoller;
use crate::supervisor::ConnectionSupervisor;
use nfcwatch_core::TagSnapshot;
use nfcwatch_hardware::ReaderDevice;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Sequential poll loop over a single reader.
pub struct PollLoop<D> {
    supervisor: ConnectionSupervisor<D>,
    poller: TagPoller,
    interval: Duration,
    cancel: CancellationToken,
}

impl<D: ReaderDevice> PollLoop<D> {
    pub fn new(
        device: D,
        sink: Arc<dyn EventSink>,
        config: &MonitorConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            supervisor: ConnectionSupervisor::new(device, Arc::clone(&sink), cancel.clone()),
            poller: TagPoller::new(sink, config.ndef_buffer_size),
            interval: config.poll_interval,
            cancel,
        }
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor<D> {
        &self.supervisor
    }

    /// Run one cycle.
    ///
    /// Returns `None` when the reader was not usable, in which case no tag
    /// query was issued.
    #[instrument(skip(self))]
    pub async fn run_cycle(&mut self) -> Option<TagSnapshot> {
        if !self.supervisor.ensure_connected().await {
            return None;
        }

        let device_type = self.supervisor.device_type();
        let snapshot = self
            .poller
            .poll_once(self.supervisor.device_mut(), device_type)
            .await;
        Some(snapshot)
    }

    /// Run cycles until cancelled, then close the reader and return it.
    pub async fn run(mut self) -> D {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "reader poll loop started"
        );

        while !self.cancel.is_cancelled() {
            self.run_cycle().await;

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        debug!(state = %self.supervisor.state(), "reader poll loop stopping");
        self.supervisor.disconnect().await;
        info!("reader poll loop stopped");

        self.supervisor.into_device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;
    use nfcwatch_core::{ConnectionState, StatusNotification};
    use nfcwatch_hardware::mock::{MockReader, MockReaderHandle, MockTag, ReaderCommand};
    use tokio::time::Instant;

    fn new_loop(
        cancel: &CancellationToken,
    ) -> (PollLoop<MockReader>, MockReaderHandle, Arc<MemorySink>) {
        let (reader, handle) = MockReader::new();
        let sink = Arc::new(MemorySink::new());
        let poll_loop = PollLoop::new(
            reader,
            sink.clone(),
            &MonitorConfig::default(),
            cancel.clone(),
        );
        (poll_loop, handle, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_skips_tag_query_when_disconnected() {
        let cancel = CancellationToken::new();
        let (mut poll_loop, handle, sink) = new_loop(&cancel);
        handle.detach();

        assert_eq!(poll_loop.run_cycle().await, None);
        assert_eq!(handle.call_count(ReaderCommand::CardId), 0);
        assert_eq!(
            sink.notifications(),
            vec![StatusNotification::connection(false)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_connection_before_tag() {
        let cancel = CancellationToken::new();
        let (mut poll_loop, handle, sink) = new_loop(&cancel);
        handle.present_tag(MockTag::new([1, 0, 0, 0, 0, 0, 0, 0]).with_text("x"));

        let snapshot = poll_loop.run_cycle().await;
        assert_eq!(snapshot.and_then(|s| s.text), Some("x".to_string()));

        let notifications = sink.notifications();
        assert_eq!(notifications.len(), 2);
        assert!(notifications[0].is_connection_changed());
        assert!(notifications[1].is_tag_changed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exits_when_cancelled_before_start() {
        let cancel = CancellationToken::new();
        let (poll_loop, handle, sink) = new_loop(&cancel);
        cancel.cancel();

        let _reader = poll_loop.run().await;

        assert!(handle.history().is_empty());
        assert!(sink.notifications().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_fixed_delay_between_cycles() {
        let cancel = CancellationToken::new();
        let (poll_loop, handle, _sink) = new_loop(&cancel);

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(3_500)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let _reader = poll_loop.run().await;

        // Cycles at t = 0, 1, 2 and 3 seconds; cancelled during the fourth delay.
        assert_eq!(handle.call_count(ReaderCommand::CardId), 4);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_closes_reader_on_exit() {
        let cancel = CancellationToken::new();
        let (poll_loop, handle, sink) = new_loop(&cancel);

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let _reader = poll_loop.run().await;

        assert!(!handle.is_open());
        assert_eq!(handle.call_count(ReaderCommand::Close), 1);
        assert_eq!(sink.notifications().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_recovery_ends_loop() {
        let cancel = CancellationToken::new();
        let (poll_loop, handle, _sink) = new_loop(&cancel);
        handle.detach();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let _reader = poll_loop.run().await;

        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(handle.call_count(ReaderCommand::Open), 1);
        assert_eq!(handle.call_count(ReaderCommand::Close), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_supervisor_state_visible() {
        let cancel = CancellationToken::new();
        let (mut poll_loop, _handle, _sink) = new_loop(&cancel);

        assert_eq!(poll_loop.supervisor().state(), ConnectionState::Disconnected);
        poll_loop.run_cycle().await;
        assert_eq!(poll_loop.supervisor().state(), ConnectionState::Connected);
    }
}
