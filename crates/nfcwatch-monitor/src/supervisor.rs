//! Connection supervisor.
//!
//! Owns the reader and its connection state. Once per poll cycle
//! [`ConnectionSupervisor::ensure_connected`] either confirms a live
//! connection with a reader type query or tries to (re)open one, backing off
//! for a model-specific recovery delay when that fails.
//!
//! ```text
//!                 open ok
//!   ┌──────────────┐ ──────────► ┌───────────┐
//!   │ Disconnected │             │ Connected │ ◄─┐ reader type ok
//!   └──────────────┘ ◄────────── └───────────┘ ──┘
//!     │  ▲        reader type failed
//!     └──┘        (reset, close, wait)
//!   open failed (wait)
//! ```

use crate::events::{DiagnosticRecord, EventSink, Severity, record_or_warn};
use crate::recovery::{WaitOutcome, recovery_delay, wait_for_recovery};
use nfcwatch_core::constants::{
    CRITICAL_INFORMATION_MARKER, FIELD_DELAY_MS, MESSAGE_READER_CONNECT_FAILURE,
    MESSAGE_READER_CONNECT_SUCCESS, MESSAGE_READER_TYPE_FAILURE, MESSAGE_RECOVERY_INTERRUPTED,
    UNEXPECTED_EXCEPTION_MARKER,
};
use nfcwatch_core::{ConnectionState, DeviceTypeCode, ReaderStatus, StatusNotification};
use nfcwatch_hardware::ReaderDevice;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

/// Drives the connect / health check / recover state machine for one reader.
pub struct ConnectionSupervisor<D> {
    device: D,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
    state: ConnectionState,
    device_type: Option<DeviceTypeCode>,
}

impl<D: ReaderDevice> ConnectionSupervisor<D> {
    /// Create a supervisor for a reader that is not yet open.
    pub fn new(device: D, sink: Arc<dyn EventSink>, cancel: CancellationToken) -> Self {
        Self {
            device,
            sink,
            cancel,
            state: ConnectionState::Disconnected,
            device_type: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Last device type the reader reported, if any.
    pub fn device_type(&self) -> Option<DeviceTypeCode> {
        self.device_type
    }

    /// Exclusive access to the reader, for the tag query.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Decide whether the reader is usable this cycle.
    ///
    /// Publishes exactly one [`StatusNotification::ConnectionChanged`] per
    /// call. On failure, waits out the recovery delay (or until cancelled)
    /// before returning `false`.
    #[instrument(skip(self), fields(state = %self.state))]
    pub async fn ensure_connected(&mut self) -> bool {
        match self.state {
            ConnectionState::Connected => self.check_health().await,
            ConnectionState::Disconnected => self.connect().await,
        }
    }

    async fn check_health(&mut self) -> bool {
        match self.device.reader_type().await {
            Ok(device_type) => {
                trace!(device_type = %device_type, "reader answered health check");
                self.device_type = Some(device_type);
                self.sink.publish(StatusNotification::connection(true));
                true
            }
            Err(status) => {
                self.report(Severity::Error, MESSAGE_READER_TYPE_FAILURE, status);
                self.state = ConnectionState::Disconnected;

                if let Err(status) = self.device.reset().await {
                    debug!(status = %status.hex(), "reader reset failed");
                }
                if let Err(status) = self.device.close().await {
                    debug!(status = %status.hex(), "reader close failed");
                }

                self.sink.publish(StatusNotification::connection(false));
                self.recover().await;
                false
            }
        }
    }

    async fn connect(&mut self) -> bool {
        match self.device.open().await {
            Ok(()) => {
                self.report(Severity::Info, MESSAGE_READER_CONNECT_SUCCESS, ReaderStatus::OK);
                self.state = ConnectionState::Connected;
                self.sink.publish(StatusNotification::connection(true));
                true
            }
            Err(status) => {
                self.report(Severity::Error, MESSAGE_READER_CONNECT_FAILURE, status);
                self.sink.publish(StatusNotification::connection(false));
                self.recover().await;
                false
            }
        }
    }

    async fn recover(&self) {
        let delay = recovery_delay(self.device_type);
        debug!(delay_ms = delay.as_millis() as u64, "waiting for reader recovery");

        if wait_for_recovery(delay, &self.cancel).await == WaitOutcome::Cancelled {
            let record = DiagnosticRecord::new(
                Severity::Error,
                UNEXPECTED_EXCEPTION_MARKER,
                MESSAGE_RECOVERY_INTERRUPTED,
            )
            .with_field(FIELD_DELAY_MS, delay.as_millis().to_string());
            record_or_warn(self.sink.as_ref(), record);
        }
    }

    fn report(&self, severity: Severity, message: &str, status: ReaderStatus) {
        let record = DiagnosticRecord::new(severity, CRITICAL_INFORMATION_MARKER, message)
            .with_device_type(self.device_type)
            .with_status(status);
        record_or_warn(self.sink.as_ref(), record);
    }

    /// Close the reader if it is open. Publishes nothing.
    pub async fn disconnect(&mut self) {
        if self.state.is_connected() {
            if let Err(status) = self.device.close().await {
                debug!(status = %status.hex(), "reader close failed during shutdown");
            }
            self.state = ConnectionState::Disconnected;
        }
    }

    /// Give the reader back.
    pub fn into_device(self) -> D {
        self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;
    use nfcwatch_core::constants::FIELD_DEVICE_ID;
    use nfcwatch_hardware::mock::reader::GENERIC_DEVICE_TYPE;
    use nfcwatch_hardware::mock::{MockReader, MockReaderHandle, ReaderCommand};
    use std::time::Duration;
    use tokio::time::Instant;

    fn supervisor() -> (
        ConnectionSupervisor<MockReader>,
        MockReaderHandle,
        Arc<MemorySink>,
    ) {
        let (reader, handle) = MockReader::new();
        let sink = Arc::new(MemorySink::new());
        let supervisor = ConnectionSupervisor::new(reader, sink.clone(), CancellationToken::new());
        (supervisor, handle, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_success() {
        let (mut supervisor, handle, sink) = supervisor();

        assert!(supervisor.ensure_connected().await);
        assert_eq!(supervisor.state(), ConnectionState::Connected);
        assert!(handle.is_open());

        assert_eq!(
            sink.notifications(),
            vec![StatusNotification::connection(true)]
        );
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Info);
        assert_eq!(records[0].marker, CRITICAL_INFORMATION_MARKER);
        assert_eq!(records[0].field("status"), Some("0x00000000"));
        assert_eq!(records[0].field(FIELD_DEVICE_ID), Some("0x00000000"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_waits_generic_delay() {
        let (mut supervisor, handle, sink) = supervisor();
        handle.detach();
        let start = Instant::now();

        assert!(!supervisor.ensure_connected().await);

        assert!(start.elapsed() >= Duration::from_secs(10));
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);
        assert_eq!(
            sink.notifications(),
            vec![StatusNotification::connection(false)]
        );

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Error);
        assert_eq!(records[0].message, MESSAGE_READER_CONNECT_FAILURE);
        assert_eq!(records[0].field("status"), Some("0x00000052"));
        assert_eq!(records[0].field("status_name"), Some("CAN_NOT_OPEN_READER"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_healthy_reader_opened_once() {
        let (mut supervisor, handle, sink) = supervisor();

        for _ in 0..5 {
            assert!(supervisor.ensure_connected().await);
        }

        assert_eq!(handle.call_count(ReaderCommand::Open), 1);
        assert_eq!(handle.call_count(ReaderCommand::ReaderType), 4);
        assert_eq!(sink.notifications().len(), 5);
        assert_eq!(supervisor.device_type(), Some(GENERIC_DEVICE_TYPE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_check_failure_uses_observed_device_type() {
        let (mut supervisor, handle, sink) = supervisor();
        handle.set_device_type(DeviceTypeCode::UFR_NANO_ONLINE);

        assert!(supervisor.ensure_connected().await);
        assert!(supervisor.ensure_connected().await);
        sink.clear();

        handle.fail_next(ReaderCommand::ReaderType, ReaderStatus::new(0xFF));
        let start = Instant::now();

        assert!(!supervisor.ensure_connected().await);

        assert!(start.elapsed() >= Duration::from_secs(20));
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);
        assert!(!handle.is_open());

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, MESSAGE_READER_TYPE_FAILURE);
        assert_eq!(records[0].field(FIELD_DEVICE_ID), Some("0xD1390222"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_check_failure_tolerates_reset_and_close_errors() {
        let (mut supervisor, handle, sink) = supervisor();
        assert!(supervisor.ensure_connected().await);

        handle.detach();
        assert!(!supervisor.ensure_connected().await);

        // Reset and close failures are not reported as records.
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].message, MESSAGE_READER_TYPE_FAILURE);
        assert_eq!(records[1].field(FIELD_DEVICE_ID), Some("0x00000000"));
        assert_eq!(handle.call_count(ReaderCommand::Reset), 1);
        assert_eq!(handle.call_count(ReaderCommand::Close), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_interrupted_by_cancellation() {
        let (reader, handle) = MockReader::new();
        let sink = Arc::new(MemorySink::new());
        let cancel = CancellationToken::new();
        let mut supervisor = ConnectionSupervisor::new(reader, sink.clone(), cancel.clone());
        handle.detach();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        assert!(!supervisor.ensure_connected().await);
        assert!(start.elapsed() < Duration::from_secs(10));

        let interrupted = sink.records_with_marker(UNEXPECTED_EXCEPTION_MARKER);
        assert_eq!(interrupted.len(), 1);
        assert_eq!(interrupted[0].severity, Severity::Error);
        assert_eq!(interrupted[0].field(FIELD_DELAY_MS), Some("10000"));
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_closes_open_reader() {
        let (mut supervisor, handle, sink) = supervisor();
        assert!(supervisor.ensure_connected().await);
        sink.clear();

        supervisor.disconnect().await;
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);
        assert!(!handle.is_open());

        supervisor.disconnect().await;
        assert_eq!(handle.call_count(ReaderCommand::Close), 1);
        assert!(sink.notifications().is_empty());
    }
}
