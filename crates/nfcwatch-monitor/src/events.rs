//! Event sink boundary.
//!
//! The monitor reports two kinds of output: [`StatusNotification`]s, one per
//! check, and [`DiagnosticRecord`]s for conditions an operator should see.
//! Both go through the [`EventSink`] trait.
//!
//! Two sinks are provided:
//!
//! - [`EventBus`] fans notifications out to any number of listeners over a
//!   broadcast channel and forwards diagnostic records to `tracing`.
//! - [`MemorySink`] keeps everything in memory, in arrival order.
//!
//! ```text
//! ┌────────────┐  publish   ┌──────────┐  broadcast  ┌────────────┐
//! │ Supervisor │──────────► │          │───────────► │ Listener 1 │
//! └────────────┘            │ EventBus │             └────────────┘
//! ┌────────────┐  record    │          │───────────► ┌────────────┐
//! │ TagPoller  │──────────► │          │  tracing    │ Listener N │
//! └────────────┘            └──────────┘             └────────────┘
//! ```

use nfcwatch_core::constants::{FIELD_DEVICE_ID, FIELD_STATUS, FIELD_STATUS_NAME};
use nfcwatch_core::{DeviceTypeCode, Error, ReaderStatus, Result, StatusNotification};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

/// Severity of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// Structured log record for a diagnostic or critical event.
///
/// # Examples
///
/// ```
/// use nfcwatch_core::ReaderStatus;
/// use nfcwatch_core::constants::UNEXPECTED_READER_STATUS_MARKER;
/// use nfcwatch_monitor::events::{DiagnosticRecord, Severity};
///
/// let record = DiagnosticRecord::new(
///     Severity::Error,
///     UNEXPECTED_READER_STATUS_MARKER,
///     "unexpected status",
/// )
/// .with_status(ReaderStatus::new(0x01));
///
/// assert_eq!(record.field("status"), Some("0x00000001"));
/// assert_eq!(record.field("status_name"), Some("COMMUNICATION_ERROR"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub severity: Severity,
    pub marker: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl DiagnosticRecord {
    pub fn new(severity: Severity, marker: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            marker: marker.into(),
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Attach a field, replacing any previous value under the same key.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attach the hex status code, and its symbolic name when documented.
    #[must_use]
    pub fn with_status(self, status: ReaderStatus) -> Self {
        let record = self.with_field(FIELD_STATUS, status.hex());
        match status.description() {
            Some(name) => record.with_field(FIELD_STATUS_NAME, name),
            None => record,
        }
    }

    /// Attach the hex device type code.
    ///
    /// A reader that never answered a reader type query is reported as
    /// [`DeviceTypeCode::UNKNOWN`] (`0x00000000`).
    #[must_use]
    pub fn with_device_type(self, device_type: Option<DeviceTypeCode>) -> Self {
        let code = device_type.unwrap_or(DeviceTypeCode::UNKNOWN);
        self.with_field(FIELD_DEVICE_ID, code.hex())
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Reject records without a marker or message.
    pub fn validate(&self) -> Result<()> {
        if self.marker.trim().is_empty() {
            return Err(Error::IncompleteRecord("marker"));
        }
        if self.message.trim().is_empty() {
            return Err(Error::IncompleteRecord("message"));
        }
        Ok(())
    }
}

/// Receiver of monitor output.
///
/// Implementations must not block: both methods are called from the poll
/// loop between device commands.
pub trait EventSink: Send + Sync {
    /// Deliver a status notification. Fire and forget.
    fn publish(&self, notification: StatusNotification);

    /// Deliver a diagnostic record.
    ///
    /// Returns [`Error::IncompleteRecord`] if the record has an empty marker
    /// or message; nothing is logged in that case.
    fn record(&self, record: DiagnosticRecord) -> Result<()>;
}

/// Send a record and downgrade a rejection to a warning.
pub(crate) fn record_or_warn(sink: &dyn EventSink, record: DiagnosticRecord) {
    if let Err(error) = sink.record(record) {
        warn!(%error, "diagnostic record rejected by event sink");
    }
}

/// Broadcast fan-out of notifications plus `tracing` output for records.
///
/// Listeners that fall more than the channel capacity behind miss the oldest
/// notifications and observe a lag error on their next receive.
///
/// # Examples
///
/// ```
/// use nfcwatch_core::StatusNotification;
/// use nfcwatch_monitor::events::{EventBus, EventSink};
///
/// let bus = EventBus::new(16);
/// let mut listener = bus.subscribe();
///
/// bus.publish(StatusNotification::connection(true));
/// assert_eq!(listener.try_recv().unwrap(), StatusNotification::connection(true));
/// ```
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<StatusNotification>,
}

impl EventBus {
    /// Create a bus buffering `capacity` notifications per listener.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. [`MonitorConfig::validate`] rejects that
    /// value up front.
    ///
    /// [`MonitorConfig::validate`]: crate::MonitorConfig::validate
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new listener. It only sees notifications published after
    /// this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusNotification> {
        self.sender.subscribe()
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSink for EventBus {
    fn publish(&self, notification: StatusNotification) {
        if self.sender.send(notification).is_err() {
            trace!("notification dropped, no listeners");
        }
    }

    fn record(&self, record: DiagnosticRecord) -> Result<()> {
        record.validate()?;

        let DiagnosticRecord {
            severity,
            marker,
            message,
            fields,
        } = record;

        match severity {
            Severity::Debug => debug!(%marker, ?fields, "{message}"),
            Severity::Info => info!(%marker, ?fields, "{message}"),
            Severity::Warn => warn!(%marker, ?fields, "{message}"),
            Severity::Error => error!(%marker, ?fields, "{message}"),
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Recorded {
    notifications: Vec<StatusNotification>,
    records: Vec<DiagnosticRecord>,
}

/// Sink that keeps every notification and accepted record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    inner: Mutex<Recorded>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Notifications in publication order.
    pub fn notifications(&self) -> Vec<StatusNotification> {
        self.lock().notifications.clone()
    }

    /// Accepted records in arrival order.
    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.lock().records.clone()
    }

    /// Accepted records carrying `marker`.
    pub fn records_with_marker(&self, marker: &str) -> Vec<DiagnosticRecord> {
        self.lock()
            .records
            .iter()
            .filter(|record| record.marker == marker)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.notifications.clear();
        inner.records.clear();
    }
}

impl EventSink for MemorySink {
    fn publish(&self, notification: StatusNotification) {
        self.lock().notifications.push(notification);
    }

    fn record(&self, record: DiagnosticRecord) -> Result<()> {
        record.validate()?;
        self.lock().records.push(record);
        Ok(())
    }
}
