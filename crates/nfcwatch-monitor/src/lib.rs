//! Connection and poll state machine for a USB NFC reader.
//!
//! A single sequential loop keeps the reader connected and queries its read
//! field at a fixed cadence:
//!
//! 1. The [`ConnectionSupervisor`] confirms the connection with a reader type
//!    query, or opens it, backing off for a model-specific recovery delay on
//!    failure.
//! 2. When connected, the [`TagPoller`] queries the field, decodes the tag UID
//!    and reads its NDEF text record.
//! 3. Both publish [`StatusNotification`]s and diagnostic records to an
//!    [`EventSink`].
//!
//! [`StatusNotification`]: nfcwatch_core::StatusNotification
//!
//! # Example
//!
//! ```
//! use nfcwatch_hardware::mock::{MockReader, MockTag};
//! use nfcwatch_monitor::{MemorySink, MonitorConfig, PollLoop};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let (reader, handle) = MockReader::new();
//!     handle.present_tag(MockTag::new([0, 1, 2, 3, 4, 5, 6, 7]).with_text("TESTING"));
//!
//!     let sink = Arc::new(MemorySink::new());
//!     let mut poll_loop = PollLoop::new(
//!         reader,
//!         sink.clone(),
//!         &MonitorConfig::default(),
//!         CancellationToken::new(),
//!     );
//!
//!     let snapshot = poll_loop.run_cycle().await.unwrap();
//!     assert_eq!(snapshot.text.as_deref(), Some("TESTING"));
//!     assert_eq!(sink.notifications().len(), 2);
//! }
//! ```

pub mod config;
pub mod events;
pub mod logger;
pub mod monitor;
pub mod poller;
pub mod recovery;
pub mod scheduler;
pub mod supervisor;

pub use config::MonitorConfig;
pub use events::{DiagnosticRecord, EventBus, EventSink, MemorySink, Severity};
pub use logger::spawn_event_logger;
pub use monitor::{ReaderMonitor, spawn_monitor, spawn_monitor_with_bus};
pub use poller::TagPoller;
pub use recovery::{WaitOutcome, recovery_delay};
pub use scheduler::PollLoop;
pub use supervisor::ConnectionSupervisor;
