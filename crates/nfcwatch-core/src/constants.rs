//! Core constants for the nfcwatch reader monitor.
//!
//! Timings, buffer sizes and the log vocabulary shared by the monitor and any
//! downstream log consumer. Marker names are part of the external contract:
//! log pipelines filter on them, so they must stay stable.
//!
//! # Recovery timing
//!
//! After a failed connect or health check the monitor waits before trying
//! again. The wait depends on the reader model, because each model takes a
//! different amount of time to power-cycle and re-enumerate on the USB bus:
//!
//! | Model | Device type code | Recovery |
//! |-------|------------------|----------|
//! | uFR Nano | `0xD1380022` | [`UFR_NANO_RECOVERY_MS`] |
//! | uFR Nano Online | `0xD1390222` | [`UFR_NANO_ONLINE_RECOVERY_MS`] |
//! | anything else | | [`GENERIC_RECOVERY_MS`] |

// ============================================================================
// Reader Models
// ============================================================================

/// Device type code reported by the uFR Nano.
pub const UFR_NANO_DEVICE_TYPE: u32 = 0xD138_0022;

/// Device type code reported by the uFR Nano Online.
pub const UFR_NANO_ONLINE_DEVICE_TYPE: u32 = 0xD139_0222;

// ============================================================================
// Recovery Delays
// ============================================================================

/// Recovery delay for the uFR Nano in milliseconds.
pub const UFR_NANO_RECOVERY_MS: u64 = 5_000;

/// Recovery delay for the uFR Nano Online in milliseconds.
pub const UFR_NANO_ONLINE_RECOVERY_MS: u64 = 20_000;

/// Recovery delay for unknown or never-identified readers in milliseconds.
pub const GENERIC_RECOVERY_MS: u64 = 10_000;

// ============================================================================
// Polling
// ============================================================================

/// Default delay between the end of one poll cycle and the start of the next.
///
/// # Examples
///
/// ```
/// use nfcwatch_core::constants::DEFAULT_POLL_INTERVAL_MS;
/// use std::time::Duration;
///
/// let interval = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
/// assert_eq!(interval.as_secs(), 1);
/// ```
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Size of the buffer handed to the reader for NDEF text payloads.
pub const NDEF_TEXT_BUFFER_SIZE: usize = 1_000;

/// Largest accepted NDEF text buffer.
pub const MAX_NDEF_TEXT_BUFFER_SIZE: usize = 64 * 1024;

/// Number of notifications buffered per listener before it starts lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Largest accepted per-listener notification buffer.
pub const MAX_EVENT_CAPACITY: usize = 64 * 1024;

/// Length of a raw tag UID as returned by the reader.
pub const UID_LENGTH: usize = 8;

// ============================================================================
// Log Markers
// ============================================================================

/// Marker for connection lifecycle records (connect, connect failure,
/// failed health check).
pub const CRITICAL_INFORMATION_MARKER: &str = "CRITICAL_INFORMATION_MARKER";

/// Marker for tag queries that returned a status the monitor does not handle.
pub const UNEXPECTED_READER_STATUS_MARKER: &str = "UNEXPECTED_READER_STATUS_MARKER";

/// Marker for interrupted waits and other conditions outside the device
/// status space.
pub const UNEXPECTED_EXCEPTION_MARKER: &str = "UNEXPECTED_EXCEPTION_MARKER";

// ============================================================================
// Log Messages
// ============================================================================

pub const MESSAGE_READER_CONNECT_SUCCESS: &str = "NFC reader connection established.";
pub const MESSAGE_READER_CONNECT_FAILURE: &str = "NFC reader connection failed.";
pub const MESSAGE_READER_TYPE_FAILURE: &str =
    "NFC reader did not answer the reader type query; connection dropped.";
pub const MESSAGE_NDEF_READ_FAILURE: &str =
    "NFC tag present but its NDEF text record could not be read.";
pub const MESSAGE_UNEXPECTED_READER_STATUS: &str = "NFC reader returned an unexpected status.";
pub const MESSAGE_RECOVERY_INTERRUPTED: &str = "Reader recovery wait was interrupted by shutdown.";

// ============================================================================
// Log Field Keys
// ============================================================================

/// Field holding the hex-rendered device type code.
pub const FIELD_DEVICE_ID: &str = "device_id";

/// Field holding the hex-rendered status code.
pub const FIELD_STATUS: &str = "status";

/// Field holding the symbolic status name, when the code is documented.
pub const FIELD_STATUS_NAME: &str = "status_name";

/// Field holding the abandoned recovery delay.
pub const FIELD_DELAY_MS: &str = "delay_ms";
