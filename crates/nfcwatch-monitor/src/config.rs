//! Monitor configuration.

use nfcwatch_core::constants::{
    DEFAULT_EVENT_CAPACITY, DEFAULT_POLL_INTERVAL_MS, MAX_EVENT_CAPACITY,
    MAX_NDEF_TEXT_BUFFER_SIZE, NDEF_TEXT_BUFFER_SIZE,
};
use nfcwatch_core::{Error, Result};
use std::time::Duration;

/// Configuration for a reader monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Delay between the end of one poll cycle and the start of the next.
    pub poll_interval: Duration,

    /// Size of the buffer handed to the reader for NDEF text reads.
    pub ndef_buffer_size: usize,

    /// Notifications buffered per listener before it starts lagging.
    pub event_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            ndef_buffer_size: NDEF_TEXT_BUFFER_SIZE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl MonitorConfig {
    /// Check that every setting is usable.
    ///
    /// Buffer sizes must be non-zero and at most
    /// [`MAX_NDEF_TEXT_BUFFER_SIZE`] and [`MAX_EVENT_CAPACITY`].
    ///
    /// # Examples
    ///
    /// ```
    /// use nfcwatch_monitor::MonitorConfig;
    /// use std::time::Duration;
    ///
    /// assert!(MonitorConfig::default().validate().is_ok());
    ///
    /// let config = MonitorConfig {
    ///     poll_interval: Duration::ZERO,
    ///     ..MonitorConfig::default()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be non-zero".to_string()));
        }
        if self.ndef_buffer_size == 0 {
            return Err(Error::Config("NDEF buffer size must be non-zero".to_string()));
        }
        if self.ndef_buffer_size > MAX_NDEF_TEXT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "NDEF buffer size must be at most {MAX_NDEF_TEXT_BUFFER_SIZE} bytes"
            )));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event capacity must be non-zero".to_string()));
        }
        if self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(Error::Config(format!(
                "event capacity must be at most {MAX_EVENT_CAPACITY}"
            )));
        }
        Ok(())
    }
}
