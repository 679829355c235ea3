//! Enum wrapper for reader device dispatch.
//!
//! Native `async fn` in traits is not object safe, so `Box<dyn ReaderDevice>`
//! is not available. [`AnyReaderDevice`] gives the monitor a single concrete
//! type to spawn onto a Tokio task while keeping static dispatch.
//!
//! # Examples
//!
//! ```
//! use nfcwatch_hardware::devices::AnyReaderDevice;
//! use nfcwatch_hardware::mock::MockReader;
//!
//! let (reader, _handle) = MockReader::new();
//! let any_reader = AnyReaderDevice::Mock(reader);
//! assert_eq!(any_reader.name(), "Mock uFR Reader");
//! ```

use crate::mock::MockReader;
use crate::traits::{CardIdentity, CommandResult, ReaderDevice};
use nfcwatch_core::DeviceTypeCode;

/// Enum wrapper for reader device dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyReaderDevice {
    /// Simulated reader for development and testing.
    Mock(MockReader),
}

impl AnyReaderDevice {
    /// Human-readable name of the wrapped device.
    pub fn name(&self) -> &str {
        match self {
            Self::Mock(device) => device.name(),
        }
    }
}

impl From<MockReader> for AnyReaderDevice {
    fn from(device: MockReader) -> Self {
        Self::Mock(device)
    }
}

impl ReaderDevice for AnyReaderDevice {
    async fn open(&mut self) -> CommandResult<()> {
        match self {
            Self::Mock(device) => device.open().await,
        }
    }

    async fn close(&mut self) -> CommandResult<()> {
        match self {
            Self::Mock(device) => device.close().await,
        }
    }

    async fn reset(&mut self) -> CommandResult<()> {
        match self {
            Self::Mock(device) => device.reset().await,
        }
    }

    async fn reader_type(&mut self) -> CommandResult<DeviceTypeCode> {
        match self {
            Self::Mock(device) => device.reader_type().await,
        }
    }

    async fn card_id(&mut self) -> CommandResult<CardIdentity> {
        match self {
            Self::Mock(device) => device.card_id().await,
        }
    }

    async fn read_ndef_text(&mut self, buffer: &mut [u8]) -> CommandResult<()> {
        match self {
            Self::Mock(device) => device.read_ndef_text(buffer).await,
        }
    }
}
