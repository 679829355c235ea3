//! Reader command interface.
//!
//! This module defines the contract between the monitor and a USB NFC reader.
//! Each method maps to one command of the reader's native library; the native
//! call's numeric status code comes back as the error value when it is not
//! [`ReaderStatus::OK`].
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use nfcwatch_core::constants::UID_LENGTH;
use nfcwatch_core::{CardUid, DeviceTypeCode, ReaderStatus};

/// Outcome of a single reader command.
///
/// `Err` carries any status other than [`ReaderStatus::OK`], including
/// [`ReaderStatus::NO_CARD`].
pub type CommandResult<T> = std::result::Result<T, ReaderStatus>;

/// Answer to the card query.
///
/// The reader always fills an 8-byte UID buffer, least significant byte
/// first. Shorter UIDs are zero-padded at the top; `uid_size` reports how
/// many bytes are significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardIdentity {
    /// Reader-specific card family code.
    pub card_type: u8,

    /// Raw UID buffer as returned by the reader.
    pub uid: [u8; UID_LENGTH],

    /// Number of significant UID bytes.
    pub uid_size: u8,
}

impl CardIdentity {
    /// Create a card identity from a raw UID buffer.
    pub fn new(card_type: u8, uid: [u8; UID_LENGTH], uid_size: u8) -> Self {
        Self {
            card_type,
            uid,
            uid_size,
        }
    }

    /// Decode the raw UID buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use nfcwatch_hardware::CardIdentity;
    ///
    /// let identity = CardIdentity::new(0xFF, [0, 1, 2, 3, 4, 5, 6, 7], 8);
    /// assert_eq!(identity.uid().value(), 0x0706050403020100);
    /// ```
    pub fn uid(&self) -> CardUid {
        CardUid::from_le_bytes(self.uid)
    }
}

/// USB NFC reader command interface.
///
/// Implementations are not required to tolerate concurrent use; every method
/// takes `&mut self`, so callers can only issue one command at a time.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters, or the
/// [`AnyReaderDevice`](crate::devices::AnyReaderDevice) enum when a single
/// concrete type is required.
///
/// # Examples
///
/// ```no_run
/// use nfcwatch_hardware::traits::ReaderDevice;
/// use nfcwatch_core::ReaderStatus;
///
/// async fn tag_in_field<R: ReaderDevice>(reader: &mut R) -> Result<bool, ReaderStatus> {
///     match reader.card_id().await {
///         Ok(_) => Ok(true),
///         Err(ReaderStatus::NO_CARD) => Ok(false),
///         Err(status) => Err(status),
///     }
/// }
/// ```
pub trait ReaderDevice: Send + Sync {
    /// Open the connection to the reader.
    async fn open(&mut self) -> CommandResult<()>;

    /// Close the connection to the reader.
    async fn close(&mut self) -> CommandResult<()>;

    /// Reset the reader hardware.
    async fn reset(&mut self) -> CommandResult<()>;

    /// Query the reader model. Doubles as a liveness check.
    async fn reader_type(&mut self) -> CommandResult<DeviceTypeCode>;

    /// Query the tag currently in the read field.
    ///
    /// Returns `Err(ReaderStatus::NO_CARD)` when the field is empty.
    async fn card_id(&mut self) -> CommandResult<CardIdentity>;

    /// Read the NDEF text record of the tag in the field into `buffer`.
    ///
    /// On success the buffer holds the text payload followed by NUL padding.
    async fn read_ndef_text(&mut self, buffer: &mut [u8]) -> CommandResult<()>;
}
