use crate::constants::{UFR_NANO_DEVICE_TYPE, UFR_NANO_ONLINE_DEVICE_TYPE, UID_LENGTH};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw status code returned by every reader command.
///
/// The code space is open-ended. Only [`OK`](Self::OK) and
/// [`NO_CARD`](Self::NO_CARD) are acted upon; all other codes are reported
/// as-is. The remaining associated constants exist so simulated devices can
/// produce realistic failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(transparent)]
#[error("reader status {0:#010X}")]
pub struct ReaderStatus(u32);

impl ReaderStatus {
    /// Command completed.
    pub const OK: Self = Self(0x00);
    /// Tag query found nothing in the field.
    pub const NO_CARD: Self = Self(0x08);

    pub const READING_ERROR: Self = Self(0x03);
    pub const BUFFER_OVERFLOW: Self = Self(0x05);
    pub const COMMUNICATION_BREAK: Self = Self(0x50);
    pub const CAN_NOT_OPEN_READER: Self = Self(0x52);
    pub const READER_PORT_NOT_OPENED: Self = Self(0x55);

    /// Wrap a raw status code.
    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Get the raw status code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Whether this is the success status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    /// Render as `0x` followed by 8 uppercase hex digits.
    ///
    /// # Examples
    ///
    /// ```
    /// use nfcwatch_core::ReaderStatus;
    ///
    /// assert_eq!(ReaderStatus::OK.hex(), "0x00000000");
    /// assert_eq!(ReaderStatus::new(0xFF).hex(), "0x000000FF");
    /// ```
    #[must_use]
    pub fn hex(self) -> String {
        format!("{:#010X}", self.0)
    }

    /// Symbolic name of the code as documented by the reader library.
    ///
    /// Returns `None` for undocumented codes. Used for log enrichment only.
    #[must_use]
    pub fn description(self) -> Option<&'static str> {
        let name = match self.0 {
            0x00 => "DL_OK",
            0x01 => "COMMUNICATION_ERROR",
            0x02 => "CHECKSUM_ERROR",
            0x03 => "READING_ERROR",
            0x04 => "WRITING_ERROR",
            0x05 => "BUFFER_OVERFLOW",
            0x06 => "MAX_ADDRESS_EXCEEDED",
            0x07 => "MAX_KEY_INDEX_EXCEEDED",
            0x08 => "NO_CARD",
            0x09 => "COMMAND_NOT_SUPPORTED",
            0x0A => "FORBIDDEN_DIRECT_WRITE_IN_SECTOR_TRAILER",
            0x0B => "ADDRESSED_BLOCK_IS_NOT_SECTOR_TRAILER",
            0x0C => "WRONG_ADDRESS_MODE",
            0x0D => "WRONG_ACCESS_BITS_VALUES",
            0x0E => "AUTH_ERROR",
            0x0F => "PARAMETERS_ERROR",
            0x10 => "MAX_SIZE_EXCEEDED",
            0x11 => "UNSUPPORTED_CARD_TYPE",
            0x50 => "COMMUNICATION_BREAK",
            0x51 => "NO_MEMORY_ERROR",
            0x52 => "CAN_NOT_OPEN_READER",
            0x53 => "READER_NOT_SUPPORTED",
            0x54 => "READER_OPENING_ERROR",
            0x55 => "READER_PORT_NOT_OPENED",
            0x56 => "CANT_CLOSE_READER_PORT",
            0x70 => "WRITE_VERIFICATION_ERROR",
            0x71 => "BUFFER_SIZE_EXCEEDED",
            0x72 => "VALUE_BLOCK_INVALID",
            0x73 => "VALUE_BLOCK_ADDR_INVALID",
            0x74 => "VALUE_BLOCK_MANIPULATION_ERROR",
            0x75 => "WRONG_UI_MODE",
            0x76 => "KEYS_LOCKED",
            0x77 => "KEYS_UNLOCKED",
            0x78 => "WRONG_PASSWORD",
            0x79 => "CAN_NOT_LOCK_DEVICE",
            0x7A => "CAN_NOT_UNLOCK_DEVICE",
            0x7B => "DEVICE_EEPROM_BUSY",
            0x7C => "RTC_SET_ERROR",
            0x7D => "ANTICOLLISION_DISABLED",
            0x7E => "NO_CARDS_ENUMERATED",
            0x7F => "CARD_ALREADY_SELECTED",
            0xA0..=0xA8 => "FT_STATUS_ERROR",
            _ => return None,
        };
        Some(name)
    }
}

/// Reader model identifier returned by the reader type query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceTypeCode(u32);

impl DeviceTypeCode {
    pub const UFR_NANO: Self = Self(UFR_NANO_DEVICE_TYPE);
    pub const UFR_NANO_ONLINE: Self = Self(UFR_NANO_ONLINE_DEVICE_TYPE);
    /// Placeholder reported in logs before the reader ever answered a
    /// reader type query.
    pub const UNKNOWN: Self = Self(0x0000_0000);

    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    #[must_use]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Render as `0x` followed by 8 uppercase hex digits.
    #[must_use]
    pub fn hex(self) -> String {
        format!("{:#010X}", self.0)
    }
}

impl fmt::Display for DeviceTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}

/// Tag UID reassembled into a single integer.
///
/// The reader hands out UID bytes least significant first; byte 7 of the raw
/// buffer becomes the most significant byte of the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardUid(u64);

impl CardUid {
    /// Decode a raw little-endian UID buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use nfcwatch_core::CardUid;
    ///
    /// let uid = CardUid::from_le_bytes([0x04, 0xAB, 0, 0, 0, 0, 0, 0x80]);
    /// assert_eq!(uid.value(), 0x8000_0000_0000_AB04);
    /// ```
    #[must_use]
    pub const fn from_le_bytes(raw: [u8; UID_LENGTH]) -> Self {
        Self(u64::from_le_bytes(raw))
    }

    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Raw buffer as the reader would return it.
    #[must_use]
    pub const fn to_le_bytes(self) -> [u8; UID_LENGTH] {
        self.0.to_le_bytes()
    }

    /// Render as 16 uppercase hex digits, most significant byte first.
    #[must_use]
    pub fn hex(self) -> String {
        format!("{:016X}", self.0)
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// Whether the monitor currently holds an open reader connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    #[must_use]
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Result of one tag query.
///
/// Produced fresh every poll cycle. `uid` is only set when a tag answered
/// the card query; `text` only when its NDEF text record was also readable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagSnapshot {
    /// A tag answered in the read field.
    pub present: bool,

    /// Decoded UID of the tag.
    pub uid: Option<CardUid>,

    /// NDEF text payload of the tag.
    pub text: Option<String>,
}

impl TagSnapshot {
    /// Snapshot for an empty field (or a query that could not be classified).
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// Snapshot for a tag whose text record was read.
    #[must_use]
    pub fn with_text(uid: CardUid, text: impl Into<String>) -> Self {
        Self {
            present: true,
            uid: Some(uid),
            text: Some(text.into()),
        }
    }

    /// Snapshot for a tag whose text record could not be read.
    #[must_use]
    pub fn without_text(uid: CardUid) -> Self {
        Self {
            present: true,
            uid: Some(uid),
            text: None,
        }
    }
}

/// Notification emitted by the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusNotification {
    /// Result of the per-cycle connection check.
    ConnectionChanged { connected: bool },

    /// Result of the per-cycle tag query.
    TagChanged(TagSnapshot),
}

impl StatusNotification {
    #[must_use]
    pub fn connection(connected: bool) -> Self {
        Self::ConnectionChanged { connected }
    }

    #[must_use]
    pub fn is_connection_changed(&self) -> bool {
        matches!(self, Self::ConnectionChanged { .. })
    }

    #[must_use]
    pub fn is_tag_changed(&self) -> bool {
        matches!(self, Self::TagChanged(_))
    }
}
