//! Shared vocabulary for the nfcwatch reader monitor.
//!
//! This crate holds the types every other nfcwatch crate speaks in: raw reader
//! status codes, device model identifiers, tag UIDs, per-cycle tag snapshots
//! and the notifications emitted to listeners. It has no runtime and performs
//! no I/O.
//!
//! # Status codes
//!
//! The reader library reports every command outcome as a 32-bit status code.
//! Only two of them are given meaning by the monitor ([`ReaderStatus::OK`] and
//! [`ReaderStatus::NO_CARD`]); every other value is carried through verbatim
//! so operators can triage it from the logs.
//!
//! ```
//! use nfcwatch_core::ReaderStatus;
//!
//! let status = ReaderStatus::new(0xFF);
//! assert_eq!(status.hex(), "0x000000FF");
//! assert!(!status.is_ok());
//! ```
//!
//! # UIDs
//!
//! Tag identifiers arrive from the reader least significant byte first:
//!
//! ```
//! use nfcwatch_core::CardUid;
//!
//! let uid = CardUid::from_le_bytes([0, 1, 2, 3, 4, 5, 6, 7]);
//! assert_eq!(uid.value(), 0x0706_0504_0302_0100);
//! ```

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
