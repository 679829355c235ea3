//! Reader abstraction layer for nfcwatch.
//!
//! This crate defines the command interface the monitor drives (open, close,
//! reset, reader type query, card query, NDEF text read) as the
//! [`ReaderDevice`] trait, plus a scriptable simulated reader for development
//! and testing without physical hardware.
//!
//! # Design Philosophy
//!
//! - **Async-first**: commands are native `async fn` in traits
//!   (Edition 2024 RPITIT).
//! - **Status-code results**: every command returns
//!   [`CommandResult<T>`](traits::CommandResult), with the raw
//!   [`ReaderStatus`](nfcwatch_core::ReaderStatus) in the error position.
//! - **Exclusive access**: commands take `&mut self`, so a device can only
//!   ever be driven by one caller at a time.
//!
//! # Example
//!
//! ```
//! use nfcwatch_hardware::mock::MockReader;
//! use nfcwatch_hardware::traits::ReaderDevice;
//! use nfcwatch_core::{DeviceTypeCode, ReaderStatus};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let (mut reader, handle) = MockReader::new();
//!     handle.set_device_type(DeviceTypeCode::UFR_NANO);
//!
//!     reader.open().await.unwrap();
//!     assert_eq!(reader.reader_type().await, Ok(DeviceTypeCode::UFR_NANO));
//!     assert_eq!(reader.card_id().await, Err(ReaderStatus::NO_CARD));
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! Async trait methods are not object safe. Code that needs a single concrete
//! device type (for example to spawn the poll loop on a Tokio task) uses the
//! enum wrapper in [`devices`].

pub mod devices;
pub mod mock;
pub mod traits;

pub use devices::AnyReaderDevice;
pub use traits::{CardIdentity, CommandResult, ReaderDevice};
