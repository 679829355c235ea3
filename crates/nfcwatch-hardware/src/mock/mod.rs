//! Mock reader implementation for testing and development.
//!
//! The simulated reader is scripted through its handle and needs no USB
//! hardware or native library.

pub mod reader;

pub use reader::{MockReader, MockReaderHandle, MockTag, ReaderCommand};
