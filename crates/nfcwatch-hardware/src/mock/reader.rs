//! Mock NFC reader implementation for testing and development.
//!
//! This module provides a simulated USB reader whose behavior is scripted
//! through a [`MockReaderHandle`]: the device can be unplugged and replugged,
//! tags can be moved in and out of the field, and any command can be forced
//! to fail with an arbitrary status code.

use crate::traits::{CardIdentity, CommandResult, ReaderDevice};
use nfcwatch_core::constants::UID_LENGTH;
use nfcwatch_core::{DeviceTypeCode, ReaderStatus};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Device type reported by a freshly created mock reader.
///
/// Deliberately not one of the known models, so it maps to the generic
/// recovery delay.
pub const GENERIC_DEVICE_TYPE: DeviceTypeCode = DeviceTypeCode::new(0x0000_0001);

/// Number of most recent commands kept in the mock's history.
pub const HISTORY_CAPACITY: usize = 1_024;

/// Card family reported for mock tags unless overridden.
pub const DEFAULT_CARD_TYPE: u8 = 0x0C;

/// Reader commands, as recorded in the mock's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReaderCommand {
    Open,
    Close,
    Reset,
    ReaderType,
    CardId,
    ReadNdefText,
}

/// A tag that can be placed in the mock reader's field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTag {
    /// Card family code returned by the card query.
    pub card_type: u8,

    /// Raw UID buffer, least significant byte first.
    pub uid: [u8; UID_LENGTH],

    /// Number of significant UID bytes.
    pub uid_size: u8,

    /// NDEF text record. `None` makes the text read fail.
    pub text: Option<String>,
}

impl MockTag {
    /// Create a tag with a full 8-byte UID and no text record.
    pub fn new(uid: [u8; UID_LENGTH]) -> Self {
        Self {
            card_type: DEFAULT_CARD_TYPE,
            uid,
            uid_size: UID_LENGTH as u8,
            text: None,
        }
    }

    /// Set the NDEF text record.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the card family code.
    pub fn with_card_type(mut self, card_type: u8) -> Self {
        self.card_type = card_type;
        self
    }

    fn identity(&self) -> CardIdentity {
        CardIdentity::new(self.card_type, self.uid, self.uid_size)
    }
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Once(ReaderStatus),
    Always(ReaderStatus),
}

#[derive(Debug)]
struct MockState {
    attached: bool,
    open: bool,
    device_type: DeviceTypeCode,
    tag: Option<MockTag>,
    faults: HashMap<ReaderCommand, Fault>,
    history: VecDeque<ReaderCommand>,
}

impl MockState {
    /// Record the command and apply any scripted fault.
    fn begin(&mut self, command: ReaderCommand) -> CommandResult<()> {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(command);

        match self.faults.get(&command).copied() {
            Some(Fault::Always(status)) => Err(status),
            Some(Fault::Once(status)) => {
                self.faults.remove(&command);
                Err(status)
            }
            None => Ok(()),
        }
    }

    fn require_link(&self) -> CommandResult<()> {
        if !self.attached {
            return Err(ReaderStatus::COMMUNICATION_BREAK);
        }
        if !self.open {
            return Err(ReaderStatus::READER_PORT_NOT_OPENED);
        }
        Ok(())
    }
}

/// Mock NFC reader for testing and development.
///
/// The reader starts attached, closed, with an empty field and
/// [`GENERIC_DEVICE_TYPE`].
///
/// # Examples
///
/// ```
/// use nfcwatch_hardware::mock::{MockReader, MockTag};
/// use nfcwatch_hardware::traits::ReaderDevice;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let (mut reader, handle) = MockReader::new();
///     handle.present_tag(MockTag::new([0, 1, 2, 3, 4, 5, 6, 7]).with_text("TESTING"));
///
///     reader.open().await.unwrap();
///     let identity = reader.card_id().await.unwrap();
///     assert_eq!(identity.uid().value(), 0x0706050403020100);
///
///     let mut buffer = [0u8; 64];
///     reader.read_ndef_text(&mut buffer).await.unwrap();
///     assert_eq!(&buffer[..7], b"TESTING");
/// }
/// ```
#[derive(Debug)]
pub struct MockReader {
    state: Arc<Mutex<MockState>>,
    name: String,
}

impl MockReader {
    /// Create a new mock reader with the default name.
    ///
    /// Returns a tuple of (MockReader, MockReaderHandle) where the handle
    /// scripts the reader's behavior.
    pub fn new() -> (Self, MockReaderHandle) {
        Self::with_name("Mock uFR Reader")
    }

    /// Create a new mock reader with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockReaderHandle) {
        let state = Arc::new(Mutex::new(MockState {
            attached: true,
            open: false,
            device_type: GENERIC_DEVICE_TYPE,
            tag: None,
            faults: HashMap::new(),
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }));

        let reader = Self {
            state: Arc::clone(&state),
            name: name.into(),
        };

        (reader, MockReaderHandle { state })
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReaderDevice for MockReader {
    async fn open(&mut self) -> CommandResult<()> {
        let mut state = self.lock();
        state.begin(ReaderCommand::Open)?;

        if !state.attached {
            return Err(ReaderStatus::CAN_NOT_OPEN_READER);
        }
        state.open = true;
        trace!(reader = %self.name, "mock reader opened");
        Ok(())
    }

    async fn close(&mut self) -> CommandResult<()> {
        let mut state = self.lock();
        state.begin(ReaderCommand::Close)?;

        if !state.open {
            return Err(ReaderStatus::READER_PORT_NOT_OPENED);
        }
        state.open = false;
        trace!(reader = %self.name, "mock reader closed");
        Ok(())
    }

    async fn reset(&mut self) -> CommandResult<()> {
        let mut state = self.lock();
        state.begin(ReaderCommand::Reset)?;
        state.require_link()
    }

    async fn reader_type(&mut self) -> CommandResult<DeviceTypeCode> {
        let mut state = self.lock();
        state.begin(ReaderCommand::ReaderType)?;
        state.require_link()?;
        Ok(state.device_type)
    }

    async fn card_id(&mut self) -> CommandResult<CardIdentity> {
        let mut state = self.lock();
        state.begin(ReaderCommand::CardId)?;
        state.require_link()?;

        state
            .tag
            .as_ref()
            .map(MockTag::identity)
            .ok_or(ReaderStatus::NO_CARD)
    }

    async fn read_ndef_text(&mut self, buffer: &mut [u8]) -> CommandResult<()> {
        let mut state = self.lock();
        state.begin(ReaderCommand::ReadNdefText)?;
        state.require_link()?;

        let tag = state.tag.as_ref().ok_or(ReaderStatus::NO_CARD)?;
        let text = tag.text.as_deref().ok_or(ReaderStatus::READING_ERROR)?;
        let bytes = text.as_bytes();

        // Room for the NUL terminator is required.
        if bytes.len() >= buffer.len() {
            return Err(ReaderStatus::BUFFER_OVERFLOW);
        }

        buffer.fill(0);
        buffer[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// Handle for controlling a mock reader.
///
/// Clones share the same underlying reader state.
///
/// # Examples
///
/// ```
/// use nfcwatch_hardware::mock::{MockReader, ReaderCommand};
/// use nfcwatch_hardware::traits::ReaderDevice;
/// use nfcwatch_core::ReaderStatus;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let (mut reader, handle) = MockReader::new();
///
///     handle.fail_next(ReaderCommand::Open, ReaderStatus::new(0xFF));
///     assert_eq!(reader.open().await, Err(ReaderStatus::new(0xFF)));
///     assert_eq!(reader.open().await, Ok(()));
///
///     assert_eq!(handle.call_count(ReaderCommand::Open), 2);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockReaderHandle {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Plug the reader back in. The connection must be reopened.
    pub fn attach(&self) {
        self.lock().attached = true;
    }

    /// Unplug the reader. Any open connection is lost.
    pub fn detach(&self) {
        let mut state = self.lock();
        state.attached = false;
        state.open = false;
    }

    /// Check if the reader is plugged in.
    pub fn is_attached(&self) -> bool {
        self.lock().attached
    }

    /// Check if the reader connection is open.
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// Set the device type reported by the reader type query.
    pub fn set_device_type(&self, device_type: DeviceTypeCode) {
        self.lock().device_type = device_type;
    }

    /// Place a tag in the read field, replacing any previous one.
    pub fn present_tag(&self, tag: MockTag) {
        self.lock().tag = Some(tag);
    }

    /// Remove the tag from the read field.
    pub fn remove_tag(&self) {
        self.lock().tag = None;
    }

    /// Get the tag currently in the field, if any.
    pub fn current_tag(&self) -> Option<MockTag> {
        self.lock().tag.clone()
    }

    /// Make the next invocation of `command` fail with `status`.
    pub fn fail_next(&self, command: ReaderCommand, status: ReaderStatus) {
        self.lock().faults.insert(command, Fault::Once(status));
    }

    /// Make every invocation of `command` fail with `status` until cleared.
    pub fn fail_always(&self, command: ReaderCommand, status: ReaderStatus) {
        self.lock().faults.insert(command, Fault::Always(status));
    }

    /// Remove all scripted faults.
    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// The last [`HISTORY_CAPACITY`] commands issued, oldest first.
    pub fn history(&self) -> Vec<ReaderCommand> {
        self.lock().history.iter().copied().collect()
    }

    /// Number of times `command` appears in the retained history.
    pub fn call_count(&self, command: ReaderCommand) -> usize {
        self.lock()
            .history
            .iter()
            .filter(|issued| **issued == command)
            .count()
    }

    /// Forget the command history.
    pub fn clear_history(&self) {
        self.lock().history.clear();
    }
}
