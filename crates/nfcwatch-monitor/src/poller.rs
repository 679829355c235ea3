//! Tag poller.
//!
//! Runs one tag query against a connected reader and classifies the answer:
//! empty field, tag with readable text, or tag present but unreadable. Only
//! the "no card" and "ok" statuses get their own branch; every other status
//! from the card query is reported as unexpected.

use crate::events::{DiagnosticRecord, EventSink, Severity, record_or_warn};
use nfcwatch_core::constants::{
    MESSAGE_NDEF_READ_FAILURE, MESSAGE_UNEXPECTED_READER_STATUS, UNEXPECTED_READER_STATUS_MARKER,
};
use nfcwatch_core::{DeviceTypeCode, ReaderStatus, StatusNotification, TagSnapshot};
use nfcwatch_hardware::ReaderDevice;
use std::sync::Arc;
use tracing::{instrument, trace};

/// Queries the read field once per cycle.
pub struct TagPoller {
    sink: Arc<dyn EventSink>,
    buffer: Vec<u8>,
}

impl TagPoller {
    /// Create a poller that reads NDEF text into a `buffer_size` byte buffer.
    pub fn new(sink: Arc<dyn EventSink>, buffer_size: usize) -> Self {
        Self {
            sink,
            buffer: vec![0; buffer_size],
        }
    }

    /// Query the tag in the field and publish exactly one
    /// [`StatusNotification::TagChanged`].
    ///
    /// `device_type` is the last type reported by the reader and only
    /// enriches failure records.
    #[instrument(skip_all)]
    pub async fn poll_once<D: ReaderDevice>(
        &mut self,
        device: &mut D,
        device_type: Option<DeviceTypeCode>,
    ) -> TagSnapshot {
        let (snapshot, failure) = self.query(device).await;

        self.sink
            .publish(StatusNotification::TagChanged(snapshot.clone()));

        if let Some((message, status)) = failure {
            let record =
                DiagnosticRecord::new(Severity::Error, UNEXPECTED_READER_STATUS_MARKER, message)
                    .with_device_type(device_type)
                    .with_status(status);
            record_or_warn(self.sink.as_ref(), record);
        }

        snapshot
    }

    async fn query<D: ReaderDevice>(
        &mut self,
        device: &mut D,
    ) -> (TagSnapshot, Option<(&'static str, ReaderStatus)>) {
        match device.card_id().await {
            Err(ReaderStatus::NO_CARD) => (TagSnapshot::absent(), None),
            Ok(identity) => {
                let uid = identity.uid();
                self.buffer.fill(0);

                match device.read_ndef_text(&mut self.buffer).await {
                    Ok(()) => {
                        let text = decode_text(&self.buffer);
                        trace!(uid = %uid, "tag with text in field");
                        (TagSnapshot::with_text(uid, text), None)
                    }
                    Err(status) => (
                        TagSnapshot::without_text(uid),
                        Some((MESSAGE_NDEF_READ_FAILURE, status)),
                    ),
                }
            }
            Err(status) => (
                TagSnapshot::absent(),
                Some((MESSAGE_UNEXPECTED_READER_STATUS, status)),
            ),
        }
    }
}

/// Extract the text payload from a NUL-padded reader buffer.
///
/// The payload ends at the first NUL. Invalid UTF-8 is replaced and
/// surrounding whitespace is trimmed.
///
/// # Examples
///
/// ```
/// use nfcwatch_monitor::poller::decode_text;
///
/// assert_eq!(decode_text(b" TESTING\n\0\0\0"), "TESTING");
/// ```
pub fn decode_text(buffer: &[u8]) -> String {
    let end = buffer
        .iter()
        .position(|byte| *byte == 0)
        .unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..end]).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;
    use nfcwatch_core::CardUid;
    use nfcwatch_core::constants::{FIELD_DEVICE_ID, FIELD_STATUS};
    use nfcwatch_hardware::mock::{MockReader, MockReaderHandle, MockTag, ReaderCommand};
    use rstest::rstest;

    const UID: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

    async fn connected() -> (MockReader, MockReaderHandle, Arc<MemorySink>, TagPoller) {
        let (mut reader, handle) = MockReader::new();
        reader.open().await.unwrap();
        let sink = Arc::new(MemorySink::new());
        let poller = TagPoller::new(sink.clone(), 64);
        (reader, handle, sink, poller)
    }

    #[rstest]
    #[case::plain(b"hello\0\0".as_slice(), "hello")]
    #[case::padded(b"  hello \0".as_slice(), "hello")]
    #[case::no_terminator(b"hello".as_slice(), "hello")]
    #[case::stops_at_first_nul(b"ab\0cd".as_slice(), "ab")]
    #[case::empty(b"\0\0\0".as_slice(), "")]
    #[case::invalid_utf8(b"a\xFFb\0".as_slice(), "a\u{FFFD}b")]
    fn test_decode_text(#[case] buffer: &[u8], #[case] expected: &str) {
        assert_eq!(decode_text(buffer), expected);
    }

    #[tokio::test]
    async fn test_empty_field() {
        let (mut reader, handle, sink, mut poller) = connected().await;

        let snapshot = poller.poll_once(&mut reader, None).await;

        assert_eq!(snapshot, TagSnapshot::absent());
        assert_eq!(
            sink.notifications(),
            vec![StatusNotification::TagChanged(TagSnapshot::absent())]
        );
        assert!(sink.records().is_empty());
        assert_eq!(handle.call_count(ReaderCommand::ReadNdefText), 0);
    }

    #[tokio::test]
    async fn test_tag_with_text() {
        let (mut reader, handle, sink, mut poller) = connected().await;
        handle.present_tag(MockTag::new(UID).with_text("TESTING"));

        let snapshot = poller.poll_once(&mut reader, None).await;

        let expected = TagSnapshot::with_text(CardUid::new(0x0706_0504_0302_0100), "TESTING");
        assert_eq!(snapshot, expected);
        assert_eq!(
            sink.notifications(),
            vec![StatusNotification::TagChanged(expected)]
        );
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn test_text_buffer_reused_between_polls() {
        let (mut reader, handle, _sink, mut poller) = connected().await;

        handle.present_tag(MockTag::new(UID).with_text("LONGER TEXT"));
        poller.poll_once(&mut reader, None).await;

        handle.present_tag(MockTag::new(UID).with_text("SHORT"));
        let snapshot = poller.poll_once(&mut reader, None).await;

        assert_eq!(snapshot.text.as_deref(), Some("SHORT"));
    }

    #[tokio::test]
    async fn test_unreadable_text() {
        let (mut reader, handle, sink, mut poller) = connected().await;
        handle.present_tag(MockTag::new(UID).with_text("TESTING"));
        handle.fail_next(ReaderCommand::ReadNdefText, ReaderStatus::new(0xFF));

        let snapshot = poller
            .poll_once(&mut reader, Some(DeviceTypeCode::UFR_NANO))
            .await;

        assert_eq!(
            snapshot,
            TagSnapshot::without_text(CardUid::new(0x0706_0504_0302_0100))
        );
        assert_eq!(sink.notifications().len(), 1);

        let records = sink.records_with_marker(UNEXPECTED_READER_STATUS_MARKER);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Error);
        assert_eq!(records[0].message, MESSAGE_NDEF_READ_FAILURE);
        assert_eq!(records[0].field(FIELD_STATUS), Some("0x000000FF"));
        assert_eq!(records[0].field(FIELD_DEVICE_ID), Some("0xD1380022"));
    }

    #[tokio::test]
    async fn test_tag_without_text_record() {
        let (mut reader, handle, sink, mut poller) = connected().await;
        handle.present_tag(MockTag::new(UID));

        let snapshot = poller.poll_once(&mut reader, None).await;

        assert!(snapshot.present);
        assert_eq!(snapshot.text, None);
        assert_eq!(sink.records()[0].field(FIELD_STATUS), Some("0x00000003"));
    }

    #[rstest]
    #[case::communication_error(0x01)]
    #[case::auth_error(0x0E)]
    #[case::undocumented(0xFF)]
    #[tokio::test]
    async fn test_unexpected_card_status(#[case] code: u32) {
        let (mut reader, handle, sink, mut poller) = connected().await;
        handle.present_tag(MockTag::new(UID).with_text("TESTING"));
        handle.fail_next(ReaderCommand::CardId, ReaderStatus::new(code));

        let snapshot = poller.poll_once(&mut reader, None).await;

        assert_eq!(snapshot, TagSnapshot::absent());
        assert_eq!(
            sink.notifications(),
            vec![StatusNotification::TagChanged(TagSnapshot::absent())]
        );

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].marker, UNEXPECTED_READER_STATUS_MARKER);
        assert_eq!(records[0].message, MESSAGE_UNEXPECTED_READER_STATUS);
        assert_eq!(records[0].field(FIELD_DEVICE_ID), Some("0x00000000"));
        assert_eq!(handle.call_count(ReaderCommand::ReadNdefText), 0);
    }
}
