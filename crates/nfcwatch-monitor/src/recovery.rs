//! Device-type-aware recovery timing.
//!
//! After a failed connect or health check the supervisor waits before the
//! next attempt. The wait is selected from the last device type the reader
//! reported and can be cut short by a [`CancellationToken`].

use nfcwatch_core::DeviceTypeCode;
use nfcwatch_core::constants::{
    GENERIC_RECOVERY_MS, UFR_NANO_ONLINE_RECOVERY_MS, UFR_NANO_RECOVERY_MS,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Select the recovery delay for the last observed device type.
///
/// # Examples
///
/// ```
/// use nfcwatch_core::DeviceTypeCode;
/// use nfcwatch_monitor::recovery::recovery_delay;
/// use std::time::Duration;
///
/// assert_eq!(recovery_delay(Some(DeviceTypeCode::UFR_NANO)), Duration::from_secs(5));
/// assert_eq!(recovery_delay(None), Duration::from_secs(10));
/// ```
pub fn recovery_delay(device_type: Option<DeviceTypeCode>) -> Duration {
    let millis = match device_type {
        Some(DeviceTypeCode::UFR_NANO) => UFR_NANO_RECOVERY_MS,
        Some(DeviceTypeCode::UFR_NANO_ONLINE) => UFR_NANO_ONLINE_RECOVERY_MS,
        _ => GENERIC_RECOVERY_MS,
    };
    Duration::from_millis(millis)
}

/// How a recovery wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full delay elapsed.
    Completed,
    /// Cancellation was requested before the delay elapsed.
    Cancelled,
}

/// Sleep for `delay` unless `cancel` fires first.
///
/// An already-cancelled token returns [`WaitOutcome::Cancelled`] without
/// sleeping.
pub async fn wait_for_recovery(delay: Duration, cancel: &CancellationToken) -> WaitOutcome {
    tokio::select! {
        biased;
        () = cancel.cancelled() => WaitOutcome::Cancelled,
        () = tokio::time::sleep(delay) => WaitOutcome::Completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tokio::time::Instant;

    #[rstest]
    #[case::nano(Some(DeviceTypeCode::new(0xD138_0022)), 5_000)]
    #[case::nano_online(Some(DeviceTypeCode::new(0xD139_0222)), 20_000)]
    #[case::unknown_model(Some(DeviceTypeCode::new(0x0000_0001)), 10_000)]
    #[case::never_observed(None, 10_000)]
    fn test_recovery_delay_table(
        #[case] device_type: Option<DeviceTypeCode>,
        #[case] expected_ms: u64,
    ) {
        assert_eq!(
            recovery_delay(device_type),
            Duration::from_millis(expected_ms)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_completes() {
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let outcome = wait_for_recovery(Duration::from_secs(10), &cancel).await;

        assert_eq!(outcome, WaitOutcome::Completed);
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_cancelled_midway() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let start = Instant::now();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });

        let outcome = wait_for_recovery(Duration::from_secs(20), &cancel).await;

        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_already_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let start = Instant::now();

        let outcome = wait_for_recovery(Duration::from_secs(5), &cancel).await;

        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
