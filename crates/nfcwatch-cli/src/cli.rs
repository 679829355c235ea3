//! Command line and environment configuration.

use clap::Parser;
use nfcwatch_core::constants::{
    DEFAULT_EVENT_CAPACITY, DEFAULT_POLL_INTERVAL_MS, NDEF_TEXT_BUFFER_SIZE,
};
use nfcwatch_core::{CardUid, DeviceTypeCode};
use nfcwatch_monitor::MonitorConfig;
use std::time::Duration;

/// Watch a USB NFC reader and report connection and tag changes.
#[derive(Parser, Debug)]
#[command(name = "nfcwatch", version, about)]
pub struct Cli {
    /// Delay between poll cycles in milliseconds
    #[arg(long, env = "NFCWATCH_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Size of the NDEF text read buffer in bytes
    #[arg(long, env = "NFCWATCH_NDEF_BUFFER_SIZE", default_value_t = NDEF_TEXT_BUFFER_SIZE)]
    pub ndef_buffer_size: usize,

    /// Notifications buffered per listener
    #[arg(long, env = "NFCWATCH_EVENT_CAPACITY", default_value_t = DEFAULT_EVENT_CAPACITY)]
    pub event_capacity: usize,

    /// Device type reported by the simulated reader (hex, e.g. D1380022)
    #[arg(long, env = "NFCWATCH_DEVICE_TYPE", value_parser = parse_device_type)]
    pub device_type: Option<DeviceTypeCode>,

    /// UID of the tag placed on the simulated reader (hex)
    #[arg(long, value_parser = parse_uid)]
    pub demo_uid: Option<CardUid>,

    /// NDEF text of the simulated tag, used with --demo-uid
    #[arg(long, default_value = "TESTING")]
    pub demo_text: String,
}

impl Cli {
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ndef_buffer_size: self.ndef_buffer_size,
            event_capacity: self.event_capacity,
        }
    }
}

fn parse_hex(value: &str) -> Result<u64, String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value '{value}': {e}"))
}

fn parse_device_type(value: &str) -> Result<DeviceTypeCode, String> {
    let code = parse_hex(value)?;
    u32::try_from(code)
        .map(DeviceTypeCode::new)
        .map_err(|_| format!("device type '{value}' does not fit in 32 bits"))
}

fn parse_uid(value: &str) -> Result<CardUid, String> {
    parse_hex(value).map(CardUid::new)
}
