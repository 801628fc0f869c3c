// CLI definitions using clap

use clap::{Parser, Subcommand};

use hidburner::reports::device;
use hidburner::{Backend, DeviceFilter};

#[derive(Parser)]
#[command(name = "hidburner")]
#[command(author, version, about = "Host-side tool for HIDBurner bootloader devices")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Transport backend (hid = platform HID driver, usb = raw control transfers)
    #[arg(long, global = true)]
    pub backend: Option<Backend>,

    /// Vendor ID to match (hex, e.g. 16c0)
    #[arg(long, global = true, value_parser = parse_hex_u16)]
    pub vid: Option<u16>,

    /// Product ID to match (hex, e.g. 05df)
    #[arg(long, global = true, value_parser = parse_hex_u16)]
    pub pid: Option<u16>,

    /// Exact manufacturer string to match
    #[arg(long, global = true)]
    pub vendor_name: Option<String>,

    /// Exact product string to match
    #[arg(long, global = true)]
    pub product_name: Option<String>,

    /// Accept the first VID/PID match without checking name strings
    #[arg(long, global = true)]
    pub any_name: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show identity of the connected programmer
    #[command(visible_alias = "i")]
    Info,

    /// Read the first (command/status) report and print it as hex
    #[command(visible_alias = "rf")]
    ReadFirst,

    /// Read the second (data) report and print it as hex
    #[command(visible_alias = "rs")]
    ReadSecond,

    /// Frame a hex payload into the two reports and send it
    #[command(visible_alias = "w")]
    Write {
        /// Payload as hex bytes, e.g. "01 a0 ff" or "01a0ff"
        data: String,
    },
}

impl Cli {
    /// Build the device filter from defaults and overrides.
    pub fn filter(&self) -> DeviceFilter {
        let vid = self.vid.unwrap_or(device::VENDOR_ID);
        let pid = self.pid.unwrap_or(device::PRODUCT_ID);
        let mut filter = DeviceFilter::new(vid, pid);
        if !self.any_name {
            filter.vendor_name = Some(
                self.vendor_name
                    .clone()
                    .unwrap_or_else(|| device::VENDOR_NAME.to_string()),
            );
            filter.product_name = Some(
                self.product_name
                    .clone()
                    .unwrap_or_else(|| device::PRODUCT_NAME.to_string()),
            );
        }
        filter
    }
}

/// Parse a u16 from hex, with or without a 0x prefix.
pub fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value \"{s}\": {e}"))
}

/// Parse a whitespace-tolerant hex string into bytes.
pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>, String> {
    let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    // Byte-indexed slicing below is only safe on ASCII input
    if !digits.is_ascii() {
        return Err(format!("non-hex characters in \"{s}\""));
    }
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in \"{s}\""));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| format!("invalid hex byte \"{}\": {e}", &digits[i..i + 2]))
        })
        .collect()
}
