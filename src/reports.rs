//! Report layout and device identification constants

use hidburner_transport::DeviceFilter;

/// One feature report slot: its id byte and payload capacity.
///
/// On the wire each transfer is 1 leading report-id byte plus `payload_len`
/// payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSlot {
    /// Report id, echoed back by the device on reads
    pub id: u8,
    /// Payload capacity in bytes, excluding the id byte
    pub payload_len: usize,
}

/// The two feature reports the bootloader protocol is framed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLayout {
    /// First report: command/header data
    pub first: ReportSlot,
    /// Second report: bulk data, only sent when the payload overflows the first
    pub second: ReportSlot,
}

impl ReportLayout {
    /// Largest payload a single write can carry across both reports.
    pub const fn max_payload(&self) -> usize {
        self.first.payload_len + self.second.payload_len
    }
}

/// Report layout used by the stock bootloader firmware.
pub const DEFAULT_LAYOUT: ReportLayout = ReportLayout {
    first: ReportSlot {
        id: 1,
        payload_len: 7,
    },
    second: ReportSlot {
        id: 2,
        payload_len: 128,
    },
};

/// Device identification constants
pub mod device {
    /// V-USB shared vendor ID
    pub const VENDOR_ID: u16 = 0x16C0;
    /// V-USB shared product ID for HID-class devices
    pub const PRODUCT_ID: u16 = 0x05DF;
    /// Manufacturer string the firmware reports
    pub const VENDOR_NAME: &str = "obdev.at";
    /// Product string the firmware reports
    pub const PRODUCT_NAME: &str = "HIDBurner";
}

/// Filter matching the stock firmware: shared VID/PID narrowed down by the
/// exact vendor and product strings.
pub fn default_filter() -> DeviceFilter {
    DeviceFilter::with_names(
        device::VENDOR_ID,
        device::PRODUCT_ID,
        device::VENDOR_NAME,
        device::PRODUCT_NAME,
    )
}
