//! Common types for the transport layer

use std::fmt;
use std::str::FromStr;

/// Transport backend identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Platform HID driver stack (hidapi)
    PlatformHid,
    /// Generic USB control transfers (libusb via rusb)
    UsbControl,
}

impl Default for Backend {
    /// Windows talks to HID devices through the OS HID driver; everywhere
    /// else raw control transfers are used.
    fn default() -> Self {
        if cfg!(windows) {
            Backend::PlatformHid
        } else {
            Backend::UsbControl
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::PlatformHid => f.write_str("hid"),
            Backend::UsbControl => f.write_str("usb"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hid" | "hidapi" => Ok(Backend::PlatformHid),
            "usb" | "libusb" => Ok(Backend::UsbControl),
            _ => Err(format!("unknown backend: \"{s}\". Use hid or usb")),
        }
    }
}

/// Filter applied while enumerating HID devices.
///
/// VID/PID always have to match. Each name filter, when set, requires an
/// exact match against the string the device itself reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFilter {
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
    /// Exact manufacturer string, if it should be checked
    pub vendor_name: Option<String>,
    /// Exact product string, if it should be checked
    pub product_name: Option<String>,
}

impl DeviceFilter {
    /// Filter on VID/PID only
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            vendor_name: None,
            product_name: None,
        }
    }

    /// Filter on VID/PID plus exact vendor and product names
    pub fn with_names(
        vendor_id: u16,
        product_id: u16,
        vendor_name: impl Into<String>,
        product_name: impl Into<String>,
    ) -> Self {
        Self {
            vendor_id,
            product_id,
            vendor_name: Some(vendor_name.into()),
            product_name: Some(product_name.into()),
        }
    }

    /// Check the manufacturer string a device reported against the vendor
    /// name filter. Always passes when no filter is set; a set filter only
    /// accepts an exact match, and a device that did not report the string
    /// at all fails it.
    pub fn vendor_name_matches(&self, manufacturer: Option<&str>) -> bool {
        name_matches(&self.vendor_name, manufacturer)
    }

    /// Check the product string a device reported against the product name
    /// filter. Same rules as [`vendor_name_matches`](Self::vendor_name_matches).
    pub fn product_name_matches(&self, product: Option<&str>) -> bool {
        name_matches(&self.product_name, product)
    }

    /// Check both optional name filters against what a device reported.
    pub fn names_match(&self, manufacturer: Option<&str>, product: Option<&str>) -> bool {
        self.vendor_name_matches(manufacturer) && self.product_name_matches(product)
    }
}

fn name_matches(want: &Option<String>, got: Option<&str>) -> bool {
    match want {
        Some(want) => got == Some(want.as_str()),
        None => true,
    }
}

/// Identity of an opened device
#[derive(Debug, Clone)]
pub struct TransportDeviceInfo {
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
    /// Backend the handle was opened through
    pub backend: Backend,
    /// Device path or bus address (backend-specific)
    pub device_path: String,
    /// Serial number if available
    pub serial: Option<String>,
    /// Manufacturer string if available
    pub manufacturer: Option<String>,
    /// Product string if available
    pub product: Option<String>,
}
