//! Transport abstraction for HIDBurner programmer communication
//!
//! This crate provides a unified interface for exchanging HID feature
//! reports with a programmer device across two backends:
//!
//! - Platform HID driver (hidapi) — the OS driver stack performs the
//!   report transfers
//! - USB control transfers (rusb) — the HID class requests are issued
//!   directly, for hosts where no HID driver path is usable
//!
//! All operations are synchronous and blocking. A handle is exclusively
//! owned: it is not safe for concurrent use, and callers that share one
//! must serialize access themselves.

mod error;
mod hid_backend;
mod types;
mod usb_backend;

pub use error::TransportError;
pub use hid_backend::PlatformHidTransport;
pub use types::{Backend, DeviceFilter, TransportDeviceInfo};
pub use usb_backend::UsbControlTransport;

/// The core transport trait - both backends implement this
///
/// Exposes exactly the operations the report framing layer needs: send a
/// feature report, read one back, inspect the device identity, and close.
pub trait FeatureTransport: Send {
    /// Send a feature report to the device.
    ///
    /// Byte 0 of `buf` is the report id; the remaining bytes are the
    /// payload. Blocks until the transfer completes or the transport's
    /// timeout expires.
    fn send_feature_report(&mut self, buf: &[u8]) -> Result<(), TransportError>;

    /// Read a feature report from the device into `buf`.
    ///
    /// `buf` must be at least one byte long: `buf[0]` is seeded with
    /// `report_id` before the request is issued, and an empty buffer is
    /// rejected with [`TransportError::Io`]. On success the device's echo
    /// of the id is at byte 0 and the payload follows. Returns the number
    /// of bytes actually received.
    fn get_feature_report(&mut self, report_id: u8, buf: &mut [u8])
        -> Result<usize, TransportError>;

    /// Get device information
    fn device_info(&self) -> &TransportDeviceInfo;

    /// Close the handle.
    ///
    /// Consumes the transport, so closing twice does not compile. Dropping
    /// a transport without calling this releases the handle as well.
    fn close(self: Box<Self>) -> Result<(), TransportError>;
}

/// Open a device through the default backend for this platform.
pub fn open(filter: &DeviceFilter) -> Result<Box<dyn FeatureTransport>, TransportError> {
    open_with_backend(filter, Backend::default())
}

/// Open a device through an explicitly chosen backend.
pub fn open_with_backend(
    filter: &DeviceFilter,
    backend: Backend,
) -> Result<Box<dyn FeatureTransport>, TransportError> {
    match backend {
        Backend::PlatformHid => Ok(Box::new(PlatformHidTransport::open(filter)?)),
        Backend::UsbControl => Ok(Box::new(UsbControlTransport::open(filter)?)),
    }
}

/// Seed the report-id byte of a read buffer, rejecting buffers with no room
/// for it.
pub(crate) fn seed_report_id(buf: &mut [u8], report_id: u8) -> Result<(), TransportError> {
    let first = buf
        .first_mut()
        .ok_or_else(|| TransportError::Io("report buffer has no room for the report id".into()))?;
    *first = report_id;
    Ok(())
}
