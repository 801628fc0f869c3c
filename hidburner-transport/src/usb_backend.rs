//! Feature-report transport over raw USB control transfers (rusb)
//!
//! Speaks the HID class requests directly: Set_Report (0x09) and Get_Report
//! (0x01) with report type Feature, addressed class-type / device-recipient
//! the way the bootloader firmware expects.

use std::sync::OnceLock;
use std::time::Duration;

use rusb::{Context, Device, DeviceHandle, Direction, Recipient, RequestType, UsbContext};
use tracing::debug;

use crate::error::TransportError;
use crate::types::{Backend, DeviceFilter, TransportDeviceInfo};
use crate::FeatureTransport;

/// HID class request: Get_Report
const HID_GET_REPORT: u8 = 0x01;
/// HID class request: Set_Report
const HID_SET_REPORT: u8 = 0x09;
/// HID report type selector for feature reports (high byte of wValue)
const HID_REPORT_TYPE_FEATURE: u16 = 3;

/// Timeout for every control transfer
const TRANSFER_TIMEOUT: Duration = Duration::from_millis(5000);

/// Process-wide libusb context, created on first open and never torn down.
static USB_CONTEXT: OnceLock<Context> = OnceLock::new();

fn usb_context() -> Result<Context, TransportError> {
    if let Some(ctx) = USB_CONTEXT.get() {
        return Ok(ctx.clone());
    }
    let ctx = Context::new()?;
    Ok(USB_CONTEXT.get_or_init(|| ctx).clone())
}

/// wValue for a feature-report class request: report type in the high byte,
/// report id in the low byte.
fn feature_wvalue(report_id: u8) -> u16 {
    (HID_REPORT_TYPE_FEATURE << 8) | report_id as u16
}

/// First HID-class interface on the device, if any.
fn find_hid_interface(device: &Device<Context>) -> Option<u8> {
    let config = device.active_config_descriptor().ok()?;
    config
        .interfaces()
        .flat_map(|i| i.descriptors())
        .find(|d| d.class_code() == rusb::constants::LIBUSB_CLASS_HID)
        .map(|d| d.interface_number())
}

/// Transport backed by libusb control transfers.
pub struct UsbControlTransport {
    handle: DeviceHandle<Context>,
    interface: u8,
    info: TransportDeviceInfo,
}

impl UsbControlTransport {
    /// Enumerate USB devices and open the first one accepted by `filter`.
    ///
    /// Error precedence matches the platform HID backend: open failure
    /// records `AccessDenied`, a failed required string read records `Io`,
    /// a name mismatch records `NotFound`.
    pub fn open(filter: &DeviceFilter) -> Result<Self, TransportError> {
        let ctx = usb_context()?;

        let mut last_err = TransportError::NotFound(format!(
            "{:04x}:{:04x}",
            filter.vendor_id, filter.product_id
        ));

        for device in ctx.devices()?.iter() {
            let desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(_) => continue,
            };
            if desc.vendor_id() != filter.vendor_id || desc.product_id() != filter.product_id {
                continue;
            }

            let address = format!("{:03}:{:03}", device.bus_number(), device.address());
            debug!("checking USB device at {}", address);

            let mut handle = match device.open() {
                Ok(h) => h,
                Err(e) => {
                    debug!("opening {} failed: {}", address, e);
                    last_err = e.into();
                    continue;
                }
            };

            // Only read the strings the filter actually checks; an
            // unreadable string nobody filters on must not disqualify the
            // device.
            let mut manufacturer = None;
            let mut product = None;
            if filter.vendor_name.is_some() {
                manufacturer = match handle.read_manufacturer_string_ascii(&desc) {
                    Ok(s) => Some(s),
                    Err(e) => {
                        debug!("manufacturer string read failed on {}: {}", address, e);
                        last_err = TransportError::Io(e.to_string());
                        continue;
                    }
                };
                if !filter.vendor_name_matches(manufacturer.as_deref()) {
                    debug!("manufacturer mismatch on {}: {:?}", address, manufacturer);
                    last_err = TransportError::NotFound(format!(
                        "{:04x}:{:04x} matched, names did not",
                        filter.vendor_id, filter.product_id
                    ));
                    continue;
                }
            }
            if filter.product_name.is_some() {
                product = match handle.read_product_string_ascii(&desc) {
                    Ok(s) => Some(s),
                    Err(e) => {
                        debug!("product string read failed on {}: {}", address, e);
                        last_err = TransportError::Io(e.to_string());
                        continue;
                    }
                };
                if !filter.product_name_matches(product.as_deref()) {
                    debug!("product mismatch on {}: {:?}", address, product);
                    last_err = TransportError::NotFound(format!(
                        "{:04x}:{:04x} matched, names did not",
                        filter.vendor_id, filter.product_id
                    ));
                    continue;
                }
            }

            // The kernel HID driver usually owns the interface; detach it for
            // the lifetime of the handle where the platform allows.
            let interface = find_hid_interface(&device).unwrap_or(0);
            if rusb::supports_detach_kernel_driver() {
                let _ = handle.set_auto_detach_kernel_driver(true);
            }
            if let Err(e) = handle.claim_interface(interface) {
                debug!("claiming interface {} on {} failed: {}", interface, address, e);
                last_err = e.into();
                continue;
            }

            let serial = handle.read_serial_number_string_ascii(&desc).ok();
            let info = TransportDeviceInfo {
                vendor_id: filter.vendor_id,
                product_id: filter.product_id,
                backend: Backend::UsbControl,
                device_path: address,
                serial,
                manufacturer,
                product,
            };
            debug!(
                "opened {:04x}:{:04x} via control transfers at {}",
                info.vendor_id, info.product_id, info.device_path
            );
            return Ok(Self {
                handle,
                interface,
                info,
            });
        }

        Err(last_err)
    }
}

impl FeatureTransport for UsbControlTransport {
    fn send_feature_report(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        let request_type =
            rusb::request_type(Direction::Out, RequestType::Class, Recipient::Device);
        let sent = self.handle.write_control(
            request_type,
            HID_SET_REPORT,
            feature_wvalue(buf[0]),
            0,
            buf,
            TRANSFER_TIMEOUT,
        )?;
        if sent != buf.len() {
            return Err(TransportError::Io(format!(
                "short feature write: {sent} of {} bytes",
                buf.len()
            )));
        }
        Ok(())
    }

    fn get_feature_report(
        &mut self,
        report_id: u8,
        buf: &mut [u8],
    ) -> Result<usize, TransportError> {
        crate::seed_report_id(buf, report_id)?;
        let request_type =
            rusb::request_type(Direction::In, RequestType::Class, Recipient::Device);
        let received = self.handle.read_control(
            request_type,
            HID_GET_REPORT,
            feature_wvalue(report_id),
            0,
            buf,
            TRANSFER_TIMEOUT,
        )?;
        Ok(received)
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    fn close(self: Box<Self>) -> Result<(), TransportError> {
        debug!("closing {}", self.info.device_path);
        let _ = self.handle.release_interface(self.interface);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_wvalue_places_report_type_and_id() {
        assert_eq!(feature_wvalue(0), 0x0300);
        assert_eq!(feature_wvalue(1), 0x0301);
        assert_eq!(feature_wvalue(0xAB), 0x03AB);
    }

    #[test]
    fn report_requests_are_class_type_device_recipient() {
        let out = rusb::request_type(Direction::Out, RequestType::Class, Recipient::Device);
        let inp = rusb::request_type(Direction::In, RequestType::Class, Recipient::Device);
        assert_eq!(out, 0x20);
        assert_eq!(inp, 0xA0);
    }
}
