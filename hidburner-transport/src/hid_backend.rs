//! Feature-report transport through the platform HID driver (hidapi)

use hidapi::{HidApi, HidDevice};
use tracing::debug;

use crate::error::TransportError;
use crate::types::{Backend, DeviceFilter, TransportDeviceInfo};
use crate::FeatureTransport;

/// Transport backed by the OS HID driver stack.
///
/// hidapi performs the Set/Get Feature ioctls itself, so this backend never
/// touches control-transfer plumbing directly.
pub struct PlatformHidTransport {
    device: HidDevice,
    info: TransportDeviceInfo,
}

impl PlatformHidTransport {
    /// Enumerate HID devices and open the first one accepted by `filter`.
    ///
    /// Candidates that match VID/PID but fail to open record `AccessDenied`;
    /// a failed required string read records `Io`; a name mismatch records
    /// `NotFound`. If nothing is accepted, the last recorded error is
    /// returned.
    pub fn open(filter: &DeviceFilter) -> Result<Self, TransportError> {
        let api = HidApi::new().map_err(|e| TransportError::Io(e.to_string()))?;

        let mut last_err = TransportError::NotFound(format!(
            "{:04x}:{:04x}",
            filter.vendor_id, filter.product_id
        ));

        for dev in api.device_list() {
            if dev.vendor_id() != filter.vendor_id || dev.product_id() != filter.product_id {
                continue;
            }

            let path = dev.path().to_string_lossy().to_string();
            debug!("checking HID path {}", path);

            let device = match dev.open_device(&api) {
                Ok(d) => d,
                Err(e) => {
                    debug!("opening {} failed: {}", path, e);
                    last_err = e.into();
                    continue;
                }
            };

            // Only read the strings the filter actually checks, from the
            // opened handle rather than the enumeration snapshot: a stale
            // snapshot can outlive a re-plugged device. An unreadable string
            // nobody filters on must not disqualify the device.
            let mut manufacturer = dev.manufacturer_string().map(|s| s.to_string());
            let mut product = dev.product_string().map(|s| s.to_string());

            if filter.vendor_name.is_some() {
                manufacturer = match device.get_manufacturer_string() {
                    Ok(s) => s,
                    Err(e) => {
                        debug!("manufacturer string read failed on {}: {}", path, e);
                        last_err = TransportError::Io(e.to_string());
                        continue;
                    }
                };
                if !filter.vendor_name_matches(manufacturer.as_deref()) {
                    debug!("manufacturer mismatch on {}: {:?}", path, manufacturer);
                    last_err = TransportError::NotFound(format!(
                        "{:04x}:{:04x} matched, names did not",
                        filter.vendor_id, filter.product_id
                    ));
                    continue;
                }
            }
            if filter.product_name.is_some() {
                product = match device.get_product_string() {
                    Ok(s) => s,
                    Err(e) => {
                        debug!("product string read failed on {}: {}", path, e);
                        last_err = TransportError::Io(e.to_string());
                        continue;
                    }
                };
                if !filter.product_name_matches(product.as_deref()) {
                    debug!("product mismatch on {}: {:?}", path, product);
                    last_err = TransportError::NotFound(format!(
                        "{:04x}:{:04x} matched, names did not",
                        filter.vendor_id, filter.product_id
                    ));
                    continue;
                }
            }

            let info = TransportDeviceInfo {
                vendor_id: filter.vendor_id,
                product_id: filter.product_id,
                backend: Backend::PlatformHid,
                device_path: path,
                serial: dev.serial_number().map(|s| s.to_string()),
                manufacturer,
                product,
            };
            debug!(
                "opened {:04x}:{:04x} via platform HID driver at {}",
                info.vendor_id, info.product_id, info.device_path
            );
            return Ok(Self { device, info });
        }

        Err(last_err)
    }
}

impl FeatureTransport for PlatformHidTransport {
    fn send_feature_report(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.device.send_feature_report(buf)?;
        Ok(())
    }

    fn get_feature_report(
        &mut self,
        report_id: u8,
        buf: &mut [u8],
    ) -> Result<usize, TransportError> {
        crate::seed_report_id(buf, report_id)?;
        let received = self.device.get_feature_report(buf)?;
        Ok(received)
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    fn close(self: Box<Self>) -> Result<(), TransportError> {
        // HidDevice releases the OS handle on drop
        debug!("closing {}", self.info.device_path);
        Ok(())
    }
}
