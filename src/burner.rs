//! Frame splitter for the two-report bootloader protocol.
//!
//! The bootloader exchanges everything through two fixed-size feature
//! reports. A logical payload is written as the first report (zero-padded),
//! followed by the second report only when the payload overflows the first.
//! Reads fetch one report at a time and strip the echoed report-id byte.

use thiserror::Error;
use tracing::{debug, trace};

use hidburner_transport::{
    Backend, DeviceFilter, FeatureTransport, TransportDeviceInfo, TransportError,
};

use crate::reports::{ReportLayout, ReportSlot, DEFAULT_LAYOUT};

/// Errors from burner operations
#[derive(Error, Debug)]
pub enum BurnerError {
    /// Transport layer error, kind preserved for the caller
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Payload does not fit into the two reports
    #[error("payload of {len} bytes exceeds the {max}-byte report capacity")]
    PayloadTooLarge { len: usize, max: usize },

    /// Output buffer length does not match the report's payload capacity
    #[error("output buffer holds {actual} bytes, report payload is {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Connection to one programmer device.
///
/// Owns the transport handle exclusively; the handle is released when the
/// burner is closed or dropped. Not safe for concurrent use.
pub struct Burner {
    transport: Box<dyn FeatureTransport>,
    layout: ReportLayout,
}

impl Burner {
    /// Open the stock programmer through the platform's default backend.
    pub fn open() -> Result<Self, BurnerError> {
        let transport = hidburner_transport::open(&crate::reports::default_filter())?;
        Ok(Self::from_transport(transport, DEFAULT_LAYOUT))
    }

    /// Open with an explicit filter, backend, and report layout.
    pub fn open_with(
        filter: &DeviceFilter,
        backend: Backend,
        layout: ReportLayout,
    ) -> Result<Self, BurnerError> {
        let transport = hidburner_transport::open_with_backend(filter, backend)?;
        Ok(Self::from_transport(transport, layout))
    }

    /// Wrap an already-open transport.
    pub fn from_transport(transport: Box<dyn FeatureTransport>, layout: ReportLayout) -> Self {
        debug!(
            "burner on {} (first: id {} / {} bytes, second: id {} / {} bytes)",
            transport.device_info().device_path,
            layout.first.id,
            layout.first.payload_len,
            layout.second.id,
            layout.second.payload_len
        );
        Self { transport, layout }
    }

    /// Identity of the opened device.
    pub fn device_info(&self) -> &TransportDeviceInfo {
        self.transport.device_info()
    }

    /// Report layout in use.
    pub fn layout(&self) -> ReportLayout {
        self.layout
    }

    /// Write a payload of up to C1+C2 bytes as one or two feature reports.
    ///
    /// The first report carries `data[..min(len, C1)]` zero-padded to C1.
    /// If the payload is longer than C1, a second report carries the rest
    /// zero-padded to C2. The reports are sent in order, first then second.
    ///
    /// A failure on the first report is terminal and the second is never
    /// attempted. A failure on the second report is also terminal, but the
    /// first report has already been applied by the device and is not
    /// rolled back; callers recover by re-sending the whole payload.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), BurnerError> {
        let c1 = self.layout.first.payload_len;
        let max = self.layout.max_payload();
        if data.len() > max {
            return Err(BurnerError::PayloadTooLarge {
                len: data.len(),
                max,
            });
        }

        trace!("-- W  {:02X?}", data);

        let head = data.len().min(c1);
        let mut report = vec![0u8; c1 + 1];
        report[0] = self.layout.first.id;
        report[1..1 + head].copy_from_slice(&data[..head]);
        self.transport.send_feature_report(&report)?;

        if data.len() > c1 {
            let rest = &data[c1..];
            let mut report = vec![0u8; self.layout.second.payload_len + 1];
            report[0] = self.layout.second.id;
            report[1..1 + rest.len()].copy_from_slice(rest);
            self.transport.send_feature_report(&report)?;
        }

        Ok(())
    }

    /// Read the first report's payload. `out` must be exactly C1 bytes and
    /// is only written on success.
    pub fn read_first(&mut self, out: &mut [u8]) -> Result<(), BurnerError> {
        let slot = self.layout.first;
        self.read_report(slot, out)?;
        trace!("-- RF {:02X?}", out);
        Ok(())
    }

    /// Read the second report's payload. `out` must be exactly C2 bytes and
    /// is only written on success.
    pub fn read_second(&mut self, out: &mut [u8]) -> Result<(), BurnerError> {
        let slot = self.layout.second;
        self.read_report(slot, out)?;
        trace!("-- RS {:02X?}", out);
        Ok(())
    }

    fn read_report(&mut self, slot: ReportSlot, out: &mut [u8]) -> Result<(), BurnerError> {
        if out.len() != slot.payload_len {
            return Err(BurnerError::BufferSize {
                expected: slot.payload_len,
                actual: out.len(),
            });
        }
        // Scratch buffer keeps `out` untouched if the transfer fails. A short
        // read leaves the tail zeroed, matching the device's zero padding.
        let mut scratch = vec![0u8; slot.payload_len + 1];
        self.transport.get_feature_report(slot.id, &mut scratch)?;
        out.copy_from_slice(&scratch[1..]);
        Ok(())
    }

    /// Close the connection, releasing the device handle.
    pub fn close(self) -> Result<(), BurnerError> {
        self.transport.close()?;
        Ok(())
    }
}
