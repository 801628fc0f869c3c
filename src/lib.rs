//! Host-side interface for HIDBurner programmer devices
//!
//! Frames the bootloader's update/read protocol over two fixed-size HID
//! feature reports, on top of any [`FeatureTransport`] backend from
//! `hidburner-transport`.
//!
//! ```no_run
//! use hidburner::Burner;
//!
//! fn main() -> Result<(), hidburner::BurnerError> {
//!     let mut burner = Burner::open()?;
//!     burner.write_bytes(&[0x01, 0x00, 0x10])?;
//!
//!     let mut status = [0u8; 7];
//!     burner.read_first(&mut status)?;
//!
//!     burner.close()?;
//!     Ok(())
//! }
//! ```

pub mod burner;
pub mod reports;

pub use burner::{Burner, BurnerError};
pub use reports::{default_filter, ReportLayout, ReportSlot, DEFAULT_LAYOUT};

// Re-export the transport surface consumers need to inject their own backend
pub use hidburner_transport::{
    Backend, DeviceFilter, FeatureTransport, TransportDeviceInfo, TransportError,
};
