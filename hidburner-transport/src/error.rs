//! Transport error types

use thiserror::Error;

/// Errors that can occur while opening a device or moving feature reports.
///
/// The variants are kept distinct all the way up to callers: `NotFound` and
/// `AccessDenied` describe open-time conditions that may resolve on retry or
/// reconnection, while `Io` during an active session usually means the handle
/// has to be re-opened.
#[derive(Error, Debug)]
pub enum TransportError {
    /// No device matched the VID/PID and name filters
    #[error("device not found: {0}")]
    NotFound(String),

    /// Device is present but could not be opened (permissions, or claimed
    /// by another driver)
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A control transfer or required string read failed
    #[error("I/O error: {0}")]
    Io(String),

    /// The transfer did not complete within the transport timeout
    #[error("transfer timed out")]
    Timeout,
}

impl From<hidapi::HidError> for TransportError {
    fn from(e: hidapi::HidError) -> Self {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("EPERM") {
            TransportError::AccessDenied(msg)
        } else {
            TransportError::Io(msg)
        }
    }
}

impl From<rusb::Error> for TransportError {
    fn from(e: rusb::Error) -> Self {
        match e {
            rusb::Error::Access => TransportError::AccessDenied(e.to_string()),
            rusb::Error::NoDevice | rusb::Error::NotFound => {
                TransportError::NotFound(e.to_string())
            }
            rusb::Error::Timeout => TransportError::Timeout,
            other => TransportError::Io(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rusb_access_maps_to_access_denied() {
        assert!(matches!(
            TransportError::from(rusb::Error::Access),
            TransportError::AccessDenied(_)
        ));
    }

    #[test]
    fn rusb_no_device_maps_to_not_found() {
        assert!(matches!(
            TransportError::from(rusb::Error::NoDevice),
            TransportError::NotFound(_)
        ));
        assert!(matches!(
            TransportError::from(rusb::Error::NotFound),
            TransportError::NotFound(_)
        ));
    }

    #[test]
    fn rusb_timeout_maps_to_timeout() {
        assert!(matches!(
            TransportError::from(rusb::Error::Timeout),
            TransportError::Timeout
        ));
    }

    #[test]
    fn rusb_pipe_maps_to_io() {
        assert!(matches!(
            TransportError::from(rusb::Error::Pipe),
            TransportError::Io(_)
        ));
    }
}
