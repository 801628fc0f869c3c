//! Framing tests for the two-report protocol, driven through a mock
//! transport that records every report sent and scripts read responses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hidburner::{
    Backend, Burner, BurnerError, FeatureTransport, ReportLayout, ReportSlot,
    TransportDeviceInfo, TransportError,
};

/// Small layout so the two-report boundary is easy to exercise: C1 = 7
/// (report id 1), C2 = 8 (report id 2).
const TEST_LAYOUT: ReportLayout = ReportLayout {
    first: ReportSlot {
        id: 1,
        payload_len: 7,
    },
    second: ReportSlot {
        id: 2,
        payload_len: 8,
    },
};

#[derive(Default)]
struct MockTransport {
    /// Every buffer passed to send_feature_report, in order
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    /// Scripted read payloads (without the id byte), keyed by report id
    responses: HashMap<u8, Vec<u8>>,
    /// Fail the Nth send (0-based)
    fail_send_at: Option<usize>,
    /// Fail every get
    fail_get: bool,
}

impl MockTransport {
    fn new() -> (Box<Self>, Arc<Mutex<Vec<Vec<u8>>>>) {
        let mock = Box::new(Self::default());
        let sent = Arc::clone(&mock.sent);
        (mock, sent)
    }

    fn info() -> TransportDeviceInfo {
        TransportDeviceInfo {
            vendor_id: 0x16C0,
            product_id: 0x05DF,
            backend: Backend::PlatformHid,
            device_path: "mock".into(),
            serial: None,
            manufacturer: Some("obdev.at".into()),
            product: Some("HIDBurner".into()),
        }
    }
}

impl FeatureTransport for MockTransport {
    fn send_feature_report(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        let mut sent = self.sent.lock().unwrap();
        if self.fail_send_at == Some(sent.len()) {
            return Err(TransportError::Io("injected send failure".into()));
        }
        sent.push(buf.to_vec());
        Ok(())
    }

    fn get_feature_report(
        &mut self,
        report_id: u8,
        buf: &mut [u8],
    ) -> Result<usize, TransportError> {
        if self.fail_get {
            return Err(TransportError::Io("injected read failure".into()));
        }
        buf[0] = report_id;
        let payload = self.responses.get(&report_id).cloned().unwrap_or_default();
        let n = payload.len().min(buf.len() - 1);
        buf[1..1 + n].copy_from_slice(&payload[..n]);
        Ok(1 + n)
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        // The mock never changes identity; leak one static copy.
        static INFO: std::sync::OnceLock<TransportDeviceInfo> = std::sync::OnceLock::new();
        INFO.get_or_init(MockTransport::info)
    }

    fn close(self: Box<Self>) -> Result<(), TransportError> {
        Ok(())
    }
}

fn burner_with(mock: Box<MockTransport>) -> Burner {
    Burner::from_transport(mock, TEST_LAYOUT)
}

#[test]
fn small_payload_sends_one_padded_report() {
    let (mock, sent) = MockTransport::new();
    let mut burner = burner_with(mock);

    burner.write_bytes(&[0xDE, 0xAD, 0xBE]).unwrap();

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], vec![1, 0xDE, 0xAD, 0xBE, 0, 0, 0, 0]);
}

#[test]
fn empty_payload_still_sends_first_report() {
    let (mock, sent) = MockTransport::new();
    let mut burner = burner_with(mock);

    burner.write_bytes(&[]).unwrap();

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], vec![1, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn large_payload_splits_in_order_with_padding() {
    let (mock, sent) = MockTransport::new();
    let mut burner = burner_with(mock);

    let payload: Vec<u8> = (1..=10).collect();
    burner.write_bytes(&payload).unwrap();

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], vec![1, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(sent[1], vec![2, 8, 9, 10, 0, 0, 0, 0, 0]);
}

#[test]
fn boundary_payload_of_c1_sends_single_report() {
    let (mock, sent) = MockTransport::new();
    let mut burner = burner_with(mock);

    burner.write_bytes(&[9, 8, 7, 6, 5, 4, 3]).unwrap();

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], vec![1, 9, 8, 7, 6, 5, 4, 3]);
}

#[test]
fn boundary_payload_of_c1_plus_one_spills_one_byte() {
    let (mock, sent) = MockTransport::new();
    let mut burner = burner_with(mock);

    burner.write_bytes(&[9, 8, 7, 6, 5, 4, 3, 0xAA]).unwrap();

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1][0], 2);
    assert_eq!(sent[1][1], 0xAA);
    assert!(sent[1][2..].iter().all(|&b| b == 0));
}

#[test]
fn first_send_failure_short_circuits() {
    let (mut mock, sent) = MockTransport::new();
    mock.fail_send_at = Some(0);
    let mut burner = burner_with(mock);

    let payload: Vec<u8> = (1..=10).collect();
    let err = burner.write_bytes(&payload).unwrap_err();
    assert!(matches!(err, BurnerError::Transport(TransportError::Io(_))));
    assert!(sent.lock().unwrap().is_empty());
}

#[test]
fn second_send_failure_leaves_first_report_applied() {
    let (mut mock, sent) = MockTransport::new();
    mock.fail_send_at = Some(1);
    let mut burner = burner_with(mock);

    let payload: Vec<u8> = (1..=10).collect();
    let err = burner.write_bytes(&payload).unwrap_err();
    assert!(matches!(err, BurnerError::Transport(TransportError::Io(_))));

    // No rollback: the first report went out before the failure
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0][0], 1);
}

#[test]
fn oversized_payload_rejected_before_any_io() {
    let (mock, sent) = MockTransport::new();
    let mut burner = burner_with(mock);

    let payload = vec![0u8; TEST_LAYOUT.max_payload() + 1];
    let err = burner.write_bytes(&payload).unwrap_err();
    assert!(matches!(
        err,
        BurnerError::PayloadTooLarge { len: 16, max: 15 }
    ));
    assert!(sent.lock().unwrap().is_empty());
}

#[test]
fn read_first_strips_id_byte() {
    let (mut mock, _sent) = MockTransport::new();
    mock.responses.insert(1, vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77]);
    let mut burner = burner_with(mock);

    let mut out = [0u8; 7];
    burner.read_first(&mut out).unwrap();
    assert_eq!(out, [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77]);
}

#[test]
fn read_second_strips_id_byte() {
    let (mut mock, _sent) = MockTransport::new();
    mock.responses.insert(2, vec![8, 7, 6, 5, 4, 3, 2, 1]);
    let mut burner = burner_with(mock);

    let mut out = [0u8; 8];
    burner.read_second(&mut out).unwrap();
    assert_eq!(out, [8, 7, 6, 5, 4, 3, 2, 1]);
}

#[test]
fn short_device_response_reads_as_zero_padded() {
    let (mut mock, _sent) = MockTransport::new();
    mock.responses.insert(1, vec![0xAB, 0xCD]);
    let mut burner = burner_with(mock);

    let mut out = [0xFFu8; 7];
    burner.read_first(&mut out).unwrap();
    assert_eq!(out, [0xAB, 0xCD, 0, 0, 0, 0, 0]);
}

#[test]
fn failed_read_leaves_output_untouched() {
    let (mut mock, _sent) = MockTransport::new();
    mock.fail_get = true;
    let mut burner = burner_with(mock);

    let mut out = [0x5Au8; 7];
    let err = burner.read_first(&mut out).unwrap_err();
    assert!(matches!(err, BurnerError::Transport(TransportError::Io(_))));
    assert_eq!(out, [0x5A; 7]);
}

#[test]
fn wrong_buffer_length_rejected_before_any_io() {
    let (mut mock, _sent) = MockTransport::new();
    // Any transport call would fail loudly; the size check must come first
    mock.fail_get = true;
    let mut burner = burner_with(mock);

    let mut out = [0u8; 6];
    let err = burner.read_first(&mut out).unwrap_err();
    assert!(matches!(
        err,
        BurnerError::BufferSize {
            expected: 7,
            actual: 6
        }
    ));
}

#[test]
fn close_consumes_the_burner() {
    let (mock, _sent) = MockTransport::new();
    let burner = burner_with(mock);
    burner.close().unwrap();
}
