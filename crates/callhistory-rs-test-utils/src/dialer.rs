use callhistory_rs_protocol::Dialer;
use parking_lot::Mutex;
use std::sync::Arc;

/// Dialer that remembers every number it was asked to call.
#[derive(Debug, Clone, Default)]
pub struct RecordingDialer {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl Dialer for RecordingDialer {
    fn place_call(&self, number: &str) {
        self.calls.lock().push(number.to_string());
    }
}
