//! Mock engine for testing and hardware-free demos

use super::{EngineMessage, SimEngine};
use crate::error::{Error, Result};
use crate::types::WireType;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Scriptable stand-in for the native simulator engine.
///
/// Cloning shares the underlying state, so a test (or the demo feed thread)
/// can keep a handle while the session owns the boxed engine: inject
/// messages, flip failure modes, and inspect what the session defined and
/// requested.
#[derive(Clone, Default)]
pub struct MockEngine {
    inner: Arc<Mutex<MockEngineInner>>,
}

#[derive(Default)]
struct MockEngineInner {
    connected: bool,
    fail_connect: bool,
    fail_define: bool,
    fail_request: bool,
    fail_pump: bool,
    client_name: Option<String>,
    connect_attempts: u32,
    defined: Vec<(u32, String, String, WireType)>,
    requested: Vec<(u32, u32)>,
    pending: VecDeque<EngineMessage>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // === Scripting ===

    /// Make subsequent connect attempts fail
    pub fn set_fail_connect(&self, fail: bool) {
        self.inner.lock().fail_connect = fail;
    }

    /// Make subsequent definition registrations fail
    pub fn set_fail_define(&self, fail: bool) {
        self.inner.lock().fail_define = fail;
    }

    /// Make subsequent data requests fail
    pub fn set_fail_request(&self, fail: bool) {
        self.inner.lock().fail_request = fail;
    }

    /// Make the next pump fail (detected failure while pumping)
    pub fn set_fail_pump(&self, fail: bool) {
        self.inner.lock().fail_pump = fail;
    }

    /// Queue a message for the next pump
    pub fn inject(&self, message: EngineMessage) {
        self.inner.lock().pending.push_back(message);
    }

    /// Queue a data callback with a raw payload
    pub fn inject_data(&self, request_id: u32, payload: &[u8]) {
        self.inject(EngineMessage::Data {
            request_id,
            payload: payload.to_vec(),
        });
    }

    /// Queue a data callback carrying a little-endian f64 payload
    pub fn inject_f64(&self, request_id: u32, value: f64) {
        self.inject_data(request_id, &value.to_le_bytes());
    }

    /// Queue a data callback carrying a little-endian i32 payload
    pub fn inject_i32(&self, request_id: u32, value: i32) {
        self.inject_data(request_id, &value.to_le_bytes());
    }

    /// Queue a data callback carrying a NUL-padded fixed-width string payload
    pub fn inject_string(&self, request_id: u32, wire_type: WireType, text: &str) {
        let mut payload = vec![0u8; wire_type.payload_len()];
        let bytes = text.as_bytes();
        let len = bytes.len().min(payload.len());
        payload[..len].copy_from_slice(&bytes[..len]);
        self.inject_data(request_id, &payload);
    }

    // === Inspection ===

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    pub fn connect_attempts(&self) -> u32 {
        self.inner.lock().connect_attempts
    }

    pub fn client_name(&self) -> Option<String> {
        self.inner.lock().client_name.clone()
    }

    /// Definitions registered by the session: (definition id, name, unit, wire type)
    pub fn defined(&self) -> Vec<(u32, String, String, WireType)> {
        self.inner.lock().defined.clone()
    }

    /// Data requests issued by the session: (request id, definition id)
    pub fn requested(&self) -> Vec<(u32, u32)> {
        self.inner.lock().requested.clone()
    }

    /// Forget recorded data requests (to observe the next poll in isolation)
    pub fn clear_requested(&self) {
        self.inner.lock().requested.clear();
    }

    /// Forget recorded definitions
    pub fn clear_defined(&self) {
        self.inner.lock().defined.clear();
    }
}

impl SimEngine for MockEngine {
    fn connect(&mut self, client_name: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.connect_attempts += 1;
        if inner.fail_connect {
            return Err(Error::NativeConnect("simulator not running".to_string()));
        }
        inner.connected = true;
        inner.client_name = Some(client_name.to_string());
        inner.pending.push_back(EngineMessage::Open);
        Ok(())
    }

    fn disconnect(&mut self) {
        let mut inner = self.inner.lock();
        inner.connected = false;
        inner.pending.clear();
    }

    fn define_variable(
        &mut self,
        definition_id: u32,
        name: &str,
        unit: &str,
        wire_type: WireType,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.connected {
            return Err(Error::NativeCall("define_variable while disconnected".to_string()));
        }
        if inner.fail_define {
            return Err(Error::NativeCall("define_variable rejected".to_string()));
        }
        inner
            .defined
            .push((definition_id, name.to_string(), unit.to_string(), wire_type));
        Ok(())
    }

    fn request_data(&mut self, request_id: u32, definition_id: u32) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.connected {
            return Err(Error::NativeCall("request_data while disconnected".to_string()));
        }
        if inner.fail_request {
            return Err(Error::NativeCall("request_data rejected".to_string()));
        }
        inner.requested.push((request_id, definition_id));
        Ok(())
    }

    fn pump_messages(&mut self) -> Result<Vec<EngineMessage>> {
        let mut inner = self.inner.lock();
        if inner.fail_pump {
            return Err(Error::NativeCall("pump failed".to_string()));
        }
        if !inner.connected {
            return Ok(Vec::new());
        }
        Ok(inner.pending.drain(..).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_records_name_and_emits_open() {
        let mut engine = MockEngine::new();
        engine.connect("SimListener").unwrap();
        assert!(engine.is_connected());
        assert_eq!(engine.client_name().as_deref(), Some("SimListener"));
        assert_eq!(engine.pump_messages().unwrap(), vec![EngineMessage::Open]);
    }

    #[test]
    fn test_calls_fail_while_disconnected() {
        let mut engine = MockEngine::new();
        assert!(engine.define_variable(0, "PLANE ALTITUDE", "feet", WireType::Float64).is_err());
        assert!(engine.request_data(0, 0).is_err());
    }

    #[test]
    fn test_fail_connect_counts_attempts() {
        let mut engine = MockEngine::new();
        engine.set_fail_connect(true);
        assert!(engine.connect("x").is_err());
        assert!(engine.connect("x").is_err());
        assert_eq!(engine.connect_attempts(), 2);
        assert!(!engine.is_connected());
    }

    #[test]
    fn test_inject_string_pads_to_width() {
        let mut engine = MockEngine::new();
        engine.connect("x").unwrap();
        engine.inject_string(7, WireType::String256, "A320");
        let messages = engine.pump_messages().unwrap();
        // Open from connect, then the data message
        match &messages[1] {
            EngineMessage::Data { request_id, payload } => {
                assert_eq!(*request_id, 7);
                assert_eq!(payload.len(), 256);
                assert_eq!(&payload[..4], b"A320");
                assert!(payload[4..].iter().all(|&b| b == 0));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
