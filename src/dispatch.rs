//! Callback dispatcher
//!
//! Turns untyped, out-of-order engine data callbacks into typed, named
//! change events: correlate the request id to its registry entry, decode the
//! payload per the entry's wire type, store the value, notify the host.
//! Messages are processed strictly in delivery order on a single dispatch
//! path; no reordering or batching happens here.

use crate::events::EventSink;
use crate::registry::RequestRegistry;
use crate::types::decode;
use std::sync::Arc;

/// Decodes inbound data callbacks against the registry
pub struct Dispatcher {
    registry: Arc<RequestRegistry>,
    events: Arc<EventSink>,
}

impl Dispatcher {
    pub fn new(registry: Arc<RequestRegistry>, events: Arc<EventSink>) -> Self {
        Self { registry, events }
    }

    /// Handle one inbound data callback.
    ///
    /// A request id with no live entry is expected during reconnect races;
    /// the message is dropped at debug level. Decode failures are logged per
    /// entry and never abort processing of other pending messages.
    pub fn on_native_data(&self, request_id: u32, payload: &[u8]) {
        let Some(entry) = self.registry.lookup_by_request_id(request_id) else {
            log::debug!("Dropping data for stale request id {request_id}");
            return;
        };

        match decode(entry.wire_type, payload) {
            Ok(value) => {
                // The entry can vanish between lookup and update (catalog
                // reset); only notify when the store actually happened.
                if let Some(updated) = self.registry.update_value(request_id, value.clone()) {
                    log::debug!("Received {} = {} (request {})", updated.name, value, request_id);
                    self.events.notify_data(&updated.name, &value);
                }
            }
            Err(e) => {
                log::warn!("Failed to decode payload for {}: {}", entry.name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VariableDescriptor;
    use crate::types::{Value, WireType};
    use crossbeam_channel::unbounded;

    fn setup(wire_type: WireType) -> (Dispatcher, Arc<RequestRegistry>, crossbeam_channel::Receiver<(String, Value)>) {
        let registry = Arc::new(RequestRegistry::new());
        let events = Arc::new(EventSink::new());
        registry
            .register(&VariableDescriptor {
                name: "PLANE ALTITUDE".to_string(),
                unit: "feet".to_string(),
                wire_type,
            })
            .unwrap();

        let (tx, rx) = unbounded();
        events.on_data(move |name, value| {
            tx.send((name.to_string(), value.clone())).unwrap();
        });

        let dispatcher = Dispatcher::new(Arc::clone(&registry), events);
        (dispatcher, registry, rx)
    }

    #[test]
    fn test_data_updates_entry_and_notifies_once() {
        let (dispatcher, registry, rx) = setup(WireType::Float64);
        dispatcher.on_native_data(0, &1234.5f64.to_le_bytes());

        assert_eq!(
            rx.try_recv().unwrap(),
            ("PLANE ALTITUDE".to_string(), Value::Float(1234.5))
        );
        assert!(rx.try_recv().is_err());

        let entry = registry.lookup_by_request_id(0).unwrap();
        assert_eq!(entry.last_value, Some(Value::Float(1234.5)));
    }

    #[test]
    fn test_stale_request_id_is_dropped() {
        let (dispatcher, registry, rx) = setup(WireType::Float64);
        dispatcher.on_native_data(42, &1.0f64.to_le_bytes());

        assert!(rx.try_recv().is_err());
        let entry = registry.lookup_by_request_id(0).unwrap();
        assert_eq!(entry.last_value, None);
    }

    #[test]
    fn test_decode_failure_drops_message_only() {
        let (dispatcher, registry, rx) = setup(WireType::Float64);
        // Truncated payload for a Float64 slot
        dispatcher.on_native_data(0, &[0u8; 3]);
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.lookup_by_request_id(0).unwrap().last_value, None);

        // Later well-formed messages still process
        dispatcher.on_native_data(0, &7.0f64.to_le_bytes());
        assert_eq!(rx.try_recv().unwrap().1, Value::Float(7.0));
    }

    #[test]
    fn test_string_payload_decodes_trimmed() {
        let (dispatcher, _registry, rx) = setup(WireType::String256);
        let mut payload = vec![0u8; 256];
        payload[..4].copy_from_slice(b"A320");
        dispatcher.on_native_data(0, &payload);
        assert_eq!(rx.try_recv().unwrap().1, Value::Text("A320".to_string()));
    }
}
