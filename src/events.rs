//! Event surface
//!
//! The narrow set of notifications exposed to the host: connection status
//! transitions and named data changes. Handlers fire synchronously on
//! whichever thread triggered them (the session timer thread or the engine
//! callback path), so consumers must treat them as potentially concurrent
//! and must not block inside them.

use crate::types::Value;
use parking_lot::Mutex;

type ConnectionHandler = Box<dyn Fn(bool) + Send + Sync>;
type DataHandler = Box<dyn Fn(&str, &Value) + Send + Sync>;

/// Registered host callbacks
#[derive(Default)]
pub struct EventSink {
    connection: Mutex<Vec<ConnectionHandler>>,
    data: Mutex<Vec<DataHandler>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to connection status transitions.
    ///
    /// Fired only on an actual transition, never redundantly.
    pub fn on_connection_change<F>(&self, handler: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.connection.lock().push(Box::new(handler));
    }

    /// Subscribe to data changes.
    ///
    /// Fired once per successfully decoded inbound message, carrying the
    /// entry name and the decoded value.
    pub fn on_data<F>(&self, handler: F)
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.data.lock().push(Box::new(handler));
    }

    pub(crate) fn notify_connection(&self, connected: bool) {
        for handler in self.connection.lock().iter() {
            handler(connected);
        }
    }

    pub(crate) fn notify_data(&self, name: &str, value: &Value) {
        for handler in self.data.lock().iter() {
            handler(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_handlers_receive_notifications() {
        let sink = EventSink::new();
        let (conn_tx, conn_rx) = unbounded();
        let (data_tx, data_rx) = unbounded();

        sink.on_connection_change(move |connected| {
            conn_tx.send(connected).unwrap();
        });
        sink.on_data(move |name, value| {
            data_tx.send((name.to_string(), value.clone())).unwrap();
        });

        sink.notify_connection(true);
        sink.notify_data("PLANE ALTITUDE", &Value::Float(1234.5));

        assert_eq!(conn_rx.try_recv().unwrap(), true);
        assert_eq!(
            data_rx.try_recv().unwrap(),
            ("PLANE ALTITUDE".to_string(), Value::Float(1234.5))
        );
    }

    #[test]
    fn test_multiple_handlers_all_fire() {
        let sink = EventSink::new();
        let (tx, rx) = unbounded();
        for _ in 0..3 {
            let tx = tx.clone();
            sink.on_connection_change(move |c| tx.send(c).unwrap());
        }
        sink.notify_connection(false);
        assert_eq!(rx.try_iter().count(), 3);
    }
}
