//! Session and connection state machine
//!
//! [`SimSession`] owns the connection lifecycle: a background timer thread
//! retries the engine handshake while disconnected and drives the
//! pump/request poll cycle while connected. Variables added by the host are
//! registered with the engine immediately when connected, or automatically on
//! the next successful connect, so the host never needs to re-add variables
//! after a reconnect.
//!
//! # Thread model
//!
//! One timer thread serves double duty: a longer retry interval while
//! disconnected (avoid hammering a simulator that is not running) and a
//! shorter poll interval while connected (minimize telemetry latency).
//! Engine callbacks are delivered inside the poll's pump and dispatched on
//! that same thread. Registry and state locks are never held across an
//! engine call; the engine mutex itself guards the native handle and is held
//! for the call's duration. A hung engine call is not interruptible; known
//! limitation of the native API.

use crate::catalog::VariableCatalog;
use crate::dispatch::Dispatcher;
use crate::engine::{EngineMessage, SimEngine};
use crate::error::{Error, Result};
use crate::events::EventSink;
use crate::registry::{RegistryEntry, RequestRegistry};
use crate::types::Value;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Session tuning knobs
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Client name presented to the engine during the handshake
    pub client_name: String,
    /// Connect retry cadence while disconnected
    pub retry_interval: Duration,
    /// Pump/request cadence while connected
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_name: "SimvarIO".to_string(),
            retry_interval: Duration::from_secs(2),
            poll_interval: Duration::from_millis(250),
        }
    }
}

struct SessionCore {
    engine: Mutex<Box<dyn SimEngine>>,
    registry: Arc<RequestRegistry>,
    events: Arc<EventSink>,
    catalog: VariableCatalog,
    state: Mutex<ConnectionState>,
    dispatcher: Dispatcher,
    disposed: AtomicBool,
    config: SessionConfig,
}

impl SessionCore {
    fn disposed(&self) -> bool {
        self.disposed.load(Ordering::Relaxed)
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// One timer step: connect attempt while down, poll while up.
    fn tick(&self) {
        if self.disposed() {
            return;
        }
        match self.state() {
            ConnectionState::Disconnected | ConnectionState::Connecting => self.try_connect(),
            ConnectionState::Connected => self.poll(),
        }
    }

    fn try_connect(&self) {
        *self.state.lock() = ConnectionState::Connecting;
        log::debug!("Attempting engine connection as \"{}\"", self.config.client_name);

        let result = self.engine.lock().connect(&self.config.client_name);
        if self.disposed() {
            return;
        }

        match result {
            Ok(()) => {
                *self.state.lock() = ConnectionState::Connected;
                log::info!("Engine connection established");
                self.events.notify_connection(true);

                // Definitions are session-scoped in the engine: everything
                // re-registers for this connection cycle.
                self.registry.set_all_unregistered();
                if self.register_all() {
                    self.request_all();
                }
            }
            Err(e) => {
                *self.state.lock() = ConnectionState::Disconnected;
                log::warn!("Engine connect failed (will retry): {e}");
            }
        }
    }

    /// Register every entry not yet known to the engine in this cycle.
    /// Returns false when a failure downgraded the session to disconnected.
    fn register_all(&self) -> bool {
        for entry in self.registry.all() {
            if entry.registered {
                continue;
            }
            if !self.register_entry(&entry) {
                return false;
            }
        }
        true
    }

    fn register_entry(&self, entry: &RegistryEntry) -> bool {
        log::info!(
            "Registering {} ({} definition {}, request {})",
            entry.name,
            entry.wire_type,
            entry.definition_id,
            entry.request_id
        );
        let result = self.engine.lock().define_variable(
            entry.definition_id,
            &entry.name,
            &entry.unit,
            entry.wire_type,
        );
        if self.disposed() {
            return false;
        }
        match result {
            Ok(()) => {
                self.registry.mark_registered(&entry.name);
                true
            }
            Err(e) => {
                log::warn!("Failed to register {}: {}", entry.name, e);
                self.transition_disconnected("definition registration failed");
                false
            }
        }
    }

    /// Re-issue one data request for every registered entry.
    fn request_all(&self) {
        for entry in self.registry.all() {
            if !entry.registered {
                continue;
            }
            let result = self
                .engine
                .lock()
                .request_data(entry.request_id, entry.definition_id);
            if self.disposed() {
                return;
            }
            if let Err(e) = result {
                log::warn!("Data request for {} failed: {}", entry.name, e);
                self.transition_disconnected("data request failed");
                return;
            }
        }
    }

    /// Pump pending engine callbacks, then re-issue outstanding requests.
    fn poll(&self) {
        let pumped = self.engine.lock().pump_messages();
        if self.disposed() {
            return;
        }

        let messages = match pumped {
            Ok(messages) => messages,
            Err(e) => {
                log::warn!("Message pump failed: {e}");
                self.transition_disconnected("message pump failed");
                return;
            }
        };

        for message in messages {
            if self.disposed() {
                return;
            }
            match message {
                EngineMessage::Open => {
                    log::debug!("Engine handshake confirmed");
                    if !self.register_all() {
                        return;
                    }
                }
                EngineMessage::Quit => {
                    log::info!("Engine reported quit");
                    self.transition_disconnected("engine quit");
                    return;
                }
                EngineMessage::Exception(code) => {
                    log::warn!("Engine exception {code}");
                    self.transition_disconnected("engine exception");
                    return;
                }
                EngineMessage::Data { request_id, payload } => {
                    self.dispatcher.on_native_data(request_id, &payload);
                }
            }
        }

        self.request_all();
    }

    /// Downgrade to disconnected: release the handle, clear session-scoped
    /// entry state, notify the host. No-op if already disconnected.
    fn transition_disconnected(&self, reason: &str) {
        {
            let mut state = self.state.lock();
            if *state == ConnectionState::Disconnected {
                return;
            }
            *state = ConnectionState::Disconnected;
        }
        log::warn!("Engine disconnected: {reason}");

        self.engine.lock().disconnect();
        self.registry.clear_all_values();
        self.registry.set_all_unregistered();
        self.events.notify_connection(false);
    }

    fn add_variable(&self, name: &str) -> Result<()> {
        let descriptor = self
            .catalog
            .resolve(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))?;
        let entry = self.registry.register(&descriptor)?;
        log::info!(
            "Added variable {} (definition {}, request {})",
            entry.name,
            entry.definition_id,
            entry.request_id
        );

        // While connected, register with the engine right away so the entry
        // joins the next poll. Engine failures downgrade to disconnected and
        // leave the entry pending; the add itself has already succeeded.
        if self.state() == ConnectionState::Connected && !entry.registered && self.register_entry(&entry) {
            let result = self
                .engine
                .lock()
                .request_data(entry.request_id, entry.definition_id);
            if self.disposed() {
                return Ok(());
            }
            if let Err(e) = result {
                log::warn!("Initial data request for {} failed: {}", entry.name, e);
                self.transition_disconnected("data request failed");
            }
        }
        Ok(())
    }
}

/// Connection to the simulator engine with a named-variable telemetry feed.
///
/// Construct with [`SimSession::new`], subscribe handlers, pre-register
/// variables, then call [`SimSession::start`] to launch the timer thread.
/// Dropping the session stops the timer deterministically (no handler fires
/// after drop returns) and releases the engine handle.
///
/// # Examples
///
/// ```
/// use simvar_io::{MockEngine, SessionConfig, SimSession, VariableCatalog};
///
/// # fn main() -> simvar_io::Result<()> {
/// let engine = MockEngine::new();
/// let mut session = SimSession::new(
///     Box::new(engine),
///     VariableCatalog::builtin(),
///     SessionConfig::default(),
/// );
///
/// session.on_data(|name, value| {
///     println!("{name} = {value}");
/// });
///
/// session.add_variable("PLANE ALTITUDE")?;
/// session.start();
/// # Ok(())
/// # }
/// ```
pub struct SimSession {
    core: Arc<SessionCore>,
    timer_thread: Option<JoinHandle<()>>,
}

impl SimSession {
    /// Create a session over an engine. The timer does not run until
    /// [`SimSession::start`].
    pub fn new(engine: Box<dyn SimEngine>, catalog: VariableCatalog, config: SessionConfig) -> Self {
        let registry = Arc::new(RequestRegistry::new());
        let events = Arc::new(EventSink::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registry), Arc::clone(&events));

        let core = Arc::new(SessionCore {
            engine: Mutex::new(engine),
            registry,
            events,
            catalog,
            state: Mutex::new(ConnectionState::Disconnected),
            dispatcher,
            disposed: AtomicBool::new(false),
            config,
        });

        Self {
            core,
            timer_thread: None,
        }
    }

    /// Launch the background timer thread. Idempotent.
    pub fn start(&mut self) {
        if self.timer_thread.is_some() {
            return;
        }

        let core = Arc::clone(&self.core);
        let handle = thread::Builder::new()
            .name("simvar-session".to_string())
            .spawn(move || {
                log::info!(
                    "Session timer started (retry {:?}, poll {:?})",
                    core.config.retry_interval,
                    core.config.poll_interval
                );
                while !core.disposed() {
                    core.tick();
                    let interval = match core.state() {
                        ConnectionState::Connected => core.config.poll_interval,
                        _ => core.config.retry_interval,
                    };
                    sleep_interruptible(&core, interval);
                }
                log::info!("Session timer stopped");
            })
            .expect("Failed to spawn session timer thread");

        self.timer_thread = Some(handle);
    }

    /// Resolve a variable through the catalog and track it.
    ///
    /// Returns [`Error::UnknownVariable`] on a catalog miss and
    /// [`Error::CapacityExceeded`] when the id pools are exhausted. Adding a
    /// name that is already tracked is a no-op returning `Ok`.
    pub fn add_variable(&self, name: &str) -> Result<()> {
        self.core.add_variable(name)
    }

    /// Subscribe to connection status transitions
    pub fn on_connection_change<F>(&self, handler: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.core.events.on_connection_change(handler);
    }

    /// Subscribe to named data changes
    pub fn on_data<F>(&self, handler: F)
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.core.events.on_data(handler);
    }

    /// Current connection state
    pub fn connection_state(&self) -> ConnectionState {
        self.core.state()
    }

    /// Whether the session currently has a live engine connection
    pub fn is_connected(&self) -> bool {
        self.core.state() == ConnectionState::Connected
    }

    /// Last decoded value for a tracked variable, if any
    pub fn last_value(&self, name: &str) -> Option<Value> {
        self.core.registry.lookup_by_name(name)?.last_value
    }

    /// Snapshot of every tracked variable
    pub fn variables(&self) -> Vec<RegistryEntry> {
        self.core.registry.all()
    }

    #[cfg(test)]
    pub(crate) fn tick(&self) {
        self.core.tick();
    }
}

impl Drop for SimSession {
    fn drop(&mut self) {
        log::info!("Session shutting down");
        self.core.disposed.store(true, Ordering::Relaxed);

        if let Some(handle) = self.timer_thread.take() {
            if let Err(e) = handle.join() {
                log::error!("Session timer thread panicked: {e:?}");
            }
        }

        self.core.engine.lock().disconnect();
        log::info!("Session stopped");
    }
}

/// Sleep in short slices so a dispose during a long retry interval does not
/// delay drop by the full interval.
fn sleep_interruptible(core: &SessionCore, interval: Duration) {
    let deadline = Instant::now() + interval;
    while !core.disposed() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining.min(Duration::from_millis(20)));
    }
}
