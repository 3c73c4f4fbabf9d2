//! SimvarIO - named-variable telemetry bridge for a simulator engine
//!
//! This library maintains a resilient session to an externally-owned
//! simulator engine, tracks a bounded namespace of request/definition ids,
//! and turns the engine's untyped callback stream into a typed, named
//! data-changed event feed.
//!
//! The engine itself is reached through the [`engine::SimEngine`] trait; a
//! scriptable [`engine::MockEngine`] ships for tests and hardware-free runs.

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod events;
pub mod registry;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use catalog::{VariableCatalog, VariableDescriptor};
pub use config::AppConfig;
pub use engine::{EngineMessage, MockEngine, SimEngine};
pub use error::{Error, Result};
pub use registry::{RegistryEntry, RequestRegistry};
pub use session::{ConnectionState, SessionConfig, SimSession};
pub use types::{Value, WireType};
