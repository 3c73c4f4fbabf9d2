//! Error types for SimvarIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// SimvarIO error types
///
/// `UnknownVariable` and `CapacityExceeded` are caller errors returned from
/// host-facing calls. The `Native*` variants originate at the engine boundary
/// and never propagate past the session; they are converted into state
/// transitions and log events.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Variable name not present in the catalog
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// Id pool exhausted
    #[error("Capacity exceeded: {space} id pool exhausted at {capacity}")]
    CapacityExceeded {
        /// Which id space ran out ("definition" or "request")
        space: &'static str,
        /// Pool capacity at the time of exhaustion
        capacity: u32,
    },

    /// Engine handshake failed (transient, retried on the timer)
    #[error("Engine connect failed: {0}")]
    NativeConnect(String),

    /// Engine call failed after connect (registration, data request, pump)
    #[error("Engine call failed: {0}")]
    NativeCall(String),

    /// Malformed or unexpected payload shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}
