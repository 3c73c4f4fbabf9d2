//! Engine boundary
//!
//! The simulator engine is an externally-owned process reachable only through
//! an asynchronous, message-based native API. This module re-expresses that
//! API as a synchronous trait the session drives from its timer tick: calls
//! run to completion on the caller's thread, and inbound callbacks arrive as
//! a bounded batch from [`SimEngine::pump_messages`]. This keeps ordering and
//! lifetime explicit without tying the core to any particular native
//! message-loop integration.

use crate::error::Result;
use crate::types::WireType;

mod mock;
pub use mock::MockEngine;

/// Inbound engine callback, delivered in native order by the pump
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Handshake confirmation after a successful connect
    Open,
    /// The simulator is shutting down; the connection is gone
    Quit,
    /// Engine-side error report carrying the native exception code
    Exception(u32),
    /// Response to a data request, correlated by request id
    Data { request_id: u32, payload: Vec<u8> },
}

/// Native simulator engine interface.
///
/// Implementations own the native connection handle. Calls may block; the
/// session never holds registry or state locks while invoking them. A hung
/// call is not interruptible; known limitation of the native API.
pub trait SimEngine: Send {
    /// Open a connection under the given client name
    fn connect(&mut self, client_name: &str) -> Result<()>;

    /// Release the native connection handle. Safe to call when already
    /// disconnected.
    fn disconnect(&mut self);

    /// Register a wire-level variable definition for this session
    fn define_variable(
        &mut self,
        definition_id: u32,
        name: &str,
        unit: &str,
        wire_type: WireType,
    ) -> Result<()>;

    /// Issue one asynchronous data pull for a registered definition
    fn request_data(&mut self, request_id: u32, definition_id: u32) -> Result<()>;

    /// Deliver pending callbacks, in native order, without blocking for more
    fn pump_messages(&mut self) -> Result<Vec<EngineMessage>>;
}
