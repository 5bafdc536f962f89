//! Transport trait - Dispatcher output interface
//!
//! Defines the abstract interface for delivering one serialized document.

use bytes::Bytes;

use crate::ContractError;

/// Outbound submission trait
///
/// One call equals one request against the remote service. Timeouts and
/// status interpretation belong to the implementation.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Submit one serialized document
    ///
    /// # Errors
    /// Returns `ContractError::Transport` on I/O failure, interruption, or a
    /// response the implementation treats as unsuccessful.
    async fn send(&self, payload: Bytes) -> Result<(), ContractError>;
}
