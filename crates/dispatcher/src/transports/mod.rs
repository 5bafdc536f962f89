//! Transport implementations
//!
//! Contains HttpTransport and LogTransport, plus `AnyTransport` for
//! config-selected transports.

mod http;
mod log;

pub use self::http::{HttpTransport, HttpTransportConfig};
pub use self::log::LogTransport;

use bytes::Bytes;
use contracts::{ContractError, Transport, TransportKind, TransportSettings};

use crate::error::DispatcherError;

/// Transport chosen at runtime from configuration
pub enum AnyTransport {
    Http(HttpTransport),
    Log(LogTransport),
}

impl AnyTransport {
    /// Create the transport described by `settings`
    pub fn from_settings(
        name: impl Into<String>,
        settings: &TransportSettings,
    ) -> Result<Self, DispatcherError> {
        let name = name.into();
        match settings.kind {
            TransportKind::Http => {
                let config = HttpTransportConfig::from_settings(settings);
                HttpTransport::new(&name, config)
                    .map(Self::Http)
                    .map_err(|e| DispatcherError::transport_creation(&name, e.to_string()))
            }
            TransportKind::Log => Ok(Self::Log(LogTransport::new(name))),
        }
    }
}

impl Transport for AnyTransport {
    fn name(&self) -> &str {
        match self {
            Self::Http(t) => t.name(),
            Self::Log(t) => t.name(),
        }
    }

    async fn send(&self, payload: Bytes) -> Result<(), ContractError> {
        match self {
            Self::Http(t) => t.send(payload).await,
            Self::Log(t) => t.send(payload).await,
        }
    }
}
