//! Payload encoders - document to wire bytes

use bytes::Bytes;
use serde::Serialize;

use contracts::ContractError;

/// Serializer collaborator
pub trait PayloadEncoder<D>: Send + Sync {
    /// Encode one document
    ///
    /// # Errors
    /// Returns `ContractError::Encoding` when the document cannot be serialized.
    fn encode(&self, document: &D) -> Result<Bytes, ContractError>;
}

/// JSON encoder (serde_json)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl<D: Serialize> PayloadEncoder<D> for JsonEncoder {
    fn encode(&self, document: &D) -> Result<Bytes, ContractError> {
        serde_json::to_vec(document)
            .map(Bytes::from)
            .map_err(|e| ContractError::encoding(format!("json error: {e}")))
    }
}
