//! Canonical serialization for hashing.

use std::sync::Arc;

use serde_json::Value;

use crate::errors::ProcessError;
use crate::ports::Marshalizer;

/// JSON marshalizer. `serde_json` keeps object keys sorted, so the output
/// is a canonical byte form of the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarshalizer;

impl Marshalizer for JsonMarshalizer {
    fn marshal(&self, value: &Value) -> Result<Vec<u8>, ProcessError> {
        serde_json::to_vec(value).map_err(|e| ProcessError::ComputeTransactionHash(e.to_string()))
    }
}

/// Resolve a configured marshalizer identifier.
pub fn marshalizer_from_id(id: &str) -> Result<Arc<dyn Marshalizer>, ProcessError> {
    match id {
        "json" => Ok(Arc::new(JsonMarshalizer)),
        other => Err(ProcessError::Setup(format!(
            "unknown marshalizer id: {other}"
        ))),
    }
}
