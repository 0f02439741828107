//! Hasher implementations.

use std::sync::Arc;

use sha2::Digest;

use crate::errors::ProcessError;
use crate::ports::Hasher;

/// Keccak-256 hasher, the fleet default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256Hasher;

impl Hasher for Keccak256Hasher {
    fn compute(&self, data: &[u8]) -> Vec<u8> {
        sha3::Keccak256::digest(data).to_vec()
    }
}

/// SHA-256 hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn compute(&self, data: &[u8]) -> Vec<u8> {
        sha2::Sha256::digest(data).to_vec()
    }
}

/// Resolve a configured hasher identifier.
pub fn hasher_from_id(id: &str) -> Result<Arc<dyn Hasher>, ProcessError> {
    match id {
        "keccak" => Ok(Arc::new(Keccak256Hasher)),
        "sha256" => Ok(Arc::new(Sha256Hasher)),
        other => Err(ProcessError::Setup(format!(
            "unknown hasher id: {other}"
        ))),
    }
}
