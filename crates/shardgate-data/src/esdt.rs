//! Token supply types.

use serde::{Deserialize, Serialize};

use crate::envelope::ApiResponse;

/// `data` payload of `/network/esdt/supply/{token}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EsdtSupplyData {
    /// Total supply, a base-10 string.
    #[serde(default)]
    pub supply: String,
}

/// Envelope returned for a token supply query.
pub type EsdtSupplyResponse = ApiResponse<EsdtSupplyData>;
