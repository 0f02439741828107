//! Address-to-shard arithmetic.
//!
//! The fleet assigns an account to a shard by masking the last byte of its
//! decoded public key. Two masks are derived from the shard count: the wide
//! one covers the next power of two, and when it lands past the configured
//! count the narrow one is used instead. System smart contracts live on the
//! metachain regardless of their last byte.

use shardgate_data::{ShardId, METACHAIN_SHARD_ID};

use crate::errors::ProcessError;

/// Leading zero bytes identifying a smart-contract address.
const SC_ADDRESS_PREFIX_LEN: usize = 8;

/// VM-type markers of contracts hosted by the metachain itself.
const METACHAIN_VM_TYPES: [[u8; 2]; 2] = [[0x00, 0x00], [0x00, 0x01]];

/// Pure address → shard mapping.
#[derive(Debug, Clone, Copy)]
pub struct ShardCoordinator {
    num_shards: u32,
    mask_high: u32,
    mask_low: u32,
}

impl ShardCoordinator {
    /// Coordinator for `num_shards` worker shards.
    pub fn new(num_shards: u32) -> Result<Self, ProcessError> {
        if num_shards == 0 {
            return Err(ProcessError::InvalidShardCount);
        }

        let (mask_high, mask_low) = compute_masks(num_shards);
        Ok(Self {
            num_shards,
            mask_high,
            mask_low,
        })
    }

    /// Number of worker shards.
    pub fn num_shards(&self) -> u32 {
        self.num_shards
    }

    /// Shard owning the account with the given decoded address.
    pub fn compute_shard_id(&self, address: &[u8]) -> Result<ShardId, ProcessError> {
        let last = *address.last().ok_or(ProcessError::InvalidAddress)?;

        if is_metachain_system_contract(address) {
            return Ok(METACHAIN_SHARD_ID);
        }

        let mut shard = u32::from(last) & self.mask_high;
        if shard >= self.num_shards {
            shard = u32::from(last) & self.mask_low;
        }
        Ok(shard)
    }
}

fn compute_masks(num_shards: u32) -> (u32, u32) {
    if num_shards == 1 {
        return (0, 0);
    }

    let bits = 32 - (num_shards - 1).leading_zeros();
    ((1 << bits) - 1, (1 << (bits - 1)) - 1)
}

fn is_metachain_system_contract(address: &[u8]) -> bool {
    if address.len() < SC_ADDRESS_PREFIX_LEN + 2 {
        return false;
    }
    let prefix_is_zero = address[..SC_ADDRESS_PREFIX_LEN].iter().all(|b| *b == 0);
    let vm_type = [address[SC_ADDRESS_PREFIX_LEN], address[SC_ADDRESS_PREFIX_LEN + 1]];
    prefix_is_zero && METACHAIN_VM_TYPES.contains(&vm_type)
}
