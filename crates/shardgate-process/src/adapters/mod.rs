//! Default implementations of the capability seams.

mod hashing;
mod logs;
mod marshal;
mod pubkey;

pub use hashing::{hasher_from_id, Keccak256Hasher, Sha256Hasher};
pub use logs::EventLogsMerger;
pub use marshal::{marshalizer_from_id, JsonMarshalizer};
pub use pubkey::Bech32PubkeyConverter;
