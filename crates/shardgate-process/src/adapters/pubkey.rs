//! Bech32 account address codec.

use bech32::{FromBase32, ToBase32, Variant};

use crate::errors::ProcessError;
use crate::ports::PubkeyConverter;

/// Codec for bech32 addresses with a fixed human-readable part and a fixed
/// decoded length.
#[derive(Debug, Clone)]
pub struct Bech32PubkeyConverter {
    hrp: String,
    length: usize,
}

impl Bech32PubkeyConverter {
    /// Codec for `hrp`-prefixed addresses decoding to `length` bytes.
    pub fn new(hrp: impl Into<String>, length: usize) -> Self {
        Self {
            hrp: hrp.into(),
            length,
        }
    }
}

impl PubkeyConverter for Bech32PubkeyConverter {
    fn decode(&self, encoded: &str) -> Result<Vec<u8>, ProcessError> {
        let (hrp, data, variant) =
            bech32::decode(encoded).map_err(|e| ProcessError::AddressDecode(e.to_string()))?;

        if variant != Variant::Bech32 {
            return Err(ProcessError::AddressDecode(
                "unsupported bech32 variant".to_string(),
            ));
        }
        if hrp != self.hrp {
            return Err(ProcessError::AddressDecode(format!(
                "wrong address prefix {hrp}, expected {}",
                self.hrp
            )));
        }

        let bytes = Vec::<u8>::from_base32(&data)
            .map_err(|e| ProcessError::AddressDecode(e.to_string()))?;
        if bytes.len() != self.length {
            return Err(ProcessError::AddressDecode(format!(
                "wrong address length {}, expected {}",
                bytes.len(),
                self.length
            )));
        }

        Ok(bytes)
    }

    fn encode(&self, bytes: &[u8]) -> Result<String, ProcessError> {
        if bytes.len() != self.length {
            return Err(ProcessError::AddressDecode(format!(
                "wrong public key length {}, expected {}",
                bytes.len(),
                self.length
            )));
        }

        bech32::encode(&self.hrp, bytes.to_base32(), Variant::Bech32)
            .map_err(|e| ProcessError::AddressDecode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> Bech32PubkeyConverter {
        Bech32PubkeyConverter::new("erd", 32)
    }

    #[test]
    fn test_roundtrip() {
        let converter = converter();
        let pubkey: Vec<u8> = (0..32).collect();

        let encoded = converter.encode(&pubkey).unwrap();
        assert!(encoded.starts_with("erd1"));

        let decoded = converter.decode(&encoded).unwrap();
        assert_eq!(decoded, pubkey);
    }

    #[test]
    fn test_rejects_wrong_hrp() {
        let converter = converter();
        let other = Bech32PubkeyConverter::new("btc", 32);
        let encoded = other.encode(&[7u8; 32]).unwrap();

        assert!(matches!(
            converter.decode(&encoded),
            Err(ProcessError::AddressDecode(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        let converter = converter();
        assert!(converter.decode("not-an-address").is_err());
        assert!(converter.decode("").is_err());
    }

    #[test]
    fn test_rejects_wrong_length() {
        let converter = converter();
        let short = Bech32PubkeyConverter::new("erd", 16).encode(&[1u8; 16]).unwrap();
        assert!(converter.decode(&short).is_err());
        assert!(converter.encode(&[1u8; 16]).is_err());
    }

    #[test]
    fn test_decodes_known_system_contract_address() {
        let converter = converter();
        let decoded = converter
            .decode("erd1qqqqqqqqqqqqqqqpqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqzllls8a5w6u")
            .unwrap();
        assert_eq!(decoded.len(), 32);
        // System contracts carry a long run of leading zero bytes.
        assert!(decoded[..8].iter().all(|b| *b == 0));
    }
}
