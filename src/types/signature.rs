// Signature - Enveloppe Ed25519 des transactions
use super::primitives::{Address, Hash};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Prefix of every signed transaction payload
pub const DOMAIN_TRANSACTION: &[u8] = b"KRATOS_TRANSACTION_V1:";

/// Prefix of the hash an address is derived from
pub const DOMAIN_ADDRESS: &[u8] = b"KRATOS_ADDRESS_V1:";

/// `domain || message`
#[inline]
pub fn domain_separate(domain: &[u8], message: &[u8]) -> Vec<u8> {
    [domain, message].concat()
}

/// Raw Ed25519 signature, hex-encoded in JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature64(pub [u8; 64]);

impl Signature64 {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Display for Signature64 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}..", hex::encode(&self.0[..8]))
    }
}

impl Serialize for Signature64 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Signature64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            hex::decode(text.trim_start_matches("0x")).map_err(serde::de::Error::custom)?
        } else {
            <Vec<u8>>::deserialize(deserializer)?
        };
        let raw: [u8; 64] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| serde::de::Error::custom(format!("signature is {} bytes, expected 64", b.len())))?;
        Ok(Signature64(raw))
    }
}

/// Signature envelope of a transaction: the signer's Ed25519 public key and
/// the signature over the domain-separated payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSignature {
    pub public_key: [u8; 32],
    pub signature: Signature64,
}

impl TxSignature {
    /// Signs an already domain-separated message
    pub fn sign(key: &SigningKey, message: &[u8]) -> Self {
        let signature = key.sign(message);
        Self {
            public_key: key.verifying_key().to_bytes(),
            signature: Signature64(signature.to_bytes()),
        }
    }

    /// Recovers the signer address; only depends on the embedded key
    pub fn signer(&self) -> Address {
        address_of_public_key(&self.public_key)
    }

    /// Checks the signature against the embedded key
    pub fn verify(&self, message: &[u8]) -> bool {
        let Ok(signer) = VerifyingKey::from_bytes(&self.public_key) else {
            return false;
        };
        let signature = ed25519_dalek::Signature::from_bytes(self.signature.as_bytes());
        signer.verify(message, &signature).is_ok()
    }
}

impl fmt::Display for TxSignature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} by {}", self.signature, hex::encode(&self.public_key[..8]))
    }
}

/// Address of an Ed25519 public key: last 20 bytes of its tagged blake3 hash
pub fn address_of_public_key(public_key: &[u8; 32]) -> Address {
    Address::from_hash(&Hash::hash_tagged(DOMAIN_ADDRESS, &[public_key]))
}
