// Primitives KratOs - Types fondamentaux minimaux
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Hex strings for human-readable formats (JSON), raw bytes otherwise
macro_rules! impl_hex_serde {
    ($name:ident, $len:expr) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
                } else {
                    self.0.serialize(serializer)
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                if deserializer.is_human_readable() {
                    let s = String::deserialize(deserializer)?;
                    let raw = hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)?;
                    let bytes: [u8; $len] = raw.try_into().map_err(|_| {
                        serde::de::Error::custom(concat!(stringify!($name), " must be ", stringify!($len), " bytes"))
                    })?;
                    Ok($name(bytes))
                } else {
                    <[u8; $len]>::deserialize(deserializer).map($name)
                }
            }
        }
    };
}

/// Hash universel (Blake3)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; 32]);

impl_hex_serde!(Hash, 32);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash des données avec Blake3
    pub fn hash(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Hash(*hash.as_bytes())
    }

    /// Hash of a domain tag followed by the given parts
    pub fn hash_tagged(tag: &[u8], parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(tag);
        for part in parts {
            hasher.update(part);
        }
        Hash(*hasher.finalize().as_bytes())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }
}

/// Contract/account address (20 bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl_hex_serde!(Address, 20);

impl Address {
    pub const LEN: usize = 20;
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Builds an address from raw bytes, keeping the low-order 20 bytes and
    /// left-padding shorter inputs with zeroes.
    pub fn from_slice(raw: &[u8]) -> Self {
        let mut bytes = [0u8; 20];
        if raw.len() >= 20 {
            bytes.copy_from_slice(&raw[raw.len() - 20..]);
        } else {
            bytes[20 - raw.len()..].copy_from_slice(raw);
        }
        Address(bytes)
    }

    /// Address in the reserved low range (built-ins, protocol accounts)
    pub const fn from_low_u64(value: u64) -> Self {
        let be = value.to_be_bytes();
        let mut bytes = [0u8; 20];
        let mut i = 0;
        while i < 8 {
            bytes[12 + i] = be[i];
            i += 1;
        }
        Address(bytes)
    }

    /// Address derived from the last 20 bytes of a hash
    pub fn from_hash(hash: &Hash) -> Self {
        Address::from_slice(hash.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let raw = hex::decode(s.trim_start_matches("0x"))?;
        if raw.len() != 20 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        Ok(Address::from_slice(&raw))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

/// 32-byte word used for storage keys/values and log topics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataWord([u8; 32]);

impl_hex_serde!(DataWord, 32);

impl DataWord {
    pub const ZERO: DataWord = DataWord([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        DataWord(bytes)
    }

    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        DataWord(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl From<Hash> for DataWord {
    fn from(hash: Hash) -> Self {
        DataWord(*hash.as_bytes())
    }
}

/// 24-bit unsigned length used by the rent engine for trie node sizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Uint24(u32);

impl Uint24 {
    pub const MAX: Uint24 = Uint24(0x00FF_FFFF);
    pub const ZERO: Uint24 = Uint24(0);

    /// Clamps to the 24-bit range
    pub fn saturating_from(value: usize) -> Self {
        if value > Self::MAX.0 as usize {
            Self::MAX
        } else {
            Uint24(value as u32)
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Numéro de bloc
pub type BlockNumber = u64;

/// Timestamp Unix en secondes
pub type Timestamp = u64;

/// Balance en unités natives (u128)
pub type Balance = u128;

/// Unité de gas
pub type Gas = u64;

/// Nonce pour prévenir replay attacks
pub type Nonce = u64;

/// Constantes monétaires
pub const KRAT: Balance = 1_000_000_000_000; // 10^12
