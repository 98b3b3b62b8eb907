//! Fixed-size key and hash types.
//!
//! Keys are carried as 32-byte arrays internally and hex strings on the
//! wire. The serde helper modules convert between the two.

/// An ed25519 public key (spend or view).
pub type PublicKey = [u8; 32];

/// An ed25519 secret key.
pub type SecretKey = [u8; 32];

/// A key image, the unique per-output double-spend marker.
pub type KeyImage = [u8; 32];

/// The shared secret between sender and receiver.
pub type KeyDerivation = [u8; 32];

/// A transaction or block hash.
pub type TxHash = [u8; 32];

/// Convert a 64-char hex string into a 32-byte array.
pub fn hex_to_32(s: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(s).ok()?;
    if bytes.len() != 32 {
        return None;
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Some(arr)
}

/// Serde adapter: `[u8; 32]` <-> lowercase hex string.
pub mod hex32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &[u8; 32], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&hex::encode(key))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(de)?;
        super::hex_to_32(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("expected 64 hex chars, got {:?}", s)))
    }
}

/// Serde adapter: `Vec<[u8; 32]>` <-> list of hex strings.
pub mod hex32_list {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(keys: &[[u8; 32]], ser: S) -> Result<S::Ok, S::Error> {
        let mut seq = ser.serialize_seq(Some(keys.len()))?;
        for key in keys {
            seq.serialize_element(&hex::encode(key))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<[u8; 32]>, D::Error> {
        let strings = Vec::<String>::deserialize(de)?;
        strings
            .iter()
            .map(|s| {
                super::hex_to_32(s).ok_or_else(|| {
                    serde::de::Error::custom(format!("expected 64 hex chars, got {:?}", s))
                })
            })
            .collect()
    }
}
