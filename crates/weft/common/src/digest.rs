// Weft
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Structural digests
//!
//! A digest is the BLAKE3 hash of a value's canonical bincode encoding. Two
//! values with equal digests encode to the same bytes, which is how the weave
//! registry identifies units and checks that a re-weave left a unit
//! byte-identical.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("Canonical encoding failed: {0}")]
    Encoding(#[from] bincode::error::EncodeError),
    #[error("Invalid digest text: {0}")]
    InvalidHex(String),
}

/// Canonical byte encoding used for hashing and identity checks
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, DigestError> {
    Ok(bincode::serde::encode_to_vec(value, bincode::config::standard())?)
}

/// 256-bit structural digest
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Digest of a value's canonical encoding
    pub fn of<T: Serialize>(value: &T) -> Result<Self, DigestError> {
        let bytes = canonical_bytes(value)?;
        Ok(Self::of_bytes(&bytes))
    }

    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First eight hex digits, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    pub fn from_hex(text: &str) -> Result<Self, DigestError> {
        let bytes = hex::decode(text).map_err(|e| DigestError::InvalidHex(e.to_string()))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| DigestError::InvalidHex(format!("expected 32 bytes, got {}", b.len())))?;
        Ok(Self(array))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            Digest::from_hex(&text).map_err(de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        name: String,
        items: Vec<u32>,
    }

    #[test]
    fn test_digest_is_stable() {
        let a = Sample { name: "x".into(), items: vec![1, 2] };
        let b = Sample { name: "x".into(), items: vec![1, 2] };
        assert_eq!(Digest::of(&a).unwrap(), Digest::of(&b).unwrap());
    }

    #[test]
    fn test_digest_distinguishes_structure() {
        let a = Sample { name: "x".into(), items: vec![1, 2] };
        let b = Sample { name: "x".into(), items: vec![2, 1] };
        assert_ne!(Digest::of(&a).unwrap(), Digest::of(&b).unwrap());
    }

    #[test]
    fn test_hex_round_trip() {
        let digest = Digest::of_bytes(b"weft");
        assert_eq!(Digest::from_hex(&digest.to_hex()).unwrap(), digest);
        assert_eq!(digest.short().len(), 8);
        assert!(Digest::from_hex("abcd").is_err());
    }
}
