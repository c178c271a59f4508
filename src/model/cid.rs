//! Content identifiers

use crate::{Error, Result};
use multibase::Base;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Multihash code for BLAKE3
const MULTIHASH_BLAKE3: u8 = 0x1e;
/// Multihash code and digest length of a CIDv0 (sha2-256)
const CIDV0_PREFIX: [u8; 2] = [0x12, 0x20];

/// IPLD codec of the block a CID points at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    /// Raw leaf bytes (files)
    Raw,
    /// UnixFS protobuf node (directories)
    DagPb,
}

impl Codec {
    pub fn as_byte(&self) -> u8 {
        match self {
            Codec::Raw => 0x55,
            Codec::DagPb => 0x70,
        }
    }
}

/// A content identifier as printed by the node
///
/// Accepts CIDv0 (`Qm…`, base58btc) and CIDv1 in base32 (`b…`) or
/// base58btc (`z…`) multibase. The decoded bytes must form a complete
/// multihash whose digest length matches its header.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid(String);

impl Cid {
    /// Validate and wrap a textual CID
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let well_formed = if raw.starts_with("Qm") {
            Base::Base58Btc
                .decode(raw)
                .map(|bytes| is_cidv0(&bytes))
                .unwrap_or(false)
        } else {
            match multibase::decode(raw) {
                Ok((Base::Base32Lower | Base::Base58Btc, bytes)) => is_cidv1(&bytes),
                _ => false,
            }
        };

        if well_formed {
            Ok(Cid(raw.to_string()))
        } else {
            Err(Error::InvalidCid(raw.to_string()))
        }
    }

    /// Build a CIDv1 (base32) for a BLAKE3 digest
    pub fn from_blake3(codec: Codec, digest: &[u8; 32]) -> Self {
        let mut bytes = Vec::with_capacity(36);
        bytes.push(0x01);
        bytes.push(codec.as_byte());
        bytes.push(MULTIHASH_BLAKE3);
        bytes.push(32);
        bytes.extend_from_slice(digest);
        Cid(multibase::encode(Base::Base32Lower, &bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// CID version (0 for `Qm…`, 1 otherwise)
    pub fn version(&self) -> u8 {
        if self.0.starts_with("Qm") {
            0
        } else {
            1
        }
    }

    /// Short prefix for display
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

fn is_cidv0(bytes: &[u8]) -> bool {
    bytes.len() == 34 && bytes[..2] == CIDV0_PREFIX
}

/// `<version=1><codec><hash code><digest length><digest>`, all varints but the digest
fn is_cidv1(bytes: &[u8]) -> bool {
    let mut rest = bytes;
    let header = (
        read_varint(&mut rest),
        read_varint(&mut rest),
        read_varint(&mut rest),
        read_varint(&mut rest),
    );
    match header {
        (Some(1), Some(_), Some(_), Some(len)) => len > 0 && rest.len() as u64 == len,
        _ => false,
    }
}

/// Unsigned LEB128, at most 9 bytes
fn read_varint(input: &mut &[u8]) -> Option<u64> {
    let mut value = 0u64;
    for (i, &byte) in input.iter().enumerate().take(9) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            *input = &input[i + 1..];
            return Some(value);
        }
    }
    None
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", self.short())
    }
}

impl Serialize for Cid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Cid::parse(&raw).map_err(serde::de::Error::custom)
    }
}
