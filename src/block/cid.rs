//! Content Identifier Module
//!
//! Multihash-style identifiers over the SHA-256 digest of a block's bytes.

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use sha2::{Digest, Sha256};

use crate::error::BlockstoreError;

/// Multihash code for SHA2-256
pub const SHA2_256_CODE: u8 = 0x12;

/// Length of a SHA2-256 digest in bytes
pub const SHA2_256_LEN: usize = 32;

/// Multibase prefix of the lower-case base16 string form
pub const BASE16_PREFIX: char = 'f';

// == Cid ==
/// Content identifier: `code || length || digest`.
///
/// Equality and hashing only look at the encoded bytes, so an identifier
/// computed from content and one parsed from its string form are the same
/// key. `Cid::default()` is the undefined identifier.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid(Bytes);

impl Cid {
    // == Constructor ==
    /// Computes the identifier of `data`.
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut buf = BytesMut::with_capacity(2 + SHA2_256_LEN);
        buf.put_u8(SHA2_256_CODE);
        buf.put_u8(SHA2_256_LEN as u8);
        buf.put_slice(&digest);
        Self(buf.freeze())
    }

    /// Wraps already-encoded identifier bytes after checking the header.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self, BlockstoreError> {
        let bytes = bytes.into();
        match &bytes[..] {
            [code, len, digest @ ..]
                if *code == SHA2_256_CODE
                    && *len as usize == SHA2_256_LEN
                    && digest.len() == SHA2_256_LEN =>
            {
                Ok(Self(bytes))
            }
            _ => Err(BlockstoreError::InvalidCid(format!(
                "expected {} byte sha2-256 multihash, got {} bytes",
                2 + SHA2_256_LEN,
                bytes.len()
            ))),
        }
    }

    /// Encoded identifier bytes (empty when undefined).
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The raw digest without the multihash header.
    pub fn digest(&self) -> &[u8] {
        self.0.get(2..).unwrap_or_default()
    }

    /// False for `Cid::default()`.
    pub fn is_defined(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_defined() {
            return write!(f, "<undefined>");
        }
        write!(f, "{}{}", BASE16_PREFIX, hex::encode(&self.0))
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", self)
    }
}

impl FromStr for Cid {
    type Err = BlockstoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = s.strip_prefix(BASE16_PREFIX).ok_or_else(|| {
            BlockstoreError::InvalidCid(format!("missing '{}' multibase prefix", BASE16_PREFIX))
        })?;
        let bytes = hex::decode(encoded).map_err(|e| BlockstoreError::InvalidCid(e.to_string()))?;
        Self::from_bytes(bytes)
    }
}
