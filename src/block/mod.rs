//! Block Module
//!
//! Content identifiers and the immutable blocks they address.

mod cid;

use bytes::Bytes;

pub use cid::Cid;

// == Block ==
/// Immutable byte payload together with its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    cid: Cid,
    data: Bytes,
}

impl Block {
    // == Constructor ==
    /// Creates a block, deriving its identifier from the content.
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            cid: Cid::of(&data),
            data,
        }
    }

    /// Pairs bytes with an identifier the caller already trusts.
    pub fn with_cid(data: impl Into<Bytes>, cid: Cid) -> Self {
        Self {
            cid,
            data: data.into(),
        }
    }

    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }
}
