//! Request DTOs for the block cache API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::block::Block;

/// Largest number of blocks accepted in one batch
pub const MAX_BATCH_BLOCKS: usize = 4096;

/// Request body for a batch write (POST /blocks/batch)
///
/// # Fields
/// - `blocks`: UTF-8 payloads, one block each
#[derive(Debug, Clone, Deserialize)]
pub struct BatchPutRequest {
    pub blocks: Vec<String>,
}

impl BatchPutRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.blocks.is_empty() {
            return Some("Batch cannot be empty".to_string());
        }
        if self.blocks.len() > MAX_BATCH_BLOCKS {
            return Some(format!(
                "Batch exceeds maximum of {} blocks",
                MAX_BATCH_BLOCKS
            ));
        }
        None
    }

    /// Builds the blocks, deriving each identifier from its payload.
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks.into_iter().map(Block::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_request_deserialize() {
        let json = r#"{"blocks": ["foo", "bar"]}"#;
        let req: BatchPutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.blocks, vec!["foo", "bar"]);
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_empty_batch() {
        let req = BatchPutRequest { blocks: vec![] };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_oversized_batch() {
        let req = BatchPutRequest {
            blocks: vec![String::new(); MAX_BATCH_BLOCKS + 1],
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_into_blocks() {
        let req = BatchPutRequest {
            blocks: vec!["foo".to_string(), "foo".to_string()],
        };
        let blocks = req.into_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].cid(), blocks[1].cid());
        assert_eq!(blocks[0].data().as_ref(), b"foo");
    }
}
