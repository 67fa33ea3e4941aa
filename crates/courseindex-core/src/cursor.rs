//! Pipeline cursor — the durable marker of progress through the block stream.

use serde::{Deserialize, Serialize};

/// Last durably processed position in the stream.
///
/// The cursor pairs the stream's monotonic ordering key with the uniqueness
/// tiebreaker (block hash) the transport supplied for that position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Ordering key of the last successfully processed block.
    pub order_key: u64,
    /// Uniqueness tiebreaker for that position.
    pub unique_key: String,
}

impl Cursor {
    pub fn new(order_key: u64, unique_key: impl Into<String>) -> Self {
        Self {
            order_key,
            unique_key: unique_key.into(),
        }
    }

    /// Advance to a newly committed position.
    pub fn advance(&mut self, order_key: u64, unique_key: impl Into<String>) {
        self.order_key = order_key;
        self.unique_key = unique_key.into();
    }

    /// The next position the transport should deliver (cursor + 1).
    pub fn next_block(&self) -> u64 {
        self.order_key + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_advance() {
        let mut cursor = Cursor::new(755_193, "0xaaa");
        cursor.advance(755_194, "0xbbb");
        assert_eq!(cursor.order_key, 755_194);
        assert_eq!(cursor.unique_key, "0xbbb");
    }

    #[test]
    fn cursor_next_block() {
        let cursor = Cursor::new(500, "0x123");
        assert_eq!(cursor.next_block(), 501);
    }
}
