//! Wire types delivered by the block-stream transport.

use serde::{Deserialize, Serialize};

/// A raw contract event as delivered inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Emitting contract address (hex felt).
    pub address: String,
    /// Key words; `keys[0]` is the event-kind discriminant.
    pub keys: Vec<String>,
    /// Data words, one felt per layout field.
    pub data: Vec<String>,
    /// Owning transaction hash.
    pub tx_hash: String,
    /// Position of the event within its block.
    pub event_index: u32,
}

/// How irreversible the block was believed to be at delivery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finality {
    Pending,
    Accepted,
    Finalized,
}

impl std::fmt::Display for Finality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

/// A cursored block from the stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Monotonic ordering key within the stream.
    pub order_key: u64,
    /// Uniqueness tiebreaker supplied by the transport (block hash).
    pub unique_key: String,
    /// Finality classification at delivery time.
    pub finality: Finality,
    /// Chain block number.
    pub number: u64,
    /// Unix timestamp of the block (seconds).
    pub timestamp: i64,
    /// Events in block order (ascending `event_index`).
    pub events: Vec<RawEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finality_serde_is_lowercase() {
        let json = serde_json::to_string(&Finality::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");
        let back: Finality = serde_json::from_str("\"finalized\"").unwrap();
        assert_eq!(back, Finality::Finalized);
    }
}
