//! Block and header types for the persisting context.

use crate::uint::{UInt160, UInt256};
use crate::SECONDS_PER_BLOCK;

/// The scripts authorizing a signable payload.
#[derive(Debug, Clone, Default)]
pub struct Witness {
    /// Script supplying the signatures.
    pub invocation_script: Vec<u8>,
    /// Script consuming them.
    pub verification_script: Vec<u8>,
}

/// Block header.
#[derive(Debug, Clone, Default)]
pub struct Header {
    /// Format version.
    pub version: u32,
    /// Hash of the previous block.
    pub prev_hash: UInt256,
    /// Merkle root over the block's transactions.
    pub merkle_root: UInt256,
    /// Unix timestamp.
    pub timestamp: u32,
    /// Height of the block.
    pub index: u32,
    /// Consensus nonce.
    pub consensus_data: u64,
    /// Script hash of the next round's consensus address.
    pub next_consensus: UInt160,
    /// Authorization witness.
    pub witness: Witness,
}

/// A block: header plus the hashes of its transactions.
#[derive(Debug, Clone, Default)]
pub struct Block {
    /// The header.
    pub header: Header,
    /// Transaction hashes carried by the block.
    pub transactions: Vec<UInt256>,
}

impl Block {
    /// Synthesizes the empty block following the given tip: timestamp moves
    /// one block interval forward, the consensus address carries over, and
    /// the transaction list is empty.
    #[must_use]
    pub fn on_top_of(tip: &Header, tip_hash: UInt256) -> Self {
        Self {
            header: Header {
                version: tip.version,
                prev_hash: tip_hash,
                merkle_root: UInt256::ZERO,
                timestamp: tip.timestamp + SECONDS_PER_BLOCK,
                index: tip.index + 1,
                consensus_data: 0,
                next_consensus: tip.next_consensus,
                witness: Witness::default(),
            },
            transactions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_block_follows_tip() {
        let tip = Header {
            timestamp: 1_000,
            index: 41,
            next_consensus: UInt160::new([7u8; 20]),
            ..Header::default()
        };
        let tip_hash = UInt256::new([9u8; 32]);
        let block = Block::on_top_of(&tip, tip_hash);
        assert_eq!(block.header.index, 42);
        assert_eq!(block.header.timestamp, 1_000 + SECONDS_PER_BLOCK);
        assert_eq!(block.header.prev_hash, tip_hash);
        assert_eq!(block.header.next_consensus, tip.next_consensus);
        assert_eq!(block.header.merkle_root, UInt256::ZERO);
        assert!(block.transactions.is_empty());
    }
}
