//! Read-only view of the chain consumed by the engine and syscalls.

use crate::block::{Block, Header};
use crate::uint::UInt256;

/// Chain lookups needed to synthesize the persisting block and to answer
/// `Blockchain.*` syscalls.
pub trait LedgerView {
    /// Height of the chain tip.
    fn height(&self) -> u32;

    /// Header of the chain tip.
    fn tip(&self) -> Header;

    /// Hash of the chain tip.
    fn tip_hash(&self) -> UInt256;

    /// Header at the given height.
    fn header_at(&self, index: u32) -> Option<Header>;

    /// Header with the given hash.
    fn header_by_hash(&self, hash: &UInt256) -> Option<Header>;

    /// Block at the given height.
    fn block_at(&self, index: u32) -> Option<Block>;
}

/// In-memory chain seeded with a genesis block; enough ledger for one-shot
/// executions and tests.
pub struct MemoryLedger {
    blocks: Vec<Block>,
    hashes: Vec<UInt256>,
}

impl MemoryLedger {
    /// Creates a ledger holding only a genesis block.
    #[must_use]
    pub fn new() -> Self {
        let genesis = Block {
            header: Header {
                timestamp: 1_468_595_301,
                ..Header::default()
            },
            transactions: Vec::new(),
        };
        Self {
            blocks: vec![genesis],
            hashes: vec![UInt256::ZERO],
        }
    }

    /// Appends a block under the given hash.
    pub fn push_block(&mut self, hash: UInt256, block: Block) {
        self.blocks.push(block);
        self.hashes.push(hash);
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerView for MemoryLedger {
    fn height(&self) -> u32 {
        (self.blocks.len() - 1) as u32
    }

    fn tip(&self) -> Header {
        self.blocks[self.blocks.len() - 1].header.clone()
    }

    fn tip_hash(&self) -> UInt256 {
        self.hashes[self.hashes.len() - 1]
    }

    fn header_at(&self, index: u32) -> Option<Header> {
        self.blocks.get(index as usize).map(|b| b.header.clone())
    }

    fn header_by_hash(&self, hash: &UInt256) -> Option<Header> {
        let index = self.hashes.iter().position(|h| h == hash)?;
        Some(self.blocks[index].header.clone())
    }

    fn block_at(&self, index: u32) -> Option<Block> {
        self.blocks.get(index as usize).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_only_ledger() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.height(), 0);
        assert!(ledger.header_at(0).is_some());
        assert!(ledger.header_at(1).is_none());
    }

    #[test]
    fn push_block_advances_tip() {
        let mut ledger = MemoryLedger::new();
        let next = Block::on_top_of(&ledger.tip(), ledger.tip_hash());
        let hash = UInt256::new([1u8; 32]);
        ledger.push_block(hash, next);
        assert_eq!(ledger.height(), 1);
        assert_eq!(ledger.tip_hash(), hash);
        assert!(ledger.header_by_hash(&hash).is_some());
    }
}
