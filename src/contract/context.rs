//! Per-transaction execution context

use nostr::PublicKey;
use serde::{Deserialize, Serialize};

/// Block-level values supplied by the surrounding chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEnv {
    /// Unix seconds
    pub timestamp: u64,
    /// Chain-supplied unpredictability seed
    pub prevrandao: [u8; 32],
}

impl BlockEnv {
    pub fn new(timestamp: u64, prevrandao: [u8; 32]) -> Self {
        Self { timestamp, prevrandao }
    }

    /// Block stamped with the current wall-clock time
    pub fn now(prevrandao: [u8; 32]) -> Self {
        let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
        Self::new(timestamp, prevrandao)
    }
}

/// Caller identity plus the block the call executes in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxContext {
    pub sender: PublicKey,
    pub block: BlockEnv,
}

impl TxContext {
    pub fn new(sender: PublicKey, block: BlockEnv) -> Self {
        Self { sender, block }
    }
}

/// Native currency leaving the contract, to be settled by the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeTransfer {
    pub to: PublicKey,
    pub amount: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_now_is_recent() {
        let block = BlockEnv::now([1u8; 32]);
        // 2023-01-01
        assert!(block.timestamp > 1_672_531_200);
        assert_eq!(block.prevrandao, [1u8; 32]);
    }
}
