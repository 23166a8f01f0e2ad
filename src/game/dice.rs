//! Dice face derivation
//!
//! Faces are a SHA-256 of (block timestamp, prevrandao, game id, die index)
//! reduced into [1, 6]. This is a placeholder, not a fair randomness source:
//! whoever controls the block timestamp or seed can steer the outcome, and
//! anyone who knows them can predict it.

use crate::contract::BlockEnv;
use crate::error::utils;

pub const FACES: u32 = 6;

/// Face of die `index` in game `game_id`, in [1, 6]
pub fn roll_face(block: &BlockEnv, game_id: u64, index: u8) -> u8 {
    let digest = utils::sha256_parts(&[
        &block.timestamp.to_be_bytes(),
        &block.prevrandao,
        &game_id.to_be_bytes(),
        &[index],
    ]);
    (reduce(&digest, FACES) + 1) as u8
}

/// All faces for a game with `dice_count` dice
pub fn roll_faces(block: &BlockEnv, game_id: u64, dice_count: u8) -> Vec<u8> {
    (0..dice_count).map(|i| roll_face(block, game_id, i)).collect()
}

/// Big-endian digest modulo `modulus`
fn reduce(digest: &[u8; 32], modulus: u32) -> u32 {
    digest
        .iter()
        .fold(0u32, |acc, byte| (acc * 256 + *byte as u32) % modulus)
}
