//! Game records

use nostr::PublicKey;
use serde::{Deserialize, Serialize};
use crate::fhe::{Ebool, Euint32, Euint8};

pub const MIN_DICE: u8 = 1;
pub const MAX_DICE: u8 = 3;

/// Lifecycle of a game. `Resolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Active,
    Resolved,
}

/// One staking round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub player: PublicKey,
    pub dice_count: u8,
    /// 0 predicts even, anything else odd
    pub prediction: Euint8,
    /// Already debited from the player when the game was created
    pub stake: Euint32,
    /// Empty until resolution, then exactly `dice_count` faces
    pub dice: Vec<Euint32>,
    pub created_at: u64,
    pub status: GameStatus,
    /// Encrypted win flag, set at resolution
    pub outcome: Option<Ebool>,
}

impl Game {
    pub fn new(
        player: PublicKey,
        dice_count: u8,
        prediction: Euint8,
        stake: Euint32,
        created_at: u64,
    ) -> Self {
        Self {
            player,
            dice_count,
            prediction,
            stake,
            dice: Vec::new(),
            created_at,
            status: GameStatus::Active,
            outcome: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == GameStatus::Resolved
    }

    pub fn is_valid_dice_count(dice_count: u8) -> bool {
        (MIN_DICE..=MAX_DICE).contains(&dice_count)
    }

    pub fn metadata(&self, game_id: u64) -> GameMetadata {
        GameMetadata {
            game_id,
            player: self.player,
            dice_count: self.dice_count,
            created_at: self.created_at,
            resolved: self.is_resolved(),
        }
    }
}

/// Openly readable plaintext part of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub game_id: u64,
    pub player: PublicKey,
    pub dice_count: u8,
    pub created_at: u64,
    pub resolved: bool,
}
