//! Parity Dice - an odd/even dice wager over encrypted balances
//!
//! Parity Dice keeps every player balance, prediction, stake and roll as a
//! handle to a ciphertext:
//! - Encrypted 32-bit token balances, bought and sold against a native reserve
//! - One to three dice per game, summed and compared for parity under encryption
//! - Per-handle decryption grants so only the owning player can read their values

pub mod acl;
pub mod config;
pub mod contract;
pub mod error;
pub mod events;
pub mod fhe;
pub mod game;
pub mod ledger;
pub mod swap;
pub mod treasury;

// Re-export commonly used types for convenience
pub use error::{CasinoError, CasinoResult, ErrorKind};

// Re-export the contract surface
pub use contract::{BlockEnv, Casino, CasinoState, NativeTransfer, TxContext};

// Re-export encrypted value types
pub use fhe::{
    Ebool, Encrypted, Euint32, Euint8, ExternalInput, FheBackend, FheType, Handle, LocalBackend,
};

// Re-export records and receipts
pub use events::{CasinoEvent, EventLog};
pub use game::{Game, GameMetadata, GameStatus, MAX_DICE, MIN_DICE};
pub use swap::{SwapDirection, SwapReceipt};

// Re-export configuration interfaces
pub use config::{CasinoConfig, TokenConfig, ONE_UNIT};

// Re-export external dependencies for user convenience
pub use nostr::{Keys, PublicKey};
