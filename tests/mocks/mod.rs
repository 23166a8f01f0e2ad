//! Shared fixtures for integration tests

#![allow(dead_code)]

use parity_dice::{
    BlockEnv, Casino, CasinoConfig, Ebool, Euint32, Keys, LocalBackend, PublicKey, TxContext,
    ONE_UNIT,
};

pub const GENESIS_TIME: u64 = 1_700_000_000;

/// A deployed casino with an owner and a clock
pub struct Table {
    pub casino: Casino<LocalBackend>,
    pub owner: PublicKey,
    pub block: BlockEnv,
}

impl Table {
    pub fn new() -> Self {
        Self::with_config(CasinoConfig::default())
    }

    pub fn with_config(config: CasinoConfig) -> Self {
        let owner = Keys::generate().public_key();
        let contract = Keys::generate().public_key();
        let casino = Casino::new(owner, LocalBackend::new(contract), config)
            .expect("valid config");

        Self {
            casino,
            owner,
            block: BlockEnv::new(GENESIS_TIME, [0u8; 32]),
        }
    }

    pub fn player(&self) -> PublicKey {
        Keys::generate().public_key()
    }

    pub fn tx(&self, sender: PublicKey) -> TxContext {
        TxContext::new(sender, self.block)
    }

    pub fn tick(&mut self, seconds: u64) {
        self.block.timestamp += seconds;
    }

    pub fn reseed(&mut self, prevrandao: [u8; 32]) {
        self.block.prevrandao = prevrandao;
    }

    /// Decrypted balance as seen by the account itself
    pub fn balance_of(&self, account: &PublicKey) -> Option<u32> {
        let handle = self.casino.balance_handle_of(account)?;
        Some(self.decrypt_u32(&handle, account))
    }

    pub fn decrypt_u32(&self, handle: &Euint32, requester: &PublicKey) -> u32 {
        self.casino
            .backend()
            .user_decrypt(handle, requester)
            .expect("decryption granted")
    }

    pub fn decrypt_bool(&self, handle: &Ebool, requester: &PublicKey) -> bool {
        self.casino
            .backend()
            .user_decrypt(handle, requester)
            .expect("decryption granted")
    }

    /// Fund the treasury with `units` whole native units
    pub fn fund(&mut self, units: u128) {
        let tx = self.tx(self.owner);
        self.casino
            .fund_treasury(&tx, units * ONE_UNIT as u128)
            .expect("owner funding");
    }

    /// Start a game with plaintext prediction and stake encrypted for `player`
    pub fn start(
        &mut self,
        player: PublicKey,
        dice_count: u8,
        prediction: u8,
        stake: u32,
    ) -> parity_dice::CasinoResult<u64> {
        let prediction = self.casino.backend().encrypt_input(prediction, &player);
        let stake = self.casino.backend().encrypt_input(stake, &player);
        let tx = self.tx(player);
        self.casino.start_game(&tx, dice_count, &prediction, &stake)
    }
}
