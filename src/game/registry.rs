//! Game registry: creation, resolution and player-gated accessors
//!
//! Games live in a dense vector indexed by id, so ids start at zero and are
//! never reused. Each player also has an append-only list of their ids,
//! used for enumeration only; ownership is always checked against the
//! player stored on the game itself.

use std::collections::HashMap;
use nostr::PublicKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::acl::AccessGate;
use crate::contract::BlockEnv;
use crate::error::{CasinoError, CasinoResult};
use crate::events::{CasinoEvent, EventLog};
use crate::fhe::{Ebool, Euint32, Euint8, ExternalInput, FheBackend};
use crate::ledger::Ledger;
use super::dice;
use super::record::{Game, GameMetadata, GameStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRegistry {
    games: Vec<Game>,
    by_player: HashMap<PublicKey, Vec<u64>>,
    #[serde(skip)]
    undo: Option<RegistryUndo>,
}

/// Registry shape at `begin`: its length and the prior form of any game
/// changed since
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RegistryUndo {
    len: usize,
    replaced: HashMap<u64, Game>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a game for `player`, debiting the encrypted stake up front.
    ///
    /// The stake is not checked against the balance; staking more than is
    /// held underflows the balance.
    #[allow(clippy::too_many_arguments)]
    pub fn start<B: FheBackend>(
        &mut self,
        ledger: &mut Ledger,
        backend: &mut B,
        events: &mut EventLog,
        player: &PublicKey,
        dice_count: u8,
        prediction: &ExternalInput,
        stake: &ExternalInput,
        timestamp: u64,
    ) -> CasinoResult<u64> {
        if !Game::is_valid_dice_count(dice_count) {
            return Err(CasinoError::InvalidDiceCount(dice_count));
        }

        let prediction: Euint8 = backend.verify_input(prediction, player)?;
        let stake: Euint32 = backend.verify_input(stake, player)?;

        let game_id = self.games.len() as u64;
        self.games.push(Game::new(*player, dice_count, prediction, stake, timestamp));

        ledger.debit(backend, player, &stake)?;
        self.by_player.entry(*player).or_default().push(game_id);

        AccessGate::seal(backend, prediction.handle(), player)?;
        AccessGate::seal(backend, stake.handle(), player)?;

        info!(game_id = game_id, player = %player, dice_count = dice_count, "game started");
        events.emit(CasinoEvent::GameStarted {
            game_id,
            player: *player,
            dice_count,
            timestamp,
        });
        Ok(game_id)
    }

    /// Roll the dice and settle the game. Only the player may resolve, and
    /// only once.
    ///
    /// The payout is `2 * stake` on a correct parity call and `0` otherwise,
    /// chosen by an encrypted select so both paths are always computed.
    pub fn resolve<B: FheBackend>(
        &mut self,
        ledger: &mut Ledger,
        backend: &mut B,
        events: &mut EventLog,
        game_id: u64,
        caller: &PublicKey,
        block: &BlockEnv,
    ) -> CasinoResult<Ebool> {
        let game = self.get(game_id)?;
        if game.player != *caller {
            return Err(CasinoError::OnlyGamePlayer { game_id });
        }
        if game.is_resolved() {
            return Err(CasinoError::AlreadyResolved(game_id));
        }

        let player = game.player;
        let stake = game.stake;
        let prediction = game.prediction;

        let mut sum = backend.trivial_encrypt(0u32);
        let mut faces = Vec::with_capacity(game.dice_count as usize);
        for face in dice::roll_faces(block, game_id, game.dice_count) {
            let encrypted = backend.trivial_encrypt(face as u32);
            sum = backend.add(&sum, &encrypted)?;
            faces.push(encrypted);
        }
        let face_handles: Vec<_> = faces.iter().map(|face| face.handle()).collect();
        AccessGate::seal_all(backend, &face_handles, &player)?;

        let one = backend.trivial_encrypt(1u32);
        let zero = backend.trivial_encrypt(0u32);
        let low_bit = backend.and(&sum, &one)?;
        let is_even = backend.eq(&low_bit, &zero)?;

        let even_call = backend.trivial_encrypt(0u8);
        let predicted_even = backend.eq(&prediction, &even_call)?;
        let won = backend.eq(&is_even, &predicted_even)?;

        let double = backend.add(&stake, &stake)?;
        let nothing = backend.trivial_encrypt(0u32);
        let payout = backend.select(&won, &double, &nothing)?;

        ledger.credit(backend, &player, &payout)?;
        AccessGate::seal(backend, won.handle(), &player)?;

        let game = self.get_mut(game_id)?;
        game.dice = faces;
        game.outcome = Some(won);
        game.status = GameStatus::Resolved;

        info!(game_id = game_id, player = %player, "game resolved");
        events.emit(CasinoEvent::GameResolved {
            game_id,
            player,
            timestamp: block.timestamp,
        });
        Ok(won)
    }

    pub fn get(&self, game_id: u64) -> CasinoResult<&Game> {
        usize::try_from(game_id)
            .ok()
            .and_then(|index| self.games.get(index))
            .ok_or(CasinoError::GameNotFound(game_id))
    }

    fn get_mut(&mut self, game_id: u64) -> CasinoResult<&mut Game> {
        let index = usize::try_from(game_id)
            .ok()
            .filter(|index| *index < self.games.len())
            .ok_or(CasinoError::GameNotFound(game_id))?;

        if let Some(undo) = self.undo.as_mut() {
            if index < undo.len {
                let games = &self.games;
                undo.replaced
                    .entry(game_id)
                    .or_insert_with(|| games[index].clone());
            }
        }
        Ok(&mut self.games[index])
    }

    /// Plaintext metadata, readable by anyone
    pub fn metadata(&self, game_id: u64) -> CasinoResult<GameMetadata> {
        Ok(self.get(game_id)?.metadata(game_id))
    }

    pub fn prediction_handle(&self, game_id: u64, caller: &PublicKey) -> CasinoResult<Euint8> {
        Ok(self.owned(game_id, caller)?.prediction)
    }

    pub fn stake_handle(&self, game_id: u64, caller: &PublicKey) -> CasinoResult<Euint32> {
        Ok(self.owned(game_id, caller)?.stake)
    }

    /// Empty while the game is active
    pub fn dice_handles(&self, game_id: u64, caller: &PublicKey) -> CasinoResult<Vec<Euint32>> {
        Ok(self.owned(game_id, caller)?.dice.clone())
    }

    pub fn outcome_handle(&self, game_id: u64, caller: &PublicKey) -> CasinoResult<Ebool> {
        self.owned(game_id, caller)?
            .outcome
            .ok_or(CasinoError::NotResolved(game_id))
    }

    pub fn game_ids_of(&self, account: &PublicKey) -> &[u64] {
        self.by_player
            .get(account)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    pub fn game_count_of(&self, account: &PublicKey) -> usize {
        self.game_ids_of(account).len()
    }

    pub(crate) fn begin(&mut self) {
        self.undo = Some(RegistryUndo {
            len: self.games.len(),
            replaced: HashMap::new(),
        });
    }

    pub(crate) fn commit(&mut self) {
        self.undo = None;
    }

    /// Drop games created since `begin` and restore the ones it changed
    pub(crate) fn rollback(&mut self) {
        let Some(undo) = self.undo.take() else {
            return;
        };

        for (offset, game) in self.games.drain(undo.len..).enumerate().rev() {
            let game_id = (undo.len + offset) as u64;
            if let Some(ids) = self.by_player.get_mut(&game.player) {
                if ids.last() == Some(&game_id) {
                    ids.pop();
                }
                if ids.is_empty() {
                    self.by_player.remove(&game.player);
                }
            }
        }
        for (game_id, game) in undo.replaced {
            self.games[game_id as usize] = game;
        }
    }

    /// Total games ever created; also the next id
    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    fn owned(&self, game_id: u64, caller: &PublicKey) -> CasinoResult<&Game> {
        let game = self.get(game_id)?;
        if game.player != *caller {
            debug!(game_id = game_id, "encrypted field requested by non-player");
            return Err(CasinoError::OnlyGamePlayer { game_id });
        }
        Ok(game)
    }
}
