//! Entry points over the whole ledger state
//!
//! Every mutating call opens a journal on the state and the backend. A
//! successful call drops the journal; a failed one replays it backwards, so
//! it leaves no trace. Undo work is proportional to what the call touched,
//! never to the size of the history. Ordering between calls is the
//! caller's concern: `&mut self` admits one call at a time.

pub mod context;

pub use context::{BlockEnv, NativeTransfer, TxContext};

use nostr::PublicKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;
use crate::config::CasinoConfig;
use crate::error::CasinoResult;
use crate::events::{CasinoEvent, EventLog};
use crate::fhe::{Ebool, Euint32, Euint8, ExternalInput, FheBackend};
use crate::game::{GameMetadata, GameRegistry};
use crate::ledger::Ledger;
use crate::swap::{SwapEngine, SwapReceipt};
use crate::treasury::Treasury;

/// Everything that persists between calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasinoState {
    pub owner: PublicKey,
    pub ledger: Ledger,
    pub games: GameRegistry,
    pub treasury: Treasury,
    pub events: EventLog,
}

/// Plain values needed to undo a call
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    treasury: Treasury,
    events: usize,
}

impl CasinoState {
    pub fn new(owner: PublicKey) -> Self {
        Self {
            owner,
            ledger: Ledger::new(),
            games: GameRegistry::new(),
            treasury: Treasury::new(),
            events: EventLog::new(),
        }
    }

    fn begin(&mut self) -> Checkpoint {
        self.ledger.begin();
        self.games.begin();
        Checkpoint {
            treasury: self.treasury,
            events: self.events.len(),
        }
    }

    fn commit(&mut self) {
        self.ledger.commit();
        self.games.commit();
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.ledger.rollback();
        self.games.rollback();
        self.treasury = checkpoint.treasury;
        self.events.truncate(checkpoint.events);
    }
}

/// The wagering ledger bound to one encrypted-arithmetic backend
#[derive(Debug, Clone)]
pub struct Casino<B: FheBackend> {
    config: CasinoConfig,
    swap: SwapEngine,
    state: CasinoState,
    backend: B,
}

impl<B: FheBackend> Casino<B> {
    pub fn new(owner: PublicKey, backend: B, config: CasinoConfig) -> CasinoResult<Self> {
        config.validate()?;
        info!(owner = %owner, contract = %backend.contract_address(), "casino deployed");
        Ok(Self {
            swap: SwapEngine::new(&config.token),
            config,
            state: CasinoState::new(owner),
            backend,
        })
    }

    pub fn with_defaults(owner: PublicKey, backend: B) -> Self {
        let config = CasinoConfig::default();
        Self {
            swap: SwapEngine::new(&config.token),
            config,
            state: CasinoState::new(owner),
            backend,
        }
    }

    /// Mint `amount` tokens to the caller
    pub fn mint(&mut self, tx: &TxContext, amount: u64) -> CasinoResult<Euint32> {
        let token = self.config.token.clone();
        self.transact("mint", tx, |state, backend| {
            state
                .ledger
                .mint(backend, &mut state.events, &token, &tx.sender, amount)
        })
    }

    /// Buy tokens with the attached native `value`
    pub fn buy(&mut self, tx: &TxContext, value: u128) -> CasinoResult<SwapReceipt> {
        let swap = self.swap;
        self.transact("buy", tx, |state, backend| {
            swap.buy(
                &mut state.ledger,
                &mut state.treasury,
                &mut state.events,
                backend,
                &tx.sender,
                value,
            )
        })
    }

    /// Sell tokens: `claimed` prices the payout, `encrypted_amount` is debited
    pub fn sell(
        &mut self,
        tx: &TxContext,
        claimed: u64,
        encrypted_amount: &ExternalInput,
    ) -> CasinoResult<(SwapReceipt, NativeTransfer)> {
        let swap = self.swap;
        self.transact("sell", tx, |state, backend| {
            swap.sell(
                &mut state.ledger,
                &mut state.treasury,
                &mut state.events,
                backend,
                &tx.sender,
                claimed,
                encrypted_amount,
            )
        })
    }

    pub fn start_game(
        &mut self,
        tx: &TxContext,
        dice_count: u8,
        prediction: &ExternalInput,
        stake: &ExternalInput,
    ) -> CasinoResult<u64> {
        self.transact("start_game", tx, |state, backend| {
            state.games.start(
                &mut state.ledger,
                backend,
                &mut state.events,
                &tx.sender,
                dice_count,
                prediction,
                stake,
                tx.block.timestamp,
            )
        })
    }

    /// Resolve a game; returns the encrypted win flag
    pub fn resolve_game(&mut self, tx: &TxContext, game_id: u64) -> CasinoResult<Ebool> {
        self.transact("resolve_game", tx, |state, backend| {
            state.games.resolve(
                &mut state.ledger,
                backend,
                &mut state.events,
                game_id,
                &tx.sender,
                &tx.block,
            )
        })
    }

    pub fn fund_treasury(&mut self, tx: &TxContext, value: u128) -> CasinoResult<()> {
        self.transact("fund_treasury", tx, |state, _| {
            let owner = state.owner;
            state.treasury.deposit(&mut state.events, &tx.sender, &owner, value)
        })
    }

    pub fn withdraw_treasury(&mut self, tx: &TxContext) -> CasinoResult<NativeTransfer> {
        self.transact("withdraw_treasury", tx, |state, _| {
            let owner = state.owner;
            state.treasury.withdraw(&mut state.events, &tx.sender, &owner)
        })
    }

    /// Let anyone decrypt `account`'s balance
    pub fn make_balance_public(
        &mut self,
        tx: &TxContext,
        account: &PublicKey,
    ) -> CasinoResult<()> {
        self.transact("make_balance_public", tx, |state, backend| {
            state.ledger.make_public(backend, account, &tx.sender, &state.owner)
        })
    }

    pub fn balance_handle_of(&self, account: &PublicKey) -> Option<Euint32> {
        self.state.ledger.read(account)
    }

    pub fn treasury_balance(&self) -> u128 {
        self.state.treasury.balance()
    }

    pub fn game_metadata(&self, game_id: u64) -> CasinoResult<GameMetadata> {
        self.state.games.metadata(game_id)
    }

    pub fn game_prediction_handle(
        &self,
        caller: &PublicKey,
        game_id: u64,
    ) -> CasinoResult<Euint8> {
        self.state.games.prediction_handle(game_id, caller)
    }

    pub fn game_stake_handle(&self, caller: &PublicKey, game_id: u64) -> CasinoResult<Euint32> {
        self.state.games.stake_handle(game_id, caller)
    }

    pub fn game_dice_handles(
        &self,
        caller: &PublicKey,
        game_id: u64,
    ) -> CasinoResult<Vec<Euint32>> {
        self.state.games.dice_handles(game_id, caller)
    }

    pub fn game_outcome_handle(&self, caller: &PublicKey, game_id: u64) -> CasinoResult<Ebool> {
        self.state.games.outcome_handle(game_id, caller)
    }

    pub fn game_ids_of(&self, account: &PublicKey) -> &[u64] {
        self.state.games.game_ids_of(account)
    }

    pub fn game_count_of(&self, account: &PublicKey) -> usize {
        self.state.games.game_count_of(account)
    }

    pub fn game_count(&self) -> usize {
        self.state.games.len()
    }

    pub fn owner(&self) -> PublicKey {
        self.state.owner
    }

    pub fn events(&self) -> &[CasinoEvent] {
        self.state.events.records()
    }

    pub fn state(&self) -> &CasinoState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn transact<T>(
        &mut self,
        operation: &'static str,
        tx: &TxContext,
        apply: impl FnOnce(&mut CasinoState, &mut B) -> CasinoResult<T>,
    ) -> CasinoResult<T> {
        let correlation_id = Uuid::new_v4();
        let span = info_span!(
            "tx",
            operation = operation,
            correlation_id = %correlation_id,
            sender = %tx.sender,
            block_time = tx.block.timestamp
        );
        let _guard = span.enter();
        debug!("executing");

        let checkpoint = self.state.begin();
        self.backend.begin();

        match apply(&mut self.state, &mut self.backend) {
            Ok(value) => {
                self.state.commit();
                self.backend.commit();
                info!("committed");
                Ok(value)
            }
            Err(err) => {
                self.state.rollback(checkpoint);
                self.backend.rollback();
                warn!(error = %err, kind = ?err.kind(), "rejected");
                Err(err)
            }
        }
    }
}
