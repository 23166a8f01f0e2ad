//! Encrypted balance ledger
//!
//! One encrypted 32-bit counter per account, created lazily as encrypted
//! zero on first credit or debit and never removed. Neither credit nor
//! debit checks bounds: ciphertext arithmetic wraps at 32 bits, so a debit
//! larger than the balance underflows.

use std::collections::HashMap;
use nostr::PublicKey;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::acl::AccessGate;
use crate::config::TokenConfig;
use crate::error::{CasinoError, CasinoResult};
use crate::events::{CasinoEvent, EventLog};
use crate::fhe::{Euint32, FheBackend};

/// Account → encrypted balance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balances: HashMap<PublicKey, Euint32>,
    /// Balance each touched account held at `begin`
    #[serde(skip)]
    undo: Option<HashMap<PublicKey, Option<Euint32>>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the account balance and seal the result
    pub fn credit<B: FheBackend>(
        &mut self,
        backend: &mut B,
        account: &PublicKey,
        amount: &Euint32,
    ) -> CasinoResult<Euint32> {
        let current = self.current_or_zero(backend, account);
        let updated = backend.add(&current, amount)?;
        self.store(backend, account, updated)
    }

    /// Subtract `amount` from the account balance and seal the result
    pub fn debit<B: FheBackend>(
        &mut self,
        backend: &mut B,
        account: &PublicKey,
        amount: &Euint32,
    ) -> CasinoResult<Euint32> {
        let current = self.current_or_zero(backend, account);
        let updated = backend.sub(&current, amount)?;
        self.store(backend, account, updated)
    }

    /// Encrypted balance handle, `None` if the account was never touched
    pub fn read(&self, account: &PublicKey) -> Option<Euint32> {
        self.balances.get(account).copied()
    }

    /// Let anyone decrypt the account balance.
    ///
    /// Only the account itself or the owner may do this. An account with no
    /// balance yet has nothing to publish.
    pub fn make_public<B: FheBackend>(
        &self,
        backend: &mut B,
        account: &PublicKey,
        caller: &PublicKey,
        owner: &PublicKey,
    ) -> CasinoResult<()> {
        if caller != account && caller != owner {
            return Err(CasinoError::Unauthorized);
        }

        if let Some(balance) = self.read(account) {
            AccessGate::publish(backend, balance.handle())?;
        }
        Ok(())
    }

    /// Credit freshly minted tokens to `account`.
    ///
    /// The cap in `token.max_mint` is denominated in native base units while
    /// `amount` is in tokens; the comparison is kept as is.
    pub fn mint<B: FheBackend>(
        &mut self,
        backend: &mut B,
        events: &mut EventLog,
        token: &TokenConfig,
        account: &PublicKey,
        amount: u64,
    ) -> CasinoResult<Euint32> {
        if amount == 0 {
            return Err(CasinoError::AmountMustBePositive);
        }

        if amount > token.max_mint {
            return Err(CasinoError::MaxMintExceeded {
                amount: amount as u128,
                max: token.max_mint as u128,
            });
        }

        let amount32 = u32::try_from(amount).map_err(|_| CasinoError::AmountTooLarge {
            amount: amount as u128,
            capacity: u32::MAX as u128,
        })?;

        let minted = backend.trivial_encrypt(amount32);
        let balance = self.credit(backend, account, &minted)?;

        debug!(account = %account, amount = amount, "tokens minted");
        events.emit(CasinoEvent::TokensMinted {
            account: *account,
            amount,
        });
        Ok(balance)
    }

    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    pub(crate) fn begin(&mut self) {
        self.undo = Some(HashMap::new());
    }

    pub(crate) fn commit(&mut self) {
        self.undo = None;
    }

    /// Put back every balance changed since `begin`
    pub(crate) fn rollback(&mut self) {
        for (account, previous) in self.undo.take().unwrap_or_default() {
            match previous {
                Some(balance) => self.balances.insert(account, balance),
                None => self.balances.remove(&account),
            };
        }
    }

    fn current_or_zero<B: FheBackend>(&self, backend: &mut B, account: &PublicKey) -> Euint32 {
        match self.read(account) {
            Some(balance) => balance,
            None => backend.trivial_encrypt(0u32),
        }
    }

    fn store<B: FheBackend>(
        &mut self,
        backend: &mut B,
        account: &PublicKey,
        balance: Euint32,
    ) -> CasinoResult<Euint32> {
        let previous = self.balances.insert(*account, balance);
        if let Some(undo) = self.undo.as_mut() {
            undo.entry(*account).or_insert(previous);
        }
        AccessGate::seal(backend, balance.handle(), account)?;
        Ok(balance)
    }
}
