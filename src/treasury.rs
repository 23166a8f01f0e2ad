//! Plaintext native-currency reserve

use nostr::PublicKey;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::contract::NativeTransfer;
use crate::error::{CasinoError, CasinoResult};
use crate::events::{CasinoEvent, EventLog};

/// Native balance held by the contract, in base units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    balance: u128,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> u128 {
        self.balance
    }

    /// Owner funding
    pub fn deposit(
        &mut self,
        events: &mut EventLog,
        caller: &PublicKey,
        owner: &PublicKey,
        value: u128,
    ) -> CasinoResult<()> {
        if caller != owner {
            return Err(CasinoError::OnlyOwner);
        }
        if value == 0 {
            return Err(CasinoError::NoPaymentSent);
        }

        self.receive(value)?;
        events.emit(CasinoEvent::TreasuryFunded {
            funder: *caller,
            amount: value,
        });
        Ok(())
    }

    /// Hand the entire reserve to the owner
    pub fn withdraw(
        &mut self,
        events: &mut EventLog,
        caller: &PublicKey,
        owner: &PublicKey,
    ) -> CasinoResult<NativeTransfer> {
        if caller != owner {
            return Err(CasinoError::OnlyOwner);
        }

        let amount = std::mem::take(&mut self.balance);
        debug!(amount = %amount, "treasury drained");
        events.emit(CasinoEvent::TreasuryWithdrawn { to: *owner, amount });
        Ok(NativeTransfer { to: *owner, amount })
    }

    /// Native value attached to a purchase or deposit
    pub(crate) fn receive(&mut self, value: u128) -> CasinoResult<()> {
        self.balance = self
            .balance
            .checked_add(value)
            .ok_or(CasinoError::AmountTooLarge {
                amount: value,
                capacity: u128::MAX - self.balance,
            })?;
        Ok(())
    }

    /// Native value leaving on a sale
    pub(crate) fn pay_out(&mut self, to: &PublicKey, amount: u128) -> CasinoResult<NativeTransfer> {
        self.ensure_covers(amount)?;
        self.balance -= amount;
        Ok(NativeTransfer { to: *to, amount })
    }

    pub(crate) fn ensure_covers(&self, amount: u128) -> CasinoResult<()> {
        if self.balance < amount {
            return Err(CasinoError::InsufficientTreasury {
                requested: amount,
                available: self.balance,
            });
        }
        Ok(())
    }
}
