//! Fixed-rate swap between native currency and encrypted tokens
//!
//! `tokens = native * rate / one_unit` on the way in and
//! `native = tokens * one_unit / rate` on the way out, both rounding down.

use nostr::PublicKey;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::config::TokenConfig;
use crate::contract::NativeTransfer;
use crate::error::{CasinoError, CasinoResult};
use crate::events::{CasinoEvent, EventLog};
use crate::fhe::{ExternalInput, FheBackend};
use crate::ledger::Ledger;
use crate::treasury::Treasury;

/// Direction of a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapDirection {
    Buy,
    Sell,
}

/// Plaintext summary of a completed swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub account: PublicKey,
    pub direction: SwapDirection,
    pub native_amount: u128,
    pub token_amount: u64,
}

/// Stateless pricing and settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapEngine {
    rate: u128,
    one_unit: u128,
}

impl SwapEngine {
    pub fn new(token: &TokenConfig) -> Self {
        Self {
            rate: token.rate as u128,
            one_unit: token.one_unit as u128,
        }
    }

    /// Tokens issued for `native` base units
    pub fn quote_buy(&self, native: u128) -> CasinoResult<u32> {
        if native == 0 {
            return Err(CasinoError::NoPaymentSent);
        }

        let tokens = native
            .checked_mul(self.rate)
            .map(|scaled| scaled / self.one_unit)
            .ok_or(CasinoError::AmountTooLarge {
                amount: native,
                capacity: u32::MAX as u128,
            })?;

        u32::try_from(tokens).map_err(|_| CasinoError::AmountTooLarge {
            amount: tokens,
            capacity: u32::MAX as u128,
        })
    }

    /// Native base units owed for `tokens`
    pub fn quote_sell(&self, tokens: u64) -> CasinoResult<u128> {
        if tokens == 0 {
            return Err(CasinoError::InvalidAmount);
        }
        // u64 * u64 always fits in u128
        Ok(tokens as u128 * self.one_unit / self.rate)
    }

    /// Mint encrypted tokens against native value attached by `account`
    pub fn buy<B: FheBackend>(
        &self,
        ledger: &mut Ledger,
        treasury: &mut Treasury,
        events: &mut EventLog,
        backend: &mut B,
        account: &PublicKey,
        native_paid: u128,
    ) -> CasinoResult<SwapReceipt> {
        let tokens = self.quote_buy(native_paid)?;

        treasury.receive(native_paid)?;
        let amount = backend.trivial_encrypt(tokens);
        ledger.credit(backend, account, &amount)?;

        debug!(account = %account, native = %native_paid, tokens = tokens, "buy settled");
        events.emit(CasinoEvent::TokensSwapped {
            account: *account,
            native_amount: native_paid,
            token_amount: tokens as u64,
            is_buy: true,
        });

        Ok(SwapReceipt {
            account: *account,
            direction: SwapDirection::Buy,
            native_amount: native_paid,
            token_amount: tokens as u64,
        })
    }

    /// Burn an encrypted token amount and pay out native value.
    ///
    /// Payout is priced from `tokens_claimed` while the debit uses the
    /// ciphertext in `encrypted_amount`; the two are not checked against
    /// each other.
    #[allow(clippy::too_many_arguments)]
    pub fn sell<B: FheBackend>(
        &self,
        ledger: &mut Ledger,
        treasury: &mut Treasury,
        events: &mut EventLog,
        backend: &mut B,
        account: &PublicKey,
        tokens_claimed: u64,
        encrypted_amount: &ExternalInput,
    ) -> CasinoResult<(SwapReceipt, NativeTransfer)> {
        let owed = self.quote_sell(tokens_claimed)?;
        treasury.ensure_covers(owed)?;

        let amount = backend.verify_input::<u32>(encrypted_amount, account)?;
        ledger.debit(backend, account, &amount)?;
        let transfer = treasury.pay_out(account, owed)?;

        debug!(account = %account, native = %owed, tokens = tokens_claimed, "sell settled");
        events.emit(CasinoEvent::TokensSwapped {
            account: *account,
            native_amount: owed,
            token_amount: tokens_claimed,
            is_buy: false,
        });

        let receipt = SwapReceipt {
            account: *account,
            direction: SwapDirection::Sell,
            native_amount: owed,
            token_amount: tokens_claimed,
        };
        Ok((receipt, transfer))
    }
}
