//! Integration tests for balances, swaps and the treasury

mod mocks;

use mocks::Table;
use parity_dice::{
    CasinoConfig, CasinoError, CasinoEvent, FheBackend, NativeTransfer, SwapDirection,
    TokenConfig, ONE_UNIT,
};

const UNIT: u128 = ONE_UNIT as u128;

#[test]
fn test_mint_accumulates() {
    let mut table = Table::new();
    let alice = table.player();

    table.casino.mint(&table.tx(alice), 300).unwrap();
    table.casino.mint(&table.tx(alice), 700).unwrap();

    assert_eq!(table.balance_of(&alice), Some(1000));
    assert_eq!(table.casino.events().len(), 2);
}

#[test]
fn test_mint_zero_rejected() {
    let mut table = Table::new();
    let alice = table.player();

    let result = table.casino.mint(&table.tx(alice), 0);

    assert_eq!(result, Err(CasinoError::AmountMustBePositive));
    assert!(table.casino.balance_handle_of(&alice).is_none());
    assert!(table.casino.events().is_empty());
}

#[test]
fn test_mint_cap_applies_to_raw_amount() {
    let mut table = Table::with_config(CasinoConfig {
        token: TokenConfig {
            max_mint: 500,
            ..TokenConfig::default()
        },
        ..CasinoConfig::default()
    });
    let alice = table.player();

    assert!(matches!(
        table.casino.mint(&table.tx(alice), 501),
        Err(CasinoError::MaxMintExceeded { amount: 501, max: 500 })
    ));
    table.casino.mint(&table.tx(alice), 500).unwrap();
    assert_eq!(table.balance_of(&alice), Some(500));
}

#[test]
fn test_balance_readable_only_by_account() {
    let mut table = Table::new();
    let alice = table.player();
    let bob = table.player();

    let handle = table.casino.mint(&table.tx(alice), 42).unwrap();

    assert!(table.casino.backend().is_allowed(handle.handle(), &alice));
    assert!(!table.casino.backend().is_allowed(handle.handle(), &bob));
    assert!(matches!(
        table.casino.backend().user_decrypt(&handle, &bob),
        Err(CasinoError::DecryptionNotAllowed { .. })
    ));
}

#[test]
fn test_buy_prices_at_rate() {
    let mut table = Table::new();
    let alice = table.player();

    let receipt = table.casino.buy(&table.tx(alice), UNIT).unwrap();

    assert_eq!(receipt.direction, SwapDirection::Buy);
    assert_eq!(receipt.token_amount, 1000);
    assert_eq!(table.balance_of(&alice), Some(1000));
    assert_eq!(table.casino.treasury_balance(), UNIT);
    assert_eq!(
        table.casino.events().last(),
        Some(&CasinoEvent::TokensSwapped {
            account: alice,
            native_amount: UNIT,
            token_amount: 1000,
            is_buy: true,
        })
    );
}

#[test]
fn test_buy_without_payment_rejected() {
    let mut table = Table::new();
    let alice = table.player();
    let before = table.casino.state().clone();

    assert_eq!(table.casino.buy(&table.tx(alice), 0), Err(CasinoError::NoPaymentSent));
    assert_eq!(table.casino.state(), &before);
}

#[test]
fn test_buy_dust_credits_nothing() {
    let mut table = Table::new();
    let alice = table.player();

    // below the price of a single token
    let receipt = table.casino.buy(&table.tx(alice), UNIT / 1000 - 1).unwrap();

    assert_eq!(receipt.token_amount, 0);
    assert_eq!(table.balance_of(&alice), Some(0));
    assert_eq!(table.casino.treasury_balance(), UNIT / 1000 - 1);
}

#[test]
fn test_sell_pays_from_treasury() {
    let mut table = Table::new();
    let alice = table.player();
    table.fund(10);
    table.casino.buy(&table.tx(alice), 2 * UNIT).unwrap();

    let input = table.casino.backend().encrypt_input(1500u32, &alice);
    let (receipt, transfer) = table.casino.sell(&table.tx(alice), 1500, &input).unwrap();

    assert_eq!(receipt.direction, SwapDirection::Sell);
    assert_eq!(transfer, NativeTransfer { to: alice, amount: 3 * UNIT / 2 });
    assert_eq!(table.casino.treasury_balance(), 12 * UNIT - 3 * UNIT / 2);
    assert_eq!(table.balance_of(&alice), Some(500));
}

#[test]
fn test_sell_beyond_treasury_rejected() {
    let mut table = Table::new();
    let alice = table.player();
    table.casino.mint(&table.tx(alice), 5000).unwrap();
    table.fund(1);
    let before = table.casino.state().clone();

    let input = table.casino.backend().encrypt_input(2000u32, &alice);
    let result = table.casino.sell(&table.tx(alice), 2000, &input);

    assert_eq!(
        result,
        Err(CasinoError::InsufficientTreasury {
            requested: 2 * UNIT,
            available: UNIT,
        })
    );
    assert_eq!(table.casino.state(), &before);
    assert_eq!(table.balance_of(&alice), Some(5000));
}

#[test]
fn test_sell_zero_rejected() {
    let mut table = Table::new();
    let alice = table.player();
    table.fund(1);

    let input = table.casino.backend().encrypt_input(0u32, &alice);
    assert_eq!(
        table.casino.sell(&table.tx(alice), 0, &input),
        Err(CasinoError::InvalidAmount)
    );
}

#[test]
fn test_sell_prices_from_claim_not_ciphertext() {
    let mut table = Table::new();
    let alice = table.player();
    table.fund(5);
    table.casino.mint(&table.tx(alice), 100).unwrap();

    // claims 1000 tokens but only encrypts 10
    let input = table.casino.backend().encrypt_input(10u32, &alice);
    let (_, transfer) = table.casino.sell(&table.tx(alice), 1000, &input).unwrap();

    assert_eq!(transfer.amount, UNIT);
    assert_eq!(table.balance_of(&alice), Some(90));
}

#[test]
fn test_sell_with_foreign_input_rejected() {
    let mut table = Table::new();
    let alice = table.player();
    let mallory = table.player();
    table.fund(5);
    table.casino.mint(&table.tx(alice), 100).unwrap();

    let input = table.casino.backend().encrypt_input(10u32, &alice);
    let result = table.casino.sell(&table.tx(mallory), 10, &input);

    assert!(matches!(result, Err(CasinoError::InvalidProof(_))));
    assert_eq!(table.casino.treasury_balance(), 5 * UNIT);
}

#[test]
fn test_fund_treasury_owner_only() {
    let mut table = Table::new();
    let alice = table.player();

    assert_eq!(
        table.casino.fund_treasury(&table.tx(alice), UNIT),
        Err(CasinoError::OnlyOwner)
    );
    assert_eq!(
        table.casino.fund_treasury(&table.tx(table.owner), 0),
        Err(CasinoError::NoPaymentSent)
    );

    table.fund(3);
    assert_eq!(table.casino.treasury_balance(), 3 * UNIT);
}

#[test]
fn test_withdraw_drains_to_owner() {
    let mut table = Table::new();
    let alice = table.player();
    table.fund(4);
    table.casino.buy(&table.tx(alice), UNIT).unwrap();

    assert_eq!(
        table.casino.withdraw_treasury(&table.tx(alice)),
        Err(CasinoError::OnlyOwner)
    );
    assert_eq!(table.casino.treasury_balance(), 5 * UNIT);

    let transfer = table.casino.withdraw_treasury(&table.tx(table.owner)).unwrap();
    assert_eq!(transfer, NativeTransfer { to: table.owner, amount: 5 * UNIT });
    assert_eq!(table.casino.treasury_balance(), 0);

    // an empty reserve withdraws zero
    let again = table.casino.withdraw_treasury(&table.tx(table.owner)).unwrap();
    assert_eq!(again.amount, 0);
}

#[test]
fn test_make_balance_public() {
    let mut table = Table::new();
    let alice = table.player();
    let bob = table.player();
    let handle = table.casino.mint(&table.tx(alice), 64).unwrap();

    assert_eq!(
        table.casino.make_balance_public(&table.tx(bob), &alice),
        Err(CasinoError::Unauthorized)
    );
    assert!(table.casino.backend().public_decrypt(&handle).is_err());

    table.casino.make_balance_public(&table.tx(alice), &alice).unwrap();
    assert_eq!(table.casino.backend().public_decrypt(&handle).unwrap(), 64);
}

#[test]
fn test_make_public_on_untouched_account_is_noop() {
    let mut table = Table::new();
    let alice = table.player();

    table.casino.make_balance_public(&table.tx(table.owner), &alice).unwrap();
    assert!(table.casino.balance_handle_of(&alice).is_none());
}

#[test]
fn test_events_serialize() {
    let mut table = Table::new();
    let alice = table.player();
    table.casino.mint(&table.tx(alice), 1).unwrap();

    let json = table.casino.events()[0].to_json().unwrap();
    assert!(json.contains("tokens_minted"));
}
