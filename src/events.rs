//! Externally observable records emitted by ledger operations

use nostr::PublicKey;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::error::CasinoResult;

/// One emitted record. Amounts here are plaintext bookkeeping only; no
/// encrypted value is ever reflected in a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasinoEvent {
    GameStarted {
        game_id: u64,
        player: PublicKey,
        dice_count: u8,
        timestamp: u64,
    },
    GameResolved {
        game_id: u64,
        player: PublicKey,
        timestamp: u64,
    },
    TokensSwapped {
        account: PublicKey,
        native_amount: u128,
        token_amount: u64,
        is_buy: bool,
    },
    TokensMinted {
        account: PublicKey,
        amount: u64,
    },
    TreasuryFunded {
        funder: PublicKey,
        amount: u128,
    },
    TreasuryWithdrawn {
        to: PublicKey,
        amount: u128,
    },
}

impl CasinoEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CasinoEvent::GameStarted { .. } => "GameStarted",
            CasinoEvent::GameResolved { .. } => "GameResolved",
            CasinoEvent::TokensSwapped { .. } => "TokensSwapped",
            CasinoEvent::TokensMinted { .. } => "TokensMinted",
            CasinoEvent::TreasuryFunded { .. } => "TreasuryFunded",
            CasinoEvent::TreasuryWithdrawn { .. } => "TreasuryWithdrawn",
        }
    }

    pub fn to_json(&self) -> CasinoResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Append-only, ordered record log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<CasinoEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: CasinoEvent) {
        info!(event = event.name(), index = self.records.len(), "record emitted");
        self.records.push(event);
    }

    pub fn records(&self) -> &[CasinoEvent] {
        &self.records
    }

    /// Forget records emitted after the first `len`
    pub(crate) fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&CasinoEvent> {
        self.records.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr::Keys;

    #[test]
    fn test_event_json_is_tagged() {
        let player = Keys::generate().public_key();
        let event = CasinoEvent::GameStarted {
            game_id: 3,
            player,
            dice_count: 2,
            timestamp: 1_700_000_000,
        };

        let json = event.to_json().unwrap();
        assert!(json.starts_with("{\"game_started\":"));
        assert!(json.contains(&player.to_string()));

        let parsed: CasinoEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_log_is_ordered() {
        let account = Keys::generate().public_key();
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.emit(CasinoEvent::TokensMinted { account, amount: 5 });
        log.emit(CasinoEvent::TreasuryFunded { funder: account, amount: 9 });

        assert_eq!(log.len(), 2);
        assert_eq!(log.records()[0].name(), "TokensMinted");
        assert_eq!(log.last().map(|e| e.name()), Some("TreasuryFunded"));

        log.truncate(1);
        assert_eq!(log.len(), 1);
        assert_eq!(log.last().map(|e| e.name()), Some("TokensMinted"));
    }
}
