//! Error types for the parity-dice ledger

use thiserror::Error;

/// Main error type for the parity-dice ledger.
///
/// Every variant aborts the whole operation; nothing is partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CasinoError {
    // Authorization
    #[error("Only the contract owner may perform this action")]
    OnlyOwner,

    #[error("Only the player of game {game_id} may perform this action")]
    OnlyGamePlayer { game_id: u64 },

    #[error("Caller is not allowed to change visibility of this balance")]
    Unauthorized,

    // Validation
    #[error("Invalid dice count {0}: must be 1, 2 or 3")]
    InvalidDiceCount(u8),

    #[error("Invalid amount: token amount must be non-zero")]
    InvalidAmount,

    #[error("Amount must be positive")]
    AmountMustBePositive,

    #[error("No payment sent")]
    NoPaymentSent,

    #[error("Amount {amount} exceeds encrypted capacity {capacity}")]
    AmountTooLarge { amount: u128, capacity: u128 },

    #[error("Invalid input proof: {0}")]
    InvalidProof(String),

    // Resource
    #[error("Insufficient treasury: requested {requested}, available {available}")]
    InsufficientTreasury { requested: u128, available: u128 },

    #[error("Game {0} is already resolved")]
    AlreadyResolved(u64),

    #[error("Mint of {amount} exceeds maximum {max}")]
    MaxMintExceeded { amount: u128, max: u128 },

    #[error("Game {0} does not exist")]
    GameNotFound(u64),

    #[error("Game {0} has not been resolved yet")]
    NotResolved(u64),

    // Oracle
    #[error("Requester is not allowed to decrypt handle {handle}")]
    DecryptionNotAllowed { handle: String },

    #[error("Unknown ciphertext handle {0}")]
    UnknownHandle(String),

    #[error("Configuration error: {message}")]
    Configuration { message: String, field: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

/// Coarse classification of errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authorization,
    Validation,
    Resource,
    Oracle,
    Configuration,
}

impl CasinoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CasinoError::OnlyOwner
            | CasinoError::OnlyGamePlayer { .. }
            | CasinoError::Unauthorized => ErrorKind::Authorization,
            CasinoError::InvalidDiceCount(_)
            | CasinoError::InvalidAmount
            | CasinoError::AmountMustBePositive
            | CasinoError::NoPaymentSent
            | CasinoError::AmountTooLarge { .. }
            | CasinoError::InvalidProof(_) => ErrorKind::Validation,
            CasinoError::InsufficientTreasury { .. }
            | CasinoError::AlreadyResolved(_)
            | CasinoError::MaxMintExceeded { .. }
            | CasinoError::GameNotFound(_)
            | CasinoError::NotResolved(_) => ErrorKind::Resource,
            CasinoError::DecryptionNotAllowed { .. } | CasinoError::UnknownHandle(_) => {
                ErrorKind::Oracle
            }
            CasinoError::Configuration { .. } | CasinoError::Serialization { .. } => {
                ErrorKind::Configuration
            }
        }
    }
}

impl From<serde_json::Error> for CasinoError {
    fn from(err: serde_json::Error) -> Self {
        CasinoError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Type alias for the main result type used throughout the library
pub type CasinoResult<T> = Result<T, CasinoError>;

/// Hashing helpers shared by the backend and the dice source
pub mod utils {
    use sha2::{Digest, Sha256};

    /// Compute SHA256 hash over a sequence of byte slices
    pub fn sha256_parts(parts: &[&[u8]]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        hasher.finalize().into()
    }

    /// Convert bytes to hexadecimal string
    pub fn to_hex(bytes: &[u8]) -> String {
        hex::encode(bytes)
    }
}

/// Logging configuration and initialization
pub mod logging {
    use std::env;
    use tracing::Level;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    /// Logging output format
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum LogFormat {
        Human,
        Json,
    }

    /// Logging output destination
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum LogOutput {
        Stdout,
        Stderr,
    }

    /// Logging configuration
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        pub level: Level,
        pub format: LogFormat,
        pub output: LogOutput,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                format: LogFormat::Human,
                output: LogOutput::Stdout,
            }
        }
    }

    /// Initialize structured logging with the given configuration
    pub fn init_logging(
        config: LoggingConfig,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let env_filter = EnvFilter::builder()
            .with_default_directive(config.level.into())
            .from_env_lossy()
            .add_directive("parity_dice=trace".parse()?);

        let registry = tracing_subscriber::registry().with(env_filter);

        match config.format {
            LogFormat::Human => {
                let fmt_layer = fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true);

                match config.output {
                    LogOutput::Stdout => registry
                        .with(fmt_layer.with_writer(std::io::stdout))
                        .try_init()?,
                    LogOutput::Stderr => registry
                        .with(fmt_layer.with_writer(std::io::stderr))
                        .try_init()?,
                }
            }
            LogFormat::Json => {
                let fmt_layer = fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(fmt::format::FmtSpan::CLOSE);

                match config.output {
                    LogOutput::Stdout => registry
                        .with(fmt_layer.with_writer(std::io::stdout))
                        .try_init()?,
                    LogOutput::Stderr => registry
                        .with(fmt_layer.with_writer(std::io::stderr))
                        .try_init()?,
                }
            }
        }

        Ok(())
    }

    /// Initialize logging with environment-based configuration
    pub fn init_from_env() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let level = env::var("PARITY_DICE_LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string())
            .parse::<Level>()
            .unwrap_or(Level::INFO);

        let format = match env::var("PARITY_DICE_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Human,
        };

        let output = match env::var("PARITY_DICE_LOG_OUTPUT").as_deref() {
            Ok("stderr") => LogOutput::Stderr,
            _ => LogOutput::Stdout,
        };

        init_logging(LoggingConfig { level, format, output })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(CasinoError::OnlyOwner.kind(), ErrorKind::Authorization);
        assert_eq!(CasinoError::InvalidDiceCount(4).kind(), ErrorKind::Validation);
        assert_eq!(CasinoError::AlreadyResolved(0).kind(), ErrorKind::Resource);
        assert_eq!(
            CasinoError::DecryptionNotAllowed { handle: "00".into() }.kind(),
            ErrorKind::Oracle
        );
    }

    #[test]
    fn test_error_messages() {
        let err = CasinoError::InsufficientTreasury { requested: 10, available: 3 };
        assert_eq!(err.to_string(), "Insufficient treasury: requested 10, available 3");
        assert_eq!(
            CasinoError::OnlyGamePlayer { game_id: 7 }.to_string(),
            "Only the player of game 7 may perform this action"
        );
    }

    #[test]
    fn test_sha256_parts_matches_concatenation() {
        assert_eq!(utils::sha256_parts(&[b"ab", b"cd"]), utils::sha256_parts(&[b"abcd"]));
        assert_eq!(utils::to_hex(&[0xde, 0xad]), "dead");
    }
}
