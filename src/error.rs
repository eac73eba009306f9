use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Every failure the quote engine and the hook resolver can report.
///
/// None of these are retried: the core is pure, so the same inputs always
/// produce the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookAmmError {
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Invalid slippage tolerance: {0} bps exceeds 10000")]
    InvalidSlippage(u16),
    #[error("Bonding curve is already complete")]
    CurveComplete,
    #[error("Insufficient reserves for this trade")]
    InsufficientReserves,
    #[error("Arithmetic overflow or underflow in {0}")]
    ArithmeticFault(&'static str),
    #[error(
        "Corrupt reserves: virtual token {virtual_token_reserves}, real token {real_token_reserves}, virtual sol {virtual_sol_reserves}"
    )]
    CorruptReserves {
        virtual_token_reserves: u64,
        real_token_reserves: u64,
        virtual_sol_reserves: u64,
    },
    #[error("Mint {mint} could not be probed: {reason}")]
    HookProbeFailed { mint: Pubkey, reason: String },
    #[error("Transfer hook accounts only partially resolved ({resolved} accounts): {warning}")]
    PartialHookResolution {
        resolved: usize,
        warning: crate::hook_accounts::PartialResolution,
    },
    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),
    #[error("Failed to decode account {account}: {reason}")]
    AccountDecode { account: Pubkey, reason: String },
    #[error("Failed to decode event: {0}")]
    EventDecode(String),
}

pub type HookAmmResult<T> = std::result::Result<T, HookAmmError>;
