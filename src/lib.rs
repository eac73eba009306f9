//! # HookAMM SDK
//!
//! A standalone SDK for trading against HookAMM bonding curves on Solana. It covers two problems:
//!
//! 1. **Quoting**: reproduces the program's constant-product settlement (virtual + real reserves,
//!    1% fee, floor rounding, checked overflow) off-chain, bit for bit.
//! 2. **Transfer hooks**: when the traded mint is a Token-2022 mint with a `TransferHook`
//!    extension, derives the extra accounts every transfer of that token must carry.
//!
//! The core is pure: every ledger read is passed in as an [`AccountMap`]. Only [`HookAmmSDK`]
//! talks to an RPC node, and only to fill that map.
//!
//! ## Internal State Management
//!
//! - **`load_curve`**: loads the bonding curve of a mint for internal state tracking
//! - **`update_accounts`**: refreshes curve, global config, mint and hook validation accounts
//! - **`get_curves`** / **`get_curves_by_creator`**: lists bonding curves through
//!   `getProgramAccounts`
//!
//! ## 🚀 Quick Start
//!
//! ```rust,no_run
//! use hook_amm_sdk::{HookAmmConfig, HookAmmSDK, TradeAuthority, TradeIntent};
//! use solana_sdk::{commitment_config::CommitmentLevel, pubkey::Pubkey};
//!
//! # async fn run(mint: Pubkey, user: Pubkey) -> anyhow::Result<()> {
//! let mut sdk = HookAmmSDK::new(HookAmmConfig::new(
//!     "https://api.devnet.solana.com",
//!     CommitmentLevel::Confirmed,
//! ));
//!
//! // 1 SOL in, quoted against the latest reserves
//! let quote = sdk.quote(&mint, TradeIntent::Buy { sol_amount_in: 1_000_000_000 }).await?;
//! println!("Expected tokens: {}, fee: {}", quote.amount_out, quote.fee);
//!
//! // Token account creation, then the buy with hook accounts appended;
//! // the user signs and sends them in this order
//! let authority = TradeAuthority::External(user);
//! let buy_ixs = sdk.buy_ix(&mint, 1_000_000_000, &authority, Some(100)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Offline usage
//!
//! ```rust
//! use hook_amm_sdk::{QuoteEngine, ReserveState, TradeIntent};
//!
//! let reserves = ReserveState {
//!     virtual_token_reserves: 500_000_000_000,
//!     virtual_sol_reserves: 10_000_000_000,
//!     token_total_supply: 1_000_000_000_000,
//!     ..ReserveState::default()
//! };
//! let quote = QuoteEngine::default()
//!     .quote(&reserves, TradeIntent::Buy { sol_amount_in: 1_000_000_000 })
//!     .unwrap();
//! assert_eq!(quote.amount_out, 45_040_946_315);
//! assert_eq!(quote.minimum_amount_out(10_000).unwrap(), 0);
//! ```
//!
//! ## ⚠️ Partial hook resolution
//!
//! If the hook's extra-account-meta list cannot be read or one of its entries cannot be
//! derived, the resolver returns the accounts resolved so far together with a
//! [`PartialResolution`] warning. Instruction builders refuse such a list, since the program
//! would reject the transfer; [`TradeRequest`] still exposes it for diagnostics.
//!
//! ## 📄 License
//!
//! MIT License - see LICENSE file for details.

mod account_metas;
mod amm; // Private module - users should use re-exported types
mod config;
mod constants;
mod error;
mod events;
mod extra_account_meta;
mod hook_accounts;
mod hook_amm;
pub mod math;
mod quote;
mod reserves;
mod sdk;
mod seed_registry;
mod signer;
mod state;
mod token;
mod trade_request;
mod utils;

pub use sdk::HookAmmSDK;

pub use amm::{AccountData, AccountMap};
pub use config::{DEFAULT_SLIPPAGE_BPS, DEVNET_RPC_ENDPOINT, HookAmmConfig};
pub use constants::{FEE_BASIS_POINTS, GLOBAL_CONFIG, HOOK_AMM_PROGRAM_ID, PRICE_PRECISION};
pub use error::{HookAmmError, HookAmmResult};
pub use events::{TRADE_EVENT_DISCRIMINATOR, TradeEvent};
pub use extra_account_meta::{
    ExtraAccountMetaEntry, MetaAddress, MetaListError, PubkeySource, pack_execute_metas,
    unpack_execute_metas, validation_address,
};
pub use hook_accounts::{
    ExtraAccount, HookAccountResolver, HookResolution, HookTransfer, PartialResolution,
};
pub use quote::{PriceDirection, PriceImpact, Quote, QuoteEngine, TradeIntent};
pub use reserves::ReserveState;
pub use seed_registry::{
    SeedContext, SeedError, SeedPattern, SeedPatternId, SeedPatternRegistry, pack_seed_config,
};
pub use signer::TradeAuthority;
pub use state::{BondingCurve, GlobalConfig};
pub use token::{HookDescriptor, MintProbe, TokenProgramKind, probe_mint};
pub use trade_request::{TradeAccounts, TradeRequest, TradeRequestBuilder};
pub use utils::{
    bonding_curve_filters, create_user_token_account_ix, get_bonding_curve,
    get_curve_token_account, get_global_config, get_user_token_account,
};
