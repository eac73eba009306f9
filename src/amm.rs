use anchor_lang::prelude::AccountMeta;
use anyhow::Result;
use solana_sdk::pubkey::Pubkey;

use crate::{
    error::{HookAmmError, HookAmmResult},
    quote::{Quote, TradeIntent},
};

/// Core bonding-curve market trait
pub(crate) trait Amm: Send + Sync {
    /// Deserialize the curve from its keyed bonding curve account
    fn load_curve(curve: &KeyedAccount) -> Result<Self>
    where
        Self: Sized;

    /// Program that owns the bonding curve account
    fn program_id(&self) -> Pubkey;

    /// Bonding curve address
    fn key(&self) -> Pubkey;

    /// Get the traded token mint
    fn get_mint(&self) -> Pubkey;

    /// Accounts `update` expects to find in the map
    fn get_accounts_to_update(&self) -> Vec<Pubkey>;

    /// Re-decode curve, config and mint from a fresh snapshot
    fn update(&mut self, account_map: &AccountMap) -> Result<()>;

    /// Get a quote for a trade
    fn quote(&self, intent: TradeIntent) -> Result<Quote>;

    /// Get trade parameters and account metadata
    fn get_trade_and_account_metas(&self, trade_params: &TradeParams)
    -> Result<TradeAndAccountMetas>;

    /// `false` once the curve has migrated
    fn is_active(&self) -> bool;
}

/// Ledger reads keyed by address
pub type AccountMap = std::collections::HashMap<Pubkey, AccountData>;

/// Raw account bytes and owning program
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountData {
    pub data: Vec<u8>,
    pub owner: Pubkey,
}

/// An account together with its address
#[derive(Debug, Clone)]
pub struct KeyedAccount {
    pub key: Pubkey,
    pub account: AccountData,
}

/// Trade parameters
#[derive(Debug, Clone)]
pub struct TradeParams {
    pub intent: TradeIntent,
    pub user: Pubkey,
    /// Falls back to the user's associated token account for the mint
    pub user_token_account: Option<Pubkey>,
    pub slippage_bps: u16,
}

/// Anchor arguments shared by `buy` and `sell`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookAmmTradeArgs {
    /// Lamports for a buy, tokens for a sell
    pub amount: u64,
    /// Minimum tokens for a buy, minimum lamports for a sell
    pub min_amount_out: u64,
}

/// Trade result with account metadata
#[derive(Debug, Clone)]
pub struct TradeAndAccountMetas {
    pub discriminator: [u8; 8],
    pub trade: HookAmmTradeArgs,
    pub quote: Quote,
    pub data: Vec<u8>,
    /// Program accounts followed by the transfer hook accounts
    pub account_metas: Vec<AccountMeta>,
}

/// Data of `pubkey`, or `AccountNotFound`
pub(crate) fn try_get_account_data<'a>(
    account_map: &'a AccountMap,
    pubkey: &Pubkey,
) -> HookAmmResult<&'a [u8]> {
    account_map
        .get(pubkey)
        .map(|account| account.data.as_slice())
        .ok_or(HookAmmError::AccountNotFound(*pubkey))
}
