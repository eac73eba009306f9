use solana_sdk::pubkey::Pubkey;

use crate::{
    amm::AccountMap,
    error::{HookAmmError, HookAmmResult},
    hook_accounts::{ExtraAccount, HookAccountResolver, HookResolution, HookTransfer},
    quote::{Quote, TradeIntent},
    token::HookDescriptor,
};

/// Token accounts on either side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeAccounts {
    pub mint: Pubkey,
    pub curve_token_account: Pubkey,
    pub user_token_account: Pubkey,
    pub owner: Pubkey,
}

/// Everything needed to submit one trade, fixed at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRequest {
    quote: Quote,
    slippage_bps: u16,
    minimum_amount_out: u64,
    transfer: HookTransfer,
    hook_accounts: HookResolution,
}

impl TradeRequest {
    pub fn intent(&self) -> TradeIntent {
        self.quote.intent
    }

    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    pub fn slippage_bps(&self) -> u16 {
        self.slippage_bps
    }

    pub fn amount_out(&self) -> u64 {
        self.quote.amount_out
    }

    pub fn minimum_amount_out(&self) -> u64 {
        self.minimum_amount_out
    }

    pub fn fee(&self) -> u64 {
        self.quote.fee
    }

    /// The token leg the hook accounts were resolved for.
    pub fn transfer(&self) -> &HookTransfer {
        &self.transfer
    }

    pub fn hook_accounts(&self) -> &HookResolution {
        &self.hook_accounts
    }

    /// Hook accounts, refusing a partially resolved list.
    pub fn require_complete_accounts(&self) -> HookAmmResult<&[ExtraAccount]> {
        match &self.hook_accounts.warning {
            None => Ok(&self.hook_accounts.accounts),
            Some(warning) => Err(HookAmmError::PartialHookResolution {
                resolved: self.hook_accounts.accounts.len(),
                warning: warning.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TradeRequestBuilder {
    accounts: TradeAccounts,
    slippage_bps: u16,
}

impl TradeRequestBuilder {
    pub fn new(accounts: TradeAccounts, slippage_bps: u16) -> Self {
        Self {
            accounts,
            slippage_bps,
        }
    }

    /// The token transfer the program performs for this trade.
    ///
    /// A sell moves the user's tokens into the curve; a buy moves the quoted
    /// tokens out of the curve. Either way the amount is in tokens.
    pub fn hook_transfer(&self, intent: TradeIntent, quote: &Quote) -> HookTransfer {
        let TradeAccounts {
            mint,
            curve_token_account,
            user_token_account,
            owner,
        } = self.accounts;

        match intent {
            TradeIntent::Sell { token_amount_in } => HookTransfer {
                source: user_token_account,
                mint,
                destination: curve_token_account,
                owner,
                amount: token_amount_in,
            },
            TradeIntent::Buy { .. } => HookTransfer {
                source: curve_token_account,
                mint,
                destination: user_token_account,
                owner,
                amount: quote.amount_out,
            },
        }
    }

    pub fn build(
        &self,
        intent: TradeIntent,
        quote: Quote,
        hook: Option<&HookDescriptor>,
        resolver: &HookAccountResolver,
        account_map: &AccountMap,
    ) -> HookAmmResult<TradeRequest> {
        if quote.intent != intent {
            return Err(HookAmmError::InvalidAmount);
        }

        let minimum_amount_out = quote.minimum_amount_out(self.slippage_bps)?;
        let transfer = self.hook_transfer(intent, &quote);
        let hook_accounts = resolver.resolve(hook, &transfer, account_map);

        Ok(TradeRequest {
            quote,
            slippage_bps: self.slippage_bps,
            minimum_amount_out,
            transfer,
            hook_accounts,
        })
    }
}
