use std::sync::Arc;

use anchor_lang::{prelude::AccountMeta, system_program};
use anyhow::{Context, Result, bail};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, sysvar};

use crate::{
    account_metas::HookAmmTrade,
    amm::*,
    constants::{BUY_DISCRIMINATOR, SELL_DISCRIMINATOR},
    hook_accounts::HookAccountResolver,
    quote::{Quote, QuoteEngine, TradeIntent},
    reserves::ReserveState,
    state::{BondingCurve, GlobalConfig},
    token::{MintProbe, probe_mint},
    trade_request::{TradeAccounts, TradeRequest, TradeRequestBuilder},
    utils::{
        create_user_token_account_ix, get_curve_token_account, get_global_config,
        get_user_token_account,
    },
};

/// One bonding curve and everything needed to trade against it.
///
/// State only changes through [`Amm::update`], so every quote and request is
/// computed from the account snapshot passed to the last update.
#[derive(Clone)]
pub struct HookAmm {
    pub key: Pubkey,
    pub program_id: Pubkey,
    pub bonding_curve: BondingCurve,
    pub global_config: Option<GlobalConfig>,
    pub mint_probe: Option<MintProbe>,
    engine: QuoteEngine,
    resolver: Arc<HookAccountResolver>,
    snapshot: AccountMap,
}

impl HookAmm {
    pub fn with_engine(mut self, engine: QuoteEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<HookAccountResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn reserve_state(&self) -> ReserveState {
        self.bonding_curve.reserve_state()
    }

    fn global_config_key(&self) -> Pubkey {
        get_global_config(&self.program_id)
    }

    fn hook_validation_accounts(&self) -> Vec<Pubkey> {
        let hook = self.mint_probe.as_ref().and_then(|probe| probe.hook.as_ref());
        HookAccountResolver::accounts_to_fetch(hook, &self.bonding_curve.mint)
    }

    /// Quote, slippage floor and hook accounts for one trade.
    pub fn trade_request(&self, trade_params: &TradeParams) -> Result<TradeRequest> {
        let probe = self
            .mint_probe
            .as_ref()
            .context("Mint not probed yet, call update first")?;
        let mint = self.bonding_curve.mint;
        let user_token_account = trade_params.user_token_account.unwrap_or_else(|| {
            get_user_token_account(&trade_params.user, &mint, &probe.kind.program_id())
        });

        let quote = self.quote(trade_params.intent)?;
        let builder = TradeRequestBuilder::new(
            TradeAccounts {
                mint,
                curve_token_account: get_curve_token_account(&mint, &self.program_id),
                user_token_account,
                owner: trade_params.user,
            },
            trade_params.slippage_bps,
        );

        let request = builder.build(
            trade_params.intent,
            quote,
            probe.hook.as_ref(),
            &self.resolver,
            &self.snapshot,
        )?;
        Ok(request)
    }

    /// Accounts the hook reads seed data from that are not in the snapshot yet.
    ///
    /// Empty once everything the extra accounts depend on is loaded.
    pub fn missing_hook_accounts(&self, trade_params: &TradeParams) -> Result<Vec<Pubkey>> {
        let request = self.trade_request(trade_params)?;
        Ok(request.hook_accounts().missing_accounts().to_vec())
    }

    /// Adds accounts fetched after the last [`Amm::update`] to the snapshot.
    pub fn insert_accounts(&mut self, accounts: AccountMap) {
        self.snapshot.extend(accounts);
    }

    /// Instructions for one trade, in transaction order.
    ///
    /// A buy into the user's associated token account is preceded by an
    /// idempotent creation of that account.
    pub fn trade_instructions(&self, trade_params: &TradeParams) -> Result<Vec<Instruction>> {
        let Some(probe) = &self.mint_probe else {
            bail!("Mint not probed yet, call update first");
        };
        let trade_and_account_metas = self.get_trade_and_account_metas(trade_params)?;

        let mut instructions = Vec::with_capacity(2);
        if trade_params.intent.is_buy() && trade_params.user_token_account.is_none() {
            instructions.push(create_user_token_account_ix(
                &trade_params.user,
                &self.bonding_curve.mint,
                &probe.kind.program_id(),
            ));
        }
        instructions.push(Instruction {
            program_id: self.program_id(),
            accounts: trade_and_account_metas.account_metas,
            data: trade_and_account_metas.data,
        });
        Ok(instructions)
    }
}

impl Amm for HookAmm {
    fn load_curve(curve: &KeyedAccount) -> Result<Self>
    where
        Self: Sized,
    {
        Ok(HookAmm {
            key: curve.key,
            program_id: curve.account.owner,
            bonding_curve: BondingCurve::decode(&curve.key, &curve.account.data)?,
            global_config: None,
            mint_probe: None,
            engine: QuoteEngine::default(),
            resolver: Arc::new(HookAccountResolver::default()),
            snapshot: AccountMap::new(),
        })
    }

    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn key(&self) -> Pubkey {
        self.key
    }

    fn get_mint(&self) -> Pubkey {
        self.bonding_curve.mint
    }

    fn get_accounts_to_update(&self) -> Vec<Pubkey> {
        let mut accounts = vec![
            self.key,
            self.global_config_key(), // fee recipient
            self.bonding_curve.mint,  // token program and hook
        ];
        // only known once the mint has been probed
        accounts.extend(self.hook_validation_accounts());
        accounts
    }

    fn update(&mut self, account_map: &AccountMap) -> Result<()> {
        let curve_data = try_get_account_data(account_map, &self.key)
            .context("HookAMM bonding curve account not found")?;
        self.bonding_curve = BondingCurve::decode(&self.key, curve_data)?;

        let global_config_key = self.global_config_key();
        let config_data = try_get_account_data(account_map, &global_config_key)
            .context("HookAMM global config account not found")?;
        self.global_config = Some(GlobalConfig::decode(&global_config_key, config_data)?);

        let mint = self.bonding_curve.mint;
        let mint_account = account_map
            .get(&mint)
            .with_context(|| format!("Mint account {} not found", mint))?;
        self.mint_probe = Some(probe_mint(&mint, mint_account)?);

        self.snapshot = account_map.clone();

        Ok(())
    }

    fn quote(&self, intent: TradeIntent) -> Result<Quote> {
        Ok(self.engine.quote(&self.reserve_state(), intent)?)
    }

    fn get_trade_and_account_metas(
        &self,
        trade_params: &TradeParams,
    ) -> Result<TradeAndAccountMetas> {
        let Some(global_config) = &self.global_config else {
            bail!("HookAMM global config not loaded");
        };
        let Some(probe) = &self.mint_probe else {
            bail!("Mint not probed yet, call update first");
        };

        let request = self.trade_request(trade_params)?;
        request
            .require_complete_accounts()
            .context("Transfer hook accounts are incomplete")?;

        let is_buy = request.intent().is_buy();
        let discriminator = if is_buy {
            BUY_DISCRIMINATOR
        } else {
            SELL_DISCRIMINATOR
        };
        let trade = HookAmmTradeArgs {
            amount: request.intent().amount_in(),
            min_amount_out: request.minimum_amount_out(),
        };

        let mut data = discriminator.to_vec();
        data.extend_from_slice(&trade.amount.to_le_bytes());
        data.extend_from_slice(&trade.min_amount_out.to_le_bytes());

        let transfer = request.transfer();
        let user_token_account = if is_buy {
            transfer.destination
        } else {
            transfer.source
        };

        let mut account_metas: Vec<AccountMeta> = HookAmmTrade {
            bonding_curve: self.key,
            curve_token_account: get_curve_token_account(&self.bonding_curve.mint, &self.program_id),
            user_token_account,
            user: trade_params.user,
            mint: self.bonding_curve.mint,
            global_config: self.global_config_key(),
            fee_recipient: global_config.fee_recipient,
            token_program: probe.kind.program_id(),
            associated_token_program: spl_associated_token_account::ID,
            system_program: system_program::ID,
            rent: sysvar::rent::ID,
        }
        .into();
        // the token program forwards these to the transfer hook
        account_metas.extend(request.hook_accounts().account_metas());

        Ok(TradeAndAccountMetas {
            discriminator,
            trade,
            quote: *request.quote(),
            data,
            account_metas,
        })
    }

    fn is_active(&self) -> bool {
        !self.bonding_curve.complete
    }
}
