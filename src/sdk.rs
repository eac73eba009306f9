use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, Result, bail};
use solana_account_decoder::UiAccountEncoding;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_sdk::{commitment_config::CommitmentConfig, instruction::Instruction, pubkey::Pubkey};

use crate::{
    amm::{AccountData, AccountMap, Amm, KeyedAccount, TradeParams},
    config::HookAmmConfig,
    hook_accounts::HookAccountResolver,
    hook_amm::HookAmm,
    quote::{Quote, QuoteEngine, TradeIntent},
    reserves::ReserveState,
    signer::TradeAuthority,
    state::BondingCurve,
    trade_request::TradeRequest,
    utils::{bonding_curve_filters, get_bonding_curve},
};

// curve accounts, then the hook validation account once the mint is probed
const MAX_UPDATE_ROUNDS: usize = 2;
// token accounts read by seeds can name further accounts in turn
const MAX_HOOK_DATA_ROUNDS: usize = 2;

pub struct HookAmmSDK {
    rpc_client: RpcClient,
    config: HookAmmConfig,
    resolver: Arc<HookAccountResolver>,
    hook_amm: Option<HookAmm>,
}

impl HookAmmSDK {
    /// Create a new HookAMM SDK instance
    pub fn new(config: HookAmmConfig) -> Self {
        Self::with_resolver(config, HookAccountResolver::default())
    }

    /// Create an SDK whose hook resolver knows additional seed patterns
    pub fn with_resolver(config: HookAmmConfig, resolver: HookAccountResolver) -> Self {
        let commitment_config = CommitmentConfig {
            commitment: config.commitment_level,
        };

        Self {
            rpc_client: RpcClient::new_with_commitment(
                config.rpc_endpoint.clone(),
                commitment_config,
            ),
            config,
            resolver: Arc::new(resolver),
            hook_amm: None,
        }
    }

    pub fn config(&self) -> &HookAmmConfig {
        &self.config
    }

    /// Address of the currently loaded bonding curve
    pub fn curve_address(&self) -> Option<Pubkey> {
        self.hook_amm.as_ref().map(|hook_amm| hook_amm.key())
    }

    /// Load the bonding curve of `mint` for internal state tracking
    ///
    /// # Returns
    /// Returns the bonding curve address
    pub async fn load_curve(&mut self, mint: &Pubkey) -> Result<Pubkey> {
        let curve_key = get_bonding_curve(mint, &self.config.program_id);

        let curve_account = self
            .rpc_client
            .get_account(&curve_key)
            .await
            .with_context(|| format!("Bonding curve not found for mint {}", mint))?;

        if curve_account.owner != self.config.program_id {
            bail!(
                "Bonding curve {} is owned by {}, expected {}",
                curve_key,
                curve_account.owner,
                self.config.program_id
            );
        }

        let keyed_curve = KeyedAccount {
            key: curve_key,
            account: AccountData {
                data: curve_account.data,
                owner: curve_account.owner,
            },
        };

        let hook_amm = HookAmm::load_curve(&keyed_curve)?
            .with_engine(QuoteEngine::new(self.config.fee_basis_points))
            .with_resolver(self.resolver.clone());
        self.hook_amm = Some(hook_amm);

        Ok(curve_key)
    }

    /// Update account data from the blockchain
    ///
    /// Fetches every account the loaded curve depends on. When the mint turns
    /// out to carry a transfer hook, a second round fetches the hook's
    /// validation account so the extra accounts can be resolved.
    pub async fn update_accounts(&mut self) -> Result<()> {
        let hook_amm = self
            .hook_amm
            .as_mut()
            .context("Bonding curve not loaded, call load_curve first")?;

        for _ in 0..MAX_UPDATE_ROUNDS {
            let accounts_to_update = hook_amm.get_accounts_to_update();
            let account_map = fetch_accounts(&self.rpc_client, &accounts_to_update)
                .await
                .context("Failed to fetch curve accounts")?;
            hook_amm.update(&account_map)?;

            if hook_amm.get_accounts_to_update() == accounts_to_update {
                break;
            }
        }

        Ok(())
    }

    /// All bonding curves of the program
    pub async fn get_curves(&self) -> Result<Vec<(Pubkey, BondingCurve)>> {
        self.find_curves(None).await
    }

    /// Bonding curves launched by `creator`
    pub async fn get_curves_by_creator(
        &self,
        creator: &Pubkey,
    ) -> Result<Vec<(Pubkey, BondingCurve)>> {
        self.find_curves(Some(creator)).await
    }

    async fn find_curves(&self, creator: Option<&Pubkey>) -> Result<Vec<(Pubkey, BondingCurve)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(bonding_curve_filters(creator)),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.rpc_client.commitment()),
                ..Default::default()
            },
            ..Default::default()
        };
        let accounts = self
            .rpc_client
            .get_program_accounts_with_config(&self.config.program_id, config)
            .await
            .context("Failed to fetch bonding curves")?;

        let mut curves = Vec::with_capacity(accounts.len());
        for (key, account) in accounts {
            match BondingCurve::decode(&key, &account.data) {
                Ok(curve) => curves.push((key, curve)),
                Err(err) => log::warn!("Skipping bonding curve {}: {}", key, err),
            }
        }
        Ok(curves)
    }

    /// Reserves of the loaded curve as of the last update
    pub fn reserve_state(&self) -> Result<ReserveState> {
        Ok(self.hook_amm()?.reserve_state())
    }

    /// Get a quote for a trade
    ///
    /// Loads the curve of `mint` if needed and always refreshes its accounts
    /// first, so the quote reflects the latest reserves.
    pub async fn quote(&mut self, mint: &Pubkey, intent: TradeIntent) -> Result<Quote> {
        self.refresh(mint).await?;
        self.hook_amm()?.quote(intent)
    }

    /// Quote, minimum output and resolved hook accounts for a trade
    ///
    /// A partially resolved hook account list is returned as is, see
    /// [`TradeRequest::require_complete_accounts`].
    pub async fn trade_request(
        &mut self,
        mint: &Pubkey,
        intent: TradeIntent,
        authority: &TradeAuthority,
        slippage_bps: Option<u16>,
    ) -> Result<TradeRequest> {
        self.refresh(mint).await?;
        let trade_params = self.trade_params(intent, authority, slippage_bps);
        self.load_hook_data_accounts(&trade_params).await?;
        self.hook_amm()?.trade_request(&trade_params)
    }

    /// Create the instructions for a buy spending `sol_amount_in` lamports
    ///
    /// # Returns
    /// Returns the idempotent creation of the authority's token account followed by the buy
    /// instruction, in transaction order; `authority` must sign both
    pub async fn buy_ix(
        &mut self,
        mint: &Pubkey,
        sol_amount_in: u64,
        authority: &TradeAuthority,
        slippage_bps: Option<u16>,
    ) -> Result<Vec<Instruction>> {
        self.trade_ix(mint, TradeIntent::Buy { sol_amount_in }, authority, slippage_bps)
            .await
    }

    /// Create the instructions for a sell of `token_amount_in` tokens
    ///
    /// # Returns
    /// Returns the sell instruction ready to be added to a transaction; `authority` must sign it
    pub async fn sell_ix(
        &mut self,
        mint: &Pubkey,
        token_amount_in: u64,
        authority: &TradeAuthority,
        slippage_bps: Option<u16>,
    ) -> Result<Vec<Instruction>> {
        self.trade_ix(mint, TradeIntent::Sell { token_amount_in }, authority, slippage_bps)
            .await
    }

    async fn trade_ix(
        &mut self,
        mint: &Pubkey,
        intent: TradeIntent,
        authority: &TradeAuthority,
        slippage_bps: Option<u16>,
    ) -> Result<Vec<Instruction>> {
        self.refresh(mint).await?;
        if !self.hook_amm()?.is_active() {
            bail!("Bonding curve for mint {} is complete", mint);
        }

        let trade_params = self.trade_params(intent, authority, slippage_bps);
        self.load_hook_data_accounts(&trade_params).await?;
        self.hook_amm()?
            .trade_instructions(&trade_params)
            .context("Failed to get trade instruction and account metadata")
    }

    /// Fetch the accounts whose data feeds the hook's seeds until resolution
    /// needs nothing more from the network
    async fn load_hook_data_accounts(&mut self, trade_params: &TradeParams) -> Result<()> {
        let hook_amm = self
            .hook_amm
            .as_mut()
            .context("Bonding curve not loaded, call load_curve first")?;

        for _ in 0..MAX_HOOK_DATA_ROUNDS {
            let missing = hook_amm.missing_hook_accounts(trade_params)?;
            if missing.is_empty() {
                break;
            }
            let account_map = fetch_accounts(&self.rpc_client, &missing)
                .await
                .context("Failed to fetch transfer hook data accounts")?;
            if account_map.is_empty() {
                // e.g. a token account a buy has yet to create
                log::warn!("Transfer hook data accounts {:?} do not exist yet", missing);
                break;
            }
            hook_amm.insert_accounts(account_map);
        }

        Ok(())
    }

    async fn refresh(&mut self, mint: &Pubkey) -> Result<()> {
        let loaded = self.hook_amm.as_ref().map(|hook_amm| hook_amm.get_mint());
        if loaded != Some(*mint) {
            self.load_curve(mint).await?;
        }
        self.update_accounts().await
    }

    fn trade_params(
        &self,
        intent: TradeIntent,
        authority: &TradeAuthority,
        slippage_bps: Option<u16>,
    ) -> TradeParams {
        TradeParams {
            intent,
            user: authority.pubkey(),
            user_token_account: None,
            slippage_bps: slippage_bps.unwrap_or(self.config.default_slippage_bps),
        }
    }

    fn hook_amm(&self) -> Result<&HookAmm> {
        self.hook_amm
            .as_ref()
            .context("Bonding curve not loaded, call load_curve first")
    }
}

async fn fetch_accounts(rpc_client: &RpcClient, keys: &[Pubkey]) -> Result<AccountMap> {
    let accounts = rpc_client.get_multiple_accounts(keys).await?;

    let mut account_map: AccountMap = HashMap::new();
    for (account_key, account) in keys.iter().zip(accounts) {
        match account {
            Some(account) => {
                account_map.insert(
                    *account_key,
                    AccountData {
                        data: account.data,
                        owner: account.owner,
                    },
                );
            }
            None => log::warn!("Account {} does not exist", account_key),
        }
    }
    Ok(account_map)
}
