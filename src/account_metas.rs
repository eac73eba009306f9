use anchor_lang::prelude::AccountMeta;
use solana_sdk::pubkey::Pubkey;

/// Accounts of the `buy` and `sell` instructions, which share one layout.
pub(crate) struct HookAmmTrade {
    pub bonding_curve: Pubkey,
    pub curve_token_account: Pubkey,
    pub user_token_account: Pubkey,
    pub user: Pubkey,
    pub mint: Pubkey,
    pub global_config: Pubkey,
    pub fee_recipient: Pubkey,
    pub token_program: Pubkey,
    pub associated_token_program: Pubkey,
    pub system_program: Pubkey,
    pub rent: Pubkey,
}

impl From<HookAmmTrade> for Vec<AccountMeta> {
    fn from(accounts: HookAmmTrade) -> Self {
        vec![
            AccountMeta::new(accounts.bonding_curve, false),
            AccountMeta::new(accounts.curve_token_account, false),
            AccountMeta::new(accounts.user_token_account, false),
            AccountMeta::new(accounts.user, true),
            AccountMeta::new_readonly(accounts.mint, false),
            AccountMeta::new_readonly(accounts.global_config, false),
            AccountMeta::new(accounts.fee_recipient, false),
            AccountMeta::new_readonly(accounts.token_program, false),
            AccountMeta::new_readonly(accounts.associated_token_program, false),
            AccountMeta::new_readonly(accounts.system_program, false),
            AccountMeta::new_readonly(accounts.rent, false),
        ]
    }
}
