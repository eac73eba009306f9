use solana_rpc_client_api::filter::{Memcmp, RpcFilterType};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};

use crate::{
    constants::{BONDING_CURVE_SEED, CURVE_TOKEN_ACCOUNT_SEED, GLOBAL_CONFIG_SEED},
    state::BONDING_CURVE_DISCRIMINATOR,
};

// discriminator, then mint
const CREATOR_OFFSET: usize = 8 + 32;

pub fn get_global_config(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[GLOBAL_CONFIG_SEED], program_id).0
}

pub fn get_bonding_curve(mint: &Pubkey, program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[BONDING_CURVE_SEED, mint.as_ref()], program_id).0
}

pub fn get_curve_token_account(mint: &Pubkey, program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[CURVE_TOKEN_ACCOUNT_SEED, mint.as_ref()], program_id).0
}

/// Associated token account of `user` for a mint owned by `token_program`.
pub fn get_user_token_account(user: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[user.as_ref(), token_program.as_ref(), mint.as_ref()],
        &spl_associated_token_account::ID,
    )
    .0
}

/// Creates the user's token account for `mint` unless it already exists.
///
/// A buy credits this account, so it goes before the buy instruction.
pub fn create_user_token_account_ix(
    user: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Instruction {
    spl_associated_token_account::instruction::create_associated_token_account_idempotent(
        user,
        user,
        mint,
        token_program,
    )
}

/// `getProgramAccounts` filters selecting bonding curves, optionally of one creator.
pub fn bonding_curve_filters(creator: Option<&Pubkey>) -> Vec<RpcFilterType> {
    let mut filters = vec![RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
        0,
        &BONDING_CURVE_DISCRIMINATOR,
    ))];
    if let Some(creator) = creator {
        filters.push(RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
            CREATOR_OFFSET,
            creator.as_ref(),
        )));
    }
    filters
}
