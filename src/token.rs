//! Mint inspection: which token program owns a mint, and whether transfers of
//! it are routed through a transfer hook program.

use solana_sdk::pubkey::Pubkey;
use spl_token_2022::{
    extension::{BaseStateWithExtensions, StateWithExtensions, transfer_hook::TransferHook},
    state::Mint,
};

use crate::{
    amm::AccountData,
    error::{HookAmmError, HookAmmResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenProgramKind {
    /// Owned by the original token program, which has no extensions.
    Classic,
    /// Owned by the token-2022 program; may carry a transfer hook.
    ExtendedWithHooks,
}

impl TokenProgramKind {
    pub fn from_owner(owner: &Pubkey) -> Option<Self> {
        match owner {
            owner if *owner == spl_token::ID => Some(TokenProgramKind::Classic),
            owner if *owner == spl_token_2022::ID => Some(TokenProgramKind::ExtendedWithHooks),
            _ => None,
        }
    }

    pub fn program_id(&self) -> Pubkey {
        match self {
            TokenProgramKind::Classic => spl_token::ID,
            TokenProgramKind::ExtendedWithHooks => spl_token_2022::ID,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookDescriptor {
    pub program_id: Pubkey,
}

/// What a single look at a mint account tells us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintProbe {
    pub mint: Pubkey,
    pub kind: TokenProgramKind,
    pub hook: Option<HookDescriptor>,
}

/// Classifies `account` as a mint and extracts its transfer hook, if any.
///
/// Classic mints are never parsed. For token-2022 mints a parse failure or a
/// missing/unset `TransferHook` extension means "no hook". Only an account
/// owned by neither token program is an error.
pub fn probe_mint(mint: &Pubkey, account: &AccountData) -> HookAmmResult<MintProbe> {
    let kind = TokenProgramKind::from_owner(&account.owner).ok_or_else(|| {
        HookAmmError::HookProbeFailed {
            mint: *mint,
            reason: format!("owner {} is not a token program", account.owner),
        }
    })?;

    let hook = match kind {
        TokenProgramKind::Classic => None,
        TokenProgramKind::ExtendedWithHooks => transfer_hook_program(mint, &account.data),
    };

    Ok(MintProbe { mint: *mint, kind, hook })
}

fn transfer_hook_program(mint: &Pubkey, data: &[u8]) -> Option<HookDescriptor> {
    let state = match StateWithExtensions::<Mint>::unpack(data) {
        Ok(state) => state,
        Err(err) => {
            log::warn!("Mint {} could not be parsed as a token-2022 mint: {}", mint, err);
            return None;
        }
    };

    let Ok(hook) = state.get_extension::<TransferHook>() else {
        log::debug!("Mint {} has no transfer hook extension", mint);
        return None;
    };

    let program_id = Option::<Pubkey>::from(hook.program_id)?;
    Some(HookDescriptor { program_id })
}
