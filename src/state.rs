use anchor_lang::{AnchorDeserialize, AnchorSerialize};
use solana_sdk::pubkey::Pubkey;

use crate::{
    error::{HookAmmError, HookAmmResult},
    reserves::ReserveState,
};

// sha256("account:<Name>")[..8]
pub const BONDING_CURVE_DISCRIMINATOR: [u8; 8] = [23, 183, 248, 55, 96, 216, 172, 96];
pub const GLOBAL_CONFIG_DISCRIMINATOR: [u8; 8] = [149, 8, 156, 202, 160, 252, 176, 217];

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct BondingCurve {
    pub mint: Pubkey,
    pub creator: Pubkey,
    pub virtual_token_reserves: u64,
    pub virtual_sol_reserves: u64,
    pub real_token_reserves: u64,
    pub real_sol_reserves: u64,
    pub token_total_supply: u64,
    pub complete: bool,
    pub index: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    pub authority: Pubkey,
    pub fee_recipient: Pubkey,
    pub total_curves: u64,
}

impl BondingCurve {
    pub fn decode(key: &Pubkey, data: &[u8]) -> HookAmmResult<Self> {
        decode_account(key, data, &BONDING_CURVE_DISCRIMINATOR)
    }

    pub fn reserve_state(&self) -> ReserveState {
        ReserveState::from(self)
    }
}

impl GlobalConfig {
    pub fn decode(key: &Pubkey, data: &[u8]) -> HookAmmResult<Self> {
        decode_account(key, data, &GLOBAL_CONFIG_DISCRIMINATOR)
    }
}

impl From<&BondingCurve> for ReserveState {
    fn from(curve: &BondingCurve) -> Self {
        ReserveState {
            virtual_token_reserves: curve.virtual_token_reserves,
            virtual_sol_reserves: curve.virtual_sol_reserves,
            real_token_reserves: curve.real_token_reserves,
            real_sol_reserves: curve.real_sol_reserves,
            token_total_supply: curve.token_total_supply,
            complete: curve.complete,
        }
    }
}

fn decode_account<T: AnchorDeserialize>(
    key: &Pubkey,
    data: &[u8],
    discriminator: &[u8; 8],
) -> HookAmmResult<T> {
    let decode_error = |reason: String| HookAmmError::AccountDecode {
        account: *key,
        reason,
    };

    if data.len() < 8 {
        return Err(decode_error(format!("{} bytes is too short", data.len())));
    }
    if data[..8] != discriminator[..] {
        return Err(decode_error("discriminator mismatch".to_string()));
    }
    // trailing bytes are allocation padding
    T::deserialize(&mut &data[8..]).map_err(|err| decode_error(err.to_string()))
}

#[cfg(test)]
pub(crate) fn encode_account<T: AnchorSerialize>(discriminator: &[u8; 8], value: &T) -> Vec<u8> {
    let mut data = discriminator.to_vec();
    value.serialize(&mut data).unwrap();
    data
}
