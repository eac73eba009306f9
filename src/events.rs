use anchor_lang::{AnchorDeserialize, AnchorSerialize};
use base64::prelude::{BASE64_STANDARD, Engine};
use solana_sdk::pubkey::Pubkey;

use crate::error::{HookAmmError, HookAmmResult};

// sha256("event:TradeEvent")[..8]
pub const TRADE_EVENT_DISCRIMINATOR: [u8; 8] = [189, 219, 127, 211, 78, 230, 97, 238];

const PROGRAM_DATA_PREFIX: &str = "Program data: ";

/// Emitted by the program after every settled buy or sell.
///
/// The reserves are the virtual ones after settlement.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TradeEvent {
    pub mint: Pubkey,
    pub user: Pubkey,
    pub sol_amount: u64,
    pub token_amount: u64,
    pub is_buy: bool,
    pub virtual_sol_reserves: u64,
    pub virtual_token_reserves: u64,
}

impl TradeEvent {
    /// Decode raw event bytes: discriminator followed by the Borsh payload.
    pub fn decode(data: &[u8]) -> HookAmmResult<Self> {
        let Some(payload) = data.strip_prefix(&TRADE_EVENT_DISCRIMINATOR[..]) else {
            return Err(HookAmmError::EventDecode(
                "not a TradeEvent discriminator".to_string(),
            ));
        };
        Self::deserialize(&mut &payload[..])
            .map_err(|err| HookAmmError::EventDecode(err.to_string()))
    }

    /// Every trade event found in a transaction's log messages.
    ///
    /// Lines from other programs or events are skipped.
    pub fn from_logs<S: AsRef<str>>(logs: &[S]) -> Vec<Self> {
        logs.iter()
            .filter_map(|line| line.as_ref().strip_prefix(PROGRAM_DATA_PREFIX))
            .filter_map(|encoded| BASE64_STANDARD.decode(encoded.trim()).ok())
            .filter_map(|data| Self::decode(&data).ok())
            .collect()
    }
}
