use solana_sdk::{commitment_config::CommitmentLevel, pubkey::Pubkey};

use crate::constants::{FEE_BASIS_POINTS, HOOK_AMM_PROGRAM_ID};

pub const DEVNET_RPC_ENDPOINT: &str = "https://api.devnet.solana.com";

/// Default slippage tolerance for trades built by the SDK: 1%.
pub const DEFAULT_SLIPPAGE_BPS: u16 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookAmmConfig {
    pub rpc_endpoint: String,
    pub commitment_level: CommitmentLevel,
    pub program_id: Pubkey,
    /// Must match the program's fee, or quotes will not settle as quoted.
    pub fee_basis_points: u16,
    pub default_slippage_bps: u16,
}

impl Default for HookAmmConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: DEVNET_RPC_ENDPOINT.to_string(),
            commitment_level: CommitmentLevel::Confirmed,
            program_id: HOOK_AMM_PROGRAM_ID,
            fee_basis_points: FEE_BASIS_POINTS,
            default_slippage_bps: DEFAULT_SLIPPAGE_BPS,
        }
    }
}

impl HookAmmConfig {
    pub fn new(rpc_endpoint: &str, commitment_level: CommitmentLevel) -> Self {
        Self {
            rpc_endpoint: rpc_endpoint.to_string(),
            commitment_level,
            ..Self::default()
        }
    }
}
