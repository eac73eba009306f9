use lazy_static::lazy_static;
use solana_sdk::{pubkey, pubkey::Pubkey};

pub const HOOK_AMM_PROGRAM_ID: Pubkey = pubkey!("9rftcX9CMpRaZJUteZ5yyY5bxy2LKSGRfp3xq9uP1SaC");

pub const FEE_BASIS_POINTS: u16 = 100; // 1%
pub const BASIS_POINTS_DENOMINATOR: u64 = 10_000;

// lamports per SOL, also the fixed-point scale of quoted prices
pub const PRICE_PRECISION: u64 = 1_000_000_000;

// SEEDS
pub const GLOBAL_CONFIG_SEED: &[u8] = b"global_config";
pub const BONDING_CURVE_SEED: &[u8] = b"bonding_curve";
pub const CURVE_TOKEN_ACCOUNT_SEED: &[u8] = b"curve_token_account";
pub const EXTRA_ACCOUNT_METAS_SEED: &[u8] = b"extra-account-metas";

// Anchor instruction discriminators, sha256("global:<name>")[..8]
pub const BUY_DISCRIMINATOR: [u8; 8] = [102, 6, 61, 18, 1, 218, 235, 234];
pub const SELL_DISCRIMINATOR: [u8; 8] = [51, 230, 133, 164, 1, 127, 131, 173];

// spl-transfer-hook-interface `Execute` instruction, also the TLV type of the
// validation account entry
pub const EXECUTE_DISCRIMINATOR: [u8; 8] = [105, 37, 101, 197, 75, 251, 102, 26];

lazy_static! {
    pub static ref GLOBAL_CONFIG: Pubkey =
        Pubkey::find_program_address(&[GLOBAL_CONFIG_SEED], &HOOK_AMM_PROGRAM_ID).0;
}
