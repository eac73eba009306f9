use std::sync::Arc;

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::{Signer, SignerError},
};

/// Who authorizes a trade.
///
/// Either a keypair held in-process, or just a public key whose owner signs
/// elsewhere (a wallet, a hardware device). Fixed at construction.
#[derive(Debug, Clone)]
pub enum TradeAuthority {
    Keypair(Arc<Keypair>),
    External(Pubkey),
}

impl TradeAuthority {
    pub fn pubkey(&self) -> Pubkey {
        match self {
            TradeAuthority::Keypair(keypair) => keypair.pubkey(),
            TradeAuthority::External(pubkey) => *pubkey,
        }
    }

    pub fn can_sign(&self) -> bool {
        matches!(self, TradeAuthority::Keypair(_))
    }

    pub fn try_sign_message(&self, message: &[u8]) -> Result<Signature, SignerError> {
        match self {
            TradeAuthority::Keypair(keypair) => keypair.try_sign_message(message),
            TradeAuthority::External(pubkey) => Err(SignerError::Custom(format!(
                "{} is signed for externally",
                pubkey
            ))),
        }
    }
}

impl From<Keypair> for TradeAuthority {
    fn from(keypair: Keypair) -> Self {
        TradeAuthority::Keypair(Arc::new(keypair))
    }
}

impl From<Pubkey> for TradeAuthority {
    fn from(pubkey: Pubkey) -> Self {
        TradeAuthority::External(pubkey)
    }
}
