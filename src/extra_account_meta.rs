//! Decoding of the extra-account-meta validation account a transfer hook
//! program keeps per mint.
//!
//! The account is a sequence of type-length-value entries:
//!
//! ```text
//! [discriminator: 8][length: u32 LE][value: length bytes]
//! ```
//!
//! The entry we care about is tagged with the `Execute` instruction
//! discriminator. Its value is a counted list of fixed-size metas:
//!
//! ```text
//! [count: u32 LE] count * [discriminator: u8][address_config: 32][is_signer: u8][is_writable: u8]
//! ```
//!
//! A pubkey-data entry keeps its source in the first bytes of `address_config`:
//! `[1][index]` reads 32 bytes of instruction data, `[2][account index][data index]`
//! reads 32 bytes of that account's data.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::constants::{EXECUTE_DISCRIMINATOR, EXTRA_ACCOUNT_METAS_SEED};

const TLV_DISCRIMINATOR_LEN: usize = 8;
const TLV_LENGTH_LEN: usize = 4;
const COUNT_LEN: usize = 4;
pub const EXTRA_ACCOUNT_META_LEN: usize = 35;

/// Meta discriminator for a literal address.
pub const FIXED_ADDRESS: u8 = 0;
/// Meta discriminator for a PDA of the hook program itself.
pub const HOOK_PROGRAM_PDA: u8 = 1;
/// Meta discriminator for an address stored in instruction or account data.
pub const PUBKEY_DATA: u8 = 2;
/// Meta discriminators at or above this value are PDAs of the program found
/// at account index `discriminator - EXTERNAL_PDA_BASE`.
pub const EXTERNAL_PDA_BASE: u8 = 1 << 7;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetaListError {
    #[error("TLV entry header truncated at offset {0}")]
    TruncatedHeader(usize),
    #[error("TLV entry at offset {offset} declares {length} bytes but only {available} remain")]
    TruncatedValue {
        offset: usize,
        length: usize,
        available: usize,
    },
    #[error("no Execute entry in the validation account")]
    MissingExecuteEntry,
    #[error("Execute entry declares {count} metas but holds {length} bytes")]
    CountMismatch { count: usize, length: usize },
}

/// How the address of an extra account is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaAddress {
    Fixed(Pubkey),
    HookProgramPda,
    ExternalPda { program_index: u8 },
    PubkeyData(PubkeySource),
    /// A pubkey-data entry with an unrecognized source tag.
    UnknownPubkeyData(u8),
    Unknown(u8),
}

/// Where a pubkey-data entry reads its 32 bytes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PubkeySource {
    InstructionData { index: u8 },
    AccountData { account_index: u8, data_index: u8 },
}

impl PubkeySource {
    const INSTRUCTION_DATA: u8 = 1;
    const ACCOUNT_DATA: u8 = 2;

    fn pack(&self) -> [u8; 32] {
        let mut config = [0u8; 32];
        match *self {
            PubkeySource::InstructionData { index } => {
                config[..2].copy_from_slice(&[Self::INSTRUCTION_DATA, index]);
            }
            PubkeySource::AccountData {
                account_index,
                data_index,
            } => {
                config[..3].copy_from_slice(&[Self::ACCOUNT_DATA, account_index, data_index]);
            }
        }
        config
    }

    fn unpack(config: &[u8; 32]) -> Result<Self, u8> {
        match config[0] {
            Self::INSTRUCTION_DATA => Ok(PubkeySource::InstructionData { index: config[1] }),
            Self::ACCOUNT_DATA => Ok(PubkeySource::AccountData {
                account_index: config[1],
                data_index: config[2],
            }),
            tag => Err(tag),
        }
    }
}

/// One raw entry of the Execute meta list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraAccountMetaEntry {
    pub discriminator: u8,
    pub address_config: [u8; 32],
    pub is_signer: bool,
    pub is_writable: bool,
}

impl ExtraAccountMetaEntry {
    pub fn fixed(address: Pubkey, is_signer: bool, is_writable: bool) -> Self {
        Self {
            discriminator: FIXED_ADDRESS,
            address_config: address.to_bytes(),
            is_signer,
            is_writable,
        }
    }

    pub fn hook_program_pda(seeds: [u8; 32], is_signer: bool, is_writable: bool) -> Self {
        Self {
            discriminator: HOOK_PROGRAM_PDA,
            address_config: seeds,
            is_signer,
            is_writable,
        }
    }

    pub fn pubkey_data(source: PubkeySource, is_signer: bool, is_writable: bool) -> Self {
        Self {
            discriminator: PUBKEY_DATA,
            address_config: source.pack(),
            is_signer,
            is_writable,
        }
    }

    /// `program_index` must be below 128.
    pub fn external_pda(
        program_index: u8,
        seeds: [u8; 32],
        is_signer: bool,
        is_writable: bool,
    ) -> Self {
        Self {
            discriminator: EXTERNAL_PDA_BASE | program_index,
            address_config: seeds,
            is_signer,
            is_writable,
        }
    }

    pub fn address(&self) -> MetaAddress {
        match self.discriminator {
            FIXED_ADDRESS => MetaAddress::Fixed(Pubkey::new_from_array(self.address_config)),
            HOOK_PROGRAM_PDA => MetaAddress::HookProgramPda,
            PUBKEY_DATA => match PubkeySource::unpack(&self.address_config) {
                Ok(source) => MetaAddress::PubkeyData(source),
                Err(tag) => MetaAddress::UnknownPubkeyData(tag),
            },
            d if d >= EXTERNAL_PDA_BASE => MetaAddress::ExternalPda {
                program_index: d - EXTERNAL_PDA_BASE,
            },
            d => MetaAddress::Unknown(d),
        }
    }

    fn unpack(bytes: &[u8; EXTRA_ACCOUNT_META_LEN]) -> Self {
        let mut address_config = [0u8; 32];
        address_config.copy_from_slice(&bytes[1..33]);
        Self {
            discriminator: bytes[0],
            address_config,
            is_signer: bytes[33] != 0,
            is_writable: bytes[34] != 0,
        }
    }

    fn pack_into(&self, out: &mut Vec<u8>) {
        out.push(self.discriminator);
        out.extend_from_slice(&self.address_config);
        out.push(self.is_signer as u8);
        out.push(self.is_writable as u8);
    }
}

/// Address of the validation account for `mint` under `hook_program`.
pub fn validation_address(mint: &Pubkey, hook_program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[EXTRA_ACCOUNT_METAS_SEED, mint.as_ref()], hook_program).0
}

/// Finds the Execute entry and decodes its metas in order.
pub fn unpack_execute_metas(data: &[u8]) -> Result<Vec<ExtraAccountMetaEntry>, MetaListError> {
    let value = find_tlv_value(data, &EXECUTE_DISCRIMINATOR)?;

    let count_bytes: [u8; COUNT_LEN] = value
        .get(..COUNT_LEN)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(MetaListError::TruncatedHeader(0))?;
    let count = u32::from_le_bytes(count_bytes) as usize;
    let metas = &value[COUNT_LEN..];

    if count
        .checked_mul(EXTRA_ACCOUNT_META_LEN)
        .is_none_or(|needed| needed > metas.len())
    {
        return Err(MetaListError::CountMismatch {
            count,
            length: metas.len(),
        });
    }

    Ok(metas
        .chunks_exact(EXTRA_ACCOUNT_META_LEN)
        .take(count)
        .filter_map(|chunk| chunk.try_into().ok())
        .map(ExtraAccountMetaEntry::unpack)
        .collect())
}

/// Inverse of [`unpack_execute_metas`]: a validation account holding only
/// the Execute entry.
pub fn pack_execute_metas(entries: &[ExtraAccountMetaEntry]) -> Vec<u8> {
    let value_len = COUNT_LEN + entries.len() * EXTRA_ACCOUNT_META_LEN;
    let mut data = Vec::with_capacity(TLV_DISCRIMINATOR_LEN + TLV_LENGTH_LEN + value_len);
    data.extend_from_slice(&EXECUTE_DISCRIMINATOR);
    data.extend_from_slice(&(value_len as u32).to_le_bytes());
    data.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for entry in entries {
        entry.pack_into(&mut data);
    }
    data
}

fn find_tlv_value<'a>(
    data: &'a [u8],
    discriminator: &[u8; TLV_DISCRIMINATOR_LEN],
) -> Result<&'a [u8], MetaListError> {
    let mut offset = 0;
    while offset < data.len() {
        let header_end = offset + TLV_DISCRIMINATOR_LEN + TLV_LENGTH_LEN;
        let header = data
            .get(offset..header_end)
            .ok_or(MetaListError::TruncatedHeader(offset))?;

        let (entry_discriminator, length) = header.split_at(TLV_DISCRIMINATOR_LEN);
        // zeroed space after the last entry
        if entry_discriminator.iter().all(|b| *b == 0) {
            break;
        }

        let mut length_bytes = [0u8; TLV_LENGTH_LEN];
        length_bytes.copy_from_slice(length);
        let length = u32::from_le_bytes(length_bytes) as usize;

        let value = data
            .get(header_end..header_end.saturating_add(length))
            .ok_or(MetaListError::TruncatedValue {
                offset,
                length,
                available: data.len() - header_end,
            })?;

        if entry_discriminator == discriminator {
            return Ok(value);
        }
        offset = header_end + length;
    }
    Err(MetaListError::MissingExecuteEntry)
}
