//! Seed patterns used by extra-account-meta PDAs.
//!
//! A PDA meta stores its seeds packed into the 32-byte address config as a
//! run of `[pattern id][params...]` records terminated by a zero byte (or by
//! the end of the config). Each pattern id is a stable on-wire identifier;
//! how its params are laid out and turned into seed bytes is owned by the
//! [`SeedPattern`] registered under that id.

use std::collections::HashMap;

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::amm::AccountMap;

/// On-wire seed identifier. Zero is reserved as the terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeedPatternId(pub u8);

impl SeedPatternId {
    pub const LITERAL: SeedPatternId = SeedPatternId(1);
    pub const INSTRUCTION_DATA: SeedPatternId = SeedPatternId(2);
    pub const ACCOUNT_KEY: SeedPatternId = SeedPatternId(3);
    pub const ACCOUNT_DATA: SeedPatternId = SeedPatternId(4);
}

impl std::fmt::Display for SeedPatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a seed may be derived from.
#[derive(Debug, Clone, Copy)]
pub struct SeedContext<'a> {
    /// Data of the hook program's `Execute` instruction.
    pub instruction_data: &'a [u8],
    /// Accounts of the `Execute` instruction resolved so far, in order.
    pub account_keys: &'a [Pubkey],
    pub account_map: &'a AccountMap,
}

pub trait SeedPattern: Send + Sync {
    /// Number of param bytes following the id, or `None` when `params` is
    /// too short to tell.
    fn encoded_len(&self, params: &[u8]) -> Option<usize>;

    /// Seed bytes for exactly `encoded_len` bytes of `params`, or `None` when
    /// the context does not hold what the seed refers to.
    fn resolve(&self, params: &[u8], ctx: &SeedContext) -> Option<Vec<u8>>;

    /// Execute account indices whose data `resolve` reads.
    fn data_account_indices(&self, _params: &[u8]) -> Vec<u8> {
        Vec::new()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    #[error("no seed pattern registered for id {0}")]
    UnknownPattern(SeedPatternId),
    #[error("seed config truncated inside pattern {0}")]
    Truncated(SeedPatternId),
    #[error("seed pattern {0} could not be resolved")]
    Unresolvable(SeedPatternId),
}

/// `[length][bytes...]`
struct LiteralSeed;

impl SeedPattern for LiteralSeed {
    fn encoded_len(&self, params: &[u8]) -> Option<usize> {
        params.first().map(|length| 1 + *length as usize)
    }

    fn resolve(&self, params: &[u8], _ctx: &SeedContext) -> Option<Vec<u8>> {
        params.get(1..).map(<[u8]>::to_vec)
    }
}

/// `[index][length]` into the instruction data
struct InstructionDataSeed;

impl SeedPattern for InstructionDataSeed {
    fn encoded_len(&self, _params: &[u8]) -> Option<usize> {
        Some(2)
    }

    fn resolve(&self, params: &[u8], ctx: &SeedContext) -> Option<Vec<u8>> {
        let [index, length] = params else {
            return None;
        };
        let start = *index as usize;
        ctx.instruction_data
            .get(start..start + *length as usize)
            .map(<[u8]>::to_vec)
    }
}

/// `[account index]`
struct AccountKeySeed;

impl SeedPattern for AccountKeySeed {
    fn encoded_len(&self, _params: &[u8]) -> Option<usize> {
        Some(1)
    }

    fn resolve(&self, params: &[u8], ctx: &SeedContext) -> Option<Vec<u8>> {
        let [index] = params else {
            return None;
        };
        ctx.account_keys
            .get(*index as usize)
            .map(|key| key.to_bytes().to_vec())
    }
}

/// `[account index][data index][length]` into that account's data
struct AccountDataSeed;

impl SeedPattern for AccountDataSeed {
    fn encoded_len(&self, _params: &[u8]) -> Option<usize> {
        Some(3)
    }

    fn resolve(&self, params: &[u8], ctx: &SeedContext) -> Option<Vec<u8>> {
        let [account_index, data_index, length] = params else {
            return None;
        };
        let key = ctx.account_keys.get(*account_index as usize)?;
        let account = ctx.account_map.get(key)?;
        let start = *data_index as usize;
        account
            .data
            .get(start..start + *length as usize)
            .map(<[u8]>::to_vec)
    }

    fn data_account_indices(&self, params: &[u8]) -> Vec<u8> {
        params.first().copied().into_iter().collect()
    }
}

pub struct SeedPatternRegistry {
    patterns: HashMap<SeedPatternId, Box<dyn SeedPattern>>,
}

impl Default for SeedPatternRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(SeedPatternId::LITERAL, LiteralSeed);
        registry.register(SeedPatternId::INSTRUCTION_DATA, InstructionDataSeed);
        registry.register(SeedPatternId::ACCOUNT_KEY, AccountKeySeed);
        registry.register(SeedPatternId::ACCOUNT_DATA, AccountDataSeed);
        registry
    }
}

impl std::fmt::Debug for SeedPatternRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.patterns.keys().map(|id| id.0).collect();
        ids.sort_unstable();
        f.debug_struct("SeedPatternRegistry").field("ids", &ids).finish()
    }
}

impl SeedPatternRegistry {
    /// A registry without even the built-in patterns.
    pub fn empty() -> Self {
        Self {
            patterns: HashMap::new(),
        }
    }

    /// Returns the pattern previously registered under `id`, if any.
    pub fn register(
        &mut self,
        id: SeedPatternId,
        pattern: impl SeedPattern + 'static,
    ) -> Option<Box<dyn SeedPattern>> {
        self.patterns.insert(id, Box::new(pattern))
    }

    pub fn contains(&self, id: SeedPatternId) -> bool {
        self.patterns.contains_key(&id)
    }

    /// Decodes `config` and resolves every seed it names, in order.
    pub fn resolve_seeds(
        &self,
        config: &[u8; 32],
        ctx: &SeedContext,
    ) -> Result<Vec<Vec<u8>>, SeedError> {
        self.decode(config)?
            .into_iter()
            .map(|(id, pattern, params)| {
                pattern
                    .resolve(params, ctx)
                    .ok_or(SeedError::Unresolvable(id))
            })
            .collect()
    }

    /// Execute account indices whose data the seeds in `config` read.
    ///
    /// An undecodable config reads nothing.
    pub fn data_account_indices(&self, config: &[u8; 32]) -> Vec<u8> {
        let Ok(records) = self.decode(config) else {
            return Vec::new();
        };
        let mut indices: Vec<u8> = records
            .into_iter()
            .flat_map(|(_, pattern, params)| pattern.data_account_indices(params))
            .collect();
        indices.dedup();
        indices
    }

    fn decode<'c>(
        &self,
        config: &'c [u8; 32],
    ) -> Result<Vec<(SeedPatternId, &dyn SeedPattern, &'c [u8])>, SeedError> {
        let mut records = Vec::new();
        let mut offset = 0;
        while let Some(&id) = config.get(offset) {
            if id == 0 {
                break;
            }
            let id = SeedPatternId(id);
            let pattern = self
                .patterns
                .get(&id)
                .ok_or(SeedError::UnknownPattern(id))?;

            let rest = &config[offset + 1..];
            let params = pattern
                .encoded_len(rest)
                .and_then(|len| rest.get(..len))
                .ok_or(SeedError::Truncated(id))?;

            records.push((id, &**pattern, params));
            offset += 1 + params.len();
        }
        Ok(records)
    }
}

/// Packs `(id, params)` records into an address config, or `None` when they
/// do not fit in 32 bytes.
pub fn pack_seed_config(seeds: &[(SeedPatternId, &[u8])]) -> Option<[u8; 32]> {
    let mut config = [0u8; 32];
    let mut offset = 0;
    for (id, params) in seeds {
        let end = offset + 1 + params.len();
        config.get_mut(offset..end)?.copy_from_slice(
            &std::iter::once(id.0)
                .chain(params.iter().copied())
                .collect::<Vec<_>>(),
        );
        offset = end;
    }
    Some(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amm::AccountData;

    fn ctx<'a>(
        instruction_data: &'a [u8],
        account_keys: &'a [Pubkey],
        account_map: &'a AccountMap,
    ) -> SeedContext<'a> {
        SeedContext {
            instruction_data,
            account_keys,
            account_map,
        }
    }

    #[test]
    fn literal_and_account_key() {
        let keys = [Pubkey::new_unique(), Pubkey::new_unique()];
        let map = AccountMap::new();
        let config = pack_seed_config(&[
            (SeedPatternId::LITERAL, &[3, b'f', b'o', b'o']),
            (SeedPatternId::ACCOUNT_KEY, &[1]),
        ])
        .unwrap();

        let seeds = SeedPatternRegistry::default()
            .resolve_seeds(&config, &ctx(&[], &keys, &map))
            .unwrap();
        assert_eq!(seeds, vec![b"foo".to_vec(), keys[1].to_bytes().to_vec()]);
    }

    #[test]
    fn instruction_data_slice() {
        let data = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        let map = AccountMap::new();
        let config =
            pack_seed_config(&[(SeedPatternId::INSTRUCTION_DATA, &[8, 2])]).unwrap();
        let seeds = SeedPatternRegistry::default()
            .resolve_seeds(&config, &ctx(&data, &[], &map))
            .unwrap();
        assert_eq!(seeds, vec![vec![8, 9]]);

        let past_end = pack_seed_config(&[(SeedPatternId::INSTRUCTION_DATA, &[9, 2])]).unwrap();
        assert_eq!(
            SeedPatternRegistry::default().resolve_seeds(&past_end, &ctx(&data, &[], &map)),
            Err(SeedError::Unresolvable(SeedPatternId::INSTRUCTION_DATA))
        );
    }

    #[test]
    fn account_data_reads_injected_map() {
        let key = Pubkey::new_unique();
        let mut map = AccountMap::new();
        map.insert(
            key,
            AccountData {
                data: vec![10, 11, 12, 13],
                owner: Pubkey::new_unique(),
            },
        );
        let config = pack_seed_config(&[(SeedPatternId::ACCOUNT_DATA, &[0, 1, 2])]).unwrap();

        let registry = SeedPatternRegistry::default();
        assert_eq!(
            registry.resolve_seeds(&config, &ctx(&[], &[key], &map)),
            Ok(vec![vec![11, 12]])
        );
        assert_eq!(
            registry.resolve_seeds(&config, &ctx(&[], &[key], &AccountMap::new())),
            Err(SeedError::Unresolvable(SeedPatternId::ACCOUNT_DATA))
        );
    }

    #[test]
    fn data_account_indices_name_only_account_data_seeds() {
        let registry = SeedPatternRegistry::default();
        let config = pack_seed_config(&[
            (SeedPatternId::LITERAL, &[1, b'x']),
            (SeedPatternId::ACCOUNT_DATA, &[2, 0, 32]),
            (SeedPatternId::ACCOUNT_KEY, &[3]),
            (SeedPatternId::ACCOUNT_DATA, &[0, 32, 32]),
        ])
        .unwrap();
        assert_eq!(registry.data_account_indices(&config), vec![2, 0]);

        let keys_only = pack_seed_config(&[(SeedPatternId::ACCOUNT_KEY, &[3])]).unwrap();
        assert!(registry.data_account_indices(&keys_only).is_empty());

        let mut unknown = [0u8; 32];
        unknown[0] = 0x42;
        assert!(registry.data_account_indices(&unknown).is_empty());
    }

    #[test]
    fn unknown_pattern() {
        let mut config = [0u8; 32];
        config[0] = 9;
        assert_eq!(
            SeedPatternRegistry::default().resolve_seeds(&config, &ctx(&[], &[], &AccountMap::new())),
            Err(SeedError::UnknownPattern(SeedPatternId(9)))
        );
    }

    #[test]
    fn zero_byte_terminates() {
        let mut config = [0u8; 32];
        config[1] = 9;
        assert_eq!(
            SeedPatternRegistry::default().resolve_seeds(&config, &ctx(&[], &[], &AccountMap::new())),
            Ok(vec![])
        );
    }

    #[test]
    fn literal_overrunning_config_is_truncated() {
        let mut config = [0u8; 32];
        config[0] = SeedPatternId::LITERAL.0;
        config[1] = 31;
        assert_eq!(
            SeedPatternRegistry::default().resolve_seeds(&config, &ctx(&[], &[], &AccountMap::new())),
            Err(SeedError::Truncated(SeedPatternId::LITERAL))
        );
    }

    #[test]
    fn registering_a_new_pattern() {
        struct Constant;
        impl SeedPattern for Constant {
            fn encoded_len(&self, _params: &[u8]) -> Option<usize> {
                Some(0)
            }
            fn resolve(&self, _params: &[u8], _ctx: &SeedContext) -> Option<Vec<u8>> {
                Some(b"constant".to_vec())
            }
        }

        let mut registry = SeedPatternRegistry::default();
        assert!(!registry.contains(SeedPatternId(5)));
        assert!(registry.register(SeedPatternId(5), Constant).is_none());

        let config = pack_seed_config(&[(SeedPatternId(5), &[])]).unwrap();
        assert_eq!(
            registry.resolve_seeds(&config, &ctx(&[], &[], &AccountMap::new())),
            Ok(vec![b"constant".to_vec()])
        );
    }

    #[test]
    fn oversized_config_does_not_pack() {
        let literal = [0u8; 40];
        assert_eq!(pack_seed_config(&[(SeedPatternId::LITERAL, &literal)]), None);
    }
}
