use anchor_lang::prelude::AccountMeta;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::{
    amm::AccountMap,
    constants::EXECUTE_DISCRIMINATOR,
    error::{HookAmmError, HookAmmResult},
    extra_account_meta::{
        ExtraAccountMetaEntry, MetaAddress, PubkeySource, unpack_execute_metas,
        validation_address,
    },
    seed_registry::{SeedContext, SeedPatternRegistry},
    token::HookDescriptor,
};

/// An account a hooked transfer must carry, in position order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraAccount {
    pub address: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl ExtraAccount {
    pub fn readonly(address: Pubkey) -> Self {
        Self {
            address,
            is_signer: false,
            is_writable: false,
        }
    }
}

impl From<ExtraAccount> for AccountMeta {
    fn from(account: ExtraAccount) -> Self {
        AccountMeta {
            pubkey: account.address,
            is_signer: account.is_signer,
            is_writable: account.is_writable,
        }
    }
}

/// The token leg of a trade, as the hook program sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookTransfer {
    pub source: Pubkey,
    pub mint: Pubkey,
    pub destination: Pubkey,
    pub owner: Pubkey,
    /// Always denominated in the hooked token.
    pub amount: u64,
}

impl HookTransfer {
    /// Data of the `Execute` instruction the hook program receives.
    pub fn execute_data(&self) -> Vec<u8> {
        let mut data = EXECUTE_DISCRIMINATOR.to_vec();
        data.extend_from_slice(&self.amount.to_le_bytes());
        data
    }
}

/// Why resolution stopped before the end of the meta list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartialResolution {
    #[error("extra account meta list {0} is not available")]
    MetaListUnavailable(Pubkey),
    #[error("extra account meta list {address} is malformed: {reason}")]
    MetaListMalformed { address: Pubkey, reason: String },
    #[error("extra account meta #{index} could not be resolved: {reason}")]
    UnresolvedEntry { index: usize, reason: String },
    /// The entry reads data of accounts absent from the snapshot.
    #[error("extra account meta #{index} needs data of {accounts:?}")]
    MissingAccounts { index: usize, accounts: Vec<Pubkey> },
}

/// The accounts resolved for one transfer, possibly only a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HookResolution {
    pub accounts: Vec<ExtraAccount>,
    pub warning: Option<PartialResolution>,
}

impl HookResolution {
    pub fn is_complete(&self) -> bool {
        self.warning.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Accounts to add to the snapshot before resolving again.
    pub fn missing_accounts(&self) -> &[Pubkey] {
        match &self.warning {
            Some(PartialResolution::MissingAccounts { accounts, .. }) => accounts,
            _ => &[],
        }
    }

    /// The full account list, or `PartialHookResolution` if anything is missing.
    pub fn into_accounts(self) -> HookAmmResult<Vec<ExtraAccount>> {
        match self.warning {
            None => Ok(self.accounts),
            Some(warning) => Err(HookAmmError::PartialHookResolution {
                resolved: self.accounts.len(),
                warning,
            }),
        }
    }

    pub fn account_metas(&self) -> Vec<AccountMeta> {
        self.accounts.iter().copied().map(AccountMeta::from).collect()
    }

    fn partial(accounts: Vec<ExtraAccount>, warning: PartialResolution) -> Self {
        log::warn!(
            "Transfer hook accounts partially resolved ({} accounts): {}",
            accounts.len(),
            warning
        );
        Self {
            accounts,
            warning: Some(warning),
        }
    }
}

/// Derives the extra accounts a hooked transfer needs.
///
/// Never reads the network: the validation account and any account whose
/// data feeds a seed must already be in the `AccountMap`.
#[derive(Debug, Default)]
pub struct HookAccountResolver {
    registry: SeedPatternRegistry,
}

impl HookAccountResolver {
    pub fn new(registry: SeedPatternRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SeedPatternRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SeedPatternRegistry {
        &mut self.registry
    }

    /// Accounts to read before calling [`Self::resolve`].
    pub fn accounts_to_fetch(hook: Option<&HookDescriptor>, mint: &Pubkey) -> Vec<Pubkey> {
        hook.map(|hook| vec![validation_address(mint, &hook.program_id)])
            .unwrap_or_default()
    }

    pub fn resolve(
        &self,
        hook: Option<&HookDescriptor>,
        transfer: &HookTransfer,
        account_map: &AccountMap,
    ) -> HookResolution {
        let Some(hook) = hook else {
            return HookResolution::default();
        };

        let validation = validation_address(&transfer.mint, &hook.program_id);
        let mut accounts = vec![
            ExtraAccount::readonly(hook.program_id),
            ExtraAccount::readonly(validation),
        ];

        let Some(validation_account) = account_map.get(&validation) else {
            return HookResolution::partial(
                accounts,
                PartialResolution::MetaListUnavailable(validation),
            );
        };

        let entries = match unpack_execute_metas(&validation_account.data) {
            Ok(entries) => entries,
            Err(err) => {
                return HookResolution::partial(
                    accounts,
                    PartialResolution::MetaListMalformed {
                        address: validation,
                        reason: err.to_string(),
                    },
                );
            }
        };

        let instruction_data = transfer.execute_data();
        let mut execute_keys = vec![
            transfer.source,
            transfer.mint,
            transfer.destination,
            transfer.owner,
            validation,
        ];

        for (index, entry) in entries.iter().enumerate() {
            let ctx = SeedContext {
                instruction_data: &instruction_data,
                account_keys: &execute_keys,
                account_map,
            };
            let resolved =
                self.resolve_address(entry.address(), &entry.address_config, hook, &ctx);
            let address = match resolved {
                Ok(address) => address,
                Err(reason) => {
                    let missing = self.missing_data_accounts(entry, &ctx);
                    let warning = if missing.is_empty() {
                        PartialResolution::UnresolvedEntry { index, reason }
                    } else {
                        PartialResolution::MissingAccounts {
                            index,
                            accounts: missing,
                        }
                    };
                    return HookResolution::partial(accounts, warning);
                }
            };

            execute_keys.push(address);
            accounts.push(ExtraAccount {
                address,
                is_signer: entry.is_signer,
                is_writable: entry.is_writable,
            });
        }

        log::debug!(
            "Resolved {} transfer hook accounts for mint {}",
            accounts.len(),
            transfer.mint
        );

        HookResolution {
            accounts,
            warning: None,
        }
    }

    fn resolve_address(
        &self,
        address: MetaAddress,
        address_config: &[u8; 32],
        hook: &HookDescriptor,
        ctx: &SeedContext,
    ) -> Result<Pubkey, String> {
        let program_id = match address {
            MetaAddress::Fixed(address) => return Ok(address),
            MetaAddress::HookProgramPda => hook.program_id,
            MetaAddress::ExternalPda { program_index } => *ctx
                .account_keys
                .get(program_index as usize)
                .ok_or_else(|| format!("no account at program index {}", program_index))?,
            MetaAddress::PubkeyData(source) => return pubkey_from_data(source, ctx),
            MetaAddress::UnknownPubkeyData(tag) => {
                return Err(format!("unknown pubkey data source {}", tag));
            }
            MetaAddress::Unknown(discriminator) => {
                return Err(format!("unknown address discriminator {}", discriminator));
            }
        };

        let seeds = self
            .registry
            .resolve_seeds(address_config, ctx)
            .map_err(|err| err.to_string())?;
        let seeds: Vec<&[u8]> = seeds.iter().map(Vec::as_slice).collect();

        Pubkey::try_find_program_address(&seeds, &program_id)
            .map(|(address, _)| address)
            .ok_or_else(|| format!("no program address for seeds under {}", program_id))
    }

    /// Execute accounts `entry` reads data from that `ctx` does not hold.
    fn missing_data_accounts(
        &self,
        entry: &ExtraAccountMetaEntry,
        ctx: &SeedContext,
    ) -> Vec<Pubkey> {
        let indices = match entry.address() {
            MetaAddress::HookProgramPda | MetaAddress::ExternalPda { .. } => {
                self.registry.data_account_indices(&entry.address_config)
            }
            MetaAddress::PubkeyData(PubkeySource::AccountData { account_index, .. }) => {
                vec![account_index]
            }
            _ => Vec::new(),
        };

        let mut missing: Vec<Pubkey> = Vec::new();
        for key in indices
            .into_iter()
            .filter_map(|index| ctx.account_keys.get(index as usize))
        {
            if !ctx.account_map.contains_key(key) && !missing.contains(key) {
                missing.push(*key);
            }
        }
        missing
    }
}

fn pubkey_from_data(source: PubkeySource, ctx: &SeedContext) -> Result<Pubkey, String> {
    let (data, start) = match source {
        PubkeySource::InstructionData { index } => (ctx.instruction_data, index as usize),
        PubkeySource::AccountData {
            account_index,
            data_index,
        } => {
            let key = ctx
                .account_keys
                .get(account_index as usize)
                .ok_or_else(|| format!("no account at index {}", account_index))?;
            let account = ctx
                .account_map
                .get(key)
                .ok_or_else(|| format!("data of account {} not loaded", key))?;
            (account.data.as_slice(), data_index as usize)
        }
    };

    data.get(start..start + 32)
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
        .map(Pubkey::new_from_array)
        .ok_or_else(|| format!("no pubkey at data offset {}", start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        amm::AccountData,
        extra_account_meta::pack_execute_metas,
        seed_registry::{SeedPattern, SeedPatternId, pack_seed_config},
    };
    use assert_matches::assert_matches;

    fn transfer() -> HookTransfer {
        HookTransfer {
            source: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            destination: Pubkey::new_unique(),
            owner: Pubkey::new_unique(),
            amount: 1_000,
        }
    }

    fn with_meta_list(
        hook: &HookDescriptor,
        transfer: &HookTransfer,
        entries: &[ExtraAccountMetaEntry],
    ) -> AccountMap {
        let mut map = AccountMap::new();
        map.insert(
            validation_address(&transfer.mint, &hook.program_id),
            AccountData {
                data: pack_execute_metas(entries),
                owner: hook.program_id,
            },
        );
        map
    }

    #[test]
    fn no_hook_is_empty_and_complete() {
        let resolution = HookAccountResolver::default().resolve(None, &transfer(), &AccountMap::new());
        assert!(resolution.is_empty());
        assert!(resolution.is_complete());
        assert_eq!(resolution.into_accounts(), Ok(vec![]));
        assert!(HookAccountResolver::accounts_to_fetch(None, &Pubkey::new_unique()).is_empty());
    }

    #[test]
    fn unreadable_meta_list_returns_prefix_and_warning() {
        let hook = HookDescriptor {
            program_id: Pubkey::new_unique(),
        };
        let transfer = transfer();
        let resolution = HookAccountResolver::default().resolve(Some(&hook), &transfer, &AccountMap::new());

        let validation = validation_address(&transfer.mint, &hook.program_id);
        assert_eq!(
            resolution.accounts,
            vec![ExtraAccount::readonly(hook.program_id), ExtraAccount::readonly(validation)]
        );
        assert_eq!(
            resolution.warning,
            Some(PartialResolution::MetaListUnavailable(validation))
        );
        assert_matches!(
            resolution.into_accounts(),
            Err(HookAmmError::PartialHookResolution { resolved: 2, .. })
        );
    }

    #[test]
    fn malformed_meta_list() {
        let hook = HookDescriptor {
            program_id: Pubkey::new_unique(),
        };
        let transfer = transfer();
        let mut map = AccountMap::new();
        map.insert(
            validation_address(&transfer.mint, &hook.program_id),
            AccountData {
                data: vec![1, 2, 3],
                owner: hook.program_id,
            },
        );
        let resolution = HookAccountResolver::default().resolve(Some(&hook), &transfer, &map);
        assert_eq!(resolution.accounts.len(), 2);
        assert_matches!(
            resolution.warning,
            Some(PartialResolution::MetaListMalformed { .. })
        );
    }

    #[test]
    fn resolves_fixed_and_derived_entries_in_order() {
        let hook = HookDescriptor {
            program_id: Pubkey::new_unique(),
        };
        let transfer = transfer();
        let fixed = Pubkey::new_unique();
        let counter_seeds = pack_seed_config(&[
            (SeedPatternId::LITERAL, &[7, b'c', b'o', b'u', b'n', b't', b'e', b'r']),
            (SeedPatternId::ACCOUNT_KEY, &[3]),
        ])
        .unwrap();
        // program taken from the fixed entry, which lands at execute index 5
        let external_seeds = pack_seed_config(&[(SeedPatternId::ACCOUNT_KEY, &[1])]).unwrap();

        let map = with_meta_list(
            &hook,
            &transfer,
            &[
                ExtraAccountMetaEntry::fixed(fixed, false, false),
                ExtraAccountMetaEntry::hook_program_pda(counter_seeds, false, true),
                ExtraAccountMetaEntry::external_pda(5, external_seeds, false, true),
            ],
        );

        let resolution = HookAccountResolver::default().resolve(Some(&hook), &transfer, &map);
        assert!(resolution.is_complete());

        let counter = Pubkey::find_program_address(
            &[b"counter", transfer.owner.as_ref()],
            &hook.program_id,
        )
        .0;
        let external = Pubkey::find_program_address(&[transfer.mint.as_ref()], &fixed).0;
        assert_eq!(
            resolution.into_accounts().unwrap(),
            vec![
                ExtraAccount::readonly(hook.program_id),
                ExtraAccount::readonly(validation_address(&transfer.mint, &hook.program_id)),
                ExtraAccount::readonly(fixed),
                ExtraAccount {
                    address: counter,
                    is_signer: false,
                    is_writable: true,
                },
                ExtraAccount {
                    address: external,
                    is_signer: false,
                    is_writable: true,
                },
            ]
        );
    }

    #[test]
    fn amount_seed_comes_from_execute_data() {
        let hook = HookDescriptor {
            program_id: Pubkey::new_unique(),
        };
        let transfer = transfer();
        let seeds = pack_seed_config(&[(SeedPatternId::INSTRUCTION_DATA, &[8, 8])]).unwrap();
        let map = with_meta_list(
            &hook,
            &transfer,
            &[ExtraAccountMetaEntry::hook_program_pda(seeds, false, false)],
        );

        let accounts = HookAccountResolver::default()
            .resolve(Some(&hook), &transfer, &map)
            .into_accounts()
            .unwrap();
        let expected =
            Pubkey::find_program_address(&[&transfer.amount.to_le_bytes()], &hook.program_id).0;
        assert_eq!(accounts[2].address, expected);
    }

    #[test]
    fn unknown_seed_pattern_stops_at_that_entry() {
        let hook = HookDescriptor {
            program_id: Pubkey::new_unique(),
        };
        let transfer = transfer();
        let fixed = Pubkey::new_unique();
        let mut unknown_seeds = [0u8; 32];
        unknown_seeds[0] = 0x42;
        let map = with_meta_list(
            &hook,
            &transfer,
            &[
                ExtraAccountMetaEntry::fixed(fixed, true, false),
                ExtraAccountMetaEntry::hook_program_pda(unknown_seeds, false, false),
                ExtraAccountMetaEntry::fixed(Pubkey::new_unique(), false, false),
            ],
        );

        let resolution = HookAccountResolver::default().resolve(Some(&hook), &transfer, &map);
        assert_eq!(resolution.accounts.len(), 3);
        assert_eq!(
            resolution.accounts[2],
            ExtraAccount {
                address: fixed,
                is_signer: true,
                is_writable: false,
            }
        );
        assert_matches!(
            resolution.warning,
            Some(PartialResolution::UnresolvedEntry { index: 1, .. })
        );
    }

    fn token_account_data(owner: &Pubkey) -> AccountData {
        let mut data = vec![0u8; 165];
        data[32..64].copy_from_slice(owner.as_ref());
        AccountData {
            data,
            owner: spl_token_2022::ID,
        }
    }

    #[test]
    fn pubkey_data_reads_owner_out_of_source_account() {
        let hook = HookDescriptor {
            program_id: Pubkey::new_unique(),
        };
        let transfer = transfer();
        let wallet = Pubkey::new_unique();
        let entry = ExtraAccountMetaEntry::pubkey_data(
            PubkeySource::AccountData {
                account_index: 0,
                data_index: 32,
            },
            false,
            true,
        );
        let mut map = with_meta_list(&hook, &transfer, &[entry]);

        let resolver = HookAccountResolver::default();
        let resolution = resolver.resolve(Some(&hook), &transfer, &map);
        assert_eq!(resolution.missing_accounts(), &[transfer.source]);
        assert_matches!(
            resolution.warning,
            Some(PartialResolution::MissingAccounts { index: 0, .. })
        );

        map.insert(transfer.source, token_account_data(&wallet));
        let accounts = resolver
            .resolve(Some(&hook), &transfer, &map)
            .into_accounts()
            .unwrap();
        assert_eq!(
            accounts[2],
            ExtraAccount {
                address: wallet,
                is_signer: false,
                is_writable: true,
            }
        );
    }

    #[test]
    fn pubkey_data_past_instruction_data_is_unresolved() {
        let hook = HookDescriptor {
            program_id: Pubkey::new_unique(),
        };
        let transfer = transfer();
        // execute data is only 16 bytes long
        let entry = ExtraAccountMetaEntry::pubkey_data(
            PubkeySource::InstructionData { index: 8 },
            false,
            false,
        );
        let map = with_meta_list(&hook, &transfer, &[entry]);

        let resolution = HookAccountResolver::default().resolve(Some(&hook), &transfer, &map);
        assert!(resolution.missing_accounts().is_empty());
        assert_matches!(
            resolution.warning,
            Some(PartialResolution::UnresolvedEntry { index: 0, .. })
        );
    }

    #[test]
    fn account_data_seed_names_missing_destination() {
        let hook = HookDescriptor {
            program_id: Pubkey::new_unique(),
        };
        let transfer = transfer();
        // PDA keyed on the wallet that owns the destination token account
        let seeds = pack_seed_config(&[(SeedPatternId::ACCOUNT_DATA, &[2, 32, 32])]).unwrap();
        let mut map = with_meta_list(
            &hook,
            &transfer,
            &[ExtraAccountMetaEntry::hook_program_pda(seeds, false, true)],
        );

        let resolver = HookAccountResolver::default();
        let resolution = resolver.resolve(Some(&hook), &transfer, &map);
        assert_eq!(resolution.accounts.len(), 2);
        assert_eq!(resolution.missing_accounts(), &[transfer.destination]);

        let wallet = Pubkey::new_unique();
        map.insert(transfer.destination, token_account_data(&wallet));
        let resolution = resolver.resolve(Some(&hook), &transfer, &map);
        assert!(resolution.missing_accounts().is_empty());
        let expected = Pubkey::find_program_address(&[wallet.as_ref()], &hook.program_id).0;
        assert_eq!(resolution.into_accounts().unwrap()[2].address, expected);
    }

    #[test]
    fn custom_pattern_through_registry_mut() {
        struct MintPrefix;
        impl SeedPattern for MintPrefix {
            fn encoded_len(&self, _params: &[u8]) -> Option<usize> {
                Some(0)
            }
            fn resolve(&self, _params: &[u8], ctx: &SeedContext) -> Option<Vec<u8>> {
                ctx.account_keys.get(1).map(|mint| mint.as_ref()[..4].to_vec())
            }
        }

        let hook = HookDescriptor {
            program_id: Pubkey::new_unique(),
        };
        let transfer = transfer();
        let seeds = pack_seed_config(&[(SeedPatternId(9), &[])]).unwrap();
        let map = with_meta_list(
            &hook,
            &transfer,
            &[ExtraAccountMetaEntry::hook_program_pda(seeds, false, false)],
        );

        let mut resolver = HookAccountResolver::default();
        assert!(!resolver.registry().contains(SeedPatternId(9)));
        assert!(!resolver.resolve(Some(&hook), &transfer, &map).is_complete());

        resolver.registry_mut().register(SeedPatternId(9), MintPrefix);
        let resolution = resolver.resolve(Some(&hook), &transfer, &map);
        let expected =
            Pubkey::find_program_address(&[&transfer.mint.as_ref()[..4]], &hook.program_id).0;
        assert_eq!(resolution.accounts[2].address, expected);
        assert_eq!(
            resolution.account_metas()[2],
            AccountMeta::new_readonly(expected, false)
        );
    }

    #[test]
    fn accounts_to_fetch_names_validation_account() {
        let hook = HookDescriptor {
            program_id: Pubkey::new_unique(),
        };
        let mint = Pubkey::new_unique();
        assert_eq!(
            HookAccountResolver::accounts_to_fetch(Some(&hook), &mint),
            vec![validation_address(&mint, &hook.program_id)]
        );
    }

    #[test]
    fn extra_account_into_account_meta() {
        let address = Pubkey::new_unique();
        let meta = AccountMeta::from(ExtraAccount {
            address,
            is_signer: true,
            is_writable: true,
        });
        assert_eq!(meta, AccountMeta::new(address, true));
    }
}
