//! Account byte sources
//!
//! Discovery only needs "read account bytes by address". The in-memory store
//! backs tests and snapshots fetched through `ZapClient`.

use std::collections::HashMap;

use lb_core::AccountLayout;
use solana_sdk::pubkey::Pubkey;

use crate::errors::{SdkError, SdkResult};

pub trait AccountStore {
    /// Raw account data, `None` when the account does not exist
    fn account_data(&self, address: &Pubkey) -> SdkResult<Option<Vec<u8>>>;

    /// Decode a fixed layout stored at `address`
    fn decode<T: AccountLayout>(&self, address: &Pubkey) -> SdkResult<Option<T>>
    where
        Self: Sized,
    {
        self.account_data(address)?
            .map(|data| T::decode(&data).map_err(SdkError::from))
            .transpose()
    }

    /// Like [`AccountStore::decode`] but a missing account is an error
    fn require<T: AccountLayout>(&self, address: &Pubkey) -> SdkResult<T>
    where
        Self: Sized,
    {
        self.decode(address)?
            .ok_or_else(|| SdkError::AccountNotFound(address.to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountStore {
    accounts: HashMap<Pubkey, Vec<u8>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: Pubkey, data: Vec<u8>) {
        self.accounts.insert(address, data);
    }

    pub fn remove(&mut self, address: &Pubkey) -> Option<Vec<u8>> {
        self.accounts.remove(address)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn account_data(&self, address: &Pubkey) -> SdkResult<Option<Vec<u8>>> {
        Ok(self.accounts.get(address).cloned())
    }
}

impl FromIterator<(Pubkey, Vec<u8>)> for InMemoryAccountStore {
    fn from_iter<I: IntoIterator<Item = (Pubkey, Vec<u8>)>>(iter: I) -> Self {
        Self {
            accounts: iter.into_iter().collect(),
        }
    }
}
