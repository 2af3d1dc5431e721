use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Account, AccountCheckError};

/// Allocation of accounts, keyed by address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alloc(pub BTreeMap<Address, Account>);

impl Alloc {
    /// Creates an empty allocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `other` on top of `self` and returns the result.
    ///
    /// On address collision the accounts are merged field by field with `other` taking
    /// precedence, see [`Account::merge`].
    pub fn merge(&self, other: &Alloc) -> Alloc {
        let mut merged = self.0.clone();
        for (address, account) in &other.0 {
            let account = match merged.get(address) {
                Some(existing) => existing.merge(account),
                None => account.clone(),
            };
            merged.insert(*address, account);
        }
        Alloc(merged)
    }

    /// Merges every allocation in order; later allocations win.
    pub fn merge_all<'a>(allocs: impl IntoIterator<Item = &'a Alloc>) -> Alloc {
        allocs
            .into_iter()
            .fold(Alloc::new(), |merged, alloc| merged.merge(alloc))
    }

    /// Addresses of the accounts that are empty, see [`Account::is_empty`].
    pub fn empty_accounts(&self) -> Vec<Address> {
        self.0
            .iter()
            .filter(|(_, account)| account.is_empty())
            .map(|(address, _)| *address)
            .collect()
    }

    /// Returns the account at `address`.
    pub fn get(&self, address: &Address) -> Option<&Account> {
        self.0.get(address)
    }

    /// Inserts an account, replacing any previous one.
    pub fn insert(&mut self, address: Address, account: Account) -> Option<Account> {
        self.0.insert(address, account)
    }

    /// Returns `true` if an account exists at `address`.
    pub fn contains(&self, address: &Address) -> bool {
        self.0.contains_key(address)
    }

    /// Iterates over the accounts in address order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.0.iter()
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no accounts.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Address, Account)> for Alloc {
    fn from_iter<T: IntoIterator<Item = (Address, Account)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[(Address, Account); N]> for Alloc {
    fn from(accounts: [(Address, Account); N]) -> Self {
        Self(BTreeMap::from(accounts))
    }
}

/// Expected post-state.
///
/// A `None` entry (JSON `null`) asserts that the account does not exist.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostState(pub BTreeMap<Address, Option<Account>>);

impl PostState {
    /// Checks `got` against every expectation, in address order.
    ///
    /// Returns the first mismatch.
    pub fn verify(&self, got: &Alloc) -> Result<(), AccountCheckError> {
        for (address, expected) in &self.0 {
            match (expected, got.get(address)) {
                (None, None) => {}
                (None, Some(_)) => return Err(AccountCheckError::Unexpected(*address)),
                (Some(_), None) => return Err(AccountCheckError::NotFound(*address)),
                (Some(expected), Some(account)) => expected.check(*address, account)?,
            }
        }
        Ok(())
    }
}

impl FromIterator<(Address, Option<Account>)> for PostState {
    fn from_iter<T: IntoIterator<Item = (Address, Option<Account>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
