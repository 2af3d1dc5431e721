use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{serde_helpers::quantity, AccountCheckError};

/// Account storage, slot to value.
pub type Storage = BTreeMap<U256, U256>;

/// Account state.
///
/// Every field is optional: in a pre-state an unset field means zero / empty, in an expected
/// post-state an unset field is not checked, and in a patch fragment an unset field leaves the
/// patched account untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account nonce (transaction count)
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    /// Account balance in wei
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<U256>,
    /// Account bytecode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Bytes>,
    /// Account storage (key-value pairs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
}

impl Account {
    /// Sets the nonce.
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Sets the balance.
    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = Some(balance);
        self
    }

    /// Sets the code.
    pub fn with_code(mut self, code: impl Into<Bytes>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Sets the storage.
    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Returns `true` for an account with zero nonce, zero balance and no code.
    ///
    /// Storage is not considered.
    pub fn is_empty(&self) -> bool {
        self.nonce.unwrap_or_default() == 0
            && self.balance.unwrap_or_default().is_zero()
            && self.code.as_ref().is_none_or(|code| code.is_empty())
    }

    /// Field-level merge: every field set in `other` replaces the one in `self`.
    ///
    /// Storage is replaced as a whole, not merged slot by slot.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            nonce: other.nonce.or(self.nonce),
            balance: other.balance.or(self.balance),
            code: other.code.clone().or_else(|| self.code.clone()),
            storage: other.storage.clone().or_else(|| self.storage.clone()),
        }
    }

    /// Checks the account found at `address` against this expectation.
    ///
    /// Only the fields set on `self` are compared. Storage keys missing on either side count as
    /// zero.
    pub fn check(&self, address: Address, got: &Account) -> Result<(), AccountCheckError> {
        if let Some(want) = self.nonce {
            let got = got.nonce.unwrap_or_default();
            if want != got {
                return Err(AccountCheckError::Nonce { address, want, got });
            }
        }
        if let Some(want) = self.balance {
            let got = got.balance.unwrap_or_default();
            if want != got {
                return Err(AccountCheckError::Balance { address, want, got });
            }
        }
        if let Some(want) = &self.code {
            let got = got.code.clone().unwrap_or_default();
            if *want != got {
                return Err(AccountCheckError::Code {
                    address,
                    want: want.clone(),
                    got,
                });
            }
        }
        if let Some(want_storage) = &self.storage {
            let empty = Storage::new();
            let got_storage = got.storage.as_ref().unwrap_or(&empty);
            for (key, want) in want_storage {
                let got = got_storage.get(key).copied().unwrap_or_default();
                if *want != got {
                    return Err(AccountCheckError::Storage {
                        address,
                        key: *key,
                        want: *want,
                        got,
                    });
                }
            }
            for (key, got) in got_storage {
                if !want_storage.contains_key(key) && !got.is_zero() {
                    return Err(AccountCheckError::Storage {
                        address,
                        key: *key,
                        want: U256::ZERO,
                        got: *got,
                    });
                }
            }
        }
        Ok(())
    }
}
