use alloy_primitives::{address, b256, keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, Header, EMPTY_STRING_CODE};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::{
    serde_helpers::quantity,
    utils::{public_key_to_address, recover_address},
    TransactionError,
};

/// Secret key of the default test sender.
pub const TEST_PRIVATE_KEY: B256 =
    b256!("45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8");

/// Address of [`TEST_PRIVATE_KEY`].
pub const TEST_ADDRESS: Address = address!("a94f5374fce5edbc8e2a8697c15331677e6ebf0b");

/// Access list item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    /// Account address
    pub address: Address,
    /// Storage keys
    pub storage_keys: Vec<B256>,
}

/// A transaction as written in a state test.
///
/// It starts out unsigned with a `secret_key`; [`Transaction::with_signature_and_sender`] derives
/// the signed value. Serializes to the transition tool `txs` input format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction type. Inferred from the populated fee fields when unset.
    #[serde(
        rename = "type",
        default,
        with = "quantity::opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub ty: Option<u8>,
    #[serde(with = "quantity")]
    pub chain_id: u64,
    #[serde(with = "quantity")]
    pub nonce: u64,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u128>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<u128>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<u128>,
    #[serde(rename = "gas", alias = "gasLimit", with = "quantity")]
    pub gas_limit: u64,
    /// Recipient, `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    #[serde(rename = "input", alias = "data")]
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<AccessListItem>>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub max_fee_per_blob_gas: Option<u128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_versioned_hashes: Option<Vec<B256>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<U256>,

    /// if sender is not present we need to derive it from secret key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<B256>,

    /// Legacy transactions only: sign with EIP-155 replay protection.
    #[serde(default = "default_protected")]
    pub protected: bool,
    /// Exception the transaction is expected to raise. Never sent to the transition tool.
    #[serde(default, skip_serializing)]
    pub error: Option<String>,
}

fn default_protected() -> bool {
    true
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            ty: None,
            chain_id: 1,
            nonce: 0,
            gas_price: Some(10),
            max_priority_fee_per_gas: None,
            max_fee_per_gas: None,
            gas_limit: 21_000,
            to: Some(address!("00000000000000000000000000000000000000aa")),
            value: U256::ZERO,
            data: Bytes::new(),
            access_list: None,
            max_fee_per_blob_gas: None,
            blob_versioned_hashes: None,
            v: None,
            r: None,
            s: None,
            sender: None,
            secret_key: Some(TEST_PRIVATE_KEY),
            protected: true,
            error: None,
        }
    }
}

impl Transaction {
    /// Effective transaction type.
    pub fn tx_type(&self) -> u8 {
        if let Some(ty) = self.ty {
            return ty;
        }
        if self.max_fee_per_blob_gas.is_some() || self.blob_versioned_hashes.is_some() {
            3
        } else if self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some() {
            2
        } else if self.access_list.is_some() {
            1
        } else {
            0
        }
    }

    /// Returns the `(v, r, s)` signature values if all three are set.
    pub fn signature(&self) -> Option<(U256, U256, U256)> {
        Some((self.v?, self.r?, self.s?))
    }

    /// Hash that is signed by the sender.
    pub fn signing_hash(&self) -> Result<B256, TransactionError> {
        Ok(keccak256(self.encode(None)?))
    }

    /// Signed transaction encoding, as included in a block body.
    ///
    /// Typed transactions are prefixed with their type byte.
    pub fn rlp(&self) -> Result<Bytes, TransactionError> {
        let signature = self.signature().ok_or(TransactionError::MissingSignature)?;
        self.encode(Some(signature)).map(Into::into)
    }

    /// Transaction hash.
    pub fn hash(&self) -> Result<B256, TransactionError> {
        self.rlp().map(keccak256)
    }

    /// Returns a signed copy of this transaction with `sender` and `ty` populated.
    ///
    /// An existing signature is kept. Otherwise the transaction is signed with `secret_key`. The
    /// secret key is dropped from the copy unless `keep_secret_key` is set.
    pub fn with_signature_and_sender(&self, keep_secret_key: bool) -> Result<Self, TransactionError> {
        let mut tx = self.clone();
        // tools read a missing `type` as legacy
        tx.ty = Some(self.tx_type());
        if self.signature().is_none() {
            let secret_key = self.secret_key.ok_or(TransactionError::MissingSecretKey)?;
            let (v, r, s) = self.sign(secret_key)?;
            tx.v = Some(v);
            tx.r = Some(r);
            tx.s = Some(s);
        }
        if tx.sender.is_none() {
            tx.sender = Some(match self.secret_key {
                Some(secret_key) => recover_address(secret_key.as_slice())
                    .ok_or(TransactionError::UnknownPrivateKey(secret_key))?,
                None => tx.recover_signer()?,
            });
        }
        if !keep_secret_key {
            tx.secret_key = None;
        }
        Ok(tx)
    }

    /// Recovers the sender address from the signature.
    pub fn recover_signer(&self) -> Result<Address, TransactionError> {
        let (v, r, s) = self.signature().ok_or(TransactionError::MissingSignature)?;
        let invalid = || TransactionError::InvalidSignature { v, r, s };

        let parity = self.recovery_parity(v).ok_or_else(invalid)?;
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&r.to_be_bytes::<32>());
        bytes[32..].copy_from_slice(&s.to_be_bytes::<32>());
        let signature = Signature::from_slice(&bytes).map_err(|_| invalid())?;
        let recovery_id = RecoveryId::from_byte(parity).ok_or_else(invalid)?;

        let hash = self.signing_hash()?;
        let key = VerifyingKey::recover_from_prehash(hash.as_slice(), &signature, recovery_id)?;
        Ok(public_key_to_address(&key))
    }

    fn sign(&self, secret_key: B256) -> Result<(U256, U256, U256), TransactionError> {
        let key = SigningKey::from_slice(secret_key.as_slice())
            .map_err(|_| TransactionError::UnknownPrivateKey(secret_key))?;
        let hash = self.signing_hash()?;
        let (signature, recovery_id) = key.sign_prehash_recoverable(hash.as_slice())?;

        let bytes = signature.to_bytes();
        let r = U256::from_be_slice(&bytes[..32]);
        let s = U256::from_be_slice(&bytes[32..]);
        let parity = u64::from(recovery_id.to_byte());
        let v = match self.tx_type() {
            0 if self.protected => parity + 35 + 2 * self.chain_id,
            0 => parity + 27,
            _ => parity,
        };
        Ok((U256::from(v), r, s))
    }

    fn recovery_parity(&self, v: U256) -> Option<u8> {
        let v = u64::try_from(v).ok()?;
        let parity = match self.tx_type() {
            0 if v >= 35 => (v - 35) % 2,
            0 => v.checked_sub(27)?,
            _ => v,
        };
        u8::try_from(parity).ok().filter(|parity| *parity <= 1)
    }

    /// Legacy: `rlp([nonce, gasPrice, gas, to, value, data, (chainId, 0, 0 | v, r, s)])`.
    /// Typed: `type || rlp([chainId, nonce, fees.., gas, to, value, data, accessList, blob fields.., (v, r, s)])`.
    fn encode(&self, signature: Option<(U256, U256, U256)>) -> Result<Vec<u8>, TransactionError> {
        let ty = self.tx_type();
        let mut payload = Vec::new();
        let out = &mut payload;
        match ty {
            0 => {
                self.nonce.encode(out);
                self.gas_price.unwrap_or_default().encode(out);
                self.gas_limit.encode(out);
                encode_to(self.to, out);
                self.value.encode(out);
                self.data.encode(out);
                if signature.is_none() && self.protected {
                    self.chain_id.encode(out);
                    0u8.encode(out);
                    0u8.encode(out);
                }
            }
            1..=3 => {
                self.chain_id.encode(out);
                self.nonce.encode(out);
                if ty == 1 {
                    self.gas_price.unwrap_or_default().encode(out);
                } else {
                    self.max_priority_fee_per_gas.unwrap_or_default().encode(out);
                    self.max_fee_per_gas.unwrap_or_default().encode(out);
                }
                self.gas_limit.encode(out);
                encode_to(self.to, out);
                self.value.encode(out);
                self.data.encode(out);
                encode_access_list(self.access_list.as_deref().unwrap_or_default(), out);
                if ty == 3 {
                    self.max_fee_per_blob_gas.unwrap_or_default().encode(out);
                    self.blob_versioned_hashes
                        .clone()
                        .unwrap_or_default()
                        .encode(out);
                }
            }
            _ => return Err(TransactionError::UnsupportedType(ty)),
        }
        if let Some((v, r, s)) = signature {
            v.encode(out);
            r.encode(out);
            s.encode(out);
        }

        let mut encoded = Vec::with_capacity(payload.len() + 10);
        if ty != 0 {
            encoded.push(ty);
        }
        Header {
            list: true,
            payload_length: payload.len(),
        }
        .encode(&mut encoded);
        encoded.extend_from_slice(&payload);
        Ok(encoded)
    }
}

fn encode_to(to: Option<Address>, out: &mut Vec<u8>) {
    match to {
        Some(address) => address.encode(out),
        None => out.push(EMPTY_STRING_CODE),
    }
}

fn encode_access_list(list: &[AccessListItem], out: &mut Vec<u8>) {
    let mut items = Vec::new();
    for item in list {
        let mut fields = Vec::new();
        item.address.encode(&mut fields);
        item.storage_keys.encode(&mut fields);
        Header {
            list: true,
            payload_length: fields.len(),
        }
        .encode(&mut items);
        items.extend_from_slice(&fields);
    }
    Header {
        list: true,
        payload_length: items.len(),
    }
    .encode(out);
    out.extend_from_slice(&items);
}
