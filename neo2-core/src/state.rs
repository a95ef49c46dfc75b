//! Ledger state records held in the snapshot caches.

use crate::fixed8::Fixed8;
use crate::uint::{UInt160, UInt256};
use std::collections::HashMap;

/// Balance-holding account.
#[derive(Debug, Clone, Default)]
pub struct AccountState {
    /// Hash of the account's verification script.
    pub script_hash: UInt160,
    /// Frozen accounts cannot transfer assets.
    pub is_frozen: bool,
    /// Encoded public keys of the validators this account votes for.
    pub votes: Vec<Vec<u8>>,
    /// Asset balances.
    pub balances: HashMap<UInt256, Fixed8>,
}

/// Registered consensus candidate.
#[derive(Debug, Clone, Default)]
pub struct ValidatorState {
    /// Encoded public key.
    pub public_key: Vec<u8>,
    /// Whether the registration is active.
    pub registered: bool,
    /// Accumulated votes.
    pub votes: Fixed8,
}

/// Registered asset.
#[derive(Debug, Clone, Default)]
pub struct AssetState {
    /// The asset's identifier.
    pub asset_id: UInt256,
    /// Display name.
    pub name: String,
    /// Total amount.
    pub amount: Fixed8,
    /// Amount already issued.
    pub available: Fixed8,
    /// Decimal precision.
    pub precision: u8,
    /// Encoded owner public key.
    pub owner: Vec<u8>,
    /// Administrator script hash.
    pub admin: UInt160,
    /// Height at which the registration lapses.
    pub expiration: u32,
}

/// Key of one storage entry: owning contract plus raw key bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    /// The contract owning the entry.
    pub script_hash: UInt160,
    /// Raw key bytes.
    pub key: Vec<u8>,
}

impl StorageKey {
    /// Creates a storage key.
    #[must_use]
    pub fn new(script_hash: UInt160, key: Vec<u8>) -> Self {
        Self { script_hash, key }
    }
}

/// Value of one storage entry.
#[derive(Debug, Clone, Default)]
pub struct StorageItem {
    /// Raw value bytes.
    pub value: Vec<u8>,
}

impl StorageItem {
    /// Creates a storage item.
    #[must_use]
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }
}
