//! Deployed contract state and its capability flags.

use crate::uint::UInt160;
use bitflags::bitflags;

bitflags! {
    /// Capabilities stored with a deployed contract, parsed from a single
    /// byte. Future flags are additive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ContractPropertyState: u8 {
        /// The contract owns a storage area.
        const HAS_STORAGE = 1 << 0;
        /// The contract may issue calls whose target is resolved at runtime.
        const HAS_DYNAMIC_INVOKE = 1 << 1;
        /// The contract can receive assets.
        const PAYABLE = 1 << 2;
    }
}

impl ContractPropertyState {
    /// No capabilities.
    pub const NO_PROPERTY: Self = Self::empty();

    /// Parses the flag byte, ignoring unknown bits.
    #[must_use]
    pub const fn from_byte(value: u8) -> Self {
        Self::from_bits_truncate(value)
    }
}

/// A deployed contract.
#[derive(Debug, Clone)]
pub struct ContractState {
    /// The contract's script.
    pub script: Vec<u8>,
    /// Capability flags.
    pub properties: ContractPropertyState,
    /// Human-readable name.
    pub name: String,
    /// Version string recorded at deployment.
    pub code_version: String,
    /// Author recorded at deployment.
    pub author: String,
}

impl ContractState {
    /// Creates a contract state over the given script and capabilities.
    #[must_use]
    pub fn new(script: Vec<u8>, properties: ContractPropertyState, name: &str) -> Self {
        Self {
            script,
            properties,
            name: name.to_string(),
            code_version: String::new(),
            author: String::new(),
        }
    }

    /// The hash identifying this contract.
    #[must_use]
    pub fn script_hash(&self) -> UInt160 {
        UInt160::from_script(&self.script)
    }

    /// Whether the contract owns a storage area.
    #[must_use]
    pub fn has_storage(&self) -> bool {
        self.properties.contains(ContractPropertyState::HAS_STORAGE)
    }

    /// Whether the contract may call targets resolved at runtime.
    #[must_use]
    pub fn has_dynamic_invoke(&self) -> bool {
        self.properties
            .contains(ContractPropertyState::HAS_DYNAMIC_INVOKE)
    }

    /// Whether the contract can receive assets.
    #[must_use]
    pub fn payable(&self) -> bool {
        self.properties.contains(ContractPropertyState::PAYABLE)
    }
}
