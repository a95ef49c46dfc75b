//! Storage context handle passed through the evaluation stack.

use crate::uint::UInt160;
use neo2_vm::InteropObject;
use std::any::Any;

/// Scopes storage operations to one contract's area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageContext {
    /// The contract whose storage area the context opens.
    pub script_hash: UInt160,
    /// Read-only contexts reject writes.
    pub is_read_only: bool,
}

impl StorageContext {
    /// Creates a read-write context for the given contract.
    #[must_use]
    pub fn new(script_hash: UInt160) -> Self {
        Self {
            script_hash,
            is_read_only: false,
        }
    }

    /// The same context, restricted to reads.
    #[must_use]
    pub fn as_read_only(&self) -> Self {
        Self {
            script_hash: self.script_hash,
            is_read_only: true,
        }
    }
}

impl InteropObject for StorageContext {
    fn interface_type(&self) -> &'static str {
        "StorageContext"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
