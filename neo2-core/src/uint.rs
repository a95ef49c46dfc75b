//! Fixed-width hash integers.
//!
//! Stored little-endian, formatted big-endian (reversed hex), matching the
//! protocol's text convention.

use thiserror::Error;

/// Error for slice conversions of the wrong length.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid length {actual}, expected {expected} bytes")]
pub struct InvalidLength {
    expected: usize,
    actual: usize,
}

const U160_LEN: usize = 20;
const U256_LEN: usize = 32;

/// 160-bit identifier: the hash of a script.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct UInt160([u8; U160_LEN]);

impl UInt160 {
    /// Width in bytes.
    pub const LENGTH: usize = U160_LEN;
    /// The all-zero value.
    pub const ZERO: Self = Self([0u8; U160_LEN]);

    /// Wraps raw bytes.
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; U160_LEN]) -> Self {
        Self(bytes)
    }

    /// Converts from a slice, checking the length.
    pub fn from_slice(slice: &[u8]) -> Result<Self, InvalidLength> {
        let bytes: [u8; U160_LEN] = slice.try_into().map_err(|_| InvalidLength {
            expected: U160_LEN,
            actual: slice.len(),
        })?;
        Ok(Self(bytes))
    }

    /// The hash of the given script bytes.
    #[must_use]
    pub fn from_script(script: &[u8]) -> Self {
        Self(neo2_vm::crypto::hash160(script))
    }

    /// The raw bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; U160_LEN] {
        &self.0
    }

    /// The raw bytes as a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Whether every byte is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }
}

impl std::fmt::Display for UInt160 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "0x{}", hex::encode(reversed))
    }
}

impl std::fmt::Debug for UInt160 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UInt160({self})")
    }
}

/// 256-bit identifier: a block or transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct UInt256([u8; U256_LEN]);

impl UInt256 {
    /// Width in bytes.
    pub const LENGTH: usize = U256_LEN;
    /// The all-zero value.
    pub const ZERO: Self = Self([0u8; U256_LEN]);

    /// Wraps raw bytes.
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; U256_LEN]) -> Self {
        Self(bytes)
    }

    /// Converts from a slice, checking the length.
    pub fn from_slice(slice: &[u8]) -> Result<Self, InvalidLength> {
        let bytes: [u8; U256_LEN] = slice.try_into().map_err(|_| InvalidLength {
            expected: U256_LEN,
            actual: slice.len(),
        })?;
        Ok(Self(bytes))
    }

    /// The raw bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; U256_LEN] {
        &self.0
    }

    /// The raw bytes as a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl std::fmt::Display for UInt256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "0x{}", hex::encode(reversed))
    }
}

impl std::fmt::Debug for UInt256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UInt256({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_reverses_bytes() {
        let mut bytes = [0u8; 20];
        bytes[0] = 0x01;
        bytes[19] = 0xFF;
        let value = UInt160::new(bytes);
        let text = value.to_string();
        assert!(text.starts_with("0xff"));
        assert!(text.ends_with("01"));
    }

    #[test]
    fn from_slice_checks_length() {
        assert!(UInt160::from_slice(&[0u8; 20]).is_ok());
        assert!(UInt160::from_slice(&[0u8; 19]).is_err());
        assert!(UInt256::from_slice(&[0u8; 32]).is_ok());
        assert!(UInt256::from_slice(&[0u8; 33]).is_err());
    }

    #[test]
    fn script_hash_is_deterministic() {
        let a = UInt160::from_script(&[0x61]);
        let b = UInt160::from_script(&[0x61]);
        assert_eq!(a, b);
        assert!(!a.is_zero());
    }
}
