//! Stack item implementation.
//!
//! A tagged variant covers every value the VM manipulates. Compound items
//! (arrays, structs, maps) share mutable storage by reference; the engine is
//! single-threaded, so `Rc<RefCell<_>>` carries them.

use crate::collections::OrderedMap;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// A host object referenced from the stack (storage contexts, ledger
/// entities). Downcast through `as_any` to recover the concrete type.
pub trait InteropObject: fmt::Debug {
    /// Name of the wrapped interface, used by the trace recorder.
    fn interface_type(&self) -> &'static str;

    /// Allows downcasting to concrete types.
    fn as_any(&self) -> &dyn Any;
}

/// Represents a value on the VM stacks.
#[derive(Clone, Debug)]
pub enum StackItem {
    /// A boolean value.
    Boolean(bool),
    /// An arbitrary-precision integer.
    Integer(BigInt),
    /// An immutable byte string.
    ByteArray(Vec<u8>),
    /// An array of items, shared by reference.
    Array(Rc<RefCell<Vec<StackItem>>>),
    /// A struct: same storage as an array, but copied on assignment and
    /// compared by value.
    Struct(Rc<RefCell<Vec<StackItem>>>),
    /// A key/value map with primitive keys.
    Map(Rc<RefCell<OrderedMap>>),
    /// A host-provided object.
    InteropInterface(Rc<dyn InteropObject>),
}

impl StackItem {
    /// Creates a boolean item.
    #[inline]
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        Self::Boolean(value)
    }

    /// Creates an integer item.
    #[inline]
    pub fn from_int<T: Into<BigInt>>(value: T) -> Self {
        Self::Integer(value.into())
    }

    /// Creates a byte-string item.
    #[inline]
    pub fn from_bytes<T: Into<Vec<u8>>>(value: T) -> Self {
        Self::ByteArray(value.into())
    }

    /// Creates an array item over the given elements.
    #[must_use]
    pub fn new_array(items: Vec<StackItem>) -> Self {
        Self::Array(Rc::new(RefCell::new(items)))
    }

    /// Creates a struct item over the given elements.
    #[must_use]
    pub fn new_struct(items: Vec<StackItem>) -> Self {
        Self::Struct(Rc::new(RefCell::new(items)))
    }

    /// Creates an empty map item.
    #[must_use]
    pub fn new_map() -> Self {
        Self::Map(Rc::new(RefCell::new(OrderedMap::new())))
    }

    /// Wraps a host object.
    #[must_use]
    pub fn from_interface(value: Rc<dyn InteropObject>) -> Self {
        Self::InteropInterface(value)
    }

    /// Reads the item as an arbitrary-precision integer. Byte strings decode
    /// as little-endian two's complement (empty decodes as zero); compound
    /// items and interop handles have no integer reading.
    #[must_use]
    pub fn as_big_integer(&self) -> Option<BigInt> {
        match self {
            Self::Boolean(b) => Some(if *b { BigInt::from(1) } else { BigInt::zero() }),
            Self::Integer(v) => Some(v.clone()),
            Self::ByteArray(bytes) => {
                if bytes.is_empty() {
                    Some(BigInt::zero())
                } else {
                    Some(BigInt::from_signed_bytes_le(bytes))
                }
            }
            _ => None,
        }
    }

    /// Reads the item as a byte string. Integers encode as minimal
    /// little-endian two's complement; `true` is `[1]`, `false` is empty.
    #[must_use]
    pub fn as_byte_array(&self) -> Option<Vec<u8>> {
        match self {
            Self::Boolean(b) => Some(if *b { vec![1] } else { Vec::new() }),
            Self::Integer(v) => Some(v.to_signed_bytes_le()),
            Self::ByteArray(bytes) => Some(bytes.clone()),
            _ => None,
        }
    }

    /// Truthiness: a byte string is true when any byte is non-zero; an
    /// integer when non-zero; compound items and interop handles are true.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Integer(v) => !v.is_zero(),
            Self::ByteArray(bytes) => bytes.iter().any(|b| *b != 0),
            _ => true,
        }
    }

    /// Whether the item is an array or struct.
    #[inline]
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Struct(_))
    }

    /// The shared element storage of an array or struct.
    #[must_use]
    pub fn as_array(&self) -> Option<Rc<RefCell<Vec<StackItem>>>> {
        match self {
            Self::Array(items) | Self::Struct(items) => Some(Rc::clone(items)),
            _ => None,
        }
    }

    /// The shared storage of a map.
    #[must_use]
    pub fn as_map(&self) -> Option<Rc<RefCell<OrderedMap>>> {
        match self {
            Self::Map(entries) => Some(Rc::clone(entries)),
            _ => None,
        }
    }

    /// Whether the item may be used as a map key.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Boolean(_) | Self::Integer(_) | Self::ByteArray(_)
        )
    }

    /// The low 8 bits of the item's integer reading; zero when absent.
    #[must_use]
    pub fn low_u8(&self) -> u8 {
        self.as_big_integer()
            .map(|v| (&v & &BigInt::from(0xffu32)).to_u8().unwrap_or(0))
            .unwrap_or(0)
    }

    /// `EQUAL` semantics: primitives compare by byte representation
    /// (integers and booleans numerically among themselves), arrays and maps
    /// by reference, structs by element-wise value.
    #[must_use]
    pub fn equals(&self, other: &StackItem) -> bool {
        let mut seen = HashSet::new();
        equals_inner(self, other, &mut seen)
    }

    /// Copy semantics for assignment into compound items: structs are copied
    /// element-wise, everything else keeps its reference.
    #[must_use]
    pub fn clone_for_assignment(&self) -> StackItem {
        match self {
            Self::Struct(items) => {
                let copied = items
                    .borrow()
                    .iter()
                    .map(StackItem::clone_for_assignment)
                    .collect();
                Self::new_struct(copied)
            }
            other => other.clone(),
        }
    }
}

fn equals_inner(a: &StackItem, b: &StackItem, seen: &mut HashSet<(usize, usize)>) -> bool {
    use StackItem::{Array, Boolean, ByteArray, Integer, InteropInterface, Map, Struct};
    match (a, b) {
        (Integer(x), Integer(y)) => x == y,
        (Boolean(x), Boolean(y)) => x == y,
        (Array(x), Array(y)) => Rc::ptr_eq(x, y),
        (Map(x), Map(y)) => Rc::ptr_eq(x, y),
        (InteropInterface(x), InteropInterface(y)) => Rc::ptr_eq(x, y),
        (Struct(x), Struct(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            // Pairs already under comparison are assumed equal; this breaks
            // reference cycles threaded through nested arrays.
            let pair = (Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize);
            if !seen.insert(pair) {
                return true;
            }
            let (xs, ys) = (x.borrow(), y.borrow());
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys.iter())
                    .all(|(xi, yi)| equals_inner(xi, yi, seen))
        }
        (ByteArray(_) | Integer(_) | Boolean(_), ByteArray(_) | Integer(_) | Boolean(_)) => {
            match (a.as_byte_array(), b.as_byte_array()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        _ => false,
    }
}

impl From<bool> for StackItem {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<BigInt> for StackItem {
    fn from(value: BigInt) -> Self {
        Self::Integer(value)
    }
}

impl From<Vec<u8>> for StackItem {
    fn from(value: Vec<u8>) -> Self {
        Self::ByteArray(value)
    }
}

/// Sign of an integer as -1, 0 or 1 (helper for the `SIGN` opcode).
#[must_use]
pub fn big_int_sign(value: &BigInt) -> i8 {
    if value.is_zero() {
        0
    } else if value.is_negative() {
        -1
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_round_trip_through_bytes() {
        let item = StackItem::from_int(-1);
        assert_eq!(item.as_byte_array(), Some(vec![0xFF]));
        let back = StackItem::from_bytes(vec![0xFF]);
        assert_eq!(back.as_big_integer(), Some(BigInt::from(-1)));
    }

    #[test]
    fn empty_bytes_decode_as_zero() {
        let item = StackItem::from_bytes(Vec::new());
        assert_eq!(item.as_big_integer(), Some(BigInt::zero()));
        assert!(!item.as_bool());
    }

    #[test]
    fn booleans_as_bytes() {
        assert_eq!(StackItem::from_bool(true).as_byte_array(), Some(vec![1]));
        assert_eq!(StackItem::from_bool(false).as_byte_array(), Some(Vec::new()));
    }

    #[test]
    fn compound_items_have_no_integer_reading() {
        assert!(StackItem::new_array(Vec::new()).as_big_integer().is_none());
        assert!(StackItem::new_map().as_big_integer().is_none());
    }

    #[test]
    fn array_equality_is_by_reference() {
        let a = StackItem::new_array(vec![StackItem::from_int(1)]);
        let b = StackItem::new_array(vec![StackItem::from_int(1)]);
        assert!(!a.equals(&b));
        assert!(a.equals(&a.clone()));
    }

    #[test]
    fn struct_equality_is_by_value() {
        let a = StackItem::new_struct(vec![StackItem::from_int(1), StackItem::from_bool(true)]);
        let b = StackItem::new_struct(vec![StackItem::from_int(1), StackItem::from_bool(true)]);
        assert!(a.equals(&b));
    }

    #[test]
    fn integer_equals_its_byte_encoding() {
        let n = StackItem::from_int(256);
        let bytes = StackItem::from_bytes(vec![0x00, 0x01]);
        assert!(n.equals(&bytes));
    }

    #[test]
    fn struct_assignment_copies() {
        let original = StackItem::new_struct(vec![StackItem::from_int(7)]);
        let copy = original.clone_for_assignment();
        if let (Some(a), Some(b)) = (original.as_array(), copy.as_array()) {
            assert!(!Rc::ptr_eq(&a, &b));
        } else {
            panic!("expected struct storage");
        }
        assert!(original.equals(&copy));
    }

    #[test]
    fn low_byte_extraction() {
        assert_eq!(StackItem::from_int(0x1_02).low_u8(), 0x02);
        assert_eq!(StackItem::from_int(-1).low_u8(), 0xFF);
        assert_eq!(StackItem::new_array(Vec::new()).low_u8(), 0);
    }
}
