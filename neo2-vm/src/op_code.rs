//! Opcode set of the legacy Neo virtual machine.
//!
//! Opcodes are a single byte; the inclusive range `PUSHBYTES1..=PUSHBYTES75`
//! encodes the payload length in the opcode value itself, so the type wraps
//! the raw byte instead of enumerating every member.

/// A single-byte opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpCode(pub u8);

#[allow(missing_docs)]
impl OpCode {
    // Constants
    /// Push an empty byte array onto the stack.
    pub const PUSH0: OpCode = OpCode(0x00);
    /// Push the next 1 byte onto the stack. Opcodes up to [`Self::PUSHBYTES75`]
    /// push as many bytes as their own value.
    pub const PUSHBYTES1: OpCode = OpCode(0x01);
    /// Push the next 75 bytes onto the stack.
    pub const PUSHBYTES75: OpCode = OpCode(0x4B);
    /// Push data with a 1-byte length prefix.
    pub const PUSHDATA1: OpCode = OpCode(0x4C);
    /// Push data with a 2-byte length prefix.
    pub const PUSHDATA2: OpCode = OpCode(0x4D);
    /// Push data with a 4-byte length prefix.
    pub const PUSHDATA4: OpCode = OpCode(0x4E);
    /// Push the integer -1 onto the stack.
    pub const PUSHM1: OpCode = OpCode(0x4F);
    /// Push the integer 1 onto the stack. Opcodes up to [`Self::PUSH16`] push
    /// their offset from 0x50.
    pub const PUSH1: OpCode = OpCode(0x51);
    /// Push the integer 2 onto the stack.
    pub const PUSH2: OpCode = OpCode(0x52);
    /// Push the integer 3 onto the stack.
    pub const PUSH3: OpCode = OpCode(0x53);
    /// Push the integer 5 onto the stack.
    pub const PUSH5: OpCode = OpCode(0x55);
    /// Push the integer 7 onto the stack.
    pub const PUSH7: OpCode = OpCode(0x57);
    /// Push the integer 8 onto the stack.
    pub const PUSH8: OpCode = OpCode(0x58);
    /// Push the integer 9 onto the stack.
    pub const PUSH9: OpCode = OpCode(0x59);
    /// Push the integer 16 onto the stack; the last constant-push opcode.
    pub const PUSH16: OpCode = OpCode(0x60);

    // Flow control
    pub const NOP: OpCode = OpCode(0x61);
    pub const JMP: OpCode = OpCode(0x62);
    pub const JMPIF: OpCode = OpCode(0x63);
    pub const JMPIFNOT: OpCode = OpCode(0x64);
    pub const CALL: OpCode = OpCode(0x65);
    pub const RET: OpCode = OpCode(0x66);
    pub const APPCALL: OpCode = OpCode(0x67);
    pub const SYSCALL: OpCode = OpCode(0x68);
    pub const TAILCALL: OpCode = OpCode(0x69);

    // Stack
    pub const DUPFROMALTSTACK: OpCode = OpCode(0x6A);
    pub const TOALTSTACK: OpCode = OpCode(0x6B);
    pub const FROMALTSTACK: OpCode = OpCode(0x6C);
    pub const XDROP: OpCode = OpCode(0x6D);
    pub const XSWAP: OpCode = OpCode(0x72);
    pub const XTUCK: OpCode = OpCode(0x73);
    pub const DEPTH: OpCode = OpCode(0x74);
    pub const DROP: OpCode = OpCode(0x75);
    pub const DUP: OpCode = OpCode(0x76);
    pub const NIP: OpCode = OpCode(0x77);
    pub const OVER: OpCode = OpCode(0x78);
    pub const PICK: OpCode = OpCode(0x79);
    pub const ROLL: OpCode = OpCode(0x7A);
    pub const ROT: OpCode = OpCode(0x7B);
    pub const SWAP: OpCode = OpCode(0x7C);
    pub const TUCK: OpCode = OpCode(0x7D);

    // Splice
    pub const CAT: OpCode = OpCode(0x7E);
    pub const SUBSTR: OpCode = OpCode(0x7F);
    pub const LEFT: OpCode = OpCode(0x80);
    pub const RIGHT: OpCode = OpCode(0x81);
    pub const SIZE: OpCode = OpCode(0x82);

    // Bitwise logic
    pub const INVERT: OpCode = OpCode(0x83);
    pub const AND: OpCode = OpCode(0x84);
    pub const OR: OpCode = OpCode(0x85);
    pub const XOR: OpCode = OpCode(0x86);
    pub const EQUAL: OpCode = OpCode(0x87);

    // Arithmetic
    pub const INC: OpCode = OpCode(0x8B);
    pub const DEC: OpCode = OpCode(0x8C);
    pub const SIGN: OpCode = OpCode(0x8D);
    pub const NEGATE: OpCode = OpCode(0x8F);
    pub const ABS: OpCode = OpCode(0x90);
    pub const NOT: OpCode = OpCode(0x91);
    pub const NZ: OpCode = OpCode(0x92);
    pub const ADD: OpCode = OpCode(0x93);
    pub const SUB: OpCode = OpCode(0x94);
    pub const MUL: OpCode = OpCode(0x95);
    pub const DIV: OpCode = OpCode(0x96);
    pub const MOD: OpCode = OpCode(0x97);
    pub const SHL: OpCode = OpCode(0x98);
    pub const SHR: OpCode = OpCode(0x99);
    pub const BOOLAND: OpCode = OpCode(0x9A);
    pub const BOOLOR: OpCode = OpCode(0x9B);
    pub const NUMEQUAL: OpCode = OpCode(0x9C);
    pub const NUMNOTEQUAL: OpCode = OpCode(0x9E);
    pub const LT: OpCode = OpCode(0x9F);
    pub const GT: OpCode = OpCode(0xA0);
    pub const LTE: OpCode = OpCode(0xA1);
    pub const GTE: OpCode = OpCode(0xA2);
    pub const MIN: OpCode = OpCode(0xA3);
    pub const MAX: OpCode = OpCode(0xA4);
    pub const WITHIN: OpCode = OpCode(0xA5);

    // Crypto
    pub const SHA1: OpCode = OpCode(0xA7);
    pub const SHA256: OpCode = OpCode(0xA8);
    pub const HASH160: OpCode = OpCode(0xA9);
    pub const HASH256: OpCode = OpCode(0xAA);
    pub const CHECKSIG: OpCode = OpCode(0xAC);
    pub const VERIFY: OpCode = OpCode(0xAD);
    pub const CHECKMULTISIG: OpCode = OpCode(0xAE);

    // Compound types
    pub const ARRAYSIZE: OpCode = OpCode(0xC0);
    pub const PACK: OpCode = OpCode(0xC1);
    pub const UNPACK: OpCode = OpCode(0xC2);
    pub const PICKITEM: OpCode = OpCode(0xC3);
    pub const SETITEM: OpCode = OpCode(0xC4);
    pub const NEWARRAY: OpCode = OpCode(0xC5);
    pub const NEWSTRUCT: OpCode = OpCode(0xC6);
    pub const NEWMAP: OpCode = OpCode(0xC7);
    pub const APPEND: OpCode = OpCode(0xC8);
    pub const REVERSE: OpCode = OpCode(0xC9);
    pub const REMOVE: OpCode = OpCode(0xCA);
    pub const HASKEY: OpCode = OpCode(0xCB);
    pub const KEYS: OpCode = OpCode(0xCC);
    pub const VALUES: OpCode = OpCode(0xCD);

    // Exceptions
    pub const THROW: OpCode = OpCode(0xF0);
    pub const THROWIFNOT: OpCode = OpCode(0xF1);
}

impl OpCode {
    /// The raw opcode byte.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether this opcode only pushes a constant (value at or below
    /// [`Self::PUSH16`]). These opcodes are free under the gas model and grow
    /// the stack by exactly one item.
    #[inline]
    #[must_use]
    pub const fn is_push_constant(self) -> bool {
        self.0 <= Self::PUSH16.0
    }

    /// Whether this opcode is a direct `PUSHBYTESn`.
    #[inline]
    #[must_use]
    pub const fn is_push_bytes(self) -> bool {
        self.0 >= Self::PUSHBYTES1.0 && self.0 <= Self::PUSHBYTES75.0
    }

    /// Human-readable mnemonic used by the trace recorder.
    #[must_use]
    pub fn mnemonic(self) -> String {
        if self.is_push_bytes() {
            return format!("PUSHBYTES{}", self.0);
        }
        if (Self::PUSH1.0..=Self::PUSH16.0).contains(&self.0) {
            return format!("PUSH{}", self.0 - 0x50);
        }
        let name = match self {
            Self::PUSH0 => "PUSH0",
            Self::PUSHDATA1 => "PUSHDATA1",
            Self::PUSHDATA2 => "PUSHDATA2",
            Self::PUSHDATA4 => "PUSHDATA4",
            Self::PUSHM1 => "PUSHM1",
            Self::NOP => "NOP",
            Self::JMP => "JMP",
            Self::JMPIF => "JMPIF",
            Self::JMPIFNOT => "JMPIFNOT",
            Self::CALL => "CALL",
            Self::RET => "RET",
            Self::APPCALL => "APPCALL",
            Self::SYSCALL => "SYSCALL",
            Self::TAILCALL => "TAILCALL",
            Self::DUPFROMALTSTACK => "DUPFROMALTSTACK",
            Self::TOALTSTACK => "TOALTSTACK",
            Self::FROMALTSTACK => "FROMALTSTACK",
            Self::XDROP => "XDROP",
            Self::XSWAP => "XSWAP",
            Self::XTUCK => "XTUCK",
            Self::DEPTH => "DEPTH",
            Self::DROP => "DROP",
            Self::DUP => "DUP",
            Self::NIP => "NIP",
            Self::OVER => "OVER",
            Self::PICK => "PICK",
            Self::ROLL => "ROLL",
            Self::ROT => "ROT",
            Self::SWAP => "SWAP",
            Self::TUCK => "TUCK",
            Self::CAT => "CAT",
            Self::SUBSTR => "SUBSTR",
            Self::LEFT => "LEFT",
            Self::RIGHT => "RIGHT",
            Self::SIZE => "SIZE",
            Self::INVERT => "INVERT",
            Self::AND => "AND",
            Self::OR => "OR",
            Self::XOR => "XOR",
            Self::EQUAL => "EQUAL",
            Self::INC => "INC",
            Self::DEC => "DEC",
            Self::SIGN => "SIGN",
            Self::NEGATE => "NEGATE",
            Self::ABS => "ABS",
            Self::NOT => "NOT",
            Self::NZ => "NZ",
            Self::ADD => "ADD",
            Self::SUB => "SUB",
            Self::MUL => "MUL",
            Self::DIV => "DIV",
            Self::MOD => "MOD",
            Self::SHL => "SHL",
            Self::SHR => "SHR",
            Self::BOOLAND => "BOOLAND",
            Self::BOOLOR => "BOOLOR",
            Self::NUMEQUAL => "NUMEQUAL",
            Self::NUMNOTEQUAL => "NUMNOTEQUAL",
            Self::LT => "LT",
            Self::GT => "GT",
            Self::LTE => "LTE",
            Self::GTE => "GTE",
            Self::MIN => "MIN",
            Self::MAX => "MAX",
            Self::WITHIN => "WITHIN",
            Self::SHA1 => "SHA1",
            Self::SHA256 => "SHA256",
            Self::HASH160 => "HASH160",
            Self::HASH256 => "HASH256",
            Self::CHECKSIG => "CHECKSIG",
            Self::VERIFY => "VERIFY",
            Self::CHECKMULTISIG => "CHECKMULTISIG",
            Self::ARRAYSIZE => "ARRAYSIZE",
            Self::PACK => "PACK",
            Self::UNPACK => "UNPACK",
            Self::PICKITEM => "PICKITEM",
            Self::SETITEM => "SETITEM",
            Self::NEWARRAY => "NEWARRAY",
            Self::NEWSTRUCT => "NEWSTRUCT",
            Self::NEWMAP => "NEWMAP",
            Self::APPEND => "APPEND",
            Self::REVERSE => "REVERSE",
            Self::REMOVE => "REMOVE",
            Self::HASKEY => "HASKEY",
            Self::KEYS => "KEYS",
            Self::VALUES => "VALUES",
            Self::THROW => "THROW",
            Self::THROWIFNOT => "THROWIFNOT",
            _ => return format!("UNKNOWN({:#04x})", self.0),
        };
        name.to_string()
    }
}

impl From<u8> for OpCode {
    #[inline]
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}
