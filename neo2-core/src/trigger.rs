//! Invocation triggers.

/// The reason an engine is running a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TriggerType {
    /// The script is the verification witness of a signable payload; it must
    /// leave a truthy value on the stack.
    Verification = 0x00,
    /// The script is application code carried by an invocation transaction.
    Application = 0x10,
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verification => write!(f, "Verification"),
            Self::Application => write!(f, "Application"),
        }
    }
}
