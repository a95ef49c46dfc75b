//! VM execution state flags.

use bitflags::bitflags;

bitflags! {
    /// Indicates the status of the virtual machine.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct VMState: u8 {
        /// Execution has not started or is currently running.
        const NONE = 0;
        /// Execution completed successfully.
        const HALT = 1 << 0;
        /// Execution terminated because of an unhandled fault.
        const FAULT = 1 << 1;
        /// Execution is paused after a single step.
        const BREAK = 1 << 2;
    }
}

impl VMState {
    /// Returns `true` when the VM has halted successfully.
    #[must_use]
    pub fn is_halt(self) -> bool {
        self.contains(VMState::HALT)
    }

    /// Returns `true` when the VM faulted.
    #[must_use]
    pub fn is_fault(self) -> bool {
        self.contains(VMState::FAULT)
    }
}

impl std::fmt::Display for VMState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        let mut first = true;
        for (name, flag) in [
            ("HALT", VMState::HALT),
            ("FAULT", VMState::FAULT),
            ("BREAK", VMState::BREAK),
        ] {
            if self.contains(flag) {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}
