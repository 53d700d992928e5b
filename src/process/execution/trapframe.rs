/*!
 * Trap Frame
 *
 * Saved user register state. Follows the MIPS syscall convention: call
 * number and return value in `v0`, error flag in `a3`, arguments in
 * `a0..a3`, resume at `pc + 4`.
 */

use crate::core::errors::Errno;
use crate::core::limits::INSTRUCTION_SIZE;
use crate::core::types::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapFrame {
    pub pc: Address,
    pub sp: Address,
    pub v0: u64,
    pub v1: u64,
    pub a0: u64,
    pub a1: u64,
    pub a2: u64,
    pub a3: u64,
}

impl TrapFrame {
    /// Registers for a fresh program: `main(argc, argv)` at `entry`
    #[must_use]
    pub fn for_entry(entry: Address, sp: Address, argc: u64, argv: Address) -> Self {
        Self {
            pc: entry,
            sp,
            a0: argc,
            a1: argv,
            ..Self::default()
        }
    }

    /// Step past the trapping instruction
    #[inline]
    pub fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(INSTRUCTION_SIZE);
    }

    /// Store a syscall outcome
    pub fn set_return(&mut self, result: Result<u64, Errno>) {
        match result {
            Ok(value) => {
                self.v0 = value;
                self.a3 = 0;
            }
            Err(errno) => {
                self.v0 = errno.code() as u64;
                self.a3 = 1;
            }
        }
    }

    /// Decode a syscall outcome, as user code would after the trap returns
    pub fn result(&self) -> Result<u64, Errno> {
        if self.a3 == 0 {
            Ok(self.v0)
        } else {
            Err(i32::try_from(self.v0)
                .ok()
                .and_then(Errno::from_code)
                .unwrap_or(Errno::ENOSYS))
        }
    }

    /// Frame the child of a fork resumes with
    #[must_use]
    pub(crate) fn for_child(mut self) -> Self {
        self.v0 = 0;
        self.a3 = 0;
        self.advance_pc();
        self
    }
}
