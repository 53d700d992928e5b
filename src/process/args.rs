/*!
 * Argument Vector
 *
 * Copying `argv` in from the caller and laying it out on a new user stack.
 *
 * Stack layout, from `USERSTACK` down:
 *   argument strings, argv[0] highest, each NUL-terminated
 *   padding to a 16-byte boundary
 *   argc + 1 pointer slots (argv[argc] = 0), padded to 16
 * The final stack pointer is the address of argv[0].
 */

use crate::core::errors::KernelError;
use crate::core::limits::{POINTER_SIZE, STACK_ALIGN};
use crate::core::types::{Address, KernelResult, UserPtr};
use crate::memory::{AddrSpace, MemoryError};

#[inline]
const fn align_down(addr: Address, align: u64) -> Address {
    addr & !(align - 1)
}

/// Arguments copied into kernel memory, terminators not included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgVector {
    args: Vec<Vec<u8>>,
}

impl ArgVector {
    pub fn new(args: Vec<Vec<u8>>) -> Self {
        Self { args }
    }

    pub fn from_strs<S: AsRef<str>>(args: &[S]) -> Self {
        Self::new(args.iter().map(|s| s.as_ref().as_bytes().to_vec()).collect())
    }

    /// Copy a null-terminated pointer array and its strings out of `space`.
    ///
    /// `arg_max` bounds the total of string bytes, terminators and pointer
    /// slots including the final null.
    pub fn copyin(space: &AddrSpace, argv: UserPtr, arg_max: usize) -> KernelResult<Self> {
        if argv.is_null() {
            return Err(KernelError::InvalidArgument("argv is null".into()));
        }

        let mut args = Vec::new();
        let mut total = POINTER_SIZE as usize;
        loop {
            let slot = argv.offset(args.len() as u64 * POINTER_SIZE);
            let ptr = space.read_word(slot.addr())?;
            if ptr == 0 {
                break;
            }
            total += POINTER_SIZE as usize;
            let remaining = arg_max.saturating_sub(total);
            if remaining == 0 {
                return Err(KernelError::ArgumentListTooLong);
            }
            let arg = space.copyinstr(ptr, remaining).map_err(|e| match e {
                MemoryError::StringTooLong { .. } => KernelError::ArgumentListTooLong,
                other => other.into(),
            })?;
            total += arg.len() + 1;
            args.push(arg);
        }
        Ok(Self { args })
    }

    pub fn argc(&self) -> usize {
        self.args.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.args.iter().map(Vec::as_slice)
    }

    /// Bytes the vector occupies on a stack before alignment
    pub fn footprint(&self) -> usize {
        let strings: usize = self.args.iter().map(|a| a.len() + 1).sum();
        strings + (self.args.len() + 1) * POINTER_SIZE as usize
    }
}

/// Where each piece of an argument vector goes on the user stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgvLayout {
    /// Address of each string, in argument order
    pub strings: Vec<Address>,
    /// Address of argv[0]
    pub argv: Address,
    /// Stack pointer at entry
    pub sp: Address,
}

impl ArgvLayout {
    /// Lay out `args` below `stack_top`
    pub fn compute(args: &ArgVector, stack_top: Address) -> Self {
        let mut cursor = stack_top;
        let mut strings = Vec::with_capacity(args.argc());
        for arg in args.iter() {
            cursor -= arg.len() as u64 + 1;
            strings.push(cursor);
        }
        cursor = align_down(cursor, STACK_ALIGN);
        cursor -= (args.argc() as u64 + 1) * POINTER_SIZE;
        let argv = align_down(cursor, STACK_ALIGN);
        Self {
            strings,
            argv,
            sp: argv,
        }
    }

    /// Write strings and the pointer array into `space`
    pub fn write(&self, args: &ArgVector, space: &mut AddrSpace) -> KernelResult<()> {
        for (arg, &addr) in args.iter().zip(&self.strings) {
            let mut bytes = Vec::with_capacity(arg.len() + 1);
            bytes.extend_from_slice(arg);
            bytes.push(0);
            space.copyout(addr, &bytes)?;
        }
        for (i, &addr) in self.strings.iter().enumerate() {
            space.write_word(self.argv + i as u64 * POINTER_SIZE, addr)?;
        }
        space.write_word(self.argv + self.strings.len() as u64 * POINTER_SIZE, 0)?;
        Ok(())
    }
}
