/*!
 * Program Loader
 * ELF64 image loading into user address spaces
 */

pub mod builder;
pub mod elf;

pub use builder::ElfBuilder;
pub use elf::load_elf;
