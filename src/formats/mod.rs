//! Executable container formats.

pub mod elf;
pub mod pe;
pub mod sniff;

pub use sniff::sniff;
