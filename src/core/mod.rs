//! Core data types for loaded binaries.
//!
//! A [`binary::Binary`] owns its [`section::Section`]s and
//! [`symbol::Symbol`]s; nothing here borrows the input buffer.

pub mod binary;
pub mod section;
pub mod symbol;
