//! Boundary result type.
//!
//! Crates define their own error enums. Structural graph operations return
//! those enums directly; layout, generation and command-line operations
//! return them inside a rootcause `Report` through this alias.

use rootcause::Report;

/// A result whose error is a `Report` carrying `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
