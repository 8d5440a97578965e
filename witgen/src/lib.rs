//! Go host bindings for WIT function declarations.

#![warn(rust_2018_idioms)]

pub mod codegen;
pub mod driver;
pub mod source;
pub mod surface;

pub use driver::{Action, Driver, Status};

/// Where users should report internal errors.
pub const BUG_REPORT_URL: &str = concat!(env!("CARGO_PKG_REPOSITORY"), "/issues/new");
