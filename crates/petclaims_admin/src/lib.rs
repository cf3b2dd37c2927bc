//! Operator tooling: one binary, many [`AdminOperation`]s.
//!
//! Each operation declares the database tier it needs; the runner opens a
//! client at exactly that tier before calling it.

pub mod cli;
pub mod context;
pub mod operation;
pub mod operations;
pub mod output;

pub use cli::{Cli, Command};
pub use context::AdminContext;
pub use operation::{execute, AdminOperation, AdminOutput, OperationInput};
pub use operations::{all_operations, find_operation};
