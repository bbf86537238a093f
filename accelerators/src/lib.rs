//! Accelerators

#[macro_use]
extern crate log;

mod brute_force;
mod kd_tree;

// Re-export
pub use brute_force::*;
pub use kd_tree::*;
