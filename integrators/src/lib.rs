//! Integrators

#[macro_use]
extern crate log;

mod bdpt;
mod roulette;

// Re-export
pub use bdpt::*;
pub use roulette::*;
