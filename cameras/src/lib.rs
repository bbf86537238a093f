//! Cameras

mod pinhole;

// Re-export
pub use pinhole::*;
