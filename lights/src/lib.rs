//! Lights

mod diffuse_area;

// Re-export
pub use diffuse_area::*;
