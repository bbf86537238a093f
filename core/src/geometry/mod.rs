//! Geometry

mod bounds3;
mod normal;
mod point;
mod ray;
mod vector;

// Re-export
pub use bounds3::*;
pub use normal::*;
pub use point::*;
pub use ray::*;
pub use vector::*;
