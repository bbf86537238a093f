//! Shapes

mod cuboid;
mod quad;
mod sphere;
mod triangle;

// Re-export
pub use cuboid::*;
pub use quad::*;
pub use sphere::*;
pub use triangle::*;
