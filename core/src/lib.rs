//! Core

#[macro_use]
extern crate hexf;
#[macro_use]
extern crate log;

// Re-export.
pub mod camera;
pub mod common;
pub mod film;
pub mod geometry;
pub mod interaction;
pub mod light;
pub mod material;
pub mod primitive;
pub mod rng;
pub mod sampling;
pub mod scene;
pub mod spectrum;
