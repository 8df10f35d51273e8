//! # Rendering Module
//!
//! The boundary with the render collaborator. Nothing here draws; it only
//! exposes what is visible, where, and how far the camera is shaking.

pub mod camera;
pub mod display;

pub use camera::*;
pub use display::*;
