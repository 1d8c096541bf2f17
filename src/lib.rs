//! Delve - procedural cave and tunnel world generation with chunk streaming

pub mod core;
pub mod math;
pub mod world;
pub mod generation;
pub mod mesh;
pub mod streaming;
