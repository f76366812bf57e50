//! Rendering systems

pub mod underwater;
