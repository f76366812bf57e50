//! # Rendering System
//!
//! Per-frame underwater mask construction and compositing. The module is
//! split the same way the pipeline is:
//!
//! - [`api`]: collaborator traits the surrounding renderer implements
//!   (target allocation, draw submission, compute dispatch)
//! - [`primitives`]: camera view state, frustum planes, bounding volumes
//! - [`resources`]: render-target pool, materials, ambient lighting
//! - [`systems`]: the underwater pipeline itself
//! - [`backends`]: in-tree implementations of the collaborator traits

pub mod api;
pub mod backends;
pub mod primitives;
pub mod resources;
pub mod systems;

use thiserror::Error;

/// Errors produced by the underwater rendering pipeline
#[derive(Debug, Error)]
pub enum RenderError {
    /// A required material, shader keyword, or geometry is missing or
    /// inconsistent. Fatal for the camera's effect: it transitions to
    /// Disabled and frames pass through unmodified.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Render target allocation failed. Fatal for the current frame only;
    /// allocation is retried on the next frame.
    #[error("render target allocation failed: {0}")]
    ResourceAllocation(String),

    /// A compute kernel could not be found by the dispatch backend
    #[error("compute kernel unavailable: {0}")]
    MissingKernel(String),

    /// Backend-specific error occurred
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
