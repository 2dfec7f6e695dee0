//! Core data structures and types for cloudview
//!
//! This crate provides the plain data model shared by the renderer and the
//! viewer: points, meshes with per-vertex color layers, scene objects,
//! transforms, and the per-mesh point display settings table.

pub mod point;
pub mod mesh;
pub mod transform;
pub mod scene;
pub mod settings;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use transform::*;
pub use scene::*;
pub use settings::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix4, Point3, Vector3};

/// Common result type for cloudview operations
pub type Result<T> = std::result::Result<T, Error>;
