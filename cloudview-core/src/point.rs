//! Point and color primitives

use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// An RGB color with components in `[0, 1]`
pub type Color3 = [f32; 3];

/// Opaque white, substituted when a mesh has no usable color data
pub const FALLBACK_COLOR: Color3 = [1.0, 1.0, 1.0];
