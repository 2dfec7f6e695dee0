//! GPU rendering for cloudview
//!
//! This crate provides the point-cloud display overlay — a compiled
//! point-sprite pipeline plus a cache of per-mesh GPU batches — and the
//! flat-shaded solid pass it draws on top of. Per-frame work is split into
//! a pure planning step ([`plan_frame`]) and GPU execution, so the
//! per-object skip/build/draw decisions are testable without a device.

pub mod device;
pub mod frame;
pub mod overlay;
pub mod solid;

pub use device::GpuContext;
pub use frame::{CameraBinding, CameraUniform, DEPTH_FORMAT};
pub use overlay::{
    plan_frame, point_vertices, BatchCache, FramePlan, PointBatch, PointDraw, PointOverlay,
    PointVertex,
};
pub use solid::{mesh_vertices, solid_draws, MeshVertex, SolidDraw, SolidRenderer};
