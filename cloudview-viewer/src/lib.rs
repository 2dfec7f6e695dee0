//! Windowed visualization for cloudview scenes
//!
//! This crate provides the interactive viewer: a winit window with a wgpu
//! surface, orbit/pan/zoom camera controls, and two egui panels (a viewport
//! sidebar and an object-properties window) bound to the shared per-mesh
//! display settings table.

pub mod camera;
pub mod panels;
pub mod viewer;

pub use camera::Camera;
pub use panels::ToggleEvent;
pub use viewer::{Viewer, ViewerConfig};

use cloudview_core::{Result, Scene};

/// Open a viewer window over a scene and run until it is closed
pub fn show_scene(scene: Scene) -> Result<()> {
    Viewer::new(scene).run()
}
