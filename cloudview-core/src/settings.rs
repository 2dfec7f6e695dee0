//! Per-mesh point display settings
//!
//! Settings live in a side-table keyed by mesh id rather than on the mesh
//! itself. Entries are created with defaults on first access and persist for
//! the life of the table; toggling point display off never discards them.

use crate::scene::MeshId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Smallest accepted point size, in pixels
pub const MIN_POINT_SIZE: f32 = 0.01;

/// Default point size, in pixels
pub const DEFAULT_POINT_SIZE: f32 = 5.0;

/// Display flag for one mesh: whether its point cloud is shown, and how big
/// the points are
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub enabled: bool,
    pub point_size: f32,
}

impl DisplaySettings {
    /// Set the point size, clamped to [`MIN_POINT_SIZE`]
    pub fn set_point_size(&mut self, size: f32) {
        self.point_size = size.max(MIN_POINT_SIZE);
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            point_size: DEFAULT_POINT_SIZE,
        }
    }
}

/// Side-table mapping meshes to their display settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayTable {
    entries: HashMap<MeshId, DisplaySettings>,
}

impl DisplayTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Current settings for a mesh (defaults if never touched)
    pub fn settings(&self, id: MeshId) -> DisplaySettings {
        self.entries.get(&id).copied().unwrap_or_default()
    }

    /// Mutable settings entry, created with defaults on first access
    pub fn settings_mut(&mut self, id: MeshId) -> &mut DisplaySettings {
        self.entries.entry(id).or_default()
    }

    /// Whether point display is enabled for a mesh
    pub fn is_enabled(&self, id: MeshId) -> bool {
        self.settings(id).enabled
    }

    /// Enable or disable point display for a mesh
    pub fn set_enabled(&mut self, id: MeshId, enabled: bool) {
        self.settings_mut(id).enabled = enabled;
    }

    /// Current point size for a mesh
    pub fn point_size(&self, id: MeshId) -> f32 {
        self.settings(id).point_size
    }

    /// Set the point size for a mesh, clamped to [`MIN_POINT_SIZE`]
    pub fn set_point_size(&mut self, id: MeshId, size: f32) {
        self.settings_mut(id).set_point_size(size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use crate::scene::Scene;

    fn mesh_id() -> MeshId {
        Scene::new().add_mesh(Mesh::new("m"))
    }

    #[test]
    fn defaults_are_disabled_at_five_pixels() {
        let table = DisplayTable::new();
        let settings = table.settings(mesh_id());
        assert!(!settings.enabled);
        assert_eq!(settings.point_size, DEFAULT_POINT_SIZE);
    }

    #[test]
    fn point_size_clamps_to_minimum() {
        let mut table = DisplayTable::new();
        let id = mesh_id();

        table.set_point_size(id, 0.0);
        assert_eq!(table.point_size(id), MIN_POINT_SIZE);

        table.set_point_size(id, -3.0);
        assert_eq!(table.point_size(id), MIN_POINT_SIZE);

        table.set_point_size(id, 12.5);
        assert_eq!(table.point_size(id), 12.5);
    }

    #[test]
    fn settings_survive_toggle_cycles() {
        let mut table = DisplayTable::new();
        let id = mesh_id();

        table.set_point_size(id, 3.0);
        table.set_enabled(id, true);
        table.set_enabled(id, false);

        assert!(!table.is_enabled(id));
        assert_eq!(table.point_size(id), 3.0);
    }
}
