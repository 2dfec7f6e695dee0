//! Scene objects and mesh storage
//!
//! The scene is a flat list of objects referencing meshes by id. Objects are
//! iterated in insertion order; the renderer makes no attempt to sort or
//! batch across objects.

use crate::mesh::Mesh;
use crate::transform::Transform3D;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable identifier for a mesh registered with a [`Scene`].
///
/// Used purely as a lookup key; holding a `MeshId` confers no ownership.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MeshId(u64);

/// The geometry a scene object points at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    Mesh(MeshId),
    Empty,
}

/// One object in the scene: a name, a visibility flag, a world transform and
/// a geometry reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub visible: bool,
    pub transform: Transform3D,
    pub kind: ObjectKind,
}

impl SceneObject {
    /// Create a visible object referencing a mesh
    pub fn mesh_object(name: impl Into<String>, mesh: MeshId, transform: Transform3D) -> Self {
        Self {
            name: name.into(),
            visible: true,
            transform,
            kind: ObjectKind::Mesh(mesh),
        }
    }

    /// Create an object with no geometry
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            transform: Transform3D::identity(),
            kind: ObjectKind::Empty,
        }
    }

    /// The referenced mesh, if this object has one
    pub fn mesh_id(&self) -> Option<MeshId> {
        match self.kind {
            ObjectKind::Mesh(id) => Some(id),
            ObjectKind::Empty => None,
        }
    }
}

/// A scene: owned meshes plus an ordered object list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    meshes: HashMap<MeshId, Mesh>,
    objects: Vec<SceneObject>,
    next_mesh_id: u64,
}

impl Scene {
    /// Create a new empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh and return its id
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = MeshId(self.next_mesh_id);
        self.next_mesh_id += 1;
        self.meshes.insert(id, mesh);
        id
    }

    /// Look up a mesh by id
    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(&id)
    }

    /// Look up a mesh by id, mutably
    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(&id)
    }

    /// Append an object to the scene
    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    /// Objects in insertion order
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Objects in insertion order, mutable
    pub fn objects_mut(&mut self) -> &mut [SceneObject] {
        &mut self.objects
    }

    /// Number of registered meshes
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Number of objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point3f;

    #[test]
    fn mesh_ids_are_unique() {
        let mut scene = Scene::new();
        let a = scene.add_mesh(Mesh::new("a"));
        let b = scene.add_mesh(Mesh::new("b"));
        assert_ne!(a, b);
        assert_eq!(scene.mesh(a).unwrap().name, "a");
        assert_eq!(scene.mesh(b).unwrap().name, "b");
    }

    #[test]
    fn objects_keep_insertion_order() {
        let mut scene = Scene::new();
        let mesh = scene.add_mesh(Mesh::from_vertices("m", vec![Point3f::origin()]));

        scene.add_object(SceneObject::mesh_object("first", mesh, Transform3D::identity()));
        scene.add_object(SceneObject::empty("second"));
        scene.add_object(SceneObject::mesh_object("third", mesh, Transform3D::identity()));

        let names: Vec<&str> = scene.objects().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn empty_objects_have_no_mesh() {
        let object = SceneObject::empty("lamp");
        assert_eq!(object.mesh_id(), None);
        assert!(object.visible);
    }
}
