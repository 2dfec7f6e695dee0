//! Mesh data structures with per-vertex color layers

use crate::point::*;
use serde::{Deserialize, Serialize};

/// A named per-vertex color attribute layer.
///
/// Layers are allowed to be shorter than the owning mesh's vertex array;
/// consumers substitute [`FALLBACK_COLOR`](crate::point::FALLBACK_COLOR)
/// for the missing tail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorLayer {
    pub name: String,
    pub colors: Vec<Color3>,
}

impl ColorLayer {
    /// Create a new color layer
    pub fn new(name: impl Into<String>, colors: Vec<Color3>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }
}

/// A mesh with vertices, optional triangle faces, and color layers.
///
/// Pure point clouds are meshes with an empty face list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[u32; 3]>,
    pub color_layers: Vec<ColorLayer>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            faces: Vec::new(),
            color_layers: Vec::new(),
        }
    }

    /// Create a mesh from a vertex array, with no faces
    pub fn from_vertices(name: impl Into<String>, vertices: Vec<Point3f>) -> Self {
        Self {
            name: name.into(),
            vertices,
            faces: Vec::new(),
            color_layers: Vec::new(),
        }
    }

    /// Create a mesh from vertices and triangle faces
    pub fn from_vertices_and_faces(
        name: impl Into<String>,
        vertices: Vec<Point3f>,
        faces: Vec<[u32; 3]>,
    ) -> Self {
        Self {
            name: name.into(),
            vertices,
            faces,
            color_layers: Vec::new(),
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Check if the mesh has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Check if the mesh carries triangle faces
    pub fn has_faces(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Append a color layer
    pub fn add_color_layer(&mut self, layer: ColorLayer) {
        self.color_layers.push(layer);
    }

    /// The color layer consumed by point display: the first one, if any
    pub fn active_color_layer(&self) -> Option<&ColorLayer> {
        self.color_layers.first()
    }

    /// Axis-aligned bounding box of the vertices
    pub fn bounding_box(&self) -> (Point3f, Point3f) {
        if self.vertices.is_empty() {
            return (Point3f::origin(), Point3f::origin());
        }

        let mut min = self.vertices[0];
        let mut max = self.vertices[0];

        for vertex in &self.vertices {
            min.x = min.x.min(vertex.x);
            min.y = min.y.min(vertex.y);
            min.z = min.z.min(vertex.z);

            max.x = max.x.max(vertex.x);
            max.y = max.y.max(vertex.y);
            max.z = max.z.max(vertex.z);
        }

        (min, max)
    }

    /// Center point of the bounding box
    pub fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_triangle() -> Mesh {
        Mesh::from_vertices_and_faces(
            "triangle",
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.5, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn vertex_and_face_counts() {
        let mesh = make_triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert!(mesh.has_faces());
        assert!(!mesh.is_empty());
    }

    #[test]
    fn point_cloud_has_no_faces() {
        let cloud = Mesh::from_vertices("cloud", vec![Point3f::origin()]);
        assert!(!cloud.has_faces());
        assert!(!cloud.is_empty());
    }

    #[test]
    fn first_layer_is_active() {
        let mut mesh = make_triangle();
        assert!(mesh.active_color_layer().is_none());

        mesh.add_color_layer(ColorLayer::new("Col", vec![[1.0, 0.0, 0.0]; 3]));
        mesh.add_color_layer(ColorLayer::new("Backup", vec![[0.0, 1.0, 0.0]; 3]));

        assert_eq!(mesh.active_color_layer().unwrap().name, "Col");
    }

    #[test]
    fn bounding_box_spans_vertices() {
        let mesh = make_triangle();
        let (min, max) = mesh.bounding_box();
        assert_eq!(min, Point3f::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3f::new(1.0, 1.0, 0.0));
        assert_eq!(mesh.center(), Point3f::new(0.5, 0.5, 0.0));
    }
}
