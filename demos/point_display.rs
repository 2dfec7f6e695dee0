//! Interactive point display demo
//!
//! Opens a viewer over a small scene: a solid colored cube and a synthetic
//! scan rendered as a point cloud. Toggle point display per mesh from the
//! sidebar or the object-properties window.

use anyhow::Result;
use cloudview_core::{ColorLayer, Mesh, Point3f, Scene, SceneObject, Transform3D, Vector3};
use cloudview_viewer::Viewer;
use rand::Rng;

fn colored_cube() -> Mesh {
    let positions = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];
    let faces = vec![
        // -z / +z
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        // -y / +y
        [0, 1, 5],
        [0, 5, 4],
        [3, 6, 2],
        [3, 7, 6],
        // -x / +x
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];

    let vertices = positions
        .iter()
        .map(|p| Point3f::new(p[0], p[1], p[2]))
        .collect();
    let colors = positions
        .iter()
        .map(|p| [(p[0] + 1.0) / 2.0, (p[1] + 1.0) / 2.0, (p[2] + 1.0) / 2.0])
        .collect();

    let mut mesh = Mesh::from_vertices_and_faces("cube", vertices, faces);
    mesh.add_color_layer(ColorLayer::new("Col", colors));
    mesh
}

/// A noisy spherical shell, colored by height
fn synthetic_scan(count: usize) -> Mesh {
    let mut rng = rand::thread_rng();
    let mut vertices = Vec::with_capacity(count);
    let mut colors = Vec::with_capacity(count);

    for _ in 0..count {
        let theta = rng.gen_range(0.0..std::f32::consts::TAU);
        let z: f32 = rng.gen_range(-1.0..1.0);
        let radius: f32 = rng.gen_range(0.95..1.05);
        let ring = (1.0 - z * z).sqrt();

        let point = Point3f::new(
            radius * ring * theta.cos(),
            radius * z,
            radius * ring * theta.sin(),
        );
        vertices.push(point);
        colors.push([(z + 1.0) / 2.0, 0.4, 1.0 - (z + 1.0) / 2.0]);
    }

    let mut mesh = Mesh::from_vertices("scan", vertices);
    mesh.add_color_layer(ColorLayer::new("Col", colors));
    mesh
}

fn main() -> Result<()> {
    env_logger::init();

    let mut scene = Scene::new();

    let cube = scene.add_mesh(colored_cube());
    scene.add_object(SceneObject::mesh_object(
        "cube",
        cube,
        Transform3D::translation(Vector3::new(-2.0, 0.0, 0.0)),
    ));

    let scan = scene.add_mesh(synthetic_scan(20_000));
    scene.add_object(SceneObject::mesh_object(
        "scan",
        scan,
        Transform3D::from_translation_rotation(
            Vector3::new(2.0, 0.0, 0.0),
            nalgebra::UnitQuaternion::identity(),
        ),
    ));

    scene.add_object(SceneObject::empty("origin"));

    println!("Scene: {} objects, {} meshes", scene.object_count(), scene.mesh_count());
    println!("Left-drag orbits, right-drag pans, wheel zooms, R resets the camera.");

    let mut viewer = Viewer::new(scene);
    viewer.set_point_display(scan, true);
    viewer.run()?;

    Ok(())
}
