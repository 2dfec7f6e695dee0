//! Headless frame planning demo
//!
//! Shows the per-redraw decisions without opening a window: the first plan
//! after enabling a mesh schedules a batch upload, the second plan draws it.

use anyhow::Result;
use cloudview_core::{DisplayTable, Mesh, MeshId, Point3f, Scene, SceneObject, Transform3D};
use cloudview_gpu::plan_frame;
use std::collections::HashSet;

fn main() -> Result<()> {
    env_logger::init();

    let mut scene = Scene::new();
    let vertices = (0..100)
        .map(|i| Point3f::new(i as f32 * 0.1, 0.0, 0.0))
        .collect();
    let mesh = scene.add_mesh(Mesh::from_vertices("strip", vertices));
    scene.add_object(SceneObject::mesh_object("strip", mesh, Transform3D::identity()));

    let mut table = DisplayTable::new();
    table.set_enabled(mesh, true);
    table.set_point_size(mesh, 3.0);

    let mut resident: HashSet<MeshId> = HashSet::new();

    for redraw in 1..=3 {
        let plan = plan_frame(&scene, &table, |id| resident.contains(&id));
        println!(
            "redraw {}: {} build(s), {} draw(s)",
            redraw,
            plan.builds.len(),
            plan.draws.len()
        );
        for draw in &plan.draws {
            println!("  draw {:?} at point size {}", draw.mesh, draw.point_size);
        }
        resident.extend(plan.builds.iter().copied());
    }

    Ok(())
}
