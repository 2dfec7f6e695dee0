//! Point-cloud display overlay
//!
//! Renders a mesh's vertices as colored points in place of its solid
//! surface. The overlay owns the compiled point-sprite pipeline and a cache
//! of per-mesh GPU batches; per-frame decisions (skip, build, draw) are made
//! by [`plan_frame`], which is pure and independent of the device.
//!
//! A batch is uploaded once per mesh and is only freed by an explicit
//! toggle-off. It is never revalidated against the current mesh geometry, so
//! edits made after the first build keep rendering the uploaded snapshot
//! until point display is toggled off and on again.

use crate::device::GpuContext;
use crate::frame::{CameraBinding, DEPTH_FORMAT};
use cloudview_core::{
    DisplayTable, Error, Matrix4, Mesh, MeshId, Result, Scene, FALLBACK_COLOR,
};
use bytemuck::{Pod, Zeroable};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

/// Per-point instance data for the overlay
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl PointVertex {
    /// Instance buffer layout descriptor
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Per-draw object uniform: world transform and point size in pixels
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub point_size: f32,
    pub _padding: [f32; 3],
}

/// GPU-resident vertex/color buffer pair for one mesh
pub struct PointBatch {
    pub instance_buffer: wgpu::Buffer,
    pub object_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub count: u32,
}

/// Assemble overlay instance data from a mesh's vertices and its first
/// color layer.
///
/// A missing or short color layer is recoverable: absent entries fall back
/// to opaque white and a warning is logged once per build.
pub fn point_vertices(mesh: &Mesh) -> Vec<PointVertex> {
    let colors = mesh
        .active_color_layer()
        .map(|layer| layer.colors.as_slice())
        .unwrap_or(&[]);

    if colors.len() < mesh.vertex_count() {
        log::warn!(
            "mesh {:?}: {} colors for {} vertices, padding with white",
            mesh.name,
            colors.len(),
            mesh.vertex_count()
        );
    }

    mesh.vertices
        .iter()
        .enumerate()
        .map(|(i, vertex)| PointVertex {
            position: [vertex.x, vertex.y, vertex.z],
            color: colors.get(i).copied().unwrap_or(FALLBACK_COLOR),
        })
        .collect()
}

/// Cache of uploaded point batches, keyed by mesh identity
#[derive(Default)]
pub struct BatchCache {
    batches: HashMap<MeshId, PointBatch>,
}

impl BatchCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a batch is resident for a mesh
    pub fn contains(&self, id: MeshId) -> bool {
        self.batches.contains_key(&id)
    }

    /// Look up a resident batch
    pub fn get(&self, id: MeshId) -> Option<&PointBatch> {
        self.batches.get(&id)
    }

    /// Build and upload a batch on first call for `id`; later calls for the
    /// same `id` return the existing entry unchanged, even if the mesh has
    /// been edited since.
    pub fn ensure(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        id: MeshId,
        mesh: &Mesh,
    ) -> &PointBatch {
        self.batches
            .entry(id)
            .or_insert_with(|| build_batch(device, layout, mesh))
    }

    /// Remove and free a batch; a no-op when absent
    pub fn evict(&mut self, id: MeshId) {
        self.batches.remove(&id);
    }

    /// Drop every batch
    pub fn clear(&mut self) {
        self.batches.clear();
    }

    /// Number of resident batches
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

fn build_batch(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, mesh: &Mesh) -> PointBatch {
    let vertices = point_vertices(mesh);

    let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Point Batch Instance Buffer"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let object = ObjectUniform {
        model: Matrix4::identity().into(),
        point_size: cloudview_core::DEFAULT_POINT_SIZE,
        _padding: [0.0; 3],
    };
    let object_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Point Batch Object Buffer"),
        contents: bytemuck::bytes_of(&object),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: object_buffer.as_entire_binding(),
        }],
        label: Some("point_batch_bind_group"),
    });

    PointBatch {
        instance_buffer,
        object_buffer,
        bind_group,
        count: vertices.len() as u32,
    }
}

/// A point draw scheduled for the current redraw
#[derive(Debug, Clone, PartialEq)]
pub struct PointDraw {
    pub mesh: MeshId,
    pub model: Matrix4<f32>,
    pub point_size: f32,
}

/// Work for one viewport redraw: batches to upload and batches to draw
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FramePlan {
    pub builds: Vec<MeshId>,
    pub draws: Vec<PointDraw>,
}

impl FramePlan {
    /// Whether the redraw has nothing to do for the overlay
    pub fn is_empty(&self) -> bool {
        self.builds.is_empty() && self.draws.is_empty()
    }
}

/// Walk the scene in order and decide, per object, whether its point cloud
/// is skipped, built, or drawn this frame.
///
/// Objects are skipped when hidden, when they reference no mesh (or an
/// empty one), or when point display is disabled for their mesh. An enabled
/// mesh with no resident batch is scheduled for upload and drawn starting
/// with the next redraw.
pub fn plan_frame(
    scene: &Scene,
    table: &DisplayTable,
    is_resident: impl Fn(MeshId) -> bool,
) -> FramePlan {
    let mut plan = FramePlan::default();

    for object in scene.objects() {
        let Some(mesh_id) = object.mesh_id() else {
            continue;
        };
        if !object.visible || !table.is_enabled(mesh_id) {
            continue;
        }
        let Some(mesh) = scene.mesh(mesh_id) else {
            continue;
        };
        if mesh.is_empty() {
            continue;
        }

        if !is_resident(mesh_id) {
            if !plan.builds.contains(&mesh_id) {
                plan.builds.push(mesh_id);
            }
            continue;
        }

        plan.draws.push(PointDraw {
            mesh: mesh_id,
            model: object.transform.matrix,
            point_size: table.point_size(mesh_id),
        });
    }

    plan
}

/// Point display overlay: the compiled point-sprite pipeline plus the batch
/// cache, constructed once at startup and dropped on shutdown.
pub struct PointOverlay {
    pipeline: wgpu::RenderPipeline,
    object_layout: wgpu::BindGroupLayout,
    cache: BatchCache,
}

impl PointOverlay {
    /// Compile the overlay shader and build the render pipeline.
    ///
    /// Shader rejection is fatal for the feature: the error is returned once
    /// at startup and the overlay is never constructed. The shader source is
    /// fixed after this point.
    pub fn new(
        context: &GpuContext,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self> {
        let device = &context.device;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Point Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/point_sprites.wgsl").into()),
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("point_object_bind_group_layout"),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Overlay Pipeline Layout"),
            bind_group_layouts: &[camera_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Point Overlay Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[PointVertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(Error::ShaderCompile(error.to_string()));
        }

        Ok(Self {
            pipeline,
            object_layout,
            cache: BatchCache::new(),
        })
    }

    /// Whether a batch is resident for a mesh
    pub fn is_resident(&self, id: MeshId) -> bool {
        self.cache.contains(id)
    }

    /// Upload the batches a plan scheduled for building. Runs before the
    /// render pass opens; the new batches draw starting next redraw.
    pub fn prepare(&mut self, device: &wgpu::Device, scene: &Scene, plan: &FramePlan) {
        for id in &plan.builds {
            if let Some(mesh) = scene.mesh(*id) {
                self.cache.ensure(device, &self.object_layout, *id, mesh);
            }
        }
    }

    /// Issue one draw per planned object, writing its world transform and
    /// the current point size immediately before the draw.
    pub fn draw<'pass>(
        &'pass self,
        queue: &wgpu::Queue,
        pass: &mut wgpu::RenderPass<'pass>,
        camera: &'pass CameraBinding,
        plan: &FramePlan,
    ) {
        if plan.draws.is_empty() {
            return;
        }

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &camera.bind_group, &[]);

        for draw in &plan.draws {
            let Some(batch) = self.cache.get(draw.mesh) else {
                continue;
            };

            let object = ObjectUniform {
                model: draw.model.into(),
                point_size: draw.point_size,
                _padding: [0.0; 3],
            };
            queue.write_buffer(&batch.object_buffer, 0, bytemuck::bytes_of(&object));

            pass.set_bind_group(1, &batch.bind_group, &[]);
            pass.set_vertex_buffer(0, batch.instance_buffer.slice(..));
            // 6 quad vertices per point, one instance per point
            pass.draw(0..6, 0..batch.count);
        }
    }

    /// Free a mesh's batch; a no-op when absent
    pub fn evict(&mut self, id: MeshId) {
        self.cache.evict(id);
    }

    /// Free every batch (feature shutdown)
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudview_core::{ColorLayer, Point3f, SceneObject, Transform3D, Vector3};
    use std::collections::HashSet;

    fn grid_mesh(n: usize) -> Mesh {
        let vertices = (0..n)
            .map(|i| Point3f::new(i as f32, 0.0, 0.0))
            .collect();
        Mesh::from_vertices("grid", vertices)
    }

    fn colored_mesh(n: usize) -> Mesh {
        let mut mesh = grid_mesh(n);
        let colors = (0..n).map(|i| [i as f32 / n as f32, 0.5, 0.5]).collect();
        mesh.add_color_layer(ColorLayer::new("Col", colors));
        mesh
    }

    fn single_object_scene(mesh: Mesh) -> (Scene, MeshId) {
        let mut scene = Scene::new();
        let id = scene.add_mesh(mesh);
        scene.add_object(SceneObject::mesh_object("obj", id, Transform3D::identity()));
        (scene, id)
    }

    #[test]
    fn vertices_take_colors_from_first_layer() {
        let mesh = colored_mesh(4);
        let vertices = point_vertices(&mesh);
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[2].position, [2.0, 0.0, 0.0]);
        assert_eq!(vertices[2].color, [0.5, 0.5, 0.5]);
    }

    #[test]
    fn short_color_layer_pads_with_white() {
        let mut mesh = grid_mesh(5);
        mesh.add_color_layer(ColorLayer::new("Col", vec![[1.0, 0.0, 0.0]; 2]));

        let vertices = point_vertices(&mesh);
        assert_eq!(vertices[1].color, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[2].color, FALLBACK_COLOR);
        assert_eq!(vertices[4].color, FALLBACK_COLOR);
    }

    #[test]
    fn missing_color_layer_is_all_white() {
        let vertices = point_vertices(&grid_mesh(3));
        assert!(vertices.iter().all(|v| v.color == FALLBACK_COLOR));
    }

    #[test]
    fn disabled_mesh_is_never_planned() {
        let (scene, _) = single_object_scene(colored_mesh(10));
        let table = DisplayTable::new();

        let plan = plan_frame(&scene, &table, |_| false);
        assert!(plan.is_empty());

        // still nothing even if a batch were somehow resident
        let plan = plan_frame(&scene, &table, |_| true);
        assert!(plan.is_empty());
    }

    #[test]
    fn hidden_object_is_skipped() {
        let (mut scene, id) = single_object_scene(colored_mesh(10));
        scene.objects_mut()[0].visible = false;

        let mut table = DisplayTable::new();
        table.set_enabled(id, true);

        assert!(plan_frame(&scene, &table, |_| true).is_empty());
    }

    #[test]
    fn empty_object_is_skipped() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::empty("lamp"));

        let table = DisplayTable::new();
        assert!(plan_frame(&scene, &table, |_| true).is_empty());
    }

    #[test]
    fn first_frame_builds_second_frame_draws() {
        let (scene, id) = single_object_scene(colored_mesh(100));
        let mut table = DisplayTable::new();
        table.set_enabled(id, true);
        table.set_point_size(id, 3.0);

        // first redraw: the batch is not resident yet, so it builds and
        // nothing draws
        let resident: HashSet<MeshId> = HashSet::new();
        let plan = plan_frame(&scene, &table, |m| resident.contains(&m));
        assert_eq!(plan.builds, vec![id]);
        assert!(plan.draws.is_empty());

        // second redraw: the batch is resident and one draw is emitted
        let resident: HashSet<_> = plan.builds.iter().copied().collect();
        let plan = plan_frame(&scene, &table, |m| resident.contains(&m));
        assert!(plan.builds.is_empty());
        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.draws[0].mesh, id);
        assert_eq!(plan.draws[0].point_size, 3.0);
    }

    #[test]
    fn resident_mesh_is_not_rebuilt_when_size_changes() {
        let (scene, id) = single_object_scene(colored_mesh(10));
        let mut table = DisplayTable::new();
        table.set_enabled(id, true);

        let plan = plan_frame(&scene, &table, |_| true);
        assert!(plan.builds.is_empty());
        assert_eq!(plan.draws[0].point_size, 5.0);

        // changing the size between frames reuses the batch but carries the
        // new value into the next draw
        table.set_point_size(id, 10.0);
        let plan = plan_frame(&scene, &table, |_| true);
        assert!(plan.builds.is_empty());
        assert_eq!(plan.draws[0].point_size, 10.0);
    }

    #[test]
    fn draw_carries_object_world_transform() {
        let mut scene = Scene::new();
        let id = scene.add_mesh(colored_mesh(10));
        let transform = Transform3D::translation(Vector3::new(2.0, 0.0, -1.0));
        scene.add_object(SceneObject::mesh_object("obj", id, transform));

        let mut table = DisplayTable::new();
        table.set_enabled(id, true);

        let plan = plan_frame(&scene, &table, |_| true);
        assert_eq!(plan.draws[0].model, transform.matrix);
    }

    #[test]
    fn shared_mesh_builds_once_draws_twice() {
        let mut scene = Scene::new();
        let id = scene.add_mesh(colored_mesh(10));
        scene.add_object(SceneObject::mesh_object("a", id, Transform3D::identity()));
        scene.add_object(SceneObject::mesh_object(
            "b",
            id,
            Transform3D::translation(Vector3::new(1.0, 0.0, 0.0)),
        ));

        let mut table = DisplayTable::new();
        table.set_enabled(id, true);

        let plan = plan_frame(&scene, &table, |_| false);
        assert_eq!(plan.builds, vec![id]);

        let plan = plan_frame(&scene, &table, |_| true);
        assert_eq!(plan.draws.len(), 2);
    }

    #[test]
    fn objects_are_planned_in_scene_order() {
        let mut scene = Scene::new();
        let first = scene.add_mesh(colored_mesh(2));
        let second = scene.add_mesh(colored_mesh(3));
        scene.add_object(SceneObject::mesh_object("a", first, Transform3D::identity()));
        scene.add_object(SceneObject::mesh_object("b", second, Transform3D::identity()));

        let mut table = DisplayTable::new();
        table.set_enabled(first, true);
        table.set_enabled(second, true);

        let plan = plan_frame(&scene, &table, |_| true);
        let order: Vec<_> = plan.draws.iter().map(|d| d.mesh).collect();
        assert_eq!(order, vec![first, second]);
    }
}
