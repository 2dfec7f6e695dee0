//! Flat-shaded solid pass
//!
//! Draws the opaque scene geometry the point overlay renders on top of.
//! An object whose mesh is in point display mode is suppressed here — its
//! vertices are shown by the overlay instead of its surface.

use crate::device::GpuContext;
use crate::frame::{CameraBinding, DEPTH_FORMAT};
use cloudview_core::{DisplayTable, Matrix4, Mesh, MeshId, Scene, Vector3};
use bytemuck::{Pod, Zeroable};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

/// Material color used when a mesh has no color layer
const DEFAULT_MESH_COLOR: [f32; 3] = [0.8, 0.8, 0.8];

/// Vertex data for solid mesh rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl MeshVertex {
    /// Vertex buffer layout descriptor
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Per-draw world transform
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SolidObjectUniform {
    model: [[f32; 4]; 4],
}

/// One mesh's uploaded triangle data
pub struct SolidMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub object_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub index_count: u32,
}

/// A solid draw scheduled for the current redraw
#[derive(Debug, Clone, PartialEq)]
pub struct SolidDraw {
    pub mesh: MeshId,
    pub model: Matrix4<f32>,
}

/// Visible mesh objects with faces draw solid, unless their mesh is in
/// point display mode.
pub fn solid_draws(scene: &Scene, table: &DisplayTable) -> Vec<SolidDraw> {
    scene
        .objects()
        .iter()
        .filter_map(|object| {
            let mesh_id = object.mesh_id()?;
            if !object.visible || table.is_enabled(mesh_id) {
                return None;
            }
            let mesh = scene.mesh(mesh_id)?;
            if !mesh.has_faces() {
                return None;
            }
            Some(SolidDraw {
                mesh: mesh_id,
                model: object.transform.matrix,
            })
        })
        .collect()
}

/// Build flat-shading vertex data: smooth vertex normals accumulated from
/// face normals, colors from the first layer when present.
pub fn mesh_vertices(mesh: &Mesh) -> (Vec<MeshVertex>, Vec<u32>) {
    let mut normals = vec![Vector3::<f32>::zeros(); mesh.vertex_count()];
    for face in &mesh.faces {
        let v0 = mesh.vertices[face[0] as usize];
        let v1 = mesh.vertices[face[1] as usize];
        let v2 = mesh.vertices[face[2] as usize];
        let face_normal = (v1 - v0).cross(&(v2 - v0));
        for &index in face {
            normals[index as usize] += face_normal;
        }
    }

    let colors = mesh
        .active_color_layer()
        .map(|layer| layer.colors.as_slice())
        .unwrap_or(&[]);

    let vertices = mesh
        .vertices
        .iter()
        .enumerate()
        .map(|(i, vertex)| {
            let normal = normals[i]
                .try_normalize(1.0e-6)
                .unwrap_or_else(Vector3::z);
            MeshVertex {
                position: [vertex.x, vertex.y, vertex.z],
                normal: [normal.x, normal.y, normal.z],
                color: colors.get(i).copied().unwrap_or(DEFAULT_MESH_COLOR),
            }
        })
        .collect();

    let indices = mesh.faces.iter().flatten().copied().collect();

    (vertices, indices)
}

/// Flat-shaded mesh renderer with lazily uploaded per-mesh buffers
pub struct SolidRenderer {
    pipeline: wgpu::RenderPipeline,
    object_layout: wgpu::BindGroupLayout,
    meshes: HashMap<MeshId, SolidMesh>,
}

impl SolidRenderer {
    /// Build the flat-shading render pipeline
    pub fn new(
        context: &GpuContext,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let device = &context.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Flat Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh_flat.wgsl").into()),
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
            label: Some("solid_object_bind_group_layout"),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Flat Mesh Pipeline Layout"),
            bind_group_layouts: &[camera_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Flat Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[MeshVertex::desc()],
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
                cull_mode: Some(wgpu::Face::Back),
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

        Self {
            pipeline,
            object_layout,
            meshes: HashMap::new(),
        }
    }

    /// Upload triangle data for any planned mesh that is not resident yet
    pub fn prepare(&mut self, device: &wgpu::Device, scene: &Scene, draws: &[SolidDraw]) {
        for draw in draws {
            if self.meshes.contains_key(&draw.mesh) {
                continue;
            }
            let Some(mesh) = scene.mesh(draw.mesh) else {
                continue;
            };
            let uploaded = upload_mesh(device, &self.object_layout, mesh);
            self.meshes.insert(draw.mesh, uploaded);
        }
    }

    /// Draw every planned object
    pub fn draw<'pass>(
        &'pass self,
        queue: &wgpu::Queue,
        pass: &mut wgpu::RenderPass<'pass>,
        camera: &'pass CameraBinding,
        draws: &[SolidDraw],
    ) {
        if draws.is_empty() {
            return;
        }

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &camera.bind_group, &[]);

        for draw in draws {
            let Some(mesh) = self.meshes.get(&draw.mesh) else {
                continue;
            };

            let object = SolidObjectUniform {
                model: draw.model.into(),
            };
            queue.write_buffer(&mesh.object_buffer, 0, bytemuck::bytes_of(&object));

            pass.set_bind_group(1, &mesh.bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn upload_mesh(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, mesh: &Mesh) -> SolidMesh {
    let (vertices, indices) = mesh_vertices(mesh);

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Solid Mesh Vertex Buffer"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Solid Mesh Index Buffer"),
        contents: bytemuck::cast_slice(&indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    let object = SolidObjectUniform {
        model: Matrix4::identity().into(),
    };
    let object_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Solid Mesh Object Buffer"),
        contents: bytemuck::bytes_of(&object),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: object_buffer.as_entire_binding(),
        }],
        label: Some("solid_mesh_bind_group"),
    });

    SolidMesh {
        vertex_buffer,
        index_buffer,
        object_buffer,
        bind_group,
        index_count: indices.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudview_core::{Point3f, SceneObject, Transform3D};

    fn tetrahedron() -> Mesh {
        Mesh::from_vertices_and_faces(
            "tetra",
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.5, 1.0, 0.0),
                Point3f::new(0.5, 0.5, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        )
    }

    #[test]
    fn solid_draw_suppressed_while_point_display_enabled() {
        let mut scene = Scene::new();
        let id = scene.add_mesh(tetrahedron());
        scene.add_object(SceneObject::mesh_object("t", id, Transform3D::identity()));

        let mut table = DisplayTable::new();
        assert_eq!(solid_draws(&scene, &table).len(), 1);

        table.set_enabled(id, true);
        assert!(solid_draws(&scene, &table).is_empty());

        table.set_enabled(id, false);
        assert_eq!(solid_draws(&scene, &table).len(), 1);
    }

    #[test]
    fn faceless_meshes_never_draw_solid() {
        let mut scene = Scene::new();
        let id = scene.add_mesh(Mesh::from_vertices("cloud", vec![Point3f::origin()]));
        scene.add_object(SceneObject::mesh_object("c", id, Transform3D::identity()));

        let table = DisplayTable::new();
        assert!(solid_draws(&scene, &table).is_empty());
    }

    #[test]
    fn vertex_normals_are_unit_length() {
        let (vertices, indices) = mesh_vertices(&tetrahedron());
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices.len(), 12);
        for vertex in &vertices {
            let length = (vertex.normal[0].powi(2)
                + vertex.normal[1].powi(2)
                + vertex.normal[2].powi(2))
            .sqrt();
            approx::assert_relative_eq!(length, 1.0, epsilon = 1.0e-5);
        }
    }
}
