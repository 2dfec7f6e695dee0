//! Windowed viewer: event loop, frame orchestration, panel wiring
//!
//! Each redraw uploads the camera uniform, lets the panels mutate the
//! display table, plans the overlay frame, uploads any newly enabled
//! batches, then records one scene pass (solid geometry first, the point
//! overlay after it) and one UI pass.

use std::sync::Arc;

use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::Key,
    window::WindowBuilder,
};

use cloudview_core::{DisplayTable, Error, MeshId, Result, Scene};
use cloudview_gpu::{
    plan_frame, solid_draws, CameraBinding, GpuContext, PointOverlay, SolidRenderer, DEPTH_FORMAT,
};

use crate::camera::Camera;
use crate::panels::{self, ToggleEvent};

/// Viewer window configuration
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub background_color: [f64; 4],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "cloudview".to_string(),
            width: 1200,
            height: 800,
            background_color: [0.1, 0.1, 0.1, 1.0],
        }
    }
}

/// Interactive viewer over a scene, with per-mesh point display controls
pub struct Viewer {
    config: ViewerConfig,
    scene: Scene,
    table: DisplayTable,
    camera: Camera,
    selected_object: usize,
    last_mouse_pos: Option<PhysicalPosition<f64>>,
    mouse_pressed: bool,
    right_mouse_pressed: bool,
}

impl Viewer {
    /// Create a viewer over a scene with default configuration
    pub fn new(scene: Scene) -> Self {
        Self::with_config(scene, ViewerConfig::default())
    }

    /// Create a viewer with an explicit configuration
    pub fn with_config(scene: Scene, config: ViewerConfig) -> Self {
        Self {
            config,
            scene,
            table: DisplayTable::new(),
            camera: Camera::default(),
            selected_object: 0,
            last_mouse_pos: None,
            mouse_pressed: false,
            right_mouse_pressed: false,
        }
    }

    /// The display settings table
    pub fn display_table_mut(&mut self) -> &mut DisplayTable {
        &mut self.table
    }

    /// Enable or disable point display for a mesh before the viewer runs
    pub fn set_point_display(&mut self, mesh: MeshId, enabled: bool) {
        self.table.set_enabled(mesh, enabled);
    }

    /// The viewer camera
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Open the window and run until it is closed
    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()
            .map_err(|e| Error::Visualization(format!("Failed to create event loop: {}", e)))?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(&self.config.title)
                .with_inner_size(winit::dpi::LogicalSize::new(
                    self.config.width as f64,
                    self.config.height as f64,
                ))
                .build(&event_loop)
                .map_err(|e| Error::Visualization(format!("Failed to create window: {}", e)))?,
        );

        let context = pollster::block_on(GpuContext::new())?;
        let surface = context
            .instance
            .create_surface(window.clone())
            .map_err(|e| Error::Gpu(format!("Failed to create surface: {:?}", e)))?;

        let surface_caps = surface.get_capabilities(&context.adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let size = window.inner_size();
        let mut surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&context.device, &surface_config);

        let mut depth_view =
            create_depth_view(&context.device, surface_config.width, surface_config.height);

        // shader rejection here disables the whole feature, reported once
        let camera_binding = CameraBinding::new(&context.device);
        let mut overlay = PointOverlay::new(&context, surface_format, &camera_binding.layout)?;
        let mut solid = SolidRenderer::new(&context, surface_format, &camera_binding.layout);

        let egui_ctx = egui::Context::default();
        let mut egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window.as_ref(),
            None,
            None,
        );
        let mut egui_renderer = egui_wgpu::Renderer::new(&context.device, surface_format, None, 1);

        self.camera.aspect_ratio = surface_config.width as f32 / surface_config.height as f32;

        log::info!(
            "viewer initialized: {} objects, {} meshes",
            self.scene.object_count(),
            self.scene.mesh_count()
        );

        event_loop
            .run(move |event, target| {
                target.set_control_flow(ControlFlow::Poll);

                let Event::WindowEvent { event, .. } = event else {
                    return;
                };

                let response = egui_state.on_window_event(&window, &event);
                if response.repaint {
                    window.request_redraw();
                }

                match event {
                    WindowEvent::CloseRequested => {
                        target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if new_size.width > 0 && new_size.height > 0 {
                            surface_config.width = new_size.width;
                            surface_config.height = new_size.height;
                            surface.configure(&context.device, &surface_config);
                            depth_view =
                                create_depth_view(&context.device, new_size.width, new_size.height);
                            self.camera.aspect_ratio =
                                new_size.width as f32 / new_size.height as f32;
                        }
                    }
                    WindowEvent::MouseInput { state, button, .. } if !response.consumed => {
                        match button {
                            MouseButton::Left => {
                                self.mouse_pressed = state == ElementState::Pressed;
                            }
                            MouseButton::Right => {
                                self.right_mouse_pressed = state == ElementState::Pressed;
                            }
                            _ => {}
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        if let Some(last) = self.last_mouse_pos {
                            let dx = (position.x - last.x) as f32;
                            let dy = (position.y - last.y) as f32;
                            if !response.consumed {
                                if self.mouse_pressed {
                                    self.camera.orbit(dx * 0.01, dy * 0.01);
                                } else if self.right_mouse_pressed {
                                    self.camera.pan(-dx * 0.002, dy * 0.002);
                                }
                            }
                        }
                        self.last_mouse_pos = Some(position);
                    }
                    WindowEvent::MouseWheel { delta, .. } if !response.consumed => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                        };
                        self.camera.zoom(scroll * 0.1);
                    }
                    WindowEvent::KeyboardInput { event, .. } if !response.consumed => {
                        if event.state == ElementState::Pressed {
                            if let Key::Character(c) = &event.logical_key {
                                if matches!(c.as_str(), "r" | "R") {
                                    self.camera.reset();
                                }
                            }
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        camera_binding.update(
                            &context.queue,
                            self.camera.perspective_matrix(),
                            [surface_config.width as f32, surface_config.height as f32],
                        );

                        // run the panels; both views share the same table
                        let raw_input = egui_state.take_egui_input(&window);
                        let mut toggles: Vec<ToggleEvent> = Vec::new();
                        let full_output = egui_ctx.run(raw_input, |ctx| {
                            toggles.extend(panels::sidebar_panel(
                                ctx,
                                &self.scene,
                                &mut self.table,
                                &mut self.selected_object,
                            ));
                            toggles.extend(panels::properties_window(
                                ctx,
                                &self.scene,
                                &mut self.table,
                                self.selected_object,
                            ));
                        });
                        egui_state.handle_platform_output(&window, full_output.platform_output);

                        // toggling off frees the batch; toggling on leaves the
                        // build to the frame plan below
                        for toggle in toggles {
                            if !toggle.enabled {
                                overlay.evict(toggle.mesh);
                            }
                        }

                        let plan =
                            plan_frame(&self.scene, &self.table, |id| overlay.is_resident(id));
                        overlay.prepare(&context.device, &self.scene, &plan);

                        let solids = solid_draws(&self.scene, &self.table);
                        solid.prepare(&context.device, &self.scene, &solids);

                        let primitives =
                            egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
                        let screen_descriptor = egui_wgpu::ScreenDescriptor {
                            size_in_pixels: [surface_config.width, surface_config.height],
                            pixels_per_point: full_output.pixels_per_point,
                        };
                        for (id, delta) in &full_output.textures_delta.set {
                            egui_renderer.update_texture(
                                &context.device,
                                &context.queue,
                                *id,
                                delta,
                            );
                        }

                        let output = match surface.get_current_texture() {
                            Ok(output) => output,
                            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                                surface.configure(&context.device, &surface_config);
                                window.request_redraw();
                                return;
                            }
                            Err(e) => {
                                log::error!("failed to acquire surface texture: {:?}", e);
                                return;
                            }
                        };
                        let view = output
                            .texture
                            .create_view(&wgpu::TextureViewDescriptor::default());

                        let mut encoder = context.device.create_command_encoder(
                            &wgpu::CommandEncoderDescriptor {
                                label: Some("Viewer Render Encoder"),
                            },
                        );

                        egui_renderer.update_buffers(
                            &context.device,
                            &context.queue,
                            &mut encoder,
                            &primitives,
                            &screen_descriptor,
                        );

                        {
                            let mut pass =
                                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                                    label: Some("Scene Render Pass"),
                                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                        view: &view,
                                        resolve_target: None,
                                        ops: wgpu::Operations {
                                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                                r: self.config.background_color[0],
                                                g: self.config.background_color[1],
                                                b: self.config.background_color[2],
                                                a: self.config.background_color[3],
                                            }),
                                            store: wgpu::StoreOp::Store,
                                        },
                                    })],
                                    depth_stencil_attachment: Some(
                                        wgpu::RenderPassDepthStencilAttachment {
                                            view: &depth_view,
                                            depth_ops: Some(wgpu::Operations {
                                                load: wgpu::LoadOp::Clear(1.0),
                                                store: wgpu::StoreOp::Store,
                                            }),
                                            stencil_ops: None,
                                        },
                                    ),
                                    timestamp_writes: None,
                                    occlusion_query_set: None,
                                });

                            // opaque geometry first, the point overlay after it
                            solid.draw(&context.queue, &mut pass, &camera_binding, &solids);
                            overlay.draw(&context.queue, &mut pass, &camera_binding, &plan);
                        }

                        {
                            let mut pass =
                                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                                    label: Some("UI Render Pass"),
                                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                        view: &view,
                                        resolve_target: None,
                                        ops: wgpu::Operations {
                                            load: wgpu::LoadOp::Load,
                                            store: wgpu::StoreOp::Store,
                                        },
                                    })],
                                    depth_stencil_attachment: None,
                                    timestamp_writes: None,
                                    occlusion_query_set: None,
                                });
                            egui_renderer.render(&mut pass, &primitives, &screen_descriptor);
                        }

                        context.queue.submit(std::iter::once(encoder.finish()));
                        output.present();

                        for id in &full_output.textures_delta.free {
                            egui_renderer.free_texture(id);
                        }

                        window.request_redraw();
                    }
                    _ => {}
                }
            })
            .map_err(|e| Error::Visualization(format!("Event loop error: {}", e)))?;

        Ok(())
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
