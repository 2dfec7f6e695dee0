//! Settings panels: two equivalent views over one display table
//!
//! The viewport sidebar and the object-properties window both render the
//! same widget row bound to the same settings entry, so neither holds a
//! copy of the state and they can never drift apart.

use cloudview_core::{DisplayTable, MeshId, Scene, MIN_POINT_SIZE};

/// A panel toggle: point display for `mesh` switched to `enabled`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToggleEvent {
    pub mesh: MeshId,
    pub enabled: bool,
}

/// Shared settings row used by both panels.
///
/// Returns a toggle event when the enabled checkbox changed this frame, so
/// the caller can evict or schedule the mesh's batch.
pub fn settings_row(
    ui: &mut egui::Ui,
    table: &mut DisplayTable,
    mesh: MeshId,
) -> Option<ToggleEvent> {
    let settings = table.settings_mut(mesh);
    let mut event = None;

    ui.horizontal(|ui| {
        if ui.checkbox(&mut settings.enabled, "Enabled").changed() {
            event = Some(ToggleEvent {
                mesh,
                enabled: settings.enabled,
            });
        }

        ui.label("Point Size");
        let mut size = settings.point_size;
        if ui
            .add(
                egui::DragValue::new(&mut size)
                    .speed(0.1)
                    .clamp_range(MIN_POINT_SIZE..=200.0),
            )
            .changed()
        {
            settings.set_point_size(size);
        }
    });

    event
}

/// Viewport sidebar: an object selector plus the shared settings row
pub fn sidebar_panel(
    ctx: &egui::Context,
    scene: &Scene,
    table: &mut DisplayTable,
    selected: &mut usize,
) -> Option<ToggleEvent> {
    let mut event = None;

    egui::SidePanel::right("point_cloud_display").show(ctx, |ui| {
        ui.heading("Point Cloud Display");
        ui.separator();

        if scene.objects().is_empty() {
            ui.label("No objects in scene");
            return;
        }
        *selected = (*selected).min(scene.objects().len() - 1);

        egui::ComboBox::from_label("Object")
            .selected_text(scene.objects()[*selected].name.clone())
            .show_ui(ui, |ui| {
                for (index, object) in scene.objects().iter().enumerate() {
                    ui.selectable_value(selected, index, &object.name);
                }
            });

        match scene.objects()[*selected].mesh_id() {
            Some(mesh) => {
                event = settings_row(ui, table, mesh);
            }
            None => {
                ui.label("Object has no mesh data");
            }
        }
    });

    event
}

/// Object-properties window: the same settings row under a display section
pub fn properties_window(
    ctx: &egui::Context,
    scene: &Scene,
    table: &mut DisplayTable,
    selected: usize,
) -> Option<ToggleEvent> {
    let Some(object) = scene.objects().get(selected) else {
        return None;
    };
    let mut event = None;

    egui::Window::new("Object Properties")
        .default_open(false)
        .show(ctx, |ui| {
            ui.label(format!("Name: {}", object.name));
            ui.label(format!("Visible: {}", object.visible));

            match object.mesh_id() {
                Some(mesh) => {
                    ui.collapsing("Point Cloud Display", |ui| {
                        event = settings_row(ui, table, mesh);
                    });
                }
                None => {
                    ui.label("No mesh data");
                }
            }
        });

    event
}
