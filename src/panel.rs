use egui::{Context, Slider, Ui};
use glam::Vec3;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::render::OverlayTarget;
use crate::state::SceneState;

const PANEL_MARGIN: f32 = 10.0;

/// Builds the control panel: point light, directional light and ship.
pub fn draw_panel(ctx: &Context, state: &mut SceneState) {
    egui::Window::new("Point Light")
        .default_pos([PANEL_MARGIN, PANEL_MARGIN])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label("Position:");
            let position = &mut state.point.position;
            ui.add(Slider::new(&mut position.x, -10.0..=10.0).text("posX"));
            ui.add(Slider::new(&mut position.y, 0.0..=10.0).text("posY"));
            ui.add(Slider::new(&mut position.z, -10.0..=10.0).text("posZ"));
            color_picker(ui, "Color", &mut state.point.color);
        });

    egui::Window::new("Directional Light")
        .default_pos([PANEL_MARGIN, 190.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label("Position:");
            let light = &mut state.directional;
            ui.add(Slider::new(&mut light.direction.x, -10.0..=10.0).text("posX"));
            ui.add(Slider::new(&mut light.direction.y, 0.0..=10.0).text("posY"));
            ui.label("Rotation:");
            ui.add(Slider::new(&mut light.rotation_deg, 0.0..=360.0).text("rotY"));
            color_picker(ui, "Color", &mut light.color);
        });

    egui::Window::new("Ship")
        .default_pos([PANEL_MARGIN, 350.0])
        .resizable(false)
        .show(ctx, |ui| {
            let ship = &mut state.ship;
            ui.label("Position:");
            ui.add(Slider::new(&mut ship.position.x, -10.0..=10.0).text("posX"));
            ui.add(Slider::new(&mut ship.position.y, -10.0..=10.0).text("posY"));
            ui.add(Slider::new(&mut ship.position.z, -10.0..=10.0).text("posZ"));
            ui.label("Rotation:");
            ui.add(Slider::new(&mut ship.euler_deg.x, -180.0..=180.0).text("rotX"));
            ui.add(Slider::new(&mut ship.euler_deg.y, -180.0..=180.0).text("rotY"));
            ui.add(Slider::new(&mut ship.euler_deg.z, -180.0..=180.0).text("rotZ"));
            ui.label("Scale:");
            ui.add(
                Slider::new(&mut ship.scale, 0.001..=0.5)
                    .logarithmic(true)
                    .text("Sc"),
            );
        });
}

fn color_picker(ui: &mut Ui, label: &str, color: &mut Vec3) {
    ui.horizontal(|ui| {
        ui.label(label);
        let mut rgb = color.to_array();
        if ui.color_edit_button_rgb(&mut rgb).changed() {
            *color = Vec3::from_array(rgb);
        }
    });
}

/// egui context plus its winit and wgpu glue.
pub struct PanelOverlay {
    ctx: Context,
    input: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl PanelOverlay {
    pub fn new(window: &Window, device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let ctx = Context::default();
        let input = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            None,
            None,
            None,
        );
        let renderer =
            egui_wgpu::Renderer::new(device, format, egui_wgpu::RendererOptions::default());
        Self {
            ctx,
            input,
            renderer,
        }
    }

    /// Returns true when the panel consumed the event.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.input.on_window_event(window, event).consumed
    }

    /// Pointer is over, or dragging, a panel widget.
    pub fn wants_pointer(&self) -> bool {
        self.ctx.wants_pointer_input() || self.ctx.is_pointer_over_area()
    }

    /// Runs the panel against `state` and records its pass on top of the
    /// frame.
    pub fn paint(&mut self, window: &Window, state: &mut SceneState, target: OverlayTarget<'_>) {
        let raw_input = self.input.take_egui_input(window);
        let output = self.ctx.run(raw_input, |ctx| draw_panel(ctx, state));
        self.input
            .handle_platform_output(window, output.platform_output);

        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: target.size_in_pixels,
            pixels_per_point: output.pixels_per_point,
        };
        let primitives = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        for (id, delta) in &output.textures_delta.set {
            self.renderer
                .update_texture(target.device, target.queue, *id, delta);
        }
        let callbacks = self.renderer.update_buffers(
            target.device,
            target.queue,
            target.encoder,
            &primitives,
            &screen,
        );
        target.queue.submit(callbacks);

        {
            let pass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("panel-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view,
                    depth_slice: None,
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
            let mut pass = pass.forget_lifetime();
            self.renderer.render(&mut pass, &primitives, &screen);
        }

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}
