//! Per-frame pipeline: snapshot the scene, build the uniforms for each pass
//! once, run the shadow depth pass and then the selected sink.
//!
//! Everything here is plain math over [`FrameSnapshot`]; GPU work happens
//! behind [`RenderBackend`].

use glam::{Mat3, Mat4, Vec3};
use log::info;

use crate::camera::CameraMode;
use crate::controls::{self, ControlEffect};
use crate::input::InputState;
use crate::scene::MeshRole;
use crate::state::{FrameSnapshot, SceneState};

/// Which sink follows the depth pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Shaded,
    /// Full-screen view of the shadow map.
    DepthDebug,
}

impl RenderMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Shaded => Self::DepthDebug,
            Self::DepthDebug => Self::Shaded,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Shaded => "shaded",
            Self::DepthDebug => "depth-debug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthPassUniforms {
    pub light_space: Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthDraw {
    pub mesh: MeshRole,
    pub model: Mat4,
}

/// Everything the shaded sink uploads once per frame. Light vectors are in
/// eye space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LitPassUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub light_space: Mat4,
    pub directional_dir_view: Vec3,
    pub directional_color: Vec3,
    pub point_pos_view: Vec3,
    pub point_color: Vec3,
    /// Inverse of `projection * rotation-only view`, for the sky.
    pub sky_inverse_view_proj: Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LitDraw {
    pub mesh: MeshRole,
    pub model: Mat4,
    pub normal_matrix: Mat3,
}

/// Unlit light marker, drawn in edit mode only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerDraw {
    pub mesh: MeshRole,
    pub model: Mat4,
    pub color: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepthPassPlan {
    pub uniforms: DepthPassUniforms,
    pub draws: Vec<DepthDraw>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LitPassPlan {
    pub uniforms: LitPassUniforms,
    pub draws: Vec<LitDraw>,
    pub markers: Vec<MarkerDraw>,
}

/// Uniforms and draw lists for one frame, derived from a single snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub depth: DepthPassPlan,
    pub lit: LitPassPlan,
}

impl FramePlan {
    pub fn build(snapshot: &FrameSnapshot) -> Self {
        let objects = [
            (MeshRole::Terrain, snapshot.terrain_model),
            (MeshRole::Ship, snapshot.ship_model),
        ];
        let view = snapshot.view;

        let depth = DepthPassPlan {
            uniforms: DepthPassUniforms {
                light_space: snapshot.light_space,
            },
            draws: objects
                .iter()
                .map(|&(mesh, model)| DepthDraw { mesh, model })
                .collect(),
        };

        let sky_view = Mat4::from_mat3(Mat3::from_mat4(view));
        let uniforms = LitPassUniforms {
            view,
            projection: snapshot.projection,
            light_space: snapshot.light_space,
            directional_dir_view: snapshot.directional.view_space_direction(view),
            directional_color: snapshot.directional.color,
            point_pos_view: snapshot.point.view_space_position(view),
            point_color: snapshot.point.color,
            sky_inverse_view_proj: (snapshot.projection * sky_view).inverse(),
        };
        let draws = objects
            .iter()
            .map(|&(mesh, model)| LitDraw {
                mesh,
                model,
                normal_matrix: normal_matrix(view, model),
            })
            .collect();
        let markers = if snapshot.mode == CameraMode::Edit {
            vec![
                MarkerDraw {
                    mesh: MeshRole::LightCube,
                    model: snapshot.directional.marker_model(),
                    color: snapshot.directional.color,
                },
                MarkerDraw {
                    mesh: MeshRole::LightSphere,
                    model: snapshot.point.marker_model(),
                    color: snapshot.point.color,
                },
            ]
        } else {
            Vec::new()
        };

        Self {
            depth,
            lit: LitPassPlan {
                uniforms,
                draws,
                markers,
            },
        }
    }
}

/// `inverseTranspose(mat3(view * model))`.
pub fn normal_matrix(view: Mat4, model: Mat4) -> Mat3 {
    Mat3::from_mat4(view * model).inverse().transpose()
}

/// GPU side of the frame. Calls arrive strictly in order: one depth pass,
/// then exactly one sink.
pub trait RenderBackend {
    fn depth_pass(&mut self, plan: &DepthPassPlan);
    fn depth_debug_pass(&mut self);
    fn shaded_pass(&mut self, plan: &LitPassPlan);
}

/// Runs the per-tick pipeline and owns the render mode flag.
#[derive(Debug, Clone, Default)]
pub struct FrameOrchestrator {
    mode: RenderMode,
}

impl FrameOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn toggle_mode(&mut self) -> RenderMode {
        self.mode = self.mode.toggled();
        info!("render mode: {}", self.mode.name());
        self.mode
    }

    /// Applies input and automatic motion. Render mode toggles are consumed
    /// here; the remaining effects are for the window layer.
    pub fn update(&mut self, state: &mut SceneState, input: &mut InputState) -> Vec<ControlEffect> {
        let mut effects = controls::process(state, input);
        effects.retain(|effect| {
            if *effect == ControlEffect::ToggleRenderMode {
                self.toggle_mode();
                false
            } else {
                true
            }
        });
        state.advance();
        effects
    }

    /// Depth pass, unconditionally, then the sink for the current mode.
    pub fn render<B: RenderBackend + ?Sized>(
        &self,
        snapshot: &FrameSnapshot,
        backend: &mut B,
    ) -> FramePlan {
        let plan = FramePlan::build(snapshot);
        backend.depth_pass(&plan.depth);
        match self.mode {
            RenderMode::Shaded => backend.shaded_pass(&plan.lit),
            RenderMode::DepthDebug => backend.depth_debug_pass(),
        }
        plan
    }

    /// One full tick: update, snapshot, render.
    pub fn tick<B: RenderBackend + ?Sized>(
        &mut self,
        state: &mut SceneState,
        input: &mut InputState,
        backend: &mut B,
    ) -> Vec<ControlEffect> {
        let effects = self.update(state, input);
        let snapshot = state.snapshot();
        self.render(&snapshot, backend);
        effects
    }
}

/// A pass as seen by [`FrameRecorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum PassEvent {
    Depth { light_space: Mat4, draws: usize },
    DepthDebug,
    Shaded {
        light_space: Mat4,
        normal_matrices: Vec<Mat3>,
        markers: usize,
    },
}

/// Backend that records passes instead of drawing. Used for headless runs.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    pub frames: u64,
    pub depth_passes: u64,
    pub shaded_passes: u64,
    pub debug_passes: u64,
    last_frame: Vec<PassEvent>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Passes of the most recent frame, in submission order.
    pub fn last_frame(&self) -> &[PassEvent] {
        &self.last_frame
    }
}

impl RenderBackend for FrameRecorder {
    fn depth_pass(&mut self, plan: &DepthPassPlan) {
        self.frames += 1;
        self.depth_passes += 1;
        self.last_frame.clear();
        self.last_frame.push(PassEvent::Depth {
            light_space: plan.uniforms.light_space,
            draws: plan.draws.len(),
        });
    }

    fn depth_debug_pass(&mut self) {
        self.debug_passes += 1;
        self.last_frame.push(PassEvent::DepthDebug);
    }

    fn shaded_pass(&mut self, plan: &LitPassPlan) {
        self.shaded_passes += 1;
        self.last_frame.push(PassEvent::Shaded {
            light_space: plan.uniforms.light_space,
            normal_matrices: plan.draws.iter().map(|d| d.normal_matrix).collect(),
            markers: plan.markers.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;
    use crate::scene::SceneDescription;

    fn state() -> SceneState {
        SceneState::new(&SceneDescription::default(), (1280, 720))
    }

    fn bits(m: Mat4) -> [u32; 16] {
        m.to_cols_array().map(f32::to_bits)
    }

    #[test]
    fn depth_pass_precedes_sink_in_both_modes() {
        let mut state = state();
        let mut input = InputState::new();
        let mut orchestrator = FrameOrchestrator::new();
        let mut recorder = FrameRecorder::new();

        orchestrator.tick(&mut state, &mut input, &mut recorder);
        assert!(matches!(
            recorder.last_frame(),
            [PassEvent::Depth { .. }, PassEvent::Shaded { .. }]
        ));

        input.key_down(Key::M);
        orchestrator.tick(&mut state, &mut input, &mut recorder);
        assert_eq!(orchestrator.mode(), RenderMode::DepthDebug);
        assert!(matches!(
            recorder.last_frame(),
            [PassEvent::Depth { .. }, PassEvent::DepthDebug]
        ));
        assert_eq!(recorder.frames, 2);
        assert_eq!(recorder.depth_passes, 2);
        assert_eq!(recorder.shaded_passes, 1);
        assert_eq!(recorder.debug_passes, 1);
    }

    #[test]
    fn shadow_map_updates_while_debugging() {
        let mut state = state();
        let mut input = InputState::new();
        let mut orchestrator = FrameOrchestrator::new();
        orchestrator.toggle_mode();
        let mut recorder = FrameRecorder::new();

        input.key_down(Key::O);
        orchestrator.tick(&mut state, &mut input, &mut recorder);
        let [PassEvent::Depth { light_space, .. }, PassEvent::DepthDebug] = recorder.last_frame()
        else {
            panic!("unexpected passes {:?}", recorder.last_frame());
        };
        assert_eq!(bits(*light_space), bits(state.directional.light_space_matrix()));
        assert_eq!(state.directional.rotation_deg, 1.0);
    }

    #[test]
    fn both_passes_share_one_light_space_matrix() {
        let mut state = state();
        state.directional.rotation_deg = 33.0;
        state.directional.direction.x = 0.4;
        let mut recorder = FrameRecorder::new();
        FrameOrchestrator::new().render(&state.snapshot(), &mut recorder);
        let [PassEvent::Depth { light_space: depth, .. }, PassEvent::Shaded { light_space: lit, .. }] =
            recorder.last_frame()
        else {
            panic!("unexpected passes {:?}", recorder.last_frame());
        };
        assert_eq!(bits(*depth), bits(*lit));
    }

    #[test]
    fn each_draw_gets_its_own_normal_matrix() {
        let mut state = state();
        state.ship.scale = 0.5;
        state.ship.euler_deg = Vec3::new(10.0, 20.0, 30.0);
        let snapshot = state.snapshot();
        let plan = FramePlan::build(&snapshot);

        let [terrain, ship] = [plan.lit.draws[0], plan.lit.draws[1]];
        assert_ne!(terrain.normal_matrix, ship.normal_matrix);
        for draw in [terrain, ship] {
            let expected = Mat3::from_mat4(snapshot.view * draw.model).inverse().transpose();
            assert!(draw.normal_matrix.abs_diff_eq(expected, 1e-5));
        }
        assert_eq!(ship.model, snapshot.ship_model);
    }

    #[test]
    fn normal_matrix_tracks_model_updates() {
        let mut state = state();
        let before = FramePlan::build(&state.snapshot()).lit.draws[1].normal_matrix;
        state.ship.euler_deg.y = 90.0;
        let after = FramePlan::build(&state.snapshot()).lit.draws[1].normal_matrix;
        assert!(!before.abs_diff_eq(after, 1e-3));
    }

    #[test]
    fn markers_only_in_edit_mode() {
        let mut state = state();
        let plan = FramePlan::build(&state.snapshot());
        assert_eq!(plan.lit.markers.len(), 2);
        assert_eq!(plan.lit.markers[0].mesh, MeshRole::LightCube);
        assert_eq!(plan.lit.markers[1].color, state.point.color);

        state.cameras.toggle_mode();
        let plan = FramePlan::build(&state.snapshot());
        assert!(plan.lit.markers.is_empty());
        assert_eq!(plan.depth.draws.len(), 2);
    }

    #[test]
    fn lit_uniforms_are_in_eye_space() {
        let state = state();
        let snapshot = state.snapshot();
        let uniforms = FramePlan::build(&snapshot).lit.uniforms;
        let expected_point = snapshot.view.transform_point3(state.point.position);
        assert!(uniforms.point_pos_view.abs_diff_eq(expected_point, 1e-5));
        let expected_dir = snapshot.view.transform_vector3(state.directional.effective_direction());
        assert!(uniforms.directional_dir_view.abs_diff_eq(expected_dir, 1e-4));
    }

    #[test]
    fn input_is_applied_before_depth_pass() {
        let mut state = state();
        let mut input = InputState::new();
        input.key_down(Key::Enter);
        let mut orchestrator = FrameOrchestrator::new();
        let mut recorder = FrameRecorder::new();
        let effects = orchestrator.tick(&mut state, &mut input, &mut recorder);
        assert_eq!(effects, vec![ControlEffect::CursorCapture(true)]);
        assert_eq!(state.mode(), CameraMode::Ride);
        // levitation already ran for this tick
        assert!((state.levitation.offset() - 0.001).abs() < 1e-6);
        let [PassEvent::Depth { .. }, PassEvent::Shaded { markers, .. }] = recorder.last_frame()
        else {
            panic!("unexpected passes {:?}", recorder.last_frame());
        };
        assert_eq!(*markers, 0);
    }
}
