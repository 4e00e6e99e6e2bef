use glam::{Mat4, UVec2, Vec3};

use crate::camera::{CameraMode, CameraRig};
use crate::config::{FIELD_OF_VIEW_DEG, Z_FAR, Z_NEAR};
use crate::light::{DirectionalLight, LightSelection, PointLight};
use crate::scene::SceneDescription;
use crate::ship::{Levitation, ShipTransform};

/// All mutable viewer state. Input, the control panel and the frame
/// orchestrator receive it by reference.
#[derive(Debug, Clone)]
pub struct SceneState {
    pub cameras: CameraRig,
    pub directional: DirectionalLight,
    pub point: PointLight,
    pub selection: LightSelection,
    pub ship: ShipTransform,
    pub levitation: Levitation,
    pub framebuffer: UVec2,
    pub wireframe: bool,
}

impl SceneState {
    pub fn new(scene: &SceneDescription, framebuffer: (u32, u32)) -> Self {
        Self {
            cameras: CameraRig::default(),
            directional: scene.directional,
            point: scene.point,
            selection: LightSelection::default(),
            ship: scene.ship,
            levitation: Levitation::default(),
            framebuffer: UVec2::new(framebuffer.0, framebuffer.1),
            wireframe: false,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.cameras.mode()
    }

    pub fn edit_mode(&self) -> bool {
        self.mode() == CameraMode::Edit
    }

    /// Ignores zero-sized (minimised) framebuffers.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.framebuffer = UVec2::new(width, height);
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.framebuffer.y == 0 {
            1.0
        } else {
            self.framebuffer.x as f32 / self.framebuffer.y as f32
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            FIELD_OF_VIEW_DEG.to_radians(),
            self.aspect_ratio(),
            Z_NEAR,
            Z_FAR,
        )
    }

    /// Per-tick automatic updates. Levitation only runs while riding.
    pub fn advance(&mut self) {
        if !self.edit_mode() {
            self.levitation.advance();
        }
    }

    pub fn ship_model(&self) -> Mat4 {
        self.ship.model_matrix(self.levitation.offset())
    }

    /// Freezes the state for one frame. Both render passes read this copy.
    pub fn snapshot(&self) -> FrameSnapshot {
        let camera = self.cameras.active();
        FrameSnapshot {
            mode: self.mode(),
            camera_position: camera.position,
            view: camera.view_matrix(),
            projection: self.projection(),
            light_space: self.directional.light_space_matrix(),
            directional: self.directional,
            point: self.point,
            ship_model: self.ship_model(),
            terrain_model: Mat4::IDENTITY,
        }
    }
}

/// Immutable per-tick copy of everything the passes consume, with the shared
/// matrices computed exactly once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    pub mode: CameraMode,
    pub camera_position: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    pub light_space: Mat4,
    pub directional: DirectionalLight,
    pub point: PointLight,
    pub ship_model: Mat4,
    pub terrain_model: Mat4,
}
