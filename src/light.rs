use glam::{Mat3, Mat4, Vec3};

/// Half extent of the light's orthographic frustum, in world units.
pub const LIGHT_FRUSTUM_HALF_EXTENT: f32 = 2.0;
pub const LIGHT_NEAR: f32 = 0.1;
pub const LIGHT_FAR: f32 = 10.0;
/// Uniform scale applied to the small meshes that mark light positions.
pub const MARKER_SCALE: f32 = 0.05;

/// Directional light described by a base direction rotated around world up.
///
/// `direction` points from the scene towards the light. The effective
/// direction is always `rotation() * direction`, both for shadowing and for
/// shading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub rotation_deg: f32,
    pub color: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, 2.0, 1.0),
            rotation_deg: 0.0,
            color: Vec3::ONE,
        }
    }
}

impl DirectionalLight {
    pub fn rotation(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation_deg.to_radians())
    }

    pub fn effective_direction(&self) -> Vec3 {
        self.rotation().transform_vector3(self.direction)
    }

    /// Light direction in eye space: `inverseTranspose(mat3(view * R)) * base`.
    pub fn view_space_direction(&self, view: Mat4) -> Vec3 {
        let linear = Mat3::from_mat4(view * self.rotation());
        linear.inverse().transpose() * self.direction
    }

    pub fn light_space_matrix(&self) -> Mat4 {
        light_space_matrix(self.direction, self.rotation_deg)
    }

    pub fn marker_model(&self) -> Mat4 {
        self.rotation()
            * Mat4::from_translation(self.direction)
            * Mat4::from_scale(Vec3::splat(MARKER_SCALE))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(1.0, 1.0, 0.0),
            color: Vec3::new(0.0, 1.0, 1.0),
        }
    }
}

impl PointLight {
    pub fn view_space_position(&self, view: Mat4) -> Vec3 {
        view.transform_point3(self.position)
    }

    pub fn marker_model(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(Vec3::splat(MARKER_SCALE))
    }
}

/// Which light the lateral/height keys currently adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightSelection {
    #[default]
    Directional,
    Point,
}

impl LightSelection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Directional => Self::Point,
            Self::Point => Self::Directional,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Directional => "directional",
            Self::Point => "point",
        }
    }
}

/// Fixed orthographic projection used for the directional light.
pub fn light_projection() -> Mat4 {
    let h = LIGHT_FRUSTUM_HALF_EXTENT;
    Mat4::orthographic_rh(-h, h, -h, h, LIGHT_NEAR, LIGHT_FAR)
}

/// View-projection of the directional light looking at the world origin from
/// `rotY(rotation_deg) * base_direction`.
pub fn light_space_matrix(base_direction: Vec3, rotation_deg: f32) -> Mat4 {
    let eye = Mat4::from_rotation_y(rotation_deg.to_radians()).transform_vector3(base_direction);
    // straight overhead light would make +Y a degenerate up vector
    let up = if eye.normalize_or_zero().cross(Vec3::Y).length_squared() < 1e-8 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    light_projection() * Mat4::look_at_rh(eye, Vec3::ZERO, up)
}
