use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

use crate::frame::{DepthPassUniforms, LitPassUniforms};

/// Light-space transform for the shadow depth pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DepthGlobals {
    pub light_space: [[f32; 4]; 4],
}

impl From<&DepthPassUniforms> for DepthGlobals {
    fn from(uniforms: &DepthPassUniforms) -> Self {
        Self {
            light_space: uniforms.light_space.to_cols_array_2d(),
        }
    }
}

/// Group 0 of the lit, marker and sky pipelines.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LitGlobals {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    pub sky_inverse_view_proj: [[f32; 4]; 4],
    pub directional_dir: [f32; 4],
    pub directional_color: [f32; 4],
    pub point_position: [f32; 4],
    pub point_color: [f32; 4],
}

impl From<&LitPassUniforms> for LitGlobals {
    fn from(uniforms: &LitPassUniforms) -> Self {
        Self {
            view: uniforms.view.to_cols_array_2d(),
            projection: uniforms.projection.to_cols_array_2d(),
            light_space: uniforms.light_space.to_cols_array_2d(),
            sky_inverse_view_proj: uniforms.sky_inverse_view_proj.to_cols_array_2d(),
            directional_dir: uniforms.directional_dir_view.extend(0.0).into(),
            directional_color: uniforms.directional_color.extend(1.0).into(),
            point_position: uniforms.point_pos_view.extend(1.0).into(),
            point_color: uniforms.point_color.extend(1.0).into(),
        }
    }
}

/// Per-draw constants. `normal` is the eye-space normal matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectConstants {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub color: [f32; 4],
}

impl ObjectConstants {
    pub fn new(model: Mat4, normal: Mat3, color: Vec3) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
            color: color.extend(1.0).into(),
        }
    }
}

/// WGSL pads each `mat3x3` column to 16 bytes.
pub fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}
