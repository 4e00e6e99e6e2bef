use std::collections::HashMap;

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::obj::{MeshData, Vertex};
use crate::scene::{LoadedMesh, MeshRole};

pub struct MeshBuffers {
    pub vertex: wgpu::Buffer,
    pub index: wgpu::Buffer,
    pub index_count: u32,
    pub color: Vec3,
}

impl MeshBuffers {
    pub fn from_mesh(device: &wgpu::Device, mesh: &MeshData, color: Vec3, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
            color,
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex.slice(..));
        pass.set_index_buffer(self.index.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Uploaded meshes keyed by role. Every role is always present.
pub struct MeshLibrary {
    meshes: HashMap<MeshRole, MeshBuffers>,
}

impl MeshLibrary {
    pub fn upload(device: &wgpu::Device, loaded: &[LoadedMesh]) -> Self {
        let mut meshes: HashMap<MeshRole, MeshBuffers> = loaded
            .iter()
            .filter(|mesh| !mesh.data.indices.is_empty())
            .map(|mesh| {
                let buffers =
                    MeshBuffers::from_mesh(device, &mesh.data, mesh.color, mesh.role.name());
                (mesh.role, buffers)
            })
            .collect();
        for role in MeshRole::ALL {
            meshes.entry(role).or_insert_with(|| {
                MeshBuffers::from_mesh(device, &role.builtin(), Vec3::ONE, role.name())
            });
        }
        Self { meshes }
    }

    pub fn get(&self, role: MeshRole) -> &MeshBuffers {
        &self.meshes[&role]
    }
}

/// Stride and attributes shared by every mesh pipeline.
pub fn vertex_layout(with_normals: bool) -> wgpu::VertexBufferLayout<'static> {
    const POSITION_ONLY: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
    const WITH_NORMALS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: if with_normals {
            &WITH_NORMALS
        } else {
            &POSITION_ONLY
        },
    }
}
