use std::collections::HashMap;
use std::f32::consts::PI;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Interleaved vertex shared by every pipeline: position then normal.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }
}

/// Indexed triangle list ready for upload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangles as position triples, in index order.
    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }
}

pub fn load_obj_file(path: &Path) -> Result<MeshData> {
    let source =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    load_obj_from_str(&source).with_context(|| format!("failed to parse {}", path.display()))
}

/// Parses Wavefront OBJ text. Polygons are fan triangulated, texture
/// coordinates are ignored and missing normals are generated from faces.
pub fn load_obj_from_str(data: &str) -> Result<MeshData> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut corners: Vec<Corner> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let line_no = line_no + 1;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => positions.push(
                parse_vec3(parts).with_context(|| format!("invalid vertex on line {line_no}"))?,
            ),
            Some("vn") => normals.push(
                parse_vec3(parts).with_context(|| format!("invalid normal on line {line_no}"))?,
            ),
            Some("f") => {
                let polygon =
                    parse_face(parts).with_context(|| format!("invalid face on line {line_no}"))?;
                for i in 1..polygon.len() - 1 {
                    corners.extend_from_slice(&[polygon[0], polygon[i], polygon[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        bail!("OBJ data does not define any vertices");
    }
    if corners.is_empty() {
        bail!("OBJ data does not define any faces");
    }

    let mut mesh = MeshData::default();
    let mut lookup: HashMap<(usize, Option<usize>), u32> = HashMap::new();
    let mut missing_normals = false;
    for corner in &corners {
        let position = resolve_index(corner.position, positions.len())
            .ok_or_else(|| anyhow!("vertex index {} out of range", corner.position))?;
        let normal = match corner.normal {
            Some(raw) => Some(
                resolve_index(raw, normals.len())
                    .ok_or_else(|| anyhow!("normal index {raw} out of range"))?,
            ),
            None => None,
        };
        missing_normals |= normal.is_none();
        let next = mesh.vertices.len() as u32;
        let index = *lookup.entry((position, normal)).or_insert_with(|| {
            let n = normal.map(|i| normals[i]).unwrap_or(Vec3::ZERO);
            mesh.vertices.push(Vertex::new(positions[position], n));
            next
        });
        mesh.indices.push(index);
    }

    if missing_normals {
        generate_normals(&mut mesh);
    }
    Ok(mesh)
}

#[derive(Debug, Clone, Copy)]
struct Corner {
    position: i64,
    normal: Option<i64>,
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut component = || -> Result<f32> {
        let text = parts.next().ok_or_else(|| anyhow!("missing vector component"))?;
        text.parse::<f32>()
            .with_context(|| format!("`{text}` is not a number"))
    };
    Ok(Vec3::new(component()?, component()?, component()?))
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<Corner>> {
    let mut polygon = Vec::new();
    for part in parts {
        let mut fields = part.split('/');
        let position = fields
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i64>()
            .with_context(|| format!("bad vertex reference `{part}`"))?;
        let _texcoord = fields.next();
        let normal = match fields.next() {
            Some(text) if !text.is_empty() => Some(
                text.parse::<i64>()
                    .with_context(|| format!("bad normal reference `{part}`"))?,
            ),
            _ => None,
        };
        polygon.push(Corner { position, normal });
    }
    if polygon.len() < 3 {
        bail!("faces must reference at least 3 vertices");
    }
    Ok(polygon)
}

/// OBJ indices are 1-based; negative values count back from the end.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = match index {
        i if i > 0 => i - 1,
        i if i < 0 => len + i,
        _ => return None,
    };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

fn generate_normals(mesh: &mut MeshData) {
    let mut accum = vec![Vec3::ZERO; mesh.vertices.len()];
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        let p = |i: usize| Vec3::from_array(mesh.vertices[i].position);
        let face = (p(b) - p(a)).cross(p(c) - p(a));
        if face.length_squared() > f32::EPSILON {
            let face = face.normalize();
            accum[a] += face;
            accum[b] += face;
            accum[c] += face;
        }
    }
    for (vertex, normal) in mesh.vertices.iter_mut().zip(accum) {
        if Vec3::from_array(vertex.normal) == Vec3::ZERO {
            vertex.normal = normal.normalize_or_zero().to_array();
        }
    }
}

/// Axis-aligned cube centred on the origin with per-face normals.
pub fn cube(size: f32) -> MeshData {
    let h = size * 0.5;
    // (normal, tangent u, tangent v) with u x v == normal
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let mut mesh = MeshData::default();
    for (normal, u, v) in faces {
        let base = mesh.vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = (normal + u * su + v * sv) * h;
            mesh.vertices.push(Vertex::new(position, normal));
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// Horizontal square in the XZ plane facing +Y.
pub fn plane(size: f32) -> MeshData {
    let h = size * 0.5;
    let vertices = [
        Vec3::new(-h, 0.0, -h),
        Vec3::new(h, 0.0, -h),
        Vec3::new(h, 0.0, h),
        Vec3::new(-h, 0.0, h),
    ]
    .into_iter()
    .map(|p| Vertex::new(p, Vec3::Y))
    .collect();
    MeshData {
        vertices,
        indices: vec![0, 2, 1, 0, 3, 2],
    }
}

/// Unit-radius UV sphere.
pub fn sphere(segments: u32, rings: u32) -> MeshData {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut mesh = MeshData::default();
    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        for segment in 0..=segments {
            let theta = 2.0 * PI * segment as f32 / segments as f32;
            let p = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            mesh.vertices.push(Vertex::new(p, p));
        }
    }
    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * stride + segment;
            let next = current + stride;
            if ring != 0 {
                mesh.indices.extend_from_slice(&[current, current + 1, next]);
            }
            if ring != rings - 1 {
                mesh.indices
                    .extend_from_slice(&[current + 1, next + 1, next]);
            }
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_outward_winding(mesh: &MeshData) {
        for [a, b, c] in mesh.triangles() {
            let pa = Vec3::from_array(a.position);
            let pb = Vec3::from_array(b.position);
            let pc = Vec3::from_array(c.position);
            let face = (pb - pa).cross(pc - pa);
            if face.length_squared() < 1e-10 {
                continue;
            }
            let vertex_normal = Vec3::from_array(a.normal)
                + Vec3::from_array(b.normal)
                + Vec3::from_array(c.normal);
            assert!(
                face.dot(vertex_normal) > 0.0,
                "triangle {pa:?} {pb:?} {pc:?} is wound inward"
            );
        }
    }

    #[test]
    fn parses_quad_with_normals() {
        let obj = "# quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1 4//1\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn generates_missing_normals() {
        let mesh = load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        for vertex in &mesh.vertices {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn accepts_negative_and_textured_indices() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf -3/1 -2/1 -1/1\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn reports_line_of_bad_vertex() {
        let err = load_obj_from_str("v 0 0 0\nv 1 nope 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn rejects_out_of_range_faces() {
        assert!(load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n").is_err());
        assert!(load_obj_from_str("v 0 0 0\n").is_err());
    }

    #[test]
    fn primitives_wind_outward() {
        assert_outward_winding(&cube(1.0));
        assert_outward_winding(&plane(10.0));
        assert_outward_winding(&sphere(24, 16));
    }

    #[test]
    fn cube_has_expected_extent() {
        let mesh = cube(2.0);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh
            .vertices
            .iter()
            .all(|v| v.position.iter().all(|c| c.abs() == 1.0)));
    }
}
