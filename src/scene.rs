use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use log::{error, info};
use roxmltree::{Document, Node};

use crate::error::ViewerError;
use crate::light::{DirectionalLight, PointLight};
use crate::obj::{self, MeshData};
use crate::ship::ShipTransform;

/// Shorter directions have no usable light-space view.
const MIN_DIRECTION_SQ: f32 = 1e-8;

/// What a mesh is used for in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshRole {
    Terrain,
    Ship,
    /// Marker drawn at the directional light.
    LightCube,
    /// Marker drawn at the point light.
    LightSphere,
}

impl MeshRole {
    pub const ALL: [MeshRole; 4] = [
        MeshRole::Terrain,
        MeshRole::Ship,
        MeshRole::LightCube,
        MeshRole::LightSphere,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Terrain => "terrain",
            Self::Ship => "ship",
            Self::LightCube => "light-cube",
            Self::LightSphere => "light-sphere",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.name() == name)
    }

    /// Geometry used when no file is given or the file fails to load.
    pub fn builtin(self) -> MeshData {
        match self {
            // ship model matrix scales by 0.01
            Self::Ship => obj::cube(40.0),
            Self::Terrain => obj::plane(10.0),
            Self::LightCube => obj::cube(2.0),
            Self::LightSphere => obj::sphere(16, 12),
        }
    }

    fn default_color(self) -> Vec3 {
        match self {
            Self::Terrain => Vec3::new(0.62, 0.33, 0.2),
            Self::Ship => Vec3::new(0.75, 0.76, 0.8),
            Self::LightCube | Self::LightSphere => Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshSource {
    pub role: MeshRole,
    pub path: Option<PathBuf>,
    pub color: Vec3,
}

/// Mesh ready for upload, whichever way it was obtained.
#[derive(Debug, Clone)]
pub struct LoadedMesh {
    pub role: MeshRole,
    pub data: MeshData,
    pub color: Vec3,
    pub from_file: bool,
}

/// Startup description of the scene: mesh sources and initial parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescription {
    pub meshes: Vec<MeshSource>,
    pub directional: DirectionalLight,
    pub point: PointLight,
    pub ship: ShipTransform,
}

impl Default for SceneDescription {
    fn default() -> Self {
        Self {
            meshes: MeshRole::ALL
                .into_iter()
                .map(|role| MeshSource {
                    role,
                    path: None,
                    color: role.default_color(),
                })
                .collect(),
            directional: DirectionalLight::default(),
            point: PointLight::default(),
            ship: ShipTransform::default(),
        }
    }
}

impl SceneDescription {
    pub fn load(path: &Path) -> Result<Self> {
        let xml = fs::read_to_string(path)
            .with_context(|| format!("failed to read scene {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_xml(&xml, base_dir)
            .with_context(|| format!("failed to parse scene {}", path.display()))
    }

    /// Parses a `<scene>` document. Relative mesh paths resolve against
    /// `base_dir`; every element is optional.
    pub fn from_xml(xml: &str, base_dir: &Path) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        if !root.has_tag_name("scene") {
            bail!("expected <scene> root, found <{}>", root.tag_name().name());
        }
        let mut scene = Self::default();

        for node in root.children().filter(|n| n.has_tag_name("mesh")) {
            let role_name = node
                .attribute("role")
                .ok_or_else(|| anyhow!("<mesh> is missing the role attribute"))?;
            let role = MeshRole::from_name(role_name)
                .ok_or_else(|| anyhow!("unknown mesh role `{role_name}`"))?;
            let source = scene
                .meshes
                .iter_mut()
                .find(|m| m.role == role)
                .ok_or_else(|| anyhow!("mesh role `{role_name}` is not supported"))?;
            if let Some(path) = optional_text(&node, "path") {
                source.path = Some(base_dir.join(path));
            }
            source.color = parse_color(optional_text(&node, "color"), source.color)
                .with_context(|| format!("bad color for {role_name}"))?;
        }

        if let Some(node) = child(&root, "directional-light") {
            let light = &mut scene.directional;
            light.direction = parse_vec3(optional_text(&node, "direction"), light.direction)?;
            let direction = light.direction;
            if !direction.is_finite() || direction.length_squared() < MIN_DIRECTION_SQ {
                bail!(
                    "directional light direction must be a finite non-zero vector, got {direction}"
                );
            }
            light.rotation_deg = parse_f32(optional_text(&node, "rotation"), light.rotation_deg)?;
            light.color = parse_color(optional_text(&node, "color"), light.color)?;
        }

        if let Some(node) = child(&root, "point-light") {
            let light = &mut scene.point;
            light.position = parse_vec3(optional_text(&node, "position"), light.position)?;
            light.color = parse_color(optional_text(&node, "color"), light.color)?;
        }

        if let Some(node) = child(&root, "ship") {
            let ship = &mut scene.ship;
            ship.position = parse_vec3(optional_text(&node, "position"), ship.position)?;
            ship.euler_deg = parse_vec3(optional_text(&node, "rotation"), ship.euler_deg)?;
            ship.scale = parse_f32(optional_text(&node, "scale"), ship.scale)?;
            if !ship.scale.is_finite() || ship.scale <= 0.0 {
                bail!("ship scale must be positive, got {}", ship.scale);
            }
        }

        Ok(scene)
    }

    /// Loads every mesh, substituting the built-in primitive for missing or
    /// broken files.
    pub fn load_meshes(&self) -> Vec<LoadedMesh> {
        self.meshes
            .iter()
            .map(|source| {
                let loaded = source.path.as_ref().and_then(|path| {
                    match obj::load_obj_file(path) {
                        Ok(data) => {
                            info!(
                                "loaded {} mesh from {} ({} triangles)",
                                source.role.name(),
                                path.display(),
                                data.triangle_count()
                            );
                            Some(data)
                        }
                        Err(err) => {
                            let err = ViewerError::asset(path, &err);
                            error!("{err}; using built-in {}", source.role.name());
                            None
                        }
                    }
                });
                LoadedMesh {
                    role: source.role,
                    from_file: loaded.is_some(),
                    data: loaded.unwrap_or_else(|| source.role.builtin()),
                    color: source.color,
                }
            })
            .collect()
    }
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.has_tag_name(tag))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|c| c.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn parse_components(value: &str, what: &str) -> Result<Vec3> {
    let numbers = value
        .split_whitespace()
        .map(|c| {
            c.parse::<f32>()
                .with_context(|| format!("{what} component `{c}` is not a number"))
        })
        .collect::<Result<Vec<_>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => bail!("{what} needs 3 components, got {}", numbers.len()),
    }
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    value.map_or(Ok(default), |v| parse_components(&v, "vector"))
}

/// Colors are written as 0-255 integers.
fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    value.map_or(Ok(default), |v| {
        Ok(parse_components(&v, "color")? / 255.0)
    })
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float `{value}`: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
    <scene>
        <mesh role="ship">
            <path>models/fighter.obj</path>
            <color>255 128 0</color>
        </mesh>
        <directional-light>
            <direction>0.5 2 1</direction>
            <rotation>30</rotation>
        </directional-light>
        <point-light>
            <position>2 1 -1</position>
        </point-light>
        <ship>
            <scale>0.02</scale>
        </ship>
    </scene>
    "#;

    #[test]
    fn parses_overrides_and_keeps_defaults() {
        let scene = SceneDescription::from_xml(SAMPLE, Path::new("/assets")).unwrap();
        let ship = scene.meshes.iter().find(|m| m.role == MeshRole::Ship).unwrap();
        assert_eq!(ship.path, Some(PathBuf::from("/assets/models/fighter.obj")));
        assert_eq!(ship.color, Vec3::new(1.0, 128.0 / 255.0, 0.0));
        let terrain = scene.meshes.iter().find(|m| m.role == MeshRole::Terrain).unwrap();
        assert_eq!(terrain.path, None);

        assert_eq!(scene.directional.direction, Vec3::new(0.5, 2.0, 1.0));
        assert_eq!(scene.directional.rotation_deg, 30.0);
        assert_eq!(scene.directional.color, Vec3::ONE);
        assert_eq!(scene.point.position, Vec3::new(2.0, 1.0, -1.0));
        assert_eq!(scene.point.color, PointLight::default().color);
        assert_eq!(scene.ship.scale, 0.02);
        assert_eq!(scene.ship.position, ShipTransform::default().position);
    }

    #[test]
    fn rejects_unknown_roles_and_bad_numbers() {
        let unknown = r#"<scene><mesh role="tree"/></scene>"#;
        assert!(SceneDescription::from_xml(unknown, Path::new(".")).is_err());
        let short = "<scene><ship><position>1 2</position></ship></scene>";
        assert!(SceneDescription::from_xml(short, Path::new(".")).is_err());
        let wrong_root = "<world/>";
        assert!(SceneDescription::from_xml(wrong_root, Path::new(".")).is_err());
    }

    #[test]
    fn rejects_degenerate_light_and_ship_values() {
        let zero_dir = "<scene><directional-light><direction>0 0 0</direction></directional-light></scene>";
        let err = SceneDescription::from_xml(zero_dir, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("non-zero"), "{err}");
        let nan_dir = "<scene><directional-light><direction>NaN 1 1</direction></directional-light></scene>";
        assert!(SceneDescription::from_xml(nan_dir, Path::new(".")).is_err());

        for scale in ["0", "-0.5", "inf"] {
            let xml = format!("<scene><ship><scale>{scale}</scale></ship></scene>");
            let err = SceneDescription::from_xml(&xml, Path::new(".")).unwrap_err();
            assert!(err.to_string().contains("ship scale must be positive"), "{err}");
        }

        let lateral_only = "<scene><directional-light><direction>1 0 0</direction></directional-light></scene>";
        let scene = SceneDescription::from_xml(lateral_only, Path::new(".")).unwrap();
        assert_eq!(scene.directional.direction, Vec3::X);
    }

    #[test]
    fn broken_mesh_files_fall_back_to_builtins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "v 0 0 0\nf 1 2 3").unwrap();
        let mut scene = SceneDescription::default();
        scene.meshes[0].path = Some(file.path().to_path_buf());
        scene.meshes[1].path = Some(PathBuf::from("/definitely/missing.obj"));

        let meshes = scene.load_meshes();
        assert_eq!(meshes.len(), 4);
        assert!(meshes.iter().all(|m| !m.from_file));
        assert_eq!(meshes[0].data, MeshRole::Terrain.builtin());
        assert_eq!(meshes[1].data, MeshRole::Ship.builtin());
    }

    #[test]
    fn loads_mesh_files_relative_to_scene() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tri.obj"), "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let scene_path = dir.path().join("scene.xml");
        fs::write(
            &scene_path,
            r#"<scene><mesh role="terrain"><path>tri.obj</path></mesh></scene>"#,
        )
        .unwrap();

        let scene = SceneDescription::load(&scene_path).unwrap();
        let meshes = scene.load_meshes();
        let terrain = meshes.iter().find(|m| m.role == MeshRole::Terrain).unwrap();
        assert!(terrain.from_file);
        assert_eq!(terrain.data.triangle_count(), 1);
    }
}
