//! WGSL sources, one module per pipeline role.

/// Shared declarations of the lit, marker and sky modules.
macro_rules! lit_globals {
    () => {
        r#"
struct LitGlobals {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    light_space: mat4x4<f32>,
    sky_inverse_view_proj: mat4x4<f32>,
    directional_dir: vec4<f32>,
    directional_color: vec4<f32>,
    point_position: vec4<f32>,
    point_color: vec4<f32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: LitGlobals;
"#
    };
}

pub const DEPTH: &str = r#"
struct DepthGlobals {
    light_space: mat4x4<f32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: DepthGlobals;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return globals.light_space * object.model * vec4<f32>(position, 1.0);
}
"#;

pub const LIT: &str = concat!(
    lit_globals!(),
    r#"
@group(0) @binding(1)
var shadow_map: texture_depth_2d;

@group(0) @binding(2)
var shadow_sampler: sampler_comparison;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) eye_position: vec3<f32>,
    @location(1) eye_normal: vec3<f32>,
    @location(2) light_position: vec4<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = object.model * vec4<f32>(input.position, 1.0);
    let eye = globals.view * world;
    out.clip = globals.projection * eye;
    out.eye_position = eye.xyz;
    let normal_matrix = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    );
    out.eye_normal = normal_matrix * input.normal;
    out.light_position = globals.light_space * world;
    return out;
}

const AMBIENT: f32 = 0.2;
const SPECULAR: f32 = 0.5;
const SHININESS: f32 = 32.0;

fn shadow_visibility(light_position: vec4<f32>, bias: f32) -> f32 {
    let ndc = light_position.xyz / light_position.w;
    let uv = ndc.xy * vec2<f32>(0.5, -0.5) + vec2<f32>(0.5, 0.5);
    let depth = ndc.z - bias;
    let visibility = textureSampleCompareLevel(shadow_map, shadow_sampler, uv, depth);
    let outside = any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0)) || ndc.z > 1.0;
    return select(visibility, 1.0, outside);
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.eye_normal);
    let to_eye = normalize(-input.eye_position);
    let base = object.color.rgb;

    let light_dir = normalize(globals.directional_dir.xyz);
    let d_color = globals.directional_color.rgb;
    let d_diffuse = max(dot(normal, light_dir), 0.0);
    let d_specular = pow(max(dot(to_eye, reflect(-light_dir, normal)), 0.0), SHININESS);
    let bias = max(0.005 * (1.0 - dot(normal, light_dir)), 0.0005);
    let visibility = shadow_visibility(input.light_position, bias);

    let to_point = globals.point_position.xyz - input.eye_position;
    let dist = length(to_point);
    let point_dir = to_point / max(dist, 1e-4);
    let attenuation = 1.0 / (1.0 + 0.09 * dist + 0.032 * dist * dist);
    let p_color = globals.point_color.rgb * attenuation;
    let p_diffuse = max(dot(normal, point_dir), 0.0);
    let p_specular = pow(max(dot(to_eye, reflect(-point_dir, normal)), 0.0), SHININESS);

    let ambient = AMBIENT * (d_color + p_color) * base;
    let directional = visibility * d_color * (d_diffuse * base + SPECULAR * d_specular);
    let point = p_color * (p_diffuse * base + SPECULAR * p_specular);
    return vec4<f32>(min(ambient + directional + point, vec3<f32>(1.0)), 1.0);
}
"#
);

pub const MARKER: &str = concat!(
    lit_globals!(),
    r#"
@group(1) @binding(0)
var<uniform> object: ObjectConstants;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return globals.projection * globals.view * object.model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(object.color.rgb, 1.0);
}
"#
);

pub const SKY: &str = concat!(
    lit_globals!(),
    r#"
struct SkyOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) ndc: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> SkyOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    let ndc = uv * 2.0 - 1.0;
    var out: SkyOutput;
    out.clip = vec4<f32>(ndc, 1.0, 1.0);
    out.ndc = ndc;
    return out;
}

@fragment
fn fs_main(input: SkyOutput) -> @location(0) vec4<f32> {
    let far = globals.sky_inverse_view_proj * vec4<f32>(input.ndc, 1.0, 1.0);
    let dir = normalize(far.xyz / far.w);
    let horizon = vec3<f32>(0.86, 0.55, 0.38);
    let zenith = vec3<f32>(0.35, 0.16, 0.12);
    let ground = vec3<f32>(0.42, 0.22, 0.14);
    let up = clamp(dir.y, -1.0, 1.0);
    let sky = mix(horizon, zenith, pow(max(up, 0.0), 0.6));
    let color = select(sky, mix(horizon, ground, min(-up * 4.0, 1.0)), up < 0.0);
    return vec4<f32>(color, 1.0);
}
"#
);

pub const DEPTH_DEBUG: &str = r#"
@group(0) @binding(0)
var depth_map: texture_depth_2d;

struct QuadOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> QuadOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: QuadOutput;
    out.clip = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_main(input: QuadOutput) -> @location(0) vec4<f32> {
    let size = vec2<f32>(textureDimensions(depth_map));
    let texel = vec2<i32>(clamp(input.uv * size, vec2<f32>(0.0), size - 1.0));
    let depth = textureLoad(depth_map, texel, 0);
    return vec4<f32>(vec3<f32>(depth), 1.0);
}
"#;
