/// Lit, emissive instanced cubes. Writes linear HDR color.
pub const CUBE_SHADER: &str = r#"
struct SceneUniforms {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    ambient: vec4<f32>,
    sun_dir: vec4<f32>,
    sun_color: vec4<f32>,
    // rgb: point light radiance, w: range
    point_light: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> scene: SceneUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
    @location(7) emissive: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec3<f32>,
    @location(3) emissive: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    // Uniform scale only, so the model matrix is fine for normals.
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = scene.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize(world_normal);
    out.color = instance.color.rgb;
    out.emissive = instance.emissive.rgb;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);

    let sun = max(dot(n, scene.sun_dir.xyz), 0.0) * scene.sun_color.rgb;

    let to_center = -in.world_pos;
    let dist = length(to_center);
    let falloff = clamp(1.0 - dist / scene.point_light.w, 0.0, 1.0);
    let point = max(dot(n, to_center / max(dist, 1e-4)), 0.0) * falloff * falloff
        * scene.point_light.rgb;

    let lit = in.color * (scene.ambient.rgb + sun + point) + in.emissive;
    return vec4<f32>(lit, 1.0);
}
"#;

/// Starfield points. Depth-tested, never written.
pub const STAR_SHADER: &str = r#"
struct SceneUniforms {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    ambient: vec4<f32>,
    sun_dir: vec4<f32>,
    sun_color: vec4<f32>,
    point_light: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> scene: SceneUniforms;

struct StarVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
};

struct StarOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_star(vertex: StarVertex) -> StarOutput {
    var out: StarOutput;
    out.clip_position = scene.view_proj * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_star(in: StarOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;

/// Shared by every bloom stage: a single oversized triangle covering the screen.
const FULLSCREEN_VS: &str = r#"
struct BloomUniforms {
    threshold: f32,
    intensity: f32,
    radius: f32,
    exposure: f32,
    // xy: texel size of the source, zw: blur direction
    texel: vec4<f32>,
};

struct FullscreenOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) index: u32) -> FullscreenOutput {
    let x = f32((index << 1u) & 2u);
    let y = f32(index & 2u);
    var out: FullscreenOutput;
    out.clip_position = vec4<f32>(x * 2.0 - 1.0, 1.0 - y * 2.0, 0.0, 1.0);
    out.uv = vec2<f32>(x, y);
    return out;
}
"#;

const BRIGHT_FS: &str = r#"
@group(0) @binding(0) var source: texture_2d<f32>;
@group(0) @binding(1) var source_sampler: sampler;
@group(0) @binding(2) var<uniform> bloom: BloomUniforms;

@fragment
fn fs_main(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let color = textureSample(source, source_sampler, in.uv).rgb;
    let luminance = dot(color, vec3<f32>(0.2126, 0.7152, 0.0722));
    let excess = max(luminance - bloom.threshold, 0.0);
    let weight = excess / max(luminance, 1e-4);
    return vec4<f32>(color * weight, 1.0);
}
"#;

const BLUR_FS: &str = r#"
@group(0) @binding(0) var source: texture_2d<f32>;
@group(0) @binding(1) var source_sampler: sampler;
@group(0) @binding(2) var<uniform> bloom: BloomUniforms;

var<private> WEIGHTS: array<f32, 5> = array<f32, 5>(0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);

@fragment
fn fs_main(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let stride = bloom.texel.xy * bloom.texel.zw * bloom.radius * 2.0;
    var sum = textureSampleLevel(source, source_sampler, in.uv, 0.0).rgb * WEIGHTS[0];
    for (var i = 1; i < 5; i = i + 1) {
        let offset = stride * f32(i);
        sum += textureSampleLevel(source, source_sampler, in.uv + offset, 0.0).rgb * WEIGHTS[i];
        sum += textureSampleLevel(source, source_sampler, in.uv - offset, 0.0).rgb * WEIGHTS[i];
    }
    return vec4<f32>(sum, 1.0);
}
"#;

const COMPOSITE_FS: &str = r#"
@group(0) @binding(0) var scene_color: texture_2d<f32>;
@group(0) @binding(1) var source_sampler: sampler;
@group(0) @binding(2) var<uniform> bloom: BloomUniforms;
@group(0) @binding(3) var bloom_color: texture_2d<f32>;

// Narkowicz ACES filmic fit.
fn aces(x: vec3<f32>) -> vec3<f32> {
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;
    return clamp((x * (a * x + b)) / (x * (c * x + d) + e), vec3<f32>(0.0), vec3<f32>(1.0));
}

@fragment
fn fs_main(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let base = textureSample(scene_color, source_sampler, in.uv).rgb;
    let glow = textureSample(bloom_color, source_sampler, in.uv).rgb;
    let hdr = (base + glow * bloom.intensity) * bloom.exposure;
    // Surface is sRGB; the hardware encodes on store.
    return vec4<f32>(aces(hdr), 1.0);
}
"#;

pub fn bright_shader() -> String {
    format!("{FULLSCREEN_VS}\n{BRIGHT_FS}")
}

pub fn blur_shader() -> String {
    format!("{FULLSCREEN_VS}\n{BLUR_FS}")
}

pub fn composite_shader() -> String {
    format!("{FULLSCREEN_VS}\n{COMPOSITE_FS}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bloom_stages_share_fullscreen_vertex() {
        for source in [bright_shader(), blur_shader(), composite_shader()] {
            assert!(source.contains("fn vs_fullscreen"));
            assert!(source.contains("fn fs_main"));
            assert!(source.contains("struct BloomUniforms"));
        }
    }

    #[test]
    fn cube_shader_reads_emissive_instance_attribute() {
        assert!(CUBE_SHADER.contains("@location(7) emissive"));
    }
}
