//! WGSL sources. Scene shaders share the `Scene` uniform block, post shaders share `Post`.

pub const SCENE_BINDINGS: &str = r#"
struct Scene {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    model: mat4x4<f32>,
    // x: sprite diameter, y: atmosphere, z: brightness, w: mesh opacity
    led_params: vec4<f32>,
    // x: min brightness, y: max depth fade, z: min depth fade, w: centre depth
    fade_params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> scene: Scene;
"#;

pub const MESH_SHADER: &str = r#"
struct MeshOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) normal: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) normal: vec3<f32>) -> MeshOutput {
    var out: MeshOutput;
    let world = scene.model * vec4<f32>(position, 1.0);
    out.clip = scene.projection * scene.view * world;
    out.normal = (scene.model * vec4<f32>(normal, 0.0)).xyz;
    return out;
}

@fragment
fn fs_faces(in: MeshOutput) -> @location(0) vec4<f32> {
    let light = normalize(vec3<f32>(0.3, 0.8, 0.5));
    let shade = 0.35 + 0.65 * abs(dot(normalize(in.normal), light));
    let alpha = scene.led_params.w;
    return vec4<f32>(vec3<f32>(0.16, 0.17, 0.2) * shade * alpha, alpha);
}

@fragment
fn fs_wire(in: MeshOutput) -> @location(0) vec4<f32> {
    let alpha = max(scene.led_params.w, 0.15);
    return vec4<f32>(vec3<f32>(0.45, 0.5, 0.55) * alpha, alpha);
}
"#;

pub const LED_SHADER: &str = r#"
struct LedOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec3<f32>,
};

var<private> CORNERS: array<vec2<f32>, 6> = array<vec2<f32>, 6>(
    vec2<f32>(-1.0, -1.0),
    vec2<f32>(1.0, -1.0),
    vec2<f32>(1.0, 1.0),
    vec2<f32>(-1.0, -1.0),
    vec2<f32>(1.0, 1.0),
    vec2<f32>(-1.0, 1.0),
);

fn depth_fade(view_z: f32) -> f32 {
    let offset = -view_z - scene.fade_params.w;
    return clamp(1.0 - offset / scene.fade_params.y, scene.fade_params.z, 1.0);
}

fn led_vertex(index: u32, position: vec3<f32>, color: vec4<f32>, scale: f32) -> LedOutput {
    var out: LedOutput;
    let corner = CORNERS[index];
    let centre = scene.view * scene.model * vec4<f32>(position, 1.0);
    let radius = scene.led_params.x * scale * 0.5;
    out.clip = scene.projection * (centre + vec4<f32>(corner * radius, 0.0, 0.0));
    out.uv = corner;
    let lit = color.rgb * scene.led_params.z * depth_fade(centre.z);
    out.color = max(lit, vec3<f32>(scene.fade_params.x));
    return out;
}

@vertex
fn vs_led(
    @builtin(vertex_index) index: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
) -> LedOutput {
    return led_vertex(index, position, color, 1.0);
}

@vertex
fn vs_glow(
    @builtin(vertex_index) index: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
) -> LedOutput {
    return led_vertex(index, position, color, 1.0 + 2.0 * scene.led_params.y);
}

@fragment
fn fs_led(in: LedOutput) -> @location(0) vec4<f32> {
    let d = length(in.uv);
    if d > 1.0 {
        discard;
    }
    let core = 1.0 - smoothstep(0.6, 1.0, d);
    return vec4<f32>(in.color * core, core);
}

@fragment
fn fs_glow(in: LedOutput) -> @location(0) vec4<f32> {
    let d = length(in.uv);
    let falloff = exp(-4.0 * d * d) * (1.0 - smoothstep(0.9, 1.0, d));
    let a = falloff * scene.led_params.y * 0.25;
    return vec4<f32>(in.color * a, a);
}
"#;

pub const POST_BINDINGS: &str = r#"
struct Post {
    texel_size: vec2<f32>,
    glow_strength: f32,
    dither: f32,
};

struct QuadOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var<uniform> post: Post;

@vertex
fn vs_quad(@location(0) position: vec2<f32>) -> QuadOutput {
    var out: QuadOutput;
    out.clip = vec4<f32>(position, 0.0, 1.0);
    out.uv = vec2<f32>(position.x * 0.5 + 0.5, 0.5 - position.y * 0.5);
    return out;
}
"#;

pub const BLUR_SHADER: &str = r#"
@group(0) @binding(1) var source: texture_2d<f32>;
@group(0) @binding(2) var source_sampler: sampler;

// 5x5 binomial kernel, taps spread two texels apart.
@fragment
fn fs_blur(in: QuadOutput) -> @location(0) vec4<f32> {
    var weights = array<f32, 5>(1.0, 4.0, 6.0, 4.0, 1.0);
    var sum = vec4<f32>(0.0);
    for (var y = 0; y < 5; y++) {
        for (var x = 0; x < 5; x++) {
            let offset = vec2<f32>(f32(x - 2), f32(y - 2)) * post.texel_size * 2.0;
            sum += textureSample(source, source_sampler, in.uv + offset) * weights[x] * weights[y];
        }
    }
    return sum / 256.0;
}
"#;

pub const COMPOSITE_SHADER: &str = r#"
@group(0) @binding(1) var scene_texture: texture_2d<f32>;
@group(0) @binding(2) var blur_texture: texture_2d<f32>;
@group(0) @binding(3) var post_sampler: sampler;

fn bayer(p: vec2<f32>) -> f32 {
    let x = u32(p.x) % 4u;
    let y = u32(p.y) % 4u;
    return (BAYER[y * 4u + x] + 0.5) / 16.0;
}

@fragment
fn fs_composite(in: QuadOutput) -> @location(0) vec4<f32> {
    let base = textureSample(scene_texture, post_sampler, in.uv).rgb;
    let glow = textureSample(blur_texture, post_sampler, in.uv).rgb;
    var color = base + glow * post.glow_strength;
    // The level is the threshold amplitude in 8-bit steps.
    if post.dither > 0.0 {
        color += vec3<f32>((bayer(in.clip.xy) - 0.5) * post.dither / 255.0);
    }
    return vec4<f32>(color, 1.0);
}
"#;

/// 4x4 ordered-dither thresholds, row-major.
pub const BAYER_4X4: [u8; 16] = [0, 8, 2, 10, 12, 4, 14, 6, 3, 11, 1, 9, 15, 7, 13, 5];

/// Full module source for a scene shader.
pub fn scene_module(body: &str) -> String {
    format!("{SCENE_BINDINGS}{body}")
}

/// Full module source for a post-processing shader.
pub fn post_module(body: &str) -> String {
    format!("{POST_BINDINGS}{body}")
}

pub fn composite_module() -> String {
    let table = BAYER_4X4.map(|v| format!("{v}.0")).join(", ");
    format!(
        "{POST_BINDINGS}\nvar<private> BAYER: array<f32, 16> = array<f32, 16>({table});\n{COMPOSITE_SHADER}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bayer_table_covers_every_threshold_once() {
        let mut seen = [false; 16];
        for v in BAYER_4X4 {
            assert!(!seen[v as usize]);
            seen[v as usize] = true;
        }
        // Horizontal neighbours sit half the range apart.
        assert_eq!(BAYER_4X4[1] - BAYER_4X4[0], 8);
    }

    #[test]
    fn composite_module_declares_table_before_use() {
        let source = composite_module();
        let decl = source
            .find("array<f32, 16>(0.0, 8.0, 2.0, 10.0, 12.0, 4.0, 14.0, 6.0, 3.0, 11.0, 1.0, 9.0, 15.0, 7.0, 13.0, 5.0)")
            .unwrap();
        let usage = source.find("BAYER[y * 4u + x]").unwrap();
        assert!(decl < usage);
        assert!(source.contains("* post.dither / 255.0"));
        assert!(!source.contains("sin("));
    }
}
