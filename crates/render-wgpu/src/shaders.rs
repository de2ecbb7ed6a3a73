/// WGSL shader for instanced meshes (spheres and branch tubes): per-vertex
/// ambient, diffuse and Blinn-Phong specular lighting from a single
/// directional light.
pub const MESH_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
    // Direction toward the light, normalized on the CPU.
    to_light: vec4<f32>,
    diffuse: vec4<f32>,
    ambient: vec4<f32>,
    // rgb: light * material, a: specular power.
    specular: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

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
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
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
    // Spheres scale uniformly and tubes only stretch along their axis, so
    // the model matrix keeps normals perpendicular to the surface.
    let normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    let to_light = uniforms.to_light.xyz;
    let to_eye = normalize(uniforms.eye.xyz - world_pos.xyz);

    let diffuse_amount = max(dot(to_light, normal), 0.0);
    let halfway = normalize(to_light + to_eye);
    var specular_amount = 0.0;
    if diffuse_amount > 0.0 {
        specular_amount = pow(max(dot(normal, halfway), 0.0), uniforms.specular.a);
    }

    let lit = uniforms.ambient.rgb
        + uniforms.diffuse.rgb * diffuse_amount;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.color = vec4<f32>(
        instance.color.rgb * lit + uniforms.specular.rgb * specular_amount,
        instance.color.a,
    );
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;
