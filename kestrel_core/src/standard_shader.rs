use crate::error::Result;
use crate::shader::{Shader, ShaderStage, ShaderStageKind};

const STANDARD_VERT_SHADER: &'static str = r"
#version 330 core
layout (location = 0) in vec3 pos_in;
layout (location = 1) in vec3 normal_in;
layout (location = 2) in vec2 uv_in;

uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;

out vec3 frag_pos;
out vec3 normal;
out vec2 uv;

void main() {
    gl_Position = projection * view * model * vec4(pos_in, 1.0);

    frag_pos = vec3(model * vec4(pos_in, 1.0));
    normal = transpose(inverse(mat3(model))) * normal_in;
    uv = uv_in;
}
";

const STANDARD_FRAG_SHADER: &'static str = r"
#version 330 core

in vec3 frag_pos;
in vec3 normal;
in vec2 uv;

out vec4 color;

struct Material {
    sampler2D texture_diffuse1;
    sampler2D texture_specular1;
    float shininess;
};

struct DirLight {
    vec3 direction;
    vec3 ambient;
    vec3 diffuse;
    vec3 specular;
};

uniform Material material;
uniform DirLight dir_light;
uniform vec3 view_pos;

void main() {
    vec3 n = normalize(normal);
    vec3 view_dir = normalize(view_pos - frag_pos);

    vec3 diffuse_sample = vec3(texture(material.texture_diffuse1, uv));
    vec3 specular_sample = vec3(texture(material.texture_specular1, uv));

    vec3 light_dir = normalize(-dir_light.direction);
    float diff = max(dot(n, light_dir), 0.0);
    vec3 reflect_dir = reflect(-light_dir, n);
    float spec = pow(max(dot(view_dir, reflect_dir), 0.0), material.shininess);

    vec3 ambient = dir_light.ambient * diffuse_sample;
    vec3 diffuse = dir_light.diffuse * diff * diffuse_sample;
    vec3 specular = dir_light.specular * spec * specular_sample;

    color = vec4(ambient + diffuse + specular, 1.0);
}
";

pub fn get_standard_shader() -> Result<Shader> {
    Shader::new()
        .with_stage(ShaderStage::new(STANDARD_VERT_SHADER, ShaderStageKind::Vertex)?)
        .with_stage(ShaderStage::new(STANDARD_FRAG_SHADER, ShaderStageKind::Fragment)?)
        .build()
}
