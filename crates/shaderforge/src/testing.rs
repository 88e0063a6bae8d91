//! Shader sources shared by the unit tests.

pub(crate) const FLAT_COLOR_SHADER: &str = r"// Flat color
#type vertex
#version 450 core
layout(location = 0) in vec3 a_Position;

void main()
{
    gl_Position = vec4(a_Position, 1.0);
}

#type fragment
#version 450 core
layout(location = 0) out vec4 o_Color;

void main()
{
    o_Color = vec4(0.8, 0.2, 0.3, 1.0);
}
";

pub(crate) const CAMERA_SHADER: &str = r"#type vertex
#version 450 core
layout(location = 0) in vec3 a_Position;
layout(location = 1) in vec2 a_TexCoord;

layout(std140, binding = 0) uniform Camera
{
    mat4 u_ViewProjection;
} u_Camera;

layout(location = 0) out vec2 v_TexCoord;

void main()
{
    v_TexCoord = a_TexCoord;
    gl_Position = u_Camera.u_ViewProjection * vec4(a_Position, 1.0);
}

#type pixel
#version 450 core
layout(location = 0) in vec2 v_TexCoord;
layout(location = 0) out vec4 o_Color;

layout(std140, binding = 1) uniform Material
{
    vec4 u_Color;
    vec4 u_Tiling;
} u_Material;

void main()
{
    o_Color = u_Material.u_Color * vec4(v_TexCoord * u_Material.u_Tiling.xy, 1.0, 1.0);
}
";

pub(crate) const SAMPLED_SHADER: &str = r"#type vertex
#version 450 core
layout(location = 0) in vec2 a_Position;
layout(location = 0) out vec2 v_TexCoord;

void main()
{
    v_TexCoord = a_Position * 0.5 + 0.5;
    gl_Position = vec4(a_Position, 0.0, 1.0);
}

#type fragment
#version 450 core
layout(location = 0) in vec2 v_TexCoord;
layout(location = 0) out vec4 o_Color;

layout(set = 0, binding = 2) uniform texture2D u_Texture;
layout(set = 0, binding = 3) uniform sampler u_Sampler;

void main()
{
    o_Color = texture(sampler2D(u_Texture, u_Sampler), v_TexCoord);
}
";
