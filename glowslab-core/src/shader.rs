//! GLSL ES 3.00 sources for the flat-color pipeline
//!
//! Uniform names match [`UniformSlot::name`](crate::backend::UniformSlot::name).

pub const VERTEX_SHADER: &str = r#"#version 300 es
in vec3 position;
in vec4 color;

uniform mat4 mwMatrix;
uniform mat4 mpvMatrix;

out vec4 vColor;

void main(void) {
    gl_Position = mpvMatrix * mwMatrix * vec4(position, 1.0);
    vColor = color;
}
"#;

pub const FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;

in vec4 vColor;

out vec4 outColor;

void main(void) {
    outColor = vColor;
}
"#;

/// Attribute names in vertex layout order
pub const POSITION_ATTRIBUTE: &str = "position";
pub const COLOR_ATTRIBUTE: &str = "color";
