//! GLSL shader sources and compilation helpers.
//!
//! Sources are written without a `#version` line; [`compile_program`]
//! prepends one matching the context (GLSL ES 3.00 on WebGL2 / GLES, GLSL
//! 3.30 core on desktop) so the same bodies run in both places.

use glow::HasContext;

/// Vertex shader for paint triangles.
///
/// Positions arrive in accumulator pixels and are mapped to clip space by
/// `u_matrix`, then squashed along one axis depending on the display's
/// aspect ratio.
///
/// # Uniforms
///
/// | Name        | Type   | Description                                  |
/// |-------------|--------|----------------------------------------------|
/// | `u_matrix`  | `mat3` | Pixel → clip transform for the accumulator   |
/// | `u_display` | `vec2` | Display size in physical pixels              |
pub const PAINT_VERTEX_SRC: &str = r"
in vec2 a_position;
in vec4 a_color;

uniform mat3 u_matrix;
uniform vec2 u_display;

out vec4 v_color;

void main() {
    vec2 clip = (u_matrix * vec3(a_position, 1.0)).xy;

    if (u_display.x > 0.0 && u_display.y > 0.0) {
        float aspect = u_display.y / u_display.x;
        if (aspect < 1.0) {
            clip.x *= aspect;
        } else {
            clip.y /= aspect;
        }
    }

    gl_Position = vec4(clip, 0.0, 1.0);
    v_color = a_color;
}
";

/// Fragment shader for paint triangles: outputs the straight-alpha vertex
/// color; blending does the rest.
pub const PAINT_FRAGMENT_SRC: &str = r"
in vec4 v_color;

out vec4 frag_color;

void main() {
    frag_color = v_color;
}
";

/// Vertex shader for the composite quad. Positions are already in clip
/// space.
pub const BLIT_VERTEX_SRC: &str = r"
in vec2 a_position;
in vec2 a_texcoord;

out vec2 v_texcoord;

void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
    v_texcoord = a_texcoord;
}
";

/// Fragment shader for the composite quad.
///
/// # Uniforms
///
/// | Name        | Type        | Description                  |
/// |-------------|-------------|------------------------------|
/// | `u_texture` | `sampler2D` | Accumulator, texture unit 0  |
pub const BLIT_FRAGMENT_SRC: &str = r"
in vec2 v_texcoord;

uniform sampler2D u_texture;

out vec4 frag_color;

void main() {
    frag_color = texture(u_texture, v_texcoord);
}
";

/// `#version` header for the current context.
fn version_header(gl: &glow::Context) -> &'static str {
    if gl.version().is_embedded {
        "#version 300 es\nprecision highp float;\n"
    } else {
        "#version 330 core\n"
    }
}

/// Compile a shader program from vertex and fragment source strings.
///
/// `attributes` are bound to consecutive locations starting at 0 before
/// linking, so vertex array setup can use fixed indices.
///
/// The compiled shader objects are detached and deleted after successful
/// linking, so only the program handle needs to be cleaned up by the caller.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
///
/// # Errors
///
/// Returns a descriptive error string if shader compilation or program
/// linking fails.
pub unsafe fn compile_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
    attributes: &[&str],
) -> Result<glow::Program, String> {
    let header = version_header(gl);
    let program = unsafe { gl.create_program() }?;

    let vs = unsafe { compile_shader(gl, glow::VERTEX_SHADER, &format!("{header}{vertex_src}")) }
        .inspect_err(|_| unsafe { gl.delete_program(program) })?;
    let fs =
        unsafe { compile_shader(gl, glow::FRAGMENT_SHADER, &format!("{header}{fragment_src}")) }
            .inspect_err(|_| unsafe {
                gl.delete_shader(vs);
                gl.delete_program(program);
            })?;

    unsafe {
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        for (index, name) in (0u32..).zip(attributes) {
            gl.bind_attrib_location(program, index, name);
        }
        gl.link_program(program);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(format!("Program link error: {log}"));
        }

        gl.detach_shader(program, vs);
        gl.detach_shader(program, fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
    }

    Ok(program)
}

/// Compile a single shader stage (vertex or fragment) from source.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
unsafe fn compile_shader(
    gl: &glow::Context,
    shader_type: u32,
    source: &str,
) -> Result<glow::Shader, String> {
    unsafe {
        let shader = gl.create_shader(shader_type)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(format!("Shader compile error: {log}"));
        }

        Ok(shader)
    }
}
