//! OpenGL backend: owns the float accumulator texture, its framebuffer, and
//! the two shader programs, and issues the paint and composite draws.

use std::sync::Arc;

use glow::{HasContext, PixelUnpackData};

use crate::{
    backend::PaintBackend,
    batch::TriangleBatch,
    config::RenderSettings,
    error::{Error, Result},
    projection::{self, DisplaySize},
    shaders,
    types::{PaintVertex, QuadVertex, Rgba, FULLSCREEN_QUAD},
};

/// GL internal format for RGBA32F textures, pre-cast to the `i32` that
/// `tex_image_2d` expects.
#[expect(clippy::cast_possible_wrap)]
const RGBA32F_INTERNAL_FORMAT: i32 = glow::RGBA32F as i32;

/// Extension required on GLES / WebGL2 to render into float textures.
const COLOR_BUFFER_FLOAT: &str = "EXT_color_buffer_float";
/// Extensions that only affect quality when missing.
const OPTIONAL_EXTENSIONS: [&str; 2] = ["OES_texture_float_linear", "EXT_float_blend"];

/// Convert a `u32` to `i32` for GL API calls.
fn gl_size(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::gl(format!("dimension {value} exceeds i32::MAX")))
}

/// Byte stride of a vertex type, as GL wants it.
fn stride<T>() -> i32 {
    // Vertex types are a few dozen bytes.
    #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let size = std::mem::size_of::<T>() as i32;
    size
}

/// Whether the context advertises `name`, with or without the `GL_` prefix
/// native drivers add.
fn has_extension(gl: &glow::Context, name: &str) -> bool {
    let extensions = gl.supported_extensions();
    extensions.contains(name) || extensions.contains(&format!("GL_{name}"))
}

/// Cached uniform locations for the paint program.
struct PaintUniforms {
    /// `u_matrix`: accumulator pixel → clip transform.
    matrix: glow::UniformLocation,
    /// `u_display`: display size for aspect correction.
    display: glow::UniformLocation,
}

/// Cached uniform locations for the composite program.
struct BlitUniforms {
    /// `u_texture`: texture unit index (always 0).
    texture: glow::UniformLocation,
}

/// GL objects made so far during [`GlowBackend::new`], deleted again if
/// setup fails partway.
#[derive(Default)]
struct Created {
    programs: Vec<glow::Program>,
    vertex_arrays: Vec<glow::VertexArray>,
    buffers: Vec<glow::Buffer>,
    textures: Vec<glow::Texture>,
    framebuffers: Vec<glow::Framebuffer>,
}

impl Created {
    /// # Safety
    ///
    /// Requires the context the objects were created with to be current.
    unsafe fn delete(self, gl: &glow::Context) {
        unsafe {
            for fbo in self.framebuffers {
                gl.delete_framebuffer(fbo);
            }
            for texture in self.textures {
                gl.delete_texture(texture);
            }
            for buffer in self.buffers {
                gl.delete_buffer(buffer);
            }
            for vao in self.vertex_arrays {
                gl.delete_vertex_array(vao);
            }
            for program in self.programs {
                gl.delete_program(program);
            }
        }
    }
}

/// Binds a target, program and vertex array for one draw, and restores the
/// default bindings when dropped.
struct DrawScope<'a> {
    gl: &'a glow::Context,
}

impl<'a> DrawScope<'a> {
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context for the scope's lifetime.
    unsafe fn begin(
        gl: &'a glow::Context,
        framebuffer: Option<glow::Framebuffer>,
        [width, height]: [i32; 2],
        program: glow::Program,
        vao: glow::VertexArray,
    ) -> Self {
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer);
            gl.viewport(0, 0, width, height);
            gl.use_program(Some(program));
            gl.bind_vertex_array(Some(vao));

            gl.disable(glow::DEPTH_TEST);
            gl.enable(glow::BLEND);
            gl.blend_func_separate(
                glow::SRC_ALPHA,
                glow::ONE_MINUS_SRC_ALPHA,
                glow::ONE,
                glow::ONE_MINUS_SRC_ALPHA,
            );
        }
        Self { gl }
    }
}

impl Drop for DrawScope<'_> {
    fn drop(&mut self) {
        // A scope only exists between `begin` and here, under the context
        // `begin` required to be current.
        unsafe {
            self.gl.bind_vertex_array(None);
            self.gl.use_program(None);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }
}

/// An OpenGL (or WebGL2) paint accumulator and compositor.
///
/// The accumulator is an RGBA32F texture attached to its own framebuffer,
/// created once at the configured resolution and cleared once. Paint draws
/// blend into it; composites stretch it over the default framebuffer.
///
/// Programs, vertex arrays and buffers are created once and reused; paint
/// vertices are streamed each draw.
///
/// # Example
///
/// ```no_run
/// # use paint_trails::{GlowBackend, RenderSettings};
/// # use std::sync::Arc;
/// # fn example(gl: Arc<glow::Context>) -> paint_trails::Result<()> {
/// // With a current GL context:
/// let backend = unsafe { GlowBackend::new(gl, &RenderSettings::default()) }?;
/// // ... hand it to a `Sketch`, then when done:
/// unsafe { backend.destroy() };
/// # Ok(())
/// # }
/// ```
pub struct GlowBackend {
    /// The OpenGL context, shared via [`Arc`] with the host.
    gl: Arc<glow::Context>,

    /// Program filling paint triangles with per-vertex color.
    paint_program: glow::Program,
    /// Cached uniform locations for [`paint_program`](Self::paint_program).
    paint_uniforms: PaintUniforms,
    /// Vertex array with `a_position` (vec2) and `a_color` (vec4).
    paint_vao: glow::VertexArray,
    /// Streaming vertex buffer for paint triangles.
    paint_vbo: glow::Buffer,

    /// Program copying the accumulator to the screen.
    blit_program: glow::Program,
    /// Cached uniform locations for [`blit_program`](Self::blit_program).
    blit_uniforms: BlitUniforms,
    /// Vertex array with `a_position` and `a_texcoord` (both vec2).
    quad_vao: glow::VertexArray,
    /// Static buffer holding [`FULLSCREEN_QUAD`].
    quad_vbo: glow::Buffer,

    /// Framebuffer whose color attachment is the accumulator.
    accum_fbo: glow::Framebuffer,
    /// The accumulator texture.
    accum_texture: glow::Texture,
    /// Accumulator size in texels.
    accum_size: [u32; 2],
    /// Clear color for the initial accumulator clear and every composite.
    clear_color: Rgba,
}

impl GlowBackend {
    /// Create the backend and clear the accumulator.
    ///
    /// # Safety
    ///
    /// The `gl` context must be current and valid, and must stay current
    /// whenever the backend is used. The caller must ensure that
    /// [`destroy`](Self::destroy) is called before the context is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCapability`] if the context predates GLSL
    /// 3.30 / ES 3.00 or cannot render to a float texture, [`Error::Shader`] if a program fails to build, and
    /// [`Error::Gl`] if object creation fails. Objects created before a
    /// failure are deleted.
    pub unsafe fn new(gl: Arc<glow::Context>, settings: &RenderSettings) -> Result<Self> {
        check_capabilities(&gl)?;

        let mut created = Created::default();
        match unsafe { Self::create(&gl, settings, &mut created) } {
            Ok(backend) => {
                tracing::info!(
                    width = settings.width,
                    height = settings.height,
                    "GL accumulator ready"
                );
                Ok(backend)
            }
            Err(err) => {
                unsafe { created.delete(&gl) };
                Err(err)
            }
        }
    }

    /// Build every GL object, recording each in `created` as soon as it
    /// exists.
    #[allow(clippy::too_many_lines)] // GL initialization is inherently verbose
    unsafe fn create(
        gl: &Arc<glow::Context>,
        settings: &RenderSettings,
        created: &mut Created,
    ) -> Result<Self> {
        let paint_program = unsafe {
            shaders::compile_program(
                gl,
                shaders::PAINT_VERTEX_SRC,
                shaders::PAINT_FRAGMENT_SRC,
                &["a_position", "a_color"],
            )
        }
        .map_err(Error::shader)?;
        created.programs.push(paint_program);
        let blit_program = unsafe {
            shaders::compile_program(
                gl,
                shaders::BLIT_VERTEX_SRC,
                shaders::BLIT_FRAGMENT_SRC,
                &["a_position", "a_texcoord"],
            )
        }
        .map_err(Error::shader)?;
        created.programs.push(blit_program);

        let uniform = |program: glow::Program, name: &str| {
            let location = unsafe { gl.get_uniform_location(program, name) };
            location.ok_or_else(|| Error::shader(format!("{name} missing from shader")))
        };
        let paint_uniforms = PaintUniforms {
            matrix: uniform(paint_program, "u_matrix")?,
            display: uniform(paint_program, "u_display")?,
        };
        let blit_uniforms = BlitUniforms {
            texture: uniform(blit_program, "u_texture")?,
        };

        let (paint_vao, paint_vbo, quad_vao, quad_vbo) = unsafe {
            let paint_vao = gl.create_vertex_array().map_err(Error::gl)?;
            created.vertex_arrays.push(paint_vao);
            let quad_vao = gl.create_vertex_array().map_err(Error::gl)?;
            created.vertex_arrays.push(quad_vao);
            let paint_vbo = gl.create_buffer().map_err(Error::gl)?;
            created.buffers.push(paint_vbo);
            let quad_vbo = gl.create_buffer().map_err(Error::gl)?;
            created.buffers.push(quad_vbo);

            // Paint: vec2 position + vec4 color, interleaved.
            gl.bind_vertex_array(Some(paint_vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(paint_vbo));
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, stride::<PaintVertex>(), 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 4, glow::FLOAT, false, stride::<PaintVertex>(), 8);

            // Composite: vec2 position + vec2 texcoord, uploaded once.
            gl.bind_vertex_array(Some(quad_vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(quad_vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&FULLSCREEN_QUAD),
                glow::STATIC_DRAW,
            );
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, stride::<QuadVertex>(), 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, stride::<QuadVertex>(), 8);

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            (paint_vao, paint_vbo, quad_vao, quad_vbo)
        };

        let w = gl_size(settings.width)?;
        let h = gl_size(settings.height)?;
        let (accum_fbo, accum_texture) = unsafe {
            let texture = gl.create_texture().map_err(Error::gl)?;
            created.textures.push(texture);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                RGBA32F_INTERNAL_FORMAT,
                w,
                h,
                0,
                glow::RGBA,
                glow::FLOAT,
                PixelUnpackData::Slice(None),
            );
            Self::set_default_tex_params(gl);
            gl.bind_texture(glow::TEXTURE_2D, None);

            let fbo = gl.create_framebuffer().map_err(Error::gl)?;
            created.framebuffers.push(fbo);
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                return Err(Error::missing_capability(format!(
                    "float accumulator framebuffer incomplete (status {status:#x})"
                )));
            }

            let [r, g, b, a] = settings.clear_color;
            gl.viewport(0, 0, w, h);
            gl.clear_color(r, g, b, a);
            gl.clear(glow::COLOR_BUFFER_BIT);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);

            (fbo, texture)
        };

        Ok(Self {
            gl: Arc::clone(gl),
            paint_program,
            paint_uniforms,
            paint_vao,
            paint_vbo,
            blit_program,
            blit_uniforms,
            quad_vao,
            quad_vbo,
            accum_fbo,
            accum_texture,
            accum_size: [settings.width, settings.height],
            clear_color: settings.clear_color,
        })
    }

    /// Set linear filtering and edge clamping on the bound 2D texture.
    unsafe fn set_default_tex_params(gl: &glow::Context) {
        // GL constant values are small enough that the cast is always safe.
        #[expect(clippy::cast_possible_wrap)]
        unsafe {
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
        }
    }

    /// The accumulator texture, for hosts that want to sample it themselves.
    #[must_use]
    pub fn accumulator_texture(&self) -> glow::Texture {
        self.accum_texture
    }

    /// Clean up all GL resources owned by this backend.
    ///
    /// # Safety
    ///
    /// Must be called with the same GL context that was used to create the
    /// backend, and must be called exactly once.
    pub unsafe fn destroy(&self) {
        let gl = &self.gl;
        unsafe {
            gl.delete_program(self.paint_program);
            gl.delete_program(self.blit_program);
            gl.delete_vertex_array(self.paint_vao);
            gl.delete_vertex_array(self.quad_vao);
            gl.delete_buffer(self.paint_vbo);
            gl.delete_buffer(self.quad_vbo);
            gl.delete_framebuffer(self.accum_fbo);
            gl.delete_texture(self.accum_texture);
        }
    }
}

impl PaintBackend for GlowBackend {
    fn accumulate(&mut self, batch: &TriangleBatch, display: DisplaySize) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let vertices: Vec<PaintVertex> = batch.vertices().collect();
        let count = i32::try_from(vertices.len())
            .map_err(|_| Error::gl("vertex count exceeds i32::MAX"))?;
        let size = [gl_size(self.accum_size[0])?, gl_size(self.accum_size[1])?];
        let matrix = projection::pixel_matrix(self.accum_size);
        #[expect(clippy::cast_precision_loss)]
        let [dw, dh] = display.pixel_size().map(|v| v as f32);

        let gl = &self.gl;
        // `new` required the context to stay current while the backend lives.
        unsafe {
            let _scope = DrawScope::begin(
                gl,
                Some(self.accum_fbo),
                size,
                self.paint_program,
                self.paint_vao,
            );
            gl.uniform_matrix_3_f32_slice(Some(&self.paint_uniforms.matrix), false, &matrix);
            gl.uniform_2_f32(Some(&self.paint_uniforms.display), dw, dh);

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.paint_vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&vertices),
                glow::STREAM_DRAW,
            );
            gl.draw_arrays(glow::TRIANGLES, 0, count);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }

        Ok(())
    }

    fn composite(&mut self, display: DisplaySize) -> Result<()> {
        let [width, height] = display.pixel_size();
        let size = [gl_size(width)?, gl_size(height)?];
        let [r, g, b, a] = self.clear_color;

        let gl = &self.gl;
        // `new` required the context to stay current while the backend lives.
        unsafe {
            let _scope = DrawScope::begin(gl, None, size, self.blit_program, self.quad_vao);
            gl.clear_color(r, g, b, a);
            gl.clear(glow::COLOR_BUFFER_BIT);

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.accum_texture));
            gl.uniform_1_i32(Some(&self.blit_uniforms.texture), 0);

            #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let count = FULLSCREEN_QUAD.len() as i32;
            gl.draw_arrays(glow::TRIANGLES, 0, count);
        }

        Ok(())
    }
}

/// Whether a context of this version can run the shaders: GLSL 3.30 on
/// desktop, GLSL ES 3.00 on GLES / WebGL2.
fn version_supported(major: u32, minor: u32, is_embedded: bool) -> bool {
    let required = if is_embedded { (3, 0) } else { (3, 3) };
    (major, minor) >= required
}

/// Fail unless the context can compile the shaders and render into, and
/// blend on, a float texture.
fn check_capabilities(gl: &glow::Context) -> Result<()> {
    let version = gl.version();
    if !version_supported(version.major, version.minor, version.is_embedded) {
        let required = if version.is_embedded { "ES 3.0" } else { "3.3" };
        return Err(Error::missing_capability(format!(
            "OpenGL {}{}.{} is too old; {required} or newer is required",
            if version.is_embedded { "ES " } else { "" },
            version.major,
            version.minor
        )));
    }
    if version.is_embedded && !has_extension(gl, COLOR_BUFFER_FLOAT) {
        return Err(Error::missing_capability(format!(
            "{COLOR_BUFFER_FLOAT} is not supported"
        )));
    }
    if version.is_embedded {
        for name in OPTIONAL_EXTENSIONS {
            if !has_extension(gl, name) {
                tracing::warn!(extension = name, "optional float extension unavailable");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn desktop_contexts_need_glsl_330() {
        assert!(!version_supported(3, 0, false));
        assert!(!version_supported(3, 2, false));
        assert!(version_supported(3, 3, false));
        assert!(version_supported(4, 1, false));
        assert!(!version_supported(2, 1, false));
    }

    #[test]
    fn embedded_contexts_need_es_3() {
        assert!(!version_supported(2, 0, true));
        assert!(version_supported(3, 0, true));
        assert!(version_supported(3, 2, true));
    }

    #[test]
    fn gl_size_rejects_oversized_dimensions() {
        assert_eq!(gl_size(1000).unwrap(), 1000);
        assert!(matches!(gl_size(u32::MAX), Err(Error::Gl(_))));
    }

    #[test]
    fn strides_match_vertex_layouts() {
        assert_eq!(stride::<PaintVertex>(), 24);
        assert_eq!(stride::<QuadVertex>(), 16);
    }
}
