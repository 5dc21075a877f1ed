use std::ffi::{CStr, c_void};

use anyhow::{Context as _, anyhow};
use glow::HasContext as _;

use crate::api::*;

/// native api that is backed by `glow`.
pub struct GlowApi {
    gl: glow::Context,
}

impl GlowApi {
    /// fails when the loader can not resolve `glGetString` (glow needs it to read the version)
    /// or when the current context is older than 3.3.
    pub unsafe fn load_with<F>(mut get_proc_address: F) -> anyhow::Result<Self>
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        if get_proc_address(c"glGetString").is_null() {
            return Err(anyhow!("could not load glGetString"));
        }
        let gl = unsafe { glow::Context::from_loader_function_cstr(&mut get_proc_address) };

        let version = gl.version();
        log::debug!("loaded gl {}.{}", version.major, version.minor);
        if version.is_embedded || (version.major, version.minor) < (3, 3) {
            return Err(anyhow!(
                "opengl 3.3 is required, context is {}.{}{}",
                version.major,
                version.minor,
                if version.is_embedded { " es" } else { "" }
            ));
        }

        Ok(Self { gl })
    }
}

impl Apier for GlowApi {
    type Buffer = glow::NativeBuffer;
    type Program = glow::NativeProgram;
    type Shader = glow::NativeShader;
    type VertexArray = glow::NativeVertexArray;
    type UniformLocation = glow::NativeUniformLocation;

    #[inline]
    unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) };
    }

    #[inline]
    unsafe fn bind_buffer(&self, target: GLenum, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(target, buffer) };
    }

    #[inline]
    unsafe fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array) };
    }

    #[inline]
    unsafe fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        unsafe { self.gl.buffer_data_u8_slice(target, data, usage) };
    }

    #[inline]
    unsafe fn clear(&self, mask: GLbitfield) {
        unsafe { self.gl.clear(mask) };
    }

    #[inline]
    unsafe fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat) {
        unsafe { self.gl.clear_color(red, green, blue, alpha) };
    }

    #[inline]
    unsafe fn compile_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.compile_shader(shader) };
    }

    #[inline]
    unsafe fn create_buffer(&self) -> anyhow::Result<Self::Buffer> {
        unsafe { self.gl.create_buffer() }
            .map_err(|err| anyhow!(err))
            .context("could not create buffer")
    }

    #[inline]
    unsafe fn create_program(&self) -> anyhow::Result<Self::Program> {
        unsafe { self.gl.create_program() }
            .map_err(|err| anyhow!(err))
            .context("could not create program")
    }

    #[inline]
    unsafe fn create_shader(&self, r#type: GLenum) -> anyhow::Result<Self::Shader> {
        unsafe { self.gl.create_shader(r#type) }
            .map_err(|err| anyhow!(err))
            .context("could not create shader")
    }

    #[inline]
    unsafe fn create_vertex_array(&self) -> anyhow::Result<Self::VertexArray> {
        unsafe { self.gl.create_vertex_array() }
            .map_err(|err| anyhow!(err))
            .context("could not create vertex array")
    }

    #[inline]
    unsafe fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) };
    }

    #[inline]
    unsafe fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) };
    }

    #[inline]
    unsafe fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) };
    }

    #[inline]
    unsafe fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) };
    }

    #[inline]
    unsafe fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) };
    }

    #[inline]
    unsafe fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        unsafe { self.gl.draw_arrays(mode, first, count) };
    }

    #[inline]
    unsafe fn enable_vertex_attrib_array(&self, index: GLuint) {
        unsafe { self.gl.enable_vertex_attrib_array(index) };
    }

    #[inline]
    unsafe fn get_error(&self) -> Option<GLenum> {
        let ret = unsafe { self.gl.get_error() };
        (ret != NO_ERROR).then_some(ret)
    }

    #[inline]
    unsafe fn get_program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    #[inline]
    unsafe fn get_program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    #[inline]
    unsafe fn get_program_validate_status(&self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_validate_status(program) }
    }

    #[inline]
    unsafe fn get_shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    #[inline]
    unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    #[inline]
    unsafe fn get_string(&self, name: GLenum) -> anyhow::Result<String> {
        let ret = unsafe { self.gl.get_parameter_string(name) };
        if let Some(error) = unsafe { self.get_error() } {
            return Err(anyhow!(
                "could not get string (name 0x{name:x}): {}",
                error_name(error)
            ));
        }
        Ok(ret)
    }

    #[inline]
    unsafe fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    #[inline]
    unsafe fn link_program(&self, program: Self::Program) {
        unsafe { self.gl.link_program(program) };
    }

    #[inline]
    unsafe fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { self.gl.shader_source(shader, source) };
    }

    #[inline]
    unsafe fn uniform_4f(
        &self,
        location: &Self::UniformLocation,
        v0: GLfloat,
        v1: GLfloat,
        v2: GLfloat,
        v3: GLfloat,
    ) {
        unsafe { self.gl.uniform_4_f32(Some(location), v0, v1, v2, v3) };
    }

    #[inline]
    unsafe fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) };
    }

    #[inline]
    unsafe fn validate_program(&self, program: Self::Program) {
        unsafe { self.gl.validate_program(program) };
    }

    #[inline]
    unsafe fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        r#type: GLenum,
        normalized: GLboolean,
        stride: GLsizei,
        offset: GLint,
    ) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                index,
                size,
                r#type,
                normalized != FALSE,
                stride,
                offset,
            )
        };
    }

    #[inline]
    unsafe fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }
}
