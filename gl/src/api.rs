use std::fmt;

#[allow(non_camel_case_types)]
pub mod types {
    pub type GLbitfield = u32;
    pub type GLboolean = u8;
    pub type GLenum = u32;
    pub type GLfloat = f32;
    pub type GLint = i32;
    pub type GLsizei = i32;
    pub type GLuint = u32;
}

// NOTE: only the enums that this workspace actually touches. values are taken from the khronos
// registry (gl.xml).
pub mod enums {
    use super::types::*;

    pub const FALSE: GLboolean = 0;
    pub const TRUE: GLboolean = 1;

    pub const NO_ERROR: GLenum = 0;
    pub const INVALID_ENUM: GLenum = 0x0500;
    pub const INVALID_VALUE: GLenum = 0x0501;
    pub const INVALID_OPERATION: GLenum = 0x0502;

    pub const TRIANGLES: GLenum = 0x0004;
    pub const COLOR_BUFFER_BIT: GLbitfield = 0x00004000;

    pub const FLOAT: GLenum = 0x1406;

    pub const VENDOR: GLenum = 0x1F00;
    pub const RENDERER: GLenum = 0x1F01;
    pub const VERSION: GLenum = 0x1F02;
    pub const SHADING_LANGUAGE_VERSION: GLenum = 0x8B8C;

    pub const ARRAY_BUFFER: GLenum = 0x8892;
    pub const STREAM_DRAW: GLenum = 0x88E0;
    pub const STATIC_DRAW: GLenum = 0x88E4;
    pub const DYNAMIC_DRAW: GLenum = 0x88E8;

    pub const FRAGMENT_SHADER: GLenum = 0x8B30;
    pub const VERTEX_SHADER: GLenum = 0x8B31;
    pub const SHADER_TYPE: GLenum = 0x8B4F;
    pub const DELETE_STATUS: GLenum = 0x8B80;
    pub const COMPILE_STATUS: GLenum = 0x8B81;
    pub const LINK_STATUS: GLenum = 0x8B82;
    pub const VALIDATE_STATUS: GLenum = 0x8B83;
    pub const INFO_LOG_LENGTH: GLenum = 0x8B84;
    pub const ATTACHED_SHADERS: GLenum = 0x8B85;
    pub const ACTIVE_UNIFORMS: GLenum = 0x8B86;
}

pub use enums::*;
pub use types::*;

/// the gpu driver boundary. everything that touches gpu state goes through an `Apier` that is
/// passed explicitly; there is no hidden current-context singleton on this side of the boundary.
///
/// all methods are unsafe for the same reason raw gl calls are: they are only valid while the
/// context the api was loaded from is current on the calling thread.
pub trait Apier {
    type Buffer: Copy + fmt::Debug;
    type Program: Copy + fmt::Debug;
    type Shader: Copy + fmt::Debug;
    type VertexArray: Copy + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    unsafe fn bind_buffer(&self, target: GLenum, buffer: Option<Self::Buffer>);
    unsafe fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    unsafe fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum);
    unsafe fn clear(&self, mask: GLbitfield);
    unsafe fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat);
    unsafe fn compile_shader(&self, shader: Self::Shader);
    unsafe fn create_buffer(&self) -> anyhow::Result<Self::Buffer>;
    unsafe fn create_program(&self) -> anyhow::Result<Self::Program>;
    unsafe fn create_shader(&self, r#type: GLenum) -> anyhow::Result<Self::Shader>;
    unsafe fn create_vertex_array(&self) -> anyhow::Result<Self::VertexArray>;
    unsafe fn delete_buffer(&self, buffer: Self::Buffer);
    unsafe fn delete_program(&self, program: Self::Program);
    unsafe fn delete_shader(&self, shader: Self::Shader);
    unsafe fn delete_vertex_array(&self, vertex_array: Self::VertexArray);
    unsafe fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    unsafe fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei);
    unsafe fn enable_vertex_attrib_array(&self, index: GLuint);
    unsafe fn get_error(&self) -> Option<GLenum>;
    unsafe fn get_program_info_log(&self, program: Self::Program) -> String;
    unsafe fn get_program_link_status(&self, program: Self::Program) -> bool;
    unsafe fn get_program_validate_status(&self, program: Self::Program) -> bool;
    unsafe fn get_shader_compile_status(&self, shader: Self::Shader) -> bool;
    unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String;
    unsafe fn get_string(&self, name: GLenum) -> anyhow::Result<String>;
    unsafe fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    unsafe fn link_program(&self, program: Self::Program);
    unsafe fn shader_source(&self, shader: Self::Shader, source: &str);
    unsafe fn uniform_4f(
        &self,
        location: &Self::UniformLocation,
        v0: GLfloat,
        v1: GLfloat,
        v2: GLfloat,
        v3: GLfloat,
    );
    unsafe fn use_program(&self, program: Option<Self::Program>);
    unsafe fn validate_program(&self, program: Self::Program);
    unsafe fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        r#type: GLenum,
        normalized: GLboolean,
        stride: GLsizei,
        offset: GLint,
    );
    unsafe fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
}

pub fn error_name(error: GLenum) -> &'static str {
    match error {
        NO_ERROR => "GL_NO_ERROR",
        INVALID_ENUM => "GL_INVALID_ENUM",
        INVALID_VALUE => "GL_INVALID_VALUE",
        INVALID_OPERATION => "GL_INVALID_OPERATION",
        _ => "unknown gl error",
    }
}
