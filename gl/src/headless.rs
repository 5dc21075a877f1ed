//! software implementation of [`Apier`] that does not need a display nor a gpu.
//!
//! it keeps enough object state to behave like a driver for the shader program lifecycle and for
//! vertex specification, and records every state-changing call so that callers can assert on
//! exactly what would have been submitted.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::mem;
use std::num::NonZero;

use anyhow::anyhow;

use crate::api::*;
use crate::glsl;

pub type Handle = NonZero<GLuint>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttribPointer {
    pub size: GLint,
    pub r#type: GLenum,
    pub normalized: GLboolean,
    pub stride: GLsizei,
    pub offset: GLint,
    pub buffer: Handle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AttachShader { program: Handle, shader: Handle },
    BindBuffer { target: GLenum, buffer: Option<Handle> },
    BindVertexArray(Option<Handle>),
    BufferData { target: GLenum, len: usize, usage: GLenum },
    Clear(GLbitfield),
    ClearColor([GLfloat; 4]),
    CompileShader(Handle),
    DeleteBuffer(Handle),
    DeleteProgram(Handle),
    DeleteShader(Handle),
    DeleteVertexArray(Handle),
    DetachShader { program: Handle, shader: Handle },
    DrawArrays {
        mode: GLenum,
        first: GLint,
        count: GLsizei,
        program: Option<Handle>,
        vertex_array: Option<Handle>,
    },
    EnableVertexAttribArray(GLuint),
    LinkProgram(Handle),
    Uniform4f { program: Handle, location: GLint, value: [GLfloat; 4] },
    UseProgram(Option<Handle>),
    ValidateProgram(Handle),
    VertexAttribPointer { index: GLuint, pointer: AttribPointer },
    Viewport { x: GLint, y: GLint, width: GLsizei, height: GLsizei },
}

#[derive(Debug)]
struct ShaderObject {
    r#type: GLenum,
    source: String,
    unit: Option<glsl::Unit>,
    compiled: bool,
    info_log: String,
    delete_pending: bool,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<Handle>,
    linked: bool,
    validated: bool,
    info_log: String,
    /// active uniforms; location is the index.
    uniforms: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct VertexArrayObject {
    pointers: BTreeMap<GLuint, AttribPointer>,
    enabled: Vec<GLuint>,
}

#[derive(Debug, Default)]
struct State {
    next_name: GLuint,
    error: Option<GLenum>,

    shaders: HashMap<Handle, ShaderObject>,
    programs: HashMap<Handle, ProgramObject>,
    buffers: HashMap<Handle, Vec<u8>>,
    vertex_arrays: HashMap<Handle, VertexArrayObject>,

    array_buffer: Option<Handle>,
    vertex_array: Option<Handle>,
    program: Option<Handle>,

    fail_create_program: bool,

    calls: Vec<Call>,
}

impl State {
    fn gen_name(&mut self) -> Handle {
        self.next_name += 1;
        NonZero::new(self.next_name).expect("name overflow")
    }

    // NOTE: like in gl only the first error is kept until it is queried.
    fn set_error(&mut self, error: GLenum) {
        if self.error.is_none() {
            log::trace!("headless: {}", error_name(error));
            self.error = Some(error);
        }
    }

    fn record(&mut self, call: Call) {
        #[cfg(all(feature = "debug", debug_assertions))]
        log::debug!("headless: {call:?}");
        self.calls.push(call);
    }

    fn link(&self, program: Handle) -> Result<Vec<(String, String)>, String> {
        let attached = &self.programs[&program].attached;

        let mut vertex: Option<&glsl::Unit> = None;
        let mut fragment: Option<&glsl::Unit> = None;
        for shader in attached.iter() {
            let shader = &self.shaders[shader];
            let Some(unit) = shader.unit.as_ref().filter(|_| shader.compiled) else {
                return Err("error: linking with uncompiled/unspecialized shader".to_string());
            };
            let slot = match shader.r#type {
                VERTEX_SHADER => &mut vertex,
                _ => &mut fragment,
            };
            if slot.replace(unit).is_some() {
                return Err(format!(
                    "error: more than one {} shader attached",
                    stage_name(shader.r#type)
                ));
            }
        }

        let mut errors = Vec::new();
        let (Some(vertex), Some(fragment)) = (vertex, fragment) else {
            return Err("error: program needs both a vertex and a fragment shader".to_string());
        };
        for (unit, r#type) in [(vertex, VERTEX_SHADER), (fragment, FRAGMENT_SHADER)] {
            if !unit.has_main {
                errors.push(format!("error: {} shader lacks `main'", stage_name(r#type)));
            }
        }
        for input in fragment.iter_declarations(glsl::StorageQualifier::In) {
            match vertex
                .iter_declarations(glsl::StorageQualifier::Out)
                .find(|output| output.name == input.name)
            {
                None => errors.push(format!(
                    "error: fragment shader input `{}' has no matching output in the previous \
                     stage",
                    input.name
                )),
                Some(output) if output.ty != input.ty => errors.push(format!(
                    "error: `{}' declared as type `{}' but outputted from previous stage as type \
                     `{}'",
                    input.name, input.ty, output.ty
                )),
                Some(_) => {}
            }
        }

        let mut uniforms: Vec<(String, String)> = Vec::new();
        for unit in [vertex, fragment] {
            for decl in unit.iter_declarations(glsl::StorageQualifier::Uniform) {
                if !unit.is_referenced(&decl.name) {
                    continue;
                }
                match uniforms.iter().find(|(name, _)| *name == decl.name) {
                    Some((_, ty)) if *ty != decl.ty => errors.push(format!(
                        "error: uniform `{}' declared as type `{}' and type `{}'",
                        decl.name, ty, decl.ty
                    )),
                    Some(_) => {}
                    None => uniforms.push((decl.name.clone(), decl.ty.clone())),
                }
            }
        }

        if errors.is_empty() {
            Ok(uniforms)
        } else {
            Err(errors.join("\n"))
        }
    }
}

fn stage_name(r#type: GLenum) -> &'static str {
    match r#type {
        VERTEX_SHADER => "vertex",
        FRAGMENT_SHADER => "fragment",
        _ => "unknown",
    }
}

#[derive(Debug, Default)]
pub struct HeadlessApi {
    state: RefCell<State>,
}

impl HeadlessApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        mem::take(&mut self.state.borrow_mut().calls)
    }

    pub fn draw_calls(&self) -> Vec<Call> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::DrawArrays { .. }))
            .cloned()
            .collect()
    }

    /// counts shader objects that were not deleted (or whose deletion is still pending because
    /// they are attached to a program).
    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn buffer_contents(&self, buffer: Handle) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    pub fn attrib_pointer(&self, vertex_array: Handle, index: GLuint) -> Option<AttribPointer> {
        let state = self.state.borrow();
        state
            .vertex_arrays
            .get(&vertex_array)
            .and_then(|vao| vao.pointers.get(&index).copied())
    }

    pub fn enabled_attribs(&self, vertex_array: Handle) -> Vec<GLuint> {
        let state = self.state.borrow();
        let mut enabled = state
            .vertex_arrays
            .get(&vertex_array)
            .map(|vao| vao.enabled.clone())
            .unwrap_or_default();
        enabled.sort_unstable();
        enabled
    }

    pub fn current_program(&self) -> Option<Handle> {
        self.state.borrow().program
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    /// makes the next `create_program` fail the way a driver that is out of names would.
    pub fn fail_next_create_program(&self) {
        self.state.borrow_mut().fail_create_program = true;
    }

    /// `glGetProgramiv`.
    pub fn program_parameter(&self, program: Handle, pname: GLenum) -> GLint {
        let mut state = self.state.borrow_mut();
        let Some(po) = state.programs.get(&program) else {
            state.set_error(INVALID_VALUE);
            return 0;
        };
        match pname {
            LINK_STATUS => po.linked as GLint,
            VALIDATE_STATUS => po.validated as GLint,
            INFO_LOG_LENGTH if po.info_log.is_empty() => 0,
            INFO_LOG_LENGTH => po.info_log.len() as GLint + 1,
            ATTACHED_SHADERS => po.attached.len() as GLint,
            ACTIVE_UNIFORMS => po.uniforms.len() as GLint,
            _ => {
                state.set_error(INVALID_ENUM);
                0
            }
        }
    }

    /// `glGetShaderiv`.
    pub fn shader_parameter(&self, shader: Handle, pname: GLenum) -> GLint {
        let mut state = self.state.borrow_mut();
        let Some(so) = state.shaders.get(&shader) else {
            state.set_error(INVALID_VALUE);
            return 0;
        };
        match pname {
            SHADER_TYPE => so.r#type as GLint,
            DELETE_STATUS => so.delete_pending as GLint,
            COMPILE_STATUS => so.compiled as GLint,
            INFO_LOG_LENGTH if so.info_log.is_empty() => 0,
            INFO_LOG_LENGTH => so.info_log.len() as GLint + 1,
            _ => {
                state.set_error(INVALID_ENUM);
                0
            }
        }
    }
}

impl Apier for HeadlessApi {
    type Buffer = Handle;
    type Program = Handle;
    type Shader = Handle;
    type VertexArray = Handle;
    type UniformLocation = GLint;

    unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader) {
            return state.set_error(INVALID_VALUE);
        }
        let Some(po) = state.programs.get_mut(&program) else {
            return state.set_error(INVALID_VALUE);
        };
        if po.attached.contains(&shader) {
            return state.set_error(INVALID_OPERATION);
        }
        po.attached.push(shader);
        state.record(Call::AttachShader { program, shader });
    }

    unsafe fn bind_buffer(&self, target: GLenum, buffer: Option<Self::Buffer>) {
        let mut state = self.state.borrow_mut();
        if target != ARRAY_BUFFER {
            return state.set_error(INVALID_ENUM);
        }
        if buffer.is_some_and(|buffer| !state.buffers.contains_key(&buffer)) {
            return state.set_error(INVALID_OPERATION);
        }
        state.array_buffer = buffer;
        state.record(Call::BindBuffer { target, buffer });
    }

    unsafe fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        let mut state = self.state.borrow_mut();
        if vertex_array.is_some_and(|vao| !state.vertex_arrays.contains_key(&vao)) {
            return state.set_error(INVALID_OPERATION);
        }
        state.vertex_array = vertex_array;
        state.record(Call::BindVertexArray(vertex_array));
    }

    unsafe fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        let mut state = self.state.borrow_mut();
        if target != ARRAY_BUFFER || ![STREAM_DRAW, STATIC_DRAW, DYNAMIC_DRAW].contains(&usage) {
            return state.set_error(INVALID_ENUM);
        }
        let Some(buffer) = state.array_buffer else {
            return state.set_error(INVALID_OPERATION);
        };
        state.buffers.insert(buffer, data.to_vec());
        state.record(Call::BufferData {
            target,
            len: data.len(),
            usage,
        });
    }

    unsafe fn clear(&self, mask: GLbitfield) {
        let mut state = self.state.borrow_mut();
        if mask & !COLOR_BUFFER_BIT != 0 {
            return state.set_error(INVALID_VALUE);
        }
        state.record(Call::Clear(mask));
    }

    unsafe fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat) {
        let mut state = self.state.borrow_mut();
        state.record(Call::ClearColor([red, green, blue, alpha]));
    }

    unsafe fn compile_shader(&self, shader: Self::Shader) {
        let mut state = self.state.borrow_mut();
        let Some(so) = state.shaders.get_mut(&shader) else {
            return state.set_error(INVALID_VALUE);
        };
        match glsl::check(&so.source) {
            Ok(unit) => {
                log::trace!(
                    "headless: compiled {} shader (glsl {})",
                    stage_name(so.r#type),
                    unit.version
                );
                so.unit = Some(unit);
                so.compiled = true;
                so.info_log.clear();
            }
            Err(diagnostic) => {
                so.unit = None;
                so.compiled = false;
                so.info_log = format!("{diagnostic}\n");
            }
        }
        state.record(Call::CompileShader(shader));
    }

    unsafe fn create_buffer(&self) -> anyhow::Result<Self::Buffer> {
        let mut state = self.state.borrow_mut();
        let buffer = state.gen_name();
        state.buffers.insert(buffer, Vec::new());
        Ok(buffer)
    }

    unsafe fn create_program(&self) -> anyhow::Result<Self::Program> {
        let mut state = self.state.borrow_mut();
        if mem::take(&mut state.fail_create_program) {
            return Err(anyhow!("could not create program"));
        }
        let program = state.gen_name();
        state.programs.insert(program, ProgramObject::default());
        Ok(program)
    }

    unsafe fn create_shader(&self, r#type: GLenum) -> anyhow::Result<Self::Shader> {
        let mut state = self.state.borrow_mut();
        if r#type != VERTEX_SHADER && r#type != FRAGMENT_SHADER {
            state.set_error(INVALID_ENUM);
            return Err(anyhow!("could not create shader (type 0x{:x})", r#type));
        }
        let shader = state.gen_name();
        state.shaders.insert(
            shader,
            ShaderObject {
                r#type,
                source: String::new(),
                unit: None,
                compiled: false,
                info_log: String::new(),
                delete_pending: false,
            },
        );
        Ok(shader)
    }

    unsafe fn create_vertex_array(&self) -> anyhow::Result<Self::VertexArray> {
        let mut state = self.state.borrow_mut();
        let vertex_array = state.gen_name();
        state
            .vertex_arrays
            .insert(vertex_array, VertexArrayObject::default());
        Ok(vertex_array)
    }

    unsafe fn delete_buffer(&self, buffer: Self::Buffer) {
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(&buffer).is_none() {
            return;
        }
        if state.array_buffer == Some(buffer) {
            state.array_buffer = None;
        }
        state.record(Call::DeleteBuffer(buffer));
    }

    unsafe fn delete_program(&self, program: Self::Program) {
        let mut state = self.state.borrow_mut();
        let Some(po) = state.programs.remove(&program) else {
            return state.set_error(INVALID_VALUE);
        };
        // shaders that were flagged for deletion while attached go away with the program.
        for shader in po.attached {
            if state.shaders.get(&shader).is_some_and(|so| so.delete_pending) {
                state.shaders.remove(&shader);
            }
        }
        if state.program == Some(program) {
            state.program = None;
        }
        state.record(Call::DeleteProgram(program));
    }

    unsafe fn delete_shader(&self, shader: Self::Shader) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader) {
            return state.set_error(INVALID_VALUE);
        }
        let attached = state
            .programs
            .values()
            .any(|po| po.attached.contains(&shader));
        if attached {
            if let Some(so) = state.shaders.get_mut(&shader) {
                so.delete_pending = true;
            }
        } else {
            state.shaders.remove(&shader);
        }
        state.record(Call::DeleteShader(shader));
    }

    unsafe fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        let mut state = self.state.borrow_mut();
        if state.vertex_arrays.remove(&vertex_array).is_none() {
            return;
        }
        if state.vertex_array == Some(vertex_array) {
            state.vertex_array = None;
        }
        state.record(Call::DeleteVertexArray(vertex_array));
    }

    unsafe fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        let mut state = self.state.borrow_mut();
        let Some(po) = state.programs.get_mut(&program) else {
            return state.set_error(INVALID_VALUE);
        };
        let Some(i) = po.attached.iter().position(|it| *it == shader) else {
            return state.set_error(INVALID_OPERATION);
        };
        po.attached.remove(i);
        if state.shaders.get(&shader).is_some_and(|so| so.delete_pending) {
            let still_attached = state
                .programs
                .values()
                .any(|po| po.attached.contains(&shader));
            if !still_attached {
                state.shaders.remove(&shader);
            }
        }
        state.record(Call::DetachShader { program, shader });
    }

    unsafe fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        let mut state = self.state.borrow_mut();
        if mode != TRIANGLES {
            return state.set_error(INVALID_ENUM);
        }
        if first < 0 || count < 0 {
            return state.set_error(INVALID_VALUE);
        }
        // NOTE: core profile does not have a default vertex array.
        if state.vertex_array.is_none() {
            return state.set_error(INVALID_OPERATION);
        }
        let (program, vertex_array) = (state.program, state.vertex_array);
        state.record(Call::DrawArrays {
            mode,
            first,
            count,
            program,
            vertex_array,
        });
    }

    unsafe fn enable_vertex_attrib_array(&self, index: GLuint) {
        let mut state = self.state.borrow_mut();
        let Some(vao) = state.vertex_array else {
            return state.set_error(INVALID_OPERATION);
        };
        if let Some(vao) = state.vertex_arrays.get_mut(&vao) {
            if !vao.enabled.contains(&index) {
                vao.enabled.push(index);
            }
        }
        state.record(Call::EnableVertexAttribArray(index));
    }

    unsafe fn get_error(&self) -> Option<GLenum> {
        self.state.borrow_mut().error.take()
    }

    unsafe fn get_program_info_log(&self, program: Self::Program) -> String {
        let mut state = self.state.borrow_mut();
        match state.programs.get(&program) {
            Some(po) => po.info_log.clone(),
            None => {
                state.set_error(INVALID_VALUE);
                String::new()
            }
        }
    }

    unsafe fn get_program_link_status(&self, program: Self::Program) -> bool {
        self.program_parameter(program, LINK_STATUS) != FALSE as GLint
    }

    unsafe fn get_program_validate_status(&self, program: Self::Program) -> bool {
        self.program_parameter(program, VALIDATE_STATUS) != FALSE as GLint
    }

    unsafe fn get_shader_compile_status(&self, shader: Self::Shader) -> bool {
        self.shader_parameter(shader, COMPILE_STATUS) != FALSE as GLint
    }

    unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String {
        let mut state = self.state.borrow_mut();
        match state.shaders.get(&shader) {
            Some(so) => so.info_log.clone(),
            None => {
                state.set_error(INVALID_VALUE);
                String::new()
            }
        }
    }

    unsafe fn get_string(&self, name: GLenum) -> anyhow::Result<String> {
        let ret = match name {
            VENDOR => "hello-triangle",
            RENDERER => "headless",
            VERSION => "3.3 (Core Profile) headless",
            SHADING_LANGUAGE_VERSION => "3.30",
            _ => {
                self.state.borrow_mut().set_error(INVALID_ENUM);
                return Err(anyhow!("could not get string (name 0x{name:x})"));
            }
        };
        Ok(ret.to_string())
    }

    unsafe fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        let mut state = self.state.borrow_mut();
        let Some(po) = state.programs.get(&program) else {
            state.set_error(INVALID_VALUE);
            return None;
        };
        if !po.linked {
            state.set_error(INVALID_OPERATION);
            return None;
        }
        po.uniforms
            .iter()
            .position(|(it, _)| it == name)
            .map(|location| location as GLint)
    }

    unsafe fn link_program(&self, program: Self::Program) {
        let mut state = self.state.borrow_mut();
        if !state.programs.contains_key(&program) {
            return state.set_error(INVALID_VALUE);
        }
        let result = state.link(program);
        let po = state
            .programs
            .get_mut(&program)
            .expect("program existence checked above");
        po.validated = false;
        match result {
            Ok(uniforms) => {
                po.linked = true;
                po.uniforms = uniforms;
                po.info_log.clear();
            }
            Err(info_log) => {
                po.linked = false;
                po.uniforms.clear();
                po.info_log = format!("{info_log}\n");
            }
        }
        state.record(Call::LinkProgram(program));
    }

    unsafe fn shader_source(&self, shader: Self::Shader, source: &str) {
        let mut state = self.state.borrow_mut();
        let Some(so) = state.shaders.get_mut(&shader) else {
            return state.set_error(INVALID_VALUE);
        };
        so.source = source.to_string();
    }

    unsafe fn uniform_4f(
        &self,
        location: &Self::UniformLocation,
        v0: GLfloat,
        v1: GLfloat,
        v2: GLfloat,
        v3: GLfloat,
    ) {
        let mut state = self.state.borrow_mut();
        let Some(program) = state.program else {
            return state.set_error(INVALID_OPERATION);
        };
        let ty = state.programs.get(&program).and_then(|po| {
            po.uniforms
                .get(*location as usize)
                .map(|(_, ty)| ty.as_str())
        });
        if ty != Some("vec4") {
            return state.set_error(INVALID_OPERATION);
        }
        state.record(Call::Uniform4f {
            program,
            location: *location,
            value: [v0, v1, v2, v3],
        });
    }

    unsafe fn use_program(&self, program: Option<Self::Program>) {
        let mut state = self.state.borrow_mut();
        if let Some(program) = program {
            match state.programs.get(&program) {
                None => return state.set_error(INVALID_VALUE),
                Some(po) if !po.linked => return state.set_error(INVALID_OPERATION),
                Some(_) => {}
            }
        }
        state.program = program;
        state.record(Call::UseProgram(program));
    }

    unsafe fn validate_program(&self, program: Self::Program) {
        let mut state = self.state.borrow_mut();
        let Some(po) = state.programs.get_mut(&program) else {
            return state.set_error(INVALID_VALUE);
        };
        po.validated = po.linked;
        if !po.linked {
            po.info_log = "error: program is not linked\n".to_string();
        }
        state.record(Call::ValidateProgram(program));
    }

    unsafe fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        r#type: GLenum,
        normalized: GLboolean,
        stride: GLsizei,
        offset: GLint,
    ) {
        let mut state = self.state.borrow_mut();
        if !(1..=4).contains(&size) || stride < 0 || offset < 0 {
            return state.set_error(INVALID_VALUE);
        }
        if r#type != FLOAT {
            return state.set_error(INVALID_ENUM);
        }
        let (Some(vao), Some(buffer)) = (state.vertex_array, state.array_buffer) else {
            return state.set_error(INVALID_OPERATION);
        };
        let pointer = AttribPointer {
            size,
            r#type,
            normalized,
            stride,
            offset,
            buffer,
        };
        if let Some(vao) = state.vertex_arrays.get_mut(&vao) {
            vao.pointers.insert(index, pointer);
        }
        state.record(Call::VertexAttribPointer { index, pointer });
    }

    unsafe fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        let mut state = self.state.borrow_mut();
        if width < 0 || height < 0 {
            return state.set_error(INVALID_VALUE);
        }
        state.record(Call::Viewport {
            x,
            y,
            width,
            height,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERT: &str = "#version 330 core\n\
        layout (location = 0) in vec3 aPos;\n\
        out vec3 vertexColor;\n\
        void main()\n\
        {\n\
            gl_Position = vec4(aPos, 1.0);\n\
            vertexColor = aPos;\n\
        }\n";

    const FRAG: &str = "#version 330 core\n\
        in vec3 vertexColor;\n\
        uniform vec4 tint;\n\
        out vec4 FragColor;\n\
        void main()\n\
        {\n\
            FragColor = vec4(vertexColor, 1.0) * tint;\n\
        }\n";

    unsafe fn compile(api: &HeadlessApi, r#type: GLenum, source: &str) -> Handle {
        unsafe {
            let shader = api.create_shader(r#type).unwrap();
            api.shader_source(shader, source);
            api.compile_shader(shader);
            shader
        }
    }

    unsafe fn link(api: &HeadlessApi, vert: Handle, frag: Handle) -> Handle {
        unsafe {
            let program = api.create_program().unwrap();
            api.attach_shader(program, vert);
            api.attach_shader(program, frag);
            api.link_program(program);
            program
        }
    }

    #[test]
    fn compile_and_link() {
        let api = HeadlessApi::new();
        unsafe {
            let vert = compile(&api, VERTEX_SHADER, VERT);
            let frag = compile(&api, FRAGMENT_SHADER, FRAG);
            assert_eq!(api.shader_parameter(vert, COMPILE_STATUS), TRUE as GLint);
            assert_eq!(api.shader_parameter(frag, COMPILE_STATUS), TRUE as GLint);

            let program = link(&api, vert, frag);
            assert_eq!(api.program_parameter(program, LINK_STATUS), TRUE as GLint);
            assert_eq!(api.program_parameter(program, INFO_LOG_LENGTH), 0);
            assert_eq!(api.program_parameter(program, ACTIVE_UNIFORMS), 1);
            assert_eq!(api.get_uniform_location(program, "tint"), Some(0));
            assert_eq!(api.get_uniform_location(program, "missing"), None);
            assert_eq!(api.get_error(), None);
        }
    }

    #[test]
    fn mismatched_interface_fails_to_link() {
        let api = HeadlessApi::new();
        unsafe {
            let vert = compile(
                &api,
                VERTEX_SHADER,
                "#version 330 core\nvoid main() { gl_Position = vec4(0.0); }\n",
            );
            let frag = compile(&api, FRAGMENT_SHADER, FRAG);
            let program = link(&api, vert, frag);
            assert_eq!(api.program_parameter(program, LINK_STATUS), FALSE as GLint);
            let info_log = api.get_program_info_log(program);
            assert!(info_log.contains("`vertexColor' has no matching output"));
        }
    }

    #[test]
    fn status_queries_follow_compile_and_link() {
        let api = HeadlessApi::new();
        unsafe {
            let vert = compile(&api, VERTEX_SHADER, VERT);
            let broken = compile(&api, FRAGMENT_SHADER, "#version 330 core\nvoid main() {\n");
            assert!(api.get_shader_compile_status(vert));
            assert!(!api.get_shader_compile_status(broken));

            let program = link(&api, vert, broken);
            assert!(!api.get_program_link_status(program));

            let frag = compile(&api, FRAGMENT_SHADER, FRAG);
            let program = link(&api, vert, frag);
            assert!(api.get_program_link_status(program));
            assert!(!api.get_program_validate_status(program));
            api.validate_program(program);
            assert!(api.get_program_validate_status(program));
        }
    }

    #[test]
    fn failing_create_program_fails_once() {
        let api = HeadlessApi::new();
        unsafe {
            api.fail_next_create_program();
            assert!(api.create_program().is_err());
            assert_eq!(api.live_programs(), 0);
            assert!(api.create_program().is_ok());
            assert_eq!(api.live_programs(), 1);
        }
    }

    #[test]
    fn deleting_attached_shader_is_deferred() {
        let api = HeadlessApi::new();
        unsafe {
            let vert = compile(&api, VERTEX_SHADER, VERT);
            let frag = compile(&api, FRAGMENT_SHADER, FRAG);
            let program = link(&api, vert, frag);

            api.delete_shader(vert);
            api.delete_shader(frag);
            assert_eq!(api.live_shaders(), 2);
            assert_eq!(api.shader_parameter(vert, DELETE_STATUS), TRUE as GLint);

            api.detach_shader(program, vert);
            api.detach_shader(program, frag);
            assert_eq!(api.live_shaders(), 0);
        }
    }

    #[test]
    fn uniform_without_program_is_an_error() {
        let api = HeadlessApi::new();
        unsafe {
            api.uniform_4f(&0, 0.0, 1.0, 0.0, 1.0);
            assert_eq!(api.get_error(), Some(INVALID_OPERATION));
            // only the first error is latched and it is cleared by querying.
            assert_eq!(api.get_error(), None);
        }
    }

    #[test]
    fn draw_requires_vertex_array() {
        let api = HeadlessApi::new();
        unsafe {
            api.draw_arrays(TRIANGLES, 0, 3);
            assert_eq!(api.get_error(), Some(INVALID_OPERATION));
            assert!(api.draw_calls().is_empty());

            let vao = api.create_vertex_array().unwrap();
            api.bind_vertex_array(Some(vao));
            api.draw_arrays(TRIANGLES, 0, 3);
            assert_eq!(api.draw_calls().len(), 1);
        }
    }
}
