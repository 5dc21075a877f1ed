use std::fmt;

use anyhow::Context as _;
use gl::Apier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_type(self) -> gl::GLenum {
        match self {
            Self::Vertex => gl::VERTEX_SHADER,
            Self::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// source text of a single stage. it is expected to be glsl 330 core (or compatible); nothing on
/// this side checks that, the driver does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource<'a> {
    pub stage: ShaderStage,
    pub text: &'a str,
}

impl<'a> ShaderSource<'a> {
    pub const fn vertex(text: &'a str) -> Self {
        Self {
            stage: ShaderStage::Vertex,
            text,
        }
    }

    pub const fn fragment(text: &'a str) -> Self {
        Self {
            stage: ShaderStage::Fragment,
            text,
        }
    }
}

/// a compiled (or failed to compile) stage.
///
/// it is single-use: [`crate::link_program`] consumes it and deletes the gpu object. if you decide
/// not to link (for example because you treat compile failures as fatal), call
/// [`CompiledShader::destroy`].
pub struct CompiledShader<A: Apier> {
    pub(crate) shader: A::Shader,
    stage: ShaderStage,
    compiled: bool,
    info_log: Option<String>,
}

impl<A: Apier> CompiledShader<A> {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn compiled(&self) -> bool {
        self.compiled
    }

    /// driver diagnostics. always present when compilation failed; may be present on success if
    /// the driver emitted warnings.
    pub fn info_log(&self) -> Option<&str> {
        self.info_log.as_deref()
    }

    pub fn destroy(self, api: &A) {
        unsafe { api.delete_shader(self.shader) };
    }
}

/// drivers pad info logs with trailing newlines (and some with a nul); an empty log is `None`.
pub(crate) fn trim_info_log(info_log: String) -> Option<String> {
    let trimmed = info_log.trim_end_matches(['\0', '\n', ' ']);
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// a failed compilation is not an error at this level: it is reported (logged with the driver's
/// diagnostics) and the unit is returned anyway so that the caller decides what to do. the only
/// error is the driver refusing to create a shader object.
pub fn compile_shader<A: Apier>(
    api: &A,
    source: &ShaderSource,
) -> anyhow::Result<CompiledShader<A>> {
    unsafe {
        let shader = api
            .create_shader(source.stage.gl_type())
            .with_context(|| format!("could not create {} shader", source.stage))?;
        api.shader_source(shader, source.text);
        api.compile_shader(shader);

        let compiled = api.get_shader_compile_status(shader);
        let info_log = trim_info_log(api.get_shader_info_log(shader));
        match (compiled, info_log.as_deref()) {
            (false, info_log) => log::error!(
                "COMPILING ERROR ({stage} shader): {info_log}",
                stage = source.stage,
                info_log = info_log.unwrap_or("<driver provided no info log>"),
            ),
            (true, Some(info_log)) => {
                log::warn!("{} shader compiled with warnings: {info_log}", source.stage)
            }
            (true, None) => log::debug!("compiled {} shader", source.stage),
        }

        Ok(CompiledShader {
            shader,
            stage: source.stage,
            compiled,
            info_log,
        })
    }
}
