use anyhow::Context as _;
use gl::Apier;

use crate::shader::{CompiledShader, ShaderStage, trim_info_log};

/// uniform name → location cache.
///
/// a name that the driver did not report (misspelled, or optimized away because it is unused) is
/// stored as `None`; that is the "not found" value and setting through it does nothing.
#[derive(Debug)]
pub struct UniformBindings<L> {
    entries: Vec<(String, Option<L>)>,
}

impl<L> Default for UniformBindings<L> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<L> UniformBindings<L> {
    fn insert(&mut self, name: &str, location: Option<L>) {
        match self.entries.iter_mut().find(|(it, _)| it == name) {
            Some((_, it)) => *it = location,
            None => self.entries.push((name.to_string(), location)),
        }
    }

    /// `None` both for names that were resolved and not found and for names that were never
    /// asked for.
    pub fn get(&self, name: &str) -> Option<&L> {
        self.entries
            .iter()
            .find(|(it, _)| it == name)
            .and_then(|(_, location)| location.as_ref())
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.entries.iter().any(|(it, _)| it == name)
    }
}

pub struct ShaderProgram<A: Apier> {
    program: A::Program,
    linked: bool,
    validated: bool,
    info_log: Option<String>,
    uniforms: UniformBindings<A::UniformLocation>,
}

impl<A: Apier> ShaderProgram<A> {
    pub fn handle(&self) -> A::Program {
        self.program
    }

    pub fn linked(&self) -> bool {
        self.linked
    }

    pub fn validated(&self) -> bool {
        self.validated
    }

    pub fn info_log(&self) -> Option<&str> {
        self.info_log.as_deref()
    }

    pub fn uniforms(&self) -> &UniformBindings<A::UniformLocation> {
        &self.uniforms
    }

    pub fn uniform_location(&self, name: &str) -> Option<&A::UniformLocation> {
        self.uniforms.get(name)
    }

    /// makes this the program used by subsequent draw calls. an unlinked program can not be
    /// activated; the driver raises an error and the previous program stays bound.
    pub fn activate(&self, api: &A) {
        unsafe { api.use_program(Some(self.program)) };
    }

    /// no-op if `name` was not found (or never resolved).
    pub fn set_uniform_4f(&self, api: &A, name: &str, value: [f32; 4]) {
        if let Some(location) = self.uniforms.get(name) {
            unsafe { api.uniform_4f(location, value[0], value[1], value[2], value[3]) };
        }
    }

    pub fn destroy(self, api: &A) {
        unsafe { api.delete_program(self.program) };
    }
}

/// links the two stages into a program.
///
/// both units are consumed: they are detached and deleted whatever the outcome. a link failure is
/// reported and the (unusable) program is returned; the only error is the driver refusing to
/// create a program object.
///
/// on success the program is validated against the current state (a failed validation is only a
/// warning), activated, and `uniform_names` are resolved once.
pub fn link_program<A: Apier>(
    api: &A,
    vertex: CompiledShader<A>,
    fragment: CompiledShader<A>,
    uniform_names: &[&str],
) -> anyhow::Result<ShaderProgram<A>> {
    debug_assert_eq!(vertex.stage(), ShaderStage::Vertex);
    debug_assert_eq!(fragment.stage(), ShaderStage::Fragment);

    unsafe {
        let program = match api.create_program().context("could not create program") {
            Ok(program) => program,
            Err(err) => {
                vertex.destroy(api);
                fragment.destroy(api);
                return Err(err);
            }
        };

        api.attach_shader(program, vertex.shader);
        api.attach_shader(program, fragment.shader);
        api.link_program(program);

        let linked = api.get_program_link_status(program);
        let info_log = trim_info_log(api.get_program_info_log(program));
        if !linked {
            log::error!(
                "LINKING ERROR: {}",
                info_log.as_deref().unwrap_or("<driver provided no info log>")
            );
        }

        for unit in [vertex, fragment] {
            api.detach_shader(program, unit.shader);
            unit.destroy(api);
        }

        let mut this = ShaderProgram {
            program,
            linked,
            validated: false,
            info_log,
            uniforms: UniformBindings::default(),
        };
        if !linked {
            return Ok(this);
        }

        api.validate_program(program);
        this.validated = api.get_program_validate_status(program);
        if !this.validated {
            log::warn!(
                "program did not validate: {}",
                trim_info_log(api.get_program_info_log(program))
                    .as_deref()
                    .unwrap_or("<driver provided no info log>")
            );
        }

        this.activate(api);
        for name in uniform_names {
            let location = api.get_uniform_location(program, name);
            match location {
                Some(ref location) => log::debug!("uniform `{name}` is at {location:?}"),
                None => log::debug!("uniform `{name}` was not found"),
            }
            this.uniforms.insert(name, location);
        }

        log::info!("linked program {:?}", program);
        Ok(this)
    }
}
