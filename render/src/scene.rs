use anyhow::Context as _;
use gl::Apier;

use crate::program::{ShaderProgram, link_program};
use crate::shader::{ShaderSource, compile_shader};
use crate::vertex::{VertexBuffer, VertexLayout, upload_vertices};

#[rustfmt::skip]
const TRIANGLE_VERTICES: [f32; 9] = [
    -0.5, -0.5, 0.0, // left
     0.5, -0.5, 0.0, // right
     0.0,  0.5, 0.0, // top
];

#[rustfmt::skip]
const VERTEX_COLOR_VERTICES: [f32; 36] = [
    // positions         // colors
    -0.9, -0.5, 0.0,     1.0, 0.0, 0.0,
    -0.1, -0.5, 0.0,     0.0, 1.0, 0.0,
    -0.5,  0.5, 0.0,     0.0, 0.0, 1.0,

     0.1, -0.5, 0.0,     1.0, 1.0, 0.0,
     0.9, -0.5, 0.0,     0.0, 1.0, 1.0,
     0.5,  0.5, 0.0,     1.0, 0.0, 1.0,
];

/// everything a demo draws: one static mesh and one program.
#[derive(Debug, Clone)]
pub struct Scene {
    pub name: &'static str,
    pub vertices: &'static [f32],
    pub layout: VertexLayout,
    pub vertex_shader: ShaderSource<'static>,
    pub fragment_shader: ShaderSource<'static>,
    /// `vec4` uniform that receives `[0, oscillate(t), 0, 1]` every frame.
    pub time_uniform: Option<&'static str>,
}

pub struct SceneResources<A: Apier> {
    pub program: ShaderProgram<A>,
    pub mesh: VertexBuffer<A>,
}

impl<A: Apier> SceneResources<A> {
    pub fn destroy(self, api: &A) {
        self.program.destroy(api);
        self.mesh.destroy(api);
    }
}

impl Scene {
    /// three position-only vertices, constant orange.
    pub fn triangle() -> Self {
        Self {
            name: "triangle",
            vertices: &TRIANGLE_VERTICES,
            layout: VertexLayout::position(&TRIANGLE_VERTICES),
            vertex_shader: ShaderSource::vertex(include_str!("shaders/triangle.vert")),
            fragment_shader: ShaderSource::fragment(include_str!("shaders/triangle.frag")),
            time_uniform: None,
        }
    }

    /// two triangles side by side with per-vertex colors, blended with a uniform whose green
    /// channel pulses over time.
    pub fn vertex_color() -> Self {
        Self {
            name: "vertex-color",
            vertices: &VERTEX_COLOR_VERTICES,
            layout: VertexLayout::position_color(&VERTEX_COLOR_VERTICES),
            vertex_shader: ShaderSource::vertex(include_str!("shaders/vertex_color.vert")),
            fragment_shader: ShaderSource::fragment(include_str!("shaders/vertex_color.frag")),
            time_uniform: Some("ourColor"),
        }
    }

    /// upload, compile both stages, link. compile and link failures are reported but do not stop
    /// the setup; the returned program may be unusable.
    pub fn setup<A: Apier>(&self, api: &A) -> anyhow::Result<SceneResources<A>> {
        let mesh = upload_vertices(api, self.vertices, self.layout.clone())
            .with_context(|| format!("could not upload {} vertices", self.name))?;

        let setup_program = || -> anyhow::Result<ShaderProgram<A>> {
            let vertex = compile_shader(api, &self.vertex_shader)?;
            let fragment = match compile_shader(api, &self.fragment_shader) {
                Ok(fragment) => fragment,
                Err(err) => {
                    vertex.destroy(api);
                    return Err(err);
                }
            };
            link_program(api, vertex, fragment, self.time_uniform.as_slice())
        };
        match setup_program() {
            Ok(program) => Ok(SceneResources { program, mesh }),
            Err(err) => {
                mesh.destroy(api);
                Err(err).with_context(|| format!("could not set up {} program", self.name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use gl::headless::HeadlessApi;

    use super::*;

    #[test]
    fn triangle_setup() {
        let api = HeadlessApi::new();
        let scene = Scene::triangle();
        let resources = scene.setup(&api).unwrap();

        assert!(resources.program.linked());
        assert_eq!(resources.program.info_log(), None);
        assert_eq!(resources.mesh.vertex_count(), 3);

        let vao = resources.mesh.vertex_array();
        assert_eq!(api.enabled_attribs(vao), vec![0]);
        let position = api.attrib_pointer(vao, 0).unwrap();
        assert_eq!((position.size, position.stride, position.offset), (3, 12, 0));
        assert_eq!(api.live_shaders(), 0);
        assert_eq!(unsafe { api.get_error() }, None);
    }

    #[test]
    fn vertex_color_setup() {
        let api = HeadlessApi::new();
        let scene = Scene::vertex_color();
        let resources = scene.setup(&api).unwrap();

        assert!(resources.program.linked());
        assert!(resources.program.uniform_location("ourColor").is_some());
        assert_eq!(resources.mesh.vertex_count(), 6);

        let vao = resources.mesh.vertex_array();
        assert_eq!(api.enabled_attribs(vao), vec![0, 1]);
        let position = api.attrib_pointer(vao, 0).unwrap();
        let color = api.attrib_pointer(vao, 1).unwrap();
        assert_eq!((position.size, position.stride, position.offset), (3, 24, 0));
        assert_eq!((color.size, color.stride, color.offset), (3, 24, 12));
        assert_eq!(unsafe { api.get_error() }, None);
    }

    #[test]
    fn broken_shader_does_not_stop_setup() {
        let api = HeadlessApi::new();
        let mut scene = Scene::triangle();
        scene.fragment_shader = ShaderSource::fragment("void main() {}\n");
        let resources = scene.setup(&api).unwrap();
        assert!(!resources.program.linked());
        assert_eq!(api.live_shaders(), 0);
    }

    #[test]
    fn destroy_releases_everything() {
        let api = HeadlessApi::new();
        let resources = Scene::vertex_color().setup(&api).unwrap();
        resources.destroy(&api);
        assert_eq!(api.live_programs(), 0);
        assert_eq!(api.live_shaders(), 0);
        assert_eq!(api.live_buffers(), 0);
        assert_eq!(api.live_vertex_arrays(), 0);
    }

    #[test]
    fn program_creation_failure_releases_everything() {
        let api = HeadlessApi::new();
        api.fail_next_create_program();
        let err = Scene::triangle()
            .setup(&api)
            .err()
            .expect("setup must fail without a program object");
        assert!(format!("{err:#}").contains("could not set up triangle program"));
        assert_eq!(api.live_shaders(), 0);
        assert_eq!(api.live_programs(), 0);
        assert_eq!(api.live_buffers(), 0);
        assert_eq!(api.live_vertex_arrays(), 0);
    }
}
