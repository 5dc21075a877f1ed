use std::process::ExitCode;

fn main() -> ExitCode {
    let config = app::Config::from_env();
    let window = config.window.clone().with_title("Vertex color");
    app::run(render::Scene::vertex_color(), config.with_window(window))
}
