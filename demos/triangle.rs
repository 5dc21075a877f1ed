use std::process::ExitCode;

fn main() -> ExitCode {
    app::run(render::Scene::triangle(), app::Config::from_env())
}
