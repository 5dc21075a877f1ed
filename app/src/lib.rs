use std::env;
use std::process::ExitCode;
use std::str::FromStr as _;
use std::time::Instant;

use anyhow::Context as _;
use gl::Apier as _;
use window::WindowAttrs;

mod graphics;
mod host;

pub use graphics::*;
pub use host::*;

pub const LOG_ENV: &str = "HELLO_TRIANGLE_LOG";
pub const VSYNC_ENV: &str = "HELLO_TRIANGLE_VSYNC";

struct Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        eprintln!(
            "{level:<5} {target}:{line:<4} > {text}",
            level = record.level(),
            target = record.target(),
            line = record
                .line()
                .map_or_else(|| "?".to_string(), |line| line.to_string()),
            text = record.args(),
        );
    }

    fn flush(&self) {}
}

impl Logger {
    fn init(max_level: log::LevelFilter) {
        // NOTE: a second run within the same process keeps the first logger.
        if log::set_logger(&Logger).is_ok() {
            log::set_max_level(max_level);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub window: WindowAttrs,
    pub vsync: bool,
    pub log_level: log::LevelFilter,
    /// environment overrides that could not be parsed; reported once logging is up.
    pub ignored_env: Vec<InvalidEnvVar>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowAttrs::default(),
            vsync: true,
            log_level: log::LevelFilter::Info,
            ignored_env: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEnvVar {
    pub name: &'static str,
    pub value: String,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn with_window(mut self, value: WindowAttrs) -> Self {
        self.window = value;
        self
    }

    pub fn with_vsync(mut self, value: bool) -> Self {
        self.vsync = value;
        self
    }

    pub fn with_log_level(mut self, value: log::LevelFilter) -> Self {
        self.log_level = value;
        self
    }

    /// applies overrides from `lookup` (an environment). values that can not be parsed are left
    /// untouched and collected in `ignored_env`.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(LOG_ENV) {
            match log::LevelFilter::from_str(value.trim()) {
                Ok(log_level) => self.log_level = log_level,
                Err(_) => self.ignored_env.push(InvalidEnvVar {
                    name: LOG_ENV,
                    value,
                }),
            }
        }

        if let Some(value) = lookup(VSYNC_ENV) {
            match parse_bool(&value) {
                Some(vsync) => self.vsync = vsync,
                None => self.ignored_env.push(InvalidEnvVar {
                    name: VSYNC_ENV,
                    value,
                }),
            }
        }

        self
    }

    pub fn from_env() -> Self {
        Self::default().apply_env(|name| env::var(name).ok())
    }
}

fn run_scene(scene: &render::Scene, config: Config) -> anyhow::Result<u64> {
    let start = Instant::now();

    let window = window::create_window(config.window).context("could not create window")?;
    let graphics_context = GraphicsContext::new(window.as_ref(), config.vsync)
        .context("could not create graphics context")?;
    let api = graphics_context.load_api()?;

    unsafe {
        for (name, what) in [
            (gl::VENDOR, "vendor"),
            (gl::RENDERER, "renderer"),
            (gl::VERSION, "version"),
            (gl::SHADING_LANGUAGE_VERSION, "glsl version"),
        ] {
            match api.get_string(name) {
                Ok(value) => log::info!("gl {what}: {value}"),
                Err(err) => log::warn!("{err:?}"),
            }
        }

        let (width, height) = window.physical_size();
        api.viewport(0, 0, width as gl::GLsizei, height as gl::GLsizei);
    }

    let resources = scene.setup(&api)?;
    let mut host = NativeHost::new(window, graphics_context, start);

    let mut frame_loop =
        render::FrameLoop::new(&resources.program, &resources.mesh, scene.time_uniform);
    let frames = frame_loop.run(&api, &mut host);

    resources.destroy(&api);
    if let Some(error) = unsafe { api.get_error() } {
        log::warn!("gl error on shutdown: {}", gl::error_name(error));
    }
    drop(host);

    frames
}

/// opens a window, sets `scene` up and draws it until the user asks to exit.
///
/// returns 0 after a normal exit and 1 when anything needed to render (window, context, gl
/// functions, program object) could not be created, or when presenting failed.
pub fn run(scene: render::Scene, mut config: Config) -> ExitCode {
    Logger::init(config.log_level);
    for InvalidEnvVar { name, value } in config.ignored_env.drain(..) {
        log::warn!("ignoring invalid {name}={value:?}");
    }

    log::info!("running {}", scene.name);
    match run_scene(&scene, config) {
        Ok(frames) => {
            log::info!("exited after {frames} frames");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err:?}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.vsync);
        assert_eq!(config.log_level, log::LevelFilter::Info);
        assert_eq!(config.window.title, window::DEFAULT_TITLE);
    }

    #[test]
    fn env_overrides() {
        let config = Config::default().apply_env(env(&[(LOG_ENV, "trace"), (VSYNC_ENV, "0")]));
        assert!(config.ignored_env.is_empty());
        assert_eq!(config.log_level, log::LevelFilter::Trace);
        assert!(!config.vsync);
    }

    #[test]
    fn invalid_env_is_reported_and_ignored() {
        let config =
            Config::default().apply_env(env(&[(LOG_ENV, "loud"), (VSYNC_ENV, "sometimes")]));
        assert_eq!(config.log_level, log::LevelFilter::Info);
        assert!(config.vsync);
        assert_eq!(
            config.ignored_env.iter().map(|it| it.name).collect::<Vec<_>>(),
            vec![LOG_ENV, VSYNC_ENV]
        );
    }

    #[test]
    fn builders() {
        let config = Config::default()
            .with_window(WindowAttrs::default().with_title("vertex color"))
            .with_vsync(false)
            .with_log_level(log::LevelFilter::Warn);
        assert_eq!(config.window.title, "vertex color");
        assert!(!config.vsync);
        assert_eq!(config.log_level, log::LevelFilter::Warn);
    }
}
