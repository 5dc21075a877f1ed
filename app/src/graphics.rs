use std::ffi::CStr;
use std::num::NonZero;

use anyhow::Context as _;
use glutin::config::{ConfigTemplateBuilder, GlConfig as _};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext as _,
    PossiblyCurrentContext, Version,
};
use glutin::display::{Display, DisplayApiPreference, GlDisplay as _};
use glutin::surface::{
    GlSurface as _, Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface,
};
use raw_window_handle as rwh;
use window::Window;

pub const GL_VERSION: (u8, u8) = (3, 3);

fn non_zero_size((width, height): (u32, u32)) -> (NonZero<u32>, NonZero<u32>) {
    (
        NonZero::new(width).unwrap_or(NonZero::<u32>::MIN),
        NonZero::new(height).unwrap_or(NonZero::<u32>::MIN),
    )
}

fn display_api_preference(_window_handle: rwh::RawWindowHandle) -> DisplayApiPreference {
    #[cfg(target_os = "windows")]
    return DisplayApiPreference::Wgl(Some(_window_handle));
    #[cfg(target_os = "macos")]
    return DisplayApiPreference::Cgl;
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    return DisplayApiPreference::Egl;
}

/// gl context bound to a single window surface.
pub struct GraphicsContext {
    // NOTE: field order is drop order; the surface and the context must go before the display.
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    display: Display,
}

impl GraphicsContext {
    /// creates an opengl 3.3 core context for `window` and makes it current on the calling thread.
    pub fn new(window: &dyn Window, vsync: bool) -> anyhow::Result<Self> {
        let raw_display_handle = window
            .display_handle()
            .context("display handle is unavailable")?
            .as_raw();
        let raw_window_handle = window
            .window_handle()
            .context("window handle is unavailable")?
            .as_raw();

        let display = unsafe {
            Display::new(
                raw_display_handle,
                display_api_preference(raw_window_handle),
            )
        }
        .context("could not create display")?;

        let config_template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .compatible_with_native_window(raw_window_handle)
            .build();
        let config = unsafe { display.find_configs(config_template) }
            .context("could not find configs")?
            .reduce(|acc, config| {
                if config.num_samples() > acc.num_samples() {
                    config
                } else {
                    acc
                }
            })
            .context("could not choose config (no compatible ones probably)")?;
        log::debug!("chose config with {} samples", config.num_samples());

        let context_attrs = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(
                GL_VERSION.0,
                GL_VERSION.1,
            ))))
            .build(Some(raw_window_handle));
        let not_current_context = unsafe { display.create_context(&config, &context_attrs) }
            .with_context(|| {
                format!(
                    "could not create opengl {}.{} core context",
                    GL_VERSION.0, GL_VERSION.1
                )
            })?;

        let (width, height) = non_zero_size(window.physical_size());
        let surface_attrs =
            SurfaceAttributesBuilder::<WindowSurface>::new().build(raw_window_handle, width, height);
        let surface = unsafe { display.create_window_surface(&config, &surface_attrs) }
            .context("could not create window surface")?;

        let context = not_current_context
            .make_current(&surface)
            .context("could not make current")?;

        let swap_interval = if vsync {
            SwapInterval::Wait(NonZero::<u32>::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(err) = surface.set_swap_interval(&context, swap_interval) {
            log::warn!("could not set swap interval to {swap_interval:?}: {err}");
        }

        log::info!("created graphics context ({:?})", display.version_string());

        Ok(Self {
            surface,
            context,
            display,
        })
    }

    pub fn load_api(&self) -> anyhow::Result<gl::GlowApi> {
        let display = &self.display;
        unsafe { gl::GlowApi::load_with(|procname: &CStr| display.get_proc_address(procname)) }
            .context("could not load gl functions")
    }

    pub fn resize(&self, physical_size: (u32, u32)) {
        let (width, height) = non_zero_size(physical_size);
        self.surface.resize(&self.context, width, height);
    }

    pub fn swap_buffers(&self) -> anyhow::Result<()> {
        self.surface
            .swap_buffers(&self.context)
            .context("could not swap buffers")
    }
}
