use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{Context, anyhow};
use input::{KeyState, KeyboardEvent, RawKey, Scancode};
use raw_window_handle as rwh;
use winit::platform::pump_events::EventLoopExtPumpEvents;

use crate::{DEFAULT_LOGICAL_SIZE, Event, Window, WindowAttrs, WindowEvent};

#[inline]
fn map_keyboard_physical_key(physical_key: winit::keyboard::PhysicalKey) -> Scancode {
    use winit::keyboard::{KeyCode, NativeKeyCode, PhysicalKey};
    match physical_key {
        PhysicalKey::Code(KeyCode::Escape) => Scancode::Esc,
        PhysicalKey::Unidentified(NativeKeyCode::Xkb(code)) => {
            Scancode::Unidentified(RawKey::Native(code))
        }
        _ => Scancode::Unidentified(RawKey::Unidentified),
    }
}

struct App {
    window_attrs: WindowAttrs,

    window: Option<winit::window::Window>,
    window_create_error: Option<winit::error::OsError>,

    events: VecDeque<Event>,
}

pub struct WinitBackend {
    event_loop: winit::event_loop::EventLoop<()>,
    app: App,
}

impl winit::application::ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let logical_size = self
            .window_attrs
            .logical_size
            .unwrap_or(DEFAULT_LOGICAL_SIZE);

        let window_attrs = winit::window::WindowAttributes::default()
            .with_title(self.window_attrs.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(
                logical_size.0 as f64,
                logical_size.1 as f64,
            ))
            .with_resizable(self.window_attrs.resizable);
        match event_loop.create_window(window_attrs) {
            Ok(window) => {
                log::info!("created winit window");
                self.window = Some(window);
            }
            Err(err) => self.window_create_error = Some(err),
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &winit::event_loop::ActiveEventLoop,
        window_id: winit::window::WindowId,
        window_event: winit::event::WindowEvent,
    ) {
        if self.window.as_ref().is_none_or(|window| window.id() != window_id) {
            return;
        }

        use winit::event::WindowEvent::*;
        let maybe_event = match window_event {
            Resized(physical_size) => Some(Event::Window(WindowEvent::Resized {
                physical_size: (physical_size.width, physical_size.height),
            })),
            ScaleFactorChanged { scale_factor, .. } => {
                Some(Event::Window(WindowEvent::ScaleFactorChanged {
                    scale_factor,
                }))
            }
            KeyboardInput { event, .. } => {
                let scancode = map_keyboard_physical_key(event.physical_key);
                let state = if event.state.is_pressed() {
                    KeyState::Pressed
                } else {
                    KeyState::Released
                };
                Some(Event::Keyboard(KeyboardEvent { state, scancode }))
            }
            CloseRequested => Some(Event::Window(WindowEvent::CloseRequested)),
            other => {
                log::trace!("unused window event: {other:?}");
                None
            }
        };
        if let Some(event) = maybe_event {
            self.events.push_back(event);
        }
    }
}

impl WinitBackend {
    pub fn new(attrs: WindowAttrs) -> anyhow::Result<Self> {
        let mut this = Self {
            event_loop: winit::event_loop::EventLoop::new()
                .context("could not create event loop")?,
            app: App {
                window_attrs: attrs,

                window: None,
                window_create_error: None,

                events: VecDeque::new(),
            },
        };
        // NOTE: winit creates windows only from within `resumed` which is dispatched on the first
        // pump. the caller needs a window handle right away to create a surface.
        this.pump_events()?;
        Ok(this)
    }
}

impl rwh::HasDisplayHandle for WinitBackend {
    fn display_handle(&self) -> Result<rwh::DisplayHandle<'_>, rwh::HandleError> {
        self.event_loop.display_handle()
    }
}

impl rwh::HasWindowHandle for WinitBackend {
    fn window_handle(&self) -> Result<rwh::WindowHandle<'_>, rwh::HandleError> {
        if let Some(ref window) = self.app.window {
            window.window_handle()
        } else {
            Err(rwh::HandleError::Unavailable)
        }
    }
}

impl Window for WinitBackend {
    fn pump_events(&mut self) -> anyhow::Result<()> {
        use winit::platform::pump_events::PumpStatus;
        let ret = match self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.app)
        {
            PumpStatus::Exit(code) => Err(anyhow!(format!("unexpected exit (code {code})"))),
            PumpStatus::Continue => Ok(()),
        };

        if let Some(err) = self.app.window_create_error.take() {
            return Err(err).context("could not create window");
        }
        if self.app.window.is_none() {
            return Err(anyhow!("window was not created"));
        }

        ret
    }

    fn pop_event(&mut self) -> Option<Event> {
        self.app.events.pop_front()
    }

    fn scale_factor(&self) -> f64 {
        self.app
            .window
            .as_ref()
            .map_or(1.0, |window| window.scale_factor())
    }

    fn physical_size(&self) -> (u32, u32) {
        self.app.window.as_ref().map_or((0, 0), |window| {
            let inner_size = window.inner_size();
            (inner_size.width, inner_size.height)
        })
    }
}
