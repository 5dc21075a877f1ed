use std::iter;
use std::time::{Duration, Instant};

use input::{KeyState, Scancode};
use window::{Event, Window, WindowEvent};

use crate::graphics::GraphicsContext;

/// [`render::Host`] over a real window and its gl context.
pub struct NativeHost {
    // NOTE: graphics context must be dropped before the window it renders into.
    graphics_context: GraphicsContext,
    window: Box<dyn Window>,
    input: input::State,
    should_close: bool,
    pending_resize: Option<(u32, u32)>,
    start: Instant,
}

impl NativeHost {
    pub fn new(window: Box<dyn Window>, graphics_context: GraphicsContext, start: Instant) -> Self {
        Self {
            graphics_context,
            window,
            input: input::State::default(),
            should_close: false,
            pending_resize: None,
            start,
        }
    }
}

impl render::Host for NativeHost {
    fn poll_events(&mut self) -> anyhow::Result<()> {
        self.window.pump_events()?;

        let window = self.window.as_mut();
        let graphics_context = &self.graphics_context;
        let should_close = &mut self.should_close;
        let pending_resize = &mut self.pending_resize;
        let events = iter::from_fn(|| window.pop_event()).filter_map(|event| match event {
            Event::Window(WindowEvent::Resized { physical_size }) => {
                graphics_context.resize(physical_size);
                *pending_resize = Some(physical_size);
                None
            }
            Event::Window(WindowEvent::ScaleFactorChanged { scale_factor }) => {
                log::debug!("scale factor changed to {scale_factor}");
                None
            }
            Event::Window(WindowEvent::CloseRequested) => {
                log::info!("close requested");
                *should_close = true;
                None
            }
            Event::Keyboard(keyboard_event) => Some(keyboard_event),
        });
        self.input.handle_events(events);

        Ok(())
    }

    fn key_state(&self, scancode: Scancode) -> KeyState {
        self.input.keyboard.key_state(scancode)
    }

    fn should_close(&self) -> bool {
        self.should_close
    }

    fn set_should_close(&mut self, value: bool) {
        self.should_close = value;
    }

    fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.pending_resize.take()
    }

    fn swap_buffers(&mut self) -> anyhow::Result<()> {
        self.graphics_context.swap_buffers()
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
