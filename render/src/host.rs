use std::time::Duration;

use input::{KeyState, Scancode};

/// what the frame loop needs from the window and context that it renders into.
pub trait Host {
    /// non-blocking; dispatches whatever input and window events are pending.
    fn poll_events(&mut self) -> anyhow::Result<()>;

    fn key_state(&self, scancode: Scancode) -> KeyState;

    fn key_pressed(&self, scancode: Scancode) -> bool {
        self.key_state(scancode) == KeyState::Pressed
    }

    fn should_close(&self) -> bool;
    fn set_should_close(&mut self, value: bool);

    /// new physical framebuffer size, if it changed since the last call.
    fn take_resize(&mut self) -> Option<(u32, u32)>;

    fn swap_buffers(&mut self) -> anyhow::Result<()>;

    /// time since the host was created.
    fn elapsed(&self) -> Duration;
}
