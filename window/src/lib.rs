use raw_window_handle as rwh;

mod backend_winit;

pub const DEFAULT_LOGICAL_SIZE: (u32, u32) = (800, 600);
pub const DEFAULT_TITLE: &str = "First OpenGL program";

#[derive(Debug, Clone)]
pub struct WindowAttrs {
    pub logical_size: Option<(u32, u32)>,
    pub title: String,
    pub resizable: bool,
}

impl Default for WindowAttrs {
    fn default() -> Self {
        Self {
            logical_size: None,
            title: DEFAULT_TITLE.to_string(),
            resizable: true,
        }
    }
}

impl WindowAttrs {
    pub fn with_logical_size(mut self, value: (u32, u32)) -> Self {
        self.logical_size = Some(value);
        self
    }

    pub fn with_title(mut self, value: impl Into<String>) -> Self {
        self.title = value.into();
        self
    }

    pub fn with_resizable(mut self, value: bool) -> Self {
        self.resizable = value;
        self
    }
}

#[derive(Debug, Clone)]
pub enum WindowEvent {
    Resized { physical_size: (u32, u32) },
    ScaleFactorChanged { scale_factor: f64 },
    CloseRequested,
}

#[derive(Debug, Clone)]
pub enum Event {
    Window(WindowEvent),
    Keyboard(input::KeyboardEvent),
}

pub trait Window: rwh::HasDisplayHandle + rwh::HasWindowHandle {
    /// non-blocking; dispatches whatever the platform has queued and returns.
    fn pump_events(&mut self) -> anyhow::Result<()>;
    fn pop_event(&mut self) -> Option<Event>;

    fn scale_factor(&self) -> f64;
    fn physical_size(&self) -> (u32, u32);
}

/// the returned window is realized, its window handle is available right away.
pub fn create_window(attrs: WindowAttrs) -> anyhow::Result<Box<dyn Window>> {
    let window = backend_winit::WinitBackend::new(attrs)?;
    Ok(Box::new(window))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_attrs_defaults() {
        let attrs = WindowAttrs::default();
        assert_eq!(attrs.logical_size, None);
        assert_eq!(attrs.title, "First OpenGL program");
        assert!(attrs.resizable);
    }

    #[test]
    fn window_attrs_builders() {
        let attrs = WindowAttrs::default()
            .with_logical_size((1024, 768))
            .with_title("vertex color")
            .with_resizable(false);
        assert_eq!(attrs.logical_size, Some((1024, 768)));
        assert_eq!(attrs.title, "vertex color");
        assert!(!attrs.resizable);
    }
}
