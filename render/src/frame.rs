use gl::Apier;
use input::Scancode;

use crate::Host;
use crate::program::ShaderProgram;
use crate::vertex::VertexBuffer;

pub const BACKGROUND_COLOR: [f32; 4] = [0.2, 0.3, 0.3, 1.0];
pub const EXIT_KEY: Scancode = Scancode::Esc;

/// maps time onto 0..=1; 0.5 at t = 0.
/// only the result is narrowed to f32; `seconds` may be days.
#[inline]
pub fn oscillate(seconds: f64) -> f32 {
    ((seconds.sin() / 2.0) + 0.5) as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    ExitRequested,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub index: u64,
    pub elapsed: f64,
    pub channel: f32,
}

pub struct FrameLoop<'a, A: Apier> {
    program: &'a ShaderProgram<A>,
    mesh: &'a VertexBuffer<A>,
    time_uniform: Option<&'a str>,
    state: LoopState,
    frames: u64,
}

impl<'a, A: Apier> FrameLoop<'a, A> {
    pub fn new(
        program: &'a ShaderProgram<A>,
        mesh: &'a VertexBuffer<A>,
        time_uniform: Option<&'a str>,
    ) -> Self {
        Self {
            program,
            mesh,
            time_uniform,
            state: LoopState::Running,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn transition(&mut self, to: LoopState) {
        log::info!("frame loop: {:?} -> {:?} (frame {})", self.state, to, self.frames);
        self.state = to;
    }

    /// advances the exit state machine. returns true while frames should be drawn.
    pub fn check_exit(&mut self, host: &impl Host) -> bool {
        match self.state {
            LoopState::Running if host.should_close() => {
                self.transition(LoopState::ExitRequested);
                self.transition(LoopState::Terminated);
            }
            LoopState::ExitRequested => self.transition(LoopState::Terminated),
            _ => {}
        }
        self.state == LoopState::Running
    }

    /// draws one frame. does nothing once the loop is no longer running.
    pub fn iterate(&mut self, api: &A, host: &mut impl Host) -> anyhow::Result<()> {
        if self.state != LoopState::Running {
            return Ok(());
        }

        let elapsed = host.elapsed().as_secs_f64();
        let frame = FrameState {
            index: self.frames,
            elapsed,
            channel: oscillate(elapsed),
        };
        log::trace!("{frame:?}");

        if let Some(name) = self.time_uniform {
            self.program
                .set_uniform_4f(api, name, [0.0, frame.channel, 0.0, 1.0]);
        }

        unsafe {
            let [r, g, b, a] = BACKGROUND_COLOR;
            api.clear_color(r, g, b, a);
            api.clear(gl::COLOR_BUFFER_BIT);
        }

        host.poll_events()?;
        if let Some((width, height)) = host.take_resize() {
            log::debug!("viewport {width}x{height}");
            unsafe { api.viewport(0, 0, width as gl::GLsizei, height as gl::GLsizei) };
        }
        if host.key_pressed(EXIT_KEY) {
            host.set_should_close(true);
        }
        if host.should_close() {
            self.transition(LoopState::ExitRequested);
        }

        unsafe {
            api.draw_arrays(gl::TRIANGLES, 0, self.mesh.vertex_count() as gl::GLsizei);
        }
        host.swap_buffers()?;

        self.frames += 1;
        Ok(())
    }

    /// runs until exit was requested. returns the number of frames drawn.
    pub fn run(&mut self, api: &A, host: &mut impl Host) -> anyhow::Result<u64> {
        while self.check_exit(&*host) {
            self.iterate(api, host)?;
        }
        Ok(self.frames)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gl::headless::{Call, HeadlessApi};
    use input::KeyState;

    use super::*;
    use crate::{Scene, SceneResources};

    /// host that replays a fixed script, one entry per poll.
    #[derive(Default)]
    struct ScriptedHost {
        polls: usize,
        esc_at: Option<usize>,
        close_at: Option<usize>,
        resize_at: Option<(usize, (u32, u32))>,
        esc_down: bool,
        should_close: bool,
        pending_resize: Option<(u32, u32)>,
        swaps: usize,
        start_offset: Duration,
        frame_time: Duration,
    }

    impl Host for ScriptedHost {
        fn poll_events(&mut self) -> anyhow::Result<()> {
            self.polls += 1;
            if self.esc_at == Some(self.polls) {
                self.esc_down = true;
            }
            if self.close_at == Some(self.polls) {
                self.should_close = true;
            }
            if let Some((at, size)) = self.resize_at {
                if at == self.polls {
                    self.pending_resize = Some(size);
                }
            }
            Ok(())
        }

        fn key_state(&self, scancode: Scancode) -> KeyState {
            if scancode == Scancode::Esc && self.esc_down {
                KeyState::Pressed
            } else {
                KeyState::Released
            }
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
            self.swaps += 1;
            Ok(())
        }

        fn elapsed(&self) -> Duration {
            self.start_offset + self.frame_time * self.polls as u32
        }
    }

    fn setup(api: &HeadlessApi, scene: &Scene) -> SceneResources<HeadlessApi> {
        let resources = scene.setup(api).unwrap();
        assert!(resources.program.linked());
        api.take_calls();
        resources
    }

    #[test]
    fn oscillate_is_half_at_zero() {
        assert_eq!(oscillate(0.0), 0.5);
        let t = 1.25_f64;
        assert_eq!(oscillate(t), ((t.sin() / 2.0) + 0.5) as f32);
        assert!((oscillate(std::f64::consts::FRAC_PI_2) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn esc_terminates_after_current_frame() {
        let api = HeadlessApi::new();
        let scene = Scene::triangle();
        let resources = setup(&api, &scene);

        let mut host = ScriptedHost {
            esc_at: Some(4),
            ..Default::default()
        };
        let mut frame_loop = FrameLoop::new(&resources.program, &resources.mesh, None);
        let frames = frame_loop.run(&api, &mut host).unwrap();

        assert_eq!(frames, 4);
        assert_eq!(frame_loop.state(), LoopState::Terminated);
        assert_eq!(api.draw_calls().len(), 4);
        assert_eq!(host.swaps, 4);
        assert!(host.should_close);

        frame_loop.iterate(&api, &mut host).unwrap();
        assert!(!frame_loop.check_exit(&host));
        assert_eq!(api.draw_calls().len(), 4);
    }

    #[test]
    fn close_request_terminates_like_esc() {
        let api = HeadlessApi::new();
        let scene = Scene::triangle();
        let resources = setup(&api, &scene);

        let mut host = ScriptedHost {
            close_at: Some(2),
            ..Default::default()
        };
        let mut frame_loop = FrameLoop::new(&resources.program, &resources.mesh, None);
        assert_eq!(frame_loop.run(&api, &mut host).unwrap(), 2);
        assert_eq!(frame_loop.state(), LoopState::Terminated);
    }

    #[test]
    fn close_before_first_frame_draws_nothing() {
        let api = HeadlessApi::new();
        let scene = Scene::triangle();
        let resources = setup(&api, &scene);

        let mut host = ScriptedHost {
            should_close: true,
            ..Default::default()
        };
        let mut frame_loop = FrameLoop::new(&resources.program, &resources.mesh, None);
        assert_eq!(frame_loop.run(&api, &mut host).unwrap(), 0);
        assert!(api.draw_calls().is_empty());
    }

    #[test]
    fn triangle_frame_sequence() {
        let api = HeadlessApi::new();
        let scene = Scene::triangle();
        let resources = setup(&api, &scene);

        let mut host = ScriptedHost::default();
        let mut frame_loop = FrameLoop::new(&resources.program, &resources.mesh, None);
        frame_loop.iterate(&api, &mut host).unwrap();

        assert_eq!(
            api.calls(),
            vec![
                Call::ClearColor(BACKGROUND_COLOR),
                Call::Clear(gl::COLOR_BUFFER_BIT),
                Call::DrawArrays {
                    mode: gl::TRIANGLES,
                    first: 0,
                    count: 3,
                    program: Some(resources.program.handle()),
                    vertex_array: Some(resources.mesh.vertex_array()),
                },
            ]
        );
        assert_eq!(host.swaps, 1);
        assert_eq!(unsafe { api.get_error() }, None);
    }

    #[test]
    fn time_uniform_is_pushed_before_clear() {
        let api = HeadlessApi::new();
        let scene = Scene::vertex_color();
        let resources = setup(&api, &scene);

        let mut host = ScriptedHost {
            frame_time: Duration::from_millis(500),
            ..Default::default()
        };
        let mut frame_loop =
            FrameLoop::new(&resources.program, &resources.mesh, scene.time_uniform);
        // elapsed is 0 before the first poll.
        frame_loop.iterate(&api, &mut host).unwrap();
        frame_loop.iterate(&api, &mut host).unwrap();

        let calls = api.calls();
        let location = *resources.program.uniform_location("ourColor").unwrap();
        assert_eq!(
            calls[0],
            Call::Uniform4f {
                program: resources.program.handle(),
                location,
                value: [0.0, 0.5, 0.0, 1.0],
            }
        );
        assert_eq!(calls[1], Call::ClearColor(BACKGROUND_COLOR));

        let second = calls
            .iter()
            .filter_map(|call| match call {
                Call::Uniform4f { value, .. } => Some(*value),
                _ => None,
            })
            .nth(1)
            .unwrap();
        assert_eq!(second, [0.0, oscillate(0.5), 0.0, 1.0]);

        let Some(Call::DrawArrays { count, .. }) = api.draw_calls().pop() else {
            panic!("no draw call");
        };
        assert_eq!(count, 6);
        assert_eq!(unsafe { api.get_error() }, None);
    }

    #[test]
    fn time_uniform_keeps_moving_after_days() {
        let api = HeadlessApi::new();
        let scene = Scene::vertex_color();
        let resources = setup(&api, &scene);

        let start_offset = Duration::from_secs(3 * 24 * 60 * 60);
        let frame_time = Duration::from_millis(1);
        let mut host = ScriptedHost {
            start_offset,
            frame_time,
            ..Default::default()
        };
        let mut frame_loop =
            FrameLoop::new(&resources.program, &resources.mesh, scene.time_uniform);
        frame_loop.iterate(&api, &mut host).unwrap();
        frame_loop.iterate(&api, &mut host).unwrap();

        let values = api
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Uniform4f { value, .. } => Some(value[1]),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], oscillate(start_offset.as_secs_f64()));
        assert_eq!(values[1], oscillate((start_offset + frame_time).as_secs_f64()));
        assert_ne!(values[0], values[1]);
    }

    #[test]
    fn resize_updates_viewport_before_draw() {
        let api = HeadlessApi::new();
        let scene = Scene::triangle();
        let resources = setup(&api, &scene);

        let mut host = ScriptedHost {
            resize_at: Some((1, (1024, 768))),
            ..Default::default()
        };
        let mut frame_loop = FrameLoop::new(&resources.program, &resources.mesh, None);
        frame_loop.iterate(&api, &mut host).unwrap();

        let calls = api.calls();
        let viewport = calls
            .iter()
            .position(|call| {
                *call
                    == Call::Viewport {
                        x: 0,
                        y: 0,
                        width: 1024,
                        height: 768,
                    }
            })
            .expect("viewport was not updated");
        let draw = calls
            .iter()
            .position(|call| matches!(call, Call::DrawArrays { .. }))
            .unwrap();
        assert!(viewport < draw);
    }
}
