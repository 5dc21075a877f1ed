use std::collections::HashSet;

// keyboard
// ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKey {
    /// platform specific code of a key that does not have a [`Scancode`] variant.
    Native(u32),
    Unidentified,
}

/// Scancode corresponds to the physical key pressed on the keyboard, regardless of the keyboard
/// layout.
///
/// https://github.com/torvalds/linux/blob/231825b2e1ff6ba799c5eaf396d3ab2354e37c6b/include/uapi/linux/input-event-codes.h#L76
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum Scancode {
    Esc,                    // KEY_ESC               1
    Unidentified(RawKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub state: KeyState,
    pub scancode: Scancode,
}

// states
// ----

#[derive(Debug, Default)]
pub struct KeyboardState {
    pressed: HashSet<Scancode>,
}

impl KeyboardState {
    #[inline]
    pub fn handle_event(&mut self, ev: KeyboardEvent) {
        match ev.state {
            KeyState::Pressed => {
                self.pressed.insert(ev.scancode);
            }
            KeyState::Released => {
                self.pressed.remove(&ev.scancode);
            }
        }
    }

    /// the "is the key held right now" query that polling-style hosts expose.
    #[inline]
    pub fn key_state(&self, scancode: Scancode) -> KeyState {
        if self.pressed.contains(&scancode) {
            KeyState::Pressed
        } else {
            KeyState::Released
        }
    }
}

#[derive(Debug, Default)]
pub struct State {
    pub keyboard: KeyboardState,
}

impl State {
    pub fn handle_events(&mut self, events: impl Iterator<Item = KeyboardEvent>) {
        for event in events {
            self.keyboard.handle_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(state: KeyState, scancode: Scancode) -> KeyboardEvent {
        KeyboardEvent { state, scancode }
    }

    #[test]
    fn press_is_held_until_release() {
        let mut state = State::default();

        state.handle_events([key(KeyState::Pressed, Scancode::Esc)].into_iter());
        assert_eq!(state.keyboard.key_state(Scancode::Esc), KeyState::Pressed);

        // no new events: the key is still down.
        state.handle_events(std::iter::empty());
        assert_eq!(state.keyboard.key_state(Scancode::Esc), KeyState::Pressed);

        state.handle_events([key(KeyState::Released, Scancode::Esc)].into_iter());
        assert_eq!(state.keyboard.key_state(Scancode::Esc), KeyState::Released);
    }

    #[test]
    fn press_and_release_within_one_batch() {
        let mut state = State::default();
        state.handle_events(
            [
                key(KeyState::Pressed, Scancode::Esc),
                key(KeyState::Released, Scancode::Esc),
            ]
            .into_iter(),
        );
        assert_eq!(state.keyboard.key_state(Scancode::Esc), KeyState::Released);
    }

    #[test]
    fn repeated_press_needs_one_release() {
        let mut state = State::default();
        state.handle_events([key(KeyState::Pressed, Scancode::Esc)].repeat(3).into_iter());
        state.handle_events([key(KeyState::Released, Scancode::Esc)].into_iter());
        assert_eq!(state.keyboard.key_state(Scancode::Esc), KeyState::Released);
    }

    #[test]
    fn unknown_keys_are_tracked_separately() {
        let mut state = State::default();
        let other = Scancode::Unidentified(RawKey::Native(183));
        state.handle_events([key(KeyState::Pressed, other)].into_iter());
        assert_eq!(state.keyboard.key_state(Scancode::Esc), KeyState::Released);
        assert_eq!(state.keyboard.key_state(other), KeyState::Pressed);
        assert_eq!(
            state
                .keyboard
                .key_state(Scancode::Unidentified(RawKey::Native(184))),
            KeyState::Released
        );
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut state = State::default();
        state.handle_events([key(KeyState::Released, Scancode::Esc)].into_iter());
        assert_eq!(state.keyboard.key_state(Scancode::Esc), KeyState::Released);
    }
}
