use glam::Vec2;

/// A high-level viewer action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Orbit the camera by a pointer delta in pixels.
    Orbit(Vec2),
    /// Zoom; positive moves closer.
    Zoom(f32),
    /// Drop manual control and return to the automatic fly-around.
    ResetCamera,
    /// Show or hide the settings panel.
    TogglePanel,
    /// Freeze or resume simulation time.
    TogglePause,
    /// Rebuild the scene at time zero.
    ResetScene,
    /// No-op (used for input mapping that hasn't been bound yet).
    Noop,
}

/// Keys the viewer cares about. Hosts translate their native key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    R,
    F1,
    Space,
    Backspace,
    Other,
}

pub fn action_for_key(key: Key) -> Action {
    match key {
        Key::R => Action::ResetCamera,
        Key::F1 => Action::TogglePanel,
        Key::Space => Action::TogglePause,
        Key::Backspace => Action::ResetScene,
        Key::Other => Action::Noop,
    }
}

/// `lines` is the wheel delta in lines, positive away from the user.
pub fn action_for_scroll(lines: f32) -> Action {
    if lines.is_finite() && lines != 0.0 {
        Action::Zoom(lines)
    } else {
        Action::Noop
    }
}

/// Turns button presses and cursor positions into orbit deltas.
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pressed: bool,
    last: Option<Vec2>,
}

impl DragState {
    pub fn press(&mut self) {
        self.pressed = true;
    }

    pub fn release(&mut self) {
        self.pressed = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.pressed
    }

    /// Record a cursor position; yields an orbit while the button is held.
    pub fn moved(&mut self, position: Vec2) -> Action {
        let previous = self.last.replace(position);
        match previous {
            Some(prev) if self.pressed => {
                let delta = position - prev;
                if delta == Vec2::ZERO {
                    Action::Noop
                } else {
                    Action::Orbit(delta)
                }
            }
            _ => Action::Noop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_bindings() {
        assert_eq!(action_for_key(Key::R), Action::ResetCamera);
        assert_eq!(action_for_key(Key::F1), Action::TogglePanel);
        assert_eq!(action_for_key(Key::Space), Action::TogglePause);
        assert_eq!(action_for_key(Key::Other), Action::Noop);
    }

    #[test]
    fn scroll_maps_to_zoom() {
        assert_eq!(action_for_scroll(2.0), Action::Zoom(2.0));
        assert_eq!(action_for_scroll(0.0), Action::Noop);
        assert_eq!(action_for_scroll(f32::NAN), Action::Noop);
    }

    #[test]
    fn drag_only_while_pressed() {
        let mut drag = DragState::default();
        assert_eq!(drag.moved(Vec2::new(10.0, 10.0)), Action::Noop);
        assert_eq!(drag.moved(Vec2::new(20.0, 10.0)), Action::Noop);

        drag.press();
        assert_eq!(
            drag.moved(Vec2::new(25.0, 5.0)),
            Action::Orbit(Vec2::new(5.0, -5.0))
        );

        drag.release();
        assert!(!drag.is_dragging());
        assert_eq!(drag.moved(Vec2::new(100.0, 100.0)), Action::Noop);
    }

    #[test]
    fn first_move_after_press_has_no_jump() {
        let mut drag = DragState::default();
        drag.press();
        assert_eq!(drag.moved(Vec2::new(300.0, 200.0)), Action::Noop);
        assert_eq!(drag.moved(Vec2::new(300.0, 200.0)), Action::Noop);
    }
}
