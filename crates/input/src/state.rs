use glam::Vec2;
use std::collections::HashSet;

use crate::key::Key;

/// Read/write view of the window and input devices.
pub trait InputSource {
    fn is_down(&self, key: Key) -> bool;

    /// Cursor position in window pixels.
    fn cursor_position(&self) -> Vec2;

    fn cursor_visible(&self) -> bool;

    fn focused(&self) -> bool;

    /// Warp the cursor to the centre of the window.
    fn center_cursor(&mut self);
}

/// In-memory input state, fed by a windowing layer or a test script.
#[derive(Debug, Clone)]
pub struct InputState {
    keys: HashSet<Key>,
    cursor: Vec2,
    cursor_visible: bool,
    focused: bool,
    window_center: Vec2,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            keys: HashSet::new(),
            cursor: Vec2::ZERO,
            cursor_visible: true,
            focused: true,
            window_center: Vec2::ZERO,
        }
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a window of the given size, cursor parked at its centre.
    pub fn for_window(width: f32, height: f32) -> Self {
        let center = Vec2::new(width / 2.0, height / 2.0);
        Self {
            cursor: center,
            window_center: center,
            ..Self::default()
        }
    }

    pub fn press(&mut self, key: Key) {
        self.keys.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.keys.remove(&key);
    }

    pub fn release_all(&mut self) {
        self.keys.clear();
    }

    pub fn set_cursor(&mut self, position: Vec2) {
        self.cursor = position;
    }

    /// Hide the cursor and capture it for mouse look, or give it back.
    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn window_center(&self) -> Vec2 {
        self.window_center
    }
}

impl InputSource for InputState {
    fn is_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    fn cursor_position(&self) -> Vec2 {
        self.cursor
    }

    fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn center_cursor(&mut self) {
        tracing::trace!(x = self.window_center.x, y = self.window_center.y, "cursor recentred");
        self.cursor = self.window_center;
    }
}
