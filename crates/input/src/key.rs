use serde::{Deserialize, Serialize};

/// Keys the freelook controller listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Move forward.
    W,
    /// Strafe left.
    A,
    /// Move backward.
    S,
    /// Strafe right.
    D,
    /// Rise.
    Q,
    /// Sink.
    E,
}

impl Key {
    pub const ALL: [Key; 6] = [Key::W, Key::A, Key::S, Key::D, Key::Q, Key::E];
}
