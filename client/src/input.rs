//! Key-to-intent state machine over the currently held movement keys.

use shared::{Direction, MoveDirection};

/// The only recognized movement keys. Everything else never reaches the
/// router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrowKey {
    Up,
    Down,
    Left,
    Right,
}

impl ArrowKey {
    pub fn direction(self) -> MoveDirection {
        match self {
            ArrowKey::Up => MoveDirection::Up,
            ArrowKey::Down => MoveDirection::Down,
            ArrowKey::Left => MoveDirection::Left,
            ArrowKey::Right => MoveDirection::Right,
        }
    }
}

/// Outbound movement intent for the sync channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Move(MoveDirection),
    Stop,
}

/// What a key-down produced: immediate local facing feedback plus the
/// intent to forward. Facing changes before any server confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyOutcome {
    pub facing: Direction,
    pub intent: Intent,
}

/// Held keys in press order, oldest first. The order matters: repeat
/// cadence targets the most recently pressed key only, matching platform
/// key repeat.
#[derive(Debug, Default)]
pub struct InputRouter {
    held: Vec<ArrowKey>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform key repeat re-enters here for an already held key and
    /// re-emits the move intent; the server reads that as continued motion.
    /// A re-entrant press keeps the key's original position in the order.
    pub fn key_down(&mut self, key: ArrowKey) -> KeyOutcome {
        if !self.held.contains(&key) {
            self.held.push(key);
        }
        let direction = key.direction();
        KeyOutcome {
            facing: direction.facing(),
            intent: Intent::Move(direction),
        }
    }

    /// Emits a stop only when the last held key is released. A key-up for a
    /// key we no longer track (cleared by focus loss) emits nothing.
    pub fn key_up(&mut self, key: ArrowKey) -> Option<Intent> {
        let Some(index) = self.held.iter().position(|held| *held == key) else {
            return None;
        };
        self.held.remove(index);
        if self.held.is_empty() {
            Some(Intent::Stop)
        } else {
            None
        }
    }

    /// Focus loss drops every held key. Without this, a key-up delivered
    /// while unfocused would be missed and the participant would keep
    /// moving forever.
    pub fn focus_lost(&mut self) -> Option<Intent> {
        if self.held.is_empty() {
            return None;
        }
        self.held.clear();
        Some(Intent::Stop)
    }

    pub fn is_held(&self, key: ArrowKey) -> bool {
        self.held.contains(&key)
    }

    /// The most recently pressed key still held, the one platform key
    /// repeat would fire for.
    pub fn latest(&self) -> Option<ArrowKey> {
        self.held.last().copied()
    }

    pub fn is_idle(&self) -> bool {
        self.held.is_empty()
    }
}
