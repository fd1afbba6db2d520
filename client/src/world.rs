//! The world snapshot: the single source of truth the compositor reads.
//! Mutated only by sync events and the local-input facing echo.

use shared::{Direction, PlayerUpdate};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Participant {
    pub username: String,
    pub x: f32,
    pub y: f32,
    pub facing: Direction,
    pub animation_frame: u32,
    pub avatar: Option<String>,
}

impl Participant {
    /// Shallow merge: fields absent from the patch keep their value.
    pub fn apply(&mut self, patch: &PlayerUpdate) {
        if let Some(username) = &patch.username {
            self.username = username.clone();
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(facing) = patch.facing {
            self.facing = facing;
        }
        if let Some(frame) = patch.animation_frame {
            self.animation_frame = frame;
        }
        if let Some(avatar) = &patch.avatar {
            self.avatar = Some(avatar.clone());
        }
    }

    pub fn label(&self) -> &str {
        if self.username.is_empty() {
            "Player"
        } else {
            &self.username
        }
    }
}

/// Participant records keyed by server-assigned opaque id. Exactly one id is
/// the local participant; it points into the same map, so authoritative
/// updates to it need no separate mirroring.
#[derive(Debug, Default)]
pub struct WorldState {
    participants: HashMap<String, Participant>,
    local_id: Option<String>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole participant set (join acknowledgement).
    pub fn replace_all(&mut self, players: HashMap<String, PlayerUpdate>) {
        self.participants = players
            .into_iter()
            .map(|(id, update)| {
                let mut participant = Participant::default();
                participant.apply(&update);
                (id, participant)
            })
            .collect();
    }

    /// Merges a partial update, creating the record when absent.
    pub fn merge(&mut self, id: &str, patch: &PlayerUpdate) {
        self.participants.entry(id.to_string()).or_default().apply(patch);
    }

    /// Inserts or overwrites a full record (participant joined).
    pub fn insert(&mut self, id: String, update: &PlayerUpdate) {
        let mut participant = Participant::default();
        participant.apply(update);
        self.participants.insert(id, participant);
    }

    /// Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        self.participants.remove(id).is_some()
    }

    pub fn set_local_id(&mut self, id: Option<String>) {
        self.local_id = id;
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn local(&self) -> Option<&Participant> {
        self.local_id.as_ref().and_then(|id| self.participants.get(id))
    }

    pub fn local_mut(&mut self) -> Option<&mut Participant> {
        match &self.local_id {
            Some(id) => self.participants.get_mut(id),
            None => None,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Back-to-front draw order: ascending world y, so a participant lower
    /// on screen draws over those behind it. Tie order is unspecified.
    pub fn depth_sorted(&self) -> Vec<(&str, &Participant)> {
        let mut ordered: Vec<(&str, &Participant)> = self
            .participants
            .iter()
            .map(|(id, participant)| (id.as_str(), participant))
            .collect();
        ordered.sort_by(|a, b| a.1.y.total_cmp(&b.1.y));
        ordered
    }
}
