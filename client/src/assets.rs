//! Avatar frame cache. Registration is first-wins per avatar id, lookups
//! degrade through fallback directions, and west aliases the east sequence
//! instead of owning frames of its own.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::warn;
use macroquad::experimental::coroutines::start_coroutine;
use macroquad::texture::{load_texture, Texture2D};
use shared::{Direction, FrameUrls};

use crate::scheduler::DirtyFlag;

/// One frame image. Created pending and fulfilled when the underlying asset
/// finishes loading; until then the participant renders as a placeholder.
#[derive(Clone)]
pub struct FrameHandle {
    url: String,
    texture: Arc<Mutex<Option<Texture2D>>>,
}

impl FrameHandle {
    pub fn pending(url: &str) -> Self {
        FrameHandle {
            url: url.to_string(),
            texture: Arc::new(Mutex::new(None)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn texture(&self) -> Option<Texture2D> {
        self.texture.lock().unwrap().clone()
    }

    pub fn fulfill(&self, texture: Texture2D) {
        *self.texture.lock().unwrap() = Some(texture);
    }

    pub fn is_loaded(&self) -> bool {
        self.texture.lock().unwrap().is_some()
    }

    /// Whether two handles resolve through one backing slot, as a west
    /// lookup does with its east frame.
    pub fn shares_slot(&self, other: &FrameHandle) -> bool {
        Arc::ptr_eq(&self.texture, &other.texture)
    }
}

/// Boundary for fetching frame images; the engine never fetches directly.
pub trait FrameLoader {
    fn load(&self, url: &str) -> FrameHandle;
}

/// Production loader: resolves frames through macroquad's async asset
/// loader on the main-thread coroutine runner, invalidating the view when a
/// texture arrives.
pub struct TextureLoader {
    dirty: DirtyFlag,
}

impl TextureLoader {
    pub fn new(dirty: DirtyFlag) -> Self {
        TextureLoader { dirty }
    }
}

impl FrameLoader for TextureLoader {
    fn load(&self, url: &str) -> FrameHandle {
        let handle = FrameHandle::pending(url);
        let slot = handle.clone();
        let dirty = self.dirty.clone();
        let url = url.to_string();
        start_coroutine(async move {
            match load_texture(&url).await {
                Ok(texture) => {
                    slot.fulfill(texture);
                    dirty.mark();
                }
                // A failed frame stays pending forever; the compositor
                // keeps drawing the placeholder glyph for it.
                Err(err) => warn!("failed to load frame {}: {}", url, err),
            }
        });
        handle
    }
}

struct DirectionalFrames {
    north: Vec<FrameHandle>,
    south: Vec<FrameHandle>,
    east: Vec<FrameHandle>,
}

impl DirectionalFrames {
    /// West consults the east frames; the compositor applies the mirror.
    /// A direction with no frames falls back to south, then east.
    fn sequence(&self, facing: Direction) -> &[FrameHandle] {
        let primary: &[FrameHandle] = match facing {
            Direction::North => &self.north,
            Direction::South => &self.south,
            Direction::East | Direction::West => &self.east,
        };
        if !primary.is_empty() {
            primary
        } else if !self.south.is_empty() {
            &self.south
        } else {
            &self.east
        }
    }
}

#[derive(Default)]
pub struct AvatarAssetCache {
    avatars: HashMap<String, DirectionalFrames>,
}

impl AvatarAssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// First registration wins; re-registering an id is a no-op, so frames
    /// already on screen never flicker through a refetch. An empty id is
    /// ignored.
    pub fn register(&mut self, avatar_id: &str, frames: &FrameUrls, loader: &dyn FrameLoader) {
        if avatar_id.is_empty() || self.avatars.contains_key(avatar_id) {
            return;
        }
        let fetch =
            |urls: &[String]| -> Vec<FrameHandle> { urls.iter().map(|url| loader.load(url)).collect() };
        self.avatars.insert(
            avatar_id.to_string(),
            DirectionalFrames {
                north: fetch(&frames.north),
                south: fetch(&frames.south),
                east: fetch(&frames.east),
            },
        );
    }

    pub fn contains(&self, avatar_id: &str) -> bool {
        self.avatars.contains_key(avatar_id)
    }

    /// Resolves the frame to draw, clamping the index into the sequence.
    /// `None` means the compositor draws the placeholder.
    pub fn lookup(
        &self,
        avatar_id: &str,
        facing: Direction,
        frame_index: u32,
    ) -> Option<&FrameHandle> {
        let set = self.avatars.get(avatar_id)?;
        let sequence = set.sequence(facing);
        if sequence.is_empty() {
            return None;
        }
        let index = (frame_index as usize).min(sequence.len() - 1);
        Some(&sequence[index])
    }
}
