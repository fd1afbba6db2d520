//! Per-frame orchestration: drains the two event sources, feeds the input
//! router, and answers the paint callback.

use log::{error, info};
use macroquad::prelude::*;

use shared::ClientMessage;

use crate::assets::{AvatarAssetCache, FrameHandle, FrameLoader};
use crate::camera;
use crate::compositor;
use crate::input::{ArrowKey, InputRouter, Intent};
use crate::network::{apply_incoming, NetEvent, SyncChannel};
use crate::scheduler::RenderScheduler;
use crate::viewport::Viewport;
use crate::world::WorldState;

/// Re-emit cadence for held keys, standing in for platform key repeat. The
/// server treats repeated move intents as continued motion.
const KEY_REPEAT_SECS: f64 = 0.11;

/// The one place key codes map to movement keys.
const ARROWS: [(KeyCode, ArrowKey); 4] = [
    (KeyCode::Up, ArrowKey::Up),
    (KeyCode::Down, ArrowKey::Down),
    (KeyCode::Left, ArrowKey::Left),
    (KeyCode::Right, ArrowKey::Right),
];

/// The single mutable context. Created at startup, torn down on exit; every
/// handler runs to completion on the main loop, so nothing here needs a
/// lock.
pub struct App {
    pub world: WorldState,
    pub assets: AvatarAssetCache,
    pub viewport: Viewport,
    pub scheduler: RenderScheduler,
    pub router: InputRouter,
    pub channel: SyncChannel,
    background: FrameHandle,
    username: String,
    last_repeat: f64,
}

impl App {
    pub fn new(
        channel: SyncChannel,
        scheduler: RenderScheduler,
        background: FrameHandle,
        username: String,
    ) -> Self {
        App {
            world: WorldState::new(),
            assets: AvatarAssetCache::new(),
            viewport: Viewport::new(),
            scheduler,
            router: InputRouter::new(),
            channel,
            background,
            username,
            last_repeat: 0.0,
        }
    }

    /// Applies everything the sync channel produced since the last frame.
    pub fn pump_network(&mut self, loader: &dyn FrameLoader) {
        for event in self.channel.poll() {
            match event {
                NetEvent::Opened => {
                    info!("channel open; joining as {}", self.username);
                    self.channel.send(&ClientMessage::JoinGame {
                        username: self.username.clone(),
                    });
                }
                NetEvent::Inbound(incoming) => {
                    if apply_incoming(incoming, &mut self.world, &mut self.assets, loader) {
                        self.scheduler.invalidate();
                    }
                }
                NetEvent::Closed => {
                    // No reconnect: the view freezes at the last snapshot.
                    info!("channel closed");
                }
                NetEvent::Error(err) => error!("transport error: {}", err),
            }
        }
    }

    /// Samples the keyboard. Held keys the platform no longer reports as
    /// down are released here too, which covers key-ups lost while the
    /// window was unfocused.
    pub fn poll_keys(&mut self) {
        for (code, key) in ARROWS {
            if is_key_pressed(code) {
                self.key_down(key);
            }
        }

        for (code, key) in ARROWS {
            if self.router.is_held(key) && !is_key_down(code) {
                self.key_up(key);
            }
        }

        self.pump_repeats();
    }

    fn pump_repeats(&mut self) {
        if let Some(key) = self.repeat_due(get_time()) {
            self.send_intent(Intent::Move(key.direction()));
        }
    }

    /// Cadence gate for held-key re-emits. Only the most recently pressed
    /// key repeats, and the repeat carries no facing echo and schedules no
    /// paint.
    fn repeat_due(&mut self, now: f64) -> Option<ArrowKey> {
        let Some(key) = self.router.latest() else {
            self.last_repeat = now;
            return None;
        };
        if now - self.last_repeat < KEY_REPEAT_SECS {
            return None;
        }
        self.last_repeat = now;
        Some(key)
    }

    /// Optimistic local feedback: facing turns immediately, the move intent
    /// goes out, and the authoritative position arrives later.
    pub fn key_down(&mut self, key: ArrowKey) {
        let outcome = self.router.key_down(key);
        if let Some(me) = self.world.local_mut() {
            me.facing = outcome.facing;
        }
        self.scheduler.invalidate();
        self.send_intent(outcome.intent);
    }

    pub fn key_up(&mut self, key: ArrowKey) {
        if let Some(intent) = self.router.key_up(key) {
            self.send_intent(intent);
        }
    }

    pub fn focus_lost(&mut self) {
        if let Some(intent) = self.router.focus_lost() {
            self.send_intent(intent);
        }
    }

    fn send_intent(&self, intent: Intent) {
        let msg = match intent {
            Intent::Move(direction) => ClientMessage::Move { direction },
            Intent::Stop => ClientMessage::Stop,
        };
        self.channel.send(&msg);
    }

    /// Body of the per-refresh paint callback.
    pub fn frame(&mut self) {
        let dpr = macroquad::miniquad::window::dpi_scale();
        if self.viewport.resize(screen_width(), screen_height(), dpr) {
            self.scheduler.invalidate();
        }

        if !self.scheduler.take_paint() {
            return;
        }

        let world_size = self
            .background
            .texture()
            .map(|texture| (texture.width(), texture.height()))
            .unwrap_or((0.0, 0.0));
        let focus = self
            .world
            .local()
            .map(|me| (me.x, me.y))
            .unwrap_or((0.0, 0.0));
        let offset = camera::compute_offset(world_size, self.viewport.size(), focus);

        compositor::render(&self.world, offset, &self.assets, &self.background);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Direction, PlayerUpdate};

    /// A channel pointed at a freed port stays inert; sends are dropped.
    fn test_app() -> App {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        App::new(
            SyncChannel::connect(&addr.to_string()),
            RenderScheduler::new(),
            FrameHandle::pending("world.jpg"),
            "Sean".to_string(),
        )
    }

    fn seed_local(app: &mut App) {
        app.world.merge(
            "p1",
            &PlayerUpdate {
                x: Some(0.0),
                y: Some(0.0),
                ..Default::default()
            },
        );
        app.world.set_local_id(Some("p1".to_string()));
    }

    #[test]
    fn test_repeat_targets_most_recent_key_only() {
        let mut app = test_app();
        app.key_down(ArrowKey::Up);
        app.key_down(ArrowKey::Right);

        assert_eq!(app.repeat_due(1.0), Some(ArrowKey::Right));
        // Inside the cadence window nothing fires.
        assert_eq!(app.repeat_due(1.05), None);
        assert_eq!(app.repeat_due(1.2), Some(ArrowKey::Right));
    }

    #[test]
    fn test_repeat_leaves_facing_from_last_press() {
        let mut app = test_app();
        seed_local(&mut app);
        app.key_down(ArrowKey::Up);
        app.key_down(ArrowKey::Right);
        assert_eq!(app.world.local().unwrap().facing, Direction::East);

        app.repeat_due(1.0);
        assert_eq!(app.world.local().unwrap().facing, Direction::East);
    }

    #[test]
    fn test_repeat_schedules_no_paint() {
        let mut app = test_app();
        app.key_down(ArrowKey::Right);
        assert!(app.scheduler.take_paint());

        assert_eq!(app.repeat_due(1.0), Some(ArrowKey::Right));
        assert!(!app.scheduler.take_paint());
    }

    #[test]
    fn test_idle_resets_the_cadence_clock() {
        let mut app = test_app();
        assert_eq!(app.repeat_due(5.0), None);

        // A press right after idling does not fire instantly.
        app.key_down(ArrowKey::Down);
        assert_eq!(app.repeat_due(5.05), None);
        assert_eq!(app.repeat_due(5.2), Some(ArrowKey::Down));
    }
}
