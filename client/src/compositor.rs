//! Frame production: background, depth-sorted avatars, name labels.
//! Missing data always degrades to a placeholder; nothing here can fail.

use macroquad::prelude::*;

use shared::Direction;

use crate::assets::{AvatarAssetCache, FrameHandle};
use crate::camera::CameraOffset;
use crate::world::WorldState;

pub const PLACEHOLDER_RADIUS: f32 = 16.0;

const LABEL_FONT_SIZE: u16 = 14;
const LABEL_PADDING_X: f32 = 6.0;
const LABEL_HEIGHT: f32 = 18.0;
const LABEL_LIFT: f32 = 24.0;

/// Draws one frame from the snapshot. Side effects only; the camera offset
/// is the world-to-screen translation.
pub fn render(
    world: &WorldState,
    camera: CameraOffset,
    assets: &AvatarAssetCache,
    background: &FrameHandle,
) {
    clear_background(BLACK);

    // Blank frame until the world image arrives.
    let Some(world_texture) = background.texture() else {
        return;
    };
    draw_texture(&world_texture, -camera.x, -camera.y, WHITE);

    for (_, participant) in world.depth_sorted() {
        let sx = participant.x - camera.x;
        let sy = participant.y - camera.y;

        let frame = participant
            .avatar
            .as_deref()
            .and_then(|avatar| assets.lookup(avatar, participant.facing, participant.animation_frame));

        match frame.and_then(|handle| handle.texture()) {
            Some(texture) => {
                let w = texture.width();
                let h = texture.height();
                // Anchored at the feet: horizontal center, bottom edge.
                draw_texture_ex(
                    &texture,
                    sx - w / 2.0,
                    sy - h,
                    WHITE,
                    DrawTextureParams {
                        // West reuses the east frames, mirrored in place.
                        flip_x: participant.facing == Direction::West,
                        ..Default::default()
                    },
                );
            }
            None => {
                draw_circle(
                    sx,
                    sy - PLACEHOLDER_RADIUS,
                    PLACEHOLDER_RADIUS,
                    Color::from_rgba(77, 163, 255, 255),
                );
            }
        }

        draw_label(participant.label(), sx, sy);
    }
}

/// Name tag above the avatar with a semi-opaque backing sized to the
/// measured text, so it stays legible over any background.
fn draw_label(label: &str, sx: f32, sy: f32) {
    let metrics = measure_text(label, None, LABEL_FONT_SIZE, 1.0);
    let baseline = sy - LABEL_LIFT;
    draw_rectangle(
        sx - metrics.width / 2.0 - LABEL_PADDING_X,
        baseline - LABEL_HEIGHT + 4.0,
        metrics.width + LABEL_PADDING_X * 2.0,
        LABEL_HEIGHT,
        Color::from_rgba(0, 0, 0, 153),
    );
    draw_text(
        label,
        sx - metrics.width / 2.0,
        baseline,
        LABEL_FONT_SIZE as f32,
        WHITE,
    );
}
