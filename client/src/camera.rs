//! Camera framing: a pure function of focus position, world size and
//! viewport size, recomputed on every paint and never stored as truth.

/// World-to-screen translation in layout pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraOffset {
    pub x: f32,
    pub y: f32,
}

/// Centers the focus point in the viewport, then clamps each axis so the
/// viewport never shows past a world edge. An axis where the world fits
/// inside the viewport pins to 0. An unknown world size (background image
/// still loading) is treated as 0 by 0, which also pins both axes.
pub fn compute_offset(
    world: (f32, f32),
    viewport: (f32, f32),
    focus: (f32, f32),
) -> CameraOffset {
    CameraOffset {
        x: clamp_axis(world.0, viewport.0, focus.0),
        y: clamp_axis(world.1, viewport.1, focus.1),
    }
}

fn clamp_axis(world: f32, viewport: f32, focus: f32) -> f32 {
    if world <= viewport {
        return 0.0;
    }
    (focus - viewport / 2.0).clamp(0.0, world - viewport)
}
