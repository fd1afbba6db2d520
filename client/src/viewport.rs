//! Drawable surface metrics in layout pixels plus the device pixel ratio.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    css_width: f32,
    css_height: f32,
    dpr: f32,
}

impl Viewport {
    pub fn new() -> Self {
        Viewport {
            css_width: 0.0,
            css_height: 0.0,
            dpr: 1.0,
        }
    }

    /// Applies a resize notification. Returns true when the metrics
    /// changed; callers still invalidate either way since a layout pass can
    /// fire a resize with identical box metrics.
    pub fn resize(&mut self, css_width: f32, css_height: f32, dpr: f32) -> bool {
        let next = Viewport {
            css_width,
            css_height,
            dpr: if dpr > 0.0 { dpr } else { 1.0 },
        };
        let changed = *self != next;
        *self = next;
        changed
    }

    /// Size in layout pixels, the coordinate space all drawing uses.
    pub fn size(&self) -> (f32, f32) {
        (self.css_width, self.css_height)
    }

    /// Device pixel ratio of the surface. The windowing layer keeps the
    /// backing store at this scale; tracking it here makes a ratio change
    /// (a monitor hop) count as a resize.
    pub fn dpr(&self) -> f32 {
        self.dpr
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}
