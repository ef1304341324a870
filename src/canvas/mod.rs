//! Canvas coordinate spaces, viewport transform and pointer interaction.
//!
//! Canvas-space is the logical plane tables live on. Screen-space is what the
//! host draws and receives pointer events in. Only [`CanvasViewport`] converts
//! between the two.

mod drag;
mod placement;
mod scene;
mod viewport;

use serde::{Deserialize, Serialize};

pub use drag::{DragController, DragState, PointerButton, PointerEvent};
pub use placement::arrange;
pub use scene::{Scene, SceneEdge, SceneTable};
pub use viewport::{CanvasViewport, ViewportConfig, ViewportConfigError, WheelEvent};

/// Point in canvas-space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

impl CanvasPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_from(self, other: CanvasPoint) -> CanvasPoint {
        CanvasPoint::new(self.x - other.x, self.y - other.y)
    }
}

/// Point in screen-space (pixels relative to the canvas element's top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

/// Axis-aligned rectangle in canvas-space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasRect {
    pub origin: CanvasPoint,
    pub size: CanvasSize,
}

impl CanvasRect {
    pub fn contains(&self, p: CanvasPoint) -> bool {
        p.x >= self.origin.x
            && p.x <= self.origin.x + self.size.width
            && p.y >= self.origin.y
            && p.y <= self.origin.y + self.size.height
    }
}

/// Axis-aligned rectangle in screen-space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}
