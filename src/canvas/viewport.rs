//! Zoom/pan state and the canvas ↔ screen transform.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CanvasPoint, CanvasRect, ScreenPoint, ScreenRect};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Factor applied when zooming in (wheel up, toolbar "+")
    pub zoom_in_factor: f64,
    /// Factor applied when zooming out (wheel down, toolbar "-")
    pub zoom_out_factor: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 2.0,
            zoom_in_factor: 1.1,
            zoom_out_factor: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewportConfigError {
    #[error("Invalid zoom range: minZoom {min} and maxZoom {max} must satisfy 0 < minZoom <= maxZoom")]
    ZoomRange { min: f64, max: f64 },
    #[error("Invalid {name}: {value} (must be a positive number)")]
    ZoomFactor { name: &'static str, value: f64 },
}

impl ViewportConfig {
    /// Check a host-supplied config before it reaches a viewport.
    pub fn validate(&self) -> Result<(), ViewportConfigError> {
        let (min, max) = (self.min_zoom, self.max_zoom);
        // also rejects NaN
        if !(min > 0.0 && min <= max && max.is_finite()) {
            return Err(ViewportConfigError::ZoomRange { min, max });
        }
        for (name, value) in [
            ("zoomInFactor", self.zoom_in_factor),
            ("zoomOutFactor", self.zoom_out_factor),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ViewportConfigError::ZoomFactor { name, value });
            }
        }
        Ok(())
    }

    /// `zoom` limited to the configured range. Never panics, even on a
    /// config that failed `validate`.
    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.min(self.max_zoom).max(self.min_zoom)
    }
}

/// Wheel input as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub delta_y: f64,
    /// Zoom modifier (ctrl/cmd) held
    pub modifier: bool,
    pub position: Option<ScreenPoint>,
}

/// Owns zoom and pan. `screen = zoom * (canvas + pan)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasViewport {
    config: ViewportConfig,
    zoom: f64,
    pan: CanvasPoint,
    /// Width and height of the canvas element in screen pixels
    size: (f64, f64),
}

impl Default for CanvasViewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl CanvasViewport {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            zoom: config.clamp_zoom(1.0),
            pan: CanvasPoint::default(),
            size: (0.0, 0.0),
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> CanvasPoint {
        self.pan
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = (width.max(0.0), height.max(0.0));
    }

    pub fn to_screen(&self, p: CanvasPoint) -> ScreenPoint {
        ScreenPoint::new(self.zoom * (p.x + self.pan.x), self.zoom * (p.y + self.pan.y))
    }

    pub fn to_canvas(&self, p: ScreenPoint) -> CanvasPoint {
        CanvasPoint::new(p.x / self.zoom - self.pan.x, p.y / self.zoom - self.pan.y)
    }

    pub fn rect_to_screen(&self, rect: CanvasRect) -> ScreenRect {
        let origin = self.to_screen(rect.origin);
        ScreenRect {
            x: origin.x,
            y: origin.y,
            width: rect.size.width * self.zoom,
            height: rect.size.height * self.zoom,
        }
    }

    /// Shift the view by a screen-space pointer delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan.x += dx / self.zoom;
        self.pan.y += dy / self.zoom;
    }

    /// Handle a wheel event. Returns `false` when the event is not a zoom
    /// gesture and should be left to the host.
    pub fn wheel(&mut self, event: WheelEvent) -> bool {
        if !event.modifier {
            return false;
        }
        let factor = if event.delta_y > 0.0 {
            self.config.zoom_out_factor
        } else {
            self.config.zoom_in_factor
        };
        let anchor = event.position.unwrap_or_else(|| self.center());
        self.zoom_by(factor, anchor);
        true
    }

    pub fn zoom_in(&mut self) {
        let center = self.center();
        self.zoom_by(self.config.zoom_in_factor, center);
    }

    pub fn zoom_out(&mut self) {
        let center = self.center();
        self.zoom_by(self.config.zoom_out_factor, center);
    }

    /// Multiply zoom by `factor`, clamp, and keep the canvas point under
    /// `anchor` fixed on screen.
    pub fn zoom_by(&mut self, factor: f64, anchor: ScreenPoint) {
        let fixed = self.to_canvas(anchor);
        let zoom = self.config.clamp_zoom(self.zoom * factor);
        if zoom == self.zoom {
            return;
        }
        self.zoom = zoom;
        self.pan = CanvasPoint::new(anchor.x / zoom - fixed.x, anchor.y / zoom - fixed.y);
        log::trace!("zoom {:.3} pan ({:.1}, {:.1})", self.zoom, self.pan.x, self.pan.y);
    }

    fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.size.0 / 2.0, self.size.1 / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn wheel(delta_y: f64) -> WheelEvent {
        WheelEvent {
            delta_y,
            modifier: true,
            position: Some(ScreenPoint::new(320.0, 200.0)),
        }
    }

    #[test]
    fn test_round_trip_transform() {
        let mut vp = CanvasViewport::default();
        vp.pan_by(35.0, -12.0);
        vp.zoom_by(1.7, ScreenPoint::new(10.0, 10.0));
        let p = CanvasPoint::new(123.0, 45.5);
        let back = vp.to_canvas(vp.to_screen(p));
        assert!(approx(back.x, p.x) && approx(back.y, p.y));
    }

    #[test]
    fn test_zoom_stays_clamped() {
        let mut vp = CanvasViewport::default();
        for _ in 0..100 {
            vp.wheel(wheel(-1.0));
            assert!(vp.zoom() <= 2.0);
        }
        assert!(approx(vp.zoom(), 2.0));
        for _ in 0..200 {
            vp.wheel(wheel(3.0));
            assert!(vp.zoom() >= 0.1);
        }
        assert!(approx(vp.zoom(), 0.1));
    }

    #[test]
    fn test_wheel_without_modifier_is_ignored() {
        let mut vp = CanvasViewport::default();
        let handled = vp.wheel(WheelEvent {
            delta_y: 1.0,
            modifier: false,
            position: None,
        });
        assert!(!handled);
        assert_eq!(vp.zoom(), 1.0);
    }

    #[test]
    fn test_wheel_factors() {
        let mut vp = CanvasViewport::default();
        vp.wheel(wheel(1.0));
        assert!(approx(vp.zoom(), 0.9));
        vp.wheel(wheel(-1.0));
        assert!(approx(vp.zoom(), 0.99));
    }

    #[test]
    fn test_zoom_keeps_cursor_point_fixed() {
        let mut vp = CanvasViewport::default();
        vp.pan_by(40.0, 25.0);
        let cursor = ScreenPoint::new(300.0, 180.0);
        let before = vp.to_canvas(cursor);
        vp.wheel(WheelEvent {
            delta_y: -1.0,
            modifier: true,
            position: Some(cursor),
        });
        let after = vp.to_canvas(cursor);
        assert!(approx(before.x, after.x) && approx(before.y, after.y));
    }

    #[test]
    fn test_zoom_in_uses_center() {
        let mut vp = CanvasViewport::default();
        vp.set_size(800.0, 600.0);
        let center = ScreenPoint::new(400.0, 300.0);
        let before = vp.to_canvas(center);
        vp.zoom_in();
        let after = vp.to_canvas(center);
        assert!(approx(vp.zoom(), 1.1));
        assert!(approx(before.x, after.x) && approx(before.y, after.y));
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(ViewportConfig::default().validate(), Ok(()));

        let inverted = ViewportConfig {
            min_zoom: 3.0,
            max_zoom: 1.0,
            ..Default::default()
        };
        assert_eq!(
            inverted.validate(),
            Err(ViewportConfigError::ZoomRange { min: 3.0, max: 1.0 })
        );

        let zero_min = ViewportConfig {
            min_zoom: 0.0,
            ..Default::default()
        };
        assert!(zero_min.validate().is_err());

        let bad_factor = ViewportConfig {
            zoom_out_factor: -0.5,
            ..Default::default()
        };
        assert_eq!(
            bad_factor.validate(),
            Err(ViewportConfigError::ZoomFactor {
                name: "zoomOutFactor",
                value: -0.5
            })
        );
    }

    #[test]
    fn test_inverted_range_does_not_panic() {
        let mut vp = CanvasViewport::new(ViewportConfig {
            min_zoom: 3.0,
            max_zoom: 1.0,
            ..Default::default()
        });
        assert_eq!(vp.zoom(), 3.0);
        vp.zoom_in();
        vp.zoom_out();
        assert_eq!(vp.zoom(), 3.0);
    }

    #[test]
    fn test_pan_is_zoom_independent_in_canvas_space() {
        for zoom in [0.1, 0.5, 1.0, 2.0] {
            let mut vp = CanvasViewport::default();
            vp.zoom_by(zoom, ScreenPoint::default());
            let pan_before = vp.pan();
            vp.pan_by(30.0, -60.0);
            assert!(approx(vp.pan().x - pan_before.x, 30.0 / vp.zoom()));
            assert!(approx(vp.pan().y - pan_before.y, -60.0 / vp.zoom()));
        }
    }
}
