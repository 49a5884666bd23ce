//! Overlay-logical ↔ physical pixel geometry.
//!
//! The overlay reports pointer positions in logical (DPI-independent) units;
//! the snapshot is in physical pixels. One `ScaleFactor` per session bridges
//! the two.

use serde::{Deserialize, Serialize};

use crate::capture::PixelRect;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalPoint {
    pub x: f64,
    pub y: f64,
}

impl LogicalPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LogicalRect {
    /// Axis-aligned box spanned by two corners, in either order.
    pub fn between(a: LogicalPoint, b: LogicalPoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn to_physical(&self, scale: ScaleFactor) -> PhysicalRect {
        PhysicalRect {
            x: scale_component(self.x, scale.x),
            y: scale_component(self.y, scale.y),
            width: scale_component(self.width, scale.x),
            height: scale_component(self.height, scale.y),
        }
    }
}

fn scale_component(value: f64, scale: f64) -> i32 {
    (value * scale).round() as i32
}

/// Physical pixels per logical unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactor {
    pub fn uniform(scale: f64) -> Self {
        Self { x: scale, y: scale }
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

/// A selection in physical pixels, before clamping to the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PhysicalRect {
    pub fn meets_minimum(&self, min: i32) -> bool {
        self.width >= min && self.height >= min
    }

    /// Fit the rectangle inside a `width`×`height` image.
    ///
    /// The origin is pulled into `[0, size - 1]` and the extent trimmed so the
    /// right/bottom edges stay inside. The result never has negative size.
    pub fn clamp_to(&self, width: u32, height: u32) -> PixelRect {
        let (x, w) = clamp_axis(self.x, self.width, width);
        let (y, h) = clamp_axis(self.y, self.height, height);
        PixelRect {
            x,
            y,
            width: w,
            height: h,
        }
    }
}

fn clamp_axis(origin: i32, extent: i32, limit: u32) -> (u32, u32) {
    if limit == 0 {
        return (0, 0);
    }
    let limit = limit as i64;
    let origin = (origin as i64).clamp(0, limit - 1);
    let extent = (extent as i64).min(limit - origin).max(0);
    (origin as u32, extent as u32)
}

/// `"{w} × {h}"` in physical pixels, as shown next to the live rectangle.
pub fn dimension_readout(rect: &LogicalRect, scale: ScaleFactor) -> String {
    let physical = rect.to_physical(scale);
    format!("{} × {}", physical.width, physical.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn between_normalizes_corner_order() {
        let rect = LogicalRect::between(LogicalPoint::new(50.0, 10.0), LogicalPoint::new(20.0, 40.0));
        assert_eq!(
            rect,
            LogicalRect {
                x: 20.0,
                y: 10.0,
                width: 30.0,
                height: 30.0,
            }
        );
    }

    #[test]
    fn fractional_scale_rounds_to_nearest() {
        let rect = LogicalRect {
            x: 3.0,
            y: 5.0,
            width: 7.0,
            height: 9.0,
        };
        assert_eq!(
            rect.to_physical(ScaleFactor::uniform(1.5)),
            PhysicalRect {
                x: 5,
                y: 8,
                width: 11,
                height: 14,
            }
        );
    }

    #[test]
    fn clamp_pulls_origin_inside_and_trims_extent() {
        let rect = PhysicalRect {
            x: -20,
            y: 90,
            width: 50,
            height: 40,
        };
        assert_eq!(
            rect.clamp_to(100, 100),
            PixelRect {
                x: 0,
                y: 90,
                width: 50,
                height: 10,
            }
        );
    }

    #[test]
    fn clamp_origin_past_the_edge_keeps_one_pixel() {
        let rect = PhysicalRect {
            x: 150,
            y: 0,
            width: 30,
            height: 30,
        };
        let clamped = rect.clamp_to(100, 100);
        assert_eq!((clamped.x, clamped.width), (99, 1));
    }

    #[test]
    fn clamp_against_empty_image_is_empty() {
        let rect = PhysicalRect {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        };
        assert_eq!(
            rect.clamp_to(0, 0),
            PixelRect {
                x: 0,
                y: 0,
                width: 0,
                height: 0,
            }
        );
    }

    #[test]
    fn readout_uses_physical_pixels() {
        let rect = LogicalRect {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 50.0,
        };
        assert_eq!(dimension_readout(&rect, ScaleFactor::uniform(2.0)), "200 × 100");
    }

    fn scales() -> impl Strategy<Value = f64> {
        prop::sample::select(vec![1.0, 1.25, 1.5, 2.0])
    }

    proptest! {
        #[test]
        fn physical_is_rounded_logical_times_scale(
            s in scales(),
            x in 0u32..4000,
            y in 0u32..4000,
            w in 0u32..4000,
            h in 0u32..4000,
        ) {
            let rect = LogicalRect { x: x as f64, y: y as f64, width: w as f64, height: h as f64 };
            let p = rect.to_physical(ScaleFactor::uniform(s));
            prop_assert_eq!(p.x, (x as f64 * s).round() as i32);
            prop_assert_eq!(p.y, (y as f64 * s).round() as i32);
            prop_assert_eq!(p.width, (w as f64 * s).round() as i32);
            prop_assert_eq!(p.height, (h as f64 * s).round() as i32);
        }

        #[test]
        fn clamped_rect_stays_inside_the_image(
            x in -5000i32..10000,
            y in -5000i32..10000,
            w in -100i32..10000,
            h in -100i32..10000,
            img_w in 1u32..5000,
            img_h in 1u32..5000,
        ) {
            let clamped = PhysicalRect { x, y, width: w, height: h }.clamp_to(img_w, img_h);
            prop_assert!(clamped.x < img_w);
            prop_assert!(clamped.y < img_h);
            prop_assert!(clamped.x as u64 + clamped.width as u64 <= img_w as u64);
            prop_assert!(clamped.y as u64 + clamped.height as u64 <= img_h as u64);
            if w > 0 {
                prop_assert!(clamped.width > 0);
            }
        }
    }
}
