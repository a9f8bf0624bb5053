//! Bounding boxes in corner and center-size form.
//!
//! The only coordinate conversion in the pipeline lives here:
//! absolute top-left/bottom-right pixel corners become center/size values
//! relative to the image dimensions.

use std::marker::PhantomData;

use super::{Normalized, Pixel};

/// An axis-aligned box as two corners (x1, y1) top-left and (x2, y2)
/// bottom-right.
///
/// Ordering is not enforced: inverted or degenerate boxes can be represented
/// so that callers decide what to do with them.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn from_xyxy(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            _space: PhantomData,
        }
    }

    /// Width of the box. Negative if x2 < x1.
    #[inline]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Height of the box. Negative if y2 < y1.
    #[inline]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// True when both axes have strictly positive extent.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("x1", &self.x1)
            .field("y1", &self.y1)
            .field("x2", &self.x2)
            .field("y2", &self.y2)
            .finish()
    }
}

impl BBoxXYXY<Pixel> {
    /// Builds a pixel box from the integer corners found in raw annotations.
    pub fn from_corners(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self::from_xyxy(x1 as f64, y1 as f64, x2 as f64, y2 as f64)
    }

    /// True when the box is ordered and lies inside a `width` x `height` image.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.is_ordered()
            && self.x1 >= 0.0
            && self.y1 >= 0.0
            && self.x2 <= width as f64
            && self.y2 <= height as f64
    }

    /// Converts to normalized center/size form.
    ///
    /// Pure arithmetic: no clamping, no ordering checks. Out-of-image or
    /// inverted corners come out as values outside [0, 1] or negative sizes.
    pub fn to_cxcywh_normalized(&self, image_width: f64, image_height: f64) -> BBoxCxCyWh<Normalized> {
        BBoxCxCyWh::from_cxcywh(
            (self.x1 + self.x2) / (2.0 * image_width),
            (self.y1 + self.y2) / (2.0 * image_height),
            self.width() / image_width,
            self.height() / image_height,
        )
    }
}

/// A box as center point plus width and height.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxCxCyWh<TSpace> {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBoxCxCyWh<TSpace> {
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            cx,
            cy,
            w,
            h,
            _space: PhantomData,
        }
    }

    /// Returns true if all four values are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.cx.is_finite() && self.cy.is_finite() && self.w.is_finite() && self.h.is_finite()
    }
}

impl<TSpace> std::fmt::Debug for BBoxCxCyWh<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxCxCyWh")
            .field("cx", &self.cx)
            .field("cy", &self.cy)
            .field("w", &self.w)
            .field("h", &self.h)
            .finish()
    }
}

impl BBoxCxCyWh<Normalized> {
    /// Re-expands a normalized box into pixel corners.
    pub fn to_pixel_xyxy(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Pixel> {
        let half_w = self.w * image_width / 2.0;
        let half_h = self.h * image_height / 2.0;
        let cx = self.cx * image_width;
        let cy = self.cy * image_height;
        BBoxXYXY::from_xyxy(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    /// True when every component lies in [0, 1].
    pub fn is_unit_range(&self) -> bool {
        [self.cx, self.cy, self.w, self.h]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

/// Converts absolute corners into a normalized `(cx, cy, w, h)` quadruple for
/// an image of `image_width` x `image_height` pixels.
pub fn normalize_box(
    image_width: u32,
    image_height: u32,
    x1: i64,
    y1: i64,
    x2: i64,
    y2: i64,
) -> (f64, f64, f64, f64) {
    let bbox = BBoxXYXY::<Pixel>::from_corners(x1, y1, x2, y2)
        .to_cxcywh_normalized(image_width as f64, image_height as f64);
    (bbox.cx, bbox.cy, bbox.w, bbox.h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_matches_center_size_formula() {
        let (cx, cy, w, h) = normalize_box(640, 640, 100, 200, 140, 260);
        assert!((cx - 120.0 / 640.0).abs() < 1e-12);
        assert!((cy - 230.0 / 640.0).abs() < 1e-12);
        assert!((w - 40.0 / 640.0).abs() < 1e-12);
        assert!((h - 60.0 / 640.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_full_image_is_centered_unit_box() {
        let (cx, cy, w, h) = normalize_box(200, 100, 0, 0, 200, 100);
        assert_eq!((cx, cy, w, h), (0.5, 0.5, 1.0, 1.0));
    }

    #[test]
    fn inverted_box_passes_through_with_negative_size() {
        let bbox = BBoxXYXY::<Pixel>::from_corners(50, 50, 10, 10);
        assert!(!bbox.is_ordered());
        assert!(!bbox.is_within(100, 100));

        let norm = bbox.to_cxcywh_normalized(100.0, 100.0);
        assert!((norm.w + 0.4).abs() < 1e-12);
        assert!((norm.h + 0.4).abs() < 1e-12);
        assert!(!norm.is_unit_range());
    }

    #[test]
    fn out_of_bounds_box_is_not_clamped() {
        let bbox = BBoxXYXY::<Pixel>::from_corners(90, 90, 130, 110);
        assert!(bbox.is_ordered());
        assert!(!bbox.is_within(100, 100));

        let norm = bbox.to_cxcywh_normalized(100.0, 100.0);
        assert!((norm.cx - 1.1).abs() < 1e-12);
        assert!(!norm.is_unit_range());
    }

    #[test]
    fn to_pixel_inverts_normalization() {
        let bbox = BBoxXYXY::<Pixel>::from_corners(12, 7, 44, 30);
        let restored = bbox.to_cxcywh_normalized(64.0, 48.0).to_pixel_xyxy(64.0, 48.0);
        assert!((restored.x1 - 12.0).abs() < 1e-9);
        assert!((restored.y1 - 7.0).abs() < 1e-9);
        assert!((restored.x2 - 44.0).abs() < 1e-9);
        assert!((restored.y2 - 30.0).abs() < 1e-9);
    }
}
