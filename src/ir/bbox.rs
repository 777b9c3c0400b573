//! Bounding box types.
//!
//! Sources hand us corner boxes in pixels ([`BBoxXYXY<Pixel>`]); the
//! training layout stores center/size boxes as image fractions
//! ([`BBoxCxCyWh<Normalized>`]).

use std::fmt;
use std::marker::PhantomData;

use super::{Normalized, Pixel};

/// An axis-aligned bounding box in corner form (xmin, ymin, xmax, ymax).
///
/// Construction never fails; [`BBoxXYXY::is_well_formed`] is the gate that
/// parsers use to reject degenerate boxes instead of repairing them.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            _space: PhantomData,
        }
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    /// Width of the box. Negative or zero for malformed boxes.
    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Height of the box. Negative or zero for malformed boxes.
    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Returns true if all four coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite()
            && self.ymin.is_finite()
            && self.xmax.is_finite()
            && self.ymax.is_finite()
    }

    /// Returns true if the box is finite and strictly positive in both axes
    /// (`xmax > xmin` and `ymax > ymin`).
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.is_finite() && self.xmax > self.xmin && self.ymax > self.ymin
    }
}

impl<TSpace> fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}

impl BBoxXYXY<Pixel> {
    /// Converts absolute pixel corners into normalized center/size form.
    ///
    /// The center and extent are computed in pixel space first and divided
    /// by the image size afterwards, so the serialized digits match
    /// `((x1 + x2) / 2) / width` exactly. No clamping is applied.
    pub fn normalize(&self, image_width: f64, image_height: f64) -> BBoxCxCyWh<Normalized> {
        BBoxCxCyWh::new(
            ((self.xmin + self.xmax) / 2.0) / image_width,
            ((self.ymin + self.ymax) / 2.0) / image_height,
            (self.xmax - self.xmin) / image_width,
            (self.ymax - self.ymin) / image_height,
        )
    }
}

/// A bounding box in center form (cx, cy, w, h).
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
    pub fn new(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            cx,
            cy,
            w,
            h,
            _space: PhantomData,
        }
    }
}

impl<TSpace> fmt::Debug for BBoxCxCyWh<TSpace> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BBoxCxCyWh")
            .field("cx", &self.cx)
            .field("cy", &self.cy)
            .field("w", &self.w)
            .field("h", &self.h)
            .finish()
    }
}

impl BBoxCxCyWh<Normalized> {
    /// Maps a normalized box back onto pixel corners of an image.
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Pixel> {
        let half_w = self.w * image_width / 2.0;
        let half_h = self.h * image_height / 2.0;
        let cx = self.cx * image_width;
        let cy = self.cy * image_height;
        BBoxXYXY::from_xyxy(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }
}
