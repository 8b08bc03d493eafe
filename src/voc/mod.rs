pub mod average_precision;
pub mod detection;
pub mod evaluator;
pub mod iou_matching;
pub mod matching;
pub mod nms;

pub use detection::{Detection, GroundTruth, ImageRecord, RawDetections, RawGroundTruth};
pub use evaluator::{eval_detection_voc, eval_detection_voc_arrays, ClassResult, EvaluationResult};
pub use matching::{match_class, ClassMatches, MatchOutcome};
pub use nms::{filter_by_confidence, nms, postprocess};

use core::marker::PhantomData;
use ndarray::prelude::*;

pub trait BBoxFormat: std::fmt::Debug {}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Cxcywh;
impl BBoxFormat for Cxcywh {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox<F: BBoxFormat>([f32; 4], PhantomData<F>);
impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_view(&self) -> ArrayView1<'_, f32> {
        aview1(&self.0)
    }
}

impl BBox<Ltwh> {
    #[inline]
    pub fn ltwh(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox([x1, x2, x3, x4], Default::default())
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox([x1, x2, x3, x4], Default::default())
    }

    /// Builds a box from one row of an `N×4` array in `(x1, y1, x2, y2)` order.
    #[inline]
    pub fn from_row(row: ArrayView1<'_, f32>) -> Self {
        Self::ltrb(row[0], row[1], row[2], row[3])
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.0[3]
    }

    /// Area of the box. Degenerate and inverted boxes have zero area.
    #[inline]
    pub fn area(&self) -> f32 {
        (self.right() - self.left()).max(0.0) * (self.bottom() - self.top()).max(0.0)
    }

    #[inline]
    pub fn scale(&self, sx: f32, sy: f32) -> Self {
        Self::ltrb(self.left() * sx, self.top() * sy, self.right() * sx, self.bottom() * sy)
    }
}

impl BBox<Cxcywh> {
    #[inline]
    pub fn cxcywh(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox([x1, x2, x3, x4], Default::default())
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }

    #[inline(always)]
    pub fn cx(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn cy(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.0[3]
    }
}

impl<'a> From<&'a BBox<Ltwh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        Self([
            v.0[0],
            v.0[1],
            v.0[2] + v.0[0],
            v.0[3] + v.0[1],
        ], Default::default())
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        Self([
            v.0[0],
            v.0[1],
            v.0[2] - v.0[0],
            v.0[3] - v.0[1],
        ], Default::default())
    }
}

impl<'a> From<&'a BBox<Cxcywh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Cxcywh>) -> Self {
        let (half_w, half_h) = (v.0[2] / 2.0, v.0[3] / 2.0);

        Self([
            v.0[0] - half_w,
            v.0[1] - half_h,
            v.0[0] + half_w,
            v.0[1] + half_h,
        ], Default::default())
    }
}
