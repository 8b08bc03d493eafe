use ndarray::prelude::*;

use crate::voc::{BBox, Ltrb};

/// Intersection over union of two boxes.
///
/// Boxes with inverted corners count as empty, and two empty boxes have an
/// IoU of 0 rather than NaN.
#[inline]
pub fn iou(a: &BBox<Ltrb>, b: &BBox<Ltrb>) -> f32 {
    let i_xmin = a.left().max(b.left());
    let i_ymin = a.top().max(b.top());

    let i_xmax = a.right().min(b.right());
    let i_ymax = a.bottom().min(b.bottom());

    let intersection_area = (i_xmax - i_xmin).max(0.0) * (i_ymax - i_ymin).max(0.0);
    let union_area = a.area() + b.area() - intersection_area;

    if union_area <= 0.0 {
        return 0.0;
    }

    intersection_area / union_area
}

/// Computer intersection over union of one box against many.
/// Parameters
/// ----------
/// bbox : BBox<Ltrb>
///     A bounding box in format `(x1, y1, x2, y2)`.
/// candidates : iterator of BBox<Ltrb>
///     Candidate bounding boxes in the same format as `bbox`.
/// Returns
/// -------
/// ndarray
///     The intersection over union in [0, 1] between the `bbox` and each
///     candidate.
pub fn iou_candidates<'a, I>(bbox: &BBox<Ltrb>, candidates: I) -> Array1<f32>
where
    I: IntoIterator<Item = &'a BBox<Ltrb>>,
{
    candidates
        .into_iter()
        .map(|candidate| iou(bbox, candidate))
        .collect()
}

/// Pairwise IoU, element `(i, j)` is `iou(a[i], b[j])`.
pub fn iou_matrix(a: &[BBox<Ltrb>], b: &[BBox<Ltrb>]) -> Array2<f32> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| iou(&a[i], &b[j]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let b = BBox::ltrb(0.0, 0.0, 10.0, 10.0);
        assert_eq!(iou(&b, &b), 1.0);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BBox::ltrb(0.0, 0.0, 10.0, 10.0);
        let b = BBox::ltrb(20.0, 20.0, 30.0, 30.0);
        assert_eq!(iou(&a, &b), 0.0);

        // touching edges share no area
        let c = BBox::ltrb(10.0, 0.0, 20.0, 10.0);
        assert_eq!(iou(&a, &c), 0.0);
    }

    #[test]
    fn iou_partial_overlap() {
        let a = BBox::ltrb(0.0, 0.0, 10.0, 10.0);
        let b = BBox::ltrb(5.0, 0.0, 15.0, 10.0);
        assert!((iou(&a, &b) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn iou_is_symmetric() {
        let boxes = [
            BBox::ltrb(0.0, 0.0, 10.0, 10.0),
            BBox::ltrb(3.0, 4.0, 17.0, 9.0),
            BBox::ltrb(-5.0, -5.0, 2.5, 12.0),
            BBox::ltrb(8.0, 8.0, 8.0, 20.0),
            BBox::ltrb(30.0, 1.0, 10.0, 4.0),
        ];

        let m = iou_matrix(&boxes, &boxes);
        assert_eq!(m, m.t());
    }

    #[test]
    fn degenerate_boxes_have_zero_iou() {
        let a = BBox::ltrb(5.0, 5.0, 5.0, 5.0);
        assert_eq!(iou(&a, &a), 0.0);

        let inverted = BBox::ltrb(10.0, 10.0, 0.0, 0.0);
        let b = BBox::ltrb(0.0, 0.0, 10.0, 10.0);
        assert_eq!(iou(&inverted, &b), 0.0);
    }

    #[test]
    fn iou_against_candidates() {
        let b = BBox::ltrb(0.0, 0.0, 10.0, 10.0);
        let candidates = vec![b, BBox::ltrb(5.0, 0.0, 15.0, 10.0), BBox::ltrb(50.0, 50.0, 60.0, 60.0)];
        let ious = iou_candidates(&b, &candidates);
        assert_eq!(ious.len(), 3);
        assert_eq!(ious[0], 1.0);
        assert!(ious[1] > 0.3 && ious[1] < 0.34);
        assert_eq!(ious[2], 0.0);
    }
}
