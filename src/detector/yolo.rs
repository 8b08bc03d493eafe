//! Conversion of YOLO region-layer output and padded YOLO labels into the
//! array form the evaluator consumes.

use ndarray::prelude::*;

use crate::error::Error;
use crate::voc::{BBox, RawDetections, RawGroundTruth};

/// YOLO label tensors are zero-padded to this many rows per image.
pub const MAX_TRUTHS: usize = 50;

/// `[cx, cy, w, h, det_conf]` and `[label, cx, cy, w, h]` both take five columns.
const MIN_COLS: usize = 5;

fn check_cols(rows: ArrayView2<'_, f32>) -> Result<(), Error> {
    if rows.nrows() > 0 && rows.ncols() < MIN_COLS {
        return Err(Error::ShortRows { needed: MIN_COLS, cols: rows.ncols() });
    }

    Ok(())
}

/// Decode region boxes of one image.
///
/// ```text
///     Parameters
///     ----------
///     rows : ArrayView2<f32>
///         One row per box: `[cx, cy, w, h, det_conf, cls_conf_0, cls_id_0, cls_conf_1, cls_id_1, ...]`,
///         coordinates normalized to [0, 1].
///     width, height : f32
///         Image size the coordinates are scaled to.
///
///     Returns
///     -------
///     RawDetections
///         One detection per `(cls_conf, cls_id)` pair, scored
///         `det_conf * cls_conf`, with pixel `(x1, y1, x2, y2)` boxes.
///         `Error::ShortRows` if rows have fewer than five columns.
/// ```
///
pub fn decode_region_boxes(rows: ArrayView2<'_, f32>, width: f32, height: f32) -> Result<RawDetections, Error> {
    check_cols(rows)?;

    let pairs = rows.ncols().saturating_sub(5) / 2;
    let n = rows.nrows() * pairs;

    let mut boxes = Array2::<f32>::zeros((n, 4));
    let mut labels = Array1::<u32>::zeros(n);
    let mut scores = Array1::<f32>::zeros(n);

    let mut idx = 0;
    for row in rows.outer_iter() {
        let bbox = BBox::cxcywh(row[0], row[1], row[2], row[3])
            .as_ltrb()
            .scale(width, height);
        let det_conf = row[4];

        for j in 0..pairs {
            let cls_conf = row[5 + 2 * j];
            let cls_id = row[6 + 2 * j];

            boxes.row_mut(idx).assign(&bbox.as_view());
            labels[idx] = cls_id.max(0.0) as u32;
            scores[idx] = det_conf * cls_conf;
            idx += 1;
        }
    }

    Ok(RawDetections { boxes, labels, scores })
}

/// Number of real rows in a padded label tensor: the index of the first row
/// whose x-center is zero, at most [`MAX_TRUTHS`]. Tensors too narrow to
/// hold a label row have none.
pub fn truths_length(truths: ArrayView2<'_, f32>) -> usize {
    if truths.ncols() < MIN_COLS {
        return 0;
    }

    truths
        .outer_iter()
        .take(MAX_TRUTHS)
        .position(|row| row[1] == 0.0)
        .unwrap_or_else(|| truths.nrows().min(MAX_TRUTHS))
}

/// Decode padded `[label, cx, cy, w, h]` label rows into pixel ground truth.
/// YOLO labels carry no difficult flag.
pub fn decode_truths(truths: ArrayView2<'_, f32>, width: f32, height: f32) -> Result<RawGroundTruth, Error> {
    check_cols(truths)?;

    let n = truths_length(truths);

    let mut boxes = Array2::<f32>::zeros((n, 4));
    let mut labels = Array1::<u32>::zeros(n);

    for (idx, row) in truths.outer_iter().take(n).enumerate() {
        let bbox = BBox::cxcywh(row[1], row[2], row[3], row[4])
            .as_ltrb()
            .scale(width, height);

        boxes.row_mut(idx).assign(&bbox.as_view());
        labels[idx] = row[0].max(0.0) as u32;
    }

    Ok(RawGroundTruth::new(boxes, labels))
}
