use std::cmp::Ordering;

use crate::voc::iou_matching::iou;
use crate::voc::Detection;

/// Confidence threshold the YOLO evaluation path filtered raw boxes with.
pub const DEFAULT_CONF_THRESH: f32 = 0.005;
/// NMS threshold the YOLO evaluation path used.
pub const DEFAULT_NMS_THRESH: f32 = 0.45;

/// Descending by score; stable for ties. A total order, so NaN scores sort
/// first instead of breaking the sort.
pub(crate) fn by_score_desc(a: f32, b: f32) -> Ordering {
    b.total_cmp(&a)
}

/// Class-aware non-maximum suppression.
///
/// ```text
///     Parameters
///     ----------
///     detections : &[Detection]
///         Detections of a single image, any number of classes.
///     iou_thresh : f32
///         A detection is dropped when its IoU with an already kept detection
///         of the same label exceeds this value.
///
///     Returns
///     -------
///     Vec<Detection>
///         Kept detections in descending score order. Equal scores keep
///         their input order.
/// ```
///
pub fn nms(detections: &[Detection], iou_thresh: f32) -> Vec<Detection> {
    let mut sorted = detections.to_vec();
    sorted.sort_by(|a, b| by_score_desc(a.score, b.score));

    let mut keep: Vec<Detection> = Vec::with_capacity(sorted.len());

    for det in sorted {
        let suppressed = keep
            .iter()
            .any(|k| k.label == det.label && iou(&k.bbox, &det.bbox) > iou_thresh);

        if !suppressed {
            keep.push(det);
        }
    }

    keep
}

/// Keeps detections with `conf_thresh < score <= 1`.
pub fn filter_by_confidence(detections: &[Detection], conf_thresh: f32) -> Vec<Detection> {
    detections
        .iter()
        .copied()
        .filter(|d| d.score > conf_thresh && d.score <= 1.0)
        .collect()
}

/// Confidence filtering followed by NMS, the per-image cleanup applied to
/// raw detector output before evaluation.
pub fn postprocess(detections: &[Detection], conf_thresh: f32, nms_thresh: f32) -> Vec<Detection> {
    nms(&filter_by_confidence(detections, conf_thresh), nms_thresh)
}
