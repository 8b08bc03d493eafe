use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::voc::average_precision::{average_precision, precision_recall};
use crate::voc::matching::match_class;
use crate::voc::{ImageRecord, RawDetections, RawGroundTruth};

/// Evaluation of a single class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassResult {
    /// Average precision, NaN when the class has no non-difficult ground truth.
    pub ap: f64,
    pub n_positive: usize,
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub per_class: BTreeMap<u32, ClassResult>,
    /// Mean of the defined per-class APs, NaN if none is defined.
    pub map: f64,
}

impl EvaluationResult {
    #[inline]
    pub fn ap(&self, class: u32) -> Option<f64> {
        self.per_class.get(&class).map(|c| c.ap)
    }

    /// Per-class APs keyed by label.
    pub fn aps(&self) -> BTreeMap<u32, f64> {
        self.per_class.iter().map(|(&class, c)| (class, c.ap)).collect()
    }

    /// APs of labels `0..num_classes` as a dense vector; labels that never
    /// occurred are NaN, labels at or above `num_classes` are left out.
    pub fn ap_vec(&self, num_classes: usize) -> Vec<f64> {
        let mut aps = vec![f64::NAN; num_classes];

        for (&class, result) in self.per_class.iter() {
            match aps.get_mut(class as usize) {
                Some(ap) => *ap = result.ap,
                None => break,
            }
        }

        aps
    }
}

/// Evaluate detections with the PASCAL VOC protocol.
///
/// ```text
///     Parameters
///     ----------
///     records : &[ImageRecord]
///         Detections and ground truth for every image of the evaluation set.
///     iou_thresh : f32
///         A detection needs at least this IoU with a ground-truth box of the
///         same class to be a true positive. Must be in (0, 1].
///     use_07_metric : bool
///         Use the VOC2007 11-point AP instead of the all-points AP.
///
///     Returns
///     -------
///     EvaluationResult
///         AP for every label seen in detections or ground truth and the mean
///         over labels that have ground truth.
/// ```
///
pub fn eval_detection_voc(records: &[ImageRecord], iou_thresh: f32, use_07_metric: bool) -> Result<EvaluationResult, Error> {
    if records.is_empty() {
        return Err(Error::EmptyEvaluationSet);
    }

    if !(iou_thresh > 0.0 && iou_thresh <= 1.0) {
        return Err(Error::InvalidThreshold { name: "iou_thresh", value: iou_thresh });
    }

    let mut classes = BTreeSet::new();

    for (image, record) in records.iter().enumerate() {
        for (index, det) in record.detections.iter().enumerate() {
            if !det.score.is_finite() {
                return Err(Error::InvalidScore { image, index });
            }

            classes.insert(det.label);
        }

        classes.extend(record.ground_truth.iter().map(|g| g.label));
    }

    let mut per_class = BTreeMap::new();

    for class in classes {
        let matches = match_class(class, records, iou_thresh);

        let result = match precision_recall(&matches.outcomes, matches.n_positive) {
            Some((precision, recall)) => ClassResult {
                ap: average_precision(&precision, &recall, use_07_metric),
                n_positive: matches.n_positive,
                precision,
                recall,
            },
            None => ClassResult {
                ap: f64::NAN,
                n_positive: 0,
                precision: vec![],
                recall: vec![],
            },
        };

        debug!(
            "class {}: {} detections, {} positives, {} tp, AP {:.4}",
            class,
            matches.outcomes.len(),
            matches.n_positive,
            matches.true_positives(),
            result.ap,
        );

        per_class.insert(class, result);
    }

    let defined: Vec<f64> = per_class
        .values()
        .filter(|c| c.n_positive > 0)
        .map(|c| c.ap)
        .collect();

    let map = if defined.is_empty() {
        warn!("no class has ground truth, mAP is undefined");
        f64::NAN
    } else {
        defined.iter().sum::<f64>() / defined.len() as f64
    };

    Ok(EvaluationResult { per_class, map })
}

/// Same as [`eval_detection_voc`] for array-shaped per-image inputs.
pub fn eval_detection_voc_arrays(
    pred: &[RawDetections],
    gt: &[RawGroundTruth],
    iou_thresh: f32,
    use_07_metric: bool,
) -> Result<EvaluationResult, Error> {
    if pred.len() != gt.len() {
        return Err(Error::ImageCountMismatch {
            predictions: pred.len(),
            ground_truth: gt.len(),
        });
    }

    let records = pred
        .iter()
        .zip(gt.iter())
        .enumerate()
        .map(|(image, (p, g))| ImageRecord::from_arrays(image, p, g))
        .collect::<Result<Vec<_>, _>>()?;

    eval_detection_voc(&records, iou_thresh, use_07_metric)
}
