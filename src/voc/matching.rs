use crate::voc::iou_matching::iou_candidates;
use crate::voc::nms::by_score_desc;
use crate::voc::{BBox, ImageRecord, Ltrb};

/// What a ranked detection counts as once matched against ground truth.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    TruePositive,
    FalsePositive,
    /// Landed on a `difficult` ground-truth box; counts as neither.
    Ignored,
}

/// Matching result for one class over the whole evaluation set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassMatches {
    /// Scores of the class detections in descending order.
    pub scores: Vec<f32>,
    /// `outcomes[k]` belongs to `scores[k]`.
    pub outcomes: Vec<MatchOutcome>,
    /// Number of non-difficult ground-truth boxes of the class.
    pub n_positive: usize,
}

impl ClassMatches {
    pub fn true_positives(&self) -> usize {
        self.outcomes.iter().filter(|&&o| o == MatchOutcome::TruePositive).count()
    }

    pub fn false_positives(&self) -> usize {
        self.outcomes.iter().filter(|&&o| o == MatchOutcome::FalsePositive).count()
    }
}

struct ClassGroundTruth {
    bboxes: Vec<BBox<Ltrb>>,
    difficult: Vec<bool>,
    consumed: Vec<bool>,
}

/// Greedy assignment of the detections of `class` to its ground truth.
///
/// ```text
///     Parameters
///     ----------
///     class : u32
///         The class label to match.
///     records : &[ImageRecord]
///         The whole evaluation set. Only boxes labelled `class` are looked at.
///     iou_thresh : f32
///         Minimal IoU for a detection to claim a ground-truth box.
///
///     Returns
///     -------
///     ClassMatches
///         Detections are ranked by descending score across all images (ties
///         keep image order, then in-image order). Each one is compared with
///         every ground-truth box of the class in its own image and the best
///         overlap decides: below `iou_thresh` it is a false positive; on a
///         difficult box it is ignored; on a box an earlier detection already
///         claimed it is a false positive; otherwise a true positive that
///         claims the box.
/// ```
///
pub fn match_class(class: u32, records: &[ImageRecord], iou_thresh: f32) -> ClassMatches {
    let mut ground_truth: Vec<ClassGroundTruth> = records
        .iter()
        .map(|record| {
            let (bboxes, difficult): (Vec<_>, Vec<_>) = record.ground_truth
                .iter()
                .filter(|g| g.label == class)
                .map(|g| (g.bbox, g.difficult))
                .unzip();

            ClassGroundTruth {
                consumed: vec![false; bboxes.len()],
                bboxes,
                difficult,
            }
        })
        .collect();

    let n_positive: usize = ground_truth
        .iter()
        .map(|g| g.difficult.iter().filter(|&&d| !d).count())
        .sum();

    let mut ranked: Vec<(usize, BBox<Ltrb>, f32)> = records
        .iter()
        .enumerate()
        .flat_map(|(image, record)| {
            record.detections
                .iter()
                .filter(|d| d.label == class)
                .map(move |d| (image, d.bbox, d.score))
        })
        .collect();

    ranked.sort_by(|a, b| by_score_desc(a.2, b.2));

    let mut outcomes = Vec::with_capacity(ranked.len());

    for &(image, bbox, _) in ranked.iter() {
        let gt = &mut ground_truth[image];

        if gt.bboxes.is_empty() {
            outcomes.push(MatchOutcome::FalsePositive);
            continue;
        }

        let ious = iou_candidates(&bbox, &gt.bboxes);

        // first maximum wins
        let (best, best_iou) = ious
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) });

        let outcome = if best_iou < iou_thresh {
            MatchOutcome::FalsePositive
        } else if gt.difficult[best] {
            MatchOutcome::Ignored
        } else if gt.consumed[best] {
            MatchOutcome::FalsePositive
        } else {
            gt.consumed[best] = true;
            MatchOutcome::TruePositive
        };

        outcomes.push(outcome);
    }

    ClassMatches {
        scores: ranked.into_iter().map(|(_, _, score)| score).collect(),
        outcomes,
        n_positive,
    }
}
