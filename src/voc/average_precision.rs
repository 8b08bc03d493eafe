use crate::voc::MatchOutcome;

/// Precision and recall after each ranked detection.
///
/// ```text
///     Parameters
///     ----------
///     outcomes : &[MatchOutcome]
///         Matching outcomes in descending score order. `Ignored` entries take
///         no part in the curve.
///     n_positive : usize
///         Number of non-difficult ground-truth boxes of the class.
///
///     Returns
///     -------
///     Option<(Vec<f64>, Vec<f64>)>
///         `(precision, recall)`, or `None` when `n_positive` is zero and
///         recall is undefined.
/// ```
///
pub fn precision_recall(outcomes: &[MatchOutcome], n_positive: usize) -> Option<(Vec<f64>, Vec<f64>)> {
    if n_positive == 0 {
        return None;
    }

    let (mut tp, mut fp) = (0usize, 0usize);
    let (mut precision, mut recall) = (vec![], vec![]);

    for outcome in outcomes {
        match outcome {
            MatchOutcome::TruePositive => tp += 1,
            MatchOutcome::FalsePositive => fp += 1,
            MatchOutcome::Ignored => continue,
        }

        precision.push(tp as f64 / (tp + fp) as f64);
        recall.push(tp as f64 / n_positive as f64);
    }

    Some((precision, recall))
}

/// Area under the precision/recall curve.
///
/// With `use_07_metric` the VOC2007 11-point interpolation is used: the mean
/// over recall levels `0, 0.1, ..., 1` of the best precision reached at or
/// above that level. Otherwise the curve is replaced by its non-increasing
/// envelope and integrated exactly at the points where recall changes.
pub fn average_precision(precision: &[f64], recall: &[f64], use_07_metric: bool) -> f64 {
    debug_assert_eq!(precision.len(), recall.len());

    if use_07_metric {
        return (0..=10)
            .map(|t| {
                let t = t as f64 / 10.0;

                precision
                    .iter()
                    .zip(recall.iter())
                    .filter(|&(_, &r)| r >= t)
                    .map(|(&p, _)| p)
                    .fold(0.0, f64::max)
            })
            .sum::<f64>() / 11.0;
    }

    let mrec: Vec<f64> = std::iter::once(0.0)
        .chain(recall.iter().copied())
        .chain(std::iter::once(1.0))
        .collect();

    let mut mpre: Vec<f64> = std::iter::once(0.0)
        .chain(precision.iter().copied())
        .chain(std::iter::once(0.0))
        .collect();

    for i in (1..mpre.len()).rev() {
        mpre[i - 1] = mpre[i - 1].max(mpre[i]);
    }

    (1..mrec.len())
        .filter(|&i| mrec[i] != mrec[i - 1])
        .map(|i| (mrec[i] - mrec[i - 1]) * mpre[i])
        .sum()
}
