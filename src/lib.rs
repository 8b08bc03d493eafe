pub mod dataset;
pub mod detector;
pub mod error;
pub mod summary;
pub mod voc;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use dataset::DatasetKind;
pub use detector::{Batch, Detector};
use crate::error::Error;
use crate::summary::ScalarSink;
pub use voc::{eval_detection_voc, Detection, EvaluationResult, GroundTruth, ImageRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub dataset: DatasetKind,
    pub iou_thresh: f32,
    pub use_07_metric: bool,
    /// Drop detections scoring at or below this before matching.
    pub conf_thresh: Option<f32>,
    /// Run class-aware NMS with this threshold before matching.
    pub nms_thresh: Option<f32>,
    /// Log the APs of labels `0..num_classes` as a dense list instead of
    /// every seen label.
    pub num_classes: Option<usize>,
}

impl EvalConfig {
    pub fn new(dataset: DatasetKind) -> Self {
        Self {
            dataset,
            iou_thresh: 0.5,
            use_07_metric: false,
            conf_thresh: None,
            nms_thresh: None,
            num_classes: None,
        }
    }

    /// Settings of the YOLO evaluation path: raw boxes are filtered at 0.005
    /// and suppressed at 0.45 before matching.
    pub fn yolo(dataset: DatasetKind) -> Self {
        Self {
            conf_thresh: Some(voc::nms::DEFAULT_CONF_THRESH),
            nms_thresh: Some(voc::nms::DEFAULT_NMS_THRESH),
            ..Self::new(dataset)
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        check_unit("iou_thresh", self.iou_thresh)?;

        if let Some(t) = self.nms_thresh {
            check_unit("nms_thresh", t)?;
        }

        if let Some(t) = self.conf_thresh {
            if !(0.0..1.0).contains(&t) {
                return Err(Error::InvalidThreshold { name: "conf_thresh", value: t });
            }
        }

        Ok(())
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self::new(DatasetKind::default())
    }
}

fn check_unit(name: &'static str, value: f32) -> Result<(), Error> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidThreshold { name, value })
    }
}

/// Runs a detector over an evaluation set and reports VOC mAP.
///
/// Holds nothing but its configuration, every call starts from scratch.
#[derive(Debug, Clone)]
pub struct MapEvaluator {
    config: EvalConfig,
}

impl MapEvaluator {
    pub fn new(config: EvalConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Scalar namespace of this evaluator, `val/<dataset>`.
    pub fn tag_prefix(&self) -> String {
        format!("val/{}", self.config.dataset)
    }

    /// Applies the configured confidence filter and NMS to one image.
    pub fn postprocess(&self, detections: Vec<Detection>) -> Vec<Detection> {
        let detections = match self.config.conf_thresh {
            Some(t) => voc::filter_by_confidence(&detections, t),
            None => detections,
        };

        match self.config.nms_thresh {
            Some(t) => voc::nms(&detections, t),
            None => detections,
        }
    }

    /// Evaluates already collected records with the configured thresholds.
    pub fn evaluate(&self, records: &[ImageRecord]) -> Result<EvaluationResult, Error> {
        eval_detection_voc(records, self.config.iou_thresh, self.config.use_07_metric)
    }

    /// Pulls every batch through `detector`, evaluates, logs the per-class
    /// APs and records `val/<dataset>/mAP` at `epoch` in `sink`.
    pub fn run<D, B, S>(&self, mut detector: D, batches: B, epoch: usize, sink: &mut S) -> Result<EvaluationResult, Error>
    where
        D: Detector,
        B: IntoIterator<Item = Batch<D::Input>>,
        S: ScalarSink + ?Sized,
    {
        let mut records = vec![];

        for (i, batch) in batches.into_iter().enumerate() {
            debug!("Eva... batch {} ({} images)", i, batch.len());

            if batch.ground_truth.len() != batch.len() {
                return Err(Error::BatchGroundTruthMismatch {
                    inputs: batch.len(),
                    ground_truth: batch.ground_truth.len(),
                });
            }

            let outputs = detector.detect(&batch.inputs)?;

            if outputs.len() != batch.len() {
                return Err(Error::BatchSizeMismatch {
                    expected: batch.len(),
                    got: outputs.len(),
                });
            }

            for (pred, gt) in outputs.iter().zip(batch.ground_truth.iter()) {
                let image = records.len();
                let detections = self.postprocess(pred.to_detections(image)?);

                records.push(ImageRecord::new(detections, gt.to_ground_truth(image)?));
            }
        }

        let result = self.evaluate(&records)?;

        let aps = match self.config.num_classes {
            Some(n) => format!("{:?}", result.ap_vec(n)),
            None => format!("{:?}", result.aps()),
        };

        info!(
            "Eva({}) epoch {}, APs: {}, mAP: {}",
            self.config.dataset, epoch, aps, result.map
        );

        summary::write_scalar(sink, &self.tag_prefix(), "mAP", result.map, epoch)?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::MemorySink;
    use crate::voc::{RawDetections, RawGroundTruth};
    use ndarray::prelude::*;

    /// Returns whatever was queued for each input id.
    struct Replay(Vec<RawDetections>);

    impl Detector for Replay {
        type Input = usize;

        fn detect(&mut self, batch: &[usize]) -> Result<Vec<RawDetections>, Error> {
            Ok(batch.iter().map(|&i| self.0[i].clone()).collect())
        }
    }

    fn one_box(label: u32, score: f32) -> RawDetections {
        RawDetections {
            boxes: array![[0.0, 0.0, 10.0, 10.0]],
            labels: array![label],
            scores: array![score],
        }
    }

    fn truth(label: u32) -> RawGroundTruth {
        RawGroundTruth::new(array![[0.0, 0.0, 10.0, 10.0]], array![label])
    }

    #[test]
    fn config_defaults() {
        let config = EvalConfig::default();
        assert_eq!(config.dataset, DatasetKind::Voc);
        assert_eq!(config.iou_thresh, 0.5);
        assert!(!config.use_07_metric);
        assert!(config.validate().is_ok());

        let yolo = EvalConfig::yolo(DatasetKind::Rtts);
        assert_eq!(yolo.conf_thresh, Some(0.005));
        assert_eq!(yolo.nms_thresh, Some(0.45));
    }

    #[test]
    fn config_validation() {
        let mut config = EvalConfig::default();
        config.iou_thresh = 0.0;
        assert!(matches!(MapEvaluator::new(config), Err(Error::InvalidThreshold { name: "iou_thresh", .. })));

        let mut config = EvalConfig::default();
        config.nms_thresh = Some(1.2);
        assert!(matches!(config.validate(), Err(Error::InvalidThreshold { name: "nms_thresh", .. })));

        let mut config = EvalConfig::default();
        config.conf_thresh = Some(1.0);
        assert!(matches!(config.validate(), Err(Error::InvalidThreshold { name: "conf_thresh", .. })));
    }

    #[test]
    fn config_from_json_file() {
        let path = std::env::temp_dir().join(format!("detection-map-config-{}.json", std::process::id()));

        std::fs::write(&path, r#"{"dataset": "rtts", "nms_thresh": 0.45}"#).unwrap();
        let config = EvalConfig::from_json_file(&path).unwrap();
        assert_eq!(config.dataset, DatasetKind::Rtts);
        assert_eq!(config.nms_thresh, Some(0.45));

        std::fs::write(&path, r#"{"dataset": "rtts", "iou_thresh": 2.0}"#).unwrap();
        assert!(matches!(EvalConfig::from_json_file(&path), Err(Error::InvalidThreshold { name: "iou_thresh", .. })));

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(EvalConfig::from_json_file(&path), Err(Error::Json(_))));

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(EvalConfig::from_json_file(&path), Err(Error::Io(_))));
    }

    #[test]
    fn config_from_partial_json() {
        let config: EvalConfig = serde_json::from_str(r#"{"dataset": "wheat", "use_07_metric": true}"#).unwrap();
        assert_eq!(config.dataset, DatasetKind::Wheat);
        assert!(config.use_07_metric);
        assert_eq!(config.iou_thresh, 0.5);
        assert_eq!(config.nms_thresh, None);
    }

    #[test]
    fn run_collects_batches_and_records_map() {
        let detector = Replay(vec![one_box(0, 0.9), one_box(1, 0.8), RawDetections::empty()]);
        let batches = vec![
            Batch::new(vec![0, 1], vec![truth(0), truth(1)]).unwrap(),
            Batch::new(vec![2], vec![truth(1)]).unwrap(),
        ];

        let evaluator = MapEvaluator::new(EvalConfig::new(DatasetKind::Cityscapes)).unwrap();
        let mut sink = MemorySink::new();
        let result = evaluator.run(detector, batches, 7, &mut sink).unwrap();

        assert_eq!(result.ap(0), Some(1.0));
        assert_eq!(result.ap(1), Some(0.5));
        assert_eq!(result.map, 0.75);
        assert_eq!(sink.records.len(), 1);
        assert_eq!(sink.records[0].tag, "val/cityscapes/mAP");
        assert_eq!(sink.records[0].step, 7);
        assert_eq!(sink.last("val/cityscapes/mAP"), Some(0.75));
    }

    #[test]
    fn run_applies_postprocessing() {
        let noisy = RawDetections {
            boxes: array![[0.0, 0.0, 10.0, 10.0], [0.0, 0.0, 10.0, 10.0], [40.0, 40.0, 50.0, 50.0]],
            labels: array![0, 0, 0],
            scores: array![0.9, 0.8, 0.001],
        };

        let plain = MapEvaluator::new(EvalConfig::new(DatasetKind::Voc)).unwrap();
        let yolo = MapEvaluator::new(EvalConfig::yolo(DatasetKind::Voc)).unwrap();

        let batches = || vec![Batch::new(vec![0], vec![truth(0)]).unwrap()];

        let mut sink = MemorySink::new();
        let raw = plain.run(Replay(vec![noisy.clone()]), batches(), 0, &mut sink).unwrap();
        let cleaned = yolo.run(Replay(vec![noisy]), batches(), 0, &mut sink).unwrap();

        assert_eq!(raw.per_class[&0].precision, vec![1.0, 0.5, 1.0 / 3.0]);
        assert_eq!(cleaned.per_class[&0].precision, vec![1.0]);
    }

    #[test]
    fn run_rejects_short_detector_output() {
        struct Lossy;

        impl Detector for Lossy {
            type Input = ();

            fn detect(&mut self, _batch: &[()]) -> Result<Vec<RawDetections>, Error> {
                Ok(vec![])
            }
        }

        let evaluator = MapEvaluator::new(EvalConfig::default()).unwrap();
        let batches = vec![Batch::new(vec![()], vec![truth(0)]).unwrap()];

        assert!(matches!(
            evaluator.run(Lossy, batches, 0, &mut MemorySink::new()),
            Err(Error::BatchSizeMismatch { expected: 1, got: 0 })
        ));
    }

    #[test]
    fn run_rejects_nan_scores_before_nms() {
        let noisy = RawDetections {
            boxes: array![[0.0, 0.0, 10.0, 10.0], [0.0, 0.0, 10.0, 10.0], [40.0, 40.0, 50.0, 50.0]],
            labels: array![0, 0, 0],
            scores: array![0.9, f32::NAN, 0.4],
        };

        let mut config = EvalConfig::default();
        config.nms_thresh = Some(0.45);
        let evaluator = MapEvaluator::new(config).unwrap();
        let batches = vec![
            Batch::new(vec![0], vec![truth(0)]).unwrap(),
            Batch::new(vec![1], vec![truth(0)]).unwrap(),
        ];

        assert!(matches!(
            evaluator.run(Replay(vec![one_box(0, 0.9), noisy]), batches, 0, &mut MemorySink::new()),
            Err(Error::InvalidScore { image: 1, index: 1 })
        ));
    }

    #[test]
    fn run_surfaces_detector_failures() {
        struct Broken;

        impl Detector for Broken {
            type Input = ();

            fn detect(&mut self, _batch: &[()]) -> Result<Vec<RawDetections>, Error> {
                Err(Error::Detector("weights not loaded".to_string()))
            }
        }

        let evaluator = MapEvaluator::new(EvalConfig::default()).unwrap();
        let batches = vec![Batch::new(vec![()], vec![truth(0)]).unwrap()];
        let mut sink = MemorySink::new();

        match evaluator.run(Broken, batches, 0, &mut sink) {
            Err(Error::Detector(msg)) => assert_eq!(msg, "weights not loaded"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(sink.records.is_empty());
    }

    #[test]
    fn run_rejects_mismatched_ground_truth() {
        let evaluator = MapEvaluator::new(EvalConfig::default()).unwrap();
        let mut batch = Batch::new(vec![0], vec![truth(0)]).unwrap();
        batch.ground_truth.push(truth(1));

        assert!(matches!(
            evaluator.run(Replay(vec![one_box(0, 0.9)]), vec![batch], 0, &mut MemorySink::new()),
            Err(Error::BatchGroundTruthMismatch { inputs: 1, ground_truth: 2 })
        ));
    }

    #[test]
    fn run_logs_huge_labels_without_densifying() {
        let detector = Replay(vec![one_box(u32::MAX - 1, 0.9)]);
        let batches = vec![Batch::new(vec![0], vec![truth(u32::MAX - 1)]).unwrap()];

        let evaluator = MapEvaluator::new(EvalConfig::default()).unwrap();
        let result = evaluator.run(detector, batches, 0, &mut MemorySink::new()).unwrap();
        assert_eq!(result.map, 1.0);

        let mut config = EvalConfig::default();
        config.num_classes = Some(3);
        let evaluator = MapEvaluator::new(config).unwrap();
        let batches = vec![Batch::new(vec![0], vec![truth(u32::MAX - 1)]).unwrap()];
        let result = evaluator.run(Replay(vec![one_box(u32::MAX - 1, 0.9)]), batches, 0, &mut MemorySink::new()).unwrap();
        assert_eq!(result.map, 1.0);
    }

    #[test]
    fn run_on_nothing_is_an_error() {
        let evaluator = MapEvaluator::new(EvalConfig::default()).unwrap();
        let batches: Vec<Batch<usize>> = vec![];

        assert!(matches!(
            evaluator.run(Replay(vec![]), batches, 0, &mut MemorySink::new()),
            Err(Error::EmptyEvaluationSet)
        ));
    }
}
