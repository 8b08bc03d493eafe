use ndarray::prelude::*;

use crate::error::Error;
use crate::voc::{BBox, Ltrb};

///
/// This class represents a bounding box detection in a single image.
/// Parameters
///
/// bbox : BBox in format `(x1, y1, x2, y2)`, pixel space.
/// label : u32 - Class label.
/// score : f32 - Detector confidence score.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BBox<Ltrb>,
    pub label: u32,
    pub score: f32,
}

impl Detection {
    #[inline]
    pub fn new(bbox: BBox<Ltrb>, label: u32, score: f32) -> Self {
        Self { bbox, label, score }
    }
}

/// A ground-truth object. `difficult` boxes are excluded from scoring
/// but a detection that lands on one is not penalized either.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundTruth {
    pub bbox: BBox<Ltrb>,
    pub label: u32,
    pub difficult: bool,
}

impl GroundTruth {
    #[inline]
    pub fn new(bbox: BBox<Ltrb>, label: u32) -> Self {
        Self { bbox, label, difficult: false }
    }

    #[inline]
    pub fn difficult(bbox: BBox<Ltrb>, label: u32) -> Self {
        Self { bbox, label, difficult: true }
    }
}

/// Everything known about one image of the evaluation set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageRecord {
    pub detections: Vec<Detection>,
    pub ground_truth: Vec<GroundTruth>,
}

impl ImageRecord {
    pub fn new(detections: Vec<Detection>, ground_truth: Vec<GroundTruth>) -> Self {
        Self { detections, ground_truth }
    }

    /// Builds a record from the array form produced by detectors and dataset adapters.
    /// `image` is only used to label errors.
    pub fn from_arrays(image: usize, pred: &RawDetections, gt: &RawGroundTruth) -> Result<Self, Error> {
        Ok(Self {
            detections: pred.to_detections(image)?,
            ground_truth: gt.to_ground_truth(image)?,
        })
    }
}

/// Per-image detector output: three parallel arrays.
///
/// ```text
///     boxes : Array2<f32>
///         An Nx4 matrix of `(x1, y1, x2, y2)` boxes.
///     labels : Array1<u32>
///         N class labels.
///     scores : Array1<f32>
///         N confidence scores.
/// ```
///
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetections {
    pub boxes: Array2<f32>,
    pub labels: Array1<u32>,
    pub scores: Array1<f32>,
}

impl RawDetections {
    pub fn empty() -> Self {
        Self {
            boxes: Array2::zeros((0, 4)),
            labels: Array1::zeros(0),
            scores: Array1::zeros(0),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rejects non-finite scores so nothing downstream has to rank them.
    pub fn to_detections(&self, image: usize) -> Result<Vec<Detection>, Error> {
        check_shape(image, self.boxes.view(), self.labels.len(), self.scores.len())?;

        if let Some(index) = self.scores.iter().position(|s| !s.is_finite()) {
            return Err(Error::InvalidScore { image, index });
        }

        Ok(self.boxes
            .outer_iter()
            .zip(self.labels.iter().zip(self.scores.iter()))
            .map(|(row, (&label, &score))| Detection::new(BBox::from_row(row), label, score))
            .collect())
    }

    pub fn from_detections(detections: &[Detection]) -> Self {
        let mut boxes = Array2::<f32>::zeros((detections.len(), 4));

        for (mut row, det) in boxes.outer_iter_mut().zip(detections.iter()) {
            row.assign(&det.bbox.as_view());
        }

        Self {
            boxes,
            labels: detections.iter().map(|d| d.label).collect(),
            scores: detections.iter().map(|d| d.score).collect(),
        }
    }
}

/// Per-image ground truth as parallel arrays. A missing `difficult` array
/// means no box is difficult.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGroundTruth {
    pub boxes: Array2<f32>,
    pub labels: Array1<u32>,
    pub difficult: Option<Array1<bool>>,
}

impl RawGroundTruth {
    pub fn new(boxes: Array2<f32>, labels: Array1<u32>) -> Self {
        Self { boxes, labels, difficult: None }
    }

    pub fn with_difficult(mut self, difficult: Array1<bool>) -> Self {
        self.difficult = Some(difficult);
        self
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_ground_truth(&self, image: usize) -> Result<Vec<GroundTruth>, Error> {
        let flags = self.difficult.as_ref().map_or(self.labels.len(), |d| d.len());
        check_shape(image, self.boxes.view(), self.labels.len(), flags)?;

        Ok(self.boxes
            .outer_iter()
            .zip(self.labels.iter())
            .enumerate()
            .map(|(i, (row, &label))| GroundTruth {
                bbox: BBox::from_row(row),
                label,
                difficult: self.difficult.as_ref().map_or(false, |d| d[i]),
            })
            .collect())
    }
}

fn check_shape(image: usize, boxes: ArrayView2<'_, f32>, labels: usize, other: usize) -> Result<(), Error> {
    if boxes.ncols() != 4 && !(boxes.nrows() == 0 && labels == 0 && other == 0) {
        return Err(Error::BadBoxShape { image, cols: boxes.ncols() });
    }

    if boxes.nrows() != labels || labels != other {
        return Err(Error::LengthMismatch {
            image,
            boxes: boxes.nrows(),
            labels,
            other,
        });
    }

    Ok(())
}
