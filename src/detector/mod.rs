pub mod yolo;

use crate::error::Error;
use crate::voc::{RawDetections, RawGroundTruth};

/// Anything that turns a batch of inputs into per-image detections.
///
/// EfficientDet, Faster R-CNN and YOLO wrappers only need this one
/// capability to be evaluated; how they load weights or train is their own
/// business.
pub trait Detector {
    type Input;

    /// Returns exactly one `RawDetections` per element of `batch`, in order.
    fn detect(&mut self, batch: &[Self::Input]) -> Result<Vec<RawDetections>, Error>;
}

impl<D: Detector + ?Sized> Detector for &mut D {
    type Input = D::Input;

    #[inline]
    fn detect(&mut self, batch: &[Self::Input]) -> Result<Vec<RawDetections>, Error> {
        (**self).detect(batch)
    }
}

/// One batch of an evaluation set: model inputs and their ground truth.
#[derive(Debug, Clone)]
pub struct Batch<I> {
    pub inputs: Vec<I>,
    pub ground_truth: Vec<RawGroundTruth>,
}

impl<I> Batch<I> {
    pub fn new(inputs: Vec<I>, ground_truth: Vec<RawGroundTruth>) -> Result<Self, Error> {
        if inputs.len() != ground_truth.len() {
            return Err(Error::BatchGroundTruthMismatch {
                inputs: inputs.len(),
                ground_truth: ground_truth.len(),
            });
        }

        Ok(Self { inputs, ground_truth })
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::prelude::*;

    #[test]
    fn batch_needs_ground_truth_per_input() {
        let truth = RawGroundTruth::new(array![[0.0, 0.0, 1.0, 1.0]], array![0]);

        let batch = Batch::new(vec![1, 2], vec![truth.clone(), truth.clone()]).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(!batch.is_empty());

        assert!(matches!(
            Batch::new(vec![1, 2], vec![truth]),
            Err(Error::BatchGroundTruthMismatch { inputs: 2, ground_truth: 1 })
        ));
    }
}
