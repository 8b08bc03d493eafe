use err_derive::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(display = "Image {}: {} boxes but {} labels and {} scores/flags", image, boxes, labels, other)]
    LengthMismatch {
        image: usize,
        boxes: usize,
        labels: usize,
        other: usize,
    },

    #[error(display = "Image {}: box array must have 4 columns, got {}", image, cols)]
    BadBoxShape { image: usize, cols: usize },

    #[error(display = "Rows need at least {} columns, got {}", needed, cols)]
    ShortRows { needed: usize, cols: usize },

    #[error(display = "Got predictions for {} images but ground truth for {}", predictions, ground_truth)]
    ImageCountMismatch { predictions: usize, ground_truth: usize },

    #[error(display = "Detector returned {} outputs for a batch of {}", got, expected)]
    BatchSizeMismatch { expected: usize, got: usize },

    #[error(display = "Batch has {} inputs but ground truth for {} images", inputs, ground_truth)]
    BatchGroundTruthMismatch { inputs: usize, ground_truth: usize },

    #[error(display = "Evaluation set is empty")]
    EmptyEvaluationSet,

    #[error(display = "Threshold `{}` is out of range: {}", name, value)]
    InvalidThreshold { name: &'static str, value: f32 },

    #[error(display = "Image {}: detection {} has a non-finite score", image, index)]
    InvalidScore { image: usize, index: usize },

    #[error(display = "No such dataset: \"{}\", available: {{{}}}", _0, _1)]
    UnknownDataset(String, String),

    #[error(display = "Detector Error: {}", _0)]
    Detector(String),

    #[error(display = "IO Error: {}", _0)]
    Io(std::io::Error),

    #[error(display = "Json Error: {}", _0)]
    Json(serde_json::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
