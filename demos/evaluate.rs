use detection_map::detector::yolo;
use detection_map::summary::JsonLinesSink;
use detection_map::voc::RawDetections;
use detection_map::{Batch, DatasetKind, Detector, EvalConfig, MapEvaluator};
use ndarray::prelude::*;

const SIZE: f32 = 512.0;

/// Pretends to be a YOLO network: for every image it emits the ground truth
/// boxes nudged a little, plus one stray box, in region-layer layout.
struct FakeYolo {
    labels: Vec<Array2<f32>>,
}

impl Detector for FakeYolo {
    type Input = usize;

    fn detect(&mut self, batch: &[usize]) -> Result<Vec<RawDetections>, detection_map::error::Error> {
        batch
            .iter()
            .map(|&idx| {
                let truths = self.labels[idx].view();
                let n = yolo::truths_length(truths);

                let mut rows = Array2::<f32>::zeros((n + 1, 7));
                for (i, t) in truths.outer_iter().take(n).enumerate() {
                    let shift = 0.01 * (i % 3) as f32;
                    rows.row_mut(i).assign(&aview1(&[
                        t[1] + shift, t[2] - shift, t[3], t[4],
                        0.9 - 0.1 * i as f32, 0.95, t[0],
                    ]));
                }
                rows.row_mut(n).assign(&aview1(&[0.9, 0.9, 0.05, 0.05, 0.6, 0.5, 0.0]));

                yolo::decode_region_boxes(rows.view(), SIZE, SIZE)
            })
            .collect()
    }
}

fn main() -> Result<(), anyhow::Error> {
    let labels: Vec<Array2<f32>> = vec![
        aview2(&[[0.0, 0.3, 0.3, 0.2, 0.2], [1.0, 0.7, 0.6, 0.1, 0.3]]).to_owned(),
        aview2(&[[1.0, 0.5, 0.5, 0.4, 0.4], [0.0, 0.0, 0.0, 0.0, 0.0]]).to_owned(),
        aview2(&[[2.0, 0.2, 0.8, 0.1, 0.1], [0.0, 0.6, 0.2, 0.3, 0.2]]).to_owned(),
    ];

    let batches: Vec<Batch<usize>> = vec![
        Batch::new(vec![0, 1], vec![
            yolo::decode_truths(labels[0].view(), SIZE, SIZE)?,
            yolo::decode_truths(labels[1].view(), SIZE, SIZE)?,
        ])?,
        Batch::new(vec![2], vec![yolo::decode_truths(labels[2].view(), SIZE, SIZE)?])?,
    ];

    let mut config = EvalConfig::yolo(DatasetKind::Rtts);
    config.num_classes = Some(3);

    let evaluator = MapEvaluator::new(config)?;
    let mut sink = JsonLinesSink::new(std::io::stdout());
    let result = evaluator.run(FakeYolo { labels }, batches, 1, &mut sink)?;

    for (class, res) in result.per_class.iter() {
        println!("class {}: AP {:.4} over {} objects", class, res.ap, res.n_positive);
    }
    println!("mAP {:.4}", result.map);

    Ok(())
}
