//! Scalar tracking for evaluation metrics, e.g. `val/voc/mAP` per epoch.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRecord {
    pub tag: String,
    pub value: f64,
    pub step: usize,
}

pub trait ScalarSink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<(), Error>;
}

impl<S: ScalarSink + ?Sized> ScalarSink for &mut S {
    #[inline]
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<(), Error> {
        (**self).add_scalar(tag, value, step)
    }
}

/// Writes `value` under `<prefix>/<key>`.
pub fn write_scalar<S: ScalarSink + ?Sized>(sink: &mut S, prefix: &str, key: &str, value: f64, step: usize) -> Result<(), Error> {
    sink.add_scalar(&format!("{}/{}", prefix, key), value, step)
}

/// Keeps every record in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub records: Vec<ScalarRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Default::default()
    }

    /// Latest value recorded under `tag`.
    pub fn last(&self, tag: &str) -> Option<f64> {
        self.records.iter().rev().find(|r| r.tag == tag).map(|r| r.value)
    }
}

impl ScalarSink for MemorySink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<(), Error> {
        self.records.push(ScalarRecord {
            tag: tag.to_string(),
            value,
            step,
        });

        Ok(())
    }
}

/// One JSON object per line. Undefined values (NaN) are written as `null`.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ScalarSink for JsonLinesSink<W> {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<(), Error> {
        let record = ScalarRecord {
            tag: tag.to_string(),
            value,
            step,
        };

        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;

        Ok(())
    }
}
