use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Datasets the harness knows how to name. Annotation parsing lives with the
/// dataset adapters; here the name only selects tags and log prefixes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Voc,
    Apollo,
    Cityscapes,
    Wheat,
    WiderFace,
    Rtts,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 6] = [
        DatasetKind::Voc,
        DatasetKind::Apollo,
        DatasetKind::Cityscapes,
        DatasetKind::Wheat,
        DatasetKind::WiderFace,
        DatasetKind::Rtts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::Voc => "voc",
            DatasetKind::Apollo => "apollo",
            DatasetKind::Cityscapes => "cityscapes",
            DatasetKind::Wheat => "wheat",
            DatasetKind::WiderFace => "widerface",
            DatasetKind::Rtts => "rtts",
        }
    }
}

impl Default for DatasetKind {
    fn default() -> Self {
        DatasetKind::Voc
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                let available: Vec<_> = DatasetKind::ALL.iter().map(|k| k.name()).collect();
                Error::UnknownDataset(s.to_string(), available.join("|"))
            })
    }
}
