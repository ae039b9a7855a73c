use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A stable document identifier: the row position the document had when the
/// input file was loaded.
///
/// Filtering changes the position a document is displayed at, never its id,
/// so selections and clicks are resolved through this value only.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl DocumentId {
    /// Identifier for the document loaded from the given 0-based data row.
    pub fn from_row(row: usize) -> Self {
        Self(row as u64)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Accepts both `12` and `#12`.
impl FromStr for DocumentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_prefix('#').unwrap_or(s.trim());
        digits.parse::<u64>().map(DocumentId).map_err(|_| {
            Error::Config(format!("invalid document id: {s:?}"))
        })
    }
}
