use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::{ModelError, ModelResult};

/// Structural role of a single line inside a shard.
///
/// A classification is a pure function of the line content: it must not depend on the line's
/// position or on which shard the line came from.
///
/// Classes:
/// - `HeaderControl`: prologue line (format declaration, metadata, column header) kept only from the first shard.
/// - `PassThrough`: other structural line; also kept only from the first shard.
/// - `Data`: record line kept from every shard in shard order.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineClass {
    HeaderControl,
    PassThrough,
    #[default]
    Data,
}

impl LineClass {
    /// Returns `true` for classes that are emitted from the first shard only.
    #[inline]
    pub fn is_structural(&self) -> bool {
        !matches!(self, LineClass::Data)
    }
}

impl FromStr for LineClass {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "header" | "header-control" => Ok(LineClass::HeaderControl),
            "pass-through" | "passthrough" => Ok(LineClass::PassThrough),
            "data" | "" => Ok(LineClass::Data),
            other => Err(ModelError::UnknownLineClass(other.to_string())),
        }
    }
}

impl fmt::Display for LineClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LineClass::HeaderControl => "header-control",
            LineClass::PassThrough => "pass-through",
            LineClass::Data => "data",
        })
    }
}
