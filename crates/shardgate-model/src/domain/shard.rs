use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Sort key of a shard.
///
/// Only used to order shards; keys need not be contiguous or start at a particular value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardKey(u64);

impl ShardKey {
    pub const fn new(key: u64) -> Self {
        Self(key)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ShardKey {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl fmt::Display for ShardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ShardKey {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| ModelError::InvalidShardKey(format!("{s}: {e}")))
    }
}

/// How a shard key is derived from a shard's file name.
///
/// Rules:
/// - `FirstNumber`: the first run of ASCII digits in the file name (`chunk_07_of_20.json` -> 7).
/// - `AfterMarker`: the digits directly following `marker` (`CPG1_eh_shard12.vcf.gz` with `eh_shard` -> 12).
///
/// Only the last path component is inspected, so directory names never leak into the key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShardKeyRule {
    #[default]
    FirstNumber,
    AfterMarker(String),
}

impl ShardKeyRule {
    /// Derive the key for `file_name`, or `None` when the rule does not match.
    pub fn derive(&self, file_name: &str) -> Option<ShardKey> {
        let name = file_name.rsplit('/').next().unwrap_or(file_name);
        match self {
            ShardKeyRule::FirstNumber => {
                let start = name.find(|c: char| c.is_ascii_digit())?;
                leading_number(&name[start..])
            }
            ShardKeyRule::AfterMarker(marker) => {
                let (_, rest) = name.split_once(marker.as_str())?;
                leading_number(rest)
            }
        }
    }
}

fn leading_number(s: &str) -> Option<ShardKey> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    s[..end].parse::<u64>().ok().map(ShardKey)
}

impl FromStr for ShardKeyRule {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "first-number" | "number" => return Ok(ShardKeyRule::FirstNumber),
            _ => {}
        }
        match trimmed.split_once(':') {
            Some((kind, marker)) if kind.eq_ignore_ascii_case("marker") && !marker.is_empty() => {
                Ok(ShardKeyRule::AfterMarker(marker.to_string()))
            }
            _ => Err(ModelError::UnknownKeyRule(s.to_string())),
        }
    }
}

impl fmt::Display for ShardKeyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardKeyRule::FirstNumber => f.write_str("first-number"),
            ShardKeyRule::AfterMarker(m) => write!(f, "marker:{m}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_number_uses_first_digit_run() {
        let rule = ShardKeyRule::FirstNumber;
        assert_eq!(rule.derive("chunk_07_of_20.json"), Some(ShardKey::new(7)));
        assert_eq!(rule.derive("catalog12.json"), Some(ShardKey::new(12)));
        assert_eq!(rule.derive("catalog.json"), None);
    }

    #[test]
    fn first_number_ignores_directories() {
        let rule = ShardKeyRule::FirstNumber;
        assert_eq!(
            rule.derive("gs-bucket/run5/catalog_3.json"),
            Some(ShardKey::new(3))
        );
    }

    #[test]
    fn after_marker_reads_digits_following_marker() {
        let rule = ShardKeyRule::AfterMarker("eh_shard".into());
        assert_eq!(
            rule.derive("CPG199760_eh_shard12.vcf.gz"),
            Some(ShardKey::new(12))
        );
        assert_eq!(rule.derive("CPG199760_eh.vcf.gz"), None);
        assert_eq!(rule.derive("x_eh_shard.vcf.gz"), None);
    }

    #[test]
    fn parses_rules() {
        assert_eq!(
            "first-number".parse::<ShardKeyRule>().unwrap(),
            ShardKeyRule::FirstNumber
        );
        assert_eq!(
            "marker:eh_shard".parse::<ShardKeyRule>().unwrap(),
            ShardKeyRule::AfterMarker("eh_shard".into())
        );
        assert!("marker:".parse::<ShardKeyRule>().is_err());
        assert!("glob:*".parse::<ShardKeyRule>().is_err());
    }

    #[test]
    fn display_matches_parse() {
        for rule in [
            ShardKeyRule::FirstNumber,
            ShardKeyRule::AfterMarker("eh_shard".into()),
        ] {
            let back: ShardKeyRule = rule.to_string().parse().unwrap();
            assert_eq!(back, rule);
        }
    }

    #[test]
    fn shard_key_rejects_non_numeric() {
        assert_eq!("42".parse::<ShardKey>().unwrap(), ShardKey::new(42));
        assert!("4x".parse::<ShardKey>().is_err());
    }
}
