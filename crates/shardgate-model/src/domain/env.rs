use serde::{Deserialize, Serialize};

/// Single environment variable handed to a job process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K, V> From<(K, V)> for EnvVar
where
    K: Into<String>,
    V: Into<String>,
{
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// Ordered list of environment variables for a job.
///
/// Serialized as a plain array. Entries are never deduplicated on insert:
/// lookups scan from the end, so a later entry shadows an earlier one with the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Env(Vec<EnvVar>);

impl Env {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvVar> {
        self.0.iter()
    }

    /// Append a variable; it shadows any earlier entry with the same key.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push(EnvVar::new(key, value));
    }

    /// Value of the last entry named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|v| v.key == key)
            .map(|v| v.value.as_str())
    }

    /// Concatenate `overrides` after `self`.
    pub fn merged(&self, overrides: &Env) -> Env {
        Env(self.0.iter().chain(overrides.0.iter()).cloned().collect())
    }
}

impl FromIterator<EnvVar> for Env {
    fn from_iter<T: IntoIterator<Item = EnvVar>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{Env, EnvVar};

    #[test]
    fn later_entry_shadows_earlier() {
        let mut env = Env::new();
        env.push("REF", "hg19");
        env.push("THREADS", "4");
        env.push("REF", "hg38");

        assert_eq!(env.len(), 3);
        assert_eq!(env.get("REF"), Some("hg38"));
        assert_eq!(env.get("THREADS"), Some("4"));
        assert!(env.get("MISSING").is_none());
    }

    #[test]
    fn merged_keeps_base_and_applies_overrides() {
        let base: Env = [EnvVar::new("A", "1"), EnvVar::new("B", "2")]
            .into_iter()
            .collect();
        let mut overrides = Env::new();
        overrides.push("B", "20");

        let merged = base.merged(&overrides);
        assert_eq!(merged.get("A"), Some("1"));
        assert_eq!(merged.get("B"), Some("20"));
        assert_eq!(base.get("B"), Some("2"));
    }

    #[test]
    fn deserializes_from_array() {
        let env: Env =
            serde_json::from_str(r#"[{"key":"SAMPLE","value":"CPG1"}]"#).unwrap();
        assert_eq!(env.get("SAMPLE"), Some("CPG1"));
    }
}
