//! Logical key to stored-function name resolution.

use std::collections::HashMap;
use std::path::Path;

use asset_features_core::StoreError;
use serde::Deserialize;

/// Configured mapping from logical operation keys (`GetMapViewByConfigId`,
/// ...) to the physical function names that implement them.
///
/// Keys are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, String>")]
pub struct FunctionMap {
    entries: HashMap<String, String>,
}

impl FunctionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl AsRef<str>, function: impl Into<String>) {
        self.entries
            .insert(key.as_ref().to_ascii_lowercase(), function.into());
    }

    /// Looks up the function implementing `key`.
    ///
    /// # Errors
    ///
    /// [`StoreError::MissingProcedure`] when `key` is not configured. This is a
    /// configuration fault and is never downgraded.
    pub fn resolve(&self, key: &str) -> Result<&str, StoreError> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
            .ok_or_else(|| StoreError::MissingProcedure {
                key: key.to_string(),
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads a JSON object of `"LogicalKey": "function_name"` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not such an object.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read function map {}: {e}", path.display()))?;
        let map = serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("invalid function map {}: {e}", path.display()))?;
        Ok(map)
    }
}

impl From<HashMap<String, String>> for FunctionMap {
    fn from(raw: HashMap<String, String>) -> Self {
        raw.into_iter().collect()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for FunctionMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, function) in iter {
            map.insert(key, function);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn resolve_is_case_insensitive() {
        let map: FunctionMap = [("GetMapViewByConfigId", "fn_get_map_view")]
            .into_iter()
            .collect();
        assert_eq!(map.resolve("getmapviewbyconfigid"), Ok("fn_get_map_view"));
        assert_eq!(map.resolve("GETMAPVIEWBYCONFIGID"), Ok("fn_get_map_view"));
    }

    #[test]
    fn missing_key_is_a_configuration_fault() {
        let err = FunctionMap::new().resolve("GetAllStyles").unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(
            err,
            StoreError::MissingProcedure {
                key: "GetAllStyles".to_string()
            }
        );
    }

    #[test]
    fn load_reads_json_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"GetMapConfigs": "fn_get_map_configs", "GetAllStyles": "fn_get_all_styles"}}"#
        )
        .unwrap();

        let map = FunctionMap::load(file.path()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("GetAllStyles"), Ok("fn_get_all_styles"));
    }

    #[test]
    fn load_rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        assert!(FunctionMap::load(file.path()).is_err());
    }
}
