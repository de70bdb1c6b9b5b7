use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::config::parse_by_extension;

/// A key-value map containing confidential data.
///
/// Only consulted while compiling the configuration. `Debug` prints the
/// keys but never the values.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secrets(HashMap<String, String>);

impl Secrets {
    /// Load secrets from a flat JSON, YAML or TOML map of strings.
    ///
    /// The format is chosen by extension; anything else is rejected.
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
        if !matches!(extension, "json" | "yaml" | "yml" | "toml") {
            bail!("Unrecognised secrets file extension: '{extension}'");
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read secrets file: {}", path.display()))?;

        let values: HashMap<String, String> = parse_by_extension(path, &contents)?;
        log::debug!("Loaded {} secrets from {}", values.len(), path.display());
        Ok(Self(values))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Secrets {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.0.keys().collect();
        keys.sort();
        f.debug_struct("Secrets").field("keys", &keys).finish()
    }
}
