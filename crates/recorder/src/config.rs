//! Recorder configuration
//!
//! A [`RecorderConfig`] names the kind to construct and carries the kind's
//! parameters as an opaque JSON document. Configurations are read from TOML
//! (the usual on-disk form) or JSON.
//!
//! ```toml
//! [[recorder]]
//! id = "events"
//! type = "memory"
//! params = { dataset = "events", max_rows = 10000 }
//! ```

use std::path::Path as FsPath;

use serde::{Deserialize, Serialize};
use strata_core::{StrataError, StrataResult};

/// Configuration for one recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Optional instance identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Kind name, resolved against the registry
    #[serde(rename = "type")]
    pub kind: String,
    /// Package qualifying `kind` when several packages register the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Kind-specific parameters
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub params: serde_json::Value,
}

impl RecorderConfig {
    /// Config for `kind` with no parameters
    pub fn new(kind: impl Into<String>) -> Self {
        RecorderConfig {
            id: None,
            kind: kind.into(),
            package: None,
            params: serde_json::Value::Null,
        }
    }

    /// Replace the parameters
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    /// Set a single parameter, turning `params` into an object if needed
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        if !self.params.is_object() {
            self.params = serde_json::Value::Object(serde_json::Map::new());
        }
        if let serde_json::Value::Object(map) = &mut self.params {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Set the instance identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Qualify the kind with a package
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Parameters, with a missing (null) document read as `{}`
    pub fn params_or_empty(&self) -> serde_json::Value {
        match &self.params {
            serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
            other => other.clone(),
        }
    }

    /// Instance identifier, generating a fresh one when unset
    pub fn id_or_generate(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.kind, uuid::Uuid::new_v4()))
    }

    /// Parse a config from JSON text
    pub fn from_json(text: &str) -> StrataResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> StrataResult<Self> {
        let value: toml::Value = toml::from_str(text)
            .map_err(|e| StrataError::Serialization(format!("invalid recorder config: {}", e)))?;
        from_toml_value(value)
    }

    /// Load a config from a file
    ///
    /// Files ending in `.json` are read as JSON, everything else as TOML.
    pub fn from_file(path: impl AsRef<FsPath>) -> StrataResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        if is_json(path) {
            Self::from_json(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }
}

/// A file of recorder configs, one `[[recorder]]` table each
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecorderConfigSet {
    /// Configured recorders, in file order
    #[serde(default)]
    pub recorder: Vec<RecorderConfig>,
}

impl RecorderConfigSet {
    /// Parse a config set from TOML text
    pub fn from_toml_str(text: &str) -> StrataResult<Self> {
        let value: toml::Value = toml::from_str(text)
            .map_err(|e| StrataError::Serialization(format!("invalid recorder config: {}", e)))?;
        from_toml_value(value)
    }

    /// Load a config set from a file, JSON for `.json` and TOML otherwise
    pub fn from_file(path: impl AsRef<FsPath>) -> StrataResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        if is_json(path) {
            Ok(serde_json::from_str(&text)?)
        } else {
            Self::from_toml_str(&text)
        }
    }

    /// Write the set as TOML
    ///
    /// TOML has no null: null-valued keys in `params` are left out, so they
    /// read back as absent. A null inside an array cannot be written and
    /// fails with a serialization error.
    pub fn write_to_file(&self, path: impl AsRef<FsPath>) -> StrataResult<()> {
        let mut set = self.clone();
        for config in &mut set.recorder {
            strip_null_keys(&mut config.params);
        }
        let text = toml::to_string_pretty(&set)
            .map_err(|e| StrataError::Serialization(format!("cannot encode recorder config: {}", e)))?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

fn strip_null_keys(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_null_keys);
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(strip_null_keys),
        _ => {}
    }
}

fn is_json(path: &FsPath) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

// TOML tables go through JSON so `params` keeps the same shape regardless of
// the source format.
fn from_toml_value<T: serde::de::DeserializeOwned>(value: toml::Value) -> StrataResult<T> {
    let json = serde_json::to_value(value)?;
    Ok(serde_json::from_value(json)?)
}
