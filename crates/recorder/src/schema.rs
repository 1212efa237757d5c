//! Configuration schemas
//!
//! Every registered kind carries a schema describing its parameters. The
//! factory checks a candidate configuration against it before the kind's
//! constructor runs.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Structural validator for a kind's parameters
pub trait ConfigSchema: Send + Sync {
    /// Name of the described configuration type
    fn type_name(&self) -> &str;

    /// Check `params`, explaining the first problem found
    fn validate(&self, params: &serde_json::Value) -> Result<(), String>;

    /// Parameters a kind uses when given none
    fn default_params(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Schema backed by a `serde` configuration type
///
/// Parameters are valid when they deserialize into `C`. Config types
/// declare `#[serde(deny_unknown_fields)]` to reject misspelled keys.
pub struct TypedConfigSchema<C> {
    type_name: &'static str,
    defaults: Option<serde_json::Value>,
    _marker: PhantomData<fn() -> C>,
}

impl<C: DeserializeOwned + 'static> TypedConfigSchema<C> {
    /// Schema for `C`
    pub fn new() -> Self {
        TypedConfigSchema {
            type_name: std::any::type_name::<C>(),
            defaults: None,
            _marker: PhantomData,
        }
    }
}

impl<C: DeserializeOwned + Serialize + Default + 'static> TypedConfigSchema<C> {
    /// Schema for `C` advertising `C::default()` as its default parameters
    pub fn with_defaults() -> Self {
        TypedConfigSchema {
            type_name: std::any::type_name::<C>(),
            defaults: serde_json::to_value(C::default()).ok(),
            _marker: PhantomData,
        }
    }
}

impl<C: DeserializeOwned + 'static> Default for TypedConfigSchema<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: DeserializeOwned + 'static> ConfigSchema for TypedConfigSchema<C> {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn validate(&self, params: &serde_json::Value) -> Result<(), String> {
        C::deserialize(params)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn default_params(&self) -> Option<serde_json::Value> {
        self.defaults.clone()
    }
}

/// Schema accepting any object
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyObjectSchema;

impl ConfigSchema for AnyObjectSchema {
    fn type_name(&self) -> &str {
        "object"
    }

    fn validate(&self, params: &serde_json::Value) -> Result<(), String> {
        if params.is_object() {
            Ok(())
        } else {
            Err(format!("expected an object, got {}", params))
        }
    }
}
