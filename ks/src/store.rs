//! The KeyValueStore capability

use std::collections::BTreeMap;

use crate::error::{Result, StoreError};
use crate::value::{DataType, Value};

/// All fields of a store, keyed by field name
pub type Fields = BTreeMap<String, Value>;

/// A shared field store
///
/// Implementations acquire their backing object for the duration of each
/// call and release it before returning. `update` is the only way to change
/// several fields at once and must be applied as one atomic step.
pub trait KeyValueStore: Send + Sync {
    /// Read a single field
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Apply a read-modify-write to the fields as one atomic step
    fn update(&self, apply: &mut dyn FnMut(&mut Fields)) -> Result<()>;

    /// Copy of every field
    fn snapshot(&self) -> Result<Fields>;

    /// Read several fields in one acquisition, in the order given
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Value>>> {
        let fields = self.snapshot()?;
        Ok(keys.iter().map(|key| fields.get(*key).cloned()).collect())
    }

    /// Write a single field
    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut value = Some(value);
        self.update(&mut |fields| {
            if let Some(v) = value.take() {
                fields.insert(key.to_string(), v);
            }
        })
    }

    /// Names of every field
    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.snapshot()?.into_keys().collect())
    }
}

/// Typed accessors for the two field data types
pub trait StoreExt: KeyValueStore {
    /// Read a field that must hold the given data type
    fn get_typed(&self, data_type: DataType, key: &str) -> Result<Option<Value>> {
        match self.get(key)? {
            Some(value) if value.data_type() != data_type => Err(StoreError::TypeMismatch {
                key: key.to_string(),
                expected: data_type,
                found: value.data_type(),
            }),
            other => Ok(other),
        }
    }

    /// Read a string field; `None` when the field was never written
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get_typed(DataType::String, key)?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    /// Read a bool field; an unwritten field reads as `false`
    fn get_bool(&self, key: &str) -> Result<bool> {
        Ok(self
            .get_typed(DataType::Bool, key)?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    fn set_string(&self, key: &str, value: impl Into<String>) -> Result<()> {
        self.set(key, Value::String(value.into()))
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set(key, Value::Bool(value))
    }
}

impl<S: KeyValueStore + ?Sized> StoreExt for S {}
