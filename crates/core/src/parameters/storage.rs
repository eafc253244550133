//! Parameter store
//!
//! Fixed-capacity map from short upper-case names to typed values. Every
//! parameter must be registered (with its default) before it can be set.

use super::error::ParameterError;
use bitflags::bitflags;
use heapless::index_map::FnvIndexMap;
use heapless::String;

/// Maximum parameter name length
pub const PARAM_NAME_LEN: usize = 16;

/// Maximum number of parameters
pub const MAX_PARAMS: usize = 64;

/// Parameter name key
pub type ParamName = String<PARAM_NAME_LEN>;

bitflags! {
    /// Parameter flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ParamFlags: u8 {
        /// Reported but never writable (derived from the build)
        const READ_ONLY = 0b00000001;
    }
}

/// Parameter value types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// Boolean parameter
    Bool(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 32-bit floating point
    Float(f32),
}

impl ParamValue {
    /// Value as an integer, truncating floats.
    pub fn as_int(&self) -> i32 {
        match *self {
            ParamValue::Bool(v) => i32::from(v),
            ParamValue::Int(v) => v,
            ParamValue::Float(v) => v as i32,
        }
    }

    /// Value as a float.
    pub fn as_float(&self) -> f32 {
        match *self {
            ParamValue::Bool(v) => f32::from(u8::from(v)),
            ParamValue::Int(v) => v as f32,
            ParamValue::Float(v) => v,
        }
    }

    fn same_kind(&self, other: &ParamValue) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: ParamValue,
    flags: ParamFlags,
}

/// Parameter store
pub struct ParameterStore {
    entries: FnvIndexMap<ParamName, Entry, MAX_PARAMS>,
    dirty: bool,
}

impl ParameterStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: FnvIndexMap::new(),
            dirty: false,
        }
    }

    /// Get parameter value
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        let key = ParamName::try_from(name).ok()?;
        self.entries.get(&key).map(|entry| &entry.value)
    }

    /// Set parameter value
    ///
    /// The value must have the same type as the registered default.
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<(), ParameterError> {
        let key = ParamName::try_from(name).map_err(|_| ParameterError::InvalidConfig)?;
        let entry = self
            .entries
            .get_mut(&key)
            .ok_or(ParameterError::InvalidConfig)?;

        if entry.flags.contains(ParamFlags::READ_ONLY) {
            return Err(ParameterError::ReadOnly);
        }
        if !entry.value.same_kind(&value) {
            return Err(ParameterError::InvalidValue);
        }

        entry.value = value;
        self.dirty = true;
        Ok(())
    }

    /// Register a parameter with its default value
    ///
    /// Registering an existing name keeps the current value.
    pub fn register(
        &mut self,
        name: &str,
        default_value: ParamValue,
        flags: ParamFlags,
    ) -> Result<(), ParameterError> {
        let key = ParamName::try_from(name).map_err(|_| ParameterError::InvalidConfig)?;
        if self.entries.contains_key(&key) {
            return Ok(());
        }

        self.entries
            .insert(
                key,
                Entry {
                    value: default_value,
                    flags,
                },
            )
            .map_err(|_| ParameterError::StoreFull)?;
        self.dirty = true;
        Ok(())
    }

    /// Flags of a registered parameter
    pub fn flags(&self, name: &str) -> Option<ParamFlags> {
        let key = ParamName::try_from(name).ok()?;
        self.entries.get(&key).map(|entry| entry.flags)
    }

    /// All parameters in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&ParamName, &ParamValue)> {
        self.entries.iter().map(|(name, entry)| (name, &entry.value))
    }

    /// Number of registered parameters
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if store has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear dirty flag
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let mut store = ParameterStore::new();
        store
            .register("TEST", ParamValue::Int(42), ParamFlags::empty())
            .unwrap();
        assert_eq!(store.get("TEST"), Some(&ParamValue::Int(42)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_marks_dirty() {
        let mut store = ParameterStore::new();
        store
            .register("TEST", ParamValue::Int(42), ParamFlags::empty())
            .unwrap();
        store.clear_dirty();

        store.set("TEST", ParamValue::Int(100)).unwrap();
        assert_eq!(store.get("TEST"), Some(&ParamValue::Int(100)));
        assert!(store.is_dirty());
    }

    #[test]
    fn test_set_unknown() {
        let mut store = ParameterStore::new();
        assert_eq!(
            store.set("UNKNOWN", ParamValue::Int(1)),
            Err(ParameterError::InvalidConfig)
        );
    }

    #[test]
    fn test_set_wrong_type() {
        let mut store = ParameterStore::new();
        store
            .register("SPF", ParamValue::Float(45.3), ParamFlags::empty())
            .unwrap();
        assert_eq!(
            store.set("SPF", ParamValue::Int(45)),
            Err(ParameterError::InvalidValue)
        );
    }

    #[test]
    fn test_register_idempotent() {
        let mut store = ParameterStore::new();
        store
            .register("TEST", ParamValue::Int(42), ParamFlags::empty())
            .unwrap();
        store.set("TEST", ParamValue::Int(100)).unwrap();
        store
            .register("TEST", ParamValue::Int(42), ParamFlags::empty())
            .unwrap();
        assert_eq!(store.get("TEST"), Some(&ParamValue::Int(100)));
    }

    #[test]
    fn test_read_only() {
        let mut store = ParameterStore::new();
        store
            .register("UNITS", ParamValue::Int(12), ParamFlags::READ_ONLY)
            .unwrap();
        assert_eq!(
            store.set("UNITS", ParamValue::Int(3)),
            Err(ParameterError::ReadOnly)
        );
        assert_eq!(store.flags("UNITS"), Some(ParamFlags::READ_ONLY));
    }

    #[test]
    fn test_name_too_long() {
        let mut store = ParameterStore::new();
        assert_eq!(
            store.register(
                "THIS_NAME_IS_TOO_LONG",
                ParamValue::Bool(true),
                ParamFlags::empty()
            ),
            Err(ParameterError::InvalidConfig)
        );
        assert_eq!(store.get("THIS_NAME_IS_TOO_LONG"), None);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(ParamValue::Float(87.9).as_int(), 87);
        assert_eq!(ParamValue::Bool(true).as_int(), 1);
        assert!((ParamValue::Int(3).as_float() - 3.0).abs() < f32::EPSILON);
    }
}
