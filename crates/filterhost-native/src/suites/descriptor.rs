//! Action descriptors: ordered key/value maps used for scripting parameters.
//!
//! Keys keep their insertion order, which is the order a plug-in sees when
//! it enumerates keys during replay. Overwriting a key keeps its position.

use filterhost_abi::{RawDescriptor, descriptor_type};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::{SuiteError, SuiteResult};

/// A value stored in a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DescriptorValue {
    /// 32-bit integer.
    Integer(i32),
    /// 64-bit float.
    Float(f64),
    /// Boolean.
    Boolean(bool),
    /// Enumerated value and its enumeration type.
    Enumerated {
        /// Enumeration type code.
        enum_type: u32,
        /// Value code.
        value: u32,
    },
    /// Text.
    Text(String),
}

impl DescriptorValue {
    /// Four-character type code of the value.
    pub fn type_code(&self) -> u32 {
        match self {
            Self::Integer(_) => descriptor_type::INTEGER,
            Self::Float(_) => descriptor_type::FLOAT,
            Self::Boolean(_) => descriptor_type::BOOLEAN,
            Self::Enumerated { .. } => descriptor_type::ENUMERATED,
            Self::Text(_) => descriptor_type::TEXT,
        }
    }
}

/// Ordered descriptor contents.
pub type DescriptorValues = IndexMap<u32, DescriptorValue>;

/// Descriptors owned by one session.
#[derive(Debug)]
pub struct DescriptorStore {
    descriptors: Arena<DescriptorValues>,
}

impl DescriptorStore {
    /// An empty store.
    pub fn new(tag: u16) -> Self {
        Self {
            descriptors: Arena::new(tag),
        }
    }

    /// Create an empty descriptor.
    ///
    /// # Errors
    ///
    /// [`SuiteError::Exhausted`] when no identifier is left.
    pub fn make(&mut self) -> SuiteResult<RawDescriptor> {
        self.create_descriptor(DescriptorValues::new())
    }

    /// Create a descriptor holding `values`.
    ///
    /// # Errors
    ///
    /// [`SuiteError::Exhausted`] when no identifier is left.
    pub fn create_descriptor(&mut self, values: DescriptorValues) -> SuiteResult<RawDescriptor> {
        self.descriptors.insert(values).ok_or(SuiteError::Exhausted)
    }

    /// Copy of a descriptor's contents, or `None` for an unknown descriptor.
    pub fn try_get_descriptor_values(&self, descriptor: RawDescriptor) -> Option<DescriptorValues> {
        self.descriptors.get(descriptor).cloned()
    }

    /// Free a descriptor.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownDescriptor`] for stale or foreign identifiers.
    pub fn free(&mut self, descriptor: RawDescriptor) -> SuiteResult<()> {
        self.descriptors
            .remove(descriptor)
            .map(drop)
            .ok_or(SuiteError::UnknownDescriptor(descriptor))
    }

    fn values(&self, descriptor: RawDescriptor) -> SuiteResult<&DescriptorValues> {
        self.descriptors
            .get(descriptor)
            .ok_or(SuiteError::UnknownDescriptor(descriptor))
    }

    /// Whether `key` is present.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownDescriptor`].
    pub fn has_key(&self, descriptor: RawDescriptor, key: u32) -> SuiteResult<bool> {
        Ok(self.values(descriptor)?.contains_key(&key))
    }

    /// Number of keys.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownDescriptor`].
    pub fn count(&self, descriptor: RawDescriptor) -> SuiteResult<u32> {
        Ok(self.values(descriptor)?.len() as u32)
    }

    /// Key at `index` in insertion order.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownDescriptor`] or [`SuiteError::IndexOutOfRange`].
    pub fn key_at(&self, descriptor: RawDescriptor, index: u32) -> SuiteResult<u32> {
        let values = self.values(descriptor)?;
        values
            .get_index(index as usize)
            .map(|(key, _)| *key)
            .ok_or(SuiteError::IndexOutOfRange {
                index,
                count: values.len() as u32,
            })
    }

    /// Type code stored under `key`.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownDescriptor`] or [`SuiteError::KeyNotFound`].
    pub fn type_of(&self, descriptor: RawDescriptor, key: u32) -> SuiteResult<u32> {
        self.get(descriptor, key).map(DescriptorValue::type_code)
    }

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownDescriptor`].
    pub fn put(
        &mut self,
        descriptor: RawDescriptor,
        key: u32,
        value: DescriptorValue,
    ) -> SuiteResult<()> {
        self.descriptors
            .get_mut(descriptor)
            .ok_or(SuiteError::UnknownDescriptor(descriptor))?
            .insert(key, value);
        Ok(())
    }

    /// Value stored under `key`.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownDescriptor`] or [`SuiteError::KeyNotFound`].
    pub fn get(&self, descriptor: RawDescriptor, key: u32) -> SuiteResult<&DescriptorValue> {
        self.values(descriptor)?
            .get(&key)
            .ok_or(SuiteError::KeyNotFound { key })
    }

    /// Integer stored under `key`.
    ///
    /// # Errors
    ///
    /// As [`DescriptorStore::get`], plus [`SuiteError::TypeMismatch`].
    pub fn get_integer(&self, descriptor: RawDescriptor, key: u32) -> SuiteResult<i32> {
        match self.get(descriptor, key)? {
            DescriptorValue::Integer(v) => Ok(*v),
            other => Err(mismatch(key, descriptor_type::INTEGER, other)),
        }
    }

    /// Float stored under `key`. Integers widen.
    ///
    /// # Errors
    ///
    /// As [`DescriptorStore::get`], plus [`SuiteError::TypeMismatch`].
    pub fn get_float(&self, descriptor: RawDescriptor, key: u32) -> SuiteResult<f64> {
        match self.get(descriptor, key)? {
            DescriptorValue::Float(v) => Ok(*v),
            DescriptorValue::Integer(v) => Ok(f64::from(*v)),
            other => Err(mismatch(key, descriptor_type::FLOAT, other)),
        }
    }

    /// Boolean stored under `key`.
    ///
    /// # Errors
    ///
    /// As [`DescriptorStore::get`], plus [`SuiteError::TypeMismatch`].
    pub fn get_boolean(&self, descriptor: RawDescriptor, key: u32) -> SuiteResult<bool> {
        match self.get(descriptor, key)? {
            DescriptorValue::Boolean(v) => Ok(*v),
            other => Err(mismatch(key, descriptor_type::BOOLEAN, other)),
        }
    }

    /// Enumeration type and value stored under `key`.
    ///
    /// # Errors
    ///
    /// As [`DescriptorStore::get`], plus [`SuiteError::TypeMismatch`].
    pub fn get_enumerated(&self, descriptor: RawDescriptor, key: u32) -> SuiteResult<(u32, u32)> {
        match self.get(descriptor, key)? {
            DescriptorValue::Enumerated { enum_type, value } => Ok((*enum_type, *value)),
            other => Err(mismatch(key, descriptor_type::ENUMERATED, other)),
        }
    }

    /// Text stored under `key`.
    ///
    /// # Errors
    ///
    /// As [`DescriptorStore::get`], plus [`SuiteError::TypeMismatch`].
    pub fn get_text(&self, descriptor: RawDescriptor, key: u32) -> SuiteResult<&str> {
        match self.get(descriptor, key)? {
            DescriptorValue::Text(v) => Ok(v),
            other => Err(mismatch(key, descriptor_type::TEXT, other)),
        }
    }

    /// Number of live descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no descriptors are live.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Free everything, returning how many descriptors were still live.
    pub fn release_all(&mut self) -> usize {
        self.descriptors.drain().len()
    }
}

fn mismatch(key: u32, expected: u32, actual: &DescriptorValue) -> SuiteError {
    SuiteError::TypeMismatch {
        key,
        expected,
        actual: actual.type_code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filterhost_abi::four_cc;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    const RADIUS: u32 = four_cc(*b"Rds ");
    const MODE: u32 = four_cc(*b"Md  ");

    #[test]
    fn test_keys_enumerate_in_insertion_order() -> TestResult {
        let mut store = DescriptorStore::new(1);
        let d = store.make()?;
        store.put(d, RADIUS, DescriptorValue::Float(2.5))?;
        store.put(d, MODE, DescriptorValue::Integer(1))?;
        store.put(d, RADIUS, DescriptorValue::Float(3.0))?;
        assert_eq!(store.count(d)?, 2);
        assert_eq!(store.key_at(d, 0)?, RADIUS);
        assert_eq!(store.key_at(d, 1)?, MODE);
        assert!(matches!(
            store.key_at(d, 2),
            Err(SuiteError::IndexOutOfRange { index: 2, count: 2 })
        ));
        Ok(())
    }

    #[test]
    fn test_typed_reads() -> TestResult {
        let mut store = DescriptorStore::new(1);
        let d = store.make()?;
        store.put(d, RADIUS, DescriptorValue::Integer(4))?;
        store.put(
            d,
            MODE,
            DescriptorValue::Enumerated {
                enum_type: 7,
                value: 9,
            },
        )?;
        assert_eq!(store.get_integer(d, RADIUS)?, 4);
        assert_eq!(store.get_float(d, RADIUS)?, 4.0);
        assert_eq!(store.get_enumerated(d, MODE)?, (7, 9));
        assert_eq!(store.type_of(d, MODE)?, descriptor_type::ENUMERATED);
        assert_eq!(
            store.get_boolean(d, RADIUS),
            Err(SuiteError::TypeMismatch {
                key: RADIUS,
                expected: descriptor_type::BOOLEAN,
                actual: descriptor_type::INTEGER,
            })
        );
        assert_eq!(
            store.get_text(d, 1),
            Err(SuiteError::KeyNotFound { key: 1 })
        );
        Ok(())
    }

    #[test]
    fn test_create_and_read_back() -> TestResult {
        let mut store = DescriptorStore::new(1);
        let mut values = DescriptorValues::new();
        values.insert(MODE, DescriptorValue::Text("soft".into()));
        values.insert(RADIUS, DescriptorValue::Boolean(true));
        let d = store.create_descriptor(values.clone())?;
        assert_eq!(store.try_get_descriptor_values(d), Some(values));
        store.free(d)?;
        assert_eq!(store.try_get_descriptor_values(d), None);
        Ok(())
    }

    #[test]
    fn test_value_serializes_with_type_tag() -> TestResult {
        let json = serde_json::to_string(&DescriptorValue::Integer(3))?;
        assert_eq!(json, r#"{"type":"integer","value":3}"#);
        Ok(())
    }
}
